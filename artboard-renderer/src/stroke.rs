//! Stroke layering.
//!
//! Each stroke layer becomes a filled underlay: the element outline grown by
//! the layer's reach and painted before the main fill. Inside strokes have
//! no reach and end up occluded by the fill; no hole is cut.

use artboard_core::{StrokeLayer, StrokePosition};

use crate::draw::{DrawNode, Outline, Paint};

/// How far a stroke layer extends past the outline on each side.
#[must_use]
pub fn reach(stroke: &StrokeLayer) -> f32 {
    match stroke.position {
        StrokePosition::Inside => 0.0,
        StrokePosition::Center => stroke.width / 2.0,
        StrokePosition::Outside => stroke.width,
    }
}

/// Underlay nodes for `strokes`, in paint order.
///
/// Zero-width layers emit nothing.
#[must_use]
pub fn underlays(outline: &Outline, strokes: &[StrokeLayer]) -> Vec<DrawNode> {
    strokes
        .iter()
        .filter(|stroke| stroke.width > 0.0)
        .map(|stroke| DrawNode::Shape {
            outline: outline.grow(reach(stroke)),
            paint: Paint::Solid {
                color: stroke.color.clone(),
            },
        })
        .collect()
}
