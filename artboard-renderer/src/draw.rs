//! Draw tree: the renderer's output, one ordered node list per element.
//!
//! Every node is expressed in the element's local frame, centered on the
//! element origin. The placement (`x`, `y`, `rotation`) on [`ElementDraw`]
//! maps that frame onto the artboard.

use artboard_core::{ElementId, FontStyle, FontWeight, Shape, TextAlign};
use serde::{Deserialize, Serialize};

use crate::fit::{ContainFit, CoverFit, FitTarget};

/// Neutral fill for image elements whose source could not be decoded.
pub const IMAGE_FALLBACK_FILL: &str = "#e0e0e0";

/// Closed outline of a shape, centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outline {
    /// Rectangle, optionally rounded.
    #[serde(rename_all = "camelCase")]
    Rect {
        /// Width.
        width: f32,
        /// Height.
        height: f32,
        /// Corner radius.
        corner_radius: f32,
    },
    /// Circle.
    Circle {
        /// Radius.
        radius: f32,
    },
    /// Regular polygon, first vertex up.
    Polygon {
        /// Number of sides.
        sides: u8,
        /// Circumscribed radius.
        radius: f32,
    },
}

impl Outline {
    /// Outline of a shape. Text has none.
    #[must_use]
    pub fn of(shape: &Shape) -> Option<Self> {
        match shape {
            Shape::Rect {
                width,
                height,
                corner_radius,
            } => Some(Self::Rect {
                width: *width,
                height: *height,
                corner_radius: *corner_radius,
            }),
            Shape::Image { width, height, .. } => Some(Self::Rect {
                width: *width,
                height: *height,
                corner_radius: 0.0,
            }),
            Shape::Circle { radius } => Some(Self::Circle { radius: *radius }),
            Shape::Polygon { sides, radius } => Some(Self::Polygon {
                sides: *sides,
                radius: *radius,
            }),
            Shape::Text { .. } => None,
        }
    }

    /// The outline pushed outward by `amount` on every side.
    #[must_use]
    pub fn grow(&self, amount: f32) -> Self {
        match *self {
            Self::Rect {
                width,
                height,
                corner_radius,
            } => Self::Rect {
                width: width + amount * 2.0,
                height: height + amount * 2.0,
                corner_radius: if corner_radius > 0.0 {
                    corner_radius + amount
                } else {
                    0.0
                },
            },
            Self::Circle { radius } => Self::Circle {
                radius: radius + amount,
            },
            Self::Polygon { sides, radius } => Self::Polygon {
                sides,
                radius: radius + amount,
            },
        }
    }

    /// Bounding size `(width, height)`.
    #[must_use]
    pub fn size(&self) -> (f32, f32) {
        match *self {
            Self::Rect { width, height, .. } => (width, height),
            Self::Circle { radius } | Self::Polygon { radius, .. } => (radius * 2.0, radius * 2.0),
        }
    }

    /// The region a cover-fitted image is sized against.
    #[must_use]
    pub fn fit_target(&self) -> FitTarget {
        match *self {
            Self::Circle { radius } => FitTarget::Circle { radius },
            _ => {
                let (width, height) = self.size();
                FitTarget::Rect { width, height }
            }
        }
    }
}

/// Vertices of a regular polygon centered on the origin, first vertex up,
/// proceeding clockwise in screen coordinates.
#[must_use]
pub fn polygon_vertices(sides: u8, radius: f32) -> Vec<(f32, f32)> {
    let n = u16::from(sides.max(3));
    let step = std::f32::consts::TAU / f32::from(n);
    (0..n)
        .map(|i| {
            let angle = f32::from(i) * step - std::f32::consts::FRAC_PI_2;
            let (sin, cos) = angle.sin_cos();
            (radius * cos, radius * sin)
        })
        .collect()
}

/// How a filled region is painted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Paint {
    /// A flat color.
    Solid {
        /// CSS color.
        color: String,
    },
    /// A cover-fitted image pattern anchored at the outline's top-left.
    Pattern {
        /// Embeddable image reference (data URI).
        href: String,
        /// Pattern placement.
        fit: CoverFit,
    },
}

/// A styled, wrapped text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    /// Content; `\n` starts a new line.
    pub text: String,
    /// Font family.
    pub font_family: String,
    /// Font size.
    pub font_size: f32,
    /// Upright or italic.
    pub font_style: FontStyle,
    /// Weight.
    pub font_weight: FontWeight,
    /// Alignment within `width`.
    pub text_align: TextAlign,
    /// Wrap width.
    pub width: f32,
    /// Line height in artboard units.
    pub line_height: f32,
    /// Text color.
    pub color: String,
}

/// One paint operation in an element's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "camelCase")]
pub enum DrawNode {
    /// A filled outline.
    Shape {
        /// Region to fill.
        outline: Outline,
        /// Fill paint.
        paint: Paint,
    },
    /// A paint confined to a clip outline.
    Clipped {
        /// Clip region.
        clip: Outline,
        /// Paint drawn inside the clip.
        paint: Paint,
    },
    /// A dashed, unfilled outline marking a photo slot.
    DashedOutline {
        /// Outline to stroke.
        outline: Outline,
        /// Stroke color.
        color: String,
        /// Stroke width.
        width: f32,
        /// Dash and gap lengths.
        dash: [f32; 2],
    },
    /// The upload affordance icon, centered.
    UploadIcon {
        /// Icon edge length.
        size: f32,
        /// Icon color.
        color: String,
    },
    /// A text run whose box is centered on the origin.
    Text(TextRun),
    /// A bitmap stretched over a centered `width` x `height` box.
    Image {
        /// Embeddable image reference (data URI).
        href: String,
        /// Drawn width.
        width: f32,
        /// Drawn height.
        height: f32,
    },
}

/// All paint operations for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDraw {
    /// Source element.
    pub id: ElementId,
    /// Center X on the artboard.
    pub x: f32,
    /// Center Y on the artboard.
    pub y: f32,
    /// Clockwise rotation in degrees about the center.
    pub rotation: f32,
    /// Group opacity.
    pub opacity: f32,
    /// Nodes in paint order.
    pub nodes: Vec<DrawNode>,
}

/// The artboard background image, contain-fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundDraw {
    /// Embeddable image reference (data URI).
    pub href: String,
    /// Placement relative to the artboard's top-left.
    pub fit: ContainFit,
}

/// A rendered template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawTree {
    /// Artboard width.
    pub width: u32,
    /// Artboard height.
    pub height: u32,
    /// Solid background color.
    pub background_color: String,
    /// Background image, if one is decoded.
    pub background: Option<BackgroundDraw>,
    /// Element draws in stacking order, bottom first.
    pub elements: Vec<ElementDraw>,
}

impl DrawTree {
    /// Find the draw for an element.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&ElementDraw> {
        self.elements.iter().find(|draw| draw.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_first_vertex_up() {
        let points = polygon_vertices(6, 50.0);
        assert_eq!(points.len(), 6);
        let (x, y) = points[0];
        assert!(x.abs() < 1e-4);
        assert!((y + 50.0).abs() < 1e-4);
        // clockwise on screen: second vertex is to the right
        assert!(points[1].0 > 0.0);
    }

    #[test]
    fn test_grow_keeps_square_corners_square() {
        let rect = Outline::Rect {
            width: 100.0,
            height: 50.0,
            corner_radius: 0.0,
        };
        assert_eq!(
            rect.grow(5.0),
            Outline::Rect {
                width: 110.0,
                height: 60.0,
                corner_radius: 0.0
            }
        );

        let rounded = Outline::Rect {
            width: 100.0,
            height: 50.0,
            corner_radius: 8.0,
        };
        assert_eq!(
            rounded.grow(5.0),
            Outline::Rect {
                width: 110.0,
                height: 60.0,
                corner_radius: 13.0
            }
        );
    }

    #[test]
    fn test_text_has_no_outline() {
        let shape = Shape::default_for(artboard_core::ElementKind::Text);
        assert!(Outline::of(&shape).is_none());
    }

    #[test]
    fn test_fit_target_per_outline() {
        assert_eq!(
            Outline::Circle { radius: 5.0 }.fit_target(),
            FitTarget::Circle { radius: 5.0 }
        );
        assert_eq!(
            Outline::Polygon {
                sides: 5,
                radius: 10.0
            }
            .fit_target(),
            FitTarget::Rect {
                width: 20.0,
                height: 20.0
            }
        );
    }
}
