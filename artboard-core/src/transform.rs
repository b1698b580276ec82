//! Transform reconciliation.
//!
//! Interactive handles report a live transform (center, rotation and scale
//! factors) while the user drags. At the end of a gesture the live scale is
//! folded back into canonical element attributes and reset to `1`, so the
//! persisted model never carries a transient scale.

use serde::{Deserialize, Serialize};

use crate::element::{clamp_corner_radius, MIN_DIMENSION, MIN_RADIUS};
use crate::{Element, ElementKind, Shape};

/// Smallest bounding box accepted while a gesture is in progress.
pub const MIN_BOUNDING_BOX: f32 = 20.0;

/// Relative aspect-ratio drift tolerated for aspect-locked variants.
pub const ASPECT_TOLERANCE: f32 = 0.01;

/// Transform state of an interactive node, as reported by its handles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveTransform {
    /// Center X in artboard coordinates.
    pub x: f32,
    /// Center Y in artboard coordinates.
    pub y: f32,
    /// Clockwise rotation in degrees.
    pub rotation: f32,
    /// Horizontal scale factor accumulated during the gesture.
    pub scale_x: f32,
    /// Vertical scale factor accumulated during the gesture.
    pub scale_y: f32,
}

impl LiveTransform {
    /// The resting transform of an element (unit scale).
    #[must_use]
    pub fn of(element: &Element) -> Self {
        Self {
            x: element.x,
            y: element.y,
            rotation: element.rotation,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Whether both scale factors are exactly one.
    #[must_use]
    pub fn is_unit_scale(&self) -> bool {
        (self.scale_x - 1.0).abs() < f32::EPSILON && (self.scale_y - 1.0).abs() < f32::EPSILON
    }
}

/// Outcome of reconciling a finished gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// The replacement element carrying canonical attributes.
    pub element: Element,
    /// The live transform with its scale reset to `(1, 1)`.
    pub live: LiveTransform,
}

/// Fold a finished gesture into a new element.
///
/// The input element is not modified; callers swap the returned element in
/// wholesale.
#[must_use]
pub fn reconcile(element: &Element, live: &LiveTransform) -> Reconciled {
    let scale_x = sanitize_scale(live.scale_x);
    let scale_y = sanitize_scale(live.scale_y);

    let mut next = element.clone();
    match &mut next.shape {
        Shape::Rect {
            width,
            height,
            corner_radius,
        } => {
            *width = scaled(*width, scale_x, MIN_DIMENSION);
            *height = scaled(*height, scale_y, MIN_DIMENSION);
            *corner_radius = clamp_corner_radius(*corner_radius, *width, *height);
        }
        Shape::Image { width, height, .. } => {
            *width = scaled(*width, scale_x, MIN_DIMENSION);
            *height = scaled(*height, scale_y, MIN_DIMENSION);
        }
        Shape::Circle { radius } | Shape::Polygon { radius, .. } => {
            *radius = scaled(*radius, (scale_x + scale_y) / 2.0, MIN_RADIUS);
        }
        Shape::Text { width, .. } => {
            *width = scaled(*width, scale_x, MIN_DIMENSION);
        }
    }
    next.x = round_or(live.x, element.x);
    next.y = round_or(live.y, element.y);
    next.rotation = round_or(live.rotation, element.rotation);
    next.normalize();

    tracing::debug!(
        "Reconciled {} {:?}: scale ({scale_x}, {scale_y}) -> {:?}",
        next.id,
        next.kind(),
        next.shape.bounding_size()
    );

    let live = LiveTransform::of(&next);
    Reconciled {
        element: next,
        live,
    }
}

fn sanitize_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale
    } else {
        1.0
    }
}

fn scaled(value: f32, scale: f32, min: f32) -> f32 {
    (value * scale).round().max(min)
}

fn round_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.round()
    } else {
        fallback
    }
}

/// Axis-aligned box proposed by a handle drag (top-left origin, before rotation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Clockwise rotation in degrees.
    pub rotation: f32,
}

impl BoundingBox {
    /// The resting bounding box of an element.
    #[must_use]
    pub fn of(element: &Element) -> Self {
        let (width, height) = element.shape.bounding_size();
        Self {
            x: element.x - width / 2.0,
            y: element.y - height / 2.0,
            width,
            height,
            rotation: element.rotation,
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.rotation.is_finite()
    }

    fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// Accept, snap or reject a proposed box during a gesture.
///
/// Proposals smaller than [`MIN_BOUNDING_BOX`] on either side are rejected
/// and `previous` is returned unchanged. For aspect-locked variants a
/// proposal whose ratio drifts more than [`ASPECT_TOLERANCE`] from
/// `previous` is snapped: the side that changed less is recomputed from the
/// side that changed more.
#[must_use]
pub fn constrain_bounds(
    kind: ElementKind,
    previous: BoundingBox,
    proposed: BoundingBox,
) -> BoundingBox {
    if !proposed.is_finite()
        || proposed.width < MIN_BOUNDING_BOX
        || proposed.height < MIN_BOUNDING_BOX
    {
        return previous;
    }
    if !kind.is_aspect_locked() || previous.width <= 0.0 || previous.height <= 0.0 {
        return proposed;
    }

    let ratio = previous.aspect();
    if (proposed.aspect() / ratio - 1.0).abs() <= ASPECT_TOLERANCE {
        return proposed;
    }

    let mut snapped = proposed;
    let dw = (proposed.width - previous.width).abs();
    let dh = (proposed.height - previous.height).abs();
    if dw >= dh {
        snapped.height = proposed.width / ratio;
    } else {
        snapped.width = proposed.height * ratio;
    }

    if snapped.width < MIN_BOUNDING_BOX || snapped.height < MIN_BOUNDING_BOX {
        previous
    } else {
        snapped
    }
}

/// Scale factors that take `original` to `current`, as a handle would report them.
#[must_use]
pub fn scale_between(original: &BoundingBox, current: &BoundingBox) -> (f32, f32) {
    let sx = if original.width > 0.0 {
        current.width / original.width
    } else {
        1.0
    };
    let sy = if original.height > 0.0 {
        current.height / original.height
    } else {
        1.0
    };
    (sx, sy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(width: f32, height: f32) -> Element {
        Element::new(Shape::Rect {
            width,
            height,
            corner_radius: 0.0,
        })
    }

    #[test]
    fn test_rect_anisotropic_scale() {
        let element = rect(200.0, 200.0).with_position(300.0, 300.0);
        let live = LiveTransform {
            scale_x: 2.0,
            scale_y: 0.5,
            ..LiveTransform::of(&element)
        };

        let out = reconcile(&element, &live);
        assert_eq!(
            out.element.shape,
            Shape::Rect {
                width: 400.0,
                height: 100.0,
                corner_radius: 0.0
            }
        );
        assert!(out.live.is_unit_scale());
        assert_eq!(out.element.id, element.id);
    }

    #[test]
    fn test_shrink_clamps_to_minimum() {
        let element = rect(200.0, 200.0);
        let live = LiveTransform {
            scale_x: 0.01,
            scale_y: -3.0,
            ..LiveTransform::of(&element)
        };
        let out = reconcile(&element, &live);
        let (w, h) = out.element.shape.bounding_size();
        assert!((w - MIN_DIMENSION).abs() < f32::EPSILON);
        assert!((h - MIN_DIMENSION).abs() < f32::EPSILON);
    }

    #[test]
    fn test_corner_radius_reclamped_after_shrink() {
        let element = Element::new(Shape::Rect {
            width: 200.0,
            height: 200.0,
            corner_radius: 80.0,
        });
        let live = LiveTransform {
            scale_y: 0.25,
            ..LiveTransform::of(&element)
        };
        let out = reconcile(&element, &live);
        match out.element.shape {
            Shape::Rect {
                height,
                corner_radius,
                ..
            } => {
                assert!((height - 50.0).abs() < f32::EPSILON);
                assert!((corner_radius - 25.0).abs() < f32::EPSILON);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_circle_uses_average_scale() {
        let element = Element::new(Shape::Circle { radius: 100.0 });
        let live = LiveTransform {
            scale_x: 2.0,
            scale_y: 1.0,
            ..LiveTransform::of(&element)
        };
        let out = reconcile(&element, &live);
        assert_eq!(out.element.shape, Shape::Circle { radius: 150.0 });

        let tiny = LiveTransform {
            scale_x: 0.01,
            scale_y: 0.01,
            ..LiveTransform::of(&element)
        };
        assert_eq!(
            reconcile(&element, &tiny).element.shape,
            Shape::Circle { radius: MIN_RADIUS }
        );
    }

    #[test]
    fn test_text_only_width_changes() {
        let element = Element::with_kind(ElementKind::Text);
        let live = LiveTransform {
            scale_x: 0.5,
            scale_y: 3.0,
            ..LiveTransform::of(&element)
        };
        let out = reconcile(&element, &live);
        match (&element.shape, &out.element.shape) {
            (
                Shape::Text {
                    font_size: before, ..
                },
                Shape::Text {
                    font_size: after,
                    width,
                    ..
                },
            ) => {
                assert!((before - after).abs() < f32::EPSILON);
                assert!((width - 200.0).abs() < f32::EPSILON);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_position_and_rotation_rounded() {
        let element = rect(100.0, 100.0);
        let live = LiveTransform {
            x: 10.4,
            y: 20.6,
            rotation: 44.5,
            scale_x: 1.0,
            scale_y: 1.0,
        };
        let out = reconcile(&element, &live);
        assert!((out.element.x - 10.0).abs() < f32::EPSILON);
        assert!((out.element.y - 21.0).abs() < f32::EPSILON);
        assert!((out.element.rotation - 45.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_non_finite_scale_is_ignored() {
        let element = rect(120.0, 80.0);
        let live = LiveTransform {
            scale_x: f32::NAN,
            scale_y: f32::INFINITY,
            ..LiveTransform::of(&element)
        };
        let out = reconcile(&element, &live);
        assert_eq!(out.element.shape.bounding_size(), (120.0, 80.0));
    }

    #[test]
    fn test_constrain_rejects_tiny_box() {
        let previous = BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
        };
        let proposed = BoundingBox {
            width: 19.0,
            ..previous
        };
        assert_eq!(
            constrain_bounds(ElementKind::Rect, previous, proposed),
            previous
        );
    }

    #[test]
    fn test_constrain_snaps_locked_aspect() {
        let previous = BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
        };
        let proposed = BoundingBox {
            width: 180.0,
            height: 110.0,
            ..previous
        };
        let snapped = constrain_bounds(ElementKind::Circle, previous, proposed);
        assert!((snapped.width - 180.0).abs() < f32::EPSILON);
        assert!((snapped.height - 180.0).abs() < f32::EPSILON);

        let free = constrain_bounds(ElementKind::Rect, previous, proposed);
        assert_eq!(free, proposed);
    }

    #[test]
    fn test_constrain_accepts_within_tolerance() {
        let previous = BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
        };
        let proposed = BoundingBox {
            width: 150.0,
            height: 149.5,
            ..previous
        };
        assert_eq!(
            constrain_bounds(ElementKind::Polygon, previous, proposed),
            proposed
        );
    }
}
