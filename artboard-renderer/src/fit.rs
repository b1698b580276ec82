//! Image fitting: contain and cover placement of a bitmap in a target.
//!
//! All functions are pure. A zero-area image has no placement and yields
//! `None`; the caller falls back to a solid fill. Degenerate targets clamp
//! the scale to [`MIN_FIT_SCALE`] so no NaN or infinity reaches a draw tree.

use serde::{Deserialize, Serialize};

/// Smallest scale the fitter will ever report.
pub const MIN_FIT_SCALE: f32 = 1e-4;

/// Region an image is fitted into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FitTarget {
    /// A `width` x `height` rectangle.
    Rect {
        /// Target width.
        width: f32,
        /// Target height.
        height: f32,
    },
    /// A circle, fitted through its `2r` x `2r` bounding square.
    Circle {
        /// Target radius.
        radius: f32,
    },
}

impl FitTarget {
    /// Bounding size of the target, with degenerate values collapsed to zero.
    #[must_use]
    pub fn size(&self) -> (f32, f32) {
        let (w, h) = match *self {
            Self::Rect { width, height } => (width, height),
            Self::Circle { radius } => (radius * 2.0, radius * 2.0),
        };
        (non_negative(w), non_negative(h))
    }
}

/// Contain placement: the whole image visible, letterboxed and centered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainFit {
    /// Uniform scale applied to the image.
    pub scale: f32,
    /// Left edge of the drawn image relative to the target's left edge.
    pub x: f32,
    /// Top edge of the drawn image relative to the target's top edge.
    pub y: f32,
    /// Drawn width.
    pub width: f32,
    /// Drawn height.
    pub height: f32,
}

/// Cover placement: the target fully covered, excess cropped, centered.
///
/// Expressed as a pattern fill: the pattern is anchored at the target's
/// top-left, scaled by `scale`, and shifted by `-offset` in unscaled image
/// space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverFit {
    /// Uniform pattern scale.
    pub scale: f32,
    /// Horizontal pattern offset in unscaled image pixels.
    pub offset_x: f32,
    /// Vertical pattern offset in unscaled image pixels.
    pub offset_y: f32,
    /// Drawn (scaled) image width.
    pub width: f32,
    /// Drawn (scaled) image height.
    pub height: f32,
}

impl CoverFit {
    /// Where the scaled image lands in a shape frame centered on its origin,
    /// as `(x, y, width, height)`.
    #[must_use]
    pub fn placement_in_centered_frame(&self, target: FitTarget) -> (f32, f32, f32, f32) {
        let (tw, th) = target.size();
        let x = -tw / 2.0 - self.offset_x * self.scale;
        let y = -th / 2.0 - self.offset_y * self.scale;
        (x, y, self.width, self.height)
    }
}

/// Fit an image entirely inside a `target_w` x `target_h` rectangle.
///
/// When `allow_upscale` is false the scale is capped at `1`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn contain(
    image_w: u32,
    image_h: u32,
    target_w: f32,
    target_h: f32,
    allow_upscale: bool,
) -> Option<ContainFit> {
    if image_w == 0 || image_h == 0 {
        return None;
    }
    let (iw, ih) = (image_w as f32, image_h as f32);
    let (tw, th) = (non_negative(target_w), non_negative(target_h));

    let mut scale = (tw / iw).min(th / ih);
    if !allow_upscale {
        scale = scale.min(1.0);
    }
    let scale = clamp_scale(scale);

    let width = iw * scale;
    let height = ih * scale;
    Some(ContainFit {
        scale,
        x: (tw - width) / 2.0,
        y: (th - height) / 2.0,
        width,
        height,
    })
}

/// Fit an image so it fully covers `target`, centered.
#[must_use]
pub fn cover(image_w: u32, image_h: u32, target: FitTarget) -> Option<CoverFit> {
    cover_adjusted(image_w, image_h, target, 1.0, 0.0, 0.0)
}

/// Cover fit with a manual zoom and pan layered on top.
///
/// `zoom` multiplies the cover scale; `(pan_x, pan_y)` moves the image in
/// target units. A zoom of `1` with no pan equals [`cover`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cover_adjusted(
    image_w: u32,
    image_h: u32,
    target: FitTarget,
    zoom: f32,
    pan_x: f32,
    pan_y: f32,
) -> Option<CoverFit> {
    if image_w == 0 || image_h == 0 {
        return None;
    }
    let (iw, ih) = (image_w as f32, image_h as f32);
    let (tw, th) = target.size();
    let zoom = if zoom.is_finite() && zoom > 0.0 {
        zoom
    } else {
        1.0
    };
    let pan_x = if pan_x.is_finite() { pan_x } else { 0.0 };
    let pan_y = if pan_y.is_finite() { pan_y } else { 0.0 };

    let scale = clamp_scale((tw / iw).max(th / ih) * zoom);
    let width = iw * scale;
    let height = ih * scale;
    Some(CoverFit {
        scale,
        offset_x: ((width - tw) / 2.0 - pan_x) / scale,
        offset_y: ((height - th) / 2.0 - pan_y) / scale,
        width,
        height,
    })
}

fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.max(MIN_FIT_SCALE)
    } else {
        MIN_FIT_SCALE
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
