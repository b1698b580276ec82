//! Geometry renderer: elements and templates to draw trees.
//!
//! Rendering is a pure function of the model plus whatever images are
//! currently decoded. The same template renders identically no matter how
//! often it is rendered.

use artboard_core::element::TEXT_LINE_HEIGHT;
use artboard_core::{Element, Shape, Template};
use tracing::trace;

use crate::draw::{
    BackgroundDraw, DrawNode, DrawTree, ElementDraw, Outline, Paint, TextRun, IMAGE_FALLBACK_FILL,
};
use crate::fit::{contain, cover, cover_adjusted};
use crate::image::{DecodedImage, ImageSlot, ImageSlots};
use crate::stroke::underlays;

/// Smallest upload icon edge.
pub const UPLOAD_ICON_MIN: f32 = 12.0;

/// Largest upload icon edge.
pub const UPLOAD_ICON_MAX: f32 = 64.0;

/// Upload icon edge as a fraction of the shape's shorter side.
pub const UPLOAD_ICON_RATIO: f32 = 0.3;

/// Color of the placeholder affordance.
pub const PLACEHOLDER_AFFORDANCE_COLOR: &str = "#8a8f98";

/// Dash pattern of the placeholder outline.
pub const PLACEHOLDER_DASH: [f32; 2] = [8.0, 6.0];

/// Stroke width of the placeholder outline.
pub const PLACEHOLDER_OUTLINE_WIDTH: f32 = 2.0;

/// Which surface a template is rendered for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Authoring: placeholders show previews or an upload affordance.
    #[default]
    Editor,
    /// End user: placeholders show the supplied photo, or their plain fill.
    Generator,
}

/// Inputs to a render besides the template itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    /// Target surface.
    pub mode: RenderMode,
    /// Decoded images; `None` renders as if nothing is decoded.
    pub slots: Option<&'a ImageSlots>,
}

impl<'a> RenderContext<'a> {
    /// Editor context over `slots`.
    #[must_use]
    pub fn editor(slots: &'a ImageSlots) -> Self {
        Self {
            mode: RenderMode::Editor,
            slots: Some(slots),
        }
    }

    /// Generator context over `slots`.
    #[must_use]
    pub fn generator(slots: &'a ImageSlots) -> Self {
        Self {
            mode: RenderMode::Generator,
            slots: Some(slots),
        }
    }

    fn image(&self, slot: ImageSlot) -> Option<&'a DecodedImage> {
        self.slots.and_then(|slots| slots.get(slot))
    }
}

/// Edge length of the upload icon for a shape whose shorter side is `min_side`.
#[must_use]
pub fn upload_icon_size(min_side: f32) -> f32 {
    (min_side * UPLOAD_ICON_RATIO)
        .clamp(UPLOAD_ICON_MIN, UPLOAD_ICON_MAX)
        .min(min_side)
}

/// Render one element.
#[must_use]
pub fn render_element(element: &Element, ctx: &RenderContext<'_>) -> ElementDraw {
    let nodes = match (&element.shape, Outline::of(&element.shape)) {
        (Shape::Text { .. }, _) | (_, None) => text_nodes(element),
        (Shape::Image { width, height, .. }, Some(outline)) if !element.is_photo_slot() => {
            let mut nodes = underlays(&outline, &element.strokes);
            nodes.push(image_node(element, outline, *width, *height, ctx));
            nodes
        }
        (_, Some(outline)) => {
            let mut nodes = underlays(&outline, &element.strokes);
            nodes.extend(fill_nodes(element, outline, ctx));
            nodes
        }
    };

    trace!(id = %element.id, nodes = nodes.len(), "Rendered element");
    ElementDraw {
        id: element.id,
        x: element.x,
        y: element.y,
        rotation: element.rotation,
        opacity: element.opacity,
        nodes,
    }
}

/// Render a whole template in stacking order.
#[must_use]
pub fn render_template(template: &Template, ctx: &RenderContext<'_>) -> DrawTree {
    #[allow(clippy::cast_precision_loss)]
    let background = ctx.image(ImageSlot::Background).and_then(|image| {
        contain(
            image.width,
            image.height,
            template.width as f32,
            template.height as f32,
            true,
        )
        .map(|fit| BackgroundDraw {
            href: image.href.clone(),
            fit,
        })
    });

    DrawTree {
        width: template.width,
        height: template.height,
        background_color: template.background_color.clone(),
        background,
        elements: template
            .elements()
            .iter()
            .map(|element| render_element(element, ctx))
            .collect(),
    }
}

fn fill_nodes(element: &Element, outline: Outline, ctx: &RenderContext<'_>) -> Vec<DrawNode> {
    let solid = DrawNode::Shape {
        outline,
        paint: Paint::Solid {
            color: element.fill.clone(),
        },
    };
    if !element.is_photo_slot() {
        return vec![solid];
    }

    let target = outline.fit_target();
    let pattern = match ctx.mode {
        RenderMode::Editor => ctx.image(ImageSlot::Placeholder(element.id)).and_then(|image| {
            cover_adjusted(
                image.width,
                image.height,
                target,
                element.image_scale,
                element.image_offset.x,
                element.image_offset.y,
            )
            .map(|fit| (image, fit))
        }),
        RenderMode::Generator => ctx
            .image(ImageSlot::Photo)
            .and_then(|image| cover(image.width, image.height, target).map(|fit| (image, fit))),
    };

    match (pattern, ctx.mode) {
        (Some((image, fit)), _) => vec![DrawNode::Clipped {
            clip: outline,
            paint: Paint::Pattern {
                href: image.href.clone(),
                fit,
            },
        }],
        (None, RenderMode::Editor) => {
            let (w, h) = outline.size();
            vec![
                solid,
                DrawNode::DashedOutline {
                    outline,
                    color: PLACEHOLDER_AFFORDANCE_COLOR.to_string(),
                    width: PLACEHOLDER_OUTLINE_WIDTH,
                    dash: PLACEHOLDER_DASH,
                },
                DrawNode::UploadIcon {
                    size: upload_icon_size(w.min(h)),
                    color: PLACEHOLDER_AFFORDANCE_COLOR.to_string(),
                },
            ]
        }
        (None, RenderMode::Generator) => vec![solid],
    }
}

fn image_node(
    element: &Element,
    outline: Outline,
    width: f32,
    height: f32,
    ctx: &RenderContext<'_>,
) -> DrawNode {
    match ctx.image(ImageSlot::Source(element.id)) {
        Some(image) if image.width > 0 && image.height > 0 => DrawNode::Image {
            href: image.href.clone(),
            width,
            height,
        },
        _ => DrawNode::Shape {
            outline,
            paint: Paint::Solid {
                color: IMAGE_FALLBACK_FILL.to_string(),
            },
        },
    }
}

fn text_nodes(element: &Element) -> Vec<DrawNode> {
    match &element.shape {
        Shape::Text {
            text,
            font_family,
            font_size,
            font_style,
            font_weight,
            text_align,
            width,
        } => vec![DrawNode::Text(TextRun {
            text: text.clone(),
            font_family: font_family.clone(),
            font_size: *font_size,
            font_style: *font_style,
            font_weight: font_weight.clone(),
            text_align: *text_align,
            width: *width,
            line_height: font_size * TEXT_LINE_HEIGHT,
            color: element.fill.clone(),
        })],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::decode_data_uri;
    use artboard_core::{ElementKind, StrokeLayer, StrokePosition};

    const PNG_1X1: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn loaded(slot: ImageSlot) -> ImageSlots {
        let mut slots = ImageSlots::new();
        let ticket = slots.request(slot);
        slots.complete(ticket, decode_data_uri(PNG_1X1));
        slots
    }

    #[test]
    fn test_upload_icon_size_bounds() {
        assert!((upload_icon_size(100.0) - 30.0).abs() < 1e-4);
        assert!((upload_icon_size(1000.0) - UPLOAD_ICON_MAX).abs() < 1e-4);
        assert!((upload_icon_size(30.0) - UPLOAD_ICON_MIN).abs() < 1e-4);
        assert!((upload_icon_size(8.0) - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_plain_shape_is_underlays_then_fill() {
        let element = Element::with_kind(ElementKind::Rect)
            .with_fill("#ff0000")
            .with_strokes(vec![StrokeLayer::new("#000", 4.0, StrokePosition::Outside)]);
        let draw = render_element(&element, &RenderContext::default());
        assert_eq!(draw.nodes.len(), 2);
        assert!(matches!(
            &draw.nodes[1],
            DrawNode::Shape { paint: Paint::Solid { color }, .. } if color == "#ff0000"
        ));
    }

    #[test]
    fn test_editor_placeholder_without_preview_shows_affordance() {
        let element = Element::with_kind(ElementKind::Rect).with_placeholder(true);
        let draw = render_element(&element, &RenderContext::default());
        assert!(draw
            .nodes
            .iter()
            .any(|n| matches!(n, DrawNode::DashedOutline { .. })));
        assert!(draw
            .nodes
            .iter()
            .any(|n| matches!(n, DrawNode::UploadIcon { size, .. } if (*size - 60.0).abs() < 1e-4)));
    }

    #[test]
    fn test_editor_preview_is_clipped_pattern() {
        let mut element = Element::with_kind(ElementKind::Circle).with_placeholder(true);
        element.placeholder_image = Some(PNG_1X1.to_string());
        let slots = loaded(ImageSlot::Placeholder(element.id));
        let draw = render_element(&element, &RenderContext::editor(&slots));
        assert_eq!(draw.nodes.len(), 1);
        assert!(matches!(
            &draw.nodes[0],
            DrawNode::Clipped { clip: Outline::Circle { .. }, paint: Paint::Pattern { .. } }
        ));
    }

    #[test]
    fn test_generator_ignores_preview_and_uses_photo() {
        let mut element = Element::with_kind(ElementKind::Rect).with_placeholder(true);
        element.image_scale = 3.0;
        let preview_only = loaded(ImageSlot::Placeholder(element.id));
        let draw = render_element(&element, &RenderContext::generator(&preview_only));
        assert_eq!(draw.nodes.len(), 1);
        assert!(matches!(&draw.nodes[0], DrawNode::Shape { .. }));

        let photo = loaded(ImageSlot::Photo);
        let draw = render_element(&element, &RenderContext::generator(&photo));
        match &draw.nodes[0] {
            DrawNode::Clipped {
                paint: Paint::Pattern { fit, .. },
                ..
            } => assert!((fit.scale - 200.0).abs() < 1e-3),
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn test_image_element_fallback_and_decoded() {
        let element = Element::with_kind(ElementKind::Image);
        let draw = render_element(&element, &RenderContext::default());
        assert!(matches!(
            &draw.nodes[0],
            DrawNode::Shape { paint: Paint::Solid { color }, .. } if color == IMAGE_FALLBACK_FILL
        ));

        let slots = loaded(ImageSlot::Source(element.id));
        let draw = render_element(&element, &RenderContext::editor(&slots));
        assert!(matches!(
            &draw.nodes[0],
            DrawNode::Image { width, height, .. } if (*width - 200.0).abs() < 1e-4 && (*height - 200.0).abs() < 1e-4
        ));
    }

    #[test]
    fn test_text_renders_run_without_clip() {
        let element = Element::with_kind(ElementKind::Text)
            .with_strokes(vec![StrokeLayer::new("#000", 4.0, StrokePosition::Outside)]);
        let draw = render_element(&element, &RenderContext::default());
        assert_eq!(draw.nodes.len(), 1);
        match &draw.nodes[0] {
            DrawNode::Text(run) => {
                assert_eq!(run.text, "Text");
                assert!((run.line_height - 48.0 * TEXT_LINE_HEIGHT).abs() < 1e-4);
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn test_template_background_contain_fit() {
        let mut template = Template::new("Bg", 200, 100);
        template.background_image = Some(PNG_1X1.to_string());
        let slots = loaded(ImageSlot::Background);
        let tree = render_template(&template, &RenderContext::editor(&slots));
        let background = tree.background.expect("background");
        assert!((background.fit.width - 100.0).abs() < 1e-4);
        assert!((background.fit.x - 50.0).abs() < 1e-4);

        let bare = render_template(&template, &RenderContext::default());
        assert!(bare.background.is_none());
        assert_eq!(bare, render_template(&template, &RenderContext::default()));
    }
}
