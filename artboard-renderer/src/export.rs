//! Draw tree export to SVG, PNG and JPEG.
//!
//! A [`DrawTree`] is serialized to SVG and rasterized with the
//! resvg/tiny-skia pipeline at [`EXPORT_PIXEL_RATIO`] times the artboard
//! size unless configured otherwise.

use std::fmt::Write;

use artboard_core::element::wrap_text;
use artboard_core::{FontStyle, TextAlign};
use image::ImageEncoder;
use tracing::debug;

use crate::draw::{polygon_vertices, DrawNode, DrawTree, ElementDraw, Outline, Paint, TextRun};
use crate::error::{RenderError, RenderResult};

/// Device pixels per artboard unit in raster exports.
pub const EXPORT_PIXEL_RATIO: f32 = 2.0;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// JPEG image, flattened onto the configured background.
    Jpeg,
    /// SVG document (UTF-8 bytes).
    Svg,
}

/// Configuration for template export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Device pixels per artboard unit.
    pub pixel_ratio: f32,
    /// Matte color for formats without alpha, as RGBA bytes.
    pub background: [u8; 4],
    /// JPEG quality 1-100.
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: EXPORT_PIXEL_RATIO,
            background: [255, 255, 255, 255],
            jpeg_quality: 90,
        }
    }
}

/// Exports a [`DrawTree`] to image formats.
pub struct TemplateExporter {
    config: ExportConfig,
}

impl TemplateExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Export a draw tree to the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or encoding fails.
    pub fn export(&self, tree: &DrawTree, format: ExportFormat) -> RenderResult<Vec<u8>> {
        match format {
            ExportFormat::Png => self.render_to_png(tree),
            ExportFormat::Jpeg => self.render_to_jpeg(tree),
            ExportFormat::Svg => Ok(self.render_to_svg(tree).into_bytes()),
        }
    }

    /// Export to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or encoding fails.
    pub fn render_to_png(&self, tree: &DrawTree) -> RenderResult<Vec<u8>> {
        let pixmap = Self::rasterize_svg(&self.render_to_svg(tree))?;
        pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Export to JPEG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or encoding fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_to_jpeg(&self, tree: &DrawTree) -> RenderResult<Vec<u8>> {
        let pixmap = Self::rasterize_svg(&self.render_to_svg(tree))?;

        let (width, height) = (pixmap.width(), pixmap.height());
        let bg = &self.config.background;
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        // tiny-skia stores premultiplied RGBA
        for pixel in pixmap.data().chunks_exact(4) {
            let inv = 1.0 - f32::from(pixel[3]) / 255.0;
            for channel in 0..3 {
                rgb.push(f32::from(bg[channel]).mul_add(inv, f32::from(pixel[channel])) as u8);
            }
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality)
            .write_image(&rgb, width, height, image::ExtendedColorType::Rgb8)
            .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }

    /// Serialize a draw tree to an SVG document.
    #[must_use]
    pub fn render_to_svg(&self, tree: &DrawTree) -> String {
        let (out_w, out_h) = self.output_dimensions(tree);
        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {} {}\">",
            tree.width, tree.height,
        );

        let _ = write!(
            svg,
            "<rect width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            tree.width,
            tree.height,
            escape_xml(&tree.background_color),
        );

        if let Some(background) = &tree.background {
            let fit = &background.fit;
            write_image(
                &mut svg,
                &background.href,
                fit.x,
                fit.y,
                fit.width,
                fit.height,
            );
        }

        for (index, element) in tree.elements.iter().enumerate() {
            render_element_svg(&mut svg, index, element);
        }

        svg.push_str("</svg>");
        svg
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn output_dimensions(&self, tree: &DrawTree) -> (u32, u32) {
        let ratio = if self.config.pixel_ratio.is_finite() && self.config.pixel_ratio > 0.0 {
            self.config.pixel_ratio
        } else {
            EXPORT_PIXEL_RATIO
        };
        let out_w = (tree.width as f32 * ratio).round() as u32;
        let out_h = (tree.height as f32 * ratio).round() as u32;
        (out_w.max(1), out_h.max(1))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(svg: &str) -> RenderResult<tiny_skia::Pixmap> {
        let mut opt = usvg::Options::default();
        opt.fontdb_mut().load_system_fonts();
        let tree = usvg::Tree::from_str(svg, &opt)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width().round() as u32;
        let px_h = tree.size().height().round() as u32;
        debug!(px_w, px_h, "Rasterizing export");

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

fn render_element_svg(svg: &mut String, index: usize, element: &ElementDraw) {
    let _ = write!(
        svg,
        "<g transform=\"translate({} {}) rotate({})\" opacity=\"{}\">",
        element.x, element.y, element.rotation, element.opacity,
    );

    for (node_index, node) in element.nodes.iter().enumerate() {
        match node {
            DrawNode::Shape { outline, paint } => write_paint(svg, outline, paint),
            DrawNode::Clipped { clip, paint } => {
                let clip_id = format!("clip-{index}-{node_index}");
                let _ = write!(svg, "<clipPath id=\"{clip_id}\">");
                write_outline(svg, clip, "");
                let _ = write!(svg, "</clipPath><g clip-path=\"url(#{clip_id})\">");
                write_paint(svg, clip, paint);
                svg.push_str("</g>");
            }
            DrawNode::DashedOutline {
                outline,
                color,
                width,
                dash,
            } => {
                let attrs = format!(
                    " fill=\"none\" stroke=\"{}\" stroke-width=\"{width}\" stroke-dasharray=\"{} {}\"",
                    escape_xml(color),
                    dash[0],
                    dash[1],
                );
                write_outline(svg, outline, &attrs);
            }
            DrawNode::UploadIcon { size, color } => write_upload_icon(svg, *size, color),
            DrawNode::Text(run) => write_text(svg, run),
            DrawNode::Image {
                href,
                width,
                height,
            } => write_image(svg, href, -width / 2.0, -height / 2.0, *width, *height),
        }
    }

    svg.push_str("</g>");
}

fn write_paint(svg: &mut String, outline: &Outline, paint: &Paint) {
    match paint {
        Paint::Solid { color } => {
            write_outline(svg, outline, &format!(" fill=\"{}\"", escape_xml(color)));
        }
        Paint::Pattern { href, fit } => {
            let (x, y, w, h) = fit.placement_in_centered_frame(outline.fit_target());
            write_image(svg, href, x, y, w, h);
        }
    }
}

fn write_outline(svg: &mut String, outline: &Outline, attrs: &str) {
    match *outline {
        Outline::Rect {
            width,
            height,
            corner_radius,
        } => {
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{width}\" height=\"{height}\" rx=\"{corner_radius}\"{attrs}/>",
                -width / 2.0,
                -height / 2.0,
            );
        }
        Outline::Circle { radius } => {
            let _ = write!(svg, "<circle cx=\"0\" cy=\"0\" r=\"{radius}\"{attrs}/>");
        }
        Outline::Polygon { sides, radius } => {
            let points = polygon_vertices(sides, radius)
                .iter()
                .map(|(x, y)| format!("{x},{y}"))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(svg, "<polygon points=\"{points}\"{attrs}/>");
        }
    }
}

fn write_image(svg: &mut String, href: &str, x: f32, y: f32, width: f32, height: f32) {
    let _ = write!(
        svg,
        "<image x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>",
        escape_xml(href),
    );
}

fn write_upload_icon(svg: &mut String, size: f32, color: &str) {
    let s = size;
    let _ = write!(
        svg,
        "<path d=\"M0 {} L0 {} M{} {} L0 {} L{} {} M{} {} L{} {} L{} {} L{} {}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
        s * 0.2,
        -s * 0.35,
        -s * 0.2,
        -s * 0.15,
        -s * 0.35,
        s * 0.2,
        -s * 0.15,
        -s * 0.4,
        s * 0.1,
        -s * 0.4,
        s * 0.4,
        s * 0.4,
        s * 0.4,
        s * 0.4,
        s * 0.1,
        escape_xml(color),
        (s * 0.08).max(1.0),
    );
}

#[allow(clippy::cast_precision_loss)]
fn write_text(svg: &mut String, run: &TextRun) {
    let lines = wrap_text(&run.text, run.width, run.font_size);
    let block_height = run.line_height * lines.len().max(1) as f32;
    let top = -block_height / 2.0;
    let (x, anchor) = match run.text_align {
        TextAlign::Left => (-run.width / 2.0, "start"),
        TextAlign::Center => (0.0, "middle"),
        TextAlign::Right => (run.width / 2.0, "end"),
    };
    let style = match run.font_style {
        FontStyle::Normal => "normal",
        FontStyle::Italic => "italic",
    };

    let _ = write!(
        svg,
        "<text font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" font-style=\"{style}\" text-anchor=\"{anchor}\" fill=\"{}\">",
        escape_xml(&run.font_family),
        run.font_size,
        escape_xml(&run.font_weight.to_string()),
        escape_xml(&run.color),
    );
    for (i, line) in lines.iter().enumerate() {
        let baseline =
            top + i as f32 * run.line_height + (run.line_height - run.font_size) / 2.0 + run.font_size * 0.8;
        let _ = write!(
            svg,
            "<tspan x=\"{x}\" y=\"{baseline}\">{}</tspan>",
            escape_xml(line),
        );
    }
    svg.push_str("</text>");
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use artboard_core::{ElementId, FontWeight};

    fn tree_with(nodes: Vec<DrawNode>) -> DrawTree {
        DrawTree {
            width: 100,
            height: 80,
            background_color: "#ffffff".to_string(),
            background: None,
            elements: vec![ElementDraw {
                id: ElementId::new(),
                x: 50.0,
                y: 40.0,
                rotation: 15.0,
                opacity: 1.0,
                nodes,
            }],
        }
    }

    fn text_run(text: &str) -> TextRun {
        TextRun {
            text: text.to_string(),
            font_family: "Inter".to_string(),
            font_size: 16.0,
            font_style: FontStyle::Italic,
            font_weight: FontWeight::Named("bold".to_string()),
            text_align: TextAlign::Right,
            width: 80.0,
            line_height: 19.2,
            color: "#111111".to_string(),
        }
    }

    #[test]
    fn test_svg_dimensions_use_pixel_ratio() {
        let svg = TemplateExporter::with_defaults().render_to_svg(&tree_with(Vec::new()));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("width=\"200\""));
        assert!(svg.contains("height=\"160\""));
        assert!(svg.contains("viewBox=\"0 0 100 80\""));
    }

    #[test]
    fn test_svg_element_placement() {
        let svg = TemplateExporter::with_defaults().render_to_svg(&tree_with(vec![
            DrawNode::Shape {
                outline: Outline::Circle { radius: 10.0 },
                paint: Paint::Solid {
                    color: "#ff0000".to_string(),
                },
            },
        ]));
        assert!(svg.contains("translate(50 40) rotate(15)"));
        assert!(svg.contains("<circle cx=\"0\" cy=\"0\" r=\"10\" fill=\"#ff0000\"/>"));
    }

    #[test]
    fn test_svg_clip_and_dash() {
        let svg = TemplateExporter::with_defaults().render_to_svg(&tree_with(vec![
            DrawNode::Clipped {
                clip: Outline::Polygon {
                    sides: 3,
                    radius: 20.0,
                },
                paint: Paint::Solid {
                    color: "#00ff00".to_string(),
                },
            },
            DrawNode::DashedOutline {
                outline: Outline::Rect {
                    width: 40.0,
                    height: 20.0,
                    corner_radius: 0.0,
                },
                color: "#999".to_string(),
                width: 2.0,
                dash: [8.0, 6.0],
            },
        ]));
        assert!(svg.contains("<clipPath id=\"clip-0-0\"><polygon"));
        assert!(svg.contains("clip-path=\"url(#clip-0-0)\""));
        assert!(svg.contains("stroke-dasharray=\"8 6\""));
    }

    #[test]
    fn test_svg_text_styles_and_escaping() {
        let svg = TemplateExporter::with_defaults()
            .render_to_svg(&tree_with(vec![DrawNode::Text(text_run("A < B & C"))]));
        assert!(svg.contains("A &lt; B &amp; C"));
        assert!(svg.contains("font-weight=\"bold\""));
        assert!(svg.contains("font-style=\"italic\""));
        assert!(svg.contains("text-anchor=\"end\""));
    }

    #[test]
    fn test_png_export_produces_valid_bytes() {
        let exporter = TemplateExporter::with_defaults();
        let png = exporter
            .export(
                &tree_with(vec![DrawNode::Shape {
                    outline: Outline::Rect {
                        width: 40.0,
                        height: 40.0,
                        corner_radius: 4.0,
                    },
                    paint: Paint::Solid {
                        color: "#123456".to_string(),
                    },
                }]),
                ExportFormat::Png,
            )
            .expect("png export");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }

    #[test]
    fn test_jpeg_export_produces_valid_bytes() {
        let jpeg = TemplateExporter::with_defaults()
            .export(&tree_with(Vec::new()), ExportFormat::Jpeg)
            .expect("jpeg export");
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_invalid_pixel_ratio_falls_back() {
        let exporter = TemplateExporter::new(ExportConfig {
            pixel_ratio: f32::NAN,
            ..Default::default()
        });
        let svg = exporter.render_to_svg(&tree_with(Vec::new()));
        assert!(svg.contains("width=\"200\""));
    }
}
