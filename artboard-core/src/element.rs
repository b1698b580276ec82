//! Template elements - the shapes, text and images placed on an artboard.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest width or height any element may have, in artboard units.
pub const MIN_DIMENSION: f32 = 20.0;

/// Smallest radius a circle or polygon may have, in artboard units.
pub const MIN_RADIUS: f32 = 10.0;

/// Fewest sides a polygon may have.
pub const MIN_POLYGON_SIDES: u8 = 3;

/// Most sides a polygon may have.
pub const MAX_POLYGON_SIDES: u8 = 12;

/// Smallest font size a text element may have.
pub const MIN_FONT_SIZE: f32 = 1.0;

/// Line height used to derive the vertical extent of text, as a multiple of the font size.
pub const TEXT_LINE_HEIGHT: f32 = 1.2;

/// Average glyph advance used for line wrapping, in ems.
pub const TEXT_GLYPH_ADVANCE_EM: f32 = 0.55;

/// Default solid fill for new shapes.
pub const DEFAULT_FILL: &str = "#4e79a7";

/// Default color for new text.
pub const DEFAULT_TEXT_FILL: &str = "#111111";

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an element ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a stroke layer sits relative to the element outline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokePosition {
    /// Entirely inside the outline.
    Inside,
    /// Straddling the outline.
    #[default]
    Center,
    /// Entirely outside the outline.
    Outside,
}

/// One ring of outline paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeLayer {
    /// Stroke color (any CSS color string).
    pub color: String,
    /// Stroke width in artboard units. Zero is a legal no-op.
    pub width: f32,
    /// Placement relative to the outline.
    #[serde(default)]
    pub position: StrokePosition,
}

impl StrokeLayer {
    /// Create a new stroke layer.
    #[must_use]
    pub fn new(color: impl Into<String>, width: f32, position: StrokePosition) -> Self {
        Self {
            color: color.into(),
            width,
            position,
        }
    }
}

/// Manual reposition of the placeholder preview image within its shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageOffset {
    /// Horizontal offset in artboard units.
    pub x: f32,
    /// Vertical offset in artboard units.
    pub y: f32,
}

/// Font style of a text element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright glyphs.
    #[default]
    Normal,
    /// Slanted glyphs.
    Italic,
}

/// Font weight, either numeric (`100`..`900`) or a CSS keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontWeight {
    /// Numeric weight.
    Numeric(u16),
    /// Named weight such as `bold`.
    Named(String),
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::Numeric(400)
    }
}

impl std::fmt::Display for FontWeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Horizontal alignment of wrapped text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
}

/// Variant-specific geometry of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// A rectangle with optional rounded corners.
    #[serde(rename_all = "camelCase")]
    Rect {
        /// Width in artboard units.
        width: f32,
        /// Height in artboard units.
        height: f32,
        /// Corner radius, at most half the shorter side.
        #[serde(default)]
        corner_radius: f32,
    },

    /// A circle.
    Circle {
        /// Radius in artboard units.
        radius: f32,
    },

    /// A regular polygon whose first vertex points up.
    Polygon {
        /// Number of sides (3 to 12).
        sides: u8,
        /// Circumscribed radius in artboard units.
        radius: f32,
    },

    /// A wrapped run of styled text.
    #[serde(rename_all = "camelCase")]
    Text {
        /// Text content.
        text: String,
        /// Font family name.
        font_family: String,
        /// Font size in artboard units.
        font_size: f32,
        /// Upright or italic.
        #[serde(default)]
        font_style: FontStyle,
        /// Numeric or named weight.
        #[serde(default)]
        font_weight: FontWeight,
        /// Alignment within the wrap width.
        #[serde(default)]
        text_align: TextAlign,
        /// Wrap width. Height is derived from font metrics.
        width: f32,
    },

    /// A static bitmap.
    Image {
        /// Width in artboard units.
        width: f32,
        /// Height in artboard units.
        height: f32,
        /// Image source (data URI, URL or path).
        src: String,
    },
}

/// Discriminant of [`Shape`], used where only the variant matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// [`Shape::Rect`].
    Rect,
    /// [`Shape::Circle`].
    Circle,
    /// [`Shape::Polygon`].
    Polygon,
    /// [`Shape::Text`].
    Text,
    /// [`Shape::Image`].
    Image,
}

impl ElementKind {
    /// Whether the variant keeps a 1:1 aspect ratio under every resize.
    #[must_use]
    pub fn is_aspect_locked(self) -> bool {
        matches!(self, Self::Circle | Self::Polygon)
    }

    /// Whether the variant may be filled by a user-supplied photo.
    #[must_use]
    pub fn supports_placeholder(self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl Shape {
    /// Default geometry for a freshly created element of `kind`.
    #[must_use]
    pub fn default_for(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Rect => Self::Rect {
                width: 200.0,
                height: 200.0,
                corner_radius: 0.0,
            },
            ElementKind::Circle => Self::Circle { radius: 100.0 },
            ElementKind::Polygon => Self::Polygon {
                sides: 6,
                radius: 100.0,
            },
            ElementKind::Text => Self::Text {
                text: "Text".to_string(),
                font_family: "Inter".to_string(),
                font_size: 48.0,
                font_style: FontStyle::Normal,
                font_weight: FontWeight::default(),
                text_align: TextAlign::Center,
                width: 400.0,
            },
            ElementKind::Image => Self::Image {
                width: 200.0,
                height: 200.0,
                src: String::new(),
            },
        }
    }

    /// The variant discriminant.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Rect { .. } => ElementKind::Rect,
            Self::Circle { .. } => ElementKind::Circle,
            Self::Polygon { .. } => ElementKind::Polygon,
            Self::Text { .. } => ElementKind::Text,
            Self::Image { .. } => ElementKind::Image,
        }
    }

    /// Unrotated bounding box size `(width, height)` centered on the element origin.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bounding_size(&self) -> (f32, f32) {
        match self {
            Self::Rect { width, height, .. } | Self::Image { width, height, .. } => {
                (*width, *height)
            }
            Self::Circle { radius } | Self::Polygon { radius, .. } => (radius * 2.0, radius * 2.0),
            Self::Text {
                text,
                font_size,
                width,
                ..
            } => {
                let lines = wrap_text(text, *width, *font_size).len().max(1) as f32;
                (*width, font_size * TEXT_LINE_HEIGHT * lines)
            }
        }
    }

    /// Clamp every dimension into its legal range.
    ///
    /// Non-finite values fall back to the variant default before clamping.
    pub fn normalize(&mut self) {
        let defaults = Self::default_for(self.kind());
        match (self, defaults) {
            (
                Self::Rect {
                    width,
                    height,
                    corner_radius,
                },
                Self::Rect {
                    width: dw,
                    height: dh,
                    ..
                },
            ) => {
                *width = clamp_min(*width, dw, MIN_DIMENSION);
                *height = clamp_min(*height, dh, MIN_DIMENSION);
                *corner_radius = clamp_corner_radius(*corner_radius, *width, *height);
            }
            (Self::Circle { radius }, Self::Circle { radius: dr }) => {
                *radius = clamp_min(*radius, dr, MIN_RADIUS);
            }
            (Self::Polygon { sides, radius }, Self::Polygon { radius: dr, .. }) => {
                *sides = (*sides).clamp(MIN_POLYGON_SIDES, MAX_POLYGON_SIDES);
                *radius = clamp_min(*radius, dr, MIN_RADIUS);
            }
            (
                Self::Text {
                    font_size, width, ..
                },
                Self::Text {
                    font_size: dfs,
                    width: dw,
                    ..
                },
            ) => {
                *font_size = clamp_min(*font_size, dfs, MIN_FONT_SIZE);
                *width = clamp_min(*width, dw, MIN_DIMENSION);
            }
            (
                Self::Image { width, height, .. },
                Self::Image {
                    width: dw,
                    height: dh,
                    ..
                },
            ) => {
                *width = clamp_min(*width, dw, MIN_DIMENSION);
                *height = clamp_min(*height, dh, MIN_DIMENSION);
            }
            _ => unreachable!("default_for returns the same variant"),
        }
    }
}

/// Clamp a corner radius into `[0, min(width, height) / 2]`.
#[must_use]
pub fn clamp_corner_radius(corner_radius: f32, width: f32, height: f32) -> f32 {
    let max = (width.min(height) / 2.0).max(0.0);
    if corner_radius.is_finite() {
        corner_radius.clamp(0.0, max)
    } else {
        0.0
    }
}

fn clamp_min(value: f32, fallback: f32, min: f32) -> f32 {
    let value = if value.is_finite() { value } else { fallback };
    value.max(min)
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

const fn default_opacity() -> f32 {
    1.0
}

const fn default_image_scale() -> f32 {
    1.0
}

/// A design element placed on the artboard.
///
/// `x`/`y` is the element's center; rotation is applied about that point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Variant geometry.
    #[serde(flatten)]
    pub shape: Shape,
    /// Center X in artboard coordinates.
    pub x: f32,
    /// Center Y in artboard coordinates.
    pub y: f32,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: f32,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Solid fill (or text color).
    pub fill: String,
    /// Whether a user-supplied photo replaces the fill.
    #[serde(default)]
    pub is_placeholder: bool,
    /// Stroke layers in paint order.
    #[serde(default)]
    pub strokes: Vec<StrokeLayer>,
    /// Editor-only preview image for placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_image: Option<String>,
    /// Manual reposition of the preview image.
    #[serde(default)]
    pub image_offset: ImageOffset,
    /// Manual zoom of the preview image.
    #[serde(default = "default_image_scale")]
    pub image_scale: f32,
}

impl Element {
    /// Create a new element with the given geometry at the origin.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        let fill = if shape.kind() == ElementKind::Text {
            DEFAULT_TEXT_FILL
        } else {
            DEFAULT_FILL
        };
        let mut element = Self {
            id: ElementId::new(),
            shape,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            opacity: 1.0,
            fill: fill.to_string(),
            is_placeholder: false,
            strokes: Vec::new(),
            placeholder_image: None,
            image_offset: ImageOffset::default(),
            image_scale: 1.0,
        };
        element.normalize();
        element
    }

    /// Create an element of `kind` with default geometry.
    #[must_use]
    pub fn with_kind(kind: ElementKind) -> Self {
        Self::new(Shape::default_for(kind))
    }

    /// Set the center position.
    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the rotation in degrees.
    #[must_use]
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the solid fill.
    #[must_use]
    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = fill.into();
        self
    }

    /// Set the stroke layers.
    #[must_use]
    pub fn with_strokes(mut self, strokes: Vec<StrokeLayer>) -> Self {
        self.strokes = strokes;
        self.normalize();
        self
    }

    /// Mark the element as a photo placeholder. Ignored for text.
    #[must_use]
    pub fn with_placeholder(mut self, is_placeholder: bool) -> Self {
        self.is_placeholder = is_placeholder;
        self.normalize();
        self
    }

    /// The variant discriminant.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.shape.kind()
    }

    /// Whether this element should be filled by a photo.
    #[must_use]
    pub fn is_photo_slot(&self) -> bool {
        self.is_placeholder && self.kind().supports_placeholder()
    }

    /// Restore every invariant of the element model in place.
    ///
    /// Called at every mutation site so that no caller can persist an
    /// undersized, non-finite or otherwise illegal element.
    pub fn normalize(&mut self) {
        self.shape.normalize();
        self.x = finite_or(self.x, 0.0);
        self.y = finite_or(self.y, 0.0);
        self.rotation = finite_or(self.rotation, 0.0);
        self.opacity = finite_or(self.opacity, 1.0).clamp(0.0, 1.0);
        for stroke in &mut self.strokes {
            stroke.width = finite_or(stroke.width, 0.0).max(0.0);
        }
        if !self.kind().supports_placeholder() {
            self.is_placeholder = false;
        }
        self.image_offset.x = finite_or(self.image_offset.x, 0.0);
        self.image_offset.y = finite_or(self.image_offset.y, 0.0);
        if !(self.image_scale.is_finite() && self.image_scale > 0.0) {
            self.image_scale = 1.0;
        }
    }

    /// Check if a point (in artboard coordinates) falls inside the element's
    /// rotated bounding box.
    #[must_use]
    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        let (w, h) = self.shape.bounding_size();
        let (sin, cos) = (-self.rotation.to_radians()).sin_cos();
        let dx = px - self.x;
        let dy = py - self.y;
        let lx = dx * cos - dy * sin;
        let ly = dx * sin + dy * cos;
        lx.abs() <= w / 2.0 && ly.abs() <= h / 2.0
    }
}

/// Greedy word wrap against an estimated glyph advance.
///
/// Explicit newlines always break; a single word longer than the width
/// stays on its own line.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn wrap_text(text: &str, width: f32, font_size: f32) -> Vec<String> {
    let advance = (font_size * TEXT_GLYPH_ADVANCE_EM).max(f32::EPSILON);
    let max_chars = ((width / advance).floor() as usize).max(1);

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}
