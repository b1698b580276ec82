//! Image loading and decode slots.
//!
//! Sources are data URIs or local files. A decoded image keeps its pixel
//! size and an embeddable data URI; pixels themselves are re-read by the
//! rasterizer. Decodes land in [`ImageSlots`], where each slot carries a
//! generation counter so a late completion for a superseded request is
//! dropped instead of overwriting newer state.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use artboard_core::{ElementId, Template};
use async_trait::async_trait;
use base64::Engine;
use tracing::{debug, warn};

use crate::error::{RenderError, RenderResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF, first frame only.
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }
        Self::Unknown
    }

    /// MIME type, or `None` for formats that must be re-encoded before embedding.
    #[must_use]
    pub fn mime(self) -> Option<&'static str> {
        match self {
            Self::Png => Some("image/png"),
            Self::Jpeg => Some("image/jpeg"),
            Self::WebP => Some("image/webp"),
            Self::Gif => Some("image/gif"),
            Self::Unknown => None,
        }
    }
}

/// A successfully decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Original format.
    pub format: ImageFormat,
    /// Self-contained data URI for embedding in a draw tree.
    pub href: String,
}

/// Decode an image from raw bytes.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the bytes are not a decodable image.
pub fn decode_bytes(data: &[u8]) -> RenderResult<DecodedImage> {
    let format = ImageFormat::from_magic_bytes(data);
    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Decode(format!("unrecognized image data: {e}")))?;
    let (width, height) = (img.width(), img.height());

    let href = match format.mime() {
        Some(mime) => to_data_uri(mime, data),
        None => {
            let mut png = std::io::Cursor::new(Vec::new());
            img.write_to(&mut png, image::ImageFormat::Png)
                .map_err(|e| RenderError::Decode(format!("re-encoding failed: {e}")))?;
            to_data_uri("image/png", png.get_ref())
        }
    };

    Ok(DecodedImage {
        width,
        height,
        format,
        href,
    })
}

/// Decode an image from a data URI such as `data:image/png;base64,iVBOR...`.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the URI is malformed or the payload is
/// not a decodable image.
pub fn decode_data_uri(uri: &str) -> RenderResult<DecodedImage> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Decode("not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Decode("invalid data URI: missing comma".to_string()))?;

    let bytes = if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::Decode(format!("invalid base64: {e}")))?
    } else {
        percent_decode(payload)?
    };

    decode_bytes(&bytes)
}

/// Build a base64 data URI.
#[must_use]
pub fn to_data_uri(mime: &str, data: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(data)
    )
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Decode("invalid percent encoding".to_string()))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Resolves an image source string into a decoded image.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch and decode `src`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or decoded; callers
    /// treat this exactly like a missing image.
    async fn resolve(&self, src: &str) -> RenderResult<DecodedImage>;
}

/// Resolves data URIs and local file paths.
#[derive(Debug, Clone, Default)]
pub struct LocalImageSource {
    root: Option<PathBuf>,
}

impl LocalImageSource {
    /// Create a source resolving relative paths against the working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source resolving relative paths against `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn path_for(&self, src: &str) -> PathBuf {
        let path = Path::new(src);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl ImageSource for LocalImageSource {
    async fn resolve(&self, src: &str) -> RenderResult<DecodedImage> {
        if src.starts_with("data:") {
            return decode_data_uri(src);
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return Err(RenderError::Decode(format!(
                "remote image sources are not supported: {src}"
            )));
        }
        let bytes = tokio::fs::read(self.path_for(src)).await?;
        decode_bytes(&bytes)
    }
}

/// A place a decoded image can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    /// The artboard background image.
    Background,
    /// The editor preview image of a placeholder element.
    Placeholder(ElementId),
    /// The `src` of an image element.
    Source(ElementId),
    /// The user photo in generator mode.
    Photo,
}

/// Proof of a decode request; stale once the slot is requested again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slot: ImageSlot,
    generation: u64,
}

/// Decode state of one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    /// A decode is in flight.
    Pending,
    /// The latest decode succeeded.
    Ready(Arc<DecodedImage>),
    /// The latest decode failed; renders as "no image".
    Unavailable,
}

#[derive(Debug)]
struct SlotEntry {
    generation: u64,
    state: SlotState,
}

/// Decoded images by slot, with superseding requests.
#[derive(Debug, Default)]
pub struct ImageSlots {
    entries: HashMap<ImageSlot, SlotEntry>,
    next_generation: u64,
}

impl ImageSlots {
    /// Create an empty slot table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a decode for `slot`, superseding any request already in flight.
    pub fn request(&mut self, slot: ImageSlot) -> Ticket {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.entries.insert(
            slot,
            SlotEntry {
                generation,
                state: SlotState::Pending,
            },
        );
        debug!(?slot, generation, "Image decode requested");
        Ticket { slot, generation }
    }

    /// Record the outcome of a decode.
    ///
    /// Returns `false` and discards the result when the ticket is stale.
    pub fn complete(&mut self, ticket: Ticket, result: RenderResult<DecodedImage>) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.slot) else {
            warn!(slot = ?ticket.slot, "Discarding decode for cleared slot");
            return false;
        };
        if entry.generation != ticket.generation {
            warn!(
                slot = ?ticket.slot,
                stale = ticket.generation,
                current = entry.generation,
                "Discarding superseded decode"
            );
            return false;
        }
        entry.state = match result {
            Ok(image) => SlotState::Ready(Arc::new(image)),
            Err(e) => {
                warn!(slot = ?ticket.slot, error = %e, "Image unavailable");
                SlotState::Unavailable
            }
        };
        true
    }

    /// Drop a slot. Any in-flight decode for it becomes stale.
    pub fn clear(&mut self, slot: ImageSlot) {
        self.entries.remove(&slot);
    }

    /// Current state of a slot.
    #[must_use]
    pub fn state(&self, slot: ImageSlot) -> Option<&SlotState> {
        self.entries.get(&slot).map(|entry| &entry.state)
    }

    /// The decoded image in a slot, if ready.
    #[must_use]
    pub fn get(&self, slot: ImageSlot) -> Option<&DecodedImage> {
        match self.state(slot) {
            Some(SlotState::Ready(image)) => Some(image),
            _ => None,
        }
    }

    /// Request, resolve and complete one slot.
    ///
    /// Returns whether the result was stored.
    pub async fn load<S: ImageSource + ?Sized>(
        &mut self,
        source: &S,
        slot: ImageSlot,
        src: &str,
    ) -> bool {
        let ticket = self.request(slot);
        let result = source.resolve(src).await;
        self.complete(ticket, result)
    }

    /// Load every image a template references: background, image element
    /// sources and placeholder previews.
    ///
    /// Slots of elements that no longer reference an image, or are no longer
    /// in the template, are dropped.
    pub async fn load_template<S: ImageSource + ?Sized>(&mut self, source: &S, template: &Template) {
        let live: HashSet<ElementId> = template.elements().iter().map(|e| e.id).collect();
        self.entries.retain(|slot, _| match slot {
            ImageSlot::Placeholder(id) | ImageSlot::Source(id) => live.contains(id),
            ImageSlot::Background | ImageSlot::Photo => true,
        });

        match &template.background_image {
            Some(src) if !src.is_empty() => {
                self.load(source, ImageSlot::Background, src).await;
            }
            _ => self.clear(ImageSlot::Background),
        }

        for element in template.elements() {
            match &element.shape {
                artboard_core::Shape::Image { src, .. } if !src.is_empty() => {
                    self.load(source, ImageSlot::Source(element.id), src).await;
                }
                _ => self.clear(ImageSlot::Source(element.id)),
            }
            match &element.placeholder_image {
                Some(src) if element.is_photo_slot() && !src.is_empty() => {
                    self.load(source, ImageSlot::Placeholder(element.id), src)
                        .await;
                }
                _ => self.clear(ImageSlot::Placeholder(element.id)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artboard_core::{Element, ElementKind, Shape};

    /// 1x1 red PNG.
    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn png_uri() -> String {
        format!("data:image/png;base64,{PNG_1X1}")
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF]), ImageFormat::Unknown);
    }

    #[test]
    fn test_data_uri_decodes() {
        let image = decode_data_uri(&png_uri()).expect("decode");
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.format, ImageFormat::Png);
        assert!(image.href.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_invalid_data_uris() {
        assert!(matches!(
            decode_data_uri("not a data uri"),
            Err(RenderError::Decode(_))
        ));
        assert!(decode_data_uri("data:image/png").is_err());
        assert!(decode_data_uri("data:image/png;base64,!!!").is_err());
        assert!(decode_data_uri("data:text/plain,hello").is_err());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("a%20b").expect("decode"), b"a b");
        assert!(percent_decode("%zz").is_err());
        assert!(percent_decode("%2").is_err());
    }

    #[test]
    fn test_stale_completion_discarded() {
        let mut slots = ImageSlots::new();
        let first = slots.request(ImageSlot::Photo);
        let second = slots.request(ImageSlot::Photo);

        let image = decode_data_uri(&png_uri()).expect("decode");
        assert!(!slots.complete(first, Ok(image.clone())));
        assert_eq!(slots.state(ImageSlot::Photo), Some(&SlotState::Pending));

        assert!(slots.complete(second, Ok(image)));
        assert!(slots.get(ImageSlot::Photo).is_some());
    }

    #[test]
    fn test_failed_decode_is_unavailable() {
        let mut slots = ImageSlots::new();
        let ticket = slots.request(ImageSlot::Background);
        assert!(slots.complete(ticket, Err(RenderError::Decode("bad".to_string()))));
        assert_eq!(
            slots.state(ImageSlot::Background),
            Some(&SlotState::Unavailable)
        );
        assert!(slots.get(ImageSlot::Background).is_none());
    }

    #[test]
    fn test_cleared_slot_rejects_completion() {
        let mut slots = ImageSlots::new();
        let id = ElementId::new();
        let ticket = slots.request(ImageSlot::Placeholder(id));
        slots.clear(ImageSlot::Placeholder(id));
        let image = decode_data_uri(&png_uri()).expect("decode");
        assert!(!slots.complete(ticket, Ok(image)));
        assert!(slots.state(ImageSlot::Placeholder(id)).is_none());
    }

    #[tokio::test]
    async fn test_local_source_resolves_data_uri() {
        let source = LocalImageSource::new();
        let image = source.resolve(&png_uri()).await.expect("resolve");
        assert_eq!(image.width, 1);

        let missing = source.resolve("/definitely/not/here.png").await;
        assert!(matches!(missing, Err(RenderError::Io(_))));

        let remote = source.resolve("https://example.com/a.png").await;
        assert!(matches!(remote, Err(RenderError::Decode(_))));
    }

    #[tokio::test]
    async fn test_reload_drops_emptied_and_deleted_slots() {
        let source = LocalImageSource::new();
        let mut template = Template::default();
        let kept = template
            .add_element(Element::with_kind(ElementKind::Image))
            .expect("image");
        let removed = template
            .add_element(Element::with_kind(ElementKind::Image))
            .expect("image");
        for id in [kept, removed] {
            template
                .update_element(id, |el| {
                    if let Shape::Image { src, .. } = &mut el.shape {
                        *src = png_uri();
                    }
                })
                .expect("set src");
        }

        let mut slots = ImageSlots::new();
        slots.load_template(&source, &template).await;
        assert!(slots.get(ImageSlot::Source(kept)).is_some());
        assert!(slots.get(ImageSlot::Source(removed)).is_some());

        template.remove_element(removed).expect("remove");
        template
            .update_element(kept, |el| {
                if let Shape::Image { src, .. } = &mut el.shape {
                    src.clear();
                }
            })
            .expect("clear src");
        slots.load_template(&source, &template).await;
        assert!(slots.state(ImageSlot::Source(kept)).is_none());
        assert!(slots.state(ImageSlot::Source(removed)).is_none());
    }
}
