//! # Artboard Renderer
//!
//! Turns Artboard templates into draw trees and raster exports.
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────┐   ┌────────────────┐   ┌──────────┐   ┌───────────────┐
//! │ Template  │──▶│ render_template│──▶│ DrawTree │──▶│ TemplateExporter│
//! └───────────┘   │  fit / stroke  │   └──────────┘   │ SVG → resvg    │
//!       ▲         └────────────────┘                  └───────────────┘
//!       │                 ▲
//!  ImageSource ──▶ ImageSlots (generation-checked decodes)
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod draw;
pub mod error;
#[cfg(feature = "export")]
pub mod export;
pub mod fit;
pub mod image;
pub mod render;
pub mod stroke;

pub use draw::{BackgroundDraw, DrawNode, DrawTree, ElementDraw, Outline, Paint, TextRun};
pub use error::{RenderError, RenderResult};
#[cfg(feature = "export")]
pub use export::{ExportConfig, ExportFormat, TemplateExporter, EXPORT_PIXEL_RATIO};
pub use fit::{contain, cover, ContainFit, CoverFit, FitTarget};
pub use image::{DecodedImage, ImageSlot, ImageSlots, ImageSource, LocalImageSource, SlotState};
pub use render::{render_element, render_template, RenderContext, RenderMode};
