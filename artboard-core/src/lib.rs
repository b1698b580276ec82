//! # Artboard Core
//!
//! Element model and transform engine for the Artboard template editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                artboard-core                │
//! ├─────────────────────────────────────────────┤
//! │  Element Model    │  Transform Reconciler   │
//! │  - Shapes / text  │  - Gesture -> attributes│
//! │  - Stroke layers  │  - Min size, aspect lock│
//! ├─────────────────────────────────────────────┤
//! │  Editor Session   │  Serializer / Store     │
//! │  - Selection FSM  │  - Snapshot, record     │
//! │  - Import/export  │  - Publish, by-slug load│
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod element;
pub mod error;
pub mod generator;
pub mod schema;
pub mod session;
pub mod store;
pub mod template;
pub mod transform;

pub use element::{
    Element, ElementId, ElementKind, FontStyle, FontWeight, ImageOffset, Shape, StrokeLayer,
    StrokePosition, TextAlign,
};
pub use error::{ArtboardError, ArtboardResult};
pub use generator::{load_generator, GeneratorLoad, GeneratorView};
pub use schema::{TemplateRecord, TemplateSnapshot};
pub use session::{EditorSession, ElementState, Interaction, PublishError};
pub use store::{MemoryTemplateStore, PublishReceipt, StoreError, TemplateStore};
pub use template::Template;
pub use transform::{BoundingBox, LiveTransform, Reconciled};

/// Artboard core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
