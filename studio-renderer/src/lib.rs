//! # Thumb Studio Renderer
//!
//! Exports a scene to SVG, PNG or JPEG.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌─────────────┐    ┌──────────┐
//! │  Scene   │ -> │   SVG    │ -> │ usvg/resvg  │ -> │ PNG/JPEG │
//! │ (core)   │    │ document │    │ tiny-skia   │    │ (image)  │
//! └──────────┘    └──────────┘    └─────────────┘    └──────────┘
//! ```
//!
//! The SVG document uses the scene's own units as its view box, so any
//! output width preserves the aspect ratio.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;

pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportFormat, SceneExporter, EXPORT_4K_WIDTH};
