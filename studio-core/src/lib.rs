//! # Thumb Studio Core
//!
//! Scene graph and editing model for layer-based thumbnail design.
//! Pure logic: no rendering, no network, no UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 studio-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Scene Graph     │  Editor                  │
//! │  - Objects       │  - Commands              │
//! │  - Stack order   │  - Selection             │
//! │  - Background    │  - Auto-design           │
//! ├─────────────────────────────────────────────┤
//! │  Layout Schema   │  Local State             │
//! │  - JSON layout   │  - Credit ledger         │
//! │  - Validation    │  - Gamification          │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod credits;
pub mod editor;
pub mod element;
pub mod error;
pub mod event;
pub mod gamification;
pub mod layers;
pub mod scene;
pub mod schema;
pub mod store;
pub mod style;

pub use credits::{CreditAction, CreditLedger};
pub use editor::{Alignment, AutoDesignElement, Property, SceneEditor, TextTransform};
pub use element::{Bounds, Geometry, ObjectId, ObjectKind, ObjectMetadata, SceneObject};
pub use error::{StudioError, StudioResult};
pub use event::{EditorEvent, Listeners};
pub use gamification::{ActionKind, ActionPayload, GamificationEngine, GamificationState};
pub use layers::{LayerAction, LayerPanel, LayerRow};
pub use scene::Scene;
pub use schema::SceneDocument;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use style::{Fill, Shadow, TextStyle, TextStylePatch};

/// Studio core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
