//! # Surface Builder Core
//!
//! Document model and editing engine for a visual page/widget builder.
//! Pages are trees of typed UI components stored as a flat id map.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               EditorSession                 │
//! ├─────────────────────────────────────────────┤
//! │  Document        │  History / Clipboard     │
//! │  - Node map      │  - Snapshots             │
//! │  - Tree ops      │  - Subtree capture       │
//! │  - Cycle guard   │  - Id remapping          │
//! ├─────────────────────────────────────────────┤
//! │  Schema Registry │  Widgets & Assets        │
//! │  - Kinds/props   │  - TTL widget cache      │
//! │  - Defaults      │  - Storage path signing  │
//! │  - Normalizer    │  - Surface import/export │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assets;
pub mod clipboard;
pub mod defaults;
pub mod document;
pub mod drag;
pub mod error;
pub mod history;
pub mod node;
pub mod normalize;
pub mod schema;
pub mod session;
pub mod surface;
pub mod value;
pub mod widget;

pub use assets::{is_storage_path, prepare_for_render, prepare_surface, AssetResolver, ResolvedAsset};
pub use clipboard::ClipboardEntry;
pub use defaults::{default_prop, default_props};
pub use document::{Document, NodePatch, OutlineEntry, DEFAULT_ROOT_ID};
pub use drag::{DragSource, DragTransaction, DropOutcome, DropPoint};
pub use error::{BuilderError, BuilderResult, ServiceError};
pub use history::{History, HistoryConfig, Snapshot};
pub use node::{ComponentNode, Kind, NodeId, Style};
pub use normalize::{normalize_component, normalize_components, normalize_report, NormalizeReport};
pub use schema::{schema_for, ChildShape, ComponentKind, KindSchema, PropSpec, ValueKind};
pub use session::{BuilderConfig, EditorSession, Selection};
pub use surface::{parse_raw, CanvasSettings, SurfaceExport};
pub use value::{BoundValue, ChildList, PathBinding, PathDefault, PropValue, Props, SelectOption};
pub use widget::{
    BatchResolution, CacheStats, Clock, ManualClock, SystemClock, Version, WidgetCache,
    WidgetCacheConfig, WidgetDefinition, WidgetRef, WidgetRefStore, WidgetResolver,
    WidgetService, WidgetSnapshot,
};

/// Builder core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
