//! Inkboard Core Library
//!
//! Platform-agnostic scene model, tool state machines and document I/O for the
//! Inkboard whiteboard.

pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod export;
pub mod factory;
pub mod history;
pub mod input;
pub mod loader;
pub mod overlay;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod storage;
pub mod tools;

pub use config::EditorConfig;
pub use document::{LoadReport, SkipReason, SkippedNode, read_document, write_document};
pub use editor::{Editor, FileInput, FileOutcome, ImportKind, LoadOutcome};
pub use error::{ConfigError, DocumentError, EditorError, EditorResult, ExportError, LoadError};
pub use export::{Blob, ExportService, Rasterizer};
pub use factory::{ShapeFactory, TextFactory};
pub use history::HistoryStack;
pub use input::{InputState, MouseButton, PointerEvent};
pub use loader::{DataUriLoader, ImageLoader, LoadTarget, LoadTicket};
pub use overlay::{OverlayRegistry, TextEditResult, TextKey, TextOverlay};
pub use scene::Scene;
pub use selection::{ManipulationState, Selection, SelectionController};
pub use tools::{ToolController, ToolKind, ToolMode};
