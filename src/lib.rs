//! Headless core of a small diagram editor.
//!
//! The crate owns the in-memory diagram (shapes and the connections between
//! them), the pan/zoom transform, the connector router, undo history, the
//! pointer-driven editing state machine and a deterministic export pipeline
//! (PNG, single-page PDF, JSON). It performs no persistence of its own: a host
//! observes [`Editor`] after every change and decides where the document goes.

pub mod commands;
pub mod editor;
pub mod error;
pub mod export;
pub mod history;
pub mod model;
pub mod router;
pub mod settings;
pub mod viewport;

pub use commands::{Command, CommandSpec};
pub use editor::{Editor, Hit, Mode, PointerButton, Request, Selection, Tool};
pub use error::{EditorError, ExportError, ImportError, ModelError, SettingsError};
pub use export::{DefaultImageSource, ExportFormat, ExportPayload, Exporter, ImageSource};
pub use model::{Connection, Document, Point, RectF, Shape, ShapeKind, ShapePatch, Size};
pub use viewport::Viewport;
