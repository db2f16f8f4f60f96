//! Pointer- and keyboard-driven editing of a [`Document`].
//!
//! [`Editor`] is the one place that mutates the live document. Every mutation
//! records a [`History`] snapshot first, bumps [`Editor::revision`] and then
//! notifies the change listener so a host can persist the result.

mod actions;
mod interaction;

use crate::history::History;
use crate::model::{Document, Point, RectF, ShapeKind, Size};
use crate::settings::Settings;
use crate::viewport::Viewport;

pub use actions::CommandOutcome;

/// Side of a resize handle square, in screen pixels.
pub const HANDLE_SIZE: f32 = 10.0;
/// Pointer tolerance around a connector, in screen pixels.
pub const CONNECTION_HIT_TOLERANCE: f32 = 6.0;
/// Offset applied to duplicated shapes.
pub const DUPLICATE_OFFSET: f32 = 20.0;
/// Font size change per increase/decrease.
pub const FONT_STEP: f32 = 2.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tool {
    #[default]
    Select,
    Rectangle,
    Circle,
    Diamond,
    Database,
    Text,
    Image,
    Arrow,
}

impl Tool {
    pub const ALL: [Tool; 8] = [
        Tool::Select,
        Tool::Rectangle,
        Tool::Circle,
        Tool::Diamond,
        Tool::Database,
        Tool::Text,
        Tool::Image,
        Tool::Arrow,
    ];

    /// The kind a press on empty canvas creates, if any.
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            Tool::Rectangle => Some(ShapeKind::Rectangle),
            Tool::Circle => Some(ShapeKind::Circle),
            Tool::Diamond => Some(ShapeKind::Diamond),
            Tool::Database => Some(ShapeKind::Database),
            Tool::Text => Some(ShapeKind::Text),
            Tool::Image => Some(ShapeKind::Image),
            Tool::Select | Tool::Arrow => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Rectangle => "Rectangle",
            Tool::Circle => "Circle",
            Tool::Diamond => "Diamond",
            Tool::Database => "Database",
            Tool::Text => "Text",
            Tool::Image => "Image",
            Tool::Arrow => "Arrow",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Corner {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::NorthWest,
        Corner::NorthEast,
        Corner::SouthWest,
        Corner::SouthEast,
    ];

    pub fn of(self, rect: RectF) -> Point {
        match self {
            Corner::NorthWest => rect.min,
            Corner::NorthEast => Point::new(rect.max.x, rect.min.y),
            Corner::SouthWest => Point::new(rect.min.x, rect.max.y),
            Corner::SouthEast => rect.max,
        }
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::NorthWest => Corner::SouthEast,
            Corner::NorthEast => Corner::SouthWest,
            Corner::SouthWest => Corner::NorthEast,
            Corner::SouthEast => Corner::NorthWest,
        }
    }

    /// +1 where the corner grows away from the fixed one along that axis.
    fn direction(self) -> (f32, f32) {
        match self {
            Corner::NorthWest => (-1.0, -1.0),
            Corner::NorthEast => (1.0, -1.0),
            Corner::SouthWest => (-1.0, 1.0),
            Corner::SouthEast => (1.0, 1.0),
        }
    }
}

/// The single active pointer gesture.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Mode {
    #[default]
    Idle,
    DraggingShape {
        shape_id: String,
        /// Pointer minus shape origin at grab time, document units.
        grab_offset: Point,
    },
    Resizing {
        shape_id: String,
        corner: Corner,
        /// The opposite corner, which stays put.
        anchor: Point,
    },
    Panning {
        last_screen: Point,
        /// Connection source to return to when the pan ends.
        resume_connection: Option<String>,
    },
    DrawingConnection {
        source: String,
    },
}

impl Mode {
    /// Drag, resize or pan: a button is held and the document may be mid-edit.
    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            Mode::DraggingShape { .. } | Mode::Resizing { .. } | Mode::Panning { .. }
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Shape(String),
    Connection(String),
}

impl Selection {
    pub fn shape_id(&self) -> Option<&str> {
        match self {
            Selection::Shape(id) => Some(id),
            _ => None,
        }
    }

    pub fn connection_id(&self) -> Option<&str> {
        match self {
            Selection::Connection(id) => Some(id),
            _ => None,
        }
    }
}

/// What lies under a screen point, topmost first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hit {
    Handle { shape_id: String, corner: Corner },
    Shape(String),
    Connection(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Work the host must do on the editor's behalf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    /// Ask the user for an image, then call [`Editor::complete_image_placement`].
    PickImage,
}

type Listener = Box<dyn FnMut(&Document)>;

pub struct Editor {
    doc: Document,
    viewport: Viewport,
    canvas: Size,
    tool: Tool,
    mode: Mode,
    selection: Selection,
    editing: Option<String>,
    pending_image: Option<Point>,
    history: History,
    settings: Settings,
    revision: u64,
    gesture_changed: bool,
    listener: Option<Listener>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Editor {
    pub fn new(settings: Settings) -> Self {
        Self {
            doc: Document::default(),
            viewport: Viewport::default(),
            canvas: Size::new(800.0, 600.0),
            tool: Tool::Select,
            mode: Mode::Idle,
            selection: Selection::None,
            editing: None,
            pending_image: None,
            history: History::new(),
            settings,
            revision: 0,
            gesture_changed: false,
            listener: None,
        }
    }

    /// Replaces the document with `doc` (or an empty one) and frames it.
    pub fn load(&mut self, doc: Option<Document>, canvas: Size) {
        self.doc = doc.unwrap_or_default();
        self.canvas = canvas;
        self.history.clear();
        self.mode = Mode::Idle;
        self.selection = Selection::None;
        self.editing = None;
        self.pending_image = None;
        self.tool = Tool::Select;
        self.viewport = Viewport::default();
        if !self.doc.shapes.is_empty() {
            self.viewport.fit_to_view(&self.doc, canvas);
        }
        tracing::info!(
            shapes = self.doc.shapes.len(),
            connections = self.doc.connections.len(),
            "document loaded"
        );
    }

    /// Registers the change observer, called after every completed mutation.
    pub fn set_listener(&mut self, listener: impl FnMut(&Document) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Owned copy for export, independent of any later edits.
    pub fn export_snapshot(&self) -> Document {
        self.doc.clone()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    pub fn set_canvas_size(&mut self, canvas: Size) {
        self.canvas = canvas;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switching tools drops a half-made connection and any staged image.
    pub fn set_tool(&mut self, tool: Tool) {
        if matches!(self.mode, Mode::DrawingConnection { .. }) {
            self.mode = Mode::Idle;
        }
        if let Mode::Panning {
            resume_connection, ..
        } = &mut self.mode
        {
            *resume_connection = None;
        }
        self.pending_image = None;
        self.tool = tool;
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Shape whose label is being edited inline.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn pending_connection_source(&self) -> Option<&str> {
        match &self.mode {
            Mode::DrawingConnection { source } => Some(source),
            Mode::Panning {
                resume_connection: Some(source),
                ..
            } => Some(source),
            _ => None,
        }
    }

    pub fn pending_image(&self) -> Option<Point> {
        self.pending_image
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn record(&mut self) {
        self.history.record(&self.doc);
    }

    fn changed(&mut self) {
        self.revision += 1;
        self.notify();
    }

    fn notify(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.doc);
        }
    }

    /// Mid-gesture edits redraw but notify once, when the gesture ends.
    fn changed_during_gesture(&mut self) {
        self.revision += 1;
        self.gesture_changed = true;
    }

    /// Drops selection, editing and gesture references to shapes that no
    /// longer exist (after delete, undo or import).
    fn prune_stale_references(&mut self) {
        let doc = &self.doc;
        let stale = match &self.selection {
            Selection::Shape(id) => doc.shape(id).is_none(),
            Selection::Connection(id) => doc.connection(id).is_none(),
            Selection::None => false,
        };
        if stale {
            self.selection = Selection::None;
        }
        if self.editing.as_deref().is_some_and(|id| doc.shape(id).is_none()) {
            self.editing = None;
        }
        if let Mode::DrawingConnection { source } = &self.mode {
            if doc.shape(source).is_none() {
                self.mode = Mode::Idle;
            }
        }
    }
}
