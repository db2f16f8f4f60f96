use crate::commands::Command;
use crate::error::EditorError;
use crate::export::ExportFormat;
use crate::model::{Document, MAX_FONT_SIZE, MIN_FONT_SIZE, Point, ShapePatch, new_id};

use super::{DUPLICATE_OFFSET, Editor, FONT_STEP, Selection, Tool};

/// Result of [`Editor::execute`]. Commands that need I/O hand the work back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    /// Nothing to act on (no selection, empty history, blocked while editing).
    Ignored,
    RequestSave,
    RequestImport,
    RequestExport(ExportFormat),
    ShowShortcuts,
}

fn done(applied: bool) -> CommandOutcome {
    if applied {
        CommandOutcome::Done
    } else {
        CommandOutcome::Ignored
    }
}

impl Editor {
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, EditorError> {
        if self.editing.is_some() && command.blocked_while_editing() {
            return Ok(CommandOutcome::Ignored);
        }
        if self.mode.is_gesture() && command.edits_document() {
            return Err(EditorError::GestureActive("edit the diagram"));
        }
        let step = self.settings.nudge_step;
        let fast = self.settings.nudge_step_fast;
        let outcome = match command {
            Command::Tool(tool) => {
                self.set_tool(tool);
                CommandOutcome::Done
            }
            Command::Delete => done(self.delete_selected()),
            Command::Duplicate => done(self.duplicate_selected()),
            Command::EditSelected => done(self.edit_selected()),
            Command::SelectNext => done(self.cycle_selection(true)),
            Command::SelectPrevious => done(self.cycle_selection(false)),
            Command::MoveUp => done(self.nudge(0.0, -step)),
            Command::MoveDown => done(self.nudge(0.0, step)),
            Command::MoveLeft => done(self.nudge(-step, 0.0)),
            Command::MoveRight => done(self.nudge(step, 0.0)),
            Command::MoveUpLarge => done(self.nudge(0.0, -fast)),
            Command::MoveDownLarge => done(self.nudge(0.0, fast)),
            Command::MoveLeftLarge => done(self.nudge(-fast, 0.0)),
            Command::MoveRightLarge => done(self.nudge(fast, 0.0)),
            Command::FontIncrease => done(self.step_font_size(FONT_STEP)),
            Command::FontDecrease => done(self.step_font_size(-FONT_STEP)),
            Command::Undo => done(self.undo()?),
            Command::Redo => done(self.redo()?),
            Command::ZoomIn => {
                self.viewport.zoom_in();
                CommandOutcome::Done
            }
            Command::ZoomOut => {
                self.viewport.zoom_out();
                CommandOutcome::Done
            }
            Command::ZoomReset => {
                self.viewport.reset_zoom();
                CommandOutcome::Done
            }
            Command::FitToView => done(self.fit_to_view()),
            Command::Save => CommandOutcome::RequestSave,
            Command::Import => CommandOutcome::RequestImport,
            Command::ExportPng => CommandOutcome::RequestExport(ExportFormat::Png),
            Command::ExportPdf => CommandOutcome::RequestExport(ExportFormat::Pdf),
            Command::ExportJson => CommandOutcome::RequestExport(ExportFormat::Json),
            Command::Cancel => {
                self.cancel();
                CommandOutcome::Done
            }
            Command::ShowShortcuts => CommandOutcome::ShowShortcuts,
        };
        Ok(outcome)
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        if self.mode.is_gesture() {
            return Err(EditorError::GestureActive("undo"));
        }
        self.editing = None;
        if !self.history.undo(&mut self.doc) {
            return Ok(false);
        }
        self.prune_stale_references();
        self.changed();
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        if self.mode.is_gesture() {
            return Err(EditorError::GestureActive("redo"));
        }
        self.editing = None;
        if !self.history.redo(&mut self.doc) {
            return Ok(false);
        }
        self.prune_stale_references();
        self.changed();
        Ok(true)
    }

    /// Parses and validates `json`, then swaps it in as one undoable step.
    /// On error the live document is untouched.
    pub fn import_json(&mut self, json: &str) -> Result<(), EditorError> {
        if self.mode.is_gesture() {
            return Err(EditorError::GestureActive("import"));
        }
        let doc = Document::from_json(json)?;
        self.replace_document(doc);
        Ok(())
    }

    pub fn import_document(&mut self, doc: Document) -> Result<(), EditorError> {
        if self.mode.is_gesture() {
            return Err(EditorError::GestureActive("import"));
        }
        doc.validate()?;
        self.replace_document(doc);
        Ok(())
    }

    fn replace_document(&mut self, doc: Document) {
        self.record();
        self.doc = doc;
        self.editing = None;
        self.prune_stale_references();
        tracing::info!(
            shapes = self.doc.shapes.len(),
            connections = self.doc.connections.len(),
            "document imported"
        );
        self.changed();
    }

    pub fn delete_selected(&mut self) -> bool {
        if self.mode.is_gesture() {
            return false;
        }
        let removed = match self.selection.clone() {
            Selection::Shape(id) if self.doc.shape(&id).is_some() => {
                self.record();
                self.doc.remove_shape(&id)
            }
            Selection::Connection(id) if self.doc.connection(&id).is_some() => {
                self.record();
                self.doc.remove_connection(&id)
            }
            _ => false,
        };
        if removed {
            self.selection = Selection::None;
            self.prune_stale_references();
            self.changed();
        }
        removed
    }

    /// Copies the selected shape under a fresh id, offset down and right,
    /// and selects the copy.
    pub fn duplicate_selected(&mut self) -> bool {
        if self.mode.is_gesture() {
            return false;
        }
        let Some(source) = self.selection.shape_id().and_then(|id| self.doc.shape(id)) else {
            return false;
        };
        let mut copy = source.clone();
        copy.id = new_id("shape");
        copy.x += DUPLICATE_OFFSET;
        copy.y += DUPLICATE_OFFSET;
        let id = copy.id.clone();
        self.record();
        self.doc.add_shape(copy);
        self.selection = Selection::Shape(id);
        self.changed();
        true
    }

    /// Tab / shift+tab through shapes in z-order, wrapping at either end.
    fn cycle_selection(&mut self, forward: bool) -> bool {
        let n = self.doc.shapes.len();
        if n == 0 {
            return false;
        }
        let current = self.selection.shape_id().and_then(|id| self.doc.shape_index(id));
        let idx = match (current, forward) {
            (None, true) => 0,
            (None, false) => n - 1,
            (Some(i), true) => (i + 1) % n,
            (Some(i), false) => (i + n - 1) % n,
        };
        self.selection = Selection::Shape(self.doc.shapes[idx].id.clone());
        true
    }

    pub fn edit_selected(&mut self) -> bool {
        match self.selection.shape_id() {
            Some(id) => self.begin_editing(id.to_string()),
            None => false,
        }
    }

    /// Snapshots once at the start; [`Editor::set_text`] calls that follow do not.
    pub(super) fn begin_editing(&mut self, id: String) -> bool {
        if self.mode.is_gesture() || self.doc.shape(&id).is_none() {
            return false;
        }
        self.record();
        self.selection = Selection::Shape(id.clone());
        self.editing = Some(id);
        true
    }

    pub fn finish_editing(&mut self) {
        self.editing = None;
    }

    /// Live label update from the inline editor.
    pub fn set_text(&mut self, id: &str, text: impl Into<String>) -> bool {
        if !self.doc.update_shape(id, ShapePatch::label(text)) {
            return false;
        }
        self.changed();
        true
    }

    pub fn set_color(&mut self, id: &str, color: impl Into<String>) -> bool {
        self.patch_shape(id, ShapePatch::color(color))
    }

    pub fn set_font_size(&mut self, id: &str, size: f32) -> bool {
        self.patch_shape(id, ShapePatch::font_size(size))
    }

    /// Snapshots and applies `patch`. Refused mid-gesture so undo never
    /// captures a half-finished drag.
    fn patch_shape(&mut self, id: &str, patch: ShapePatch) -> bool {
        if self.mode.is_gesture() || self.doc.shape(id).is_none() {
            return false;
        }
        self.record();
        self.doc.update_shape(id, patch);
        self.changed();
        true
    }

    fn step_font_size(&mut self, delta: f32) -> bool {
        let Some(shape) = self.selection.shape_id().and_then(|id| self.doc.shape(id)) else {
            return false;
        };
        let current = shape.font_size();
        let next = (current + delta).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        if next == current {
            return false;
        }
        let id = shape.id.clone();
        self.patch_shape(&id, ShapePatch::font_size(next))
    }

    pub fn nudge(&mut self, dx: f32, dy: f32) -> bool {
        let Some(shape) = self.selection.shape_id().and_then(|id| self.doc.shape(id)) else {
            return false;
        };
        let to = shape.origin() + Point::new(dx, dy);
        let id = shape.id.clone();
        self.patch_shape(&id, ShapePatch::position(to.x, to.y))
    }

    pub fn fit_to_view(&mut self) -> bool {
        self.viewport.fit_to_view(&self.doc, self.canvas)
    }

    /// Escape: leave text edit, drop any half-made connection or pending
    /// image, and go back to the select tool.
    pub fn cancel(&mut self) {
        self.editing = None;
        self.set_tool(Tool::Select);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Mode, PointerButton};
    use crate::model::{Shape, ShapeKind, Size};

    fn editor_with(ids: &[&str]) -> Editor {
        let mut doc = Document::default();
        for (i, id) in ids.iter().enumerate() {
            doc.add_shape(Shape {
                id: id.to_string(),
                ..Shape::new(ShapeKind::Rectangle, Point::new(i as f32 * 200.0, 0.0))
            });
        }
        let mut editor = Editor::default();
        editor.load(Some(doc), Size::new(800.0, 600.0));
        editor
    }

    #[test]
    fn duplicate_offsets_and_selects_copy() {
        let mut editor = editor_with(&["a"]);
        editor.select(Selection::Shape("a".into()));
        assert_eq!(editor.execute(Command::Duplicate).unwrap(), CommandOutcome::Done);
        let doc = editor.document();
        assert_eq!(doc.shapes.len(), 2);
        let copy = &doc.shapes[1];
        assert_ne!(copy.id, "a");
        assert_eq!(copy.origin(), Point::new(20.0, 20.0));
        assert_eq!(editor.selection().shape_id(), Some(copy.id.as_str()));
    }

    #[test]
    fn delete_cascades_and_clears_selection() {
        let mut editor = editor_with(&["a", "b", "c"]);
        editor.import_json(
            r#"{"shapes":[
                {"id":"a","type":"rectangle","x":0,"y":0,"width":120,"height":80},
                {"id":"b","type":"rectangle","x":200,"y":0,"width":120,"height":80},
                {"id":"c","type":"rectangle","x":400,"y":0,"width":120,"height":80}],
              "connections":[{"id":"ab","from":"a","to":"b"},{"id":"bc","from":"b","to":"c"}]}"#,
        )
        .unwrap();
        editor.select(Selection::Shape("a".into()));
        assert!(editor.delete_selected());
        let ids: Vec<_> = editor.document().connections.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["bc"]);
        assert_eq!(*editor.selection(), Selection::None);
        assert!(!editor.delete_selected());
    }

    #[test]
    fn tab_cycles_with_wraparound() {
        let mut editor = editor_with(&["a", "b", "c"]);
        editor.execute(Command::SelectPrevious).unwrap();
        assert_eq!(editor.selection().shape_id(), Some("c"));
        editor.execute(Command::SelectNext).unwrap();
        assert_eq!(editor.selection().shape_id(), Some("a"));
        editor.execute(Command::SelectNext).unwrap();
        assert_eq!(editor.selection().shape_id(), Some("b"));
    }

    #[test]
    fn nudge_uses_configured_steps() {
        let mut editor = editor_with(&["a"]);
        editor.select(Selection::Shape("a".into()));
        editor.execute(Command::MoveRight).unwrap();
        editor.execute(Command::MoveDownLarge).unwrap();
        let shape = editor.document().shape("a").unwrap();
        assert_eq!(shape.origin(), Point::new(1.0, 10.0));
        assert_eq!(editor.history().undo_len(), 2);
    }

    #[test]
    fn font_steps_clamp() {
        let mut editor = editor_with(&["a"]);
        editor.select(Selection::Shape("a".into()));
        for _ in 0..20 {
            editor.execute(Command::FontIncrease).unwrap();
        }
        assert_eq!(editor.document().shape("a").unwrap().font_size(), MAX_FONT_SIZE);
        assert_eq!(
            editor.execute(Command::FontIncrease).unwrap(),
            CommandOutcome::Ignored
        );
        for _ in 0..20 {
            editor.execute(Command::FontDecrease).unwrap();
        }
        assert_eq!(editor.document().shape("a").unwrap().font_size(), MIN_FONT_SIZE);
    }

    #[test]
    fn text_edit_snapshots_once_and_blocks_tool_keys() {
        let mut editor = editor_with(&["a"]);
        editor.select(Selection::Shape("a".into()));
        assert!(editor.edit_selected());
        editor.set_text("a", "H");
        editor.set_text("a", "Hi");
        assert_eq!(editor.history().undo_len(), 1);
        assert_eq!(
            editor.execute(Command::Tool(Tool::Rectangle)).unwrap(),
            CommandOutcome::Ignored
        );
        assert_eq!(editor.tool(), Tool::Select);
        editor.execute(Command::Cancel).unwrap();
        assert_eq!(editor.editing(), None);
        editor.undo().unwrap();
        assert_eq!(editor.document().shape("a").unwrap().label, "Component");
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut editor = editor_with(&["a"]);
        editor.set_color("a", "#ef4444");
        assert!(editor.undo().unwrap());
        assert_eq!(editor.document().shape("a").unwrap().color, "#6366f1");
        assert!(editor.redo().unwrap());
        assert_eq!(editor.document().shape("a").unwrap().color, "#ef4444");
        assert!(!editor.redo().unwrap());
    }

    #[test]
    fn history_is_refused_mid_gesture() {
        let mut editor = editor_with(&["a"]);
        editor.pointer_down(Point::new(700.0, 500.0), PointerButton::Middle);
        assert!(editor.mode().is_gesture());
        assert!(matches!(editor.undo(), Err(EditorError::GestureActive(_))));
        assert!(matches!(
            editor.import_json(r#"{"shapes":[]}"#),
            Err(EditorError::GestureActive(_))
        ));
        editor.pointer_up();
        assert!(editor.undo().is_ok());
    }

    #[test]
    fn edits_are_refused_mid_drag() {
        let mut editor = editor_with(&["a"]);
        let view = *editor.viewport();
        let grab = view.document_to_screen(Point::new(10.0, 10.0));
        editor.pointer_down(grab, PointerButton::Primary);
        editor.pointer_move(view.document_to_screen(Point::new(60.0, 10.0)));
        assert!(matches!(editor.mode(), Mode::DraggingShape { .. }));

        for command in [
            Command::MoveRight,
            Command::Delete,
            Command::Duplicate,
            Command::FontIncrease,
        ] {
            assert!(matches!(
                editor.execute(command),
                Err(EditorError::GestureActive(_))
            ));
        }
        assert!(!editor.delete_selected());
        assert!(!editor.set_color("a", "#ef4444"));
        assert_eq!(editor.history().undo_len(), 1);
        assert_eq!(editor.document().shapes.len(), 1);

        editor.pointer_up();
        let moved = editor.document().shape("a").unwrap();
        assert!((moved.x - 50.0).abs() < 1e-3);
        assert_eq!(moved.color, "#6366f1");

        assert!(editor.undo().unwrap());
        assert_eq!(editor.document().shape("a").unwrap().x, 0.0);
        assert!(!editor.can_undo());
    }

    #[test]
    fn rejected_import_leaves_document_untouched() {
        let mut editor = editor_with(&["a"]);
        let before = editor.export_snapshot();
        let revision = editor.revision();
        assert!(editor.import_json("{ nope").is_err());
        let negative = r#"{"shapes":[{"id":"x","type":"circle","x":0,"y":0,"width":-1,"height":5}]}"#;
        assert!(editor.import_json(negative).is_err());
        assert_eq!(*editor.document(), before);
        assert_eq!(editor.revision(), revision);
        assert_eq!(editor.history().undo_len(), 0);
    }

    #[test]
    fn command_requests_are_returned_to_host() {
        let mut editor = editor_with(&[]);
        assert_eq!(
            editor.execute(Command::ExportPdf).unwrap(),
            CommandOutcome::RequestExport(ExportFormat::Pdf)
        );
        assert_eq!(editor.execute(Command::Import).unwrap(), CommandOutcome::RequestImport);
        assert_eq!(editor.execute(Command::Undo).unwrap(), CommandOutcome::Ignored);
    }
}
