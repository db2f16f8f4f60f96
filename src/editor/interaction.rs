use crate::model::{MIN_SHAPE_HEIGHT, MIN_SHAPE_WIDTH, Point, Shape};
use crate::router;

use super::{
    CONNECTION_HIT_TOLERANCE, Corner, Editor, HANDLE_SIZE, Hit, Mode, PointerButton, Request,
    Selection, Tool,
};

impl Editor {
    /// Topmost thing under `screen`: handles of the selected shape, then
    /// shapes from the top of the z-order down, then connectors.
    pub fn hit_test(&self, screen: Point) -> Option<Hit> {
        let view = &self.viewport;
        if self.tool == Tool::Select {
            if let Some(shape) = self.selection.shape_id().and_then(|id| self.doc.shape(id)) {
                let half = HANDLE_SIZE * 0.5;
                for corner in Corner::ALL {
                    let c = view.document_to_screen(corner.of(shape.bounds()));
                    if (screen.x - c.x).abs() <= half && (screen.y - c.y).abs() <= half {
                        return Some(Hit::Handle {
                            shape_id: shape.id.clone(),
                            corner,
                        });
                    }
                }
            }
        }

        let p = view.screen_to_document(screen);
        if let Some(shape) = self.doc.shapes.iter().rev().find(|s| s.bounds().contains(p)) {
            return Some(Hit::Shape(shape.id.clone()));
        }

        let tolerance = CONNECTION_HIT_TOLERANCE / view.zoom();
        self.doc
            .connections
            .iter()
            .rev()
            .find(|c| {
                router::route_connection(&self.doc, c)
                    .is_some_and(|path| path.distance_to(p) <= tolerance)
            })
            .map(|c| Hit::Connection(c.id.clone()))
    }

    /// Button press on the canvas. Returns a [`Request`] when the host has to
    /// supply something (an image file) before the action can finish.
    pub fn pointer_down(&mut self, screen: Point, button: PointerButton) -> Option<Request> {
        if self.mode.is_gesture() || !screen.is_finite() {
            return None;
        }
        self.editing = None;
        match button {
            PointerButton::Middle => {
                self.begin_pan(screen);
                return None;
            }
            PointerButton::Secondary => return None,
            PointerButton::Primary => {}
        }

        let p = self.viewport.screen_to_document(screen);
        match self.hit_test(screen) {
            Some(Hit::Handle { shape_id, corner }) => {
                self.begin_resize(shape_id, corner);
                None
            }
            Some(Hit::Shape(id)) => {
                self.press_shape(id, p);
                None
            }
            Some(Hit::Connection(id)) if self.tool == Tool::Select => {
                self.selection = Selection::Connection(id);
                None
            }
            Some(Hit::Connection(_)) | None => self.press_canvas(screen, p),
        }
    }

    pub fn pointer_move(&mut self, screen: Point) {
        if !screen.is_finite() {
            return;
        }
        let p = self.viewport.screen_to_document(screen);
        let mut moved = false;
        match &mut self.mode {
            Mode::Panning { last_screen, .. } => {
                let delta = screen - *last_screen;
                *last_screen = screen;
                self.viewport.pan_by(delta);
            }
            Mode::DraggingShape {
                shape_id,
                grab_offset,
            } => {
                let target = p - *grab_offset;
                if let Some(shape) = self.doc.shape_mut(shape_id) {
                    if shape.origin() != target {
                        shape.x = target.x;
                        shape.y = target.y;
                        moved = true;
                    }
                }
            }
            Mode::Resizing {
                shape_id,
                corner,
                anchor,
            } => {
                let (sx, sy) = corner.direction();
                let width = ((p.x - anchor.x) * sx).max(MIN_SHAPE_WIDTH);
                let height = ((p.y - anchor.y) * sy).max(MIN_SHAPE_HEIGHT);
                let x = if sx > 0.0 { anchor.x } else { anchor.x - width };
                let y = if sy > 0.0 { anchor.y } else { anchor.y - height };
                if let Some(shape) = self.doc.shape_mut(shape_id) {
                    shape.set_bounds(x, y, width, height);
                    moved = true;
                }
            }
            Mode::Idle | Mode::DrawingConnection { .. } => {}
        }
        if moved {
            self.changed_during_gesture();
        }
    }

    /// Any button release ends the current drag, resize or pan.
    pub fn pointer_up(&mut self) {
        self.mode = match std::mem::take(&mut self.mode) {
            Mode::Panning {
                resume_connection: Some(source),
                ..
            } => Mode::DrawingConnection { source },
            mode @ Mode::DrawingConnection { .. } => mode,
            _ => Mode::Idle,
        };
        if std::mem::take(&mut self.gesture_changed) {
            self.notify();
        }
    }

    /// Starts inline label editing on the shape under `screen`.
    pub fn double_click(&mut self, screen: Point) -> bool {
        if self.mode.is_gesture() {
            return false;
        }
        match self.hit_test(screen) {
            Some(Hit::Shape(id)) | Some(Hit::Handle { shape_id: id, .. }) => self.begin_editing(id),
            _ => false,
        }
    }

    /// Modifier+scroll zoom around the pointer.
    pub fn scroll_zoom(&mut self, screen: Point, scroll_y: f32) {
        self.viewport.zoom_gesture(screen, scroll_y);
    }

    /// Finishes an image placement staged by [`Request::PickImage`]. `None`
    /// (the user dismissed the picker) discards the placement and changes
    /// nothing else.
    pub fn complete_image_placement(&mut self, image_uri: Option<String>) -> bool {
        let Some(origin) = self.pending_image.take() else {
            return false;
        };
        let Some(uri) = image_uri.filter(|uri| !uri.is_empty()) else {
            tracing::debug!("image placement cancelled");
            return false;
        };
        self.record();
        self.doc.add_shape(Shape::image(origin, uri));
        self.tool = Tool::Select;
        self.changed();
        true
    }

    fn begin_pan(&mut self, screen: Point) {
        let resume_connection = match std::mem::take(&mut self.mode) {
            Mode::DrawingConnection { source } => Some(source),
            _ => None,
        };
        self.mode = Mode::Panning {
            last_screen: screen,
            resume_connection,
        };
    }

    fn begin_resize(&mut self, shape_id: String, corner: Corner) {
        let Some(shape) = self.doc.shape(&shape_id) else {
            return;
        };
        let anchor = corner.opposite().of(shape.bounds());
        self.selection = Selection::Shape(shape_id.clone());
        self.record();
        self.gesture_changed = false;
        self.mode = Mode::Resizing {
            shape_id,
            corner,
            anchor,
        };
    }

    fn press_shape(&mut self, id: String, p: Point) {
        match self.tool {
            Tool::Select => {
                let Some(shape) = self.doc.shape(&id) else {
                    return;
                };
                let grab_offset = p - shape.origin();
                self.selection = Selection::Shape(id.clone());
                self.record();
                self.gesture_changed = false;
                self.mode = Mode::DraggingShape {
                    shape_id: id,
                    grab_offset,
                };
            }
            Tool::Arrow => self.connect_click(id),
            _ => {}
        }
    }

    /// First click picks the source; a click on a different shape connects.
    fn connect_click(&mut self, id: String) {
        let pending = match &self.mode {
            Mode::DrawingConnection { source } if self.doc.shape(source).is_some() => {
                Some(source.clone())
            }
            _ => None,
        };
        let Some(source) = pending else {
            self.mode = Mode::DrawingConnection { source: id };
            return;
        };
        if source == id {
            return;
        }
        self.record();
        if let Err(err) = self.doc.add_connection(&source, &id) {
            tracing::warn!(%err, "connection rejected");
            return;
        }
        self.mode = Mode::Idle;
        self.tool = Tool::Select;
        self.changed();
    }

    fn press_canvas(&mut self, screen: Point, p: Point) -> Option<Request> {
        self.selection = Selection::None;
        match self.tool {
            Tool::Select | Tool::Arrow => self.begin_pan(screen),
            Tool::Image => {
                self.pending_image = Some(p);
                return Some(Request::PickImage);
            }
            tool => {
                if let Some(kind) = tool.shape_kind() {
                    self.record();
                    self.doc.add_shape(Shape::new(kind, p));
                    self.tool = Tool::Select;
                    self.changed();
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, ShapeKind, Size};
    use crate::viewport::Viewport;

    fn editor_with(shapes: &[(&str, f32, f32)]) -> Editor {
        let mut doc = Document::default();
        for &(id, x, y) in shapes {
            doc.add_shape(Shape {
                id: id.to_string(),
                ..Shape::new(ShapeKind::Rectangle, Point::new(x, y))
            });
        }
        let mut editor = Editor::default();
        editor.load(Some(doc), Size::new(800.0, 600.0));
        *editor.viewport_mut() = Viewport::default();
        editor
    }

    fn click(editor: &mut Editor, x: f32, y: f32) -> Option<Request> {
        let request = editor.pointer_down(Point::new(x, y), PointerButton::Primary);
        editor.pointer_up();
        request
    }

    #[test]
    fn creation_tool_places_shape_and_reverts() {
        let mut editor = editor_with(&[]);
        editor.set_tool(Tool::Diamond);
        click(&mut editor, 40.0, 60.0);
        let doc = editor.document();
        assert_eq!(doc.shapes.len(), 1);
        assert_eq!(doc.shapes[0].kind, ShapeKind::Diamond);
        assert_eq!(doc.shapes[0].origin(), Point::new(40.0, 60.0));
        assert_eq!(editor.tool(), Tool::Select);
        assert_eq!(editor.history().undo_len(), 1);
    }

    #[test]
    fn drag_keeps_grab_point_under_pointer_when_zoomed() {
        let mut editor = editor_with(&[("a", 100.0, 100.0)]);
        *editor.viewport_mut() = Viewport::new(Point::new(10.0, 20.0), 2.0);
        // document (110, 110) is screen (230, 240)
        editor.pointer_down(Point::new(230.0, 240.0), PointerButton::Primary);
        assert!(matches!(editor.mode(), Mode::DraggingShape { .. }));
        editor.pointer_move(Point::new(330.0, 240.0));
        let shape = editor.document().shape("a").unwrap();
        assert_eq!(shape.origin(), Point::new(150.0, 100.0));
        editor.pointer_up();
        assert_eq!(*editor.mode(), Mode::Idle);
        assert_eq!(*editor.selection(), Selection::Shape("a".into()));
    }

    #[test]
    fn resize_pins_opposite_corner_and_floors_size() {
        for corner in Corner::ALL {
            let mut editor = editor_with(&[("a", 100.0, 100.0)]);
            editor.select(Selection::Shape("a".into()));
            let bounds = editor.document().shape("a").unwrap().bounds();
            let fixed = corner.opposite().of(bounds);
            let grab = corner.of(bounds);
            editor.pointer_down(grab, PointerButton::Primary);
            assert!(matches!(editor.mode(), Mode::Resizing { .. }), "{corner:?}");

            for target in [
                Point::new(-400.0, -400.0),
                Point::new(700.0, 900.0),
                fixed,
                Point::new(fixed.x + 1.0, fixed.y - 1.0),
            ] {
                editor.pointer_move(target);
                let shape = editor.document().shape("a").unwrap();
                assert!(shape.width >= MIN_SHAPE_WIDTH);
                assert!(shape.height >= MIN_SHAPE_HEIGHT);
                assert_eq!(corner.opposite().of(shape.bounds()), fixed, "{corner:?}");
            }
            editor.pointer_up();
        }
    }

    #[test]
    fn arrow_tool_connects_two_different_shapes() {
        let mut editor = editor_with(&[("a", 0.0, 0.0), ("b", 300.0, 0.0)]);
        editor.set_tool(Tool::Arrow);
        click(&mut editor, 10.0, 10.0);
        assert_eq!(editor.pending_connection_source(), Some("a"));
        click(&mut editor, 10.0, 10.0);
        assert_eq!(editor.pending_connection_source(), Some("a"));
        assert!(editor.document().connections.is_empty());
        click(&mut editor, 310.0, 10.0);
        let doc = editor.document();
        assert_eq!(doc.connections.len(), 1);
        assert_eq!(doc.connections[0].source, "a");
        assert_eq!(doc.connections[0].target, "b");
        assert_eq!(editor.tool(), Tool::Select);
        assert_eq!(*editor.mode(), Mode::Idle);
    }

    #[test]
    fn panning_with_pending_source_resumes_connection() {
        let mut editor = editor_with(&[("a", 0.0, 0.0), ("b", 300.0, 0.0)]);
        editor.set_tool(Tool::Arrow);
        click(&mut editor, 10.0, 10.0);
        editor.pointer_down(Point::new(600.0, 400.0), PointerButton::Primary);
        editor.pointer_move(Point::new(650.0, 420.0));
        assert_eq!(editor.viewport().pan, Point::new(50.0, 20.0));
        editor.pointer_up();
        assert_eq!(editor.pending_connection_source(), Some("a"));
    }

    #[test]
    fn image_tool_waits_for_file_and_tolerates_cancel() {
        let mut editor = editor_with(&[]);
        editor.set_tool(Tool::Image);
        assert_eq!(click(&mut editor, 5.0, 5.0), Some(Request::PickImage));
        assert!(!editor.complete_image_placement(None));
        assert!(editor.document().shapes.is_empty());
        assert_eq!(editor.history().undo_len(), 0);
        assert_eq!(editor.pending_image(), None);

        assert_eq!(click(&mut editor, 5.0, 5.0), Some(Request::PickImage));
        assert!(editor.complete_image_placement(Some("data:image/png;base64,AAAA".into())));
        let shape = &editor.document().shapes[0];
        assert_eq!(shape.kind, ShapeKind::Image);
        assert_eq!(shape.origin(), Point::new(5.0, 5.0));
        assert_eq!(editor.tool(), Tool::Select);
    }

    #[test]
    fn connection_hit_selects_connection() {
        let mut editor = editor_with(&[("a", 0.0, 0.0), ("b", 300.0, 0.0)]);
        editor.set_tool(Tool::Arrow);
        click(&mut editor, 10.0, 10.0);
        click(&mut editor, 310.0, 10.0);
        let id = editor.document().connections[0].id.clone();
        // midpoint of the straight connector between (120,40) and (300,40)
        click(&mut editor, 210.0, 41.0);
        assert_eq!(*editor.selection(), Selection::Connection(id));
        click(&mut editor, 210.0, 300.0);
        assert_eq!(*editor.selection(), Selection::None);
    }

    #[test]
    fn double_click_enters_text_edit() {
        let mut editor = editor_with(&[("a", 0.0, 0.0)]);
        assert!(editor.double_click(Point::new(20.0, 20.0)));
        assert_eq!(editor.editing(), Some("a"));
        assert!(!editor.double_click(Point::new(500.0, 500.0)));
    }

    #[test]
    fn drag_notifies_listener_once_on_release() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut editor = editor_with(&[("a", 0.0, 0.0)]);
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        editor.set_listener(move |_| seen.set(seen.get() + 1));
        editor.pointer_down(Point::new(10.0, 10.0), PointerButton::Primary);
        for x in 11..20 {
            editor.pointer_move(Point::new(x as f32, 10.0));
        }
        assert_eq!(calls.get(), 0);
        editor.pointer_up();
        assert_eq!(calls.get(), 1);
    }
}
