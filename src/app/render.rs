use std::collections::HashMap;

use diagrammer::editor::{Corner, HANDLE_SIZE};
use diagrammer::export::raster::parse_color;
use diagrammer::export::text::{Align, layout_label};
use diagrammer::router::{self, ConnectorPath};
use diagrammer::{Editor, Point, RectF, Shape, ShapeKind, Tool, Viewport};
use eframe::egui;

use super::{to_point, to_pos};

const CONNECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(0x71, 0x71, 0x7a);
const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(90, 160, 255);
const BODY_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(230, 230, 230, 230);
const CURVE_SEGMENTS: usize = 32;

pub(super) type Textures = HashMap<String, Option<egui::TextureHandle>>;

pub(super) fn color32(hex: &str) -> egui::Color32 {
    parse_color(hex)
        .map(|c| {
            let c = c.to_color_u8();
            egui::Color32::from_rgba_unmultiplied(c.red(), c.green(), c.blue(), c.alpha())
        })
        .unwrap_or(egui::Color32::BLACK)
}

fn screen_rect(origin: egui::Pos2, view: &Viewport, rect: RectF) -> egui::Rect {
    egui::Rect::from_min_max(
        to_pos(view.document_to_screen(rect.min), origin),
        to_pos(view.document_to_screen(rect.max), origin),
    )
}

pub(super) fn tool_button(ui: &mut egui::Ui, editor: &mut Editor, tool: Tool) {
    if ui
        .selectable_label(editor.tool() == tool, tool.label())
        .clicked()
    {
        editor.set_tool(tool);
    }
}

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect, view: &Viewport) {
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(250));
    let grid_color = egui::Color32::from_gray(225);
    let spacing_screen = 20.0 * view.zoom();
    if spacing_screen < 8.0 {
        return;
    }
    let start = rect.min + egui::vec2(view.pan.x, view.pan.y);
    let x0 = ((rect.min.x - start.x) / spacing_screen).floor() * spacing_screen + start.x;
    let y0 = ((rect.min.y - start.y) / spacing_screen).floor() * spacing_screen + start.y;
    let mut x = x0;
    while x < rect.max.x {
        let mut y = y0;
        while y < rect.max.y {
            painter.circle_filled(egui::pos2(x, y), 1.0, grid_color);
            y += spacing_screen;
        }
        x += spacing_screen;
    }
}

fn draw_path(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &Viewport,
    path: &ConnectorPath,
    color: egui::Color32,
) {
    let screen = |p: Point| to_pos(view.document_to_screen(p), origin);
    let points: Vec<egui::Pos2> = path.flatten(CURVE_SEGMENTS).into_iter().map(screen).collect();
    painter.add(egui::Shape::line(points, egui::Stroke::new(2.0 * view.zoom(), color)));
    let head: Vec<egui::Pos2> = path.arrowhead().into_iter().map(screen).collect();
    painter.add(egui::Shape::convex_polygon(head, color, egui::Stroke::NONE));
}

pub(super) fn draw_connections(painter: &egui::Painter, origin: egui::Pos2, editor: &Editor) {
    let doc = editor.document();
    let selected = editor.selection().connection_id();
    for connection in &doc.connections {
        let Some(path) = router::route_connection(doc, connection) else {
            continue;
        };
        let color = if selected == Some(connection.id.as_str()) {
            SELECTION_COLOR
        } else {
            CONNECTION_COLOR
        };
        draw_path(painter, origin, editor.viewport(), &path, color);
    }
}

fn cylinder_points(rect: egui::Rect) -> Vec<egui::Pos2> {
    let rx = rect.width() / 2.2;
    let ry = rect.height() / 6.7;
    let cx = rect.center().x;
    let top = rect.top() + ry;
    let bottom = rect.bottom() - ry;
    let steps = 16;
    let mut points = Vec::with_capacity(2 * (steps + 1));
    for i in 0..=steps {
        let a = std::f32::consts::PI * i as f32 / steps as f32;
        points.push(egui::pos2(cx + rx * a.cos(), top - ry * a.sin()));
    }
    for i in 0..=steps {
        let a = std::f32::consts::PI * i as f32 / steps as f32;
        points.push(egui::pos2(cx - rx * a.cos(), bottom + ry * a.sin()));
    }
    points
}

fn draw_shape(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &Viewport,
    shape: &Shape,
    textures: &Textures,
) {
    let rect = screen_rect(origin, view, shape.bounds());
    let zoom = view.zoom();
    let stroke = egui::Stroke::new(2.0 * zoom, color32(shape.stroke_color()));
    let radius = 8.0 * zoom;
    match shape.kind {
        ShapeKind::Rectangle => {
            painter.rect_filled(rect, radius, BODY_FILL);
            painter.rect_stroke(rect, radius, stroke, egui::StrokeKind::Middle);
        }
        ShapeKind::Circle => {
            let radii = rect.size() / 2.0;
            painter.add(egui::Shape::ellipse_filled(rect.center(), radii, BODY_FILL));
            painter.add(egui::Shape::ellipse_stroke(rect.center(), radii, stroke));
        }
        ShapeKind::Diamond => {
            let points = vec![
                rect.center_top(),
                rect.right_center(),
                rect.center_bottom(),
                rect.left_center(),
            ];
            painter.add(egui::Shape::convex_polygon(points, BODY_FILL, stroke));
        }
        ShapeKind::Database => {
            let rx = rect.width() / 2.2;
            let ry = rect.height() / 6.7;
            let cx = rect.center().x;
            let top = rect.top() + ry;
            let bottom = rect.bottom() - ry;
            painter.add(egui::Shape::convex_polygon(
                cylinder_points(rect),
                BODY_FILL,
                egui::Stroke::NONE,
            ));
            let radii = egui::vec2(rx, ry);
            painter.add(egui::Shape::ellipse_stroke(egui::pos2(cx, top), radii, stroke));
            painter.line_segment([egui::pos2(cx - rx, top), egui::pos2(cx - rx, bottom)], stroke);
            painter.line_segment([egui::pos2(cx + rx, top), egui::pos2(cx + rx, bottom)], stroke);
            painter.add(egui::Shape::ellipse_stroke(egui::pos2(cx, bottom), radii, stroke));
        }
        ShapeKind::Text => {}
        ShapeKind::Image => {
            let texture = shape
                .image_uri
                .as_deref()
                .and_then(|uri| textures.get(uri))
                .and_then(Option::as_ref);
            match texture {
                Some(texture) => {
                    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                    painter.image(texture.id(), rect, uv, egui::Color32::WHITE);
                }
                None => {
                    painter.rect_filled(rect, radius, egui::Color32::from_gray(240));
                }
            }
            painter.rect_stroke(rect, radius, stroke, egui::StrokeKind::Middle);
        }
    }
}

fn draw_label(painter: &egui::Painter, origin: egui::Pos2, view: &Viewport, shape: &Shape) {
    let Some(layout) = layout_label(shape) else {
        return;
    };
    let font = egui::FontId::proportional(layout.font_size * view.zoom());
    let anchor = match layout.align {
        Align::Left => egui::Align2::LEFT_CENTER,
        Align::Center => egui::Align2::CENTER_CENTER,
    };
    for (i, line) in layout.lines.iter().enumerate() {
        let doc_pos = Point::new(layout.x, layout.first_line_y + i as f32 * layout.line_height);
        let pos = to_pos(view.document_to_screen(doc_pos), origin);
        painter.text(pos, anchor, line, font.clone(), egui::Color32::BLACK);
    }
}

pub(super) fn draw_shapes(
    painter: &egui::Painter,
    origin: egui::Pos2,
    editor: &Editor,
    textures: &Textures,
) {
    let view = editor.viewport();
    for shape in &editor.document().shapes {
        draw_shape(painter, origin, view, shape, textures);
        if editor.editing() != Some(shape.id.as_str()) {
            draw_label(painter, origin, view, shape);
        }
    }
}

pub(super) fn draw_overlays(
    painter: &egui::Painter,
    origin: egui::Pos2,
    editor: &Editor,
    pointer: Option<egui::Pos2>,
) {
    let doc = editor.document();
    let view = editor.viewport();
    let handle_stroke = egui::Stroke::new(1.0, SELECTION_COLOR);

    if let Some(shape) = editor.selection().shape_id().and_then(|id| doc.shape(id)) {
        let rect = screen_rect(origin, view, shape.bounds());
        painter.rect_stroke(rect.expand(3.0), 2.0, handle_stroke, egui::StrokeKind::Middle);
        if editor.tool() == Tool::Select {
            for corner in Corner::ALL {
                let c = to_pos(view.document_to_screen(corner.of(shape.bounds())), origin);
                let r = egui::Rect::from_center_size(c, egui::vec2(HANDLE_SIZE, HANDLE_SIZE));
                painter.rect_filled(r, 1.0, egui::Color32::WHITE);
                painter.rect_stroke(r, 1.0, handle_stroke, egui::StrokeKind::Middle);
            }
        }
    }

    if let Some(source) = editor.pending_connection_source().and_then(|id| doc.shape(id)) {
        let rect = screen_rect(origin, view, source.bounds());
        painter.rect_stroke(
            rect.expand(4.0),
            4.0,
            egui::Stroke::new(2.0, SELECTION_COLOR),
            egui::StrokeKind::Middle,
        );
        if let Some(pointer) = pointer {
            let target = view.screen_to_document(to_point(pointer, origin));
            let start = router::closest_anchor(source, target).point;
            painter.line_segment(
                [to_pos(view.document_to_screen(start), origin), pointer],
                egui::Stroke::new(1.5, SELECTION_COLOR),
            );
        }
    }

    if let Some(at) = editor.pending_image() {
        let p = to_pos(view.document_to_screen(at), origin);
        painter.circle_stroke(p, 6.0, handle_stroke);
    }
}
