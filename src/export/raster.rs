use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect,
    Stroke, Transform,
};

use crate::model::Shape;
use crate::model::ShapeKind;
use crate::router::ConnectorPath;

pub const CONNECTION_COLOR: ColorU8 = ColorU8::from_rgba(0x71, 0x71, 0x7a, 0xff);
pub const STROKE_WIDTH: f32 = 2.0;
pub const CORNER_RADIUS: f32 = 8.0;
/// White at 90% opacity.
pub const BODY_FILL: ColorU8 = ColorU8::from_rgba(255, 255, 255, 230);

// Cubic control distance for a quarter ellipse.
const KAPPA: f32 = 0.552_284_75;

/// `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` and a few names.
pub fn parse_color(text: &str) -> Option<Color> {
    let s = text.trim().to_ascii_lowercase();
    match s.as_str() {
        "transparent" => return Some(Color::from_rgba8(0, 0, 0, 0)),
        "white" => return Some(Color::WHITE),
        "black" => return Some(Color::BLACK),
        _ => {}
    }

    let hex = s.strip_prefix('#')?;
    fn hex2(b: &[u8]) -> Option<u8> {
        let hi = (*b.first()? as char).to_digit(16)? as u8;
        let lo = (*b.get(1)? as char).to_digit(16)? as u8;
        Some((hi << 4) | lo)
    }
    fn hex1(c: u8) -> Option<u8> {
        let v = (c as char).to_digit(16)? as u8;
        Some((v << 4) | v)
    }

    let bytes = hex.as_bytes();
    match bytes.len() {
        3 | 4 => Some(Color::from_rgba8(
            hex1(bytes[0])?,
            hex1(bytes[1])?,
            hex1(bytes[2])?,
            bytes.get(3).map_or(Some(255), |&a| hex1(a))?,
        )),
        6 | 8 => Some(Color::from_rgba8(
            hex2(&bytes[0..2])?,
            hex2(&bytes[2..4])?,
            hex2(&bytes[4..6])?,
            if bytes.len() == 8 { hex2(&bytes[6..8])? } else { 255 },
        )),
        _ => None,
    }
}

fn shape_color(shape: &Shape) -> Color {
    parse_color(shape.stroke_color())
        .or_else(|| parse_color(shape.kind.default_color()))
        .unwrap_or(Color::BLACK)
}

fn to_color(c: ColorU8) -> Color {
    Color::from_rgba8(c.red(), c.green(), c.blue(), c.alpha())
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

fn stroke() -> Stroke {
    Stroke {
        width: STROKE_WIDTH,
        ..Stroke::default()
    }
}

pub fn rounded_rect(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Option<Path> {
    let r = radius.min(w * 0.5).min(h * 0.5).max(0.0);
    let k = r * (1.0 - KAPPA);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.cubic_to(x + w - k, y, x + w, y + k, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.cubic_to(x + w, y + h - k, x + w - k, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.cubic_to(x + k, y + h, x, y + h - k, x, y + h - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + k, x + k, y, x + r, y);
    pb.close();
    pb.finish()
}

fn diamond(shape: &Shape) -> Option<Path> {
    let (x, y, w, h) = (shape.x, shape.y, shape.width, shape.height);
    let mut pb = PathBuilder::new();
    pb.move_to(x + w / 2.0, y);
    pb.line_to(x + w, y + h / 2.0);
    pb.line_to(x + w / 2.0, y + h);
    pb.line_to(x, y + h / 2.0);
    pb.close();
    pb.finish()
}

fn oval(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<Path> {
    PathBuilder::from_oval(Rect::from_xywh(cx - rx, cy - ry, rx * 2.0, ry * 2.0)?)
}

/// Cylinder: top cap, straight sides, bottom cap.
struct Cylinder {
    cx: f32,
    top: f32,
    bottom: f32,
    rx: f32,
    ry: f32,
}

impl Cylinder {
    fn of(shape: &Shape) -> Self {
        let ry = shape.height / 6.7;
        Self {
            cx: shape.x + shape.width / 2.0,
            top: shape.y + ry,
            bottom: shape.y + shape.height - ry,
            rx: shape.width / 2.2,
            ry,
        }
    }

    /// Outline used for the fill: upper half of the top cap, down the left
    /// side, lower half of the bottom cap, back up the right side.
    fn body(&self) -> Option<Path> {
        let Cylinder {
            cx,
            top,
            bottom,
            rx,
            ry,
        } = *self;
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);
        let mut pb = PathBuilder::new();
        pb.move_to(cx + rx, top);
        pb.cubic_to(cx + rx, top - ky, cx + kx, top - ry, cx, top - ry);
        pb.cubic_to(cx - kx, top - ry, cx - rx, top - ky, cx - rx, top);
        pb.line_to(cx - rx, bottom);
        pb.cubic_to(cx - rx, bottom + ky, cx - kx, bottom + ry, cx, bottom + ry);
        pb.cubic_to(cx + kx, bottom + ry, cx + rx, bottom + ky, cx + rx, bottom);
        pb.close();
        pb.finish()
    }

    fn outlines(&self) -> Vec<Path> {
        let mut sides = PathBuilder::new();
        sides.move_to(self.cx - self.rx, self.top);
        sides.line_to(self.cx - self.rx, self.bottom);
        sides.move_to(self.cx + self.rx, self.top);
        sides.line_to(self.cx + self.rx, self.bottom);
        [
            oval(self.cx, self.top, self.rx, self.ry),
            sides.finish(),
            oval(self.cx, self.bottom, self.rx, self.ry),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Curve plus filled arrowhead.
pub fn draw_connection(pixmap: &mut Pixmap, path: &ConnectorPath, transform: Transform) {
    let paint = solid(to_color(CONNECTION_COLOR));
    let (s, c1, c2, e) = (path.start.point, path.control1, path.control2, path.end.point);
    let mut pb = PathBuilder::new();
    pb.move_to(s.x, s.y);
    pb.cubic_to(c1.x, c1.y, c2.x, c2.y, e.x, e.y);
    if let Some(curve) = pb.finish() {
        pixmap.stroke_path(&curve, &paint, &stroke(), transform, None);
    }

    let [tip, left, right] = path.arrowhead();
    let mut pb = PathBuilder::new();
    pb.move_to(tip.x, tip.y);
    pb.line_to(left.x, left.y);
    pb.line_to(right.x, right.y);
    pb.close();
    if let Some(head) = pb.finish() {
        pixmap.fill_path(&head, &paint, FillRule::Winding, transform, None);
    }
}

/// Translucent body and coloured border for the outlined kinds. Text and
/// image shapes have no body.
pub fn draw_shape_body(pixmap: &mut Pixmap, shape: &Shape, transform: Transform) {
    let fill = solid(to_color(BODY_FILL));
    let border = solid(shape_color(shape));
    let (x, y, w, h) = (shape.x, shape.y, shape.width, shape.height);
    let (body, outlines) = match shape.kind {
        ShapeKind::Rectangle => {
            let path = rounded_rect(x, y, w, h, CORNER_RADIUS);
            (path.clone(), path.into_iter().collect())
        }
        ShapeKind::Circle => {
            let path = oval(x + w / 2.0, y + h / 2.0, w / 2.0, h / 2.0);
            (path.clone(), path.into_iter().collect())
        }
        ShapeKind::Diamond => {
            let path = diamond(shape);
            (path.clone(), path.into_iter().collect())
        }
        ShapeKind::Database => {
            let cylinder = Cylinder::of(shape);
            (cylinder.body(), cylinder.outlines())
        }
        ShapeKind::Text | ShapeKind::Image => return,
    };
    if let Some(body) = body {
        pixmap.fill_path(&body, &fill, FillRule::Winding, transform, None);
    }
    for outline in &outlines {
        pixmap.stroke_path(outline, &border, &stroke(), transform, None);
    }
}

/// Scales `image` into the shape box, clipped to its rounded corners, then
/// draws the border.
pub fn draw_image(pixmap: &mut Pixmap, shape: &Shape, image: &Pixmap, transform: Transform) {
    let Some(frame) = rounded_rect(shape.x, shape.y, shape.width, shape.height, CORNER_RADIUS)
    else {
        return;
    };
    let Some(mut clip) = Mask::new(pixmap.width(), pixmap.height()) else {
        return;
    };
    clip.fill_path(&frame, FillRule::Winding, true, transform);

    let placement = Transform::from_translate(shape.x, shape.y).pre_scale(
        shape.width / image.width() as f32,
        shape.height / image.height() as f32,
    );
    let paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(
        0,
        0,
        image.as_ref(),
        &paint,
        transform.pre_concat(placement),
        Some(&clip),
    );
    pixmap.stroke_path(&frame, &solid(shape_color(shape)), &stroke(), transform, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point;

    #[test]
    fn parses_hex_forms() {
        let c = parse_color("#6366f1").unwrap().to_color_u8();
        assert_eq!((c.red(), c.green(), c.blue(), c.alpha()), (0x63, 0x66, 0xf1, 255));
        let c = parse_color("#f008").unwrap().to_color_u8();
        assert_eq!((c.red(), c.green(), c.blue(), c.alpha()), (255, 0, 0, 0x88));
        assert!(parse_color("rebeccapurple").is_none());
        assert!(parse_color("#12345").is_none());
    }

    #[test]
    fn bodies_paint_inside_and_leave_outside_alone() {
        for kind in [
            ShapeKind::Rectangle,
            ShapeKind::Circle,
            ShapeKind::Diamond,
            ShapeKind::Database,
        ] {
            let mut pixmap = Pixmap::new(200, 200).unwrap();
            let mut shape = Shape::new(kind, Point::new(40.0, 40.0));
            shape.width = 120.0;
            shape.height = 120.0;
            draw_shape_body(&mut pixmap, &shape, Transform::identity());
            let centre = pixmap.pixel(100, 100).unwrap();
            assert!(centre.alpha() > 200, "{kind:?} body not filled");
            assert_eq!(pixmap.pixel(5, 5).unwrap().alpha(), 0, "{kind:?} bled outside");
        }
    }

    #[test]
    fn text_shapes_have_no_body() {
        let mut pixmap = Pixmap::new(100, 100).unwrap();
        let shape = Shape::new(ShapeKind::Text, Point::new(0.0, 0.0));
        draw_shape_body(&mut pixmap, &shape, Transform::identity());
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn image_is_clipped_to_rounded_corners() {
        let mut source = Pixmap::new(4, 4).unwrap();
        source.fill(Color::from_rgba8(255, 0, 0, 255));
        let mut pixmap = Pixmap::new(120, 120).unwrap();
        let mut shape = Shape::image(Point::new(10.0, 10.0), "x".into());
        shape.width = 100.0;
        shape.height = 100.0;
        draw_image(&mut pixmap, &shape, &source, Transform::identity());
        let inside = pixmap.pixel(60, 60).unwrap();
        assert_eq!((inside.red(), inside.alpha()), (255, 255));
        // the very corner of the box is outside the rounded clip and border
        assert_eq!(pixmap.pixel(10, 10).unwrap().alpha(), 0);
    }
}
