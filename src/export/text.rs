//! Label layout and glyph rasterization.
//!
//! Line breaking uses a fixed advance per display column so the same label
//! wraps identically on every machine; only glyph shapes depend on the fonts
//! installed.

use unicode_width::UnicodeWidthStr;

use crate::model::{RectF, Shape, ShapeKind};

pub const LINE_HEIGHT_RATIO: f32 = 1.2;
/// Advance of one display column, as a fraction of the font size.
pub const COLUMN_WIDTH_RATIO: f32 = 0.6;
/// Horizontal inset of wrapped text inside its shape.
pub const TEXT_INSET: f32 = 10.0;
const DIAMOND_TEXT_RATIO: f32 = 0.6;
const FONT_FAMILY: &str = "Arial, Helvetica, sans-serif";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelLayout {
    pub lines: Vec<String>,
    pub align: Align,
    /// Left edge (`Align::Left`) or centre line (`Align::Center`).
    pub x: f32,
    /// Vertical centre of the first line.
    pub first_line_y: f32,
    pub line_height: f32,
    pub font_size: f32,
}

pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.width() as f32 * font_size * COLUMN_WIDTH_RATIO
}

/// Greedy word wrap: words join a line until the next one would overflow
/// `max_width`. A single long word is never split. Explicit newlines start a
/// new line.
pub fn wrap_lines(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut words = paragraph.split(' ');
        let mut current = words.next().unwrap_or_default().to_string();
        for word in words {
            let candidate = format!("{current} {word}");
            if text_width(&candidate, font_size) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}

/// Where and how a shape's label is drawn, or `None` when there is nothing to draw.
pub fn layout_label(shape: &Shape) -> Option<LabelLayout> {
    if shape.label.trim().is_empty() || shape.kind == ShapeKind::Image {
        return None;
    }
    let font_size = shape.font_size();
    let line_height = font_size * LINE_HEIGHT_RATIO;
    let center = shape.center();
    let (align, x, max_width) = match shape.kind {
        ShapeKind::Text => (Align::Left, shape.x + TEXT_INSET, shape.width - 2.0 * TEXT_INSET),
        ShapeKind::Diamond => (Align::Center, center.x, shape.width * DIAMOND_TEXT_RATIO),
        _ => (Align::Center, center.x, shape.width - 2.0 * TEXT_INSET),
    };
    let lines = wrap_lines(&shape.label, max_width, font_size);
    let block = lines.len() as f32 * line_height;
    Some(LabelLayout {
        first_line_y: center.y - block / 2.0 + line_height / 2.0,
        lines,
        align,
        x,
        line_height,
        font_size,
    })
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A standalone SVG holding just this label, in document coordinates, whose
/// viewBox is `frame`.
pub fn label_svg(layout: &LabelLayout, frame: RectF) -> String {
    let anchor = match layout.align {
        Align::Left => "start",
        Align::Center => "middle",
    };
    let mut out = String::new();
    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{:.3} {:.3} {:.3} {:.3}" width="{:.3}" height="{:.3}">"#,
        frame.min.x,
        frame.min.y,
        frame.width(),
        frame.height(),
        frame.width(),
        frame.height()
    ));
    out.push_str(&format!(
        r##"<text font-family="{FONT_FAMILY}" font-size="{:.3}" fill="#000000" text-anchor="{anchor}" dominant-baseline="central">"##,
        layout.font_size
    ));
    for (i, line) in layout.lines.iter().enumerate() {
        out.push_str(&format!(
            r#"<tspan x="{:.3}" y="{:.3}">{}</tspan>"#,
            layout.x,
            layout.first_line_y + i as f32 * layout.line_height,
            escape_xml(line)
        ));
    }
    out.push_str("</text></svg>");
    out
}

/// Draws `layout` onto `pixmap`, which covers `frame` at `scale` pixels per unit.
pub fn draw_label(
    pixmap: &mut tiny_skia::Pixmap,
    layout: &LabelLayout,
    frame: RectF,
    scale: f32,
    options: &usvg::Options<'_>,
) {
    let svg = label_svg(layout, frame);
    match usvg::Tree::from_str(&svg, options) {
        Ok(tree) => resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(scale, scale),
            &mut pixmap.as_mut(),
        ),
        Err(err) => tracing::warn!(%err, "label could not be laid out"),
    }
}
