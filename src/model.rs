use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

use crate::error::{ImportError, ModelError};

pub const MIN_SHAPE_WIDTH: f32 = 50.0;
pub const MIN_SHAPE_HEIGHT: f32 = 30.0;
pub const DEFAULT_FONT_SIZE: f32 = 14.0;
pub const MIN_FONT_SIZE: f32 = 8.0;
pub const MAX_FONT_SIZE: f32 = 32.0;

/// Colours offered when recolouring a shape.
pub const COLOR_PALETTE: [&str; 10] = [
    "#6366f1", // indigo
    "#8b5cf6", // violet
    "#ec4899", // pink
    "#f59e0b", // amber
    "#10b981", // emerald
    "#ef4444", // red
    "#3b82f6", // blue
    "#06b6d4", // cyan
    "#a855f7", // purple
    "#f97316", // orange
];

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self - other).length()
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Point {
    type Output = Point;
    fn div(self, rhs: f32) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in document space.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RectF {
    pub min: Point,
    pub max: Point,
}

impl RectF {
    pub fn from_min_max(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_min_size(min: Point, size: Size) -> Self {
        Self {
            min,
            max: Point::new(min.x + size.width, min.y + size.height),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    pub fn union(self, other: RectF) -> RectF {
        RectF {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn expand(self, amount: f32) -> RectF {
        RectF {
            min: Point::new(self.min.x - amount, self.min.y - amount),
            max: Point::new(self.max.x + amount, self.max.y + amount),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn is_valid(self) -> bool {
        self.max.x > self.min.x && self.max.y > self.min.y
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Diamond,
    Database,
    Text,
    Image,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Rectangle,
        ShapeKind::Circle,
        ShapeKind::Diamond,
        ShapeKind::Database,
        ShapeKind::Text,
        ShapeKind::Image,
    ];

    pub fn default_size(self) -> Size {
        match self {
            ShapeKind::Text => Size::new(200.0, 40.0),
            ShapeKind::Diamond => Size::new(100.0, 100.0),
            ShapeKind::Database => Size::new(120.0, 100.0),
            ShapeKind::Rectangle | ShapeKind::Circle | ShapeKind::Image => Size::new(120.0, 80.0),
        }
    }

    pub fn default_color(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "#6366f1",
            ShapeKind::Circle => "#8b5cf6",
            ShapeKind::Database => "#10b981",
            ShapeKind::Diamond => "#f59e0b",
            ShapeKind::Text => "#ec4899",
            ShapeKind::Image => "#3b82f6",
        }
    }

    pub fn default_label(self) -> &'static str {
        match self {
            ShapeKind::Text => "Double click to edit",
            ShapeKind::Diamond => "Condition?",
            ShapeKind::Image => "",
            ShapeKind::Rectangle | ShapeKind::Circle | ShapeKind::Database => "Component",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Diamond => "diamond",
            ShapeKind::Database => "database",
            ShapeKind::Text => "text",
            ShapeKind::Image => "image",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(rename = "text", alias = "label", default)]
    pub label: String,
    /// Empty means "use the kind colour".
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(
        rename = "imageUrl",
        alias = "imageUri",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_uri: Option<String>,
}

impl Shape {
    /// A default-sized shape of `kind` with its top-left corner at `origin`.
    pub fn new(kind: ShapeKind, origin: Point) -> Self {
        let size = kind.default_size();
        Self {
            id: new_id("shape"),
            kind,
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            label: kind.default_label().to_string(),
            color: kind.default_color().to_string(),
            font_size: Some(DEFAULT_FONT_SIZE),
            image_uri: None,
        }
    }

    pub fn image(origin: Point, image_uri: String) -> Self {
        Self {
            image_uri: Some(image_uri),
            ..Self::new(ShapeKind::Image, origin)
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bounds(&self) -> RectF {
        RectF::from_min_size(self.origin(), Size::new(self.width, self.height))
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn font_size(&self) -> f32 {
        self.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }

    pub fn stroke_color(&self) -> &str {
        if self.color.is_empty() {
            self.kind.default_color()
        } else {
            &self.color
        }
    }

    /// Replaces the geometry, flooring the size at the minimum shape extent.
    pub fn set_bounds(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.x = x;
        self.y = y;
        self.width = width.max(MIN_SHAPE_WIDTH);
        self.height = height.max(MIN_SHAPE_HEIGHT);
    }
}

/// Partial update for [`Document::update_shape`]. Unset fields are left alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapePatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub label: Option<String>,
    pub color: Option<String>,
    pub font_size: Option<f32>,
    pub image_uri: Option<String>,
}

impl ShapePatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Self::default()
        }
    }

    pub fn font_size(size: f32) -> Self {
        Self {
            font_size: Some(size),
            ..Self::default()
        }
    }

    fn apply(self, shape: &mut Shape) {
        if let Some(x) = self.x {
            shape.x = x;
        }
        if let Some(y) = self.y {
            shape.y = y;
        }
        if let Some(w) = self.width {
            shape.width = w.max(MIN_SHAPE_WIDTH);
        }
        if let Some(h) = self.height {
            shape.height = h.max(MIN_SHAPE_HEIGHT);
        }
        if let Some(label) = self.label {
            shape.label = label;
        }
        if let Some(color) = self.color {
            shape.color = color;
        }
        if let Some(size) = self.font_size {
            shape.font_size = Some(size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE));
        }
        if let Some(uri) = self.image_uri {
            shape.image_uri = Some(uri);
        }
    }
}

/// A directed edge from `source` to `target`. Duplicates per pair are allowed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connection {
    pub id: String,
    #[serde(rename = "from", alias = "sourceShapeId")]
    pub source: String,
    #[serde(rename = "to", alias = "targetShapeId")]
    pub target: String,
}

/// The whole diagram. Shape order is z-order: later shapes draw on top.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.connections.is_empty()
    }

    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn shape_mut(&mut self, id: &str) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    pub fn shape_index(&self, id: &str) -> Option<usize> {
        self.shapes.iter().position(|s| s.id == id)
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn add_shape(&mut self, shape: Shape) {
        tracing::debug!(id = %shape.id, kind = shape.kind.name(), "shape added");
        self.shapes.push(shape);
    }

    /// Returns `false` when no shape has `id`.
    pub fn update_shape(&mut self, id: &str, patch: ShapePatch) -> bool {
        let Some(shape) = self.shape_mut(id) else {
            return false;
        };
        patch.apply(shape);
        true
    }

    /// Removes the shape and every connection touching it.
    pub fn remove_shape(&mut self, id: &str) -> bool {
        let Some(idx) = self.shape_index(id) else {
            return false;
        };
        self.shapes.remove(idx);
        let before = self.connections.len();
        self.connections.retain(|c| c.source != id && c.target != id);
        tracing::debug!(
            id,
            cascaded = before - self.connections.len(),
            "shape removed"
        );
        true
    }

    pub fn add_connection(
        &mut self,
        source: &str,
        target: &str,
    ) -> Result<&Connection, ModelError> {
        if source == target {
            return Err(ModelError::SelfConnection(source.to_string()));
        }
        for id in [source, target] {
            if self.shape(id).is_none() {
                return Err(ModelError::MissingShape(id.to_string()));
            }
        }
        let connection = Connection {
            id: new_id("connection"),
            source: source.to_string(),
            target: target.to_string(),
        };
        tracing::debug!(id = %connection.id, source, target, "connection added");
        self.connections.push(connection);
        Ok(&self.connections[self.connections.len() - 1])
    }

    pub fn remove_connection(&mut self, id: &str) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| c.id != id);
        before != self.connections.len()
    }

    /// Tight bounding box of every shape, or `None` for an empty diagram.
    pub fn bounds(&self) -> Option<RectF> {
        self.shapes
            .iter()
            .map(Shape::bounds)
            .reduce(|a, b| a.union(b))
    }

    /// Parses, normalizes and validates externally supplied diagram data.
    pub fn from_json(json: &str) -> Result<Document, ImportError> {
        let mut doc: Document = serde_json::from_str(json)?;
        doc.fill_defaults();
        doc.validate()?;
        Ok(doc)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn fill_defaults(&mut self) {
        for shape in &mut self.shapes {
            if shape.color.is_empty() {
                shape.color = shape.kind.default_color().to_string();
            }
        }
    }

    /// Structural checks applied before an imported document replaces the live one.
    pub fn validate(&self) -> Result<(), ImportError> {
        let mut ids = HashSet::new();
        for shape in &self.shapes {
            if shape.id.is_empty() {
                return Err(invalid("a shape has an empty id"));
            }
            if !ids.insert(shape.id.as_str()) {
                return Err(invalid(format!("duplicate shape id `{}`", shape.id)));
            }
            if !shape.origin().is_finite() {
                return Err(invalid(format!("shape `{}` has a non-finite position", shape.id)));
            }
            let size_ok = shape.width.is_finite()
                && shape.height.is_finite()
                && shape.width > 0.0
                && shape.height > 0.0;
            if !size_ok {
                return Err(invalid(format!("shape `{}` has a non-positive size", shape.id)));
            }
            if let Some(size) = shape.font_size {
                if !(size.is_finite() && size > 0.0) {
                    return Err(invalid(format!("shape `{}` has an invalid font size", shape.id)));
                }
            }
            if shape.kind == ShapeKind::Image
                && shape.image_uri.as_deref().is_none_or(str::is_empty)
            {
                return Err(invalid(format!("image shape `{}` has no image", shape.id)));
            }
        }
        let mut connection_ids = HashSet::new();
        for c in &self.connections {
            if c.id.is_empty() {
                return Err(invalid("a connection has an empty id"));
            }
            if !connection_ids.insert(c.id.as_str()) {
                return Err(invalid(format!("duplicate connection id `{}`", c.id)));
            }
            if c.source == c.target {
                return Err(invalid(format!("connection `{}` loops on one shape", c.id)));
            }
            for end in [&c.source, &c.target] {
                if !ids.contains(end.as_str()) {
                    return Err(invalid(format!(
                        "connection `{}` references missing shape `{end}`",
                        c.id
                    )));
                }
            }
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ImportError {
    ImportError::Invalid(msg.into())
}

pub(crate) fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let ab_len2 = ab.x * ab.x + ab.y * ab.y;
    if ab_len2 <= f32::EPSILON {
        return (p - a).length();
    }
    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len2).clamp(0.0, 1.0);
    let closest = a + ab * t;
    (p - closest).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(id: &str, x: f32, y: f32) -> Shape {
        Shape {
            id: id.to_string(),
            ..Shape::new(ShapeKind::Rectangle, Point::new(x, y))
        }
    }

    fn connect(doc: &mut Document, a: &str, b: &str) -> String {
        doc.add_connection(a, b).map(|c| c.id.clone()).unwrap()
    }

    #[test]
    fn default_sizes_follow_kind() {
        assert_eq!(ShapeKind::Text.default_size(), Size::new(200.0, 40.0));
        assert_eq!(ShapeKind::Diamond.default_size(), Size::new(100.0, 100.0));
        assert_eq!(ShapeKind::Database.default_size(), Size::new(120.0, 100.0));
        assert_eq!(ShapeKind::Rectangle.default_size(), Size::new(120.0, 80.0));
        assert_eq!(ShapeKind::Circle.default_size(), Size::new(120.0, 80.0));
    }

    #[test]
    fn remove_shape_cascades_only_touching_connections() {
        let mut doc = Document::default();
        for (id, x) in [("a", 0.0), ("b", 200.0), ("c", 400.0)] {
            doc.add_shape(rect(id, x, 0.0));
        }
        let ab = connect(&mut doc, "a", "b");
        let ba = connect(&mut doc, "b", "a");
        let bc = connect(&mut doc, "b", "c");
        let ca = connect(&mut doc, "c", "a");

        assert!(doc.remove_shape("a"));
        let left: Vec<_> = doc.connections.iter().map(|c| c.id.clone()).collect();
        assert_eq!(left, vec![bc]);
        assert!(doc.connection(&ab).is_none());
        assert!(doc.connection(&ba).is_none());
        assert!(doc.connection(&ca).is_none());
    }

    #[test]
    fn missing_ids_are_silent_no_ops() {
        let mut doc = Document::default();
        doc.add_shape(rect("a", 0.0, 0.0));
        let before = doc.clone();
        assert!(!doc.remove_shape("nope"));
        assert!(!doc.remove_connection("nope"));
        assert!(!doc.update_shape("nope", ShapePatch::label("x")));
        assert_eq!(doc, before);
    }

    #[test]
    fn add_connection_rejects_missing_and_self() {
        let mut doc = Document::default();
        doc.add_shape(rect("a", 0.0, 0.0));
        assert_eq!(
            doc.add_connection("a", "a").unwrap_err(),
            ModelError::SelfConnection("a".into())
        );
        assert_eq!(
            doc.add_connection("a", "ghost").unwrap_err(),
            ModelError::MissingShape("ghost".into())
        );
        assert!(doc.connections.is_empty());
    }

    #[test]
    fn duplicate_connections_are_allowed() {
        let mut doc = Document::default();
        doc.add_shape(rect("a", 0.0, 0.0));
        doc.add_shape(rect("b", 300.0, 0.0));
        connect(&mut doc, "a", "b");
        connect(&mut doc, "a", "b");
        assert_eq!(doc.connections.len(), 2);
        assert_ne!(doc.connections[0].id, doc.connections[1].id);
    }

    #[test]
    fn patch_floors_size_and_clamps_font() {
        let mut doc = Document::default();
        doc.add_shape(rect("a", 0.0, 0.0));
        let patch = ShapePatch {
            width: Some(3.0),
            height: Some(-10.0),
            font_size: Some(90.0),
            ..ShapePatch::default()
        };
        assert!(doc.update_shape("a", patch));
        let s = doc.shape("a").unwrap();
        assert_eq!((s.width, s.height), (MIN_SHAPE_WIDTH, MIN_SHAPE_HEIGHT));
        assert_eq!(s.font_size(), MAX_FONT_SIZE);
    }

    #[test]
    fn json_without_connections_imports_empty_list() {
        let json = r##"{"shapes":[{"id":"s1","type":"circle","x":1,"y":2,"width":120,"height":80,"text":"hi"}]}"##;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.shapes.len(), 1);
        assert!(doc.connections.is_empty());
        assert_eq!(doc.shapes[0].color, "#8b5cf6");
        assert_eq!(doc.shapes[0].font_size(), DEFAULT_FONT_SIZE);
    }

    #[test]
    fn json_accepts_persisted_label_and_anchor_fields() {
        let json = r##"{
            "shapes": [
                {"id":"a","type":"rectangle","x":0,"y":0,"width":120,"height":80,"label":"A","color":"#ef4444"},
                {"id":"b","type":"text","x":300,"y":0,"width":200,"height":40,"label":"B"}
            ],
            "connections": [{"id":"c","from":"a","to":"b","fromAnchor":"","toAnchor":""}]
        }"##;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.shapes[0].label, "A");
        assert_eq!(doc.shapes[0].color, "#ef4444");
        assert_eq!(doc.connections[0].source, "a");
        assert_eq!(doc.connections[0].target, "b");
    }

    #[test]
    fn validation_rejects_dangling_connections_and_bad_sizes() {
        let dangling = r#"{"shapes":[],"connections":[{"id":"c","from":"a","to":"b"}]}"#;
        assert!(matches!(
            Document::from_json(dangling),
            Err(ImportError::Invalid(_))
        ));
        let flat = r#"{"shapes":[{"id":"a","type":"rectangle","x":0,"y":0,"width":0,"height":10}]}"#;
        assert!(matches!(Document::from_json(flat), Err(ImportError::Invalid(_))));
        let no_image = r#"{"shapes":[{"id":"a","type":"image","x":0,"y":0,"width":10,"height":10}]}"#;
        assert!(matches!(
            Document::from_json(no_image),
            Err(ImportError::Invalid(_))
        ));
        assert!(matches!(Document::from_json("{"), Err(ImportError::Parse(_))));
    }

    #[test]
    fn json_round_trip_uses_wire_names() {
        let mut doc = Document::default();
        doc.add_shape(rect("a", 0.0, 0.0));
        let json = doc.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let shape = &value["shapes"][0];
        assert_eq!(shape["type"], "rectangle");
        assert_eq!(shape["text"], "Component");
        assert_eq!(shape["fontSize"], 14.0);
        assert!(shape.get("imageUrl").is_none());
    }

    #[test]
    fn segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Point::new(-4.0, 3.0), a, b), 5.0);
    }
}
