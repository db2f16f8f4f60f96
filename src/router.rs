//! Connector routing between shapes.
//!
//! Each shape offers four anchors, the midpoints of its edges. A connection
//! leaves the source through the anchor nearest the target's centre and enters
//! the target through the anchor nearest the source's centre, along one cubic
//! Bézier whose control points push straight out of each anchor's side. Paths
//! are recomputed from current geometry on every draw; nothing is cached.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_6, PI};

use crate::model::{Connection, Document, Point, Shape, distance_to_segment};

pub const CONTROL_OFFSET_RATIO: f32 = 0.4;
pub const MAX_CONTROL_OFFSET: f32 = 100.0;
pub const ARROW_LENGTH: f32 = 10.0;
pub const ARROW_HALF_ANGLE: f32 = FRAC_PI_6;

const FLATTEN_SEGMENTS: usize = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// Candidate order. Ties in distance resolve to the earlier side.
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    /// Unit vector pointing out of the shape through this side.
    pub fn outward(self) -> Point {
        match self {
            Side::Top => Point::new(0.0, -1.0),
            Side::Bottom => Point::new(0.0, 1.0),
            Side::Left => Point::new(-1.0, 0.0),
            Side::Right => Point::new(1.0, 0.0),
        }
    }

    /// Heading (radians, y down) of an arrow arriving at this side. Anchors
    /// are edge midpoints, so "straight into the edge" is always correct and
    /// the curve tangent is never consulted.
    pub fn arrival_angle(self) -> f32 {
        match self {
            Side::Right => PI,
            Side::Left => 0.0,
            Side::Bottom => -FRAC_PI_2,
            Side::Top => FRAC_PI_2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub point: Point,
    pub side: Side,
}

pub fn anchors(shape: &Shape) -> [Anchor; 4] {
    let c = shape.center();
    Side::ALL.map(|side| {
        let point = match side {
            Side::Top => Point::new(c.x, shape.y),
            Side::Bottom => Point::new(c.x, shape.y + shape.height),
            Side::Left => Point::new(shape.x, c.y),
            Side::Right => Point::new(shape.x + shape.width, c.y),
        };
        Anchor { point, side }
    })
}

pub fn closest_anchor(shape: &Shape, toward: Point) -> Anchor {
    let mut best = anchors(shape)[0];
    let mut best_distance = f32::INFINITY;
    for anchor in anchors(shape) {
        let d = anchor.point.distance(toward);
        if d < best_distance {
            best_distance = d;
            best = anchor;
        }
    }
    best
}

/// A routed connector: one cubic Bézier plus the arrowhead heading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectorPath {
    pub start: Anchor,
    pub end: Anchor,
    pub control1: Point,
    pub control2: Point,
    pub angle: f32,
}

impl ConnectorPath {
    pub fn point_at(&self, t: f32) -> Point {
        let u = 1.0 - t;
        self.start.point * (u * u * u)
            + self.control1 * (3.0 * u * u * t)
            + self.control2 * (3.0 * u * t * t)
            + self.end.point * (t * t * t)
    }

    pub fn flatten(&self, segments: usize) -> Vec<Point> {
        let n = segments.max(1);
        (0..=n).map(|i| self.point_at(i as f32 / n as f32)).collect()
    }

    /// Filled-triangle vertices: tip first.
    pub fn arrowhead(&self) -> [Point; 3] {
        let tip = self.end.point;
        let wing = |a: f32| tip - Point::new(a.cos(), a.sin()) * ARROW_LENGTH;
        [
            tip,
            wing(self.angle - ARROW_HALF_ANGLE),
            wing(self.angle + ARROW_HALF_ANGLE),
        ]
    }

    pub fn distance_to(&self, p: Point) -> f32 {
        self.flatten(FLATTEN_SEGMENTS)
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .fold(f32::INFINITY, f32::min)
    }
}

pub fn route(source: &Shape, target: &Shape) -> ConnectorPath {
    let start = closest_anchor(source, target.center());
    let end = closest_anchor(target, source.center());
    let offset = (start.point.distance(end.point) * CONTROL_OFFSET_RATIO).min(MAX_CONTROL_OFFSET);
    ConnectorPath {
        start,
        end,
        control1: start.point + start.side.outward() * offset,
        control2: end.point + end.side.outward() * offset,
        angle: end.side.arrival_angle(),
    }
}

/// Routes `connection` against `doc`, or `None` when either end is gone.
pub fn route_connection(doc: &Document, connection: &Connection) -> Option<ConnectorPath> {
    let (Some(source), Some(target)) =
        (doc.shape(&connection.source), doc.shape(&connection.target))
    else {
        tracing::debug!(id = %connection.id, "skipping stale connection");
        return None;
    };
    Some(route(source, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShapeKind;

    fn shape(x: f32, y: f32, w: f32, h: f32) -> Shape {
        let mut s = Shape::new(ShapeKind::Rectangle, Point::new(x, y));
        s.width = w;
        s.height = h;
        s
    }

    #[test]
    fn side_by_side_shapes_use_facing_edges() {
        let a = shape(0.0, 0.0, 120.0, 80.0);
        let b = shape(300.0, 0.0, 120.0, 80.0);
        let path = route(&a, &b);
        assert_eq!(path.start.side, Side::Right);
        assert_eq!(path.start.point, Point::new(120.0, 40.0));
        assert_eq!(path.end.side, Side::Left);
        assert_eq!(path.end.point, Point::new(300.0, 40.0));
        assert_eq!(path.angle, 0.0);
        // distance 180 -> offset 72
        assert_eq!(path.control1, Point::new(192.0, 40.0));
        assert_eq!(path.control2, Point::new(228.0, 40.0));
    }

    #[test]
    fn stacked_shapes_use_bottom_and_top() {
        let a = shape(0.0, 0.0, 120.0, 80.0);
        let b = shape(0.0, 600.0, 120.0, 80.0);
        let path = route(&a, &b);
        assert_eq!(path.start.side, Side::Bottom);
        assert_eq!(path.end.side, Side::Top);
        assert_eq!(path.angle, FRAC_PI_2);
        assert_eq!(path.control1, Point::new(60.0, 180.0));
        let back = route(&b, &a);
        assert_eq!(back.angle, -FRAC_PI_2);
    }

    #[test]
    fn control_offset_is_capped() {
        let a = shape(0.0, 0.0, 120.0, 80.0);
        let b = shape(2000.0, 0.0, 120.0, 80.0);
        let path = route(&a, &b);
        assert_eq!(path.control1.x - path.start.point.x, MAX_CONTROL_OFFSET);
        assert_eq!(path.end.point.x - path.control2.x, MAX_CONTROL_OFFSET);
    }

    #[test]
    fn swapping_ends_mirrors_the_path() {
        let pairs = [
            (shape(0.0, 0.0, 120.0, 80.0), shape(300.0, 40.0, 100.0, 100.0)),
            (shape(10.0, 500.0, 200.0, 40.0), shape(-300.0, -20.0, 120.0, 100.0)),
            (shape(0.0, 0.0, 120.0, 80.0), shape(60.0, 90.0, 120.0, 80.0)),
        ];
        for (a, b) in pairs {
            let forward = route(&a, &b);
            let backward = route(&b, &a);
            assert_eq!(forward.start, backward.end);
            assert_eq!(forward.end, backward.start);
            assert_eq!(forward.control1, backward.control2);
            assert_eq!(forward.control2, backward.control1);
        }
    }

    #[test]
    fn arrowhead_points_back_along_heading() {
        let a = shape(0.0, 0.0, 120.0, 80.0);
        let b = shape(300.0, 0.0, 120.0, 80.0);
        let [tip, left, right] = route(&a, &b).arrowhead();
        assert_eq!(tip, Point::new(300.0, 40.0));
        assert!(left.x < tip.x && right.x < tip.x);
        assert!((left.y - 40.0 + (right.y - 40.0)).abs() < 1e-4);
    }

    #[test]
    fn stale_connections_are_skipped() {
        let mut doc = Document::default();
        doc.add_shape(shape(0.0, 0.0, 120.0, 80.0));
        let id = doc.shapes[0].id.clone();
        let stale = Connection {
            id: "c".into(),
            source: id,
            target: "gone".into(),
        };
        assert!(route_connection(&doc, &stale).is_none());
    }

    #[test]
    fn distance_to_curve_endpoints_is_zero() {
        let a = shape(0.0, 0.0, 120.0, 80.0);
        let b = shape(300.0, 200.0, 120.0, 80.0);
        let path = route(&a, &b);
        assert!(path.distance_to(path.start.point) < 1e-3);
        assert!(path.distance_to(path.end.point) < 1e-3);
        assert!(path.distance_to(Point::new(-500.0, -500.0)) > 100.0);
    }
}
