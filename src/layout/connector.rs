//! Orthogonal connector geometry between two element rectangles.
//!
//! The straight line between the two centers is cut at each rectangle outline, then
//! routed as horizontal-then-vertical unless the cut points already line up.

use crate::core::condition::LabelRotation;
use crate::types::{Point, Rect};

/// Coordinates closer than this are treated as aligned.
const ALIGN_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorGeometry {
    pub start: Point,
    pub end: Point,
    /// Two points for a straight segment, three for an elbow.
    pub path: Vec<Point>,
    pub label: LabelPlacement,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    pub anchor: Point,
    pub rotation: LabelRotation,
}

/// Where the ray from the center of `rect` towards `toward` leaves the rectangle.
///
/// The scale factor is `max(|dx| / halfWidth, |dy| / halfHeight)`; the dominant
/// axis lands exactly on the matching edge. `None` when `toward` is the center.
pub fn boundary_point(rect: &Rect, toward: Point) -> Option<Point> {
    let center = rect.center();
    let dx = toward.x - center.x;
    let dy = toward.y - center.y;
    let hw = rect.half_width();
    let hh = rect.half_height();
    if hw <= 0.0 || hh <= 0.0 || (dx == 0.0 && dy == 0.0) {
        return None;
    }
    let sx = dx.abs() / hw;
    let sy = dy.abs() / hh;
    let point = if sx >= sy {
        let x = if dx > 0.0 { rect.right() } else { rect.left() };
        Point::new(x, center.y + dy / sx)
    } else {
        let y = if dy > 0.0 { rect.bottom() } else { rect.top() };
        Point::new(center.x + dx / sy, y)
    };
    Some(point)
}

/// Endpoints of the center-to-center line cut at both outlines.
pub fn connector_segment(from: &Rect, to: &Rect) -> Option<(Point, Point)> {
    let start = boundary_point(from, to.center())?;
    let end = boundary_point(to, from.center())?;
    Some((start, end))
}

/// Axis-aligned polyline between two points.
pub fn route(start: Point, end: Point) -> Vec<Point> {
    let aligned = (start.x - end.x).abs() <= ALIGN_EPSILON
        || (start.y - end.y).abs() <= ALIGN_EPSILON;
    if aligned {
        vec![start, end]
    } else {
        vec![start, Point::new(end.x, start.y), end]
    }
}

/// Midpoint of the longest segment; the first one wins ties.
pub fn label_anchor(path: &[Point]) -> Option<Point> {
    let mut best: Option<(f64, Point)> = None;
    for pair in path.windows(2) {
        let length = pair[0].distance(pair[1]);
        if best.map_or(true, |(longest, _)| length > longest) {
            best = Some((length, pair[0].midpoint(pair[1])));
        }
    }
    best.map(|(_, anchor)| anchor)
}

pub fn connector_geometry(
    from: &Rect,
    to: &Rect,
    rotation: Option<LabelRotation>,
) -> Option<ConnectorGeometry> {
    let (start, end) = connector_segment(from, to)?;
    let path = route(start, end);
    let anchor = label_anchor(&path)?;
    Some(ConnectorGeometry {
        start,
        end,
        path,
        label: LabelPlacement {
            anchor,
            rotation: rotation.unwrap_or_default(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::{boundary_point, connector_geometry, connector_segment, label_anchor, route};
    use crate::core::condition::LabelRotation;
    use crate::types::{Point, Rect, Size};

    fn rect(x: f64, y: f64) -> Rect {
        Rect::new(Point::new(x, y), Size::new(120.0, 60.0))
    }

    #[test]
    fn horizontal_neighbours_meet_at_facing_edges() {
        let (start, end) = connector_segment(&rect(0.0, 0.0), &rect(240.0, 0.0)).expect("segment");
        assert_eq!(start, Point::new(120.0, 30.0));
        assert_eq!(end, Point::new(240.0, 30.0));
        assert_eq!(route(start, end), vec![start, end]);
    }

    #[test]
    fn diagonal_neighbours_hit_the_dominant_edge() {
        let a = rect(0.0, 0.0);
        let b = rect(300.0, 300.0);
        let (start, end) = connector_segment(&a, &b).expect("segment");
        // dx = dy = 300: |dy|/30 dominates, so the bottom and top edges are hit.
        assert_eq!(start.y, a.bottom());
        assert_eq!(end.y, b.top());
        assert!(a.distance_to_boundary(start) < 1e-9);
        assert!(b.distance_to_boundary(end) < 1e-9);
    }

    #[test]
    fn elbow_goes_horizontal_first() {
        let path = route(Point::new(0.0, 0.0), Point::new(100.0, 40.0));
        assert_eq!(
            path,
            vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 40.0)
            ]
        );
        assert_eq!(label_anchor(&path), Some(Point::new(50.0, 0.0)));
    }

    #[test]
    fn coincident_centers_have_no_segment() {
        assert_eq!(boundary_point(&rect(0.0, 0.0), Point::new(60.0, 30.0)), None);
        assert!(connector_segment(&rect(0.0, 0.0), &rect(0.0, 0.0)).is_none());
    }

    #[test]
    fn geometry_carries_label_rotation() {
        let geometry = connector_geometry(
            &rect(0.0, 0.0),
            &rect(0.0, 200.0),
            Some(LabelRotation::Vertical),
        )
        .expect("geometry");
        assert_eq!(geometry.path.len(), 2);
        assert_eq!(geometry.label.anchor, Point::new(60.0, 130.0));
        assert_eq!(geometry.label.rotation, LabelRotation::Vertical);
    }
}
