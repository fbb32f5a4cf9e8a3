use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point in editor space (or screen space, depending on the caller).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(120.0, 60.0)
    }
}

/// Axis-aligned rectangle; `origin` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn left(&self) -> f64 {
        self.origin.x
    }

    pub fn right(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn top(&self) -> f64 {
        self.origin.y
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y + self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    pub fn half_width(&self) -> f64 {
        self.size.width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.size.height / 2.0
    }

    /// Whether `p` lies inside or on the outline.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Strict overlap; rectangles that only touch along an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Distance from `p` to the nearest point of the rectangle outline.
    pub fn distance_to_boundary(&self, p: Point) -> f64 {
        if self.contains(p) {
            let dl = p.x - self.left();
            let dr = self.right() - p.x;
            let dt = p.y - self.top();
            let db = self.bottom() - p.y;
            return dl.min(dr).min(dt).min(db);
        }
        let dx = (self.left() - p.x).max(0.0).max(p.x - self.right());
        let dy = (self.top() - p.y).max(0.0).max(p.y - self.bottom());
        dx.hypot(dy)
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rect, Size};

    #[test]
    fn rect_edges_and_center() {
        let rect = Rect::new(Point::new(10.0, 20.0), Size::new(120.0, 60.0));
        assert_eq!(rect.right(), 130.0);
        assert_eq!(rect.bottom(), 80.0);
        assert_eq!(rect.center(), Point::new(70.0, 50.0));
    }

    #[test]
    fn touching_rects_do_not_overlap() {
        let a = Rect::new(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let b = Rect::new(Point::new(10.0, 0.0), Size::new(10.0, 10.0));
        assert!(!a.overlaps(&b));
        let c = Rect::new(Point::new(5.0, 5.0), Size::new(10.0, 10.0));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn boundary_distance_is_zero_on_outline() {
        let rect = Rect::new(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        assert_eq!(rect.distance_to_boundary(Point::new(10.0, 4.0)), 0.0);
        assert_eq!(rect.distance_to_boundary(Point::new(5.0, 5.0)), 5.0);
        assert_eq!(rect.distance_to_boundary(Point::new(13.0, 14.0)), 5.0);
    }
}
