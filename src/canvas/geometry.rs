use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Middle of the right edge, where the output handle sits.
    pub fn output_anchor(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height / 2.0)
    }

    /// Middle of the left edge, where the input handle sits.
    pub fn input_anchor(&self) -> Point {
        Point::new(self.x, self.y + self.height / 2.0)
    }
}

/// A connection drawn as a rotated straight bar: it starts at `origin`,
/// is `length` long and turned `angle_deg` clockwise from the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineGeometry {
    pub origin: Point,
    pub length: f64,
    pub angle_deg: f64,
}

impl LineGeometry {
    pub fn between(from: &Rect, to: &Rect) -> Self {
        let start = from.output_anchor();
        let end = to.input_anchor();
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        Self {
            origin: start,
            length: dx.hypot(dy),
            angle_deg: dy.atan2(dx).to_degrees(),
        }
    }

    /// CSS declarations for the connection element.
    pub fn css(&self) -> String {
        format!(
            "left:{:.1}px;top:{:.1}px;width:{:.1}px;transform:rotate({:.2}deg);",
            self.origin.x, self.origin.y, self.length, self.angle_deg
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_line_between_aligned_nodes() {
        let a = Rect::new(0.0, 0.0, 100.0, 50.0);
        let b = Rect::new(200.0, 0.0, 100.0, 50.0);
        let line = LineGeometry::between(&a, &b);
        assert_eq!(line.origin, Point::new(100.0, 25.0));
        assert_eq!(line.length, 100.0);
        assert_eq!(line.angle_deg, 0.0);
    }

    #[test]
    fn diagonal_line_angle() {
        let a = Rect::new(0.0, 0.0, 10.0, 20.0);
        let b = Rect::new(110.0, 100.0, 10.0, 20.0);
        let line = LineGeometry::between(&a, &b);
        assert!((line.length - 100.0 * 2f64.sqrt()).abs() < 1e-9);
        assert!((line.angle_deg - 45.0).abs() < 1e-9);
    }
}
