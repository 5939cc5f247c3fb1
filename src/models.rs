use imageproc::geometry::{arc_length, contour_area};
use imageproc::point::Point;

/// A position in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<Point<i32>> for Point2D {
    fn from(p: Point<i32>) -> Self {
        Self::new(f64::from(p.x), f64::from(p.y))
    }
}

/// A closed boundary traced from an edge map.
///
/// Point order is whatever border following produced; only area and
/// perimeter are meaningful.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    /// Enclosed area (shoelace formula), always non-negative.
    pub fn area(&self) -> f64 {
        contour_area(&self.points)
    }

    /// Length of the closed boundary, including the segment back to the start.
    pub fn perimeter(&self) -> f64 {
        arc_length(&self.points, true)
    }
}

/// Shoelace area of a closed polygon.
pub fn polygon_area(points: &[Point2D]) -> f64 {
    let points: Vec<Point<f64>> = points.iter().map(|p| Point::new(p.x, p.y)).collect();
    contour_area(&points)
}

/// Four boundary vertices with no role assigned yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrilateral {
    pub points: [Point2D; 4],
}

impl Quadrilateral {
    pub fn new(points: [Point2D; 4]) -> Self {
        Self { points }
    }
}

/// Quadrilateral vertices with their canonical roles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedCorners {
    pub top_left: Point2D,
    pub top_right: Point2D,
    pub bottom_right: Point2D,
    pub bottom_left: Point2D,
}

impl OrderedCorners {
    /// Corners in clockwise order starting at top-left.
    pub fn to_array(&self) -> [Point2D; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

/// Outcome of searching the candidate contours for a receipt boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum QuadDetection {
    Found(Quadrilateral),
    NotFound,
}

impl QuadDetection {
    pub fn is_found(&self) -> bool {
        matches!(self, QuadDetection::Found(_))
    }
}
