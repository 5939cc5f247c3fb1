use crate::models::{OrderedCorners, Point2D, Quadrilateral};

/// Assign top-left/top-right/bottom-right/bottom-left roles to four points.
///
/// Top-left minimizes `x + y`, bottom-right maximizes it; top-right minimizes
/// `y - x`, bottom-left maximizes it. This assumes the receipt is rotated by
/// less than about 45 degrees. On ties the earliest point in input order wins,
/// and a badly skewed quad can give one point two roles.
pub fn order_corners(quad: &Quadrilateral) -> OrderedCorners {
    let points = &quad.points;
    let sum = |p: &Point2D| p.x + p.y;
    let diff = |p: &Point2D| p.y - p.x;

    OrderedCorners {
        top_left: points[first_extreme(points, sum, Extreme::Min)],
        top_right: points[first_extreme(points, diff, Extreme::Min)],
        bottom_right: points[first_extreme(points, sum, Extreme::Max)],
        bottom_left: points[first_extreme(points, diff, Extreme::Max)],
    }
}

#[derive(Clone, Copy)]
enum Extreme {
    Min,
    Max,
}

fn first_extreme(points: &[Point2D; 4], key: impl Fn(&Point2D) -> f64, extreme: Extreme) -> usize {
    let mut best = 0;
    for i in 1..points.len() {
        let better = match extreme {
            Extreme::Min => key(&points[i]) < key(&points[best]),
            Extreme::Max => key(&points[i]) > key(&points[best]),
        };
        if better {
            best = i;
        }
    }
    best
}
