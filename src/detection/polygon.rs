use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use tracing::{debug, instrument};

use crate::models::{Contour, Point2D, QuadDetection, Quadrilateral};

/// Simplify a closed curve with the Douglas-Peucker algorithm.
///
/// Vertices within `epsilon` of the simplified outline are dropped. The first
/// traced point is always kept. A non-positive `epsilon` keeps the curve as is.
pub fn approximate_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }
    approximate_polygon_dp(points, epsilon, true)
}

/// Pick the first candidate whose polygon approximation has exactly four vertices.
///
/// The tolerance is `epsilon_ratio` times each contour's perimeter. Candidates
/// are tried in the order given; the first match wins.
#[instrument(skip_all, fields(candidates = candidates.len(), epsilon_ratio = epsilon_ratio))]
pub fn select_quadrilateral(candidates: &[Contour], epsilon_ratio: f64) -> QuadDetection {
    for (rank, contour) in candidates.iter().enumerate() {
        let perimeter = contour.perimeter();
        if perimeter <= 0.0 {
            continue;
        }
        let approx = approximate_polygon(&contour.points, epsilon_ratio * perimeter);
        debug!(rank, perimeter, vertices = approx.len(), "candidate approximated");

        if let [p0, p1, p2, p3] = approx[..] {
            let corners = [p0, p1, p2, p3].map(Point2D::from);
            return QuadDetection::Found(Quadrilateral::new(corners));
        }
    }
    QuadDetection::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::contours::largest_contours;
    use image::{GrayImage, Luma};
    use imageproc::drawing::{
        draw_hollow_circle_mut, draw_hollow_polygon_mut, draw_hollow_rect_mut,
    };
    use imageproc::rect::Rect;

    /// Dense samples along the border of an axis-aligned rectangle, clockwise from the origin.
    fn sampled_rectangle(w: i32, h: i32) -> Vec<Point<i32>> {
        let mut points = Vec::new();
        points.extend((0..w).map(|x| Point::new(x, 0)));
        points.extend((0..h).map(|y| Point::new(w, y)));
        points.extend((1..=w).rev().map(|x| Point::new(x, h)));
        points.extend((1..=h).rev().map(|y| Point::new(0, y)));
        points
    }

    fn has_point_near(points: &[Point2D], x: f64, y: f64) -> bool {
        points.iter().any(|p| p.distance(&Point2D::new(x, y)) <= 1.5)
    }

    #[test]
    fn rectangle_collapses_to_its_corners() {
        let approx: Vec<Point2D> = approximate_polygon(&sampled_rectangle(80, 40), 4.8)
            .into_iter()
            .map(Point2D::from)
            .collect();
        assert_eq!(approx.len(), 4);
        for (x, y) in [(0.0, 0.0), (80.0, 0.0), (80.0, 40.0), (0.0, 40.0)] {
            assert!(has_point_near(&approx, x, y), "missing corner ({x}, {y})");
        }
    }

    #[test]
    fn non_positive_tolerance_keeps_every_point() {
        let points = sampled_rectangle(10, 6);
        assert_eq!(approximate_polygon(&points, 0.0), points);
    }

    #[test]
    fn coincident_points_collapse() {
        let points = vec![Point::new(3, 3); 5];
        assert_eq!(approximate_polygon(&points, 1.0).len(), 1);
    }

    #[test]
    fn finds_rectangle_outline_in_edge_map() {
        let mut edges = GrayImage::new(240, 140);
        draw_hollow_rect_mut(&mut edges, Rect::at(10, 10).of_size(200, 100), Luma([255]));

        let detection = select_quadrilateral(&largest_contours(&edges, 5), 0.02);
        let QuadDetection::Found(quad) = detection else {
            panic!("expected a quadrilateral");
        };
        for (x, y) in [(10.0, 10.0), (209.0, 10.0), (209.0, 109.0), (10.0, 109.0)] {
            assert!(has_point_near(&quad.points, x, y), "missing corner ({x}, {y})");
        }
    }

    #[test]
    fn finds_tilted_outline_in_edge_map() {
        let corners: [(f32, f32); 4] = [(60.0, 30.0), (300.0, 70.0), (270.0, 420.0), (30.0, 380.0)];
        let outline: Vec<Point<f32>> = corners.iter().map(|&(x, y)| Point::new(x, y)).collect();
        let mut edges = GrayImage::new(340, 460);
        draw_hollow_polygon_mut(&mut edges, &outline, Luma([255]));

        let detection = select_quadrilateral(&largest_contours(&edges, 5), 0.02);
        let QuadDetection::Found(quad) = detection else {
            panic!("expected a quadrilateral");
        };
        for (x, y) in corners {
            let near = quad
                .points
                .iter()
                .any(|p| p.distance(&Point2D::new(f64::from(x), f64::from(y))) <= 4.0);
            assert!(near, "missing corner ({x}, {y}) in {:?}", quad.points);
        }
    }

    #[test]
    fn circle_is_not_a_quadrilateral() {
        let mut edges = GrayImage::new(300, 300);
        draw_hollow_circle_mut(&mut edges, (150, 150), 100, Luma([255]));

        let detection = select_quadrilateral(&largest_contours(&edges, 5), 0.02);
        assert_eq!(detection, QuadDetection::NotFound);
    }

    #[test]
    fn no_candidates_means_not_found() {
        assert_eq!(select_quadrilateral(&[], 0.02), QuadDetection::NotFound);
    }
}
