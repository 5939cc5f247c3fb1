pub mod preprocessing;
pub mod contours;
pub mod polygon;
pub mod corners;

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::models::{Contour, QuadDetection, Quadrilateral};

/// Finds the receipt boundary in a photograph.
#[derive(Debug, Clone)]
pub struct ReceiptDetector {
    /// Gaussian window applied before edge detection.
    pub blur_kernel: usize,
    pub canny_low: f32,
    pub canny_high: f32,
    /// How many of the largest contours are tried.
    pub max_candidates: usize,
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub epsilon_ratio: f64,
}

/// What the detector saw: the edge map it searched and the verdict.
#[derive(Debug, Clone)]
pub struct ReceiptDetection {
    pub edges: GrayImage,
    pub quad: QuadDetection,
}

impl ReceiptDetector {
    pub fn new() -> Self {
        Self {
            blur_kernel: 5,
            canny_low: 50.0,
            canny_high: 200.0,
            max_candidates: 5,
            epsilon_ratio: 0.02,
        }
    }

    pub fn edge_map(&self, img: &DynamicImage) -> Result<GrayImage> {
        preprocessing::build_edge_map(img, self.blur_kernel, self.canny_low, self.canny_high)
    }

    /// Largest-area contours of the edge map (for debugging)
    pub fn candidates(&self, edges: &GrayImage) -> Vec<Contour> {
        contours::largest_contours(edges, self.max_candidates)
    }

    /// Run edge detection, contour ranking and quadrilateral selection
    #[instrument(skip_all, fields(width = img.width(), height = img.height()))]
    pub fn detect(&self, img: &DynamicImage) -> Result<ReceiptDetection> {
        let edges = self.edge_map(img)?;
        let candidates = self.candidates(&edges);
        let quad = polygon::select_quadrilateral(&candidates, self.epsilon_ratio);
        debug!(candidates = candidates.len(), found = quad.is_found(), "boundary search done");
        Ok(ReceiptDetection { edges, quad })
    }
}

impl Default for ReceiptDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy of `img` with the quadrilateral outlined in green, 3 px wide.
pub fn draw_outline(img: &DynamicImage, quad: &Quadrilateral) -> RgbImage {
    let mut canvas = img.to_rgb8();
    let green = Rgb([0u8, 255, 0]);
    let points = quad.points;

    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        for dx in -1..=1 {
            for dy in -1..=1 {
                let (ox, oy) = (dx as f32, dy as f32);
                draw_line_segment_mut(
                    &mut canvas,
                    (a.x as f32 + ox, a.y as f32 + oy),
                    (b.x as f32 + ox, b.y as f32 + oy),
                    green,
                );
            }
        }
    }
    canvas
}
