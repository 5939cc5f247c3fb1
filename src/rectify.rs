//! Perspective correction of a detected receipt quadrilateral.
//!
//! The destination rectangle spans the longer of each pair of opposite sides.
//! Side lengths are measured between corner pixel centres, so a quad whose
//! corners sit on the corner pixels of a W x H image maps onto exactly W x H.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, instrument, warn};

use crate::models::{OrderedCorners, Point2D, polygon_area};

/// How far, in destination pixels, a solved corner may land from its target.
const LANDING_TOLERANCE: f64 = 0.5;

/// A projective transform between two pixel planes.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveTransform {
    projection: Projection,
}

impl PerspectiveTransform {
    pub fn from_projection(projection: Projection) -> Self {
        Self { projection }
    }

    /// Solve the unique transform taking each `src[i]` onto `dst[i]`.
    ///
    /// Returns `None` when the correspondences are degenerate (coincident or
    /// collinear points on either side).
    pub fn from_point_pairs(src: &[Point2D; 4], dst: &[Point2D; 4]) -> Option<Self> {
        if polygon_area(src) <= f64::EPSILON || polygon_area(dst) <= f64::EPSILON {
            return None;
        }
        let to_f32 = |p: &Point2D| (p.x as f32, p.y as f32);
        let (from, to) = (src.each_ref().map(to_f32), dst.each_ref().map(to_f32));
        let projection = Projection::from_control_points(from, to)?;
        let transform = Self { projection };

        // A least-squares fallback can come back for a near-singular system.
        let lands = src.iter().zip(dst).all(|(s, d)| {
            transform
                .apply(*s)
                .is_some_and(|mapped| mapped.distance(d) <= LANDING_TOLERANCE)
        });
        lands.then_some(transform)
    }

    /// Transform from the ordered corners onto a `width` x `height` rectangle.
    pub fn from_corners(corners: &OrderedCorners, width: u32, height: u32) -> Option<Self> {
        let w = f64::from(width.saturating_sub(1));
        let h = f64::from(height.saturating_sub(1));
        let dst = [
            Point2D::new(0.0, 0.0),
            Point2D::new(w, 0.0),
            Point2D::new(w, h),
            Point2D::new(0.0, h),
        ];
        Self::from_point_pairs(&corners.to_array(), &dst)
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn inverse(&self) -> Self {
        Self::from_projection(self.projection.invert())
    }

    /// Map a point; `None` if it lands on the line at infinity.
    pub fn apply(&self, p: Point2D) -> Option<Point2D> {
        let (x, y) = self.projection * (p.x as f32, p.y as f32);
        (x.is_finite() && y.is_finite()).then(|| Point2D::new(f64::from(x), f64::from(y)))
    }
}

/// Width and height of the rectified receipt, each at least one pixel.
pub fn destination_size(corners: &OrderedCorners) -> (u32, u32) {
    let width = corners
        .top_left
        .distance(&corners.top_right)
        .max(corners.bottom_left.distance(&corners.bottom_right));
    let height = corners
        .top_left
        .distance(&corners.bottom_left)
        .max(corners.top_right.distance(&corners.bottom_right));

    if width < 1.0 || height < 1.0 {
        warn!(width, height, "degenerate corner geometry, clamping to one pixel");
    }
    (span_to_pixels(width), span_to_pixels(height))
}

fn span_to_pixels(span: f64) -> u32 {
    // Truncate, then count both end pixels.
    (span as u32).saturating_add(1).max(1)
}

/// Resample `image` into a `width` x `height` buffer through `transform`.
///
/// Sampling is bilinear. Pixels whose pre-image falls more than one pixel
/// outside the source are black.
pub fn warp_perspective(
    image: &RgbImage,
    transform: &PerspectiveTransform,
    width: u32,
    height: u32,
) -> RgbImage {
    // The bilinear sampler needs a right and bottom neighbour, so the source
    // gets a one pixel replicated frame and the transform shifts to match.
    let framed = replicate_frame(image);
    let projection = Projection::translate(-1.0, -1.0).and_then(transform.projection);

    let mut output = RgbImage::new(width, height);
    warp_into(&framed, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut output);
    output
}

fn replicate_frame(image: &RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    RgbImage::from_fn(w + 2, h + 2, |x, y| {
        *image.get_pixel(x.saturating_sub(1).min(w - 1), y.saturating_sub(1).min(h - 1))
    })
}

/// Flatten the quadrilateral bounded by `corners` into an axis-aligned color image.
///
/// Returns `None` if no transform exists for these corners (e.g. collinear
/// points); callers fall back to the unrectified image.
#[instrument(skip_all)]
pub fn rectify(image: &DynamicImage, corners: &OrderedCorners) -> Option<DynamicImage> {
    let (width, height) = destination_size(corners);
    let Some(transform) = PerspectiveTransform::from_corners(corners, width, height) else {
        warn!(?corners, "perspective transform is not solvable for these corners");
        return None;
    };
    debug!(width, height, projection = ?transform.projection(), "warping to destination rectangle");

    let warped = warp_perspective(&image.to_rgb8(), &transform, width, height);
    Some(DynamicImage::ImageRgb8(warped))
}
