use image::GrayImage;
use tracing::{debug, instrument};

use crate::models::Contour;

/// Find every closed boundary in a binary edge map.
///
/// Nesting is ignored: outer borders and hole borders come back as
/// independent contours.
pub fn find_contours(edges: &GrayImage) -> Vec<Contour> {
    let traced: Vec<imageproc::contours::Contour<i32>> = imageproc::contours::find_contours(edges);

    traced
        .into_iter()
        .filter(|c| !c.points.is_empty())
        .map(|c| Contour::new(c.points))
        .collect()
}

/// The `limit` contours enclosing the largest area, largest first.
///
/// Contours with equal area keep their tracing order.
#[instrument(skip_all, fields(limit = limit))]
pub fn largest_contours(edges: &GrayImage, limit: usize) -> Vec<Contour> {
    let mut ranked: Vec<(f64, Contour)> = find_contours(edges)
        .into_iter()
        .map(|c| (c.area(), c))
        .collect();
    let total = ranked.len();

    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranked.truncate(limit);

    debug!(
        total,
        kept = ranked.len(),
        largest_area = ranked.first().map(|(area, _)| *area).unwrap_or(0.0),
        "contours ranked by area"
    );
    ranked.into_iter().map(|(_, c)| c).collect()
}
