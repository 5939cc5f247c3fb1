use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::edges::canny;
use imageproc::filter::separable_filter_equal;
use tracing::{debug, instrument};

use crate::error::{PipelineError, Result};

/// Convert image to single-channel intensity
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Reject images with a zero dimension before any stage touches them.
pub fn ensure_not_empty(img: &DynamicImage) -> Result<()> {
    if img.width() == 0 || img.height() == 0 {
        return Err(PipelineError::EmptyImage {
            width: img.width(),
            height: img.height(),
        });
    }
    Ok(())
}

/// Normalized 1D Gaussian weights for an odd window size.
///
/// Sigma is derived from the window size (`0.3 * ((size - 1) / 2 - 1) + 0.8`),
/// so a 5-tap kernel uses sigma 1.1 and an 11-tap kernel sigma 2.0.
pub fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size / 2) as f32;
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for weight in kernel.iter_mut() {
        *weight /= sum;
    }
    kernel
}

/// Gaussian-weighted local mean of every pixel over a `size` x `size` window.
///
/// Borders replicate the outermost pixel. Returned row-major, one value per pixel,
/// without rounding back to 8 bits.
pub fn gaussian_mean(img: &GrayImage, size: usize) -> Vec<f32> {
    let intensities: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
            Luma([f32::from(img.get_pixel(x, y)[0])])
        });
    separable_filter_equal(&intensities, &gaussian_kernel(size)).into_raw()
}

/// Apply a `size` x `size` Gaussian blur to reduce sensor noise
pub fn apply_blur(img: &GrayImage, size: usize) -> GrayImage {
    let means = gaussian_mean(img, size);
    let width = img.width() as usize;
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let value = means[y as usize * width + x as usize];
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Detect edges using the Canny (hysteresis) detector
///
/// `canny` applies its own sigma 1.4 Gaussian before the gradient step.
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Grayscale, blur and edge-detect a color image into a binary edge map.
///
/// The edge map has the same dimensions as the input; edge pixels are 255.
#[instrument(skip_all, fields(width = img.width(), height = img.height()))]
pub fn build_edge_map(
    img: &DynamicImage,
    blur_kernel: usize,
    low_threshold: f32,
    high_threshold: f32,
) -> Result<GrayImage> {
    ensure_not_empty(img)?;
    let gray = to_grayscale(img);
    let blurred = apply_blur(&gray, blur_kernel);
    let edges = detect_edges(&blurred, low_threshold, high_threshold);
    debug!(
        edge_pixels = edges.pixels().filter(|p| p[0] > 0).count(),
        "edge map built"
    );
    Ok(edges)
}
