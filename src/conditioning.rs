//! Recognition-oriented cleanup of the (possibly rectified) receipt.

use image::{GrayImage, Luma};
use imageproc::filter::{filter3x3, median_filter};
use tracing::instrument;

use crate::detection::preprocessing::gaussian_mean;

pub use crate::detection::preprocessing::to_grayscale;

/// High-pass kernel, row-major: centre 9, neighbours -1. Coefficients sum to 1.
pub const SHARPEN_KERNEL: [i32; 9] = [-1, -1, -1, -1, 9, -1, -1, -1, -1];

/// Side of the square window used for the adaptive threshold mean.
pub const THRESHOLD_BLOCK_SIZE: usize = 11;

/// Subtracted from the local mean before comparing.
pub const THRESHOLD_OFFSET: f32 = 2.0;

/// 3x3 median filter; removes salt-and-pepper speckle while keeping stroke edges.
#[instrument(skip_all)]
pub fn denoise(img: &GrayImage) -> GrayImage {
    median_filter(img, 1, 1)
}

/// Convolve with [`SHARPEN_KERNEL`], saturating to 0..=255.
///
/// Borders replicate the outermost pixel.
#[instrument(skip_all)]
pub fn sharpen(img: &GrayImage) -> GrayImage {
    filter3x3::<_, i32, u8>(img, &SHARPEN_KERNEL)
}

/// Binarize against a Gaussian-weighted local mean.
///
/// A pixel becomes 255 when it is brighter than the mean of its
/// [`THRESHOLD_BLOCK_SIZE`] window minus [`THRESHOLD_OFFSET`], else 0.
#[instrument(skip_all)]
pub fn adaptive_threshold(img: &GrayImage) -> GrayImage {
    let means = gaussian_mean(img, THRESHOLD_BLOCK_SIZE);
    let width = img.width() as usize;
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let local = means[y as usize * width + x as usize].round() - THRESHOLD_OFFSET;
        let value = f32::from(img.get_pixel(x, y)[0]);
        Luma([if value > local { 255 } else { 0 }])
    })
}
