#![allow(dead_code)]

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_polygon_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;
use tempfile::NamedTempFile;

pub const BACKGROUND: Rgb<u8> = Rgb([35, 40, 45]);
pub const PAPER: Rgb<u8> = Rgb([240, 238, 232]);
pub const INK: Rgb<u8> = Rgb([60, 60, 60]);

/// Top-left corner and size of the receipt in [`receipt_photo`].
pub const RECEIPT_ORIGIN: (i32, i32) = (40, 40);
pub const RECEIPT_SIZE: (u32, u32) = (200, 100);

/// A 280x180 photo: a 200x100 white receipt with a few ink lines on a dark table.
pub fn receipt_photo() -> DynamicImage {
    let mut img = RgbImage::from_pixel(280, 180, BACKGROUND);
    let (x, y) = RECEIPT_ORIGIN;
    draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(RECEIPT_SIZE.0, RECEIPT_SIZE.1), PAPER);
    for line in 0..4 {
        draw_filled_rect_mut(&mut img, Rect::at(x + 20, y + 18 + line * 18).of_size(120, 4), INK);
    }
    DynamicImage::ImageRgb8(img)
}

/// Receipt corners in [`tilted_receipt_photo`]: top-left, top-right, bottom-right, bottom-left.
pub const TILTED_CORNERS: [(i32, i32); 4] = [(60, 30), (300, 70), (270, 420), (30, 380)];

/// A 340x460 photo of a receipt shot at an angle: a skewed white quad on a dark table.
pub fn tilted_receipt_photo() -> DynamicImage {
    let mut img = RgbImage::from_pixel(340, 460, BACKGROUND);
    let outline: Vec<Point<i32>> = TILTED_CORNERS.iter().map(|&(x, y)| Point::new(x, y)).collect();
    draw_polygon_mut(&mut img, &outline, PAPER);
    DynamicImage::ImageRgb8(img)
}

/// A featureless photo: nothing to detect.
pub fn flat_photo(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, PAPER))
}

/// A bright disk on a dark table: a closed boundary that is not four-sided.
pub fn disk_photo() -> DynamicImage {
    let mut img = RgbImage::from_pixel(240, 240, BACKGROUND);
    draw_filled_circle_mut(&mut img, (120, 120), 80, PAPER);
    DynamicImage::ImageRgb8(img)
}

/// An edge map holding only the 1-px outline of a `width` x `height` rectangle at (x, y).
pub fn rectangle_edge_map(
    canvas: (u32, u32),
    x: i32,
    y: i32,
    width: u32,
    height: u32,
) -> GrayImage {
    let mut edges = GrayImage::new(canvas.0, canvas.1);
    draw_hollow_rect_mut(&mut edges, Rect::at(x, y).of_size(width, height), Luma([255]));
    edges
}

/// A gradient photo with every pixel distinct enough to spot resampling errors.
pub fn gradient_photo(width: u32, height: u32) -> DynamicImage {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, ((x + y) % 200) as u8])
    });
    DynamicImage::ImageRgb8(img)
}

/// Saves the image as PNG into a temp file that is removed when dropped.
pub fn save_temp_png(img: &DynamicImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}
