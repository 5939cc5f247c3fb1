use image::{DynamicImage, GrayImage};
use tracing::{info, warn};

use crate::conditioning;
use crate::detection::corners::order_corners;
use crate::detection::{draw_outline, ReceiptDetector};
use crate::error::Result;
use crate::models::QuadDetection;
use crate::pipeline::{CropOutcome, PipelineContext, PipelineData, PipelineStep};
use crate::rectify::rectify;

/// Take the single-channel buffer out of an image, converting only if needed.
fn into_gray(image: DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray,
        other => conditioning::to_grayscale(&other),
    }
}

/// Find the receipt boundary and flatten it; keeps the full image if none is found.
#[derive(Debug, Clone, Default)]
pub struct AutoCropStep {
    pub detector: ReceiptDetector,
}

impl PipelineStep for AutoCropStep {
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let detection = self.detector.detect(&data.image)?;
        if context.has_debug() {
            context.snapshot("0_edges", &DynamicImage::ImageLuma8(detection.edges));
        }

        let quad = match detection.quad {
            QuadDetection::Found(quad) => quad,
            QuadDetection::NotFound => {
                warn!("could not find a 4-point contour, using full image");
                return Ok(PipelineData {
                    crop: CropOutcome::NotFound,
                    ..data
                });
            }
        };

        if context.has_debug() {
            let overlay = draw_outline(&data.image, &quad);
            context.snapshot("0_contour", &DynamicImage::ImageRgb8(overlay));
        }

        let corners = order_corners(&quad);
        match rectify(&data.image, &corners) {
            Some(rectified) => {
                let (width, height) = (rectified.width(), rectified.height());
                info!(
                    width,
                    height,
                    top_left = ?corners.top_left,
                    bottom_right = ?corners.bottom_right,
                    "found a 4-point contour, perspective corrected"
                );
                Ok(PipelineData {
                    image: rectified,
                    crop: CropOutcome::Rectified {
                        corners,
                        width,
                        height,
                    },
                })
            }
            None => Ok(PipelineData {
                crop: CropOutcome::Unrectifiable { corners },
                ..data
            }),
        }
    }

    fn name(&self) -> &str {
        "Auto Crop"
    }
}

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        Ok(PipelineData {
            image: DynamicImage::ImageLuma8(into_gray(data.image)),
            crop: data.crop,
        })
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }

    fn artifact(&self) -> Option<&str> {
        Some("1_grayscale")
    }
}

/// 3x3 median filter
pub struct DenoiseStep;

impl PipelineStep for DenoiseStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = into_gray(data.image);
        Ok(PipelineData {
            image: DynamicImage::ImageLuma8(conditioning::denoise(&gray)),
            crop: data.crop,
        })
    }

    fn name(&self) -> &str {
        "Median Denoise"
    }

    fn artifact(&self) -> Option<&str> {
        Some("2_denoised")
    }
}

/// Sharpen images to enhance text edges
pub struct SharpenStep;

impl PipelineStep for SharpenStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = into_gray(data.image);
        Ok(PipelineData {
            image: DynamicImage::ImageLuma8(conditioning::sharpen(&gray)),
            crop: data.crop,
        })
    }

    fn name(&self) -> &str {
        "Sharpen"
    }

    fn artifact(&self) -> Option<&str> {
        Some("3_sharpened")
    }
}

/// Gaussian adaptive binarization
pub struct ThresholdStep;

impl PipelineStep for ThresholdStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = into_gray(data.image);
        Ok(PipelineData {
            image: DynamicImage::ImageLuma8(conditioning::adaptive_threshold(&gray)),
            crop: data.crop,
        })
    }

    fn name(&self) -> &str {
        "Adaptive Threshold"
    }

    fn artifact(&self) -> Option<&str> {
        Some("4_threshold")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn auto_crop_keeps_image_when_nothing_is_found() {
        let input = DynamicImage::ImageRgb8(RgbImage::from_pixel(60, 40, Rgb([200, 190, 180])));
        let out = AutoCropStep::default()
            .process(PipelineData::from_image(input.clone()), &PipelineContext::default())
            .unwrap();
        assert_eq!(out.crop, CropOutcome::NotFound);
        assert_eq!(out.image, input);
    }

    #[test]
    fn conditioning_steps_keep_crop_outcome() {
        let data = PipelineData {
            image: DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([99]))),
            crop: CropOutcome::NotFound,
        };
        let out = SharpenStep.process(data, &PipelineContext::default()).unwrap();
        assert_eq!(out.crop, CropOutcome::NotFound);
        assert_eq!(out.image.to_luma8().get_pixel(3, 3)[0], 99);
    }

    #[test]
    fn grayscale_step_is_idempotent() {
        let input = DynamicImage::ImageRgb8(RgbImage::from_fn(12, 9, |x, y| {
            Rgb([x as u8 * 20, y as u8 * 25, 77])
        }));
        let context = PipelineContext::default();
        let once = GrayscaleStep.process(PipelineData::from_image(input), &context).unwrap();
        let twice = GrayscaleStep.process(once.clone(), &context).unwrap();
        assert_eq!(once.image, twice.image);
    }
}
