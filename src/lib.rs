pub mod conditioning;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod rectify;
pub mod steps;

use image::{DynamicImage, ImageReader};
use std::path::Path;
use std::sync::Arc;

pub use config::PipelineConfig;
pub use detection::ReceiptDetector;
pub use error::{PipelineError, Result};
pub use models::{Contour, OrderedCorners, Point2D, QuadDetection, Quadrilateral};
pub use pipeline::{
    ConditionedImage, CropOutcome, DebugSink, DirectorySink, MemorySink, Pipeline,
    PipelineContext, PipelineData, PipelineStep,
};
pub use rectify::PerspectiveTransform;

/// Decode an image file. Any failure is an [`PipelineError::ImageLoad`].
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    let load_error = |source: image::ImageError| PipelineError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };

    let image = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| load_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(load_error)?;

    detection::preprocessing::ensure_not_empty(&image)?;
    Ok(image)
}

/// Load a receipt photo and run the configured pipeline on it.
pub fn preprocess_image(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
    debug: Option<Arc<dyn DebugSink>>,
) -> Result<ConditionedImage> {
    let image = load_image(path)?;
    let mut pipeline = Pipeline::from_config(config);
    if let Some(sink) = debug {
        pipeline = pipeline.with_debug_sink(sink);
    }
    pipeline.run(image)
}
