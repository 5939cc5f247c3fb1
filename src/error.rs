use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the rectification and conditioning pipeline.
///
/// A missing quadrilateral or degenerate corner geometry is not an error:
/// those are absorbed by the pipeline with a logged warning.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("debug directory is not empty: {}", .0.display())]
    DebugDirNotEmpty(PathBuf),

    #[error("failed to write debug artifact '{name}': {message}")]
    DebugWrite { name: String, message: String },

    #[error("step '{step}' failed: {message}")]
    Step { step: String, message: String },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
