use image::{DynamicImage, GrayImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::config::PipelineConfig;
use crate::detection::preprocessing::ensure_not_empty;
use crate::error::{PipelineError, Result};
use crate::models::OrderedCorners;
use crate::steps::{AutoCropStep, DenoiseStep, GrayscaleStep, SharpenStep, ThresholdStep};

/// How the auto-crop stage resolved for this image
#[derive(Debug, Clone, PartialEq)]
pub enum CropOutcome {
    /// Auto-crop was not requested.
    Disabled,
    /// No candidate contour approximated to four vertices; the full image was kept.
    NotFound,
    /// A quadrilateral was found but no transform exists for it; the full image was kept.
    Unrectifiable { corners: OrderedCorners },
    /// The receipt was flattened into a `width` x `height` image.
    Rectified {
        corners: OrderedCorners,
        width: u32,
        height: u32,
    },
}

/// Data that flows through the pipeline
///
/// Each step takes ownership and hands back a new (or mutated) buffer.
#[derive(Debug, Clone)]
pub struct PipelineData {
    pub image: DynamicImage,
    pub crop: CropOutcome,
}

impl PipelineData {
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image,
            crop: CropOutcome::Disabled,
        }
    }
}

/// Result of a full run: the single-channel image for text recognition
#[derive(Debug, Clone)]
pub struct ConditionedImage {
    pub image: GrayImage,
    pub crop: CropOutcome,
}

/// Receives named snapshots of intermediate images.
pub trait DebugSink: Send + Sync {
    fn write(&self, name: &str, image: &DynamicImage) -> Result<()>;
}

/// Writes each artifact as `debug_<name>.png` into a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    output_dir: PathBuf,
}

impl DirectorySink {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(PipelineError::DebugDirNotEmpty(output_dir));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("debug_{name}.png"))
    }
}

impl DebugSink for DirectorySink {
    fn write(&self, name: &str, image: &DynamicImage) -> Result<()> {
        let path = self.artifact_path(name);
        image.save(&path).map_err(|e| PipelineError::DebugWrite {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "debug artifact saved");
        Ok(())
    }
}

/// Keeps artifacts in memory, in the order they were written
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<(String, DynamicImage)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<DynamicImage> {
        self.lock()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, image)| image.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, DynamicImage)>> {
        self.artifacts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DebugSink for MemorySink {
    fn write(&self, name: &str, image: &DynamicImage) -> Result<()> {
        self.lock().push((name.to_string(), image.clone()));
        Ok(())
    }
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<Arc<dyn DebugSink>>,
}

impl PipelineContext {
    pub fn has_debug(&self) -> bool {
        self.debug.is_some()
    }

    /// Hand an image to the debug sink, if any. Failures are logged and dropped.
    pub fn snapshot(&self, name: &str, image: &DynamicImage) {
        if let Some(sink) = &self.debug {
            if let Err(err) = sink.write(name, image) {
                warn!(artifact = name, error = %err, "debug artifact not written");
            }
        }
    }
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Consume the data and return the transformed data
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step (used in logs)
    fn name(&self) -> &str;

    /// Debug artifact name for the snapshot taken after this step
    fn artifact(&self) -> Option<&str> {
        None
    }
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// The fixed stage sequence for a configuration:
    /// auto-crop, grayscale, denoise, sharpen, threshold, each gated by its flag
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut pipeline = Self::new();
        if config.auto_crop {
            pipeline = pipeline.add_step(Arc::new(AutoCropStep::default()));
        }
        pipeline = pipeline.add_step(Arc::new(GrayscaleStep));
        if config.denoise {
            pipeline = pipeline.add_step(Arc::new(DenoiseStep));
        }
        if config.sharpen {
            pipeline = pipeline.add_step(Arc::new(SharpenStep));
        }
        if config.threshold {
            pipeline = pipeline.add_step(Arc::new(ThresholdStep));
        }
        pipeline
    }

    /// Send a snapshot of every stage to `sink`
    pub fn with_debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.context.debug = Some(sink);
        self
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order and return the conditioned grayscale image
    #[instrument(skip_all, fields(width = input.width(), height = input.height()))]
    pub fn run(&self, input: DynamicImage) -> Result<ConditionedImage> {
        let data = self.run_partial(input, self.steps.len())?;

        self.context.snapshot("final", &data.image);
        let image = match data.image {
            DynamicImage::ImageLuma8(gray) => gray,
            other => other.to_luma8(),
        };
        info!(
            width = image.width(),
            height = image.height(),
            crop = ?data.crop,
            "image conditioned"
        );

        Ok(ConditionedImage {
            image,
            crop: data.crop,
        })
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial(&self, input: DynamicImage, num_steps: usize) -> Result<PipelineData> {
        ensure_not_empty(&input)?;
        let mut data = PipelineData::from_image(input);

        for (i, step) in self.steps.iter().take(num_steps).enumerate() {
            debug!(index = i + 1, step = step.name(), "running step");
            data = step.process(data, &self.context)?;
            if let Some(name) = step.artifact() {
                self.context.snapshot(name, &data.image);
            }
        }

        Ok(data)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
