/// Per-invocation switches for the pipeline.
///
/// Grayscale conversion is not configurable: it always runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Detect the receipt boundary and correct its perspective.
    pub auto_crop: bool,
    /// 3x3 median filter.
    pub denoise: bool,
    /// 3x3 high-pass sharpening.
    pub sharpen: bool,
    /// Gaussian adaptive binarization. Off by default, it tends to hurt recognition.
    pub threshold: bool,
}

impl PipelineConfig {
    /// Every optional stage disabled; only grayscale conversion remains.
    pub fn grayscale_only() -> Self {
        Self {
            auto_crop: false,
            denoise: false,
            sharpen: false,
            threshold: false,
        }
    }

    pub fn with_auto_crop(mut self, enabled: bool) -> Self {
        self.auto_crop = enabled;
        self
    }

    pub fn with_denoise(mut self, enabled: bool) -> Self {
        self.denoise = enabled;
        self
    }

    pub fn with_sharpen(mut self, enabled: bool) -> Self {
        self.sharpen = enabled;
        self
    }

    pub fn with_threshold(mut self, enabled: bool) -> Self {
        self.threshold = enabled;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            auto_crop: true,
            denoise: true,
            sharpen: true,
            threshold: false,
        }
    }
}
