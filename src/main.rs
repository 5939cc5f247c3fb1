use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use receiptprep::{CropOutcome, DirectorySink, Pipeline, PipelineConfig, load_image};

#[derive(Parser)]
#[command(name = "receiptprep")]
#[command(about = "Straighten and clean up a receipt photo for text recognition")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Write the conditioned image here
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Skip receipt boundary detection and perspective correction
    #[arg(long)]
    no_auto_crop: bool,

    /// Skip the median denoise filter
    #[arg(long)]
    no_denoise: bool,

    /// Skip sharpening
    #[arg(long)]
    no_sharpen: bool,

    /// Binarize with an adaptive threshold (experimental)
    #[arg(long)]
    threshold: bool,
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_auto_crop(!self.no_auto_crop)
            .with_denoise(!self.no_denoise)
            .with_sharpen(!self.no_sharpen)
            .with_threshold(self.threshold)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let img = load_image(&args.image_path)?;
    tracing::info!(width = img.width(), height = img.height(), "image loaded");

    let mut pipeline = Pipeline::from_config(&args.config());
    if let Some(debug_dir) = &args.debug_out {
        let sink = DirectorySink::new(debug_dir)
            .with_context(|| format!("cannot use debug directory {}", debug_dir.display()))?;
        pipeline = pipeline.with_debug_sink(Arc::new(sink));
    }

    let result = pipeline.run(img)?;

    match &result.crop {
        CropOutcome::Disabled => println!("Auto-crop disabled"),
        CropOutcome::NotFound => println!("No receipt boundary found, used full image"),
        CropOutcome::Unrectifiable { .. } => {
            println!("Receipt boundary found but could not be rectified, used full image")
        }
        CropOutcome::Rectified { width, height, .. } => {
            println!("Receipt rectified to {}x{}", width, height)
        }
    }
    println!("Conditioned image: {}x{}", result.image.width(), result.image.height());

    if let Some(output) = &args.output {
        result
            .image
            .save(output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        println!("Saved to {}", output.display());
    }

    Ok(())
}
