use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bundle_width::export::sibling_with_suffix;
use bundle_width::{
    AnalysisConfig, FrameProgress, FrameStack, MovieAnalysis, ProgressCallback, SummaryFigure,
    ThresholdMethod, analyze, example_preview, export_tables,
};
use clap::{Parser, ValueEnum};

/// Estimates bundle widths over time from a microscopy movie.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Args {
    /// Movie file (.tif/.tiff stack, .png, .jpg).
    movie: PathBuf,
    /// YAML or JSON analysis config. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seconds between consecutive frames.
    #[arg(long)]
    time_per_frame: Option<f64>,
    /// Analyze frames before this index only; -1 keeps the whole movie.
    #[arg(long, allow_negative_numbers = true)]
    cutoff: Option<i64>,
    /// Analyze every n-th frame.
    #[arg(long)]
    stride: Option<usize>,
    /// Physical size of one pixel.
    #[arg(long)]
    pixel_size: Option<f64>,
    /// Neighbourhood of the adaptive threshold (odd, >= 3).
    #[arg(long)]
    block_size: Option<usize>,
    /// Median filter window applied to the mask.
    #[arg(long)]
    denoise_level: Option<usize>,
    #[arg(long, value_enum)]
    threshold_method: Option<MethodArg>,
    /// Frames processed at once.
    #[arg(long)]
    threads: Option<usize>,
    /// Write the time series and histogram tables next to the movie.
    #[arg(long, default_value_t = false)]
    save_files: bool,
    /// Write a preview PNG and the summary figure data next to the movie.
    #[arg(long, default_value_t = false)]
    show_images: bool,
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum MethodArg {
    Gaussian,
    Mean,
}

impl From<MethodArg> for ThresholdMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Gaussian => ThresholdMethod::Gaussian,
            MethodArg::Mean => ThresholdMethod::Mean,
        }
    }
}

impl Args {
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };

        if let Some(v) = self.time_per_frame {
            config.time_per_frame = v;
        }
        if let Some(cutoff) = self.cutoff {
            config.cutoff = cutoff_from_arg(cutoff)?;
        }
        if let Some(v) = self.stride {
            config.stride = v;
        }
        if let Some(v) = self.pixel_size {
            config.pixel_size = v;
        }
        if let Some(v) = self.block_size {
            config.distance_map.threshold_block_size = v;
        }
        if let Some(v) = self.denoise_level {
            config.distance_map.denoise_level = v;
        }
        if let Some(v) = self.threshold_method {
            config.distance_map.threshold_method = v.into();
        }
        if let Some(v) = self.threads {
            config.max_concurrent_frames = v;
        }

        config.validate()?;
        Ok(config)
    }
}

/// `-1` keeps the whole movie, any other non-negative value truncates it.
fn cutoff_from_arg(cutoff: i64) -> Result<Option<usize>> {
    match cutoff {
        -1 => Ok(None),
        c if c >= 0 => Ok(Some(usize::try_from(c)?)),
        c => anyhow::bail!("--cutoff must be >= 0 or -1, got {c}"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    common::log_setup::setup_logging(&args.log_level, "bundle_width")?;

    let config = args.analysis_config()?;
    let stack = FrameStack::from_file(&args.movie)
        .with_context(|| format!("Failed to load movie {}", args.movie.display()))?;

    let progress = ProgressCallback::new(|p: FrameProgress| {
        tracing::info!("Frame {} done ({}/{})", p.frame_index, p.completed, p.total);
    });
    let analysis = analyze(&stack, &config, &progress)?;

    print_summary(&analysis);

    let exported = if args.save_files {
        export_tables(&args.movie, &analysis).map(|_| ())
    } else {
        Ok(())
    };
    if args.show_images {
        write_report(&args.movie, &stack, &analysis, &config);
    }

    exported.context("Failed to export tables")
}

fn print_summary(analysis: &MovieAnalysis) {
    println!("{:>10} {:>12} {:>12} {:>12}", "time", "mean", "std", "sem");
    println!("{}", "-".repeat(49));
    for row in analysis.time_series.rows() {
        println!(
            "{:>10.3} {:>12.4} {:>12.4} {:>12.4}",
            row.time, row.bundle_mean, row.bundle_std, row.bundle_sem
        );
    }
}

/// Best effort: failures are logged and never fail the run.
fn write_report(
    movie: &Path,
    stack: &FrameStack,
    analysis: &MovieAnalysis,
    config: &AnalysisConfig,
) {
    let preview_path = sibling_with_suffix(movie, "_preview.png");
    let preview = example_preview(stack, analysis, &config.distance_map)
        .map_err(anyhow::Error::from)
        .and_then(|png| std::fs::write(&preview_path, png).map_err(anyhow::Error::from));
    match preview {
        Ok(()) => tracing::info!("Preview written to {}", preview_path.display()),
        Err(e) => tracing::warn!("Preview failed: {e}"),
    }

    let figure_path = sibling_with_suffix(movie, "_Bundle_width_results.json");
    let figure = SummaryFigure::from_analysis(analysis)
        .to_json()
        .and_then(|json| std::fs::write(&figure_path, json).map_err(anyhow::Error::from));
    match figure {
        Ok(()) => tracing::info!("Summary figure written to {}", figure_path.display()),
        Err(e) => tracing::warn!("Summary figure failed: {e}"),
    }
}
