use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use laserheight_rs::height_pipeline::{
    ColorMetric, DirectoryFrameSource, FfmpegFrameSource, FrameDecoder, FrameOutcome,
    FrameSource, HeightMap, HeightProcessor, ImageFrameDecoder, ProcessorOptions, RawFrameDecoder,
    VideoHeightPipeline, options::DEBUG_IMAGE_KEY,
};
use laserheight_rs::logger;
use serde::Serialize;

use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "laserheight", about = "Per-row surface height from laser line frames")]
struct Cli {
    /// JSON file with processor options
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the color metric
    #[arg(long, global = true, value_parser = parse_metric)]
    metric: Option<ColorMetric>,

    /// Write the deviation debug image of each frame to this path
    #[arg(long, global = true)]
    debug_image: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a single still image
    Frame {
        image: PathBuf,
        /// Decode the image as a camera RAW file
        #[arg(long)]
        raw: bool,
    },
    /// Process every image file of a directory in name order
    Frames {
        dir: PathBuf,
        #[arg(long)]
        raw: bool,
    },
    /// Process every frame of a video (requires ffmpeg and ffprobe in PATH)
    Video { video: PathBuf },
}

#[derive(Serialize)]
struct FrameLine<'a> {
    frame: usize,
    heights: &'a HeightMap,
    ambiguous_rows: usize,
}

fn parse_metric(s: &str) -> Result<ColorMetric, String> {
    match s {
        "euclidean" => Ok(ColorMetric::Euclidean),
        "redmean" => Ok(ColorMetric::Redmean),
        other => Err(format!("unknown metric \"{}\" (euclidean, redmean)", other)),
    }
}

fn load_options(cli: &Cli) -> anyhow::Result<ProcessorOptions> {
    let mut options = match &cli.config {
        Some(path) => ProcessorOptions::from_json_file(path)
            .with_context(|| format!("loading options from {}", path.display()))?,
        None => ProcessorOptions::default(),
    };

    if let Some(metric) = cli.metric {
        options.metric = metric;
    }
    if let Some(path) = &cli.debug_image {
        options.debug.enabled = true;
        options
            .debug
            .filenames
            .insert(DEBUG_IMAGE_KEY.to_string(), path.clone());
    }

    options.validate().context("invalid processor options")?;
    Ok(options)
}

fn print_frame(outcome: &FrameOutcome) -> anyhow::Result<bool> {
    let frame = outcome.index;
    match &outcome.result {
        Ok(report) => {
            if let Some(e) = &report.debug_error {
                warn!(frame, "{}", e);
            }
            let line = FrameLine {
                frame,
                heights: &report.heights,
                ambiguous_rows: report.ambiguous_rows,
            };
            println!("{}", serde_json::to_string(&line)?);
            Ok(true)
        }
        Err(e) => {
            error!(frame, "Frame failed: {}", e);
            Ok(false)
        }
    }
}

fn run_stream<S: FrameSource, D: FrameDecoder>(
    source: S,
    decoder: D,
    options: ProcessorOptions,
) -> anyhow::Result<()> {
    let mut pipeline = VideoHeightPipeline::new(source, decoder, options)?;

    let mut failed = 0;
    while let Some(outcome) = pipeline.next_frame()? {
        if !print_frame(&outcome)? {
            failed += 1;
        }
    }

    pipeline.timings().log_summary();
    info!(frames = pipeline.frames_read(), failed, "Done");
    Ok(())
}

fn run_frame(image: &Path, raw: bool, options: ProcessorOptions) -> anyhow::Result<()> {
    let bytes = std::fs::read(image).with_context(|| format!("reading {}", image.display()))?;
    let decoded = if raw {
        RawFrameDecoder.decode(&bytes)
    } else {
        ImageFrameDecoder.decode(&bytes)
    };
    let grid = decoded.with_context(|| format!("decoding {}", image.display()))?;

    let processor = HeightProcessor::new(options)?;
    let outcome = FrameOutcome {
        index: 0,
        result: processor.process(&grid),
    };
    if !print_frame(&outcome)? {
        bail!("failed to process {}", image.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let options = load_options(&cli)?;
    info!(
        metric = ?options.metric,
        min_trough_width = options.min_trough_width,
        min_trough_height = options.min_trough_height,
        pixel_per_mm = options.calibration.pixel_per_mm,
        "Options loaded"
    );

    match &cli.command {
        Command::Frame { image, raw } => run_frame(image, *raw, options),
        Command::Frames { dir, raw } => {
            let source = DirectoryFrameSource::open(dir)?;
            info!("Processing {} files from {}", source.len(), dir.display());
            if *raw {
                run_stream(source, RawFrameDecoder, options)
            } else {
                run_stream(source, ImageFrameDecoder, options)
            }
        }
        Command::Video { video } => {
            let source = FfmpegFrameSource::open(video)?;
            let decoder = source.decoder();
            run_stream(source, decoder, options)
        }
    }
}
