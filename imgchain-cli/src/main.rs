use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use walkdir::WalkDir;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use imgchain::image::OutputFormat;
use imgchain::{Pipeline, ProcessItem, ProcessOptions, Processor};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

#[derive(Parser)]
#[command(name = "imgchain-cli")]
#[command(about = "Run a processor pipeline over image files", long_about = None)]
#[command(version)]
struct Args {
    /// Input images or directories of images
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Processor pipeline, e.g. "decode|>round-corner:radius=8,size=64x64"
    #[arg(short, long, value_name = "PIPELINE", default_value = "decode")]
    pipeline: Pipeline,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Scale factor (overrides the saved options)
    #[arg(short, long, value_name = "FACTOR")]
    scale: Option<f32>,

    /// Decode every frame of animated inputs up front
    #[arg(long, default_value_t)]
    preload_frames: bool,

    /// Output image format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Png)]
    format: FormatArg,

    /// JPEG/WebP quality (0-100)
    #[arg(long, value_name = "QUALITY", default_value_t = 85)]
    quality: u8,

    /// Persist the effective options for later runs
    #[arg(long, default_value_t)]
    save_options: bool,

    /// Verbose output
    #[arg(short, long, default_value_t)]
    verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, default_value_t)]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
    Webp,
}

impl FormatArg {
    fn with_quality(self, quality: u8) -> OutputFormat {
        match self {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Jpeg => OutputFormat::Jpeg { quality },
            FormatArg::Webp => OutputFormat::WebP { quality },
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(args.verbose, args.quiet);

    if args.quality > 100 {
        anyhow::bail!("Quality must be between 0 and 100");
    }

    let options = build_options(&args)?;
    if args.save_options && options.save().is_none() {
        log::warn!("Could not save options");
    }

    // Create output directory if it doesn't exist
    if !args.output_dir.exists() {
        std::fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;
    }

    let files = collect_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No images found in the given inputs");
    }

    let format = args.format.with_quality(args.quality);
    let jobs = plan_jobs(&files, &args.output_dir, format)?;

    let processor = args.pipeline.build();
    log::info!(
        "Processing {} images with `{}` at {}x",
        jobs.len(),
        processor.identifier(),
        options.scale_factor
    );

    let failed = AtomicUsize::new(0);
    jobs.par_iter().for_each(|job| {
        if let Err(e) = process_file(job, processor.as_ref(), &options, format) {
            log::warn!("{}: {e:#}", job.input.display());
            failed.fetch_add(1, Ordering::Relaxed);
        }
    });

    let failed = failed.into_inner();
    if failed > 0 {
        anyhow::bail!("{failed} of {} images failed", jobs.len());
    }

    log::info!("Done: {}", args.output_dir.display());
    Ok(())
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn build_options(args: &Args) -> Result<ProcessOptions> {
    let mut options = ProcessOptions::load().unwrap_or_default();

    if let Some(scale) = args.scale {
        options.scale_factor = scale;
    }
    if args.preload_frames {
        options.preload_all_frames = true;
    }

    options.validate()?;
    Ok(options)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// An input image, with its path relative to the directory it was found in
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct InputFile {
    path: PathBuf,
    relative: PathBuf,
}

/// An input image and the file its result is written to
#[derive(Debug, Clone, PartialEq, Eq)]
struct Job {
    input: PathBuf,
    output: PathBuf,
}

/// Expand directories into the image files they contain, sorted by path
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<InputFile>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input) {
                let entry = entry.with_context(|| format!("Failed to walk {}", input.display()))?;
                if entry.file_type().is_file() && is_image(entry.path()) {
                    let relative = entry
                        .path()
                        .strip_prefix(input)
                        .map(Path::to_path_buf)
                        .with_context(|| {
                            format!("{} is outside {}", entry.path().display(), input.display())
                        })?;
                    files.push(InputFile {
                        path: entry.into_path(),
                        relative,
                    });
                }
            }
        } else if input.exists() {
            let relative = input
                .file_name()
                .map(PathBuf::from)
                .with_context(|| format!("Not a file: {}", input.display()))?;
            files.push(InputFile {
                path: input.clone(),
                relative,
            });
        } else {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }
    }

    files.sort();
    files.dedup_by(|a, b| a.path == b.path);
    Ok(files)
}

/// Mirror `relative` under `output_dir`, swapping the extension for the output format's
fn output_path(relative: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    // don't use .with_extension() bc it replaces everything after the first dot
    let mut file_name = relative
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    file_name.push('.');
    file_name.push_str(format.extension());

    let dir = relative.parent().unwrap_or(Path::new(""));
    output_dir.join(dir).join(file_name)
}

/// Pair every input with its output, refusing plans where two inputs share an
/// output or an output would replace an input
fn plan_jobs(files: &[InputFile], output_dir: &Path, format: OutputFormat) -> Result<Vec<Job>> {
    let inputs: HashSet<PathBuf> = files
        .iter()
        .filter_map(|file| std::fs::canonicalize(&file.path).ok())
        .collect();
    let mut outputs: HashMap<PathBuf, &Path> = HashMap::new();
    let mut jobs = Vec::with_capacity(files.len());

    for file in files {
        let output = output_path(&file.relative, output_dir, format);

        if let Some(other) = outputs.insert(output.clone(), &file.path) {
            anyhow::bail!(
                "{} and {} would both be written to {}",
                other.display(),
                file.path.display(),
                output.display()
            );
        }
        if let Ok(existing) = std::fs::canonicalize(&output) {
            if inputs.contains(&existing) {
                anyhow::bail!(
                    "Refusing to overwrite input {}; pick another output directory or format",
                    output.display()
                );
            }
        }

        jobs.push(Job {
            input: file.path.clone(),
            output,
        });
    }

    Ok(jobs)
}

fn process_file(
    job: &Job,
    processor: &dyn Processor,
    options: &ProcessOptions,
    format: OutputFormat,
) -> Result<()> {
    let data = std::fs::read(&job.input).context("Failed to read input")?;

    let bitmap = processor
        .process(ProcessItem::Data(data), options)
        .context("Processor produced no image")?;

    let bytes = imgchain::image::encode(&bitmap, format)?;
    if let Some(parent) = job.output.parent() {
        std::fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    std::fs::write(&job.output, bytes).context("Failed to write output file")?;

    log::debug!("Wrote {}", job.output.display());
    Ok(())
}
