use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use gram::config::GramConfig;
use gram::{FileSource, Gallery, PhotoSource, RenderSession, ResizeFilter, SweepReport};
use serde::Serialize;

/// Apply every style filter to each input photo and report which ones rendered.
#[derive(Parser, Debug)]
#[command(name = "gram")]
#[command(about = "🎨 Render photos through a catalog of style-transfer filters")]
#[command(long_about = "Normalize each photo to a square buffer, run it through the filter catalog
(Normal, Mosaic, La Muse, Candy, Udnie, The Scream) and report the outcome per filter.
Optionally write the selected variant to an image file.")]
struct Args {
    /// Input photos
    #[arg(required = true, help = "Photos to render (any format the image crate decodes)")]
    inputs: Vec<PathBuf>,

    /// Side of the square buffer handed to filters
    #[arg(short, long, default_value_t = gram::config::DEFAULT_TARGET_SIZE,
          help = "Normalized square size in pixels (must match the models)")]
    size: u32,

    /// Directory with <model>.onnx files
    #[arg(short, long, help = "Directory holding mosaic.onnx, la_muse.onnx, candy.onnx, udnie.onnx, the_scream.onnx")]
    models_dir: Option<PathBuf>,

    /// Filter to select for output
    #[arg(long, default_value = "Normal", help = "Filter whose output is written with --output")]
    select: String,

    /// Where to write the selected variant
    #[arg(short, long, help = "Output image path; an index is appended when several inputs are given")]
    output: Option<PathBuf>,

    /// Per-filter time limit
    #[arg(long, help = "Give up on a filter after this many milliseconds")]
    timeout_ms: Option<u64>,

    /// Resampling kernel
    #[arg(long, default_value = "lanczos3", help = "Resize kernel: nearest, bilinear, catmull-rom, lanczos3")]
    resize: String,

    /// Stretch instead of centre-cropping
    #[arg(long, help = "Skip the centre-square crop and stretch the photo instead")]
    no_crop: bool,

    /// Print reports as JSON
    #[arg(long, help = "Print one JSON report per input instead of text")]
    json: bool,
}

#[derive(Serialize)]
struct PhotoReport<'a> {
    input: &'a str,
    selected: &'a str,
    written: Option<String>,
    report: &'a SweepReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let resize_filter = parse_resize(&args.resize)?;
    let config = GramConfig::new(
        args.size,
        resize_filter,
        !args.no_crop,
        args.models_dir.clone(),
        args.timeout_ms,
    );
    config.validate()?;

    let session = RenderSession::builder().with_config(config).build()?;
    if session.catalog().position(&args.select).is_none() {
        anyhow::bail!(
            "Unknown filter: {}. Use one of: {}",
            args.select,
            session.catalog().names().join(", ")
        );
    }
    let handle = session.spawn();

    let total = args.inputs.len();
    let mut source = FileSource::new(args.inputs.iter().cloned());
    let mut gallery = Gallery::new();
    let mut index = 0;

    while let Some(photo) = source.next_photo().await? {
        let generation = handle.submit_image(&photo.image)?;
        let output = handle.wait_for(generation).await?;

        gallery.reset(handle.catalog(), &output.cache);
        gallery.select_name(&args.select, handle.catalog(), &output.cache)?;
        if !output.cache.contains(&args.select) {
            log::warn!("'{}' did not render for {}, keeping 'Normal'", args.select, photo.label);
        }

        let written = match &args.output {
            Some(base) => {
                let path = output_path(base, index, total);
                let image = gallery
                    .displayed_image()
                    .context("no rendered output to write")?;
                image.save(&path)?;
                Some(path.display().to_string())
            }
            None => None,
        };

        if args.json {
            let line = PhotoReport {
                input: &photo.label,
                selected: &args.select,
                written,
                report: &output.report,
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            print_report(&photo.label, &output.report, written.as_deref());
        }
        index += 1;
    }

    handle.shutdown().await?;
    Ok(())
}

fn print_report(label: &str, report: &SweepReport, written: Option<&str>) {
    println!("{} ({}x{}):", label, report.input_width, report.input_height);
    for filter in &report.filters {
        println!("  {:<12} {:?} ({:.1}ms)", filter.name, filter.outcome, filter.elapsed_ms);
    }
    if let Some(path) = written {
        println!("  -> {}", path);
    }
}

/// Parse a resize kernel name
fn parse_resize(name: &str) -> Result<ResizeFilter> {
    ResizeFilter::parse(name).ok_or_else(|| {
        anyhow::anyhow!("Invalid resize filter: {}. Use: nearest, bilinear, catmull-rom, lanczos3", name)
    })
}

/// `out.png` for a single input, `out-0.png`, `out-1.png`, ... otherwise.
fn output_path(base: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return base.to_path_buf();
    }
    let stem = base.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{}-{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}-{}", stem, index),
    };
    base.with_file_name(name)
}
