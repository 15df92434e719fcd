//! CLI binary for resume-pdf2img.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RasterizeConfig` and writes or prints the resulting PNGs.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use resume_pdf2img::{
    default_rasterizer, inspect, output_path_for, rasterize_many, BatchProgressCallback,
    FileResult, PdfUpload, ProgressCallback, RasterizeConfig,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// file. Files finish out of order when `--concurrency` is above 1.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-file wall-clock start times, keyed by batch index.
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER_TICKS);

        bar.set_style(style);
        bar.set_prefix("Rendering");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.reset_eta();
    }

    fn on_file_start(&self, index: usize, _total: usize, name: &str) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(index, Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, name: &str, png_len: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            index + 1,
            total,
            name,
            dim(&format!("{:>9} bytes", png_len)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index + 1,
            total,
            name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files rasterised",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files rasterised  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&self.errors.load(Ordering::SeqCst).to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # PNG next to the input: resume.png
  pdf2img resume.pdf

  # Several uploads into one directory, two at a time
  pdf2img -c 2 --output-dir thumbs/ a.pdf b.pdf c.pdf

  # Base64 data URL on stdout instead of a file
  pdf2img --data-url resume.pdf

  # One JSON result per input
  pdf2img --json *.pdf > results.jsonl

  # Page count and page-1 geometry only
  pdf2img --inspect-only resume.pdf

OUTPUT:
  Page 1 is rendered at 4x its size in PDF points. A US Letter page
  (612x792 pt) becomes a 2448x3168 PNG.

PDFIUM:
  The pdfium shared library is loaded from ./lib first, then from the
  system library path.

ENVIRONMENT VARIABLES:
  PDF2IMG_OUTPUT_DIR      Default for --output-dir
  PDF2IMG_CONCURRENCY     Default for --concurrency
  RUST_LOG                Overrides the log filter (e.g. resume_pdf2img=debug)
"#;

/// Rasterise the first page of PDF files to PNG.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Rasterise the first page of PDF files to high-resolution PNG",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// One or more PDF files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write PNGs into this directory instead of next to each input.
    #[arg(short, long, env = "PDF2IMG_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Print one JSON result per input.
    #[arg(long, env = "PDF2IMG_JSON")]
    json: bool,

    /// Print each PNG as a base64 data URL instead of writing a file.
    #[arg(long, env = "PDF2IMG_DATA_URL")]
    data_url: bool,

    /// Print page count and page-1 geometry only, no rendering.
    #[arg(long, env = "PDF2IMG_INSPECT_ONLY")]
    inspect_only: bool,

    /// Number of files rasterised at once.
    #[arg(short, long, env = "PDF2IMG_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Disable progress bar.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.inspect_only {
        return run_inspect(&cli).await;
    }

    // ── Open inputs ──────────────────────────────────────────────────────
    let mut uploads = Vec::with_capacity(cli.inputs.len());
    let mut open_failures = 0usize;
    for path in &cli.inputs {
        match PdfUpload::open(path).await {
            Ok(upload) => uploads.push(upload),
            Err(e) => {
                open_failures += 1;
                eprintln!("{} {}: {}", red("✗"), path.display(), e);
            }
        }
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Rasterise ────────────────────────────────────────────────────────
    let rasterizer = default_rasterizer();
    let batch = rasterize_many(rasterizer, &uploads, &config).await;

    let mut failed = open_failures + batch.stats.failed;
    for (upload, file_result) in uploads.iter().zip(&batch.files) {
        if let Err(e) = emit(&cli, &config, upload, file_result).await {
            failed += 1;
            eprintln!("{} {}: {:#}", red("✗"), upload.name(), e);
        }
        rasterizer.revoke_url(file_result.result.image_url());
    }

    if !cli.quiet && !show_progress && !cli.json {
        eprintln!(
            "Rasterised {}/{} files in {}ms",
            batch.stats.succeeded,
            cli.inputs.len(),
            batch.stats.total_duration_ms
        );
    }

    if failed > 0 {
        anyhow::bail!("{} of {} inputs failed", failed, cli.inputs.len());
    }
    Ok(())
}

/// Write, print or report one batch entry.
async fn emit(
    cli: &Cli,
    config: &RasterizeConfig,
    upload: &PdfUpload,
    file_result: &FileResult,
) -> Result<()> {
    let result = &file_result.result;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string(result).context("Failed to serialise result")?
        );
    }

    let Some(file) = result.file() else {
        if !cli.json && !cli.quiet && config.progress_callback.is_none() {
            eprintln!(
                "{} {}: {}",
                red("✗"),
                upload.name(),
                result.error().unwrap_or_default()
            );
        }
        return Ok(());
    };

    if cli.data_url {
        if !cli.json {
            println!("{}", file.to_data_url());
        }
        return Ok(());
    }

    let target = output_path_for(upload, config.output_dir.as_deref());
    resume_pdf2img::convert::write_png(&target, file)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;

    if !cli.quiet && !cli.json {
        eprintln!(
            "{}  {}  →  {}",
            green("✔"),
            upload.name(),
            bold(&target.display().to_string())
        );
    }
    Ok(())
}

/// `--inspect-only`: print document geometry for every input.
async fn run_inspect(cli: &Cli) -> Result<()> {
    let mut failed = 0usize;

    for path in &cli.inputs {
        let info = match inspect(default_rasterizer(), path).await {
            Ok(info) => info,
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {}", red("✗"), path.display(), e);
                continue;
            }
        };

        if cli.json {
            println!(
                "{}",
                serde_json::to_string(&info).context("Failed to serialise document info")?
            );
            continue;
        }

        println!("File:         {}", path.display());
        println!("Pages:        {}", info.page_count);
        match (info.first_page, info.first_page_viewport) {
            (Some(size), Some(viewport)) => {
                println!("Page 1:       {} x {} pt", size.width, size.height);
                println!(
                    "PNG size:     {} x {} px (scale {})",
                    viewport.width, viewport.height, viewport.scale
                );
            }
            _ => println!("Page 1:       {}", dim("none")),
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} inputs failed", failed, cli.inputs.len());
    }
    Ok(())
}

/// Map CLI args to `RasterizeConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RasterizeConfig> {
    let mut builder = RasterizeConfig::builder().concurrency(cli.concurrency);

    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
