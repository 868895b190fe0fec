//! CLI binary for pdf-ocr.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_ocr::{
    convert_with, preflight, ConversionConfig, ConversionProgressCallback, FailurePolicy,
    ProgressCallback, DEFAULT_ADAPTIVE_BLOCK_SIZE, DEFAULT_ADAPTIVE_OFFSET,
    DEFAULT_BINARY_THRESHOLD, DEFAULT_DPI, DEFAULT_MIN_SKEW_DEGREES, DEFAULT_TESSERACT_CMD,
};
use std::io;
use std::path::PathBuf;
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner text shown while preflight probes Tesseract and PDFium.
const PREFLIGHT_MESSAGE: &str = "Checking dependencies…";

/// Terminal progress callback: a live progress bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the page currently being processed.
    page_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` reports the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message(PREFLIGHT_MESSAGE);
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Recognising");
        self.bar.reset_eta();
    }

    fn page_elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Running OCR on {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut t) = self.page_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        let elapsed = self.page_elapsed_secs();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed = self.page_elapsed_secs();

        // Keep the log line on one terminal row.
        let first_line = error.lines().next().unwrap_or_default();
        let msg = if first_line.chars().count() > 80 {
            let cut: String = first_line.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            first_line.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages recognised",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages recognised  ({} skipped)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        // An aborted run never reaches on_conversion_complete.
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR a scan; writes scan_ocr.zip next to it
  pdf-ocr scan.pdf

  # Choose the archive path
  pdf-ocr scan.pdf -o texts.zip

  # German and English, higher resolution
  pdf-ocr --lang deu+eng --dpi 300 letter.pdf

  # Keep going when a page fails, print a JSON report
  pdf-ocr --skip-failed-pages --json book.pdf > report.json

OUTPUT:
  A zip archive with one UTF-8 text file per page, named page_1.txt,
  page_2.txt, … in document order. Pages without text produce empty files.

ENVIRONMENT VARIABLES:
  PDF_OCR_*            Every flag can also be set as PDF_OCR_<FLAG>
                       (e.g. PDF_OCR_DPI=300, PDF_OCR_TESSERACT_CMD=/opt/bin/tesseract)
  PDFIUM_LIB_PATH      Path to the PDFium shared library
  PDFIUM_CACHE_DIR     Directory searched for the PDFium library
  RUST_LOG             Log filter, e.g. RUST_LOG=pdf_ocr=debug

SETUP:
  pdf-ocr needs two native components, checked at startup:
    tesseract   the OCR engine, on PATH or given with --tesseract-cmd
    PDFium      the PDF renderer, from https://github.com/bblanchon/pdfium-binaries
  Missing components are reported with install instructions for your platform.
"#;

/// OCR scanned PDF documents into a zip of per-page text files.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-ocr",
    version,
    about = "OCR scanned PDF documents into a zip of per-page text files",
    long_about = "Render each page of a PDF, straighten and binarise it, run Tesseract OCR \
on it and collect the recognised text as page_N.txt files in a zip archive.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to recognise.
    input: PathBuf,

    /// Archive path. Default: <INPUT stem>_ocr.zip next to the input.
    #[arg(short, long, env = "PDF_OCR_OUTPUT")]
    output: Option<PathBuf>,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDF_OCR_DPI", default_value_t = DEFAULT_DPI,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_OCR_PASSWORD")]
    password: Option<String>,

    /// Tesseract language(s), e.g. eng or deu+eng.
    #[arg(short, long, env = "PDF_OCR_LANG")]
    lang: Option<String>,

    /// Tesseract page segmentation mode (0–13).
    #[arg(long, env = "PDF_OCR_PSM",
          value_parser = clap::value_parser!(u8).range(0..=13))]
    psm: Option<u8>,

    /// Tesseract executable.
    #[arg(long, env = "PDF_OCR_TESSERACT_CMD", default_value = DEFAULT_TESSERACT_CMD)]
    tesseract_cmd: PathBuf,

    /// Global threshold used to find the text block for deskewing.
    #[arg(long, env = "PDF_OCR_THRESHOLD", default_value_t = DEFAULT_BINARY_THRESHOLD)]
    threshold: u8,

    /// Neighbourhood size of the adaptive threshold (odd, ≥ 3).
    #[arg(long, env = "PDF_OCR_BLOCK_SIZE", default_value_t = DEFAULT_ADAPTIVE_BLOCK_SIZE)]
    block_size: u32,

    /// Constant subtracted from the local mean by the adaptive threshold.
    #[arg(long, env = "PDF_OCR_OFFSET", default_value_t = DEFAULT_ADAPTIVE_OFFSET,
          allow_negative_numbers = true)]
    offset: i32,

    /// Skew angles at or below this many degrees are not corrected.
    #[arg(long, env = "PDF_OCR_MIN_SKEW", default_value_t = DEFAULT_MIN_SKEW_DEGREES)]
    min_skew: f32,

    /// Leave failed pages out of the archive instead of aborting.
    #[arg(long, env = "PDF_OCR_SKIP_FAILED_PAGES")]
    skip_failed_pages: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "PDF_OCR_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_OCR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_OCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_OCR_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Preflight ────────────────────────────────────────────────────────
    // Nothing is read or written until both native components are present.
    let toolchain = preflight::run(&config).context("Startup check failed")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert_with(&toolchain, &cli.input, cli.output.as_deref(), &config)
        .with_context(|| format!("OCR of '{}' failed", cli.input.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise report")?;
        println!("{json}");
    }

    if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if stats.failed_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.processed_pages,
            stats.total_pages,
            stats.total_duration_ms,
            bold(&output.archive_path.display().to_string()),
        );
        if cli.verbose {
            eprintln!(
                "   {}",
                dim(&format!(
                    "render {}ms  /  clean {}ms  /  ocr {}ms",
                    stats.render_duration_ms, stats.clean_duration_ms, stats.ocr_duration_ms
                ))
            );
        }
        for page in output.pages.iter().filter(|p| !p.is_ok()) {
            if let Some(ref err) = page.error {
                eprintln!("   {} {}", red("✗"), err);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .tesseract_cmd(&cli.tesseract_cmd)
        .binary_threshold(cli.threshold)
        .adaptive_block_size(cli.block_size)
        .adaptive_offset(cli.offset)
        .min_skew_degrees(cli.min_skew)
        .failure_policy(if cli.skip_failed_pages {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Abort
        });

    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(ref lang) = cli.lang {
        builder = builder.language(lang.clone());
    }
    if let Some(psm) = cli.psm {
        builder = builder.page_segmentation_mode(psm);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
