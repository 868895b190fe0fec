//! Conversion entry points.
//!
//! A run is strictly sequential:
//!
//! ```text
//! Preflight → Rasterize → [Clean → Recognize → Persist]* → Archive
//! ```
//!
//! Page text is persisted as `page_N.txt` in a private temporary directory
//! that is removed when the run ends, whether it succeeded or not. The zip
//! is only written once every page has been handled, so an aborted run never
//! produces an archive.

use crate::config::{ConversionConfig, FailurePolicy};
use crate::error::PdfOcrError;
use crate::output::{page_entry_name, ConversionOutput, ConversionStats, PageResult};
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::render::Rasterizer;
use crate::pipeline::{archive, clean, input};
use crate::preflight::{self, Toolchain};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// OCR a PDF into a zip of per-page text files.
///
/// This is the primary entry point for the library. It runs the startup
/// checks ([`preflight::run`]) and then [`convert_with`].
///
/// # Arguments
/// * `input`  — path to the PDF
/// * `output` — archive path; `None` writes `<input stem>_ocr.zip` next to
///   the input
/// * `config` — conversion configuration
///
/// # Errors
/// Any failure is fatal under the default [`FailurePolicy::Abort`] and no
/// archive is written. With [`FailurePolicy::Skip`], page-level failures are
/// recorded in the returned report instead.
pub fn convert(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, PdfOcrError> {
    let toolchain = preflight::run(config)?;
    convert_with(&toolchain, input, output, config)
}

/// Like [`convert`], reusing a [`Toolchain`] from an earlier preflight.
pub fn convert_with(
    toolchain: &Toolchain,
    input: impl AsRef<Path>,
    output: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, PdfOcrError> {
    let started = Instant::now();
    let input = input.as_ref();
    info!("Starting OCR: {}", input.display());

    input::validate_pdf(input)?;
    let archive_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input::default_output_path(input));

    let rasterizer = Rasterizer::open(&toolchain.pdfium, input, config)?;
    let total = rasterizer.page_count();

    run_pipeline(
        rasterizer.pages(),
        total,
        toolchain.engine.as_ref(),
        archive_path,
        config,
        started,
    )
}

/// OCR already rendered page images, skipping PDF rasterisation.
///
/// Useful for scans that arrive as images. Only the OCR engine is probed;
/// PDFium is not needed.
pub fn convert_images(
    pages: Vec<DynamicImage>,
    output: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, PdfOcrError> {
    let started = Instant::now();
    let (engine, _version) = preflight::check_engine(config)?;
    let total = pages.len();
    run_pipeline(
        pages.into_iter().map(Ok),
        total,
        engine.as_ref(),
        output.to_path_buf(),
        config,
        started,
    )
}

fn run_pipeline<I>(
    pages: I,
    total: usize,
    engine: &dyn OcrEngine,
    archive_path: PathBuf,
    config: &ConversionConfig,
    started: Instant,
) -> Result<ConversionOutput, PdfOcrError>
where
    I: IntoIterator<Item = Result<DynamicImage, PdfOcrError>>,
{
    let workspace = tempfile::Builder::new()
        .prefix("pdf-ocr-")
        .tempdir()
        .map_err(PdfOcrError::Workspace)?;
    debug!("Working directory: {}", workspace.path().display());

    let run = process_pages(pages, total, engine, workspace.path(), config)?;
    archive::create_archive(&run.files, &archive_path)?;

    let mut stats = run.stats;
    stats.total_duration_ms = started.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, stats.processed_pages);
    }
    info!(
        "OCR complete: {}/{} pages in {}ms → {}",
        stats.processed_pages,
        total,
        stats.total_duration_ms,
        archive_path.display()
    );

    Ok(ConversionOutput {
        archive_path,
        pages: run.pages,
        stats,
    })
}

/// Output of [`process_pages`].
#[derive(Debug)]
pub struct PageRun {
    /// One result per page handled, in document order.
    pub pages: Vec<PageResult>,
    /// Text files written into the working directory, in document order.
    pub files: Vec<PathBuf>,
    pub stats: ConversionStats,
}

/// Clean, recognise and persist each rendered page in order.
///
/// `pages` yields one rendered image (or render error) per page; `total` is
/// the page count reported by the document. Text for page N is written to
/// `work_dir/page_N.txt`.
pub fn process_pages<I>(
    pages: I,
    total: usize,
    engine: &dyn OcrEngine,
    work_dir: &Path,
    config: &ConversionConfig,
) -> Result<PageRun, PdfOcrError>
where
    I: IntoIterator<Item = Result<DynamicImage, PdfOcrError>>,
{
    let mut pages = pages.into_iter();
    let mut results = Vec::with_capacity(total);
    let mut files = Vec::with_capacity(total);
    let mut stats = ConversionStats {
        total_pages: total,
        ..Default::default()
    };
    let mut first_error: Option<String> = None;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    for page_num in 1..=total {
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total);
        }
        let page_started = Instant::now();

        let render_started = Instant::now();
        let rendered = pages.next().unwrap_or_else(|| {
            Err(PdfOcrError::RasterisationFailed {
                page: page_num,
                detail: "renderer produced fewer pages than the document reports".into(),
            })
        });
        stats.render_duration_ms += render_started.elapsed().as_millis() as u64;

        let outcome = rendered.and_then(|image| {
            recognize_page(&image, page_num, engine, work_dir, config, &mut stats)
        });
        match outcome {
            Ok(page) => {
                let entry_name = page_entry_name(page_num);
                let path = work_dir.join(&entry_name);
                std::fs::write(&path, page.text.as_bytes()).map_err(PdfOcrError::Workspace)?;

                let chars = page.text.chars().count();
                debug!("Page {}: {} chars", page_num, chars);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_complete(page_num, total, chars);
                }

                files.push(path);
                stats.processed_pages += 1;
                results.push(PageResult {
                    page_num,
                    entry_name: Some(entry_name),
                    chars,
                    skew_angle: page.skew_angle,
                    deskewed: page.deskewed,
                    duration_ms: page_started.elapsed().as_millis() as u64,
                    error: None,
                });
            }
            Err(err) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, total, &err.to_string());
                }
                if config.failure_policy == FailurePolicy::Abort {
                    return Err(err);
                }
                // Errors not tied to this page (missing engine, I/O) stay fatal.
                let page_error = err.into_page_error()?;
                warn!("Skipping page {}: {}", page_num, page_error);
                first_error.get_or_insert_with(|| page_error.to_string());

                stats.failed_pages += 1;
                results.push(PageResult {
                    page_num,
                    entry_name: None,
                    chars: 0,
                    skew_angle: None,
                    deskewed: false,
                    duration_ms: page_started.elapsed().as_millis() as u64,
                    error: Some(page_error),
                });
            }
        }
    }

    if total > 0 && stats.processed_pages == 0 {
        return Err(PdfOcrError::AllPagesFailed {
            total,
            first_error: first_error.unwrap_or_default(),
        });
    }

    Ok(PageRun {
        pages: results,
        files,
        stats,
    })
}

struct RecognizedPage {
    text: String,
    skew_angle: Option<f32>,
    deskewed: bool,
}

fn recognize_page(
    image: &DynamicImage,
    page_num: usize,
    engine: &dyn OcrEngine,
    work_dir: &Path,
    config: &ConversionConfig,
    stats: &mut ConversionStats,
) -> Result<RecognizedPage, PdfOcrError> {
    let clean_started = Instant::now();
    let cleaned = clean::clean_page(image, &config.cleaner);
    stats.clean_duration_ms += clean_started.elapsed().as_millis() as u64;
    if let Some(angle) = cleaned.skew_angle {
        debug!(
            "Page {}: skew {:.2}°{}",
            page_num,
            angle,
            if cleaned.deskewed { " (corrected)" } else { "" }
        );
    }

    let ocr_started = Instant::now();
    let text = engine.recognize(&cleaned.image, page_num, work_dir)?;
    stats.ocr_duration_ms += ocr_started.elapsed().as_millis() as u64;

    Ok(RecognizedPage {
        text,
        skew_angle: cleaned.skew_angle,
        deskewed: cleaned.deskewed,
    })
}
