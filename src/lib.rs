//! # pdf-ocr
//!
//! OCR scanned PDF documents into a zip archive of per-page text files.
//!
//! ## Why this crate?
//!
//! Scanned PDFs contain pictures of text, not text. Feeding the raw page
//! images to an OCR engine works poorly when the scan is tilted or unevenly
//! lit. This crate renders each page, straightens it, binarises it with a
//! locally adaptive threshold and only then hands it to Tesseract.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 0. Preflight  find tesseract, bind PDFium (once per process)
//!  ├─ 1. Input      check the file exists and starts with %PDF
//!  ├─ 2. Render     rasterise one page at a time via PDFium
//!  ├─ 3. Clean      grayscale → deskew → adaptive Gaussian threshold
//!  ├─ 4. OCR        tesseract <page.png> stdout
//!  └─ 5. Archive    page_1.txt … page_N.txt → <name>_ocr.zip
//! ```
//!
//! Pages are processed sequentially in document order. Intermediate files
//! live in a temporary directory that is removed when the run ends.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_ocr::{convert, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().language("eng").build()?;
//!     let output = convert("scan.pdf", None, &config)?;
//!     eprintln!(
//!         "{} pages → {}",
//!         output.stats.processed_pages,
//!         output.archive_path.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-ocr` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf-ocr = { version = "0.1", default-features = false }
//! ```
//!
//! ## Native dependencies
//!
//! Neither component is downloaded automatically; [`preflight::run`] reports
//! install instructions when one is missing.
//!
//! | Component | Used for | Located via |
//! |-----------|----------|-------------|
//! | `tesseract` | OCR | `PATH` or [`ConversionConfig::tesseract_cmd`] |
//! | PDFium | rendering | `PDFIUM_LIB_PATH`, cache dir, system loader ([`pdfium_locate`]) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod preflight;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, FailurePolicy, DEFAULT_DPI, DEFAULT_TESSERACT_CMD,
};
pub use convert::{convert, convert_images, convert_with, process_pages, PageRun};
pub use error::{Dependency, ErrorKind, PageError, PdfOcrError};
pub use output::{page_entry_name, ConversionOutput, ConversionStats, PageResult};
pub use pipeline::clean::{
    clean_page, CleanedPage, CleanerParams, DEFAULT_ADAPTIVE_BLOCK_SIZE, DEFAULT_ADAPTIVE_OFFSET,
    DEFAULT_BINARY_THRESHOLD, DEFAULT_MIN_SKEW_DEGREES,
};
pub use pipeline::ocr::{OcrEngine, TesseractEngine};
pub use preflight::Toolchain;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
