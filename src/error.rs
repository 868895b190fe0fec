//! Error types for the pdf-ocr library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PdfOcrError`] — **Fatal**: the run cannot continue (missing OCR engine,
//!   unreadable PDF, output not writable). Returned as `Err(PdfOcrError)` from
//!   [`crate::convert()`]. Nothing is written to the output path.
//!
//! * [`PageError`] — a single page failed while running with
//!   [`crate::config::FailurePolicy::Skip`]. Stored inside
//!   [`crate::output::PageResult`] so the report shows which pages are
//!   missing from the archive.
//!
//! [`ErrorKind`] groups the fatal variants into the four failure classes the
//! pipeline distinguishes (dependency, conversion, recognition, archive).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// External components that must be installed on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dependency {
    /// The OCR engine binary (`tesseract`).
    OcrEngine,
    /// The PDFium shared library used for rasterisation.
    PdfRenderer,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::OcrEngine => f.write_str("OCR engine (Tesseract)"),
            Dependency::PdfRenderer => f.write_str("PDF renderer (PDFium)"),
        }
    }
}

/// Coarse classification of a [`PdfOcrError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required external component is absent.
    MissingDependency,
    /// The PDF could not be read or rasterised.
    Conversion,
    /// The OCR engine failed on a page.
    Recognition,
    /// The output archive could not be written.
    ArchiveWrite,
    /// Configuration or scratch-space problems.
    Internal,
}

/// All fatal errors returned by the pdf-ocr library.
#[derive(Debug, Error)]
pub enum PdfOcrError {
    // ── Environment ───────────────────────────────────────────────────────
    /// An external component is not installed or cannot be loaded.
    #[error("{dependency} is not available: {detail}\n\n{hint}")]
    MissingDependency {
        dependency: Dependency,
        detail: String,
        hint: String,
    },

    // ── Input / conversion errors ─────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDFium could not parse the document.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// PDFium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine failed on a page.
    #[error("OCR failed on page {page}: {detail}")]
    RecognitionFailed { page: usize, detail: String },

    /// Every page failed while skipping failed pages; there is nothing to archive.
    #[error("All {total} pages failed.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output archive.
    #[error("Failed to write archive '{path}': {source}")]
    ArchiveWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create the temporary working area or a file inside it.
    #[error("Working directory error: {0}")]
    Workspace(#[source] std::io::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PdfOcrError {
    /// The failure class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfOcrError::MissingDependency { .. } => ErrorKind::MissingDependency,
            PdfOcrError::FileNotFound { .. }
            | PdfOcrError::PermissionDenied { .. }
            | PdfOcrError::NotAPdf { .. }
            | PdfOcrError::CorruptPdf { .. }
            | PdfOcrError::PasswordRequired { .. }
            | PdfOcrError::WrongPassword { .. }
            | PdfOcrError::RasterisationFailed { .. } => ErrorKind::Conversion,
            PdfOcrError::RecognitionFailed { .. } => ErrorKind::Recognition,
            PdfOcrError::ArchiveWriteFailed { .. } => ErrorKind::ArchiveWrite,
            PdfOcrError::AllPagesFailed { .. }
            | PdfOcrError::Workspace(_)
            | PdfOcrError::InvalidConfig(_) => ErrorKind::Internal,
        }
    }

    /// Convert a per-page fatal error into a [`PageError`] for skip mode.
    ///
    /// Returns the error unchanged when it is not tied to a single page.
    pub fn into_page_error(self) -> Result<PageError, PdfOcrError> {
        match self {
            PdfOcrError::RasterisationFailed { page, detail } => {
                Ok(PageError::RenderFailed { page, detail })
            }
            PdfOcrError::RecognitionFailed { page, detail } => {
                Ok(PageError::OcrFailed { page, detail })
            }
            other => Err(other),
        }
    }
}

/// A non-fatal error for a single page, recorded in skip mode.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The OCR engine failed.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_display_includes_hint() {
        let e = PdfOcrError::MissingDependency {
            dependency: Dependency::OcrEngine,
            detail: "`tesseract` not found".into(),
            hint: "Install with: apt-get install tesseract-ocr".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Tesseract"), "got: {msg}");
        assert!(msg.contains("apt-get install tesseract-ocr"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::MissingDependency);
    }

    #[test]
    fn conversion_variants_share_a_kind() {
        let path = PathBuf::from("scan.pdf");
        assert_eq!(
            PdfOcrError::FileNotFound { path: path.clone() }.kind(),
            ErrorKind::Conversion
        );
        assert_eq!(
            PdfOcrError::NotAPdf {
                path: path.clone(),
                magic: *b"PK\x03\x04"
            }
            .kind(),
            ErrorKind::Conversion
        );
        assert_eq!(
            PdfOcrError::RasterisationFailed {
                page: 2,
                detail: "bad stream".into()
            }
            .kind(),
            ErrorKind::Conversion
        );
    }

    #[test]
    fn archive_error_keeps_source() {
        use std::error::Error as _;
        let e = PdfOcrError::ArchiveWriteFailed {
            path: PathBuf::from("/readonly/out.zip"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(e.kind(), ErrorKind::ArchiveWrite);
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/readonly/out.zip"));
    }

    #[test]
    fn page_errors_convert_for_skip_mode() {
        let e = PdfOcrError::RecognitionFailed {
            page: 3,
            detail: "exit status 1".into(),
        };
        let page = e.into_page_error().expect("page-scoped");
        assert!(page.to_string().contains("Page 3"));

        let fatal = PdfOcrError::InvalidConfig("block size".into());
        assert!(fatal.into_page_error().is_err());
    }
}
