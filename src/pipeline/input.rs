//! Input resolution: validate the user-supplied PDF path and derive the
//! default archive path.
//!
//! PDFium reports a missing file, a permission problem and a non-PDF file as
//! the same opaque load failure. Checking existence, readability and the
//! `%PDF` magic bytes up front gives the user an error that says which one it
//! was.

use crate::error::PdfOcrError;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix appended to the input stem to form the default archive name.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_ocr.zip";

/// Validate that `path` names a readable file that starts with `%PDF`.
pub fn validate_pdf(path: &Path) -> Result<(), PdfOcrError> {
    if !path.is_file() {
        return Err(PdfOcrError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(PdfOcrError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(PdfOcrError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    // Files shorter than four bytes cannot be PDFs either; report what we got.
    let mut magic = [0u8; 4];
    let mut filled = 0;
    while filled < magic.len() {
        match file.read(&mut magic[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    if &magic != b"%PDF" {
        return Err(PdfOcrError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("Validated PDF input: {}", path.display());
    Ok(())
}

/// Default archive path: the input path with its extension replaced by
/// `_ocr.zip` (`scans/letter.pdf` → `scans/letter_ocr.zip`).
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}{DEFAULT_OUTPUT_SUFFIX}"))
}
