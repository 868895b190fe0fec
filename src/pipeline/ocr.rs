//! OCR adapter: cleaned page image → text via an external engine.
//!
//! [`OcrEngine`] is the seam between the pipeline and whatever recognises the
//! text. The production implementation, [`TesseractEngine`], shells out to the
//! `tesseract` CLI; tests inject an in-process fake through
//! [`crate::config::ConversionConfig::engine`].

use crate::error::{Dependency, PdfOcrError};
use image::GrayImage;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Tesseract appends a form feed after every page it prints.
const PAGE_SEPARATOR: char = '\x0c';

static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)tesseract\s+v?(\d+\.\d+(?:\.\d+)?)").unwrap());

/// A text recogniser for a single cleaned page.
pub trait OcrEngine: Send + Sync {
    /// Short display name used in logs and reports.
    fn name(&self) -> &str;

    /// Check the engine is usable and return its version string.
    ///
    /// Fails with [`PdfOcrError::MissingDependency`] when it is not installed.
    fn probe(&self) -> Result<String, PdfOcrError>;

    /// Recognise the text on `image`.
    ///
    /// `page_num` is 1-based and only used for error reporting. `scratch_dir`
    /// is a private directory the engine may write intermediate files into;
    /// it is removed when the run ends.
    fn recognize(
        &self,
        image: &GrayImage,
        page_num: usize,
        scratch_dir: &Path,
    ) -> Result<String, PdfOcrError>;
}

/// Runs the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    cmd: PathBuf,
    language: Option<String>,
    psm: Option<u8>,
}

impl TesseractEngine {
    pub fn new(cmd: impl Into<PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            language: None,
            psm: None,
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_page_segmentation_mode(mut self, psm: Option<u8>) -> Self {
        self.psm = psm;
        self
    }

    pub fn cmd(&self) -> &Path {
        &self.cmd
    }

    fn missing(&self, detail: String) -> PdfOcrError {
        PdfOcrError::MissingDependency {
            dependency: Dependency::OcrEngine,
            detail,
            hint: tesseract_install_hint(),
        }
    }

    /// Arguments after the image path.
    fn recognize_args(&self) -> Vec<String> {
        let mut args = vec!["stdout".to_string()];
        if let Some(lang) = &self.language {
            args.push("-l".into());
            args.push(lang.clone());
        }
        if let Some(psm) = self.psm {
            args.push("--psm".into());
            args.push(psm.to_string());
        }
        args
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn probe(&self) -> Result<String, PdfOcrError> {
        let output = Command::new(&self.cmd)
            .arg("--version")
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    self.missing(format!("`{}` was not found", self.cmd.display()))
                } else {
                    self.missing(format!("cannot run `{}`: {}", self.cmd.display(), e))
                }
            })?;

        if !output.status.success() {
            return Err(self.missing(format!(
                "`{} --version` exited with {}",
                self.cmd.display(),
                output.status
            )));
        }

        // Tesseract 3.x printed its banner on stderr, later versions on stdout.
        let banner = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let version = parse_version(&banner).unwrap_or_else(|| "unknown".to_string());
        debug!("Found {} {}", self.cmd.display(), version);
        Ok(version)
    }

    fn recognize(
        &self,
        image: &GrayImage,
        page_num: usize,
        scratch_dir: &Path,
    ) -> Result<String, PdfOcrError> {
        let image_path = scratch_dir.join(format!("page_{page_num}.png"));
        image
            .save(&image_path)
            .map_err(|e| PdfOcrError::RecognitionFailed {
                page: page_num,
                detail: format!("cannot write OCR input image: {e}"),
            })?;

        let output = Command::new(&self.cmd)
            .arg(&image_path)
            .args(self.recognize_args())
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    self.missing(format!("`{}` disappeared during the run", self.cmd.display()))
                } else {
                    PdfOcrError::RecognitionFailed {
                        page: page_num,
                        detail: format!("cannot run tesseract: {e}"),
                    }
                }
            })?;

        // The PNG is only needed for the one call.
        if let Err(e) = std::fs::remove_file(&image_path) {
            warn!("Could not remove {}: {}", image_path.display(), e);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PdfOcrError::RecognitionFailed {
                page: page_num,
                detail: format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(strip_page_separator(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Extract `X.Y[.Z]` from a `tesseract --version` banner.
pub fn parse_version(banner: &str) -> Option<String> {
    VERSION_RE
        .captures(banner)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Drop the trailing form feed Tesseract prints after each page.
pub fn strip_page_separator(text: &str) -> String {
    text.trim_end_matches(PAGE_SEPARATOR).to_string()
}

/// Platform-specific instructions for installing Tesseract.
pub fn tesseract_install_hint() -> String {
    let install = if cfg!(target_os = "macos") {
        "  brew install tesseract"
    } else if cfg!(target_os = "windows") {
        "  Download the installer from https://github.com/UB-Mannheim/tesseract/wiki\n  \
         and add its install directory to PATH"
    } else {
        "  Debian/Ubuntu: sudo apt-get install tesseract-ocr\n  \
         Fedora:        sudo dnf install tesseract"
    };
    format!(
        "Install Tesseract and make sure `tesseract` is on PATH:\n{install}\n\
         Or point to the binary with --tesseract-cmd <PATH>."
    )
}
