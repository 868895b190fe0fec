//! Configuration types for a PDF OCR run.
//!
//! All behaviour is controlled through [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. Image-cleaning knobs are grouped in
//! [`CleanerParams`] so tests can drive the cleaner directly with the same
//! values the pipeline uses.

use crate::error::PdfOcrError;
use crate::pipeline::clean::CleanerParams;
use crate::pipeline::ocr::OcrEngine;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default rendering resolution in dots per inch.
pub const DEFAULT_DPI: u32 = 200;

/// Default name of the Tesseract executable, resolved through `PATH`.
pub const DEFAULT_TESSERACT_CMD: &str = "tesseract";

/// Configuration for a PDF OCR run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_ocr::{ConversionConfig, FailurePolicy};
///
/// let config = ConversionConfig::builder()
///     .dpi(300)
///     .language("eng+deu")
///     .failure_policy(FailurePolicy::Skip)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–600. Default: 200.
    pub dpi: u32,

    /// Optional cap on the longest rendered edge in pixels.
    ///
    /// `None` renders at the full `dpi` scale. Large-format pages at high DPI
    /// can exhaust memory; set this to bound the bitmap size.
    pub max_rendered_pixels: Option<u32>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Thresholds used by the image cleaner.
    pub cleaner: CleanerParams,

    /// Tesseract executable. Default: `tesseract` on `PATH`.
    pub tesseract_cmd: PathBuf,

    /// Tesseract language pack(s), e.g. `eng` or `eng+fra`. `None` uses the engine default.
    pub language: Option<String>,

    /// Tesseract page segmentation mode (`--psm`, 0–13). `None` uses the engine default.
    pub page_segmentation_mode: Option<u8>,

    /// What to do when one page fails. Default: [`FailurePolicy::Abort`].
    pub failure_policy: FailurePolicy,

    /// Pre-constructed OCR engine. Takes precedence over the Tesseract settings.
    pub engine: Option<Arc<dyn OcrEngine>>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            max_rendered_pixels: None,
            password: None,
            cleaner: CleanerParams::default(),
            tesseract_cmd: PathBuf::from(DEFAULT_TESSERACT_CMD),
            language: None,
            page_segmentation_mode: None,
            failure_policy: FailurePolicy::default(),
            engine: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("cleaner", &self.cleaner)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("language", &self.language)
            .field("page_segmentation_mode", &self.page_segmentation_mode)
            .field("failure_policy", &self.failure_policy)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = Some(px.max(100));
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn cleaner(mut self, params: CleanerParams) -> Self {
        self.config.cleaner = params;
        self
    }

    pub fn binary_threshold(mut self, threshold: u8) -> Self {
        self.config.cleaner.binary_threshold = threshold;
        self
    }

    pub fn adaptive_block_size(mut self, size: u32) -> Self {
        self.config.cleaner.adaptive_block_size = size;
        self
    }

    pub fn adaptive_offset(mut self, offset: i32) -> Self {
        self.config.cleaner.adaptive_offset = offset;
        self
    }

    pub fn min_skew_degrees(mut self, degrees: f32) -> Self {
        self.config.cleaner.min_skew_degrees = degrees.abs();
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = Some(lang.into());
        self
    }

    pub fn page_segmentation_mode(mut self, psm: u8) -> Self {
        self.config.page_segmentation_mode = Some(psm);
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, PdfOcrError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(PdfOcrError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        c.cleaner.validate()?;
        if let Some(psm) = c.page_segmentation_mode {
            if psm > 13 {
                return Err(PdfOcrError::InvalidConfig(format!(
                    "Page segmentation mode must be 0–13, got {psm}"
                )));
            }
        }
        if c.tesseract_cmd.as_os_str().is_empty() {
            return Err(PdfOcrError::InvalidConfig(
                "Tesseract command must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Behaviour when a single page cannot be rasterised or recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop at the first failing page; no archive is written. (default)
    #[default]
    Abort,
    /// Log the failure, leave the page out of the archive and continue.
    Skip,
}
