//! Startup checks for the external tools a run depends on.
//!
//! [`run`] verifies the OCR engine answers and binds the PDFium library once,
//! before any input is touched. The resulting [`Toolchain`] is passed to
//! [`crate::convert::convert_with`] for every document, so a process that
//! converts many files pays for discovery once.

use crate::config::ConversionConfig;
use crate::error::{Dependency, PdfOcrError};
use crate::pipeline::ocr::{OcrEngine, TesseractEngine};
use pdfium_locate::{LibrarySource, LocateError};
use pdfium_render::prelude::Pdfium;
use std::sync::Arc;
use tracing::info;

/// Everything needed to process a document.
pub struct Toolchain {
    pub pdfium: Pdfium,
    pub pdfium_source: LibrarySource,
    pub engine: Arc<dyn OcrEngine>,
    pub engine_version: String,
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("pdfium_source", &self.pdfium_source)
            .field("engine", &self.engine.name())
            .field("engine_version", &self.engine_version)
            .finish()
    }
}

/// The OCR engine the config asks for: the injected one, or Tesseract.
pub fn resolve_engine(config: &ConversionConfig) -> Arc<dyn OcrEngine> {
    match &config.engine {
        Some(engine) => Arc::clone(engine),
        None => Arc::new(
            TesseractEngine::new(&config.tesseract_cmd)
                .with_language(config.language.clone())
                .with_page_segmentation_mode(config.page_segmentation_mode),
        ),
    }
}

/// Probe the OCR engine. Fails with [`PdfOcrError::MissingDependency`].
pub fn check_engine(config: &ConversionConfig) -> Result<(Arc<dyn OcrEngine>, String), PdfOcrError> {
    let engine = resolve_engine(config);
    let version = engine.probe()?;
    info!("OCR engine: {} {}", engine.name(), version);
    Ok((engine, version))
}

/// Locate and bind PDFium. Fails with [`PdfOcrError::MissingDependency`].
pub fn bind_renderer() -> Result<(Pdfium, LibrarySource), PdfOcrError> {
    let (pdfium, source) = pdfium_locate::bind_pdfium().map_err(|e| {
        let hint = match &e {
            LocateError::NotFound { .. } => pdfium_locate::install_hint(),
            LocateError::Bind { .. } => format!(
                "The library file exists but could not be loaded; it may be for another \
                 architecture or incomplete.\n{}",
                pdfium_locate::install_hint()
            ),
        };
        PdfOcrError::MissingDependency {
            dependency: Dependency::PdfRenderer,
            detail: e.to_string(),
            hint,
        }
    })?;
    info!("PDFium bound from {}", source);
    Ok((pdfium, source))
}

/// Run every startup check and return the bound toolchain.
///
/// The OCR engine is checked first: it is the dependency users most often
/// lack, and probing it is cheap.
pub fn run(config: &ConversionConfig) -> Result<Toolchain, PdfOcrError> {
    let (engine, engine_version) = check_engine(config)?;
    let (pdfium, pdfium_source) = bind_renderer()?;
    Ok(Toolchain {
        pdfium,
        pdfium_source,
        engine,
        engine_version,
    })
}
