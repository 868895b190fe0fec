//! PDF rasterisation: render pages to `DynamicImage` via pdfium.
//!
//! The [`Rasterizer`] borrows a bound [`Pdfium`] instance for the lifetime of
//! the open document and renders one page at a time, so only the page that is
//! currently being cleaned and recognised is held in memory.

use crate::config::ConversionConfig;
use crate::error::PdfOcrError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// PDF user space is defined at 72 points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// An open PDF document ready to be rendered page by page.
pub struct Rasterizer<'a> {
    path: PathBuf,
    document: PdfDocument<'a>,
    render_config: PdfRenderConfig,
}

impl<'a> Rasterizer<'a> {
    /// Open `pdf_path` with an already bound pdfium.
    ///
    /// The document borrows the password from `config`, so the config must
    /// outlive the rasterizer.
    pub fn open(
        pdfium: &'a Pdfium,
        pdf_path: &Path,
        config: &'a ConversionConfig,
    ) -> Result<Self, PdfOcrError> {
        let password = config.password.as_deref();
        let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    PdfOcrError::WrongPassword {
                        path: pdf_path.to_path_buf(),
                    }
                } else {
                    PdfOcrError::PasswordRequired {
                        path: pdf_path.to_path_buf(),
                    }
                }
            } else {
                PdfOcrError::CorruptPdf {
                    path: pdf_path.to_path_buf(),
                    detail: err_str,
                }
            }
        })?;

        let mut render_config =
            PdfRenderConfig::new().scale_page_by_factor(config.dpi as f32 / POINTS_PER_INCH);
        if let Some(max_pixels) = config.max_rendered_pixels {
            render_config = render_config
                .set_maximum_width(max_pixels as i32)
                .set_maximum_height(max_pixels as i32);
        }

        let rasterizer = Self {
            path: pdf_path.to_path_buf(),
            document,
            render_config,
        };
        info!(
            "PDF loaded: {} ({} pages, {} dpi)",
            rasterizer.path.display(),
            rasterizer.page_count(),
            config.dpi
        );
        Ok(rasterizer)
    }

    /// Path of the open document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    /// Render the page at 0-based `index`.
    pub fn render_page(&self, index: usize) -> Result<DynamicImage, PdfOcrError> {
        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(|e| PdfOcrError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page
            .render_with_config(&self.render_config)
            .map_err(|e| PdfOcrError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }

    /// Lazily render every page in document order.
    pub fn pages(
        &self,
    ) -> impl Iterator<Item = Result<DynamicImage, PdfOcrError>> + '_ + use<'_, 'a> {
        (0..self.page_count()).map(move |idx| self.render_page(idx))
    }
}
