//! Pipeline stages for PDF OCR.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the OCR backend can be swapped without touching the
//! image code.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ clean ──▶ ocr ──▶ archive
//! (path)    (pdfium)   (deskew,  (tesseract) (zip)
//!                       binarise)
//! ```
//!
//! 1. [`input`]   — check the PDF exists, is readable and starts with `%PDF`
//! 2. [`render`]  — rasterise pages one at a time at the configured DPI
//! 3. [`clean`]   — grayscale, deskew ([`deskew`]) and adaptive threshold
//! 4. [`ocr`]     — recognise text through an [`ocr::OcrEngine`]
//! 5. [`archive`] — zip the `page_N.txt` files in page order

pub mod archive;
pub mod clean;
pub mod deskew;
pub mod input;
pub mod ocr;
pub mod render;
