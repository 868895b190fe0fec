//! Rendering tests against a real PDFium library.
//!
//! Skipped (with a message) when no PDFium can be located; set
//! `PDFIUM_LIB_PATH` to run them. Everything lives in one test function so
//! the library is bound once per process.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test render -- --nocapture

use image::GrayImage;
use pdf_ocr::pipeline::render::Rasterizer;
use pdf_ocr::{convert_with, ConversionConfig, OcrEngine, PdfOcrError, Toolchain};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

struct BlankAware;

impl OcrEngine for BlankAware {
    fn name(&self) -> &str {
        "blank-aware"
    }

    fn probe(&self) -> Result<String, PdfOcrError> {
        Ok("0.0".into())
    }

    fn recognize(&self, image: &GrayImage, page: usize, _: &Path) -> Result<String, PdfOcrError> {
        let ink = image.pixels().any(|p| p.0[0] == 0);
        Ok(if ink { format!("ink on {page}") } else { String::new() })
    }
}

/// Build a small PDF with `pages` empty pages and a correct xref table.
fn blank_pdf(pages: usize) -> Vec<u8> {
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            (0..pages)
                .map(|i| format!("{} 0 R", i + 3))
                .collect::<Vec<_>>()
                .join(" "),
            pages
        ),
    ];
    for _ in 0..pages {
        objects.push("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 144 144] >>".to_string());
    }

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref_at = pdf.len();
    pdf.extend_from_slice(
        format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes(),
    );
    for off in offsets {
        pdf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );
    pdf
}

#[test]
fn renders_real_pdfs() {
    let (pdfium, source) = match pdfium_locate::bind_pdfium() {
        Ok(bound) => bound,
        Err(e) => {
            println!("SKIP — {e}");
            return;
        }
    };
    println!("PDFium: {source}");

    let toolchain = Toolchain {
        pdfium,
        pdfium_source: source,
        engine: Arc::new(BlankAware),
        engine_version: "0.0".into(),
    };
    let config = ConversionConfig::builder().dpi(72).build().unwrap();
    let dir = tempfile::tempdir().unwrap();

    // ── Three blank pages → three empty entries, default output path ─────
    let input = dir.path().join("blank.pdf");
    std::fs::write(&input, blank_pdf(3)).unwrap();

    let output = convert_with(&toolchain, &input, None, &config).unwrap();
    assert_eq!(output.archive_path, dir.path().join("blank_ocr.zip"));
    assert_eq!(output.stats.total_pages, 3);

    let mut archive = zip::ZipArchive::new(File::open(&output.archive_path).unwrap()).unwrap();
    let mut names = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).unwrap();
        assert_eq!(entry.size(), 0);
        names.push(entry.name().to_string());
    }
    assert_eq!(names, vec!["page_1.txt", "page_2.txt", "page_3.txt"]);

    // ── Rasterizer streams pages while borrowing the config ──────────────
    let rasterizer = Rasterizer::open(&toolchain.pdfium, &input, &config).unwrap();
    assert_eq!(rasterizer.page_count(), 3);
    let sizes: Vec<(u32, u32)> = rasterizer
        .pages()
        .map(|page| {
            let image = page.unwrap();
            (image.width(), image.height())
        })
        .collect();
    assert_eq!(sizes, vec![(144, 144); 3]);
    drop(rasterizer);

    // ── Unparseable body → conversion error, no archive ──────────────────
    let broken = dir.path().join("broken.pdf");
    std::fs::write(&broken, b"%PDF-1.4\nthis is not a pdf body").unwrap();
    let out = dir.path().join("broken.zip");

    let err = convert_with(&toolchain, &broken, Some(&out), &config).unwrap_err();
    assert_eq!(err.kind(), pdf_ocr::ErrorKind::Conversion, "got: {err}");
    assert!(!out.exists());
}
