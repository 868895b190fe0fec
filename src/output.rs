//! Run report types.
//!
//! Everything here is plain data and serialises with `serde`, so the CLI can
//! print the report with `--json` and library callers can log or persist it.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Where the zip archive was written.
    pub archive_path: PathBuf,
    /// One entry per page, in document order.
    pub pages: Vec<PageResult>,
    /// Aggregate counters and timings.
    pub stats: ConversionStats,
}

/// What happened to one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Archive entry name, e.g. `page_3.txt`. `None` when the page failed.
    pub entry_name: Option<String>,
    /// Character count of the recognised text.
    pub chars: usize,
    /// Skew angle measured by the cleaner, in degrees. `None` when the page
    /// had no contours to measure.
    pub skew_angle: Option<f32>,
    /// Whether the page was rotated before thresholding.
    pub deskewed: bool,
    /// Wall-clock time spent on this page.
    pub duration_ms: u64,
    /// Set when the page failed under [`crate::config::FailurePolicy::Skip`].
    pub error: Option<PageError>,
}

impl PageResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate statistics for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub processed_pages: usize,
    pub failed_pages: usize,
    pub total_duration_ms: u64,
    pub render_duration_ms: u64,
    pub clean_duration_ms: u64,
    pub ocr_duration_ms: u64,
}

/// Archive entry name for a 1-indexed page.
pub fn page_entry_name(page_num: usize) -> String {
    format!("page_{page_num}.txt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_follow_page_numbers() {
        assert_eq!(page_entry_name(1), "page_1.txt");
        assert_eq!(page_entry_name(12), "page_12.txt");
    }

    #[test]
    fn report_serialises_to_json() {
        let output = ConversionOutput {
            archive_path: PathBuf::from("scan_ocr.zip"),
            pages: vec![PageResult {
                page_num: 1,
                entry_name: Some(page_entry_name(1)),
                chars: 42,
                skew_angle: Some(-1.5),
                deskewed: true,
                duration_ms: 120,
                error: None,
            }],
            stats: ConversionStats {
                total_pages: 1,
                processed_pages: 1,
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"entry_name\":\"page_1.txt\""), "got: {json}");
        let back: ConversionOutput = serde_json::from_str(&json).unwrap();
        assert!(back.pages[0].is_ok());
        assert_eq!(back.stats.processed_pages, 1);
    }
}
