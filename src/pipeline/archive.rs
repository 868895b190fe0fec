//! Archiver: bundle the per-page text files into one zip.
//!
//! The archive is assembled in a temporary file next to the destination and
//! renamed into place once complete, so readers never observe a half-written
//! zip and a failed run leaves any previous archive untouched.

use crate::error::PdfOcrError;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write `files` into a zip at `output`, one entry per file named by its base
/// name, in the order given. Replaces `output` if it exists.
///
/// The parent directory of `output` must already exist.
pub fn create_archive(files: &[PathBuf], output: &Path) -> Result<(), PdfOcrError> {
    let fail = |source: io::Error| PdfOcrError::ArchiveWriteFailed {
        path: output.to_path_buf(),
        source,
    };

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(parent).map_err(fail)?;
    write_entries(tmp.as_file(), files).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(output).map_err(|e| fail(e.error))?;

    info!("Wrote {} entries to {}", files.len(), output.display());
    Ok(())
}

fn write_entries(file: &File, files: &[PathBuf]) -> io::Result<()> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut buf = Vec::new();
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("'{}' has no file name", path.display()),
                )
            })?;

        buf.clear();
        File::open(path)?.read_to_end(&mut buf)?;

        zip.start_file(name.as_str(), options)?;
        zip.write_all(&buf)?;
        debug!("Archived {} ({} bytes)", name, buf.len());
    }

    zip.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::ZipArchive;

    fn write_pages(dir: &Path, pages: &[&str]) -> Vec<PathBuf> {
        pages
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let path = dir.join(format!("page_{}.txt", i + 1));
                std::fs::write(&path, text).unwrap();
                path
            })
            .collect()
    }

    fn read_entries(path: &Path) -> Vec<(String, String)> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).unwrap();
                let mut text = String::new();
                entry.read_to_string(&mut text).unwrap();
                (entry.name().to_string(), text)
            })
            .collect()
    }

    #[test]
    fn entries_keep_order_and_base_names() {
        let work = tempfile::tempdir().unwrap();
        let files = write_pages(work.path(), &["first", "", "third"]);
        let out = work.path().join("scan_ocr.zip");

        create_archive(&files, &out).unwrap();

        let entries = read_entries(&out);
        assert_eq!(
            entries,
            vec![
                ("page_1.txt".to_string(), "first".to_string()),
                ("page_2.txt".to_string(), String::new()),
                ("page_3.txt".to_string(), "third".to_string()),
            ]
        );
    }

    #[test]
    fn existing_archive_is_replaced() {
        let work = tempfile::tempdir().unwrap();
        let out = work.path().join("scan_ocr.zip");
        std::fs::write(&out, b"stale bytes").unwrap();

        let files = write_pages(work.path(), &["fresh"]);
        create_archive(&files, &out).unwrap();

        assert_eq!(read_entries(&out), vec![("page_1.txt".into(), "fresh".into())]);
    }

    #[test]
    fn unwritable_destination_is_reported() {
        let work = tempfile::tempdir().unwrap();
        let blocker = work.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let out = blocker.join("scan_ocr.zip");

        let files = write_pages(work.path(), &["text"]);
        let err = create_archive(&files, &out).unwrap_err();
        assert!(matches!(err, PdfOcrError::ArchiveWriteFailed { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn missing_parent_directory_is_rejected() {
        let work = tempfile::tempdir().unwrap();
        let out = work.path().join("no").join("such").join("dir").join("o.zip");

        let files = write_pages(work.path(), &["text"]);
        let err = create_archive(&files, &out).unwrap_err();
        assert!(matches!(err, PdfOcrError::ArchiveWriteFailed { ref path, .. } if path == &out));
        assert!(!out.exists());
        assert!(!work.path().join("no").exists());
    }

    #[test]
    fn missing_source_file_leaves_no_archive() {
        let work = tempfile::tempdir().unwrap();
        let out = work.path().join("scan_ocr.zip");
        let files = vec![work.path().join("page_1.txt")];

        assert!(create_archive(&files, &out).is_err());
        assert!(!out.exists());
        // No stray temp file either.
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }
}
