//! # pdfium-locate
//!
//! Find an installed [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library and bind `pdfium-render` to it.
//!
//! PDFium is a native dependency that must be installed separately. This crate
//! never downloads it; it only looks in the places a user is expected to put
//! it and, when nothing is found, produces install instructions for the
//! current platform.
//!
//! ## Search order
//!
//! 1. `PDFIUM_LIB_PATH` — explicit path to the library file.
//! 2. The per-user cache directory (see [`pdfium_cache_dir`]).
//! 3. The current working directory.
//! 4. The directory holding the running executable.
//! 5. The operating system's library search path (`LD_LIBRARY_PATH`,
//!    `DYLD_LIBRARY_PATH`, `PATH` on Windows, ...).
//!
//! ```rust,no_run
//! let (pdfium, source) = pdfium_locate::bind_pdfium().expect("PDFium unavailable");
//! eprintln!("PDFium bound from {source}");
//! # drop(pdfium);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable naming an explicit library file.
pub const LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "PDFIUM_CACHE_DIR";

/// Prebuilt binaries referenced by the install hint.
const BINARIES_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned while locating or binding PDFium.
#[derive(Error, Debug)]
pub enum LocateError {
    /// No candidate location held a loadable library.
    #[error("PDFium library not found (searched: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    /// A library file exists but `pdfium-render` could not load it.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "system library path".to_string();
    }
    let mut out = paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(", system library path");
    out
}

/// Where the bound library came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySource {
    /// A file found at one of the candidate paths.
    File(PathBuf),
    /// The operating system's dynamic loader search path.
    System,
}

impl fmt::Display for LibrarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibrarySource::File(p) => write!(f, "{}", p.display()),
            LibrarySource::System => f.write_str("system library path"),
        }
    }
}

// ── Platform metadata ────────────────────────────────────────────────────────

/// Platform file name of the library: `libpdfium.so`, `libpdfium.dylib` or
/// `pdfium.dll`.
pub fn library_file_name() -> String {
    format!(
        "{}pdfium{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

/// Name of the prebuilt archive for this OS/arch, if one is published.
fn prebuilt_archive_name() -> Option<&'static str> {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("macos", "aarch64") => Some("pdfium-mac-arm64.tgz"),
        ("macos", "x86_64") => Some("pdfium-mac-x64.tgz"),
        ("linux", "x86_64") => Some("pdfium-linux-x64.tgz"),
        ("linux", "aarch64") => Some("pdfium-linux-arm64.tgz"),
        ("windows", "x86_64") => Some("pdfium-win-x64.tgz"),
        ("windows", "aarch64") => Some("pdfium-win-arm64.tgz"),
        ("windows", "x86") => Some("pdfium-win-x86.tgz"),
        _ => None,
    }
}

// ── Cache directory resolution ───────────────────────────────────────────────

/// Per-user directory checked for an installed library.
///
/// - **macOS**: `~/Library/Caches/pdf-ocr/pdfium/`
/// - **Linux**: `~/.cache/pdf-ocr/pdfium/`
/// - **Windows**: `%LOCALAPPDATA%\pdf-ocr\pdfium\`
///
/// Override by setting `PDFIUM_CACHE_DIR`.
pub fn pdfium_cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("pdf-ocr").join("pdfium")
}

/// File paths checked before falling back to the system loader, in order.
pub fn candidate_paths() -> Vec<PathBuf> {
    let name = library_file_name();
    let mut paths = Vec::new();

    if let Ok(p) = std::env::var(LIB_PATH_ENV) {
        if !p.is_empty() {
            paths.push(PathBuf::from(p));
        }
    }
    paths.push(pdfium_cache_dir().join(&name));
    paths.push(PathBuf::from(".").join(&name));
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(dir.join(&name));
    }

    paths
}

/// Install instructions for the current platform.
pub fn install_hint() -> String {
    let name = library_file_name();
    let cache = pdfium_cache_dir();
    let mut hint = String::new();

    match prebuilt_archive_name() {
        Some(archive) => hint.push_str(&format!(
            "Download {archive} from {BINARIES_URL}\n\
             and copy the {name} it contains to one of:\n"
        )),
        None => hint.push_str(&format!(
            "No prebuilt PDFium is published for {}/{}; build {name} from source\n\
             and copy it to one of:\n",
            std::env::consts::OS,
            std::env::consts::ARCH
        )),
    }
    hint.push_str(&format!("  • {}\n", cache.display()));
    hint.push_str("  • the directory containing this program\n");
    hint.push_str(&format!("or point {LIB_PATH_ENV} at the library file."));
    hint
}

// ── Binding ──────────────────────────────────────────────────────────────────

/// Locate PDFium and bind to it.
///
/// A candidate file that exists but fails to load is reported as
/// [`LocateError::Bind`] rather than silently skipped, so a broken install
/// is not masked by the system fallback.
pub fn bind_pdfium() -> Result<(Pdfium, LibrarySource), LocateError> {
    let candidates = candidate_paths();

    for path in &candidates {
        if path.is_file() {
            let pdfium = bind_pdfium_from_path(path)?;
            return Ok((pdfium, LibrarySource::File(path.clone())));
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => Ok((Pdfium::new(bindings), LibrarySource::System)),
        Err(_) => Err(LocateError::NotFound {
            searched: candidates,
        }),
    }
}

/// Binds to a PDFium library at an explicit `path`.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, LocateError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| LocateError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
