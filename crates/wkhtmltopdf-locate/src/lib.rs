//! # wkhtmltopdf-locate
//!
//! Resolve the [wkhtmltopdf](https://wkhtmltopdf.org/) executable on the
//! current host so callers never hard-code an install path.
//!
//! ## Resolution order
//!
//! [`locate`] tries, first match wins:
//!
//! 1. The explicit path passed by the caller (must exist, no fallback).
//! 2. The `WKHTMLTOPDF_PATH` environment variable.
//! 3. The platform default install location (see table).
//! 4. The per-user executable directory (`~/.local/bin` on Linux).
//! 5. Every directory on `PATH`.
//!
//! Steps 2–5 are cached for the lifetime of the process after the first
//! successful lookup.
//!
//! ## Platform defaults
//!
//! | OS            | Default path                                       |
//! |---------------|----------------------------------------------------|
//! | Linux / macOS | `/usr/bin/wkhtmltopdf`                             |
//! | Windows       | `C:/Program Files/wkhtmltopdf/bin/wkhtmltopdf.exe` |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wkhtmltopdf_locate::locate;
//!
//! let exe = locate(None).expect("wkhtmltopdf not installed");
//! println!("using {}", exe.display());
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that overrides automatic discovery.
pub const ENV_OVERRIDE: &str = "WKHTMLTOPDF_PATH";

#[cfg(windows)]
const DEFAULT_PATH: &str = "C:/Program Files/wkhtmltopdf/bin/wkhtmltopdf.exe";
#[cfg(not(windows))]
const DEFAULT_PATH: &str = "/usr/bin/wkhtmltopdf";

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "wkhtmltopdf.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "wkhtmltopdf";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned while resolving the executable.
#[derive(Error, Debug)]
pub enum LocateError {
    /// The caller named a path that does not exist.
    #[error("wkhtmltopdf not found at '{path}'")]
    ExplicitPathMissing { path: PathBuf },

    /// The path exists but is a directory or other non-file.
    #[error("'{path}' is not a file")]
    NotAFile { path: PathBuf },

    /// The file exists but lacks execute permission.
    #[error("'{path}' is not executable\nTry: chmod +x {path:?}")]
    NotExecutable { path: PathBuf },

    /// Nothing usable was found anywhere.
    #[error(
        "wkhtmltopdf executable not found.\nSearched: {}\n\
Install it (e.g. `apt-get install wkhtmltopdf`) or set WKHTMLTOPDF_PATH=/path/to/wkhtmltopdf.",
        display_paths(.searched)
    )]
    NotFound { searched: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "(no candidate locations)".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// The install location assumed when nothing else is configured.
pub fn default_executable_path() -> &'static Path {
    Path::new(DEFAULT_PATH)
}

/// Resolve the wkhtmltopdf executable.
///
/// An explicit path is validated as-is and never falls back to discovery:
/// a user who configured a path wants to hear that it is wrong.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, LocateError> {
    match explicit {
        Some(path) => check_executable(path),
        None => locate_auto(),
    }
}

/// Discover the executable from the environment, platform default and `PATH`.
///
/// # Thread safety
///
/// Safe to call from multiple threads; only a successful lookup is cached, so
/// installing wkhtmltopdf mid-process is picked up by the next call.
pub fn locate_auto() -> Result<PathBuf, LocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = resolve_from(
        std::env::var_os(ENV_OVERRIDE),
        dirs::executable_dir(),
        std::env::var_os("PATH"),
    )?;

    // Best-effort cache in the OnceLock (ignore race; both will succeed).
    let _ = RESOLVED_PATH.set(path.clone());

    Ok(path)
}

/// Returns `true` if [`locate_auto`] would succeed right now.
pub fn is_available() -> bool {
    locate_auto().is_ok()
}

/// Search every directory in a `PATH`-style list for `name`.
pub fn find_on_path(name: &str, path_var: &std::ffi::OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| check_executable(candidate).is_ok())
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn resolve_from(
    env_override: Option<OsString>,
    user_bin_dir: Option<PathBuf>,
    path_var: Option<OsString>,
) -> Result<PathBuf, LocateError> {
    let mut searched = Vec::new();

    // 1. Environment variable override. A stale value falls through to
    //    discovery but still shows up in the error's search list.
    if let Some(env_path) = env_override.filter(|v| !v.is_empty()) {
        let p = PathBuf::from(env_path);
        if let Ok(found) = check_executable(&p) {
            return Ok(found);
        }
        searched.push(p);
    }

    // 2. Platform default.
    let default = default_executable_path();
    if let Ok(found) = check_executable(default) {
        return Ok(found);
    }
    searched.push(default.to_path_buf());

    // 3. Per-user executable directory.
    if let Some(dir) = user_bin_dir {
        let p = dir.join(EXECUTABLE_NAME);
        if let Ok(found) = check_executable(&p) {
            return Ok(found);
        }
        searched.push(p);
    }

    // 4. PATH.
    if let Some(path_var) = path_var {
        if let Some(found) = find_on_path(EXECUTABLE_NAME, &path_var) {
            return Ok(found);
        }
        searched.push(PathBuf::from(format!("$PATH/{EXECUTABLE_NAME}")));
    }

    Err(LocateError::NotFound { searched })
}

fn check_executable(path: &Path) -> Result<PathBuf, LocateError> {
    let meta = std::fs::metadata(path).map_err(|_| LocateError::ExplicitPathMissing {
        path: path.to_path_buf(),
    })?;

    if !meta.is_file() {
        return Err(LocateError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            return Err(LocateError::NotExecutable {
                path: path.to_path_buf(),
            });
        }
    }

    Ok(path.to_path_buf())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
