//! Render engine: HTML [`Markup`] → PDF bytes.
//!
//! [`RenderEngine`] is the one seam between the pipeline and the outside
//! world. The production implementation, [`WkhtmltopdfEngine`], pipes the
//! markup into `wkhtmltopdf` on stdin and collects the PDF from stdout, so no
//! temporary files are involved. Tests substitute an in-process engine.
//!
//! The child is spawned with `kill_on_drop`, so dropping the render future
//! (for example when a timeout fires) also terminates the engine process.

use crate::config::GenerationConfig;
use crate::error::ReceiptError;
use crate::pipeline::markup::Markup;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Paper size passed to `--page-size`. The receipt sections are sized for
/// A4, so this is not configurable.
pub const PAGE_SIZE: &str = "A4";

/// Engine flags derived from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub enable_local_file_access: bool,
    /// Suppress the engine's progress chatter on stderr.
    pub quiet: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            enable_local_file_access: true,
            quiet: true,
        }
    }
}

impl RenderOptions {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            enable_local_file_access: config.enable_local_file_access,
            quiet: true,
        }
    }

    /// Command-line arguments for wkhtmltopdf, reading stdin and writing stdout.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(6);
        if self.quiet {
            args.push("--quiet".to_string());
        }
        args.push("--page-size".to_string());
        args.push(PAGE_SIZE.to_string());
        if self.enable_local_file_access {
            args.push("--enable-local-file-access".to_string());
        }
        args.push("-".to_string());
        args.push("-".to_string());
        args
    }
}

/// Turns markup into a PDF document.
pub trait RenderEngine: Send + Sync {
    /// Render `markup` into PDF bytes.
    ///
    /// Engine-side failures must be reported as [`ReceiptError::RenderEngine`]
    /// carrying the engine's own diagnostic text.
    fn render(
        &self,
        markup: &Markup,
        options: &RenderOptions,
    ) -> impl Future<Output = Result<Vec<u8>, ReceiptError>> + Send;
}

/// Renders through an external `wkhtmltopdf` process.
#[derive(Debug, Clone)]
pub struct WkhtmltopdfEngine {
    executable: PathBuf,
}

impl WkhtmltopdfEngine {
    /// Use the executable at `path` as-is.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            executable: path.into(),
        }
    }

    /// Resolve the executable from `config.engine_path` or the host defaults.
    ///
    /// # Errors
    /// [`ReceiptError::Configuration`] if no usable executable is found.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, ReceiptError> {
        let path = wkhtmltopdf_locate::locate(config.engine_path.as_deref()).map_err(|e| {
            ReceiptError::Configuration {
                detail: e.to_string(),
                hint: "Install wkhtmltopdf (e.g. `apt-get install wkhtmltopdf`) or pass \
                       --wkhtmltopdf / set WKHTMLTOPDF_PATH."
                    .to_string(),
            }
        })?;
        debug!("Using wkhtmltopdf at {}", path.display());
        Ok(Self::new(path))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl RenderEngine for WkhtmltopdfEngine {
    async fn render(
        &self,
        markup: &Markup,
        options: &RenderOptions,
    ) -> Result<Vec<u8>, ReceiptError> {
        let args = options.to_args();
        debug!("Running {} {}", self.executable.display(), args.join(" "));

        let mut child = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&self.executable, e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReceiptError::Internal("engine stdin was not captured".into()))?;
        let input = markup.as_bytes().to_vec();
        // Fed from a separate task so a large document cannot deadlock against
        // a full stdout pipe.
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ReceiptError::RenderEngine {
                detail: format!("failed to wait for wkhtmltopdf: {e}"),
            })?;

        let write_result = writer
            .await
            .map_err(|e| ReceiptError::Internal(format!("Engine input task panicked: {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(ReceiptError::RenderEngine {
                detail: if stderr.is_empty() {
                    format!("wkhtmltopdf exited with status {status}")
                } else {
                    format!("wkhtmltopdf exited with status {status}: {stderr}")
                },
            });
        }

        if let Err(e) = write_result {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(ReceiptError::RenderEngine {
                    detail: format!("failed to send markup to wkhtmltopdf: {e}"),
                });
            }
        }

        if !stderr.is_empty() {
            debug!("wkhtmltopdf stderr: {}", stderr);
        }

        ensure_pdf_header(&output.stdout)?;
        Ok(output.stdout)
    }
}

/// Reject engine output that is not a PDF at all.
pub fn ensure_pdf_header(bytes: &[u8]) -> Result<(), ReceiptError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else if bytes.is_empty() {
        Err(ReceiptError::RenderEngine {
            detail: "engine produced no output".to_string(),
        })
    } else {
        let head: String = String::from_utf8_lossy(&bytes[..bytes.len().min(16)]).into_owned();
        Err(ReceiptError::RenderEngine {
            detail: format!("engine output is not a PDF (starts with {head:?})"),
        })
    }
}

fn spawn_error(executable: &Path, e: std::io::Error) -> ReceiptError {
    match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => ReceiptError::Configuration {
            detail: format!("cannot run '{}': {e}", executable.display()),
            hint: "Check that wkhtmltopdf is installed and executable.".to_string(),
        },
        _ => ReceiptError::RenderEngine {
            detail: format!("failed to start wkhtmltopdf: {e}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_match_reference_options() {
        let args = RenderOptions::default().to_args();
        assert_eq!(
            args,
            vec![
                "--quiet",
                "--page-size",
                "A4",
                "--enable-local-file-access",
                "-",
                "-"
            ]
        );
    }

    #[test]
    fn args_follow_config() {
        let config = GenerationConfig::builder()
            .enable_local_file_access(false)
            .build()
            .unwrap();
        let args = RenderOptions::from_config(&config).to_args();
        assert_eq!(args[1], "--page-size");
        assert_eq!(args[2], "A4");
        assert!(!args.contains(&"--enable-local-file-access".to_string()));
    }

    #[test]
    fn pdf_header_is_required() {
        assert!(ensure_pdf_header(b"%PDF-1.4\n...").is_ok());
        let err = ensure_pdf_header(b"<html>").unwrap_err();
        assert!(err.to_string().contains("not a PDF"));
        let err = ensure_pdf_header(b"").unwrap_err();
        assert!(err.to_string().contains("no output"));
    }

    #[test]
    fn explicit_missing_engine_is_configuration_error() {
        let config = GenerationConfig::builder()
            .engine_path("/nonexistent/bin/wkhtmltopdf")
            .build()
            .unwrap();
        let err = WkhtmltopdfEngine::from_config(&config).unwrap_err();
        assert!(matches!(err, ReceiptError::Configuration { .. }));
        assert!(err.to_string().contains("WKHTMLTOPDF_PATH"));
    }

    #[tokio::test]
    async fn unrunnable_engine_is_configuration_error() {
        let engine = WkhtmltopdfEngine::new("/nonexistent/bin/wkhtmltopdf");
        let markup = Markup::from_html("<html></html>");
        let err = engine
            .render(&markup, &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReceiptError::Configuration { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_engine_stderr_is_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("wkhtmltopdf");
        std::fs::write(
            &script,
            "#!/bin/sh\ncat > /dev/null\necho 'Error: Failed to load about:blank' >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = WkhtmltopdfEngine::new(&script);
        let err = engine
            .render(&Markup::from_html("<html></html>"), &RenderOptions::default())
            .await
            .unwrap_err();
        match err {
            ReceiptError::RenderEngine { detail } => {
                assert!(detail.contains("status 1"), "got: {detail}");
                assert!(detail.contains("Error: Failed to load about:blank"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn engine_stdout_is_returned() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("wkhtmltopdf");
        std::fs::write(&script, "#!/bin/sh\ncat > /dev/null\nprintf '%%PDF-1.4 fake'\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = WkhtmltopdfEngine::new(&script);
        let bytes = engine
            .render(&Markup::from_html("<html></html>"), &RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.4 fake");
    }
}
