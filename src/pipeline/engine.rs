//! The conversion engine seam and the subprocess adapter.
//!
//! Everything upstream and downstream of the actual format conversion is
//! owned by this crate; the conversion itself is not. [`ConversionEngine`]
//! is the one seam where that work happens, with two ways to fill it:
//!
//! - **in-process**: hand the orchestrator any `Arc<dyn ConversionEngine>`
//!   via [`OrchestratorConfig::builder`](crate::config::OrchestratorConfig::builder).
//!   Useful when the engine is a Rust library, and for tests.
//! - **subprocess**: [`CliEngine`], which shells out to an external
//!   converter. This is the default and carries the operational armour:
//!   a hard timeout with kill-and-reap, exit-code classification, and
//!   diagnostics captured from the child's streams.
//!
//! ## Why a subprocess by default?
//!
//! Conversion engines are heavyweight and crash-prone in ways a library
//! boundary cannot contain. A child process can be killed after a
//! deadline, cannot corrupt the orchestrator's memory, and upgrades
//! independently. The cost, artifact discovery instead of a return
//! value, is handled in [`super::discover`].

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::document::ConvertOptions;
use crate::error::DocpressError;
use crate::pipeline::discover::discover_artifacts;
use crate::pipeline::normalize::NormalizedInput;
use crate::pipeline::sanitize;

// ─────────────────────────────── Seam ───────────────────────────────────

/// Raw artifact bodies produced by one conversion.
///
/// Bytes, not strings: sanitisation happens uniformly in
/// [`super::invoke`], so adapters do not each reinvent it.
#[derive(Debug)]
pub struct EngineOutput {
    pub html: Vec<u8>,
    pub markdown: Option<Vec<u8>>,
}

/// A conversion engine: turns a normalized input into HTML (and
/// optionally Markdown).
///
/// Implementations must map their failures onto the shared taxonomy:
/// problems with the input itself become
/// [`DocpressError::InvalidInput`], everything else becomes
/// [`DocpressError::ConversionFailed`]. The HTML body must be present
/// and non-empty on success.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    async fn convert(
        &self,
        input: &NormalizedInput,
        options: &ConvertOptions,
    ) -> Result<EngineOutput, DocpressError>;
}

// ───────────────────────── Subprocess Adapter ───────────────────────────

/// Runs an external converter CLI inside the input's scratch directory.
///
/// The child is told to use the scratch directory as its work root, so
/// everything it writes is found by artifact discovery and removed when
/// the [`NormalizedInput`] drops.
pub struct CliEngine {
    command: Vec<String>,
    timeout: Duration,
}

impl CliEngine {
    /// `command` is the full leading argv: program first, then any
    /// global arguments (e.g. `["uv", "run", "docpress-engine"]`).
    pub fn new(command: Vec<String>, timeout_secs: u64) -> Result<Self, DocpressError> {
        if command.is_empty() || command[0].trim().is_empty() {
            return Err(DocpressError::InvalidConfig(
                "engine command must name a program".to_string(),
            ));
        }
        Ok(Self {
            command,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }

    fn program(&self) -> &str {
        &self.command[0]
    }

    /// Arguments after the program, in the order converters expect:
    /// globals, work root, the `format` subcommand with its input, then
    /// per-request options.
    fn build_args(&self, input: &NormalizedInput, options: &ConvertOptions) -> Vec<String> {
        let mut args: Vec<String> = self.command[1..].to_vec();
        args.push("--work_root".to_string());
        args.push(input.scratch_dir().display().to_string());
        args.push("format".to_string());
        args.push(input.input_arg().to_string());
        if options.add_title {
            args.push("--add_title".to_string());
        }
        if let Some(classes) = &options.add_classes {
            args.push("--add_classes".to_string());
            args.push(classes.clone());
        }
        if options.no_minify {
            args.push("--no_minify".to_string());
        }
        args
    }

    async fn run(
        &self,
        input: &NormalizedInput,
        options: &ConvertOptions,
    ) -> Result<(Vec<u8>, Vec<u8>), DocpressError> {
        let args = self.build_args(input, options);
        debug!("spawning engine: {} {}", self.program(), args.join(" "));

        let mut child = Command::new(self.program())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DocpressError::ConversionEngineUnavailable {
                    program: self.program().to_string(),
                },
                _ => DocpressError::ConversionFailed {
                    detail: format!("failed to spawn engine: {e}"),
                },
            })?;

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();

        // Wait and drain concurrently: a chatty engine must not deadlock
        // on a full pipe while we wait for it to exit.
        let wait_and_drain = async {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            let (status, _, _) = tokio::join!(
                child.wait(),
                async {
                    if let Some(pipe) = stdout_pipe.as_mut() {
                        let _ = pipe.read_to_end(&mut stdout).await;
                    }
                },
                async {
                    if let Some(pipe) = stderr_pipe.as_mut() {
                        let _ = pipe.read_to_end(&mut stderr).await;
                    }
                },
            );
            (status, stdout, stderr)
        };

        let (status, stdout, stderr) = match tokio::time::timeout(self.timeout, wait_and_drain).await
        {
            Ok((status, stdout, stderr)) => {
                let status = status.map_err(|e| DocpressError::ConversionFailed {
                    detail: format!("failed to wait for engine: {e}"),
                })?;
                (status, stdout, stderr)
            }
            Err(_) => {
                // Kill and reap before returning, so the scratch
                // directory is not removed under a live child.
                warn!(
                    "engine exceeded {}s, killing: {}",
                    self.timeout.as_secs(),
                    self.program()
                );
                let _ = child.kill().await;
                return Err(DocpressError::ConversionTimeout {
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !status.success() {
            let detail = failure_detail(&status, &stdout, &stderr);
            warn!("engine failed ({status}): {detail}");
            return Err(DocpressError::ConversionFailed { detail });
        }

        Ok((stdout, stderr))
    }
}

#[async_trait]
impl ConversionEngine for CliEngine {
    async fn convert(
        &self,
        input: &NormalizedInput,
        options: &ConvertOptions,
    ) -> Result<EngineOutput, DocpressError> {
        let (stdout, _stderr) = self.run(input, options).await?;
        if !stdout.is_empty() {
            debug!("engine stdout: {}", preview(&sanitize::decode_lossy(&stdout), 500));
        }

        let artifacts = discover_artifacts(input.scratch_dir(), input.staged_input())?;
        let html = read_artifact(&artifacts.html).await?;
        let markdown = match &artifacts.markdown {
            Some(path) => Some(read_artifact(path).await?),
            None => None,
        };
        info!(
            "engine produced html={}B markdown={}",
            html.len(),
            markdown
                .as_ref()
                .map(|m| format!("{}B", m.len()))
                .unwrap_or_else(|| "none".to_string())
        );
        Ok(EngineOutput { html, markdown })
    }
}

/// Most specific diagnostic available: stderr, then stdout, then the
/// exit status itself.
fn failure_detail(status: &std::process::ExitStatus, stdout: &[u8], stderr: &[u8]) -> String {
    let err = sanitize::clean_body(stderr);
    let err = err.trim();
    if !err.is_empty() {
        return err.to_string();
    }
    let out = sanitize::clean_body(stdout);
    let out = out.trim();
    if !out.is_empty() {
        return out.to_string();
    }
    match status.code() {
        Some(code) => format!("engine exited with status {code}"),
        None => "engine terminated by signal".to_string(),
    }
}

async fn read_artifact(path: &Path) -> Result<Vec<u8>, DocpressError> {
    tokio::fs::read(path).await.map_err(|e| {
        DocpressError::Internal(format!("failed to read artifact {}: {e}", path.display()))
    })
}

fn preview(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        text.to_string()
    } else {
        let cut: String = text.chars().take(cap).collect();
        format!("{cut}…")
    }
}

// ─────────────────────────────── Tests ──────────────────────────────────
