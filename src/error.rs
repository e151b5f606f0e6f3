//! Error types for the docpress library.
//!
//! One enum covers the whole orchestration path, but the variants fall into
//! three deliberate groups:
//!
//! * **Client-input errors** — the request itself was unusable (no input, an
//!   unsupported upload extension, a bad component count). Surfaced verbatim
//!   to the caller; a transport maps them to 4xx.
//! * **Engine errors** — the external conversion engine misbehaved (timeout,
//!   non-zero exit, no artifact). Message detail is preserved, but these are
//!   server-side failures; a transport maps them to 5xx.
//! * **Storage errors** — persistence failed or was never configured. The
//!   message stays generic; connection detail is only ever logged, never
//!   placed in the error value.
//!
//! [`DocpressError::is_client_error`] encodes the grouping so front ends do
//! not have to pattern-match the full enum.

use thiserror::Error;

/// All errors returned by the docpress library.
#[derive(Debug, Error)]
pub enum DocpressError {
    // ── Client-input errors ───────────────────────────────────────────────
    /// The request populated none of file / text / url.
    #[error("No input provided: supply a file, text, or a URL.")]
    NoInputProvided,

    /// Text or URL input was empty after trimming.
    #[error("Input is empty.")]
    EmptyInput,

    /// Text input exceeded the configured ceiling.
    #[error("Input too large: {chars} characters (limit {max}).")]
    InputTooLarge { chars: usize, max: usize },

    /// Uploaded file extension is not one the engine accepts.
    #[error("Unsupported file type: '{extension}'\nSupported: .docx, .md, .markdown, .txt")]
    UnsupportedInputType { extension: String },

    /// The engine itself recognised the input as malformed.
    #[error("Invalid input: {detail}")]
    InvalidInput { detail: String },

    // ── Composition errors (client-input class) ───────────────────────────
    /// Combine called with the wrong number of component ids.
    #[error("Exactly {expected} document ids are required, got {got}.")]
    InvalidComponentCount { expected: usize, got: usize },

    /// A component id did not resolve to a stored document.
    #[error("Document not found: '{id}'")]
    ComponentNotFound { id: String },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The engine exceeded its wall-clock budget and was killed.
    #[error("Conversion timed out after {secs}s; the engine process was terminated.")]
    ConversionTimeout { secs: u64 },

    /// The engine ran but failed; carries its diagnostic output.
    #[error("Conversion failed: {detail}")]
    ConversionFailed { detail: String },

    /// The engine executable could not be launched at all.
    ///
    /// Distinct from [`DocpressError::ConversionFailed`]: this is a deployment
    /// defect (missing binary or runtime), not bad input.
    #[error("Conversion engine '{program}' not found.\nCheck the engine command is installed and on PATH.")]
    ConversionEngineUnavailable { program: String },

    /// The engine exited successfully but produced no HTML artifact.
    #[error("Engine produced no HTML output.")]
    NoOutputProduced,

    // ── Storage errors ────────────────────────────────────────────────────
    /// The document store rejected an operation. `detail` is intentionally
    /// generic; the underlying cause is logged, not returned.
    #[error("Failed to persist document: {detail}")]
    PersistenceFailed { detail: String },

    /// No store connection string was configured.
    #[error("Document store not configured.\nSet a store URL (e.g. memory: or file:<dir>).")]
    StoreNotConfigured,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocpressError {
    /// Whether the error was caused by the request rather than the service.
    ///
    /// A transport layer uses this to choose between a 4xx and a 5xx status;
    /// the CLI uses it to decide whether to suggest checking the deployment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocpressError::NoInputProvided
                | DocpressError::EmptyInput
                | DocpressError::InputTooLarge { .. }
                | DocpressError::UnsupportedInputType { .. }
                | DocpressError::InvalidInput { .. }
                | DocpressError::InvalidComponentCount { .. }
                | DocpressError::ComponentNotFound { .. }
        )
    }
}
