//! Configuration for the conversion orchestrator.
//!
//! Every process-wide knob (public base URL, store connection string, engine
//! selection, timeout, size ceiling, scratch root) lives in one
//! [`OrchestratorConfig`] passed to the orchestrator at construction time.
//! Nothing deeper in the call tree reads the environment, which keeps tests
//! deterministic: build a config, build an orchestrator, done.
//!
//! # Design choice: builder over constructor
//! Callers usually set one or two fields (a store URL, maybe an engine
//! command) and want documented defaults for the rest; the builder makes that
//! explicit and validates the result in one place.

use crate::error::DocpressError;
use crate::pipeline::engine::ConversionEngine;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default subprocess command for the conversion engine.
pub const DEFAULT_ENGINE_COMMAND: &[&str] = &["docpress-engine"];

/// Configuration for [`crate::Orchestrator`].
///
/// Built via [`OrchestratorConfig::builder()`] or using
/// [`OrchestratorConfig::default()`].
///
/// # Example
/// ```rust
/// use docpress::OrchestratorConfig;
///
/// let config = OrchestratorConfig::builder()
///     .store_url("memory:")
///     .public_base_url("https://docs.example.com")
///     .engine_timeout_secs(60)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct OrchestratorConfig {
    /// Base URL prepended to `/d/<id>.html` when building public document
    /// URLs. Default: `http://localhost:8000`. A trailing slash is stripped
    /// so URL assembly never produces `//d/`.
    pub public_base_url: String,

    /// Document store connection string (`memory:` or `file:<dir>`).
    ///
    /// `None` means no store is configured: the orchestrator constructs fine
    /// (a deployment may want conversion-free endpoints up for diagnostics)
    /// but every convert/combine call fails with
    /// [`DocpressError::StoreNotConfigured`].
    pub store_url: Option<String>,

    /// Pre-built in-process conversion engine. Takes precedence over
    /// `engine_command`.
    ///
    /// This is the in-process adapter strategy: the caller constructs an
    /// engine (or a test double) and the orchestrator calls it directly, no
    /// subprocess involved. When `None`, the subprocess strategy built from
    /// `engine_command` is used instead.
    pub engine: Option<Arc<dyn ConversionEngine>>,

    /// Subprocess engine command: program plus leading global arguments,
    /// e.g. `["docpress-engine"]` or `["uv", "run", "docpress-engine"]`.
    /// Scratch-dir and formatting arguments are appended per call.
    pub engine_command: Vec<String>,

    /// Hard wall-clock budget for one engine invocation, in seconds.
    /// Default: 30.
    ///
    /// On expiry the child process is killed and reaped before
    /// [`DocpressError::ConversionTimeout`] is returned — a hung engine must
    /// not leak a process per request.
    pub engine_timeout_secs: u64,

    /// Ceiling on raw-text input, in characters. Default: 2,000,000.
    ///
    /// Large pastes are almost always accidental (a binary dropped into a
    /// text field); the ceiling bounds scratch-file size and engine work
    /// before any file is written.
    pub max_text_chars: usize,

    /// Directory under which per-call scratch directories are created.
    /// `None` uses the system temp dir.
    pub scratch_root: Option<PathBuf>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:8000".to_string(),
            store_url: None,
            engine: None,
            engine_command: DEFAULT_ENGINE_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
            engine_timeout_secs: 30,
            max_text_chars: 2_000_000,
            scratch_root: None,
        }
    }
}

impl fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field("public_base_url", &self.public_base_url)
            .field("store_url", &self.store_url.as_ref().map(|_| "<set>"))
            .field("engine", &self.engine.as_ref().map(|_| "<dyn ConversionEngine>"))
            .field("engine_command", &self.engine_command)
            .field("engine_timeout_secs", &self.engine_timeout_secs)
            .field("max_text_chars", &self.max_text_chars)
            .field("scratch_root", &self.scratch_root)
            .finish()
    }
}

impl OrchestratorConfig {
    /// Create a new builder for `OrchestratorConfig`.
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OrchestratorConfig`].
pub struct OrchestratorConfigBuilder {
    config: OrchestratorConfig,
}

impl OrchestratorConfigBuilder {
    pub fn public_base_url(mut self, base: impl Into<String>) -> Self {
        self.config.public_base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn store_url(mut self, url: impl Into<String>) -> Self {
        self.config.store_url = Some(url.into());
        self
    }

    /// Use a pre-built in-process engine instead of a subprocess.
    pub fn engine(mut self, engine: Arc<dyn ConversionEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn engine_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.engine_command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn engine_timeout_secs(mut self, secs: u64) -> Self {
        self.config.engine_timeout_secs = secs.max(1);
        self
    }

    pub fn max_text_chars(mut self, chars: usize) -> Self {
        self.config.max_text_chars = chars.max(1);
        self
    }

    pub fn scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.scratch_root = Some(root.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OrchestratorConfig, DocpressError> {
        let c = &self.config;
        if c.public_base_url.trim().is_empty() {
            return Err(DocpressError::InvalidConfig(
                "public_base_url must not be empty".into(),
            ));
        }
        if c.engine.is_none() && c.engine_command.is_empty() {
            return Err(DocpressError::InvalidConfig(
                "engine_command must name a program when no in-process engine is set".into(),
            ));
        }
        if c.engine_timeout_secs == 0 {
            return Err(DocpressError::InvalidConfig(
                "engine_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = OrchestratorConfig::default();
        assert_eq!(c.public_base_url, "http://localhost:8000");
        assert_eq!(c.engine_timeout_secs, 30);
        assert_eq!(c.max_text_chars, 2_000_000);
        assert_eq!(c.engine_command, vec!["docpress-engine".to_string()]);
        assert!(c.store_url.is_none());
        assert!(c.engine.is_none());
        assert!(c.scratch_root.is_none());
    }

    #[test]
    fn builder_strips_trailing_slash() {
        let c = OrchestratorConfig::builder()
            .public_base_url("https://docs.example.com/")
            .build()
            .unwrap();
        assert_eq!(c.public_base_url, "https://docs.example.com");
    }

    #[test]
    fn builder_rejects_empty_engine_command() {
        let err = OrchestratorConfig::builder()
            .engine_command(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, DocpressError::InvalidConfig(_)));
    }

    #[test]
    fn timeout_floor_is_one_second() {
        let c = OrchestratorConfig::builder()
            .engine_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.engine_timeout_secs, 1);
    }

    #[test]
    fn debug_masks_engine_and_store_url() {
        let c = OrchestratorConfig::builder()
            .store_url("file:/var/lib/docpress")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<set>"));
        assert!(!dbg.contains("/var/lib/docpress"));
    }
}
