//! # docpress
//!
//! Orchestrate document conversion and compose multi-document reports.
//!
//! ## Why this crate?
//!
//! Format converters are the easy part; running one reliably is not.
//! Inputs arrive as uploads, pasted text, or URLs; converters hang, crash,
//! emit bytes that are not quite UTF-8, and scatter artifacts across their
//! work directory. This crate owns all of that once: it normalizes any
//! input into an engine-ready shape, invokes the engine with a hard
//! timeout, finds and sanitizes whatever the engine produced, persists it
//! under a stable id, and can weave three stored documents into a single
//! tabbed HTML report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file / text / url
//!  │
//!  ├─ 1. Normalize  validate, stage into a scratch dir (engine work root)
//!  ├─ 2. Engine     in-process trait object or subprocess (30s timeout)
//!  ├─ 3. Discover   first .html artifact required, first .md optional
//!  ├─ 4. Sanitize   lossy UTF-8 decode, strip NUL characters
//!  └─ 5. Store      put under a fresh 32-hex id → public /d/<id>.html URL
//! ```
//!
//! Composition sits beside the pipeline: `combine` checks that all three
//! component documents exist, renders a self-contained tabbed shell
//! (iframe viewer, per-tab scroll memory, numeric-key shortcuts, noscript
//! links), and stores it like any other document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docpress::{ConvertOptions, ConvertRequest, Orchestrator, OrchestratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OrchestratorConfig::builder()
//!         .public_base_url("http://localhost:8000")
//!         .store_url("file:./documents")
//!         .engine_command(["docpress-engine"])
//!         .build()?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!
//!     let doc = orchestrator
//!         .convert(&ConvertRequest::from_text("# Hello\n\nWorld"), &ConvertOptions::default())
//!         .await?;
//!     println!("{}", doc.public_url);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docpress` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! docpress = { version = "0.3", default-features = false }
//! ```
//!
//! ## Engine Strategies
//!
//! | Strategy | Selected by | Use when |
//! |----------|-------------|----------|
//! | subprocess ([`CliEngine`]) | `engine_command` on the config (default) | The converter is an external CLI; crashes and hangs must not take the service down |
//! | in-process (`Arc<dyn ConversionEngine>`) | [`OrchestratorConfigBuilder::engine`] | The converter is a Rust library, or a test double |
//!
//! Orchestration behaves identically under both: same validation, same
//! sanitisation, same error taxonomy.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compose;
pub mod config;
pub mod document;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compose::{escape_html, Composer, REQUIRED_COMPONENTS};
pub use config::{OrchestratorConfig, OrchestratorConfigBuilder, DEFAULT_ENGINE_COMMAND};
pub use document::{
    new_document_id, CombineOutcome, CombinedDocument, ConvertOptions, ConvertRequest,
    ConvertedDocument, DocumentRef, FileUpload, SourceType, StoredDocument,
};
pub use error::DocpressError;
pub use orchestrator::{HealthReport, Orchestrator};
pub use pipeline::engine::{CliEngine, ConversionEngine, EngineOutput};
pub use pipeline::normalize::NormalizedInput;
pub use store::{DocumentStore, FileStore, MemoryStore, NewDocument};
