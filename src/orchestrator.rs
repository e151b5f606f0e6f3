//! The facade front ends talk to: convert, combine, fetch, health.
//!
//! The orchestrator owns nothing clever itself. It wires the pipeline
//! stages to the configured engine and store, mints document ids, and
//! shapes results as [`DocumentRef`]s carrying public URLs. Transport
//! layers (HTTP handlers, the CLI) stay thin because everything they
//! need is one method call here.
//!
//! A store is required for anything that persists, which is every
//! operation except [`Orchestrator::health`]. Running without one is a
//! valid configuration for smoke tests, and fails each call with
//! [`DocpressError::StoreNotConfigured`] rather than at startup.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::compose::Composer;
use crate::config::OrchestratorConfig;
use crate::document::{
    new_document_id, CombineOutcome, ConvertOptions, ConvertRequest, DocumentRef, StoredDocument,
};
use crate::error::DocpressError;
use crate::pipeline::engine::{CliEngine, ConversionEngine};
use crate::pipeline::invoke::invoke;
use crate::pipeline::normalize::normalize;
use crate::store::{self, DocumentStore, NewDocument};

/// Service liveness plus the store's reachability, when one is
/// configured.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<bool>,
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    store: Option<Arc<dyn DocumentStore>>,
    engine: Arc<dyn ConversionEngine>,
}

impl Orchestrator {
    /// Build from configuration: connect the store named by
    /// `store_url` (if any) and select the engine strategy.
    pub async fn new(config: OrchestratorConfig) -> Result<Self, DocpressError> {
        let store = match &config.store_url {
            Some(url) => Some(store::connect(url).await?),
            None => None,
        };
        Self::assemble(config, store)
    }

    /// Build with an already-open store, ignoring `store_url`.
    ///
    /// The injection point for deployments with their own
    /// [`DocumentStore`] backend, and for tests.
    pub fn with_store(
        config: OrchestratorConfig,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, DocpressError> {
        Self::assemble(config, Some(store))
    }

    fn assemble(
        config: OrchestratorConfig,
        store: Option<Arc<dyn DocumentStore>>,
    ) -> Result<Self, DocpressError> {
        let engine: Arc<dyn ConversionEngine> = match &config.engine {
            Some(engine) => Arc::clone(engine),
            None => Arc::new(CliEngine::new(
                config.engine_command.clone(),
                config.engine_timeout_secs,
            )?),
        };
        info!(
            "orchestrator ready: base_url={} store={} engine={}",
            config.public_base_url,
            if store.is_some() { "configured" } else { "none" },
            if config.engine.is_some() {
                "in-process"
            } else {
                "subprocess"
            },
        );
        Ok(Self {
            config,
            store,
            engine,
        })
    }

    fn store(&self) -> Result<&Arc<dyn DocumentStore>, DocpressError> {
        self.store.as_ref().ok_or(DocpressError::StoreNotConfigured)
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Public URL of a document's HTML rendition.
    pub fn public_url(&self, id: &str) -> String {
        format!("{}/d/{}.html", self.config.public_base_url, id)
    }

    /// Public URL of a document's Markdown rendition, where one exists.
    pub fn public_markdown_url(&self, id: &str) -> String {
        format!("{}/d/{}.md", self.config.public_base_url, id)
    }

    fn reference(&self, id: &str) -> DocumentRef {
        DocumentRef {
            id: id.to_string(),
            public_url: self.public_url(id),
        }
    }

    /// Convert one input end to end: normalize, run the engine, store
    /// the sanitized result under a fresh id.
    pub async fn convert(
        &self,
        request: &ConvertRequest,
        options: &ConvertOptions,
    ) -> Result<DocumentRef, DocpressError> {
        let store = self.store()?;

        let normalized = normalize(request, &self.config).await?;
        info!("convert: source_type={}", normalized.source_type());
        let input_name = normalized.input_name().map(str::to_string);

        let converted = invoke(&self.engine, &normalized, options).await?;
        // Artifacts are in memory now; the scratch tree can go before
        // any store I/O starts.
        drop(normalized);

        let id = new_document_id();
        let metadata = input_name.map(|name| serde_json::json!({ "input_name": name }));
        store
            .put(NewDocument {
                id: &id,
                source_type: converted.source_type.as_str(),
                html: &converted.html,
                markdown: converted.markdown.as_deref(),
                metadata: metadata.as_ref(),
            })
            .await?;
        info!("stored document {id} ({})", converted.source_type);

        Ok(self.reference(&id))
    }

    /// Combine three stored documents into a tabbed report document.
    pub async fn combine(
        &self,
        ids: &[String],
        titles: &[String],
        combined_title: &str,
    ) -> Result<CombineOutcome, DocpressError> {
        let store = self.store()?;
        let composer = Composer::new(Arc::clone(store), self.config.public_base_url.clone());
        let combined = composer.combine(ids, titles, combined_title).await?;
        let component_urls = combined
            .component_ids
            .iter()
            .map(|id| self.public_url(id))
            .collect();
        Ok(CombineOutcome {
            document: self.reference(&combined.id),
            component_urls,
        })
    }

    /// Fetch a stored document by id. Unknown ids are `Ok(None)`.
    pub async fn fetch(&self, id: &str) -> Result<Option<StoredDocument>, DocpressError> {
        self.store()?.get(id).await
    }

    /// Liveness plus store reachability. Never fails: an unreachable
    /// store is an answer (`store: Some(false)`), not an error.
    pub async fn health(&self) -> HealthReport {
        let store = match &self.store {
            Some(store) => Some(store.healthcheck().await.is_ok()),
            None => None,
        };
        HealthReport { ok: true, store }
    }
}

// ─────────────────────────────── Tests ──────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::engine::EngineOutput;
    use crate::pipeline::normalize::NormalizedInput;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEngine {
        calls: AtomicUsize,
    }

    impl CountingEngine {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ConversionEngine for CountingEngine {
        async fn convert(
            &self,
            _input: &NormalizedInput,
            _options: &ConvertOptions,
        ) -> Result<EngineOutput, DocpressError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EngineOutput {
                html: b"<p>converted</p>".to_vec(),
                markdown: Some(b"converted".to_vec()),
            })
        }
    }

    fn config_with(engine: Arc<CountingEngine>) -> OrchestratorConfig {
        OrchestratorConfig::builder()
            .public_base_url("http://localhost:8000")
            .engine(engine)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn convert_mints_id_and_public_url() {
        let engine = CountingEngine::new();
        let store = Arc::new(MemoryStore::new());
        let orchestrator =
            Orchestrator::with_store(config_with(engine.clone()), store.clone()).unwrap();

        let doc = orchestrator
            .convert(
                &ConvertRequest::from_text("# hi"),
                &ConvertOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(doc.id.len(), 32);
        assert_eq!(
            doc.public_url,
            format!("http://localhost:8000/d/{}.html", doc.id)
        );
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);

        let stored = orchestrator.fetch(&doc.id).await.unwrap().expect("stored");
        assert_eq!(stored.html, "<p>converted</p>");
        assert_eq!(stored.source_type, "text");
        // Text input has no filename to record.
        assert!(stored.metadata.is_none());
    }

    #[tokio::test]
    async fn convert_records_upload_name_in_metadata() {
        let engine = CountingEngine::new();
        let store = Arc::new(MemoryStore::new());
        let orchestrator = Orchestrator::with_store(config_with(engine), store).unwrap();

        let request = ConvertRequest::from_file("q3-report.docx", b"bytes".to_vec());
        let doc = orchestrator
            .convert(&request, &ConvertOptions::default())
            .await
            .unwrap();
        let stored = orchestrator.fetch(&doc.id).await.unwrap().unwrap();
        assert_eq!(stored.metadata.unwrap()["input_name"], "q3-report.docx");
        assert_eq!(stored.source_type, "docx");
    }

    #[tokio::test]
    async fn operations_without_a_store_are_rejected_before_work() {
        let engine = CountingEngine::new();
        let orchestrator = Orchestrator::new(config_with(engine.clone())).await.unwrap();

        let err = orchestrator
            .convert(
                &ConvertRequest::from_text("# hi"),
                &ConvertOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DocpressError::StoreNotConfigured));

        let ids: Vec<String> = (0..3).map(|_| new_document_id()).collect();
        let err = orchestrator.combine(&ids, &[], "").await.unwrap_err();
        assert!(matches!(err, DocpressError::StoreNotConfigured));

        let err = orchestrator.fetch(&ids[0]).await.unwrap_err();
        assert!(matches!(err, DocpressError::StoreNotConfigured));

        // The engine never ran.
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn health_reports_store_presence() {
        let engine = CountingEngine::new();
        let orchestrator = Orchestrator::new(config_with(engine.clone())).await.unwrap();
        let report = orchestrator.health().await;
        assert!(report.ok);
        assert!(report.store.is_none());

        let store = Arc::new(MemoryStore::new());
        let orchestrator = Orchestrator::with_store(config_with(engine), store).unwrap();
        let report = orchestrator.health().await;
        assert!(report.ok);
        assert_eq!(report.store, Some(true));
    }

    #[tokio::test]
    async fn markdown_url_swaps_the_extension() {
        let engine = CountingEngine::new();
        let orchestrator = Orchestrator::new(config_with(engine)).await.unwrap();
        let id = new_document_id();
        assert!(orchestrator.public_url(&id).ends_with(&format!("{id}.html")));
        assert!(orchestrator
            .public_markdown_url(&id)
            .ends_with(&format!("{id}.md")));
    }
}
