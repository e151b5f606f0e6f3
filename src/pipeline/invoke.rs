//! Run the engine against a normalized input and assemble the final
//! [`ConvertedDocument`].
//!
//! Sanitisation lives here, after the engine seam, so both engine
//! strategies get identical treatment: lossy UTF-8 decode and NUL
//! stripping on every body, and the guarantee that a successful
//! conversion always carries non-empty HTML.

use std::sync::Arc;

use tracing::info;

use crate::document::{ConvertOptions, ConvertedDocument};
use crate::error::DocpressError;
use crate::pipeline::engine::ConversionEngine;
use crate::pipeline::normalize::NormalizedInput;
use crate::pipeline::sanitize;

/// Convert a normalized input into clean document bodies.
///
/// The source type was decided at normalization time and is carried
/// through unchanged; an engine cannot reclassify its input.
pub async fn invoke(
    engine: &Arc<dyn ConversionEngine>,
    input: &NormalizedInput,
    options: &ConvertOptions,
) -> Result<ConvertedDocument, DocpressError> {
    let output = engine.convert(input, options).await?;

    let html = sanitize::clean_body(&output.html);
    if html.is_empty() {
        // A present-but-empty artifact breaks the "HTML is always
        // available" contract just as much as a missing one.
        return Err(DocpressError::NoOutputProduced);
    }
    let markdown = output.markdown.as_deref().map(sanitize::clean_body);

    let source_type = input.source_type();
    info!(
        "conversion complete: source_type={} html_chars={} markdown_chars={}",
        source_type,
        html.chars().count(),
        markdown
            .as_ref()
            .map(|m| m.chars().count().to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(ConvertedDocument {
        html,
        markdown,
        source_type,
    })
}

// ─────────────────────────────── Tests ──────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::document::{ConvertRequest, SourceType};
    use crate::pipeline::engine::EngineOutput;
    use crate::pipeline::normalize::normalize;
    use async_trait::async_trait;

    struct FixedEngine {
        html: Vec<u8>,
        markdown: Option<Vec<u8>>,
    }

    #[async_trait]
    impl ConversionEngine for FixedEngine {
        async fn convert(
            &self,
            _input: &NormalizedInput,
            _options: &ConvertOptions,
        ) -> Result<EngineOutput, DocpressError> {
            Ok(EngineOutput {
                html: self.html.clone(),
                markdown: self.markdown.clone(),
            })
        }
    }

    fn engine(html: &[u8], markdown: Option<&[u8]>) -> Arc<dyn ConversionEngine> {
        Arc::new(FixedEngine {
            html: html.to_vec(),
            markdown: markdown.map(<[u8]>::to_vec),
        })
    }

    async fn text_input() -> NormalizedInput {
        normalize(
            &ConvertRequest::from_text("# hi"),
            &OrchestratorConfig::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn bodies_are_sanitised() {
        let engine = engine(b"<p>a\x00b</p>\xff", Some(b"a\x00b"));
        let input = text_input().await;
        let doc = invoke(&engine, &input, &ConvertOptions::default())
            .await
            .unwrap();
        assert!(!doc.html.contains('\0'));
        assert!(doc.html.contains('\u{FFFD}'));
        assert_eq!(doc.markdown.as_deref(), Some("ab"));
    }

    #[tokio::test]
    async fn source_type_comes_from_normalization() {
        let engine = engine(b"<p>ok</p>", None);
        let input = text_input().await;
        let doc = invoke(&engine, &input, &ConvertOptions::default())
            .await
            .unwrap();
        assert_eq!(doc.source_type, SourceType::Text);
        assert!(doc.markdown.is_none());
    }

    #[tokio::test]
    async fn empty_html_is_no_output() {
        let engine = engine(b"", None);
        let input = text_input().await;
        let err = invoke(&engine, &input, &ConvertOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DocpressError::NoOutputProduced));
    }

    #[tokio::test]
    async fn nul_only_html_is_no_output() {
        let engine = engine(b"\x00\x00", None);
        let input = text_input().await;
        let err = invoke(&engine, &input, &ConvertOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DocpressError::NoOutputProduced));
    }
}
