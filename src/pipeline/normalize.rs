//! Input normalization: turn a heterogeneous [`ConvertRequest`] into one
//! canonical, engine-ready shape.
//!
//! Callers hand us one of three things: an uploaded file, raw text, or a
//! URL. Downstream stages should not care which. This stage classifies
//! the request, validates it, and stages local material into a per-call
//! scratch directory that doubles as the engine's work root.
//!
//! ## Why stage text as a file?
//!
//! Pasted text is written verbatim to `input.md` inside the scratch
//! directory so the engine sees a file path exactly as it would for an
//! upload. That keeps the engine contract to "a path or a URL" and means
//! the text variant needs no special handling anywhere past this point.
//!
//! ## Scratch lifetime
//!
//! [`NormalizedInput`] owns the scratch [`TempDir`]; dropping it removes
//! the staged input and every artifact the engine wrote beneath it. URL
//! inputs stage nothing but still allocate the scratch directory, because
//! the engine needs a work root regardless of where the input lives.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::config::OrchestratorConfig;
use crate::document::{ConvertRequest, SourceType};
use crate::error::DocpressError;

/// File extensions (dotted, lowercase) accepted for uploads.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".docx", ".md", ".markdown", ".txt"];

// ─────────────────────────── Normalized Input ───────────────────────────

/// A validated, staged input ready for the conversion engine.
///
/// Owns the scratch directory for the whole conversion call. Keep it
/// alive until the engine's artifacts have been read into memory.
pub struct NormalizedInput {
    source_type: SourceType,
    /// What the engine receives as its input argument: the staged file
    /// path for local material, the trimmed URL otherwise.
    input_arg: String,
    staged_input: Option<PathBuf>,
    input_name: Option<String>,
    scratch: TempDir,
}

impl NormalizedInput {
    /// Scratch directory serving as the engine's work root.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// The input argument to pass to the engine.
    pub fn input_arg(&self) -> &str {
        &self.input_arg
    }

    /// Path of the staged input file, if the input was staged locally.
    ///
    /// Artifact discovery uses this to avoid mistaking the input itself
    /// for an engine output.
    pub fn staged_input(&self) -> Option<&Path> {
        self.staged_input.as_deref()
    }

    /// Source classification decided at normalization time.
    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    /// Original file name of an upload, for provenance metadata.
    pub fn input_name(&self) -> Option<&str> {
        self.input_name.as_deref()
    }
}

impl std::fmt::Debug for NormalizedInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedInput")
            .field("source_type", &self.source_type)
            .field("input_arg", &self.input_arg)
            .field("staged_input", &self.staged_input)
            .field("input_name", &self.input_name)
            .field("scratch", &self.scratch.path())
            .finish()
    }
}

// ───────────────────────────── Normalization ────────────────────────────

/// Validate a [`ConvertRequest`] and stage it for conversion.
///
/// Precedence when several variants are populated: file, then text, then
/// URL. An entirely empty request fails with
/// [`DocpressError::NoInputProvided`] before any scratch allocation.
pub async fn normalize(
    request: &ConvertRequest,
    config: &OrchestratorConfig,
) -> Result<NormalizedInput, DocpressError> {
    if request.file.is_none() && request.text.is_none() && request.url.is_none() {
        return Err(DocpressError::NoInputProvided);
    }

    // Allocated up front: every variant needs a work root for the engine,
    // and an early error return drops (and removes) it automatically.
    let scratch = create_scratch(config.scratch_root.as_deref())?;

    if let Some(file) = &request.file {
        let extension = dotted_extension(&file.name);
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(DocpressError::UnsupportedInputType { extension });
        }
        let staged = scratch.path().join(format!("input{extension}"));
        tokio::fs::write(&staged, &file.bytes)
            .await
            .map_err(|e| DocpressError::Internal(format!("failed to stage upload: {e}")))?;
        debug!(
            "staged upload: name={} bytes={} path={}",
            file.name,
            file.bytes.len(),
            staged.display()
        );
        let bare = extension.trim_start_matches('.');
        return Ok(NormalizedInput {
            source_type: SourceType::from_extension(bare),
            input_arg: staged.display().to_string(),
            staged_input: Some(staged),
            input_name: Some(file.name.clone()),
            scratch,
        });
    }

    if let Some(text) = &request.text {
        if text.trim().is_empty() {
            return Err(DocpressError::EmptyInput);
        }
        let chars = text.chars().count();
        if chars > config.max_text_chars {
            return Err(DocpressError::InputTooLarge {
                chars,
                max: config.max_text_chars,
            });
        }
        let staged = scratch.path().join("input.md");
        tokio::fs::write(&staged, text)
            .await
            .map_err(|e| DocpressError::Internal(format!("failed to stage text: {e}")))?;
        debug!("staged text: chars={} path={}", chars, staged.display());
        return Ok(NormalizedInput {
            source_type: SourceType::Text,
            input_arg: staged.display().to_string(),
            staged_input: Some(staged),
            input_name: None,
            scratch,
        });
    }

    // Checked up front, so `url` must be populated here.
    let url = request.url.as_deref().unwrap_or_default().trim();
    if url.is_empty() {
        return Err(DocpressError::EmptyInput);
    }
    debug!("passing url through unstaged: {url}");
    Ok(NormalizedInput {
        source_type: SourceType::Url,
        input_arg: url.to_string(),
        staged_input: None,
        input_name: None,
        scratch,
    })
}

/// Lowercased, dot-prefixed extension of `name`, or `""` when absent.
fn dotted_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn create_scratch(root: Option<&Path>) -> Result<TempDir, DocpressError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("docpress-");
    let created = match root {
        Some(root) => {
            std::fs::create_dir_all(root).map_err(|e| {
                DocpressError::Internal(format!(
                    "failed to create scratch root {}: {e}",
                    root.display()
                ))
            })?;
            builder.tempdir_in(root)
        }
        None => builder.tempdir(),
    };
    created.map_err(|e| DocpressError::Internal(format!("failed to create scratch directory: {e}")))
}

// ─────────────────────────────── Tests ──────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FileUpload;

    fn config() -> OrchestratorConfig {
        OrchestratorConfig::default()
    }

    #[tokio::test]
    async fn empty_request_is_rejected() {
        let err = normalize(&ConvertRequest::default(), &config())
            .await
            .unwrap_err();
        assert!(matches!(err, DocpressError::NoInputProvided));
    }

    #[tokio::test]
    async fn stages_each_supported_extension() {
        for (name, expected) in [
            ("report.docx", SourceType::Docx),
            ("notes.md", SourceType::Md),
            ("notes.markdown", SourceType::Markdown),
            ("plain.txt", SourceType::Txt),
        ] {
            let request = ConvertRequest::from_file(name, b"content".to_vec());
            let input = normalize(&request, &config()).await.unwrap();
            assert_eq!(input.source_type(), expected, "for {name}");
            let staged = input.staged_input().expect("staged path");
            assert!(staged.starts_with(input.scratch_dir()));
            assert_eq!(std::fs::read(staged).unwrap(), b"content");
            assert_eq!(input.input_name(), Some(name));
        }
    }

    #[tokio::test]
    async fn upload_extension_is_case_insensitive() {
        let request = ConvertRequest::from_file("REPORT.DOCX", vec![1, 2, 3]);
        let input = normalize(&request, &config()).await.unwrap();
        assert_eq!(input.source_type(), SourceType::Docx);
        assert!(input.input_arg().ends_with("input.docx"));
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        for name in ["slides.pdf", "archive.tar.gz", "no_extension"] {
            let request = ConvertRequest::from_file(name, vec![0]);
            let err = normalize(&request, &config()).await.unwrap_err();
            assert!(
                matches!(err, DocpressError::UnsupportedInputType { .. }),
                "for {name}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn text_is_staged_verbatim_as_markdown() {
        let request = ConvertRequest::from_text("  # Heading\n\nbody  ");
        let input = normalize(&request, &config()).await.unwrap();
        assert_eq!(input.source_type(), SourceType::Text);
        let staged = input.staged_input().unwrap();
        assert_eq!(staged.file_name().unwrap(), "input.md");
        // Leading and trailing whitespace must survive staging.
        assert_eq!(
            std::fs::read_to_string(staged).unwrap(),
            "  # Heading\n\nbody  "
        );
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        for text in ["", "   ", "\n\t\n"] {
            let err = normalize(&ConvertRequest::from_text(text), &config())
                .await
                .unwrap_err();
            assert!(matches!(err, DocpressError::EmptyInput), "for {text:?}");
        }
    }

    #[tokio::test]
    async fn oversized_text_is_rejected() {
        let config = OrchestratorConfig::builder().max_text_chars(8).build().unwrap();
        let err = normalize(&ConvertRequest::from_text("123456789"), &config)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DocpressError::InputTooLarge { chars: 9, max: 8 }
        ));
        // Exactly at the ceiling is fine.
        normalize(&ConvertRequest::from_text("12345678"), &config)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn url_passes_through_trimmed() {
        let request = ConvertRequest::from_url("  https://example.com/doc  ");
        let input = normalize(&request, &config()).await.unwrap();
        assert_eq!(input.source_type(), SourceType::Url);
        assert_eq!(input.input_arg(), "https://example.com/doc");
        assert!(input.staged_input().is_none());
        // A work root is allocated even though nothing is staged.
        assert!(input.scratch_dir().is_dir());
    }

    #[tokio::test]
    async fn blank_url_is_rejected() {
        let err = normalize(&ConvertRequest::from_url("   "), &config())
            .await
            .unwrap_err();
        assert!(matches!(err, DocpressError::EmptyInput));
    }

    #[tokio::test]
    async fn file_takes_precedence_over_text_and_url() {
        let request = ConvertRequest {
            file: Some(FileUpload {
                name: "a.md".to_string(),
                bytes: b"# from file".to_vec(),
            }),
            text: Some("# from text".to_string()),
            url: Some("https://example.com".to_string()),
        };
        let input = normalize(&request, &config()).await.unwrap();
        assert_eq!(input.source_type(), SourceType::Md);

        let request = ConvertRequest {
            file: None,
            text: Some("# from text".to_string()),
            url: Some("https://example.com".to_string()),
        };
        let input = normalize(&request, &config()).await.unwrap();
        assert_eq!(input.source_type(), SourceType::Text);
    }

    #[tokio::test]
    async fn scratch_is_removed_on_drop() {
        let input = normalize(&ConvertRequest::from_text("# hi"), &config())
            .await
            .unwrap();
        let scratch = input.scratch_dir().to_path_buf();
        assert!(scratch.is_dir());
        drop(input);
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn scratch_lands_under_configured_root() {
        let root = tempfile::tempdir().unwrap();
        let config = OrchestratorConfig::builder()
            .scratch_root(root.path().join("work"))
            .build()
            .unwrap();
        let input = normalize(&ConvertRequest::from_text("# hi"), &config)
            .await
            .unwrap();
        assert!(input.scratch_dir().starts_with(root.path().join("work")));
        let name = input
            .scratch_dir()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert!(name.starts_with("docpress-"));
    }
}
