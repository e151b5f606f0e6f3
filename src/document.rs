//! Core data types shared across the conversion and composition paths.
//!
//! Request types mirror the transport's shape (all-optional input fields) so
//! the normalizer can own classification, including the "nothing was sent at
//! all" case. Result and record types are plain serialisable structs; the
//! store persists [`StoredDocument`] verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ── Requests ─────────────────────────────────────────────────────────────

/// An uploaded file: original filename plus raw bytes.
///
/// The filename is only used to derive the extension (and is recorded in the
/// stored document's metadata); the bytes are staged to a scratch file before
/// the engine ever sees them.
#[derive(Clone)]
pub struct FileUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// A conversion request as received from a front end.
///
/// Exactly one of the three fields is expected; when several are populated
/// the normalizer applies the precedence file > text > url, and when none is
/// populated it fails with [`crate::DocpressError::NoInputProvided`].
#[derive(Debug, Clone, Default)]
pub struct ConvertRequest {
    pub file: Option<FileUpload>,
    pub text: Option<String>,
    pub url: Option<String>,
}

impl ConvertRequest {
    /// Request carrying an uploaded file.
    pub fn from_file(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file: Some(FileUpload {
                name: name.into(),
                bytes,
            }),
            ..Self::default()
        }
    }

    /// Request carrying raw text (treated as Markdown by the engine).
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Request carrying a remote URL; fetching is the engine's job.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

/// Formatting options forwarded to the conversion engine.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Ask the engine to inject a title heading.
    pub add_title: bool,
    /// Extra CSS classes the engine should emit on the document body.
    pub add_classes: Option<String>,
    /// Skip output minification.
    pub no_minify: bool,
}

// ── Source types ─────────────────────────────────────────────────────────

/// Origin tag recorded with every stored document.
///
/// `Combined` never results from a conversion; it tags documents produced by
/// the composition engine. `Unknown` covers inputs whose extension could not
/// be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Docx,
    Md,
    Markdown,
    Txt,
    Text,
    Url,
    Combined,
    Unknown,
}

impl SourceType {
    /// Lowercase wire form, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Docx => "docx",
            SourceType::Md => "md",
            SourceType::Markdown => "markdown",
            SourceType::Txt => "txt",
            SourceType::Text => "text",
            SourceType::Url => "url",
            SourceType::Combined => "combined",
            SourceType::Unknown => "unknown",
        }
    }

    /// Classify a lowercase file extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "docx" => SourceType::Docx,
            "md" => SourceType::Md,
            "markdown" => SourceType::Markdown,
            "txt" => SourceType::Txt,
            _ => SourceType::Unknown,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Results ──────────────────────────────────────────────────────────────

/// A successful conversion: sanitized bodies plus the origin tag.
///
/// Invariants: `html` is non-empty and NUL-free; `markdown` is present only
/// when the engine produced a Markdown artifact, and is NUL-free when present.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedDocument {
    pub html: String,
    pub markdown: Option<String>,
    pub source_type: SourceType,
}

/// Stable handle to a stored document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRef {
    /// 32 lowercase hex characters (128-bit random).
    pub id: String,
    /// `<base>/d/<id>.html`
    pub public_url: String,
}

/// A document as persisted by (and read back from) the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub source_type: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// A freshly generated combined document, before being wrapped in a
/// [`DocumentRef`] by the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedDocument {
    pub id: String,
    pub component_ids: Vec<String>,
    pub component_titles: Vec<String>,
    pub combined_title: String,
}

/// Result of a combine call: the new document plus the component URLs,
/// returned together as a convenience for front ends.
#[derive(Debug, Clone, Serialize)]
pub struct CombineOutcome {
    pub document: DocumentRef,
    pub component_urls: Vec<String>,
}

// ── Identity ─────────────────────────────────────────────────────────────

/// Mint a fresh document id: 32 lowercase hex characters, 128 random bits.
///
/// Ids are never derived from content; converting the same input twice
/// yields two distinct documents.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
