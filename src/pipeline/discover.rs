//! Artifact discovery: find what the engine produced under its work root.
//!
//! The subprocess contract is deliberately loose about where outputs
//! land. Engines differ in their layout (`workspace/docs/`, `out/`, the
//! root itself), so rather than encode one layout we search the whole
//! scratch tree. This is the fragile step of the pipeline, which is why
//! the traversal order is pinned down:
//!
//! - directories are walked depth-first, entries in lexicographic order
//!   by file name, so "first match" is stable across platforms and runs
//! - the staged input file is excluded, or a text input staged as
//!   `input.md` would be reported as a Markdown artifact
//!
//! The first HTML file is mandatory. A clean exit with no HTML is still
//! a failure because callers rely on HTML always being present. The
//! first Markdown file is a bonus.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::DocpressError;

/// Extensions (lowercase, undotted) recognised as the HTML artifact.
pub const HTML_EXTENSIONS: &[&str] = &["html", "htm"];
/// Extensions (lowercase, undotted) recognised as the Markdown artifact.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Paths of the artifacts one engine run produced.
#[derive(Debug)]
pub struct DiscoveredArtifacts {
    pub html: PathBuf,
    pub markdown: Option<PathBuf>,
}

/// Search `root` for conversion artifacts, skipping `exclude` (the
/// staged input, when there is one).
///
/// Fails with [`DocpressError::NoOutputProduced`] when no HTML artifact
/// exists anywhere under `root`.
pub fn discover_artifacts(
    root: &Path,
    exclude: Option<&Path>,
) -> Result<DiscoveredArtifacts, DocpressError> {
    let mut found = Found::default();
    walk(root, exclude, &mut found).map_err(|e| {
        DocpressError::Internal(format!(
            "failed to scan work root {}: {e}",
            root.display()
        ))
    })?;

    match found.html {
        Some(html) => {
            debug!(
                "artifacts discovered: html={} markdown={}",
                html.display(),
                found
                    .markdown
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
            Ok(DiscoveredArtifacts {
                html,
                markdown: found.markdown,
            })
        }
        None => {
            warn!(
                "engine produced no html artifact under {}; tree: {:?}",
                root.display(),
                list_tree(root, 20)
            );
            Err(DocpressError::NoOutputProduced)
        }
    }
}

#[derive(Default)]
struct Found {
    html: Option<PathBuf>,
    markdown: Option<PathBuf>,
}

impl Found {
    fn complete(&self) -> bool {
        self.html.is_some() && self.markdown.is_some()
    }
}

fn walk(dir: &Path, exclude: Option<&Path>, found: &mut Found) -> io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        // Symlinks match neither branch: artifacts are plain files, and
        // following links risks cycles.
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&path, exclude, found)?;
        } else if file_type.is_file() {
            if exclude == Some(path.as_path()) {
                continue;
            }
            let Some(ext) = extension_lowercase(&path) else {
                continue;
            };
            if found.html.is_none() && HTML_EXTENSIONS.contains(&ext.as_str()) {
                found.html = Some(path);
            } else if found.markdown.is_none() && MARKDOWN_EXTENSIONS.contains(&ext.as_str()) {
                found.markdown = Some(path);
            }
        }
        if found.complete() {
            return Ok(());
        }
    }
    Ok(())
}

fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Up to `cap` paths under `root`, relative, for diagnostics only.
fn list_tree(root: &Path, cap: usize) -> Vec<String> {
    fn collect(dir: &Path, root: &Path, cap: usize, out: &mut Vec<String>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        let mut entries: Vec<_> = entries.flatten().collect();
        entries.sort_by_key(|entry| entry.file_name());
        for entry in entries {
            if out.len() >= cap {
                return;
            }
            let path = entry.path();
            let shown = path.strip_prefix(root).unwrap_or(&path);
            out.push(shown.display().to_string());
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                collect(&path, root, cap, out);
            }
        }
    }
    let mut out = Vec::new();
    collect(root, root, cap, &mut out);
    out
}

// ─────────────────────────────── Tests ──────────────────────────────────
