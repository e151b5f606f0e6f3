//! Multi-document composition: several stored documents behind one
//! tabbed HTML shell.
//!
//! The shell is a single self-contained page: inline styles, inline
//! script, no external assets, so it can be stored and served exactly
//! like any converted document. Component documents are shown through an
//! iframe rather than being inlined, which keeps their styles and
//! scripts isolated from the shell (and from each other) and lets the
//! browser cache each component independently.
//!
//! ## Injection
//!
//! Titles are user input headed straight into markup. Every interpolated
//! string, titles and ids and URLs alike, passes through [`escape_html`]
//! first; the renderer has no unescaped interpolation path.
//!
//! ## Scroll restoration
//!
//! Switching tabs reloads the frame, which would lose the reader's place
//! in a long report. The shell records the outgoing document's scroll
//! offset keyed by its id before each swap and restores it once the
//! returning document finishes loading.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;
use tracing::info;

use crate::document::{new_document_id, CombinedDocument, SourceType};
use crate::error::DocpressError;
use crate::store::{DocumentStore, NewDocument};

/// Fixed component count of the current report layout.
pub const REQUIRED_COMPONENTS: usize = 3;

const DEFAULT_COMBINED_TITLE: &str = "Combined Report";

// ────────────────────────────── Escaping ────────────────────────────────

/// Escape a string for interpolation into HTML text or attribute
/// positions.
///
/// Ampersand must go first or the other replacements would be
/// double-escaped.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Exactly one title per id: supplied entries verbatim, missing
/// positions filled with `Report {n}`, extras dropped.
fn resolve_titles(supplied: &[String], count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match supplied.get(i) {
            Some(title) => title.clone(),
            None => format!("Report {}", i + 1),
        })
        .collect()
}

// ─────────────────────────────── Shell ──────────────────────────────────

struct TabComponent {
    id: String,
    title: String,
    url: String,
}

const SHELL_STYLE: &str = r#"    :root { color-scheme: light; }
    * { box-sizing: border-box; }
    body {
      margin: 0; height: 100vh; display: flex; flex-direction: column;
      font-family: -apple-system, "Segoe UI", Roboto, sans-serif;
      background: #f5f5f4;
    }
    .masthead { padding: 0.6rem 1rem 0; }
    .masthead h1 { margin: 0 0 0.4rem; font-size: 1.1rem; font-weight: 600; color: #1c1917; }
    .tabs { display: flex; gap: 0.25rem; padding: 0 1rem; border-bottom: 1px solid #d6d3d1; }
    .tab {
      appearance: none; border: 1px solid #d6d3d1; border-bottom: none;
      border-radius: 6px 6px 0 0; background: #e7e5e4; color: #44403c;
      padding: 0.45rem 1rem; font-size: 0.9rem; cursor: pointer;
      max-width: 18rem; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;
    }
    .tab:hover { background: #fafaf9; }
    .tab.is-active { background: #ffffff; color: #1c1917; font-weight: 600; position: relative; top: 1px; }
    .viewer-pane { flex: 1; display: flex; flex-direction: column; }
    #viewer { flex: 1; width: 100%; border: none; background: #ffffff; }
    .fallback { margin: 1rem; }
"#;

// ES5 on purpose: the shell must run in anything that can render the
// converted documents themselves.
const SHELL_SCRIPT: &str = r#"    (function () {
      var frame = document.getElementById('viewer');
      var tabs = Array.prototype.slice.call(document.querySelectorAll('.tab'));
      var offsets = {};
      var current = tabs.length ? tabs[0].getAttribute('data-id') : null;
      var pending = null;

      function rememberScroll() {
        if (current === null) return;
        try { offsets[current] = frame.contentWindow.pageYOffset; } catch (err) { /* cross-origin */ }
      }

      function select(tab) {
        var id = tab.getAttribute('data-id');
        if (id === current) return;
        rememberScroll();
        tabs.forEach(function (t) {
          t.classList.remove('is-active');
          t.setAttribute('aria-selected', 'false');
        });
        tab.classList.add('is-active');
        tab.setAttribute('aria-selected', 'true');
        current = id;
        pending = Object.prototype.hasOwnProperty.call(offsets, id) ? offsets[id] : null;
        frame.src = tab.getAttribute('data-url');
      }

      frame.addEventListener('load', function () {
        if (pending === null) return;
        try { frame.contentWindow.scrollTo(0, pending); } catch (err) { /* cross-origin */ }
        pending = null;
      });

      tabs.forEach(function (tab) {
        tab.addEventListener('click', function () { select(tab); });
      });

      document.addEventListener('keydown', function (ev) {
        var target = ev.target;
        if (target && (target.tagName === 'INPUT' || target.tagName === 'TEXTAREA')) return;
        var n = parseInt(ev.key, 10);
        if (!isNaN(n) && n >= 1 && n <= tabs.length) select(tabs[n - 1]);
      });
    })();
"#;

/// Render the tabbed shell around the given components.
///
/// Generic over the component count even though combine currently pins
/// it to [`REQUIRED_COMPONENTS`]; the renderer is not where that rule
/// lives.
fn render_tabbed_shell(combined_title: &str, components: &[TabComponent]) -> String {
    let title = escape_html(combined_title);

    let mut buttons = String::new();
    for (i, component) in components.iter().enumerate() {
        let active = if i == 0 { " is-active" } else { "" };
        let selected = if i == 0 { "true" } else { "false" };
        buttons.push_str(&format!(
            "    <button class=\"tab{active}\" role=\"tab\" aria-selected=\"{selected}\" \
             data-id=\"{id}\" data-url=\"{url}\">{label}</button>\n",
            id = escape_html(&component.id),
            url = escape_html(&component.url),
            label = escape_html(&component.title),
        ));
    }

    let mut fallback = String::new();
    for component in components {
        fallback.push_str(&format!(
            "        <li><a href=\"{url}\">{label}</a></li>\n",
            url = escape_html(&component.url),
            label = escape_html(&component.title),
        ));
    }

    let first_url = components
        .first()
        .map(|c| escape_html(&c.url))
        .unwrap_or_default();
    let first_title = components
        .first()
        .map(|c| escape_html(&c.title))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <style>
{style}  </style>
</head>
<body>
  <header class="masthead">
    <h1>{title}</h1>
  </header>
  <nav class="tabs" role="tablist" aria-label="Documents">
{buttons}  </nav>
  <main class="viewer-pane">
    <noscript>
      <ul class="fallback">
{fallback}      </ul>
    </noscript>
    <iframe id="viewer" src="{first_url}" title="{first_title}"></iframe>
  </main>
  <script>
{script}  </script>
</body>
</html>
"#,
        title = title,
        style = SHELL_STYLE,
        buttons = buttons,
        fallback = fallback,
        first_url = first_url,
        first_title = first_title,
        script = SHELL_SCRIPT,
    )
}

// ────────────────────────────── Composer ────────────────────────────────

/// Builds and persists combined documents.
pub struct Composer {
    store: Arc<dyn DocumentStore>,
    public_base_url: String,
}

impl Composer {
    pub fn new(store: Arc<dyn DocumentStore>, public_base_url: impl Into<String>) -> Self {
        Self {
            store,
            public_base_url: public_base_url.into(),
        }
    }

    fn component_url(&self, id: &str) -> String {
        format!("{}/d/{}.html", self.public_base_url, id)
    }

    /// Combine exactly [`REQUIRED_COMPONENTS`] stored documents into a
    /// new tabbed document.
    ///
    /// Nothing is persisted until every component has been confirmed to
    /// exist. Lookups run concurrently, but a missing component is
    /// always reported for the first absent id in request order, so the
    /// error does not depend on lookup timing.
    pub async fn combine(
        &self,
        ids: &[String],
        titles: &[String],
        combined_title: &str,
    ) -> Result<CombinedDocument, DocpressError> {
        if ids.len() != REQUIRED_COMPONENTS {
            return Err(DocpressError::InvalidComponentCount {
                expected: REQUIRED_COMPONENTS,
                got: ids.len(),
            });
        }

        let lookups = join_all(ids.iter().map(|id| self.store.get(id))).await;
        for (id, found) in ids.iter().zip(lookups) {
            if found?.is_none() {
                return Err(DocpressError::ComponentNotFound { id: id.clone() });
            }
        }

        let component_titles = resolve_titles(titles, ids.len());
        let combined_title = match combined_title.trim() {
            "" => DEFAULT_COMBINED_TITLE.to_string(),
            trimmed => trimmed.to_string(),
        };

        let components: Vec<TabComponent> = ids
            .iter()
            .zip(&component_titles)
            .map(|(id, title)| TabComponent {
                id: id.clone(),
                title: title.clone(),
                url: self.component_url(id),
            })
            .collect();
        let html = render_tabbed_shell(&combined_title, &components);

        let id = new_document_id();
        let metadata = json!({
            "type": "combined",
            "component_ids": ids,
            "component_titles": component_titles,
            "combined_title": combined_title,
        });
        self.store
            .put(NewDocument {
                id: &id,
                source_type: SourceType::Combined.as_str(),
                html: &html,
                markdown: None,
                metadata: Some(&metadata),
            })
            .await?;
        info!(
            "combined [{}] into {id} under title {combined_title:?}",
            ids.join(", ")
        );

        Ok(CombinedDocument {
            id,
            component_ids: ids.to_vec(),
            component_titles,
            combined_title,
        })
    }
}

// ─────────────────────────────── Tests ──────────────────────────────────
