//! Pipeline stages for conversion orchestration.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and the engine strategy can change without touching validation
//! or sanitisation.
//!
//! ## Data Flow
//!
//! ```text
//! request ──▶ normalize ──▶ engine ──▶ discover ──▶ sanitize
//! (file/text/url) (scratch)  (convert)  (artifacts)  (clean bodies)
//! ```
//!
//! 1. [`normalize`] — classify the request and stage it into a per-call
//!    scratch directory (or pass the URL through untouched)
//! 2. [`engine`]    — the [`engine::ConversionEngine`] seam plus the
//!    subprocess adapter with its timeout and exit-code classification
//! 3. [`discover`]  — locate the HTML/Markdown artifacts the engine left
//!    under the scratch tree, in a deterministic order
//! 4. [`sanitize`]  — lossy UTF-8 decode plus NUL stripping, applied
//!    uniformly for both engine strategies
//! 5. [`invoke`]    — glue the above into `ConvertedDocument`

pub mod discover;
pub mod engine;
pub mod invoke;
pub mod normalize;
pub mod sanitize;
