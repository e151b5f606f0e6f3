//! CLI binary for docpress.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `OrchestratorConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docpress::{ConvertOptions, ConvertRequest, Orchestrator, OrchestratorConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r##"EXAMPLES:
  # Convert a local file (engine binary must be on PATH)
  docpress --store-url file:./documents convert report.docx

  # Convert pasted text
  docpress --store-url file:./documents convert --text "# Hello"

  # Convert from a pipe
  cat notes.md | docpress --store-url file:./documents convert --stdin

  # Convert a URL, passing engine options through
  docpress --store-url file:./documents convert --url https://example.com/page --no-minify

  # Use a custom engine command
  docpress --engine "uv run convert-engine" --store-url file:./documents convert notes.md

  # Combine three stored documents into a tabbed report
  docpress --store-url file:./documents combine <ID> <ID> <ID> \
      --titles "Overview,Details,Appendix" --title "Q3 Review"

  # Print a stored document's HTML (or its Markdown rendition)
  docpress --store-url file:./documents get <ID>
  docpress --store-url file:./documents get <ID> --markdown -o out.md

  # Orchestrator and store health
  docpress --store-url file:./documents status

ENVIRONMENT VARIABLES:
  DOCPRESS_STORE_URL       Document store URL (memory: or file:<dir>)
  DOCPRESS_BASE_URL        Public base URL used in returned links
  DOCPRESS_ENGINE          Engine command, whitespace-split (e.g. "uv run engine")
  DOCPRESS_ENGINE_TIMEOUT  Engine timeout in seconds (default 30)
  DOCPRESS_SCRATCH_ROOT    Parent directory for per-call scratch workspaces
"##;

/// Convert documents and publish tabbed multi-document reports.
#[derive(Parser, Debug)]
#[command(
    name = "docpress",
    version,
    about = "Convert documents and publish tabbed multi-document reports",
    long_about = "Convert documents (uploads, pasted text, or URLs) to HTML and Markdown via a \
pluggable conversion engine, store them under stable ids, and combine stored documents into \
self-contained tabbed reports.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Document store URL: memory: or file:<dir>.
    #[arg(long, global = true, env = "DOCPRESS_STORE_URL")]
    store_url: Option<String>,

    /// Public base URL for returned document links.
    #[arg(
        long,
        global = true,
        env = "DOCPRESS_BASE_URL",
        default_value = "http://localhost:8000"
    )]
    base_url: String,

    /// Conversion engine command, whitespace-split.
    #[arg(long, global = true, env = "DOCPRESS_ENGINE")]
    engine: Option<String>,

    /// Engine timeout in seconds.
    #[arg(
        long,
        global = true,
        env = "DOCPRESS_ENGINE_TIMEOUT",
        default_value_t = 30
    )]
    engine_timeout: u64,

    /// Parent directory for per-call scratch workspaces.
    #[arg(long, global = true, env = "DOCPRESS_SCRATCH_ROOT")]
    scratch_root: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCPRESS_VERBOSE")]
    verbose: bool,

    /// Suppress everything except errors and results.
    #[arg(short, long, global = true, env = "DOCPRESS_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a file, text, or URL into a stored document.
    Convert {
        /// Local file to convert (.docx, .md, .markdown, .txt).
        input: Option<PathBuf>,

        /// Raw text to convert (staged as Markdown).
        #[arg(long, conflicts_with = "input")]
        text: Option<String>,

        /// Read the text to convert from standard input.
        #[arg(long, conflicts_with_all = ["input", "text"])]
        stdin: bool,

        /// URL to convert (fetched by the engine itself).
        #[arg(long, conflicts_with_all = ["input", "text", "stdin"])]
        url: Option<String>,

        /// Ask the engine to add a title block.
        #[arg(long)]
        add_title: bool,

        /// Extra CSS classes for the engine to emit.
        #[arg(long)]
        add_classes: Option<String>,

        /// Skip output minification.
        #[arg(long)]
        no_minify: bool,

        /// Print the stored document reference as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Combine three stored documents into a tabbed report.
    Combine {
        /// Component document ids (exactly three).
        #[arg(value_name = "ID", required = true)]
        ids: Vec<String>,

        /// Comma-separated tab titles; missing entries default to "Report N".
        #[arg(long, value_delimiter = ',')]
        titles: Vec<String>,

        /// Title of the combined report.
        #[arg(long, default_value = "")]
        title: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a stored document.
    Get {
        /// Document id (32 hex characters).
        id: String,

        /// Print the Markdown rendition instead of HTML.
        #[arg(long)]
        markdown: bool,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report orchestrator and store health.
    Status {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn wants_json(command: &Command) -> bool {
    matches!(
        command,
        Command::Convert { json: true, .. }
            | Command::Combine { json: true, .. }
            | Command::Status { json: true }
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // spinner and result lines are the feedback that matters here.
    let show_progress = !cli.quiet && !wants_json(&cli.command);
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let orchestrator = build_orchestrator(&cli).await?;

    match &cli.command {
        Command::Convert {
            input,
            text,
            stdin,
            url,
            add_title,
            add_classes,
            no_minify,
            json,
        } => {
            let request =
                build_request(input.as_deref(), text.as_deref(), *stdin, url.as_deref()).await?;
            let options = ConvertOptions {
                add_title: *add_title,
                add_classes: add_classes.clone(),
                no_minify: *no_minify,
            };

            let bar = spinner(show_progress, "Converting…");
            let result = orchestrator.convert(&request, &options).await;
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            let doc = result.context("Conversion failed")?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&doc).context("Failed to serialise result")?
                );
            } else {
                println!("{}", doc.public_url);
                if !cli.quiet {
                    eprintln!("{} stored as {}", green("✔"), bold(&doc.id));
                    eprintln!(
                        "   markdown (if produced): {}",
                        dim(&orchestrator.public_markdown_url(&doc.id))
                    );
                }
            }
        }

        Command::Combine {
            ids,
            titles,
            title,
            json,
        } => {
            let bar = spinner(show_progress, "Combining…");
            let result = orchestrator.combine(ids, titles, title).await;
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            let outcome = result.context("Combine failed")?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&outcome).context("Failed to serialise result")?
                );
            } else {
                println!("{}", outcome.document.public_url);
                if !cli.quiet {
                    eprintln!("{} combined as {}", green("✔"), bold(&outcome.document.id));
                    for url in &outcome.component_urls {
                        eprintln!("   {}", dim(url));
                    }
                }
            }
        }

        Command::Get {
            id,
            markdown,
            output,
        } => {
            let doc = orchestrator
                .fetch(id)
                .await
                .context("Failed to fetch document")?
                .with_context(|| format!("No document with id {id}"))?;
            let body = if *markdown {
                doc.markdown
                    .with_context(|| format!("Document {id} has no Markdown rendition"))?
            } else {
                doc.html
            };

            match output {
                Some(path) => {
                    tokio::fs::write(path, &body)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    if !cli.quiet {
                        eprintln!("{} wrote {}", green("✔"), bold(&path.display().to_string()));
                    }
                }
                None => {
                    let stdout = io::stdout();
                    let mut handle = stdout.lock();
                    handle
                        .write_all(body.as_bytes())
                        .context("Failed to write to stdout")?;
                    if !body.ends_with('\n') {
                        handle.write_all(b"\n").ok();
                    }
                }
            }
        }

        Command::Status { json } => {
            let report = orchestrator.health().await;
            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialise report")?
                );
            } else {
                println!("ok:    {}", report.ok);
                let store = match report.store {
                    Some(true) => green("reachable"),
                    Some(false) => red("unreachable"),
                    None => dim("not configured"),
                };
                println!("store: {store}");
            }
            if report.store == Some(false) {
                anyhow::bail!("document store unreachable");
            }
        }
    }

    Ok(())
}

/// Map global CLI flags to `OrchestratorConfig`.
async fn build_orchestrator(cli: &Cli) -> Result<Orchestrator> {
    let mut builder = OrchestratorConfig::builder()
        .public_base_url(cli.base_url.as_str())
        .engine_timeout_secs(cli.engine_timeout);
    if let Some(url) = &cli.store_url {
        builder = builder.store_url(url.as_str());
    }
    if let Some(engine) = &cli.engine {
        let command: Vec<String> = engine.split_whitespace().map(str::to_string).collect();
        builder = builder.engine_command(command);
    }
    if let Some(root) = &cli.scratch_root {
        builder = builder.scratch_root(root.clone());
    }
    let config = builder.build().context("Invalid configuration")?;
    Orchestrator::new(config)
        .await
        .context("Failed to start orchestrator")
}

async fn build_request(
    input: Option<&Path>,
    text: Option<&str>,
    stdin: bool,
    url: Option<&str>,
) -> Result<ConvertRequest> {
    if let Some(path) = input {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        return Ok(ConvertRequest::from_file(name, bytes));
    }
    if let Some(text) = text {
        return Ok(ConvertRequest::from_text(text));
    }
    if stdin {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read stdin")?;
        return Ok(ConvertRequest::from_text(buf));
    }
    if let Some(url) = url {
        return Ok(ConvertRequest::from_url(url));
    }
    // Empty request: the orchestrator reports NoInputProvided with the
    // full hint text.
    Ok(ConvertRequest::default())
}

fn spinner(visible: bool, message: &'static str) -> Option<ProgressBar> {
    if !visible {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}
