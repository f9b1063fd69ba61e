//! CLI binary for img2report.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ReportConfig` and prints results.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use img2report::{generate, ReportConfig, ReportRequest};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic run (artifact lands in the current directory)
  img2report photo.jpg --location "Ridge Valley"

  # Explicit date and output directory
  img2report photo.jpg --location "Ridge Valley" --date 2024-03-01 -o reports/

  # Text-only analysis (reference behaviour: the photo is not sent)
  img2report photo.jpg --location "Ridge Valley" --text-only

  # Keep every run's artifact instead of overwriting
  img2report photo.jpg --location "Ridge Valley" --unique

  # Structured JSON output (analysis + artifact path + stats)
  img2report photo.jpg --location "Ridge Valley" --json

ARTIFACT NAMING:
  Disaster_Report_<location>_<date>.pdf, with spaces in the location
  replaced by underscores. Re-running with the same location and date
  overwrites the prior artifact unless --unique is given.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY           API key for the completion endpoint
  IMG2REPORT_API_BASE      Override the API base URL
  IMG2REPORT_MODEL         Override the model ID
  A .env file in the working directory is loaded on startup.

SETUP:
  1. Set API key:  export OPENAI_API_KEY=sk-...
  2. Run:          img2report photo.jpg --location "Ridge Valley"
"#;

/// Generate an AI-written PDF incident report from a photo.
#[derive(Parser, Debug)]
#[command(
    name = "img2report",
    version,
    about = "Generate an AI-written PDF incident report from a photo",
    long_about = "Send a field photo with its location and date to a vision-capable \
completion model and render the returned analysis into a downloadable PDF report.",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the photo (PNG or JPEG).
    image: PathBuf,

    /// Location the photo was taken at.
    #[arg(short, long)]
    location: String,

    /// Date the photo was taken on (YYYY-MM-DD). Defaults to today.
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Directory to write the PDF into.
    #[arg(short, long, env = "IMG2REPORT_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Chat model ID.
    #[arg(long, env = "IMG2REPORT_MODEL")]
    model: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = "IMG2REPORT_API_BASE")]
    api_base: Option<String>,

    /// Completion length cap in tokens.
    #[arg(long, env = "IMG2REPORT_MAX_TOKENS", default_value_t = 300)]
    max_tokens: u32,

    /// Sampling temperature (0.0–2.0). Provider default when omitted.
    #[arg(long, env = "IMG2REPORT_TEMPERATURE")]
    temperature: Option<f32>,

    /// Per-call timeout for the analysis request in seconds.
    #[arg(long, env = "IMG2REPORT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Send only the text prompt; do not attach the photo.
    #[arg(long, env = "IMG2REPORT_TEXT_ONLY")]
    text_only: bool,

    /// Append a UTC timestamp to the artifact name instead of overwriting.
    #[arg(long)]
    unique: bool,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "IMG2REPORT_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Output structured JSON (analysis + artifact + stats) instead of text.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "IMG2REPORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2REPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the artifact path.
    #[arg(short, long, env = "IMG2REPORT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner owns the terminal while active; keep library logs quiet
    // unless the user asked for them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let request = ReportRequest::new(cli.location.clone(), date);

    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!(
            "Analyzing {}…",
            cli.image.file_name().and_then(|n| n.to_str()).unwrap_or("photo")
        ));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let result = generate(&cli.image, &request, &config).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let output = result.context("Report generation failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
        return Ok(());
    }

    if !cli.quiet {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.analysis.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.analysis.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    eprintln!(
        "{} {}  {}",
        green("✔"),
        bold(&output.artifact.path.display().to_string()),
        dim(&format!(
            "{} bytes, {}ms, {} in / {} out tokens",
            output.artifact.size_bytes,
            output.stats.total_duration_ms,
            output.stats.prompt_tokens,
            output.stats.completion_tokens
        )),
    );

    Ok(())
}

/// Map CLI args to `ReportConfig`.
async fn build_config(cli: &Cli) -> Result<ReportConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ReportConfig::builder()
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .attach_image(!cli.text_only)
        .output_dir(cli.output_dir.clone())
        .unique_suffix(cli.unique);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref base) = cli.api_base {
        builder = builder.api_base(base.clone());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
