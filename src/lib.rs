//! # img2report
//!
//! Turn a field photo plus a location and date into an AI-written,
//! downloadable PDF incident report.
//!
//! The photo is re-encoded and attached to a vision-capable
//! chat-completions request alongside a prompt built from the location and
//! date; the returned description is laid out into a single-document PDF
//! with a deterministic file name, ready to stream back to the user.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo + (location, date)
//!  │
//!  ├─ 1. Input    validate magic bytes, decode to pixels
//!  ├─ 2. Encode   JPEG re-encode → base64 data URL
//!  ├─ 3. Analyze  one chat-completions call (300-token cap, no retry)
//!  └─ 4. Render   title / date / wrapped text → PDF, atomic write
//! ```
//!
//! Each run is independent and stateless: re-running with the same
//! location and date overwrites the prior artifact unless
//! [`ReportConfig::unique_suffix`] is enabled.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2report::{generate, ReportConfig, ReportRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key auto-resolved from OPENAI_API_KEY when not set explicitly.
//!     let config = ReportConfig::default();
//!     let request = ReportRequest::new("Ridge Valley", "2024-03-01".parse()?);
//!     let output = generate("photo.jpg", &request, &config).await?;
//!     println!("{}", output.analysis);
//!     eprintln!("wrote {}", output.artifact.path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2report` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! img2report = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ReportConfig, ReportConfigBuilder, API_KEY_ENV_VAR};
pub use error::ReportError;
pub use generate::{generate, generate_from_bytes, generate_sync};
pub use output::{ReportArtifact, ReportOutput, ReportRequest, ReportStats};
pub use pipeline::render::report_file_name;
