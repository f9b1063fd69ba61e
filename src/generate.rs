//! Top-level report generation entry points.
//!
//! One user action maps to one sequential run of the pipeline:
//! validate → decode → encode → analyze → render → write. Stages run in
//! strict order with no state carried between runs, and the first failure
//! aborts the run before any later side effect — in particular, nothing
//! touches the network before the request and image validate, and nothing
//! touches the output path before the analysis succeeds.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::output::{ReportOutput, ReportRequest, ReportStats};
use crate::pipeline::{analyze::AnalysisClient, encode, input, render};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Generate a report from an image file on disk.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns the first pipeline failure: an invalid request or unreadable
/// image, a missing credential, any analysis-call failure, or a render or
/// write failure. No artifact exists on any error path.
pub async fn generate(
    image_path: impl AsRef<Path>,
    request: &ReportRequest,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    request.validate()?;
    let image = input::load_image(image_path)?;
    run_pipeline(image, request, config).await
}

/// Generate a report from an in-memory image buffer (e.g. an upload body).
pub async fn generate_from_bytes(
    image_bytes: &[u8],
    request: &ReportRequest,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    request.validate()?;
    let image = input::load_image_from_bytes(image_bytes)?;
    run_pipeline(image, request, config).await
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    image_path: impl AsRef<Path>,
    request: &ReportRequest,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReportError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(generate(image_path, request, config))
}

async fn run_pipeline(
    image: image::DynamicImage,
    request: &ReportRequest,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    let total_start = Instant::now();
    let date = request.date_string();
    info!("Generating report for '{}' on {}", request.location, date);

    // ── Encode ───────────────────────────────────────────────────────────
    let encode_start = Instant::now();
    let encoded = encode::encode_image(&image).map_err(|e| ReportError::ImageEncode {
        detail: e.to_string(),
    })?;
    drop(image);
    let encode_duration_ms = encode_start.elapsed().as_millis() as u64;

    // ── Analyze ──────────────────────────────────────────────────────────
    // Client construction resolves the credential; a missing key fails
    // here, before any request is sent.
    let client = AnalysisClient::new(config)?;
    let analysis_start = Instant::now();
    let analysis = client.analyze(&encoded, &request.location, &date).await?;
    let analysis_duration_ms = analysis_start.elapsed().as_millis() as u64;
    debug!("Analysis returned {} chars", analysis.text.len());

    // ── Render and write ─────────────────────────────────────────────────
    let render_start = Instant::now();
    let pdf = render::render_pdf(&analysis.text, &request.location, &date)?;
    let path = render::artifact_path(config, &request.location, &date);
    let artifact = render::write_artifact(&pdf, path).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let stats = ReportStats {
        encode_duration_ms,
        analysis_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        prompt_tokens: analysis.prompt_tokens,
        completion_tokens: analysis.completion_tokens,
    };

    info!(
        "Report complete: {} ({} bytes) in {}ms",
        artifact.file_name(),
        artifact.size_bytes,
        stats.total_duration_ms
    );

    Ok(ReportOutput {
        analysis: analysis.text,
        artifact,
        stats,
    })
}
