//! Data types flowing through a report run: the request, the generated
//! artifact handle, and the run summary returned to the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ReportError;

/// The user-supplied facts a report is generated from.
///
/// Immutable once constructed; the image travels separately through the
/// pipeline and is consumed by the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Free-text location the photo was taken at. Embedded verbatim in the
    /// prompt, the report title, and (spaces replaced) the artifact name.
    pub location: String,
    /// Calendar date the photo was taken on.
    pub date: NaiveDate,
}

impl ReportRequest {
    pub fn new(location: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            location: location.into(),
            date,
        }
    }

    /// The date in the `YYYY-MM-DD` form used by the prompt, the report
    /// body, and the artifact name.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Reject incomplete requests before any network or disk activity.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.location.trim().is_empty() {
            return Err(ReportError::InvalidRequest {
                reason: "location must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Handle to the PDF written at the end of a run, sufficient for the
/// caller to stream the file back to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportArtifact {
    /// Absolute or output-dir-relative path of the written PDF.
    pub path: PathBuf,
    /// Size of the written file in bytes.
    pub size_bytes: u64,
}

impl ReportArtifact {
    /// File name component of the artifact path.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// MIME type the artifact should be served with.
    pub fn mime_type(&self) -> &'static str {
        "application/pdf"
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    /// The analysis text exactly as the model returned it.
    pub analysis: String,
    /// Handle to the written PDF.
    pub artifact: ReportArtifact,
    /// Timings and token usage for the run.
    pub stats: ReportStats,
}

/// Per-stage wall-clock and API token usage for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportStats {
    pub encode_duration_ms: u64,
    pub analysis_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Prompt tokens reported by the API, 0 when the usage block is absent.
    pub prompt_tokens: u32,
    /// Completion tokens reported by the API, 0 when the usage block is absent.
    pub completion_tokens: u32,
}
