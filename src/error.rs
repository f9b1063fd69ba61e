//! Error types for the img2report library.
//!
//! One enum covers the whole pipeline because a run is strictly linear:
//! each variant identifies the stage that failed, and the first failure
//! aborts the run. Callers get exactly one error per interaction, never a
//! partial artifact.
//!
//! The variants group into four stages:
//!
//! * input/decode   — the supplied image could not be read or decoded
//! * configuration  — no usable API credential before any network I/O
//! * analysis       — the remote completion call failed (auth, rate limit,
//!   timeout, transport, malformed body)
//! * render/storage — PDF assembly or the artifact write failed

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the img2report library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The request is incomplete; nothing was sent or written.
    #[error("Invalid report request: {reason}")]
    InvalidRequest { reason: String },

    /// Image file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    ImageNotFound { path: PathBuf },

    /// Process does not have read permission on the image file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but is neither PNG nor JPEG.
    #[error("Unsupported image format for '{path}' (want PNG or JPEG)\nFirst bytes: {magic:?}")]
    UnsupportedImage { path: PathBuf, magic: [u8; 4] },

    /// The image bytes could not be decoded into pixels.
    #[error("Failed to decode image: {detail}")]
    ImageDecode { detail: String },

    /// In-memory JPEG re-encoding failed.
    #[error("Failed to re-encode image as JPEG: {detail}")]
    ImageEncode { detail: String },

    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key in the config and none in the environment.
    #[error("No API key configured.\nSet {var} or pass one via ReportConfig::builder().api_key(..).")]
    MissingApiKey { var: &'static str },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Analysis errors ───────────────────────────────────────────────────
    /// The completion API rejected the credential (401/403).
    #[error("Authentication failed against the analysis endpoint: {detail}")]
    AuthFailed { detail: String },

    /// The completion API returned HTTP 429.
    #[error("Rate limit exceeded on the analysis endpoint")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The analysis call exceeded the configured timeout.
    #[error("Analysis call timed out after {secs}s\nIncrease --api-timeout for slow endpoints.")]
    ApiTimeout { secs: u64 },

    /// The completion API returned a non-success status.
    #[error("Analysis API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure before a response arrived.
    #[error("Network error calling the analysis endpoint: {detail}")]
    Network { detail: String },

    /// The response parsed but carried no usable completion.
    #[error("Malformed analysis response: {detail}")]
    MalformedResponse { detail: String },

    // ── Render / storage errors ───────────────────────────────────────────
    /// PDF assembly failed before anything touched disk.
    #[error("Failed to render the report PDF: {detail}")]
    Render { detail: String },

    /// Could not create or write the artifact file.
    #[error("Failed to write report artifact '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// True for any failure of the remote analysis call, regardless of the
    /// specific transport or service condition.
    pub fn is_analysis(&self) -> bool {
        matches!(
            self,
            ReportError::AuthFailed { .. }
                | ReportError::RateLimited { .. }
                | ReportError::ApiTimeout { .. }
                | ReportError::Api { .. }
                | ReportError::Network { .. }
                | ReportError::MalformedResponse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_display_names_the_variable() {
        let e = ReportError::MissingApiKey {
            var: "OPENAI_API_KEY",
        };
        assert!(e.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn rate_limit_display_with_and_without_hint() {
        let with = ReportError::RateLimited {
            retry_after_secs: Some(30),
        };
        let without = ReportError::RateLimited {
            retry_after_secs: None,
        };
        assert!(with.to_string().contains("Rate limit"));
        assert!(without.to_string().contains("Rate limit"));
    }

    #[test]
    fn api_timeout_display() {
        let e = ReportError::ApiTimeout { secs: 60 };
        assert!(e.to_string().contains("60s"));
    }

    #[test]
    fn analysis_classification() {
        assert!(ReportError::Api {
            status: 500,
            message: "boom".into()
        }
        .is_analysis());
        assert!(ReportError::MalformedResponse {
            detail: "no choices".into()
        }
        .is_analysis());
        assert!(!ReportError::MissingApiKey {
            var: "OPENAI_API_KEY"
        }
        .is_analysis());
        assert!(!ReportError::Render {
            detail: "font".into()
        }
        .is_analysis());
    }
}
