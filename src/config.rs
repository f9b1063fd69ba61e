//! Configuration for report generation.
//!
//! Every knob lives in [`ReportConfig`], built via its
//! [`ReportConfigBuilder`]. One struct keeps runs reproducible: two runs
//! with equal configs and inputs differ only in what the model says.
//!
//! The API key is an explicit field rather than an ambient environment
//! read inside the client. Tests inject a fake key without touching the
//! process environment; the `OPENAI_API_KEY` variable remains a fallback
//! for interactive use.

use crate::error::ReportError;
use std::fmt;
use std::path::PathBuf;

/// Environment variable consulted when [`ReportConfig::api_key`] is unset.
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Configuration for a single report-generation run.
///
/// Built via [`ReportConfig::builder()`] or [`ReportConfig::default()`].
///
/// # Example
/// ```rust
/// use img2report::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .api_key("sk-test")
///     .model("gpt-4o-mini")
///     .max_tokens(300)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    /// API credential for the completion endpoint. When `None`, the client
    /// falls back to the `OPENAI_API_KEY` environment variable at
    /// construction time and fails fast if neither is set.
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API. Default:
    /// `https://api.openai.com/v1`. Point this at a proxy or a local
    /// compatible server to test without real credentials.
    pub api_base: String,

    /// Chat model identifier. Default: `gpt-4o-mini`.
    ///
    /// The default must be vision-capable because the encoded photo is
    /// attached to the request (see [`ReportConfig::attach_image`]).
    pub model: String,

    /// Completion length cap in generated tokens. Default: 300.
    ///
    /// 300 tokens is roughly 200 words: enough for a one-page incident
    /// description while keeping per-run cost and render height bounded.
    pub max_tokens: u32,

    /// Sampling temperature. `None` leaves the provider default in place.
    pub temperature: Option<f32>,

    /// Attach the encoded photo to the analysis request. Default: true.
    ///
    /// When false the request carries only the text prompt, so the
    /// "analysis" is driven entirely by the location and date strings.
    pub attach_image: bool,

    /// Optional system prompt prepended to the conversation. Default: none;
    /// the analysis prompt alone is sent as the user message.
    pub system_prompt: Option<String>,

    /// Per-call timeout for the analysis request in seconds. Default: 60.
    ///
    /// The call is a single blocking step in an interactive flow; a bounded
    /// timeout guarantees the caller always gets control back.
    pub api_timeout_secs: u64,

    /// Directory the artifact is written into. Default: `"."`.
    pub output_dir: PathBuf,

    /// Append a UTC timestamp to the artifact name. Default: false.
    ///
    /// The default name is a pure function of (location, date), so repeat
    /// runs overwrite each other. Enable this when prior artifacts must
    /// survive repeat runs for the same location and date.
    pub unique_suffix: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 300,
            temperature: None,
            attach_image: true,
            system_prompt: None,
            api_timeout_secs: 60,
            output_dir: PathBuf::from("."),
            unique_suffix: false,
        }
    }
}

// Manual Debug: never leak the credential into logs.
impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("attach_image", &self.attach_image)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("output_dir", &self.output_dir)
            .field("unique_suffix", &self.unique_suffix)
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn attach_image(mut self, v: bool) -> Self {
        self.config.attach_image = v;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn unique_suffix(mut self, v: bool) -> Self {
        self.config.unique_suffix = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        let c = &self.config;
        if c.api_base.trim().is_empty() {
            return Err(ReportError::InvalidConfig("api_base must not be empty".into()));
        }
        if c.model.trim().is_empty() {
            return Err(ReportError::InvalidConfig("model must not be empty".into()));
        }
        if c.max_tokens == 0 {
            return Err(ReportError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
