//! The analysis call: build the chat request and submit it once.
//!
//! Intentionally thin. Prompt wording lives in [`crate::prompts`], the
//! credential and every knob arrive through [`ReportConfig`], and no retry
//! is performed: the caller owns user-facing messaging and a failed call
//! surfaces immediately as a typed error.
//!
//! The request attaches the encoded photo as a `data:` URL content part of
//! the user message. The pre-fix behaviour (prompt only, photo ignored) is
//! available by constructing the client with `attach_image = false`.

use crate::config::{ReportConfig, API_KEY_ENV_VAR};
use crate::error::ReportError;
use crate::pipeline::encode::EncodedImage;
use crate::prompts::analysis_prompt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum characters of an error body echoed into an error message.
const ERROR_BODY_LIMIT: usize = 300;

/// The text completion returned by the endpoint, plus its token usage.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The first completion choice, unmodified.
    pub text: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Client for the OpenAI-compatible chat-completions endpoint.
///
/// Construction resolves the credential (explicit config value first,
/// `OPENAI_API_KEY` fallback) and fails with [`ReportError::MissingApiKey`]
/// before any request leaves the process.
#[derive(Debug)]
pub struct AnalysisClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    system_prompt: Option<String>,
    attach_image: bool,
    timeout_secs: u64,
}

impl AnalysisClient {
    /// Build a client from the run configuration.
    pub fn new(config: &ReportConfig) -> Result<Self, ReportError> {
        let api_key = match &config.api_key {
            Some(k) if !k.trim().is_empty() => k.clone(),
            _ => std::env::var(API_KEY_ENV_VAR)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or(ReportError::MissingApiKey {
                    var: API_KEY_ENV_VAR,
                })?,
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| ReportError::Network {
                detail: e.to_string(),
            })?;

        Ok(Self {
            http,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system_prompt: config.system_prompt.clone(),
            attach_image: config.attach_image,
            timeout_secs: config.api_timeout_secs,
        })
    }

    /// Submit one completion request for the photo and return the first
    /// generated choice unmodified.
    pub async fn analyze(
        &self,
        image: &EncodedImage,
        location: &str,
        date: &str,
    ) -> Result<Analysis, ReportError> {
        let body = self.build_request(image, location, date);
        let url = format!("{}/chat/completions", self.api_base);
        debug!("POST {} (model {})", url, self.model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            warn!("Analysis endpoint returned HTTP {}", status);
            return Err(map_status_error(status.as_u16(), &text, retry_after));
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ReportError::MalformedResponse {
                    detail: e.to_string(),
                })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ReportError::MalformedResponse {
                detail: "response contained no completion text".into(),
            })?;

        let usage = parsed.usage.unwrap_or_default();
        debug!(
            "Analysis complete: {} chars, {} in / {} out tokens",
            text.len(),
            usage.prompt_tokens,
            usage.completion_tokens
        );

        Ok(Analysis {
            text,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
    }

    fn build_request(&self, image: &EncodedImage, location: &str, date: &str) -> ChatRequest {
        let mut content = vec![ContentPart::Text {
            text: analysis_prompt(location, date),
        }];
        if self.attach_image {
            content.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.to_data_url(),
                },
            });
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = self.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: vec![ContentPart::Text {
                    text: system.clone(),
                }],
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content,
        });

        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ReportError {
        if e.is_timeout() {
            ReportError::ApiTimeout {
                secs: self.timeout_secs,
            }
        } else {
            ReportError::Network {
                detail: e.to_string(),
            }
        }
    }
}

fn map_status_error(status: u16, body: &str, retry_after: Option<u64>) -> ReportError {
    let message: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    match status {
        401 | 403 => ReportError::AuthFailed { detail: message },
        429 => ReportError::RateLimited {
            retry_after_secs: retry_after,
        },
        _ => ReportError::Api { status, message },
    }
}

/// Server-suggested delay from a `Retry-After` header, in whole seconds.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;

    fn client(attach: bool) -> AnalysisClient {
        let config = ReportConfig::builder()
            .api_key("sk-test")
            .attach_image(attach)
            .build()
            .unwrap();
        AnalysisClient::new(&config).unwrap()
    }

    fn fake_image() -> EncodedImage {
        EncodedImage {
            data: "AQID".into(),
            mime_type: "image/jpeg",
        }
    }

    #[test]
    fn explicit_api_key_wins_without_env() {
        let config = ReportConfig::builder().api_key("sk-explicit").build().unwrap();
        let c = AnalysisClient::new(&config).unwrap();
        assert_eq!(c.api_key, "sk-explicit");
    }

    #[test]
    fn blank_api_key_is_treated_as_unset() {
        let config = ReportConfig::builder().api_key("   ").build().unwrap();
        // With no env fallback the constructor must fail fast.
        if std::env::var(API_KEY_ENV_VAR).is_err() {
            let err = AnalysisClient::new(&config).unwrap_err();
            assert!(matches!(err, ReportError::MissingApiKey { .. }));
        }
    }

    #[test]
    fn request_carries_prompt_and_image_part() {
        let c = client(true);
        let req = c.build_request(&fake_image(), "Ridge Valley", "2024-03-01");
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 300);
        assert!(json.get("temperature").is_none());

        let content = json["messages"][0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0]["type"], "text");
        assert!(content[0]["text"]
            .as_str()
            .unwrap()
            .contains("Ridge Valley"));
        assert_eq!(content[1]["type"], "image_url");
        assert!(content[1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn text_only_request_omits_the_image() {
        let c = client(false);
        let req = c.build_request(&fake_image(), "Ridge Valley", "2024-03-01");
        let json = serde_json::to_value(&req).unwrap();
        let content = json["messages"][0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["type"], "text");
    }

    #[test]
    fn system_prompt_becomes_leading_message() {
        let config = ReportConfig::builder()
            .api_key("sk-test")
            .system_prompt("You are a disaster analyst.")
            .build()
            .unwrap();
        let c = AnalysisClient::new(&config).unwrap();
        let req = c.build_request(&fake_image(), "X", "2024-01-01");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            map_status_error(401, "bad key", None),
            ReportError::AuthFailed { .. }
        ));
        assert!(matches!(
            map_status_error(429, "slow down", Some(7)),
            ReportError::RateLimited {
                retry_after_secs: Some(7)
            }
        ));
        assert!(matches!(
            map_status_error(500, "oops", None),
            ReportError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn error_body_is_truncated() {
        let long = "x".repeat(10_000);
        if let ReportError::Api { message, .. } = map_status_error(500, &long, None) {
            assert_eq!(message.len(), ERROR_BODY_LIMIT);
        } else {
            panic!("expected Api error");
        }
    }

    #[test]
    fn response_with_choice_deserialises() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Smoke observed."}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 45}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Smoke observed.")
        );
        assert_eq!(parsed.usage.unwrap().completion_tokens, 45);
    }

    #[test]
    fn response_without_usage_defaults_to_zero() {
        let json = r#"{"choices": [{"message": {"content": "ok"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.usage.is_none());
    }
}
