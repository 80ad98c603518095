//! Google Generative Language client
//!
//! One `generateContent` call per prompt:
//!
//! ```text
//! POST {endpoint}/models/{model}:generateContent
//! x-goog-api-key: <key for this prompt>
//! { "contents": [{ "parts": [{ "text": prompt }] }],
//!   "generationConfig": { "temperature": 0.0, "maxOutputTokens": 8000 } }
//! ```
//!
//! The answer is the concatenated text of the first candidate's parts.

use std::time::Duration;

use contracts::{ContractError, ModelConfig, RankingModel, RankingRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Result, RunnerError};
use crate::http::{check_response, transport_error};
use crate::keys::ApiKeys;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseCandidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Gemini ranking model
#[derive(Debug)]
pub struct GeminiModel {
    http: reqwest::Client,
    url: String,
    model_name: String,
    keys: ApiKeys,
    temperature: f64,
    max_output_tokens: u32,
    timeout_secs: u64,
}

impl GeminiModel {
    pub fn new(config: &ModelConfig, keys: ApiKeys) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RunnerError::Client {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            url: generate_url(&config.endpoint, &config.model_name),
            model_name: config.model_name.clone(),
            keys,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Reads keys from `config.api_keys_env`
    pub fn from_env(config: &ModelConfig) -> Result<Self> {
        let keys = ApiKeys::from_env(&config.api_keys_env, config.prompts_per_key)?;
        Self::new(config, keys)
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

impl RankingModel for GeminiModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    #[instrument(
        name = "gemini_generate",
        skip(self, request),
        fields(scenario_id = %request.scenario_id, sequence = request.sequence)
    )]
    async fn rank(
        &self,
        request: RankingRequest<'_>,
    ) -> std::result::Result<String, ContractError> {
        let body = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart {
                    text: request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };
        debug!(key_slot = self.keys.slot(request.sequence), "sending prompt");

        let resp = self
            .http
            .post(&self.url)
            .header(API_KEY_HEADER, self.keys.for_sequence(request.sequence))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;
        let resp = check_response(resp).await?;
        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        response_text(parsed)
    }
}

fn generate_url(endpoint: &str, model: &str) -> String {
    format!(
        "{}/models/{model}:generateContent",
        endpoint.trim_end_matches('/')
    )
}

fn response_text(resp: GenerateResponse) -> std::result::Result<String, ContractError> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ContractError::MalformedResponse {
            message: format!("prompt blocked: {reason}"),
        });
    }

    let Some(candidate) = resp.candidates.into_iter().next() else {
        return Err(ContractError::MalformedResponse {
            message: "response has no candidates".to_string(),
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(ContractError::MalformedResponse {
            message: format!("empty candidate text (finish reason {reason})"),
        });
    }
    Ok(text)
}
