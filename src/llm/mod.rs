//! LLM client for hiring-post analysis
//!
//! This module talks to a Gemini-compatible `generateContent` endpoint and
//! turns its answer into a [`ClassificationResult`]. Every failure resolves to
//! a fail-open result; the deterministic keyword gate is never overridden here.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ClassifierConfig;
use crate::models::ClassificationResult;
use crate::utils::error::ClassifyError;
use crate::utils::truncate_chars;

/// Summary used when no API key is configured
pub const SUMMARY_NO_KEY: &str = "AI analysis disabled (no key)";
/// Summary used when the primary model call fails
pub const SUMMARY_FAILED: &str = "AI analysis failed";
/// Summary used when the fallback model call fails
pub const SUMMARY_FALLBACK_FAILED: &str = "Fallback failed";

/// Configuration for LLM client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API base URL, e.g. `https://generativelanguage.googleapis.com/v1beta`
    pub endpoint: String,

    /// Model tried first
    pub primary_model: String,

    /// Model retried once when the primary one is not found
    pub fallback_model: String,

    /// API key; `None` disables the AI stage
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Characters of post text embedded in the prompt
    pub max_input_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::from(&ClassifierConfig::default())
    }
}

impl From<&ClassifierConfig> for LlmConfig {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            primary_model: config.primary_model.clone(),
            fallback_model: config.fallback_model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout_secs: config.timeout_secs,
            max_input_chars: config.max_input_chars,
        }
    }
}

/// `generateContent` request body
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// `generateContent` response body, reduced to what we read
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Which prompt template to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptStyle {
    Detailed,
    Compact,
}

/// LLM client for hiring-post analysis
pub struct GeminiClient {
    client: Client,
    config: LlmConfig,
}

impl GeminiClient {
    /// Create a new client with custom config
    pub fn with_config(config: LlmConfig) -> Result<Self, ClassifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a client from the classifier section of the configuration
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        Self::with_config(LlmConfig::from(config))
    }

    /// Whether an API key is configured
    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Analyze post text, resolving every failure to a fail-open result
    pub async fn analyze_post(&self, text: &str) -> ClassificationResult {
        let Some(key) = self.config.api_key.as_deref() else {
            return ClassificationResult::fail_open(SUMMARY_NO_KEY);
        };

        let primary = &self.config.primary_model;
        match self.analyze_with(key, primary, PromptStyle::Detailed, text).await {
            Ok(result) => result,
            Err(ClassifyError::ModelNotFound(model)) => {
                tracing::warn!(
                    model = %model,
                    fallback = %self.config.fallback_model,
                    "Model not found, falling back"
                );
                let fallback = &self.config.fallback_model;
                match self.analyze_with(key, fallback, PromptStyle::Compact, text).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!(error = %e, "Fallback analysis failed");
                        ClassificationResult::fail_open(SUMMARY_FALLBACK_FAILED)
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "AI analysis failed");
                ClassificationResult::fail_open(SUMMARY_FAILED)
            }
        }
    }

    /// Analyze post text with a single model, surfacing the failure class
    pub async fn try_analyze(
        &self,
        model: &str,
        text: &str,
    ) -> Result<ClassificationResult, ClassifyError> {
        let key = self.config.api_key.as_deref().ok_or(ClassifyError::MissingKey)?;
        self.analyze_with(key, model, PromptStyle::Detailed, text).await
    }

    async fn analyze_with(
        &self,
        key: &str,
        model: &str,
        style: PromptStyle,
        text: &str,
    ) -> Result<ClassificationResult, ClassifyError> {
        let prompt = self.build_prompt(text, style);
        let reply = self.generate(key, model, &prompt).await?;
        parse_classification(&reply)
    }

    /// Build prompt for hiring analysis
    fn build_prompt(&self, text: &str, style: PromptStyle) -> String {
        let body = truncate_chars(text, self.config.max_input_chars);
        match style {
            PromptStyle::Detailed => format!(
                r#"Analyze this LinkedIn post and determine if it is a HIRING OPPORTUNITY where the author is looking to hire someone (freelancer, employee, agency).
Ignore posts where the author is looking for a job themselves.

Post Text: "{body}"

Respond ONLY with a valid JSON object in this format:
{{
    "isHiring": boolean,
    "confidence": number (0-1),
    "role": "string (extracted role)",
    "summary": "string (brief summary of opportunity)"
}}"#
            ),
            PromptStyle::Compact => format!(
                r#"Analyze this LinkedIn post and determine if it is a HIRING OPPORTUNITY where the author is looking to hire someone.
Post Text: "{body}"
Respond ONLY with a valid JSON object: {{ "isHiring": boolean, "confidence": number, "role": "string", "summary": "string" }}"#
            ),
        }
    }

    /// Call `generateContent` and return the first candidate's text
    async fn generate(&self, key: &str, model: &str, prompt: &str) -> Result<String, ClassifyError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            model
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClassifyError::ModelNotFound(model.to_string()));
        }
        if !status.is_success() {
            return Err(ClassifyError::Network(format!("API error: {status}")));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Parse(e.to_string()))?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ClassifyError::Parse("response has no candidates".to_string()))
    }
}

/// Parse a model reply into a classification, tolerating code fences
pub fn parse_classification(reply: &str) -> Result<ClassificationResult, ClassifyError> {
    let json_str = extract_json(reply);
    tracing::debug!(json = %truncate_chars(&json_str, 200), "Extracted JSON");

    let parsed: ClassificationResult = serde_json::from_str(&json_str)?;
    Ok(parsed.normalized())
}

/// Strip markdown code-fence markers around a JSON payload
pub fn extract_json(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}
