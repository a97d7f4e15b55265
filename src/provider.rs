//! Question Generator Abstraction
//!
//! The generation collaborator the executor calls to fill gaps: a topic, a count, a
//! difficulty and the stems that already exist go in; zero or more new questions come
//! out. Two HTTP implementations are provided: a direct OpenAI-compatible chat client
//! and a client for a deployed callable "generateQuestions" function.

use crate::error::ApiError;
use crate::types::Difficulty;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub mod callable;
pub mod openai;

pub use callable::CallableQuestionGenerator;
pub use openai::OpenAIQuestionGenerator;

/// One generation call: `count` questions on `topic` at `difficulty`, avoiding `existing_stems`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub topic: String,
    pub count: u64,
    pub difficulty: Difficulty,
    pub existing_stems: Vec<String>,
}

/// A question returned by a generator, not yet attached to an exam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub stem: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

/// Question generator trait
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Generate up to `request.count` questions.
    ///
    /// Returning fewer (or none) is not an error; transport and service failures are.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<Vec<GeneratedQuestion>, ApiError>;

    /// Get the generator name
    fn generator_name(&self) -> &str;
}

/// Generator backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    OpenAI,
    Callable,
}

/// Generator configuration (`[provider]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// API key (openai) or bearer token (callable); OPENAI_API_KEY is used when unset
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL (openai) or full function URL (callable)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// How many existing stems are quoted back to the model
    #[serde(default = "default_existing_stems_limit")]
    pub existing_stems_limit: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_existing_stems_limit() -> usize {
    50
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            model: default_model(),
            api_key: None,
            endpoint: None,
            temperature: default_temperature(),
            existing_stems_limit: default_existing_stems_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Validate provider configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!(
                    "Endpoint must start with http:// or https://: {}",
                    endpoint
                ));
            }
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }
        if self.timeout_secs == 0 {
            return Err("Timeout must be at least one second".to_string());
        }
        match self.provider_type {
            ProviderType::OpenAI => {
                if self.model.trim().is_empty() {
                    return Err("Model cannot be empty".to_string());
                }
            }
            ProviderType::Callable => {
                if self.endpoint.is_none() {
                    return Err("Callable provider requires an endpoint".to_string());
                }
            }
        }
        Ok(())
    }

    /// Resolve the API key from config, falling back to OPENAI_API_KEY
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}

/// Builds generator clients from configuration
pub struct GeneratorFactory;

impl GeneratorFactory {
    pub fn create(config: &ProviderConfig) -> Result<Arc<dyn QuestionGenerator>, ApiError> {
        config.validate().map_err(ApiError::ConfigError)?;
        match config.provider_type {
            ProviderType::OpenAI => {
                let api_key = config.resolve_api_key().ok_or_else(|| {
                    ApiError::ProviderNotConfigured(
                        "No API key. Set provider.api_key or OPENAI_API_KEY.".to_string(),
                    )
                })?;
                Ok(Arc::new(OpenAIQuestionGenerator::new(
                    config.model.clone(),
                    api_key,
                    config.endpoint.clone(),
                    config.temperature,
                    config.existing_stems_limit,
                    Duration::from_secs(config.timeout_secs),
                )?))
            }
            ProviderType::Callable => {
                let endpoint = config.endpoint.clone().ok_or_else(|| {
                    ApiError::ProviderNotConfigured(
                        "Callable provider requires provider.endpoint".to_string(),
                    )
                })?;
                Ok(Arc::new(CallableQuestionGenerator::new(
                    endpoint,
                    config.api_key.clone(),
                    Duration::from_secs(config.timeout_secs),
                )?))
            }
        }
    }
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_http_client(request_timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .map_err(|e| ApiError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

// Helper function to map HTTP errors to ApiError
pub(crate) fn map_http_error(error: reqwest::Error) -> ApiError {
    if let Some(status) = error.status() {
        map_status_error(status.as_u16(), &error.to_string())
    } else if error.is_timeout() {
        ApiError::ProviderRequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ApiError::ProviderRequestFailed(format!("Connection error: {}", error))
    } else {
        ApiError::ProviderError(format!("HTTP error: {}", error))
    }
}

pub(crate) fn map_status_error(status: u16, detail: &str) -> ApiError {
    match status {
        401 | 403 => ApiError::ProviderAuthFailed(format!("Authentication failed: {}", detail)),
        429 => ApiError::ProviderRateLimit(format!("Rate limit exceeded: {}", detail)),
        404 => ApiError::ProviderModelNotFound(format!("Not found: {}", detail)),
        _ => ApiError::ProviderRequestFailed(format!(
            "Request failed with status {}: {}",
            status, detail
        )),
    }
}

/// Correct answer as generators send it: an option index or a label
#[derive(Deserialize)]
#[serde(untagged)]
enum AnswerWire {
    Index(u64),
    Label(String),
}

#[derive(Deserialize)]
struct QuestionWire {
    #[serde(default)]
    stem: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default, rename = "correctAnswer", alias = "correct_answer")]
    correct_answer: Option<AnswerWire>,
    #[serde(default)]
    explanation: String,
}

/// Convert generator items to questions, skipping entries without a usable stem.
pub(crate) fn questions_from_values(items: Vec<serde_json::Value>) -> Vec<GeneratedQuestion> {
    let mut questions = Vec::with_capacity(items.len());
    for item in items {
        let wire: QuestionWire = match serde_json::from_value(item) {
            Ok(wire) => wire,
            Err(e) => {
                warn!(error = %e, "Skipping malformed generated question");
                continue;
            }
        };
        if wire.stem.trim().is_empty() {
            warn!("Skipping generated question with empty stem");
            continue;
        }
        let correct_answer = match wire.correct_answer {
            Some(AnswerWire::Index(index)) => index.to_string(),
            Some(AnswerWire::Label(label)) => label,
            None => String::new(),
        };
        questions.push(GeneratedQuestion {
            stem: wire.stem,
            options: wire.options,
            correct_answer,
            explanation: wire.explanation,
        });
    }
    questions
}

/// Parse model output into questions.
///
/// Accepts a bare array, an object with a `questions` array, or any object whose
/// first array-valued field (in document order) holds the items. Unparsable output
/// yields no questions.
pub fn parse_generated_questions(content: &str) -> Vec<GeneratedQuestion> {
    let parsed: serde_json::Value = match serde_json::from_str(content.trim()) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Generator output is not valid JSON");
            return Vec::new();
        }
    };

    let items = match parsed {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => {
            let preferred = matches!(map.get("questions"), Some(serde_json::Value::Array(_)));
            map.into_iter()
                .find_map(|(key, value)| match value {
                    serde_json::Value::Array(items) if !preferred || key == "questions" => {
                        Some(items)
                    }
                    _ => None,
                })
                .unwrap_or_default()
        }
        _ => Vec::new(),
    };

    questions_from_values(items)
}
