//! OpenAI-compatible chat completion generator.

use crate::error::ApiError;
use crate::provider::{
    build_http_client, map_http_error, map_status_error, parse_generated_questions,
    GeneratedQuestion, GenerationRequest, QuestionGenerator,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

const SYSTEM_PROMPT: &str = "You are a certification exam question generator. \
Return ONLY a raw JSON object of the form {\"questions\": [...]}. Do not include markdown formatting.";

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Generates questions through `/chat/completions` in JSON-object mode
pub struct OpenAIQuestionGenerator {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
    temperature: f32,
    existing_stems_limit: usize,
}

impl OpenAIQuestionGenerator {
    pub fn new(
        model: String,
        api_key: String,
        base_url: Option<String>,
        temperature: f32,
        existing_stems_limit: usize,
        request_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = build_http_client(request_timeout)?;
        let base_url = base_url
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            model,
            api_key,
            base_url,
            temperature,
            existing_stems_limit,
        })
    }

    fn user_prompt(&self, request: &GenerationRequest) -> String {
        build_user_prompt(request, self.existing_stems_limit)
    }
}

/// Prompt asking for `count` questions; quotes at most `stems_limit` existing stems.
pub(crate) fn build_user_prompt(request: &GenerationRequest, stems_limit: usize) -> String {
    let avoid: Vec<&String> = request.existing_stems.iter().take(stems_limit).collect();
    let avoid_json = serde_json::to_string(&avoid).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Generate {count} unique, high-quality certification exam questions about \"{topic}\".\n\
         Difficulty: {difficulty}.\n\n\
         Each object must have:\n\
         - stem: The question text (scenario-based).\n\
         - options: Array of 4 strings.\n\
         - correctAnswer: Index of the correct option (0-3).\n\
         - explanation: Why the answer is correct.\n\n\
         Ensure questions are NOT in this list of existing questions: {avoid}",
        count = request.count,
        topic = request.topic,
        difficulty = request.difficulty,
        avoid = avoid_json,
    )
}

#[async_trait]
impl QuestionGenerator for OpenAIQuestionGenerator {
    #[instrument(level = "info", skip(self, request), fields(model = %self.model, topic = %request.topic, count = request.count))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedQuestion>, ApiError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: Some(SYSTEM_PROMPT.to_string()),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: Some(self.user_prompt(request)),
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat {
                r#type: "json_object",
            },
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status_error(status.as_u16(), &error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ApiError::ProviderError(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &completion.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "OpenAI usage"
            );
        }

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        let questions = parse_generated_questions(&content);
        debug!(returned = questions.len(), "Parsed generated questions");
        Ok(questions)
    }

    fn generator_name(&self) -> &str {
        "openai"
    }
}
