//! Client for a deployed callable `generateQuestions` function.
//!
//! Callable functions take `{"data": <request>}` and answer `{"result": <value>}` on
//! success or `{"error": {"status", "message"}}` on failure.

use crate::error::ApiError;
use crate::provider::{
    build_http_client, map_http_error, map_status_error, questions_from_values,
    GeneratedQuestion, GenerationRequest, QuestionGenerator,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct CallableRequest<'a> {
    data: &'a GenerationRequest,
}

#[derive(Deserialize)]
struct CallableResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<CallableError>,
}

#[derive(Deserialize)]
struct CallableError {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct CallableQuestionGenerator {
    client: Client,
    endpoint: String,
    id_token: Option<String>,
}

impl CallableQuestionGenerator {
    pub fn new(
        endpoint: String,
        id_token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_http_client(request_timeout)?,
            endpoint,
            id_token,
        })
    }
}

/// Interpret a callable response body.
fn questions_from_response(response: CallableResponse) -> Result<Vec<GeneratedQuestion>, ApiError> {
    if let Some(error) = response.error {
        return Err(ApiError::GenerationFailed(format!(
            "{}: {}",
            error.status.unwrap_or_else(|| "INTERNAL".to_string()),
            error.message.unwrap_or_default()
        )));
    }
    match response.result {
        Some(serde_json::Value::Array(items)) => Ok(questions_from_values(items)),
        Some(serde_json::Value::Null) | None => Ok(Vec::new()),
        Some(other) => Err(ApiError::GenerationFailed(format!(
            "Unexpected callable result: {}",
            other
        ))),
    }
}

#[async_trait]
impl QuestionGenerator for CallableQuestionGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedQuestion>, ApiError> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .json(&CallableRequest { data: request });
        if let Some(token) = &self.id_token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let response = builder.send().await.map_err(map_http_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_http_error)?;
        // Callable errors carry a JSON body even on non-2xx statuses.
        match serde_json::from_str::<CallableResponse>(&text) {
            Ok(body) if body.error.is_some() || status.is_success() => {
                questions_from_response(body)
            }
            _ if !status.is_success() => Err(map_status_error(status.as_u16(), &text)),
            Err(e) => Err(ApiError::ProviderError(format!(
                "Failed to parse callable response: {}",
                e
            ))),
            Ok(_) => Ok(Vec::new()),
        }
    }

    fn generator_name(&self) -> &str {
        "callable"
    }
}
