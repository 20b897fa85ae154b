//! Remote grading backend client — an OpenAI-compatible chat-completions
//! endpoint reached over HTTPS with Bearer auth.
//!
//! Exactly one attempt per call, no retry loop: any transport error, non-2xx
//! status, or malformed body surfaces as `RemoteError` and the caller routes
//! to the local heuristic instead. Grading requests demand a strict JSON
//! object via `response_format`; summary requests are plain text.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("backend returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Client for the configured grading backend. Cheap to clone.
#[derive(Clone)]
pub struct RemoteGrader {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl RemoteGrader {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// JSON-object completion deserialized into `T`. Used for grading.
    pub async fn chat_json<T: DeserializeOwned>(
        &self,
        system: &str,
        user: &str,
    ) -> Result<T, RemoteError> {
        let format = Some(ResponseFormat {
            format_type: "json_object",
        });
        let text = self.chat(system, user, 0.3, format).await?;
        serde_json::from_str(&text).map_err(RemoteError::Parse)
    }

    /// Plain-text completion. Used for the final summary.
    pub async fn chat_plain(&self, system: &str, user: &str) -> Result<String, RemoteError> {
        self.chat(system, user, 0.5, None).await
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        response_format: Option<ResponseFormat>,
    ) -> Result<String, RemoteError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatRequestMessage {
                    role: "system",
                    content: system,
                },
                ChatRequestMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            response_format,
        };

        let response = self
            .client
            .post(&url)
            .header(USER_AGENT, concat!("interview-api/", env!("CARGO_PKG_VERSION")))
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_api_error(&body).unwrap_or(body);
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        let text = body
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        if text.is_empty() {
            return Err(RemoteError::EmptyContent);
        }

        debug!("Grading backend replied with {} chars", text.len());
        Ok(text)
    }
}

/// Pulls `error.message` out of an error body when the backend provides one.
fn extract_api_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|e| e.error.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_api_error_reads_message() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "auth"}}"#;
        assert_eq!(extract_api_error(body).as_deref(), Some("Invalid API key"));
    }

    #[test]
    fn test_extract_api_error_tolerates_other_shapes() {
        assert_eq!(extract_api_error("plain text error"), None);
        assert_eq!(extract_api_error("{}"), None);
    }

    #[test]
    fn test_chat_request_serializes_response_format() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatRequestMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.3,
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_chat_request_omits_absent_response_format() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![],
            temperature: 0.5,
            response_format: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("response_format").is_none());
    }
}
