// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Ollama API.
//!
//! Provides [`OllamaClient`] which handles request construction, transient
//! error retry, and response parsing for the non-streaming endpoints the
//! pipeline uses: tags, pull, create, chat, delete.

use std::time::Duration;

use echoform_core::EchoformError;
use echoform_core::types::{GenerationOptions, InferenceMessage};
use tracing::{debug, warn};

use crate::types::{
    ApiErrorResponse, ChatRequest, ChatResponse, CreateRequest, DeleteRequest, PullRequest,
    TagsResponse,
};

/// HTTP client for Ollama API communication.
///
/// Manages connection pooling and retry logic for transient errors
/// (429, 500, 503).
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl OllamaClient {
    /// Creates a new Ollama API client.
    ///
    /// `host` is the base URL, e.g. `http://localhost:11434`. Model pulls and
    /// creates can take minutes, so `timeout` should come from configuration
    /// rather than a hardcoded short value.
    pub fn new(host: &str, timeout: Duration) -> Result<Self, EchoformError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EchoformError::ExternalService {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: host.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// Returns the base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists the names of all models known to the backend.
    pub async fn list_models(&self) -> Result<Vec<String>, EchoformError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.get_with_retry(&url).await?;
        let tags: TagsResponse =
            serde_json::from_str(&response).map_err(|e| EchoformError::ExternalService {
                message: format!("failed to parse tags response: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Pulls a model from the registry, blocking until the pull completes.
    pub async fn pull_model(&self, name: &str) -> Result<(), EchoformError> {
        let url = format!("{}/api/pull", self.base_url);
        let body = PullRequest {
            name: name.to_string(),
            stream: false,
        };
        self.post_with_retry(&url, &body).await?;
        debug!(model = name, "model pulled");
        Ok(())
    }

    /// Creates a derived model from a Modelfile.
    pub async fn create_model(&self, name: &str, modelfile: &str) -> Result<(), EchoformError> {
        let url = format!("{}/api/create", self.base_url);
        let body = CreateRequest {
            name: name.to_string(),
            modelfile: modelfile.to_string(),
            stream: false,
        };
        self.post_with_retry(&url, &body).await?;
        debug!(model = name, "model created");
        Ok(())
    }

    /// Runs a non-streaming chat completion and returns the response text.
    pub async fn chat(
        &self,
        model: &str,
        messages: &[InferenceMessage],
        options: &GenerationOptions,
    ) -> Result<String, EchoformError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            stream: false,
            options: options.clone(),
        };
        let response = self.post_with_retry(&url, &body).await?;
        let chat: ChatResponse =
            serde_json::from_str(&response).map_err(|e| EchoformError::ExternalService {
                message: format!("failed to parse chat response: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(chat.message.content)
    }

    /// Deletes a model from the backend.
    ///
    /// A 404 is treated as success: the model is already gone.
    pub async fn delete_model(&self, name: &str) -> Result<(), EchoformError> {
        let url = format!("{}/api/delete", self.base_url);
        let body = DeleteRequest {
            name: name.to_string(),
        };
        let response = self
            .client
            .delete(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EchoformError::ExternalService {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            debug!(model = name, "model deleted");
            return Ok(());
        }

        Err(error_from_response(status, response).await)
    }

    async fn get_with_retry(&self, url: &str) -> Result<String, EchoformError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, url, "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self.client.get(url).send().await.map_err(|e| {
                EchoformError::ExternalService {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                }
            })?;

            let status = response.status();
            debug!(status = %status, attempt, url, "response received");

            if status.is_success() {
                return response
                    .text()
                    .await
                    .map_err(|e| EchoformError::ExternalService {
                        message: format!("failed to read response body: {e}"),
                        source: Some(Box::new(e)),
                    });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(EchoformError::ExternalService {
                    message: format!("Ollama returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            return Err(error_from_response(status, response).await);
        }

        Err(last_error.unwrap_or_else(|| EchoformError::ExternalService {
            message: "request failed after retries".into(),
            source: None,
        }))
    }

    async fn post_with_retry<B: serde::Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<String, EchoformError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, url, "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self.client.post(url).json(body).send().await.map_err(|e| {
                EchoformError::ExternalService {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                }
            })?;

            let status = response.status();
            debug!(status = %status, attempt, url, "response received");

            if status.is_success() {
                return response
                    .text()
                    .await
                    .map_err(|e| EchoformError::ExternalService {
                        message: format!("failed to read response body: {e}"),
                        source: Some(Box::new(e)),
                    });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(EchoformError::ExternalService {
                    message: format!("Ollama returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            return Err(error_from_response(status, response).await);
        }

        Err(last_error.unwrap_or_else(|| EchoformError::ExternalService {
            message: "request failed after retries".into(),
            source: None,
        }))
    }
}

async fn error_from_response(
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> EchoformError {
    let body = response.text().await.unwrap_or_default();
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
        format!("Ollama API error ({status}): {}", api_err.error)
    } else {
        format!("Ollama returned {status}: {body}")
    };
    EchoformError::ExternalService {
        message,
        source: None,
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OllamaClient {
        OllamaClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn list_models_parses_tag_names() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "models": [
                {"name": "dolphin3:latest", "size": 4000000},
                {"name": "echo_user_u1_server_s1_20260101_120000", "size": 4000000}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let models = test_client(&server.uri()).list_models().await.unwrap();
        assert_eq!(
            models,
            vec![
                "dolphin3:latest".to_string(),
                "echo_user_u1_server_s1_20260101_120000".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn list_models_retries_on_503() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})),
            )
            .mount(&server)
            .await;

        let models = test_client(&server.uri()).list_models().await.unwrap();
        assert!(models.is_empty());
    }

    #[tokio::test]
    async fn chat_returns_message_content() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "model": "echo_user_u1_server_s1_20260101_120000",
            "message": {"role": "assistant", "content": "yeah that tracks"},
            "done": true
        });
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let messages = vec![InferenceMessage::user("what do you think?")];
        let response = client
            .chat(
                "echo_user_u1_server_s1_20260101_120000",
                &messages,
                &GenerationOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(response, "yeah that tracks");
    }

    #[tokio::test]
    async fn create_model_posts_modelfile() {
        let server = MockServer::start().await;

        let expected = serde_json::json!({
            "name": "echo_user_u1_server_s1_20260101_120000",
            "modelfile": "FROM dolphin3:latest\n",
            "stream": false
        });
        Mock::given(method("POST"))
            .and(path("/api/create"))
            .and(body_json(&expected))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success"
            })))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server.uri())
            .create_model(
                "echo_user_u1_server_s1_20260101_120000",
                "FROM dolphin3:latest\n",
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_model_tolerates_missing_model() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/delete"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "model not found"
            })))
            .mount(&server)
            .await;

        test_client(&server.uri())
            .delete_model("echo_user_gone_server_s1_20200101_000000")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_transient_error_surfaces_api_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid model name"
            })))
            .mount(&server)
            .await;

        let result = test_client(&server.uri()).pull_model("???").await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("invalid model name"), "got: {err}");
    }
}
