// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock inference adapter for deterministic testing.
//!
//! `MockInference` implements `InferenceAdapter` with pre-configured chat
//! responses and an in-memory model registry, enabling fast, CI-runnable
//! tests without a running Ollama instance.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use echoform_core::EchoformError;
use echoform_core::traits::adapter::PluginAdapter;
use echoform_core::traits::inference::InferenceAdapter;
use echoform_core::types::{AdapterType, GenerationOptions, HealthStatus, InferenceMessage};

/// A mock inference backend with a FIFO queue of chat responses.
///
/// Chat responses are popped from the queue; when it is empty, a default
/// "mock response" text is returned. Created and pulled models accumulate in
/// an in-memory registry so tests can assert on backend state.
pub struct MockInference {
    responses: Arc<Mutex<VecDeque<String>>>,
    models: Arc<Mutex<Vec<String>>>,
    modelfiles: Arc<Mutex<Vec<(String, String)>>>,
    chats: Arc<Mutex<Vec<(String, String)>>>,
    fail_chat: Arc<Mutex<bool>>,
}

impl MockInference {
    /// Create a new mock with an empty response queue and no models.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            models: Arc::new(Mutex::new(Vec::new())),
            modelfiles: Arc::new(Mutex::new(Vec::new())),
            chats: Arc::new(Mutex::new(Vec::new())),
            fail_chat: Arc::new(Mutex::new(false)),
        }
    }

    /// Create a mock pre-loaded with the given chat responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            models: Arc::new(Mutex::new(Vec::new())),
            modelfiles: Arc::new(Mutex::new(Vec::new())),
            chats: Arc::new(Mutex::new(Vec::new())),
            fail_chat: Arc::new(Mutex::new(false)),
        }
    }

    /// Add a chat response to the end of the queue.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(text.into());
    }

    /// Pre-register a model name as if it had been pulled.
    pub async fn add_model(&self, name: impl Into<String>) {
        self.models.lock().await.push(name.into());
    }

    /// Make subsequent chat calls fail with an external service error.
    pub async fn fail_chats(&self, fail: bool) {
        *self.fail_chat.lock().await = fail;
    }

    /// Returns every (name, modelfile) pair passed to `create_model`.
    pub async fn created_models(&self) -> Vec<(String, String)> {
        self.modelfiles.lock().await.clone()
    }

    /// Returns every chat call as (model, last message content) pairs.
    pub async fn chat_calls(&self) -> Vec<(String, String)> {
        self.chats.lock().await.clone()
    }

    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string())
    }
}

impl Default for MockInference {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockInference {
    fn name(&self) -> &str {
        "mock-inference"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Inference
    }

    async fn health_check(&self) -> Result<HealthStatus, EchoformError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), EchoformError> {
        Ok(())
    }
}

#[async_trait]
impl InferenceAdapter for MockInference {
    async fn list_models(&self) -> Result<Vec<String>, EchoformError> {
        Ok(self.models.lock().await.clone())
    }

    async fn pull_model(&self, name: &str) -> Result<(), EchoformError> {
        let mut models = self.models.lock().await;
        if !models.iter().any(|m| m == name) {
            models.push(name.to_string());
        }
        Ok(())
    }

    async fn create_model(&self, name: &str, modelfile: &str) -> Result<(), EchoformError> {
        self.modelfiles
            .lock()
            .await
            .push((name.to_string(), modelfile.to_string()));
        let mut models = self.models.lock().await;
        if !models.iter().any(|m| m == name) {
            models.push(name.to_string());
        }
        Ok(())
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[InferenceMessage],
        _options: &GenerationOptions,
    ) -> Result<String, EchoformError> {
        let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.chats.lock().await.push((model.to_string(), last));
        if *self.fail_chat.lock().await {
            return Err(EchoformError::ExternalService {
                message: "mock chat failure".to_string(),
                source: None,
            });
        }
        Ok(self.next_response().await)
    }

    async fn delete_model(&self, name: &str) -> Result<(), EchoformError> {
        self.models.lock().await.retain(|m| m != name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chat_pops_queued_responses_then_defaults() {
        let mock = MockInference::new();
        mock.add_response("first").await;
        mock.add_response("second").await;

        let opts = GenerationOptions::default();
        let msgs = [InferenceMessage::user("hi")];
        assert_eq!(mock.chat("m", &msgs, &opts).await.unwrap(), "first");
        assert_eq!(mock.chat("m", &msgs, &opts).await.unwrap(), "second");
        assert_eq!(mock.chat("m", &msgs, &opts).await.unwrap(), "mock response");
    }

    #[tokio::test]
    async fn create_and_delete_update_registry() {
        let mock = MockInference::new();
        mock.create_model("persona-1", "FROM base\n").await.unwrap();
        assert_eq!(mock.list_models().await.unwrap(), vec!["persona-1"]);

        let created = mock.created_models().await;
        assert_eq!(created[0].1, "FROM base\n");

        mock.delete_model("persona-1").await.unwrap();
        assert!(mock.list_models().await.unwrap().is_empty());
    }
}
