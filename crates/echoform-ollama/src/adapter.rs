// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! InferenceAdapter implementation backed by [`OllamaClient`].

use std::time::Duration;

use async_trait::async_trait;

use echoform_config::model::OllamaConfig;
use echoform_core::types::{GenerationOptions, InferenceMessage};
use echoform_core::{
    AdapterType, EchoformError, HealthStatus, InferenceAdapter, PluginAdapter,
};

use crate::client::OllamaClient;

/// Ollama-backed inference adapter.
pub struct OllamaAdapter {
    client: OllamaClient,
}

impl OllamaAdapter {
    pub fn new(config: &OllamaConfig) -> Result<Self, EchoformError> {
        let client = OllamaClient::new(
            &config.host,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self { client })
    }

    /// Build an adapter around an existing client (used by tests).
    pub fn from_client(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for OllamaAdapter {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Inference
    }

    async fn health_check(&self) -> Result<HealthStatus, EchoformError> {
        match self.client.list_models().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Ollama unreachable at {}: {e}",
                self.client.base_url()
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), EchoformError> {
        // HTTP client holds no resources that need explicit release.
        Ok(())
    }
}

#[async_trait]
impl InferenceAdapter for OllamaAdapter {
    async fn list_models(&self) -> Result<Vec<String>, EchoformError> {
        self.client.list_models().await
    }

    async fn pull_model(&self, name: &str) -> Result<(), EchoformError> {
        self.client.pull_model(name).await
    }

    async fn create_model(&self, name: &str, modelfile: &str) -> Result<(), EchoformError> {
        self.client.create_model(name, modelfile).await
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[InferenceMessage],
        options: &GenerationOptions,
    ) -> Result<String, EchoformError> {
        self.client.chat(model, messages, options).await
    }

    async fn delete_model(&self, name: &str) -> Result<(), EchoformError> {
        self.client.delete_model(name).await
    }
}
