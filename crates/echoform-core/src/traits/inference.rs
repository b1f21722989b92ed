// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inference adapter trait for the model backend (Ollama).

use async_trait::async_trait;

use crate::error::EchoformError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{GenerationOptions, InferenceMessage};

/// Adapter for the local inference backend used for persona training and
/// response generation.
///
/// Required operations: list, pull, create-from-spec, chat, delete. Training
/// internals stay behind this boundary; the pipeline only sees the
/// capability contract.
#[async_trait]
pub trait InferenceAdapter: PluginAdapter {
    /// Lists the names of all models known to the backend.
    async fn list_models(&self) -> Result<Vec<String>, EchoformError>;

    /// Pulls a model from the backend's registry.
    async fn pull_model(&self, name: &str) -> Result<(), EchoformError>;

    /// Creates a derived model from a persona specification (Modelfile text).
    async fn create_model(&self, name: &str, modelfile: &str) -> Result<(), EchoformError>;

    /// Runs a non-streaming chat completion and returns the response text.
    async fn chat(
        &self,
        model: &str,
        messages: &[InferenceMessage],
        options: &GenerationOptions,
    ) -> Result<String, EchoformError>;

    /// Deletes a model from the backend.
    async fn delete_model(&self, name: &str) -> Result<(), EchoformError>;
}
