// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the Ollama HTTP API.

use echoform_core::types::{GenerationOptions, InferenceMessage};
use serde::{Deserialize, Serialize};

/// Response from `GET /api/tags`.
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

/// One model entry in the tags listing.
#[derive(Debug, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

/// Request body for `POST /api/pull`.
#[derive(Debug, Serialize)]
pub struct PullRequest {
    pub name: String,
    pub stream: bool,
}

/// Request body for `POST /api/create`.
#[derive(Debug, Serialize)]
pub struct CreateRequest {
    pub name: String,
    pub modelfile: String,
    pub stream: bool,
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<InferenceMessage>,
    pub stream: bool,
    pub options: GenerationOptions,
}

/// Response from `POST /api/chat` with `stream: false`.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub message: ChatResponseMessage,
}

/// The assistant message inside a chat response.
#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    pub content: String,
}

/// Request body for `DELETE /api/delete`.
#[derive(Debug, Serialize)]
pub struct DeleteRequest {
    pub name: String,
}

/// Error body Ollama returns on failure.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}
