// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama inference backend adapter for the Echoform pipeline.
//!
//! Persona models are created and queried through Ollama's HTTP API. The
//! pipeline only uses the non-streaming endpoints: tags, pull, create, chat,
//! and delete.

pub mod adapter;
pub mod client;
pub mod types;

pub use adapter::OllamaAdapter;
pub use client::OllamaClient;
