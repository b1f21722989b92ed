// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Echoform integration tests.
//!
//! In-memory mock implementations of the chat and inference adapter traits,
//! enabling fast, deterministic tests without a chat platform or a running
//! Ollama instance.

pub mod mock_chat;
pub mod mock_inference;

pub use mock_chat::{MockChat, message};
pub use mock_inference::MockInference;
