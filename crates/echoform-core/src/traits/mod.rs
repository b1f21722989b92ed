// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.

pub mod adapter;
pub mod chat;
pub mod inference;
pub mod storage;

pub use adapter::PluginAdapter;
pub use chat::ChatAdapter;
pub use inference::InferenceAdapter;
pub use storage::StorageAdapter;
