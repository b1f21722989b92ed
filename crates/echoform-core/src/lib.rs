// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Echoform personality pipeline.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Echoform workspace. All adapter plugins
//! implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::EchoformError;
pub use types::{
    AdapterType, ChannelCapabilities, ChatMessage, CorpusEntry, EchoSession, HealthStatus,
    Profile, ProfileKey, ResponseEvent, TrainingPair, TrainingStatus,
};

// Re-export all adapter traits at crate root.
pub use traits::{ChatAdapter, InferenceAdapter, PluginAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_serialization() {
        let chat = AdapterType::Chat;
        let json = serde_json::to_string(&chat).expect("should serialize");
        let parsed: AdapterType = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(chat, parsed);
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Accessibility check: if any trait module is missing or broken,
        // this won't compile.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_chat_adapter<T: ChatAdapter>() {}
        fn _assert_inference_adapter<T: InferenceAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
    }
}
