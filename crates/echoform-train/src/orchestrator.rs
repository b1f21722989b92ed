// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The training orchestrator: turns completed analyses into persona models.
//!
//! Consumes [`AnalysisCompleted`] events from the pipeline and inherits each
//! job's ticket, so a supersede that lands mid-training is still observed at
//! the next checkpoint. A persona model that fails its post-create smoke
//! battery is deleted before the profile ever references it.

use std::sync::Arc;

use chrono::Utc;
use echoform_config::model::{OllamaConfig, ResponseConfig};
use echoform_core::traits::{InferenceAdapter, StorageAdapter};
use echoform_core::types::{GenerationOptions, InferenceMessage, TrainingPair, TrainingStatus};
use echoform_core::EchoformError;
use echoform_engine::quality;
use echoform_pipeline::jobs::JobRegistry;
use echoform_pipeline::pipeline::AnalysisCompleted;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::persona;

/// Prompts sent to a freshly created persona model before it is accepted.
const SMOKE_PROMPTS: [&str; 3] = [
    "Hello! How are you doing today?",
    "What do you think about that?",
    "Tell me about something you enjoy.",
];

/// The portion of a dataset artifact the trainer consumes.
#[derive(Debug, Deserialize)]
struct DatasetFile {
    training_pairs: Vec<TrainingPair>,
}

/// Drives persona model creation from completed analyses.
pub struct TrainingOrchestrator {
    inference: Arc<dyn InferenceAdapter>,
    storage: Arc<dyn StorageAdapter>,
    registry: Arc<JobRegistry>,
    ollama: OllamaConfig,
    max_response_length: usize,
}

impl TrainingOrchestrator {
    pub fn new(
        inference: Arc<dyn InferenceAdapter>,
        storage: Arc<dyn StorageAdapter>,
        registry: Arc<JobRegistry>,
        ollama: OllamaConfig,
        response: &ResponseConfig,
    ) -> Self {
        Self {
            inference,
            storage,
            registry,
            ollama,
            max_response_length: response.max_length,
        }
    }

    /// Consume completion events until the channel closes or shutdown fires.
    pub async fn run(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<AnalysisCompleted>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("training orchestrator shutting down");
                    break;
                }
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    self.handle(event).await;
                }
            }
        }
    }

    /// Supervised job body for one training run.
    async fn handle(&self, event: AnalysisCompleted) {
        let key = event.key.clone();
        match self.execute(&event).await {
            Ok(model_ref) => {
                // Terminal write: only the current job may record completion.
                if self.registry.is_current(&event.ticket) {
                    if let Err(e) = self.storage.complete_profile(&key, &model_ref).await {
                        error!(key = %key, error = %e, "failed to record completed profile");
                    }
                    self.registry.finish(&event.ticket);
                    info!(key = %key, model = %model_ref, "training complete");
                } else {
                    debug!(key = %key, "training finished but job was superseded");
                }
            }
            Err(EchoformError::Superseded) => {
                debug!(key = %key, "training superseded, unwinding without terminal write");
            }
            Err(e) => {
                error!(key = %key, error = %e, "training failed");
                if self.registry.is_current(&event.ticket) {
                    let _ = self.storage.fail_profile(&key, &e.to_string()).await;
                    self.registry.finish(&event.ticket);
                }
            }
        }
    }

    async fn execute(&self, event: &AnalysisCompleted) -> Result<String, EchoformError> {
        let key = &event.key;

        event.ticket.checkpoint()?;
        self.ensure_base_model().await?;

        let pairs = load_dataset(&event.dataset_ref).await?;
        self.storage
            .set_profile_progress(key, TrainingStatus::Training, 0)
            .await?;

        event.ticket.checkpoint()?;
        let model_ref = persona::model_name(key, Utc::now());
        let modelfile = persona::build_modelfile(&self.ollama.base_model, &pairs);
        self.inference.create_model(&model_ref, &modelfile).await?;
        debug!(key = %key, model = %model_ref, pairs = pairs.len(), "persona model created");

        event.ticket.checkpoint()?;
        if let Err(reason) = self.smoke_test(&model_ref).await {
            warn!(model = %model_ref, %reason, "persona model failed smoke test, deleting");
            self.inference.delete_model(&model_ref).await?;
            return Err(EchoformError::DataIntegrity(format!(
                "persona model failed smoke test: {reason}"
            )));
        }

        event.ticket.checkpoint()?;
        Ok(model_ref)
    }

    /// Pull the configured base model if the backend does not have it yet.
    async fn ensure_base_model(&self) -> Result<(), EchoformError> {
        let models = self.inference.list_models().await?;
        if !models.iter().any(|m| m == &self.ollama.base_model) {
            info!(model = %self.ollama.base_model, "base model missing, pulling");
            self.inference.pull_model(&self.ollama.base_model).await?;
        }
        Ok(())
    }

    /// Run the fixed smoke prompts through the new model, gated by the same
    /// quality rules live responses use.
    async fn smoke_test(&self, model_ref: &str) -> Result<(), String> {
        for prompt in SMOKE_PROMPTS {
            let reply = self
                .inference
                .chat(
                    model_ref,
                    &[InferenceMessage::user(prompt)],
                    &GenerationOptions::default(),
                )
                .await
                .map_err(|e| e.to_string())?;
            quality::check(&reply, self.max_response_length).map_err(|issue| issue.to_string())?;
        }
        Ok(())
    }
}

async fn load_dataset(dataset_ref: &str) -> Result<Vec<TrainingPair>, EchoformError> {
    let raw = tokio::fs::read_to_string(dataset_ref)
        .await
        .map_err(|e| EchoformError::Storage {
            source: Box::new(e),
        })?;
    let parsed: DatasetFile = serde_json::from_str(&raw)
        .map_err(|e| EchoformError::DataIntegrity(format!("unreadable dataset artifact: {e}")))?;
    if parsed.training_pairs.is_empty() {
        return Err(EchoformError::DataIntegrity(
            "dataset artifact contains no training pairs".to_string(),
        ));
    }
    Ok(parsed.training_pairs)
}
