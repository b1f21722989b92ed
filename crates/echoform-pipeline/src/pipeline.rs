// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The analysis pipeline: collect, store, preprocess, build dataset.
//!
//! Each analysis runs as a supervised background job holding a [`JobTicket`].
//! Stage boundaries are checkpoints: a superseded job unwinds without
//! writing terminal state. Successful analyses emit an [`AnalysisCompleted`]
//! event; the training orchestrator picks it up from there and inherits the
//! ticket.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use echoform_config::model::{CorpusConfig, StorageConfig};
use echoform_core::traits::{ChatAdapter, StorageAdapter};
use echoform_core::types::{ChatMessage, CorpusEntry, Profile, TrainingStatus};
use echoform_core::{EchoformError, ProfileKey};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::collector;
use crate::dataset;
use crate::jobs::{JobRegistry, JobTicket};
use crate::lifecycle::{self, Stage};
use crate::text;

/// Emitted when an analysis finishes and a dataset artifact exists.
#[derive(Debug)]
pub struct AnalysisCompleted {
    pub key: ProfileKey,
    pub dataset_ref: String,
    /// The job ticket, inherited by the training orchestrator so a
    /// supersede during training is still observed.
    pub ticket: JobTicket,
}

/// Orchestrates analysis jobs over the chat and storage adapters.
pub struct AnalysisPipeline {
    chat: Arc<dyn ChatAdapter>,
    storage: Arc<dyn StorageAdapter>,
    registry: Arc<JobRegistry>,
    corpus: CorpusConfig,
    dataset_dir: String,
    completed_tx: mpsc::Sender<AnalysisCompleted>,
}

impl AnalysisPipeline {
    pub fn new(
        chat: Arc<dyn ChatAdapter>,
        storage: Arc<dyn StorageAdapter>,
        registry: Arc<JobRegistry>,
        corpus: CorpusConfig,
        storage_config: &StorageConfig,
        completed_tx: mpsc::Sender<AnalysisCompleted>,
    ) -> Self {
        Self {
            chat,
            storage,
            registry,
            corpus,
            dataset_dir: storage_config.dataset_dir.clone(),
            completed_tx,
        }
    }

    /// Validate the request, reset the profile, and spawn the analysis job.
    ///
    /// Returns the ticket of the spawned job. Any job already running for the
    /// same key is superseded.
    pub async fn start_analysis(
        self: &Arc<Self>,
        key: &ProfileKey,
        cutoff_input: &str,
        requester_id: &str,
    ) -> Result<JobTicket, EchoformError> {
        let cutoff = lifecycle::parse_cutoff(cutoff_input)?;
        lifecycle::validate_cutoff(cutoff, Utc::now())?;

        let ticket = self.registry.begin(key);
        let now = Utc::now().to_rfc3339();
        let profile = Profile {
            user_id: key.user_id.clone(),
            server_id: key.server_id.clone(),
            training_status: TrainingStatus::Collecting,
            training_progress: Stage::Collecting.progress(),
            cutoff_date: cutoff.to_rfc3339(),
            dataset_ref: None,
            model_ref: None,
            error_message: None,
            requester_id: requester_id.to_string(),
            started_at: now.clone(),
            completed_at: None,
            last_updated: now,
        };
        self.storage.upsert_profile(&profile).await?;

        let pipeline = Arc::clone(self);
        let job_ticket = ticket.clone();
        tokio::spawn(async move {
            pipeline.run(job_ticket, cutoff).await;
        });

        info!(key = %key, cutoff = %cutoff, "analysis started");
        Ok(ticket)
    }

    /// Supervised job body: runs the stages, handles supersede and failure.
    async fn run(self: Arc<Self>, ticket: JobTicket, cutoff: DateTime<Utc>) {
        let key = ticket.key.clone();
        match self.execute(&ticket, cutoff).await {
            Ok(dataset_ref) => {
                let event = AnalysisCompleted {
                    key: key.clone(),
                    dataset_ref,
                    ticket: ticket.clone(),
                };
                if self.completed_tx.send(event).await.is_err() {
                    error!(key = %key, "training orchestrator unavailable");
                    if self.registry.is_current(&ticket) {
                        let _ = self
                            .storage
                            .fail_profile(&key, "training orchestrator unavailable")
                            .await;
                        self.registry.finish(&ticket);
                    }
                }
            }
            Err(EchoformError::Superseded) => {
                debug!(key = %key, "analysis superseded, unwinding without terminal write");
            }
            Err(e) => {
                error!(key = %key, error = %e, "analysis failed");
                if self.registry.is_current(&ticket) {
                    let _ = self.storage.fail_profile(&key, &e.to_string()).await;
                    self.registry.finish(&ticket);
                }
            }
        }
    }

    async fn execute(
        &self,
        ticket: &JobTicket,
        cutoff: DateTime<Utc>,
    ) -> Result<String, EchoformError> {
        let key = &ticket.key;

        ticket.checkpoint()?;
        let messages =
            collector::collect_messages(self.chat.as_ref(), key, cutoff, self.corpus.max_messages)
                .await?;

        ticket.checkpoint()?;
        self.set_stage(key, Stage::Storing).await?;
        let raw_entries: Vec<CorpusEntry> =
            messages.iter().map(|m| to_corpus_entry(m, key)).collect();
        self.storage.replace_corpus(key, &raw_entries).await?;

        ticket.checkpoint()?;
        self.set_stage(key, Stage::Preprocessing).await?;
        let stored = self.storage.load_corpus(key).await?;
        let cleaned: Vec<CorpusEntry> = stored
            .into_iter()
            .filter_map(|mut entry| {
                let content = text::clean_content(&entry.content);
                if text::is_valid_for_training(&content) {
                    entry.content = content;
                    Some(entry)
                } else {
                    None
                }
            })
            .collect();
        debug!(key = %key, usable = cleaned.len(), "preprocessing complete");

        dataset::validate_window(cleaned.len(), self.corpus.min_messages, self.corpus.max_messages)?;

        ticket.checkpoint()?;
        self.set_stage(key, Stage::Dataset).await?;
        let pairs = dataset::build_training_pairs(&cleaned);
        let dataset_ref = dataset::write_dataset(&self.dataset_dir, key, &pairs).await?;
        self.storage.set_profile_dataset(key, &dataset_ref).await?;

        // Terminal write for this phase: verify currency first.
        ticket.checkpoint()?;
        self.set_stage(key, Stage::AnalysisComplete).await?;
        info!(key = %key, dataset = %dataset_ref, "analysis complete");
        Ok(dataset_ref)
    }

    async fn set_stage(&self, key: &ProfileKey, stage: Stage) -> Result<(), EchoformError> {
        self.storage
            .set_profile_progress(key, stage.status(), stage.progress())
            .await
    }
}

fn to_corpus_entry(message: &ChatMessage, key: &ProfileKey) -> CorpusEntry {
    CorpusEntry {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: key.user_id.clone(),
        server_id: key.server_id.clone(),
        channel_id: message.channel_id.clone(),
        content: message.content.clone(),
        posted_at: message.posted_at.to_rfc3339(),
    }
}
