// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Training dataset construction and artifact writing.

use chrono::Utc;
use echoform_core::types::{CorpusEntry, PairMetadata, TrainingPair};
use echoform_core::{EchoformError, ProfileKey};
use serde::Serialize;
use tracing::info;

/// On-disk shape of a dataset artifact.
#[derive(Debug, Serialize)]
struct DatasetArtifact<'a> {
    user_id: &'a str,
    server_id: &'a str,
    created_at: String,
    message_count: usize,
    training_pairs: &'a [TrainingPair],
}

/// Check the corpus size against the configured training window.
pub fn validate_window(count: usize, min: usize, max: usize) -> Result<(), EchoformError> {
    if count < min {
        return Err(EchoformError::DataIntegrity(format!(
            "Insufficient messages for training. Found {count}, need at least {min}"
        )));
    }
    if count > max {
        return Err(EchoformError::DataIntegrity(format!(
            "Too many messages for training. Found {count}, maximum is {max}"
        )));
    }
    Ok(())
}

/// Build prompt/response exemplars from a cleaned corpus, oldest first.
///
/// Each message becomes the response half of a pair; the prompt is a neutral
/// conversational frame. Position metadata preserves provenance.
pub fn build_training_pairs(entries: &[CorpusEntry]) -> Vec<TrainingPair> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| TrainingPair {
            prompt: format!(
                "You are responding in a chat conversation. Context: Message {}",
                i + 1
            ),
            response: entry.content.clone(),
            metadata: PairMetadata {
                timestamp: entry.posted_at.clone(),
                channel_id: entry.channel_id.clone(),
                message_index: i,
            },
        })
        .collect()
}

/// Write the dataset artifact to `dataset_dir` and return its path.
///
/// The filename embeds the profile key and a creation timestamp, so repeated
/// analyses never overwrite earlier artifacts.
pub async fn write_dataset(
    dataset_dir: &str,
    key: &ProfileKey,
    pairs: &[TrainingPair],
) -> Result<String, EchoformError> {
    let now = Utc::now();
    let filename = format!(
        "user_{}_server_{}_{}.json",
        key.user_id,
        key.server_id,
        now.format("%Y%m%d_%H%M%S")
    );
    let path = std::path::Path::new(dataset_dir).join(filename);

    let artifact = DatasetArtifact {
        user_id: &key.user_id,
        server_id: &key.server_id,
        created_at: now.to_rfc3339(),
        message_count: pairs.len(),
        training_pairs: pairs,
    };
    let json = serde_json::to_string_pretty(&artifact)
        .map_err(|e| EchoformError::Internal(format!("dataset serialization failed: {e}")))?;

    tokio::fs::create_dir_all(dataset_dir)
        .await
        .map_err(|e| EchoformError::Storage {
            source: Box::new(e),
        })?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| EchoformError::Storage {
            source: Box::new(e),
        })?;

    let path = path.to_string_lossy().into_owned();
    info!(path = %path, pairs = pairs.len(), "dataset artifact written");
    Ok(path)
}
