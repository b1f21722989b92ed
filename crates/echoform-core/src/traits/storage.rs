// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::EchoformError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CorpusEntry, EchoSession, Profile, ProfileKey, ResponseEvent, TrainingStatus};

/// Adapter for storage and persistence backends.
///
/// Storage adapters manage the lifecycle of database connections and provide
/// typed operations over profiles, corpus entries, echo sessions, and
/// response audit events. The persisted store is the source of truth for
/// session activity; callers query it directly rather than caching rows.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), EchoformError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), EchoformError>;

    // --- Profile operations ---

    /// Inserts or fully replaces a profile row keyed by (user, server).
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), EchoformError>;

    async fn get_profile(&self, key: &ProfileKey) -> Result<Option<Profile>, EchoformError>;

    /// Updates status and advisory progress.
    async fn set_profile_progress(
        &self,
        key: &ProfileKey,
        status: TrainingStatus,
        progress: i64,
    ) -> Result<(), EchoformError>;

    /// Records the dataset artifact a completed analysis produced.
    async fn set_profile_dataset(
        &self,
        key: &ProfileKey,
        dataset_ref: &str,
    ) -> Result<(), EchoformError>;

    /// Moves a profile to `failed` with a human-readable reason.
    async fn fail_profile(&self, key: &ProfileKey, error: &str) -> Result<(), EchoformError>;

    /// Moves a profile to `completed`, recording the trained model reference.
    async fn complete_profile(
        &self,
        key: &ProfileKey,
        model_ref: &str,
    ) -> Result<(), EchoformError>;

    /// Lists all profiles on a server.
    async fn list_profiles(&self, server_id: &str) -> Result<Vec<Profile>, EchoformError>;

    /// Deletes profiles not updated within the retention horizon.
    /// Returns the number of rows removed.
    async fn delete_profiles_older_than(&self, days: u32) -> Result<u64, EchoformError>;

    // --- Corpus operations ---

    /// Atomically replaces the collected corpus for a profile key.
    async fn replace_corpus(
        &self,
        key: &ProfileKey,
        entries: &[CorpusEntry],
    ) -> Result<(), EchoformError>;

    /// Loads the corpus for a profile key, oldest first.
    async fn load_corpus(&self, key: &ProfileKey) -> Result<Vec<CorpusEntry>, EchoformError>;

    /// Deletes corpus entries older than the retention horizon.
    /// Returns the number of rows removed.
    async fn delete_corpus_older_than(&self, days: u32) -> Result<u64, EchoformError>;

    // --- Session operations ---

    /// Inserts a new active session, deactivating any session currently
    /// active in the same channel, in one transaction.
    /// Returns the number of sessions superseded (0 or 1).
    async fn insert_session_superseding(
        &self,
        session: &EchoSession,
    ) -> Result<u64, EchoformError>;

    async fn active_session_in_channel(
        &self,
        channel_id: &str,
    ) -> Result<Option<EchoSession>, EchoformError>;

    /// Lists every active session across all servers (startup reconciliation).
    async fn list_active_sessions(&self) -> Result<Vec<EchoSession>, EchoformError>;

    async fn count_active_sessions(&self, server_id: &str) -> Result<i64, EchoformError>;

    /// Deactivates the active session in a channel, if any, recording the
    /// stop timestamp. Returns the stopped session.
    async fn stop_active_in_channel(
        &self,
        channel_id: &str,
    ) -> Result<Option<EchoSession>, EchoformError>;

    /// Bumps `messages_generated` and `last_activity` for a session.
    async fn record_session_message(&self, session_id: &str) -> Result<(), EchoformError>;

    /// Bumps `conversations_started` and `last_activity` for a session.
    async fn record_conversation_started(&self, session_id: &str) -> Result<(), EchoformError>;

    /// Deactivates sessions whose `last_activity` is older than the idle
    /// horizon. Returns the number of sessions expired.
    async fn expire_idle_sessions(&self, max_idle_hours: u64) -> Result<u64, EchoformError>;

    // --- Response event operations ---

    async fn insert_response_event(&self, event: &ResponseEvent) -> Result<(), EchoformError>;

    /// Deletes response events older than the retention horizon.
    async fn delete_events_older_than(&self, days: u32) -> Result<u64, EchoformError>;
}
