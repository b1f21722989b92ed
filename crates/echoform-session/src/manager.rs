// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Echo session lifecycle and concurrency management.
//!
//! The persisted store is the source of truth for session activity; the
//! manager adds per-channel serialization so concurrent start/stop requests
//! for the same channel cannot interleave. One channel holds at most one
//! active session, and each server is capped at a configured number of
//! active sessions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use echoform_config::model::SessionConfig;
use echoform_core::traits::StorageAdapter;
use echoform_core::types::{EchoSession, Profile, TrainingStatus};
use echoform_core::{EchoformError, ProfileKey};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Result of a successful session start.
#[derive(Debug)]
pub struct StartOutcome {
    pub session: EchoSession,
    /// The trained model backing this session.
    pub model_ref: String,
    /// Whether an existing session in the channel was replaced.
    pub superseded: bool,
}

/// Result of a stop request. Stopping a channel with no active session is
/// not an error.
#[derive(Debug)]
pub enum StopOutcome {
    Stopped(EchoSession),
    NothingActive,
}

/// Aggregate activity for one server.
#[derive(Debug)]
pub struct ServerStats {
    pub active_sessions: i64,
    pub messages_generated: i64,
    pub conversations_started: i64,
    /// Profile counts keyed by training status.
    pub profiles_by_status: HashMap<TrainingStatus, usize>,
}

/// Manages echo sessions over the storage adapter.
pub struct SessionManager {
    storage: Arc<dyn StorageAdapter>,
    config: SessionConfig,
    /// Per-channel start/stop serialization.
    channel_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionManager {
    pub fn new(storage: Arc<dyn StorageAdapter>, config: SessionConfig) -> Self {
        Self {
            storage,
            config,
            channel_locks: DashMap::new(),
        }
    }

    fn channel_lock(&self, channel_id: &str) -> Arc<Mutex<()>> {
        self.channel_locks
            .entry(channel_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load sessions that were active when the process last stopped.
    ///
    /// Called once at startup so restarted echoes resume from persisted
    /// state rather than silently going dormant.
    pub async fn reconcile(&self) -> Result<Vec<EchoSession>, EchoformError> {
        let sessions = self.storage.list_active_sessions().await?;
        if !sessions.is_empty() {
            info!(count = sessions.len(), "resuming active echo sessions");
        }
        Ok(sessions)
    }

    /// Start an echo session for `key` in `channel_id`.
    ///
    /// Requires a ready profile. An active session already in the channel is
    /// superseded atomically and does not count against the server limit,
    /// since the replacement nets out to the same number of active sessions.
    pub async fn start(
        &self,
        key: &ProfileKey,
        channel_id: &str,
        requester_id: &str,
    ) -> Result<StartOutcome, EchoformError> {
        let lock = self.channel_lock(channel_id);
        let _guard = lock.lock().await;

        let profile = self.storage.get_profile(key).await?;
        let model_ref = match profile {
            Some(ref p) if p.is_ready() => p.model_ref.clone().ok_or_else(|| {
                EchoformError::Internal("ready profile without model reference".to_string())
            })?,
            Some(p) => {
                return Err(EchoformError::NotFound(format!(
                    "echo for user {} is not ready (status: {})",
                    key.user_id, p.training_status
                )));
            }
            None => {
                return Err(EchoformError::NotFound(format!(
                    "no trained echo for user {} on this server",
                    key.user_id
                )));
            }
        };

        let active_count = self.storage.count_active_sessions(&key.server_id).await?;
        let replacing = self
            .storage
            .active_session_in_channel(channel_id)
            .await?
            .is_some();
        let effective = if replacing {
            active_count - 1
        } else {
            active_count
        };
        if effective >= self.config.max_active_per_server as i64 {
            return Err(EchoformError::Capacity(format!(
                "server {} already has {} active echo sessions (limit {})",
                key.server_id, active_count, self.config.max_active_per_server
            )));
        }

        let now = Utc::now().to_rfc3339();
        let session = EchoSession {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: key.user_id.clone(),
            server_id: key.server_id.clone(),
            channel_id: channel_id.to_string(),
            requester_id: requester_id.to_string(),
            is_active: true,
            messages_generated: 0,
            conversations_started: 0,
            started_at: now.clone(),
            stopped_at: None,
            last_activity: now,
        };
        let superseded = self.storage.insert_session_superseding(&session).await? > 0;
        if superseded {
            warn!(channel = %channel_id, "existing echo session superseded");
        }
        info!(key = %key, channel = %channel_id, session = %session.id, "echo session started");

        Ok(StartOutcome {
            session,
            model_ref,
            superseded,
        })
    }

    /// Whether the server has room for one more active session.
    ///
    /// Advisory only: `start` re-checks under the channel lock, so a `true`
    /// here can still lose to a concurrent start.
    pub async fn can_start(&self, server_id: &str) -> Result<bool, EchoformError> {
        let active = self.storage.count_active_sessions(server_id).await?;
        Ok(active < self.config.max_active_per_server as i64)
    }

    /// Stop the active session in a channel, if any.
    pub async fn stop(&self, channel_id: &str) -> Result<StopOutcome, EchoformError> {
        let lock = self.channel_lock(channel_id);
        let _guard = lock.lock().await;

        match self.storage.stop_active_in_channel(channel_id).await? {
            Some(session) => {
                info!(channel = %channel_id, session = %session.id, "echo session stopped");
                Ok(StopOutcome::Stopped(session))
            }
            None => Ok(StopOutcome::NothingActive),
        }
    }

    pub async fn active_in_channel(
        &self,
        channel_id: &str,
    ) -> Result<Option<EchoSession>, EchoformError> {
        self.storage.active_session_in_channel(channel_id).await
    }

    /// Aggregate activity counters and profile-status breakdown for a server.
    pub async fn server_stats(&self, server_id: &str) -> Result<ServerStats, EchoformError> {
        let sessions = self.storage.list_active_sessions().await?;
        let mut stats = ServerStats {
            active_sessions: 0,
            messages_generated: 0,
            conversations_started: 0,
            profiles_by_status: HashMap::new(),
        };
        for session in sessions.iter().filter(|s| s.server_id == server_id) {
            stats.active_sessions += 1;
            stats.messages_generated += session.messages_generated;
            stats.conversations_started += session.conversations_started;
        }
        for profile in self.storage.list_profiles(server_id).await? {
            *stats
                .profiles_by_status
                .entry(profile.training_status)
                .or_insert(0) += 1;
        }
        Ok(stats)
    }

    /// Record one generated response against a session.
    pub async fn record_response(&self, session_id: &str) -> Result<(), EchoformError> {
        self.storage.record_session_message(session_id).await
    }

    /// Record one self-initiated conversation against a session.
    pub async fn record_conversation(&self, session_id: &str) -> Result<(), EchoformError> {
        self.storage.record_conversation_started(session_id).await
    }

    /// Expire sessions idle past the configured horizon. Returns how many
    /// were deactivated.
    pub async fn expire_idle(&self) -> Result<u64, EchoformError> {
        self.storage
            .expire_idle_sessions(self.config.idle_horizon_hours)
            .await
    }

    /// Profiles on a server that are trained and usable for sessions.
    pub async fn available_echoes(&self, server_id: &str) -> Result<Vec<Profile>, EchoformError> {
        let profiles = self.storage.list_profiles(server_id).await?;
        Ok(profiles.into_iter().filter(|p| p.is_ready()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echoform_config::model::StorageConfig;
    use echoform_core::types::TrainingStatus;
    use echoform_storage::SqliteStorage;

    async fn setup(dir: &tempfile::TempDir, max_active: usize) -> (SessionManager, Arc<SqliteStorage>) {
        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("echo.db").to_string_lossy().into_owned(),
            dataset_dir: dir.path().join("datasets").to_string_lossy().into_owned(),
            wal_mode: true,
        }));
        storage.initialize().await.unwrap();

        let manager = SessionManager::new(
            storage.clone(),
            SessionConfig {
                max_active_per_server: max_active,
                idle_horizon_hours: 24,
            },
        );
        (manager, storage)
    }

    async fn seed_ready_profile(storage: &SqliteStorage, user_id: &str) {
        let now = Utc::now().to_rfc3339();
        let profile = Profile {
            user_id: user_id.to_string(),
            server_id: "srv".to_string(),
            training_status: TrainingStatus::Completed,
            training_progress: 100,
            cutoff_date: "2025-06-01T00:00:00+00:00".to_string(),
            dataset_ref: Some("/tmp/dataset.json".to_string()),
            model_ref: Some(format!("echo_user_{user_id}_server_srv_20260101_000000")),
            error_message: None,
            requester_id: "req".to_string(),
            started_at: now.clone(),
            completed_at: Some(now.clone()),
            last_updated: now,
        };
        storage.upsert_profile(&profile).await.unwrap();
    }

    #[tokio::test]
    async fn start_requires_a_ready_profile() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, storage) = setup(&dir, 5).await;

        let key = ProfileKey::new("ghost", "srv");
        let err = manager.start(&key, "chan", "req").await.unwrap_err();
        assert!(matches!(err, EchoformError::NotFound(_)));
        assert!(err.to_string().contains("no trained echo"));

        // A profile mid-training is not startable either.
        let now = Utc::now().to_rfc3339();
        storage
            .upsert_profile(&Profile {
                user_id: "training".to_string(),
                server_id: "srv".to_string(),
                training_status: TrainingStatus::Training,
                training_progress: 50,
                cutoff_date: "2025-06-01T00:00:00+00:00".to_string(),
                dataset_ref: None,
                model_ref: None,
                error_message: None,
                requester_id: "req".to_string(),
                started_at: now.clone(),
                completed_at: None,
                last_updated: now,
            })
            .await
            .unwrap();
        let err = manager
            .start(&ProfileKey::new("training", "srv"), "chan", "req")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not ready"));
    }

    #[tokio::test]
    async fn start_returns_the_model_ref_of_the_profile() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, storage) = setup(&dir, 5).await;
        seed_ready_profile(&storage, "alice").await;

        let outcome = manager
            .start(&ProfileKey::new("alice", "srv"), "chan", "req")
            .await
            .unwrap();
        assert_eq!(
            outcome.model_ref,
            "echo_user_alice_server_srv_20260101_000000"
        );
        assert!(!outcome.superseded);
        assert!(outcome.session.is_active);
    }

    #[tokio::test]
    async fn starting_in_an_occupied_channel_supersedes() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, storage) = setup(&dir, 5).await;
        seed_ready_profile(&storage, "alice").await;
        seed_ready_profile(&storage, "bob").await;

        let first = manager
            .start(&ProfileKey::new("alice", "srv"), "chan", "req")
            .await
            .unwrap();
        let second = manager
            .start(&ProfileKey::new("bob", "srv"), "chan", "req")
            .await
            .unwrap();
        assert!(second.superseded);

        let active = manager.active_in_channel("chan").await.unwrap().unwrap();
        assert_eq!(active.id, second.session.id);
        assert_ne!(active.id, first.session.id);
        assert_eq!(storage.count_active_sessions("srv").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn server_capacity_is_enforced_but_replacement_is_net_zero() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, storage) = setup(&dir, 2).await;
        seed_ready_profile(&storage, "alice").await;
        seed_ready_profile(&storage, "bob").await;

        manager
            .start(&ProfileKey::new("alice", "srv"), "chan-1", "req")
            .await
            .unwrap();
        manager
            .start(&ProfileKey::new("bob", "srv"), "chan-2", "req")
            .await
            .unwrap();

        // A third channel exceeds the limit.
        let err = manager
            .start(&ProfileKey::new("alice", "srv"), "chan-3", "req")
            .await
            .unwrap_err();
        assert!(matches!(err, EchoformError::Capacity(_)));
        assert!(err.to_string().contains("limit 2"));

        // Replacing inside an occupied channel still works at the limit.
        let outcome = manager
            .start(&ProfileKey::new("bob", "srv"), "chan-1", "req")
            .await
            .unwrap();
        assert!(outcome.superseded);
        assert_eq!(storage.count_active_sessions("srv").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn can_start_tracks_server_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, storage) = setup(&dir, 1).await;
        seed_ready_profile(&storage, "alice").await;

        assert!(manager.can_start("srv").await.unwrap());

        manager
            .start(&ProfileKey::new("alice", "srv"), "chan", "req")
            .await
            .unwrap();
        assert!(!manager.can_start("srv").await.unwrap());
        // Other servers are unaffected.
        assert!(manager.can_start("other").await.unwrap());

        manager.stop("chan").await.unwrap();
        assert!(manager.can_start("srv").await.unwrap());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, storage) = setup(&dir, 5).await;
        seed_ready_profile(&storage, "alice").await;

        manager
            .start(&ProfileKey::new("alice", "srv"), "chan", "req")
            .await
            .unwrap();

        let outcome = manager.stop("chan").await.unwrap();
        assert!(matches!(outcome, StopOutcome::Stopped(_)));
        if let StopOutcome::Stopped(session) = outcome {
            assert!(!session.is_active);
            assert!(session.stopped_at.is_some());
        }

        let outcome = manager.stop("chan").await.unwrap();
        assert!(matches!(outcome, StopOutcome::NothingActive));
    }

    #[tokio::test]
    async fn reconcile_returns_persisted_active_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, storage) = setup(&dir, 5).await;
        seed_ready_profile(&storage, "alice").await;

        manager
            .start(&ProfileKey::new("alice", "srv"), "chan", "req")
            .await
            .unwrap();

        let resumed = manager.reconcile().await.unwrap();
        assert_eq!(resumed.len(), 1);
        assert_eq!(resumed[0].channel_id, "chan");
    }

    #[tokio::test]
    async fn server_stats_aggregate_active_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, storage) = setup(&dir, 5).await;
        seed_ready_profile(&storage, "alice").await;
        seed_ready_profile(&storage, "bob").await;

        let a = manager
            .start(&ProfileKey::new("alice", "srv"), "chan-1", "req")
            .await
            .unwrap();
        manager
            .start(&ProfileKey::new("bob", "srv"), "chan-2", "req")
            .await
            .unwrap();

        manager.record_response(&a.session.id).await.unwrap();
        manager.record_response(&a.session.id).await.unwrap();
        manager.record_conversation(&a.session.id).await.unwrap();

        let stats = manager.server_stats("srv").await.unwrap();
        assert_eq!(stats.active_sessions, 2);
        assert_eq!(stats.messages_generated, 2);
        assert_eq!(stats.conversations_started, 1);
        assert_eq!(
            stats.profiles_by_status.get(&TrainingStatus::Completed),
            Some(&2)
        );

        let other = manager.server_stats("other").await.unwrap();
        assert_eq!(other.active_sessions, 0);
        assert!(other.profiles_by_status.is_empty());
    }

    #[tokio::test]
    async fn expire_idle_uses_the_configured_horizon() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, storage) = setup(&dir, 5).await;
        seed_ready_profile(&storage, "alice").await;
        manager
            .start(&ProfileKey::new("alice", "srv"), "chan", "req")
            .await
            .unwrap();

        // A 24-hour horizon leaves a fresh session alone.
        assert_eq!(manager.expire_idle().await.unwrap(), 0);
        assert!(manager.active_in_channel("chan").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn available_echoes_filters_on_readiness() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, storage) = setup(&dir, 5).await;
        seed_ready_profile(&storage, "alice").await;

        let now = Utc::now().to_rfc3339();
        storage
            .upsert_profile(&Profile {
                user_id: "pending".to_string(),
                server_id: "srv".to_string(),
                training_status: TrainingStatus::Collecting,
                training_progress: 10,
                cutoff_date: "2025-06-01T00:00:00+00:00".to_string(),
                dataset_ref: None,
                model_ref: None,
                error_message: None,
                requester_id: "req".to_string(),
                started_at: now.clone(),
                completed_at: None,
                last_updated: now,
            })
            .await
            .unwrap();

        let available = manager.available_echoes("srv").await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].user_id, "alice");
    }
}
