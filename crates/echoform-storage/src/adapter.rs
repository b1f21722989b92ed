// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use echoform_config::model::StorageConfig;
use echoform_core::types::{CorpusEntry, EchoSession, Profile, ProfileKey, ResponseEvent};
use echoform_core::{
    AdapterType, EchoformError, HealthStatus, PluginAdapter, StorageAdapter, TrainingStatus,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`]
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, EchoformError> {
        self.db.get().ok_or_else(|| EchoformError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, EchoformError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), EchoformError> {
        // Shutdown delegates to close if the DB was initialized.
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(crate::database::map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), EchoformError> {
        let path = self.config.database_path.clone();
        let db = Database::open(&path).await?;
        self.db.set(db).map_err(|_| EchoformError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), EchoformError> {
        let db = self.db()?;
        // Checkpoint WAL before close.
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Profile operations ---

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), EchoformError> {
        queries::profiles::upsert_profile(self.db()?, profile).await
    }

    async fn get_profile(&self, key: &ProfileKey) -> Result<Option<Profile>, EchoformError> {
        queries::profiles::get_profile(self.db()?, key).await
    }

    async fn set_profile_progress(
        &self,
        key: &ProfileKey,
        status: TrainingStatus,
        progress: i64,
    ) -> Result<(), EchoformError> {
        queries::profiles::set_progress(self.db()?, key, status, progress).await
    }

    async fn set_profile_dataset(
        &self,
        key: &ProfileKey,
        dataset_ref: &str,
    ) -> Result<(), EchoformError> {
        queries::profiles::set_dataset(self.db()?, key, dataset_ref).await
    }

    async fn fail_profile(&self, key: &ProfileKey, error: &str) -> Result<(), EchoformError> {
        queries::profiles::fail_profile(self.db()?, key, error).await
    }

    async fn complete_profile(
        &self,
        key: &ProfileKey,
        model_ref: &str,
    ) -> Result<(), EchoformError> {
        queries::profiles::complete_profile(self.db()?, key, model_ref).await
    }

    async fn list_profiles(&self, server_id: &str) -> Result<Vec<Profile>, EchoformError> {
        queries::profiles::list_profiles(self.db()?, server_id).await
    }

    async fn delete_profiles_older_than(&self, days: u32) -> Result<u64, EchoformError> {
        queries::profiles::delete_older_than(self.db()?, days).await
    }

    // --- Corpus operations ---

    async fn replace_corpus(
        &self,
        key: &ProfileKey,
        entries: &[CorpusEntry],
    ) -> Result<(), EchoformError> {
        queries::corpus::replace_corpus(self.db()?, key, entries).await
    }

    async fn load_corpus(&self, key: &ProfileKey) -> Result<Vec<CorpusEntry>, EchoformError> {
        queries::corpus::load_corpus(self.db()?, key).await
    }

    async fn delete_corpus_older_than(&self, days: u32) -> Result<u64, EchoformError> {
        queries::corpus::delete_older_than(self.db()?, days).await
    }

    // --- Session operations ---

    async fn insert_session_superseding(
        &self,
        session: &EchoSession,
    ) -> Result<u64, EchoformError> {
        queries::sessions::insert_superseding(self.db()?, session).await
    }

    async fn active_session_in_channel(
        &self,
        channel_id: &str,
    ) -> Result<Option<EchoSession>, EchoformError> {
        queries::sessions::active_in_channel(self.db()?, channel_id).await
    }

    async fn list_active_sessions(&self) -> Result<Vec<EchoSession>, EchoformError> {
        queries::sessions::list_active(self.db()?).await
    }

    async fn count_active_sessions(&self, server_id: &str) -> Result<i64, EchoformError> {
        queries::sessions::count_active(self.db()?, server_id).await
    }

    async fn stop_active_in_channel(
        &self,
        channel_id: &str,
    ) -> Result<Option<EchoSession>, EchoformError> {
        queries::sessions::stop_active_in_channel(self.db()?, channel_id).await
    }

    async fn record_session_message(&self, session_id: &str) -> Result<(), EchoformError> {
        queries::sessions::record_message(self.db()?, session_id).await
    }

    async fn record_conversation_started(&self, session_id: &str) -> Result<(), EchoformError> {
        queries::sessions::record_conversation(self.db()?, session_id).await
    }

    async fn expire_idle_sessions(&self, max_idle_hours: u64) -> Result<u64, EchoformError> {
        queries::sessions::expire_idle(self.db()?, max_idle_hours).await
    }

    // --- Response event operations ---

    async fn insert_response_event(&self, event: &ResponseEvent) -> Result<(), EchoformError> {
        queries::events::insert_event(self.db()?, event).await
    }

    async fn delete_events_older_than(&self, days: u32) -> Result<u64, EchoformError> {
        queries::events::delete_older_than(self.db()?, days).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            dataset_dir: "/tmp/echoform-datasets".to_string(),
            wal_mode: true,
        }
    }

    fn make_profile(user: &str, server: &str) -> Profile {
        Profile {
            user_id: user.to_string(),
            server_id: server.to_string(),
            training_status: TrainingStatus::Collecting,
            training_progress: 10,
            cutoff_date: "2025-06-01T00:00:00Z".to_string(),
            dataset_ref: None,
            model_ref: None,
            error_message: None,
            requester_id: "req-1".to_string(),
            started_at: "2026-01-01T00:00:00.000Z".to_string(),
            completed_at: None,
            last_updated: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        let result = storage.initialize().await;
        assert!(result.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn health_check_returns_healthy_when_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        let status = storage.health_check().await.unwrap();
        assert_eq!(status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn health_check_fails_when_not_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        let result = storage.health_check().await;
        assert!(result.is_err(), "health_check should fail before initialize");
    }

    #[tokio::test]
    async fn full_profile_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        let profile = make_profile("u1", "s1");
        let key = profile.key();
        storage.upsert_profile(&profile).await.unwrap();

        storage
            .set_profile_progress(&key, TrainingStatus::Collecting, 30)
            .await
            .unwrap();
        storage
            .set_profile_dataset(&key, "/data/user_u1_server_s1.json")
            .await
            .unwrap();
        storage
            .complete_profile(&key, "echo_user_u1_server_s1_20260101_000000")
            .await
            .unwrap();

        let p = storage.get_profile(&key).await.unwrap().unwrap();
        assert!(p.is_ready());
        assert_eq!(
            p.model_ref.as_deref(),
            Some("echo_user_u1_server_s1_20260101_000000")
        );

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn session_and_event_operations_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("sessions.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        let session = EchoSession {
            id: "sess-1".to_string(),
            user_id: "u1".to_string(),
            server_id: "srv-1".to_string(),
            channel_id: "chan-1".to_string(),
            requester_id: "req-1".to_string(),
            is_active: true,
            messages_generated: 0,
            conversations_started: 0,
            started_at: "2026-01-01T00:00:00.000Z".to_string(),
            stopped_at: None,
            last_activity: "2026-01-01T00:00:00.000Z".to_string(),
        };
        storage.insert_session_superseding(&session).await.unwrap();
        assert_eq!(storage.count_active_sessions("srv-1").await.unwrap(), 1);

        storage.record_session_message("sess-1").await.unwrap();

        let event = ResponseEvent {
            id: "ev-1".to_string(),
            session_id: "sess-1".to_string(),
            content: "sounds good to me".to_string(),
            context_snapshot: None,
            latency_ms: 350,
            created_at: "2026-01-01T00:00:05.000Z".to_string(),
        };
        storage.insert_response_event(&event).await.unwrap();

        let stopped = storage
            .stop_active_in_channel("chan-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stopped.messages_generated, 1);
        assert!(storage.list_active_sessions().await.unwrap().is_empty());

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_runs_checkpoint() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("shutdown.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        storage.upsert_profile(&make_profile("u1", "s1")).await.unwrap();
        storage.shutdown().await.unwrap();
    }
}
