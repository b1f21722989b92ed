// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background maintenance: retention and liveness sweeps.
//!
//! The retention sweep (daily) deletes stale profiles, corpus entries, and
//! response events past the data horizon, prunes dataset artifacts from
//! disk, and removes stale persona models past the model horizon. The
//! liveness sweep (hourly) expires sessions idle beyond the configured
//! horizon. A sweep failure is logged and retried at the next tick; it never
//! stops the scheduler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use echoform_config::model::{RetentionConfig, SessionConfig};
use echoform_core::EchoformError;
use echoform_core::traits::{InferenceAdapter, StorageAdapter};
use echoform_core::types::HealthStatus;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const RETENTION_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);
const LIVENESS_PERIOD: Duration = Duration::from_secs(60 * 60);

/// What one retention sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub profiles_deleted: u64,
    pub corpus_deleted: u64,
    pub events_deleted: u64,
    pub datasets_deleted: u64,
    pub models_deleted: u64,
}

/// Scheduler state exposed for status reporting.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceStatus {
    pub last_retention_sweep: Option<DateTime<Utc>>,
    pub last_retention_report: Option<SweepReport>,
    pub last_liveness_sweep: Option<DateTime<Utc>>,
    pub sessions_expired_total: u64,
    pub consecutive_failures: u32,
}

/// Runs the periodic sweeps and aggregates component health.
pub struct MaintenanceScheduler {
    storage: Arc<dyn StorageAdapter>,
    inference: Arc<dyn InferenceAdapter>,
    retention: RetentionConfig,
    session: SessionConfig,
    dataset_dir: PathBuf,
    status: RwLock<MaintenanceStatus>,
}

impl MaintenanceScheduler {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        inference: Arc<dyn InferenceAdapter>,
        retention: RetentionConfig,
        session: SessionConfig,
        dataset_dir: PathBuf,
    ) -> Self {
        Self {
            storage,
            inference,
            retention,
            session,
            dataset_dir,
            status: RwLock::new(MaintenanceStatus::default()),
        }
    }

    /// Run the sweep loops until shutdown. The first tick of each interval
    /// fires immediately, so a fresh process sweeps at startup.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let mut retention = tokio::time::interval(RETENTION_PERIOD);
        let mut liveness = tokio::time::interval(LIVENESS_PERIOD);
        retention.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        liveness.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("maintenance scheduler shutting down");
                    break;
                }
                _ = retention.tick() => {
                    if let Err(e) = self.retention_sweep().await {
                        error!(error = %e, "retention sweep failed");
                        self.status.write().await.consecutive_failures += 1;
                    }
                }
                _ = liveness.tick() => {
                    if let Err(e) = self.liveness_sweep().await {
                        error!(error = %e, "liveness sweep failed");
                        self.status.write().await.consecutive_failures += 1;
                    }
                }
            }
        }
    }

    /// Run both sweeps once, outside the schedule.
    pub async fn manual_sweep(&self) -> Result<(SweepReport, u64), EchoformError> {
        let report = self.retention_sweep().await?;
        let expired = self.liveness_sweep().await?;
        Ok((report, expired))
    }

    async fn retention_sweep(&self) -> Result<SweepReport, EchoformError> {
        let report = SweepReport {
            profiles_deleted: self
                .storage
                .delete_profiles_older_than(self.retention.data_days)
                .await?,
            corpus_deleted: self
                .storage
                .delete_corpus_older_than(self.retention.data_days)
                .await?,
            events_deleted: self
                .storage
                .delete_events_older_than(self.retention.data_days)
                .await?,
            datasets_deleted: prune_dataset_files(&self.dataset_dir, self.retention.data_days)?,
            models_deleted: echoform_train::cleanup_stale(
                self.inference.as_ref(),
                self.retention.model_days,
            )
            .await?,
        };
        info!(
            profiles = report.profiles_deleted,
            corpus = report.corpus_deleted,
            events = report.events_deleted,
            datasets = report.datasets_deleted,
            models = report.models_deleted,
            "retention sweep complete"
        );

        let mut status = self.status.write().await;
        status.last_retention_sweep = Some(Utc::now());
        status.last_retention_report = Some(report);
        status.consecutive_failures = 0;
        Ok(report)
    }

    async fn liveness_sweep(&self) -> Result<u64, EchoformError> {
        let expired = self
            .storage
            .expire_idle_sessions(self.session.idle_horizon_hours)
            .await?;
        if expired > 0 {
            info!(expired, "idle echo sessions expired");
        }

        let mut status = self.status.write().await;
        status.last_liveness_sweep = Some(Utc::now());
        status.sessions_expired_total += expired;
        Ok(expired)
    }

    pub async fn status(&self) -> MaintenanceStatus {
        self.status.read().await.clone()
    }

    /// Aggregate health across storage and inference.
    pub async fn health_check(&self) -> HealthStatus {
        let storage = component_health("storage", self.storage.health_check().await);
        let inference = component_health("inference", self.inference.health_check().await);
        aggregate([storage, inference])
    }
}

/// Remove dataset artifacts older than the retention horizon, by mtime.
/// A missing dataset directory means nothing has been written yet.
fn prune_dataset_files(dir: &std::path::Path, days: u32) -> Result<u64, EchoformError> {
    let horizon = Duration::from_secs(u64::from(days) * 24 * 60 * 60);
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(EchoformError::Storage {
                source: Box::new(e),
            });
        }
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| EchoformError::Storage {
            source: Box::new(e),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        if matches!(modified.elapsed(), Ok(age) if age > horizon) {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to remove dataset file");
                }
            }
        }
    }
    Ok(removed)
}

fn component_health(
    name: &str,
    result: Result<HealthStatus, EchoformError>,
) -> HealthStatus {
    match result {
        Ok(status) => status,
        Err(e) => HealthStatus::Unhealthy(format!("{name}: {e}")),
    }
}

/// Worst-status-wins aggregation.
fn aggregate(parts: impl IntoIterator<Item = HealthStatus>) -> HealthStatus {
    let mut worst = HealthStatus::Healthy;
    for part in parts {
        match (&worst, &part) {
            (_, HealthStatus::Unhealthy(_)) => worst = part,
            (HealthStatus::Healthy, HealthStatus::Degraded(_)) => worst = part,
            _ => {}
        }
    }
    worst
}
