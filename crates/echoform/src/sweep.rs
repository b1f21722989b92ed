// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `echoform sweep` command implementation.
//!
//! Runs the retention and liveness sweeps once against the local database
//! and the Ollama backend, then prints what was removed.

use std::sync::Arc;

use echoform_config::model::EchoformConfig;
use echoform_core::EchoformError;
use echoform_core::traits::StorageAdapter;
use echoform_maintenance::MaintenanceScheduler;
use echoform_ollama::OllamaAdapter;
use echoform_storage::SqliteStorage;

/// Run the `echoform sweep` command.
pub async fn run_sweep(config: &EchoformConfig) -> Result<(), EchoformError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    let inference = Arc::new(OllamaAdapter::new(&config.ollama)?);

    let scheduler = MaintenanceScheduler::new(
        storage.clone(),
        inference,
        config.retention.clone(),
        config.session.clone(),
        std::path::PathBuf::from(&config.storage.dataset_dir),
    );

    let (report, expired) = scheduler.manual_sweep().await?;
    storage.close().await?;

    println!();
    println!("  echoform sweep");
    println!("  {}", "-".repeat(50));
    println!(
        "    Profiles deleted:        {} (older than {} days)",
        report.profiles_deleted, config.retention.data_days
    );
    println!(
        "    Corpus entries deleted:  {} (older than {} days)",
        report.corpus_deleted, config.retention.data_days
    );
    println!(
        "    Response events deleted: {} (older than {} days)",
        report.events_deleted, config.retention.data_days
    );
    println!(
        "    Dataset files deleted:   {} (older than {} days)",
        report.datasets_deleted, config.retention.data_days
    );
    println!(
        "    Persona models deleted:  {} (older than {} days)",
        report.models_deleted, config.retention.model_days
    );
    println!(
        "    Idle sessions expired:   {} (idle over {} hours)",
        expired, config.session.idle_horizon_hours
    );
    println!();

    Ok(())
}
