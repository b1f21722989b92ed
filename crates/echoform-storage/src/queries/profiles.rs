// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile row operations.

use std::str::FromStr;

use echoform_core::EchoformError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{Profile, ProfileKey, TrainingStatus};

const PROFILE_COLUMNS: &str = "user_id, server_id, training_status, training_progress, \
     cutoff_date, dataset_ref, model_ref, error_message, requester_id, \
     started_at, completed_at, last_updated";

fn row_to_profile(row: &rusqlite::Row<'_>) -> Result<Profile, rusqlite::Error> {
    let status_str: String = row.get(2)?;
    let training_status = TrainingStatus::from_str(&status_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Profile {
        user_id: row.get(0)?,
        server_id: row.get(1)?,
        training_status,
        training_progress: row.get(3)?,
        cutoff_date: row.get(4)?,
        dataset_ref: row.get(5)?,
        model_ref: row.get(6)?,
        error_message: row.get(7)?,
        requester_id: row.get(8)?,
        started_at: row.get(9)?,
        completed_at: row.get(10)?,
        last_updated: row.get(11)?,
    })
}

/// Insert or fully replace a profile row keyed by (user, server).
pub async fn upsert_profile(db: &Database, profile: &Profile) -> Result<(), EchoformError> {
    let profile = profile.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO profiles (user_id, server_id, training_status, training_progress,
                     cutoff_date, dataset_ref, model_ref, error_message, requester_id,
                     started_at, completed_at, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT (user_id, server_id) DO UPDATE SET
                     training_status = excluded.training_status,
                     training_progress = excluded.training_progress,
                     cutoff_date = excluded.cutoff_date,
                     dataset_ref = excluded.dataset_ref,
                     model_ref = excluded.model_ref,
                     error_message = excluded.error_message,
                     requester_id = excluded.requester_id,
                     started_at = excluded.started_at,
                     completed_at = excluded.completed_at,
                     last_updated = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    profile.user_id,
                    profile.server_id,
                    profile.training_status.to_string(),
                    profile.training_progress,
                    profile.cutoff_date,
                    profile.dataset_ref,
                    profile.model_ref,
                    profile.error_message,
                    profile.requester_id,
                    profile.started_at,
                    profile.completed_at,
                    profile.last_updated,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a profile by (user, server) key.
pub async fn get_profile(
    db: &Database,
    key: &ProfileKey,
) -> Result<Option<Profile>, EchoformError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1 AND server_id = ?2"
            ))?;
            let result = stmt.query_row(params![key.user_id, key.server_id], row_to_profile);
            match result {
                Ok(profile) => Ok(Some(profile)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update status and advisory progress for a profile.
pub async fn set_progress(
    db: &Database,
    key: &ProfileKey,
    status: TrainingStatus,
    progress: i64,
) -> Result<(), EchoformError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE profiles SET training_status = ?1, training_progress = ?2,
                     last_updated = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE user_id = ?3 AND server_id = ?4",
                params![status.to_string(), progress, key.user_id, key.server_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record the dataset artifact produced by a completed analysis.
pub async fn set_dataset(
    db: &Database,
    key: &ProfileKey,
    dataset_ref: &str,
) -> Result<(), EchoformError> {
    let key = key.clone();
    let dataset_ref = dataset_ref.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE profiles SET dataset_ref = ?1,
                     last_updated = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE user_id = ?2 AND server_id = ?3",
                params![dataset_ref, key.user_id, key.server_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Move a profile to `failed` with a human-readable reason.
pub async fn fail_profile(
    db: &Database,
    key: &ProfileKey,
    error: &str,
) -> Result<(), EchoformError> {
    let key = key.clone();
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE profiles SET training_status = ?1, error_message = ?2,
                     last_updated = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE user_id = ?3 AND server_id = ?4",
                params![
                    TrainingStatus::Failed.to_string(),
                    error,
                    key.user_id,
                    key.server_id
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Move a profile to `completed`, recording the trained model reference.
pub async fn complete_profile(
    db: &Database,
    key: &ProfileKey,
    model_ref: &str,
) -> Result<(), EchoformError> {
    let key = key.clone();
    let model_ref = model_ref.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE profiles SET training_status = ?1, training_progress = 100,
                     model_ref = ?2, error_message = NULL,
                     completed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                     last_updated = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE user_id = ?3 AND server_id = ?4",
                params![
                    TrainingStatus::Completed.to_string(),
                    model_ref,
                    key.user_id,
                    key.server_id
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all profiles on a server, most recently started first.
pub async fn list_profiles(db: &Database, server_id: &str) -> Result<Vec<Profile>, EchoformError> {
    let server_id = server_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE server_id = ?1
                 ORDER BY started_at DESC"
            ))?;
            let rows = stmt.query_map(params![server_id], row_to_profile)?;
            let mut profiles = Vec::new();
            for row in rows {
                profiles.push(row?);
            }
            Ok(profiles)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete profiles whose last update is older than the retention horizon.
/// Returns the number of rows removed.
pub async fn delete_older_than(db: &Database, days: u32) -> Result<u64, EchoformError> {
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM profiles
                 WHERE last_updated < strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?1)",
                params![format!("-{days} days")],
            )?;
            Ok(removed as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
