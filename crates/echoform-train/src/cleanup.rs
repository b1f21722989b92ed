// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stale persona model cleanup.
//!
//! Persona model names end in a `YYYYmmdd_HHMMSS` timestamp; the sweep
//! deletes prefixed models older than the retention horizon. Models whose
//! timestamp cannot be parsed are skipped, never deleted.

use chrono::{Duration, NaiveDateTime, Utc};
use echoform_core::EchoformError;
use echoform_core::traits::InferenceAdapter;
use tracing::{info, warn};

/// Every persona model name starts with this.
const MODEL_PREFIX: &str = "echo_user_";

/// Extract the creation timestamp from a persona model name.
///
/// The timestamp spans the last two underscore-separated segments
/// (`20260315` and `143045`).
fn parse_model_timestamp(name: &str) -> Option<NaiveDateTime> {
    let (rest, time) = name.rsplit_once('_')?;
    let (_, date) = rest.rsplit_once('_')?;
    NaiveDateTime::parse_from_str(&format!("{date}_{time}"), "%Y%m%d_%H%M%S").ok()
}

/// Delete persona models older than `max_age_days`. Returns how many were
/// deleted.
pub async fn cleanup_stale(
    inference: &dyn InferenceAdapter,
    max_age_days: u32,
) -> Result<u64, EchoformError> {
    let now = Utc::now().naive_utc();
    let horizon = Duration::days(i64::from(max_age_days));
    let mut deleted = 0u64;

    for name in inference.list_models().await? {
        if !name.starts_with(MODEL_PREFIX) {
            continue;
        }
        let Some(created) = parse_model_timestamp(&name) else {
            warn!(model = %name, "persona model name has no parseable timestamp, skipping");
            continue;
        };
        if now.signed_duration_since(created) > horizon {
            inference.delete_model(&name).await?;
            info!(model = %name, "stale persona model deleted");
            deleted += 1;
        }
    }
    Ok(deleted)
}
