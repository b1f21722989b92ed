// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysis stage progression and cutoff date validation.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use echoform_core::{EchoformError, TrainingStatus};

/// Earliest cutoff the platform has data for.
const EARLIEST_CUTOFF: &str = "2015-01-01";

/// Stages of an analysis job, each with the advisory progress percentage
/// reported when the stage begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Collecting,
    Storing,
    Preprocessing,
    Dataset,
    AnalysisComplete,
}

impl Stage {
    /// Advisory progress percentage for this stage. Never used for control
    /// flow; surfaced to status queries only.
    pub fn progress(self) -> i64 {
        match self {
            Stage::Collecting => 10,
            Stage::Storing => 30,
            Stage::Preprocessing => 60,
            Stage::Dataset => 80,
            Stage::AnalysisComplete => 100,
        }
    }

    /// The persisted training status a profile carries while in this stage.
    pub fn status(self) -> TrainingStatus {
        match self {
            Stage::AnalysisComplete => TrainingStatus::AnalysisCompleted,
            _ => TrainingStatus::Collecting,
        }
    }
}

/// Parse a user-supplied cutoff date.
///
/// Accepts `YYYY-MM-DD` (interpreted as midnight UTC) or a full RFC 3339
/// timestamp.
pub fn parse_cutoff(input: &str) -> Result<DateTime<Utc>, EchoformError> {
    if let Ok(date) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| EchoformError::Validation(format!("invalid cutoff date `{input}`")))?;
        return Ok(Utc.from_utc_datetime(&midnight));
    }
    DateTime::parse_from_rfc3339(input.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            EchoformError::Validation(format!(
                "invalid cutoff date `{input}`: expected YYYY-MM-DD or RFC 3339"
            ))
        })
}

/// Validate a cutoff against the allowed window: not in the future, not
/// before the platform existed.
pub fn validate_cutoff(cutoff: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), EchoformError> {
    if cutoff > now {
        return Err(EchoformError::Validation(
            "cutoff date cannot be in the future".to_string(),
        ));
    }
    // Parse of a compile-time constant cannot fail.
    let earliest = parse_cutoff(EARLIEST_CUTOFF)?;
    if cutoff < earliest {
        return Err(EchoformError::Validation(format!(
            "cutoff date cannot be before {EARLIEST_CUTOFF}"
        )));
    }
    Ok(())
}
