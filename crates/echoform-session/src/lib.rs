// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Echo session concurrency management.

pub mod manager;

pub use manager::{ServerStats, SessionManager, StartOutcome, StopOutcome};
