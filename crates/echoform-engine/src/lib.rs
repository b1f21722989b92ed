// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Autonomous response engine: decides when an echo speaks, composes the
//! prompt, gates the model output, and delivers it with human-like pacing.

pub mod compose;
pub mod decision;
pub mod driver;
pub mod quality;

pub use decision::{Decision, decide, response_delay, sample};
pub use driver::ResponseDriver;
pub use quality::QualityIssue;
