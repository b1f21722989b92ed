// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message collection, preprocessing, and dataset construction.
//!
//! The analysis half of the Echoform lifecycle: walk a server's channels,
//! gather a member's messages before a cutoff, clean them into a training
//! corpus, and write a dataset artifact. Training itself lives in
//! `echoform-train`, fed by [`AnalysisCompleted`] events.

pub mod collector;
pub mod dataset;
pub mod jobs;
pub mod lifecycle;
pub mod pipeline;
pub mod text;

pub use jobs::{JobRegistry, JobTicket};
pub use lifecycle::Stage;
pub use pipeline::{AnalysisCompleted, AnalysisPipeline};
