// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona model training orchestration.
//!
//! Listens for completed analyses, builds a persona specification from the
//! dataset artifact, creates the model on the inference backend, and smoke
//! tests it before the profile is marked ready. Also owns the stale persona
//! model sweep.

pub mod cleanup;
pub mod orchestrator;
pub mod persona;

pub use cleanup::cleanup_stale;
pub use orchestrator::TrainingOrchestrator;
