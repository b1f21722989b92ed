// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background maintenance scheduler.

pub mod scheduler;

pub use scheduler::{MaintenanceScheduler, MaintenanceStatus, SweepReport};
