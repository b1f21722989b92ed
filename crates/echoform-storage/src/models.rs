// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted row types, re-exported from the core crate so query modules
//! have a single import site.

pub use echoform_core::types::{
    CorpusEntry, EchoSession, Profile, ProfileKey, ResponseEvent, TrainingStatus,
};
