// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurocarto-observability
//!
//! Logging infrastructure for NeuroCarto with per-crate debug flag support.
//!
//! Library crates only emit `tracing` events under their crate name as target;
//! applications pick one of the initializers here.
//!
//! ## Features
//! - `file-logging`: timestamped run folders with per-crate JSON log files

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known NeuroCarto crate names (also their log targets) for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neurocarto",
    "neurocarto-probe",
    "neurocarto-probe-npx",
    "neurocarto-config",
    "neurocarto-observability",
];
