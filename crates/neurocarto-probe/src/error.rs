// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Error types for probe operations.

Only file and format problems are errors. Hardware-rule violations are policy
outcomes: they show up as electrode states and as `is_valid() == false`, never
as an `Err`.
*/

use std::path::PathBuf;

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while loading, saving or editing channel maps
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Format error: {0}")]
    Format(String),

    #[error("Channel conflict: {0}")]
    Conflict(String),

    #[error("Unknown probe type code: {0}")]
    UnknownProbeType(u32),

    #[error("Electrode selection cancelled")]
    Cancelled,

    #[error("Unknown electrode selector: {0}")]
    UnknownSelector(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

impl ProbeError {
    /// Wrap an I/O error together with the file it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProbeError::Io {
            path: path.into(),
            source,
        }
    }

    /// Blueprint/array length does not match the probe's electrode universe
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        ProbeError::Format(format!(
            "blueprint length mismatch: expected {} electrodes, got {}",
            expected, actual
        ))
    }

    /// True for the `FormatError` family (including unsupported type codes)
    pub fn is_format_error(&self) -> bool {
        matches!(self, ProbeError::Format(_) | ProbeError::UnknownProbeType(_))
    }
}
