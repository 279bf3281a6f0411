// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that configuration values are within valid ranges and consistent
//! with each other. All problems are collected before reporting.

use crate::{ConfigError, ConfigResult, NeurocartoConfig};

/// Log levels accepted by `system.log_level`
pub const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "warning", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Required fields (probe family, selector name, blueprint suffix)
/// - Valid value ranges (log level, sample count)
/// - Blueprint suffix shape
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &NeurocartoConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_required_fields(config, &mut errors);
    validate_value_ranges(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_required_fields(config: &NeurocartoConfig, errors: &mut Vec<ConfigValidationError>) {
    let required = [
        ("probe.family", &config.probe.family),
        ("selection.selector", &config.selection.selector),
        ("blueprint.suffix", &config.blueprint.suffix),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: field.to_string(),
            });
        }
    }
}

fn validate_value_ranges(config: &NeurocartoConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.system.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "system.log_level".to_string(),
            reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
        });
    }

    if config.sampling.sample_times == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "sampling.sample_times".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    let suffix = &config.blueprint.suffix;
    if !suffix.is_empty() && (!suffix.starts_with('.') || !suffix.ends_with(".npy")) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "blueprint.suffix".to_string(),
            reason: "must start with '.' and end with '.npy'".to_string(),
        });
    }
}
