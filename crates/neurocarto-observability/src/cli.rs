// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-neurocarto-probe` to raise one crate to debug
//! level, and `--debug-all` for every known crate.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug (comma separated, or `all`)
pub const DEBUG_ENV: &str = "NEUROCARTO_DEBUG";

/// Per-crate debug flags
///
/// # Example
/// ```rust
/// use neurocarto_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-neurocarto-probe".to_string()]);
/// assert!(flags.is_enabled("neurocarto-probe"));
/// ```
#[derive(Debug, Clone)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
    /// Level for everything not raised to debug
    pub default_level: String,
}

impl Default for CrateDebugFlags {
    fn default() -> Self {
        Self {
            enabled_crates: BTreeSet::new(),
            default_level: "info".to_string(),
        }
    }
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}`.
    /// `--debug-all` enables all known crates.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();

        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
                continue;
            }

            if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enabled_crates.insert(crate_name.to_string());
            }
        }

        flags
    }

    /// Use `level` for crates without a debug flag
    pub fn with_default_level(mut self, level: &str) -> Self {
        // "warning" is accepted in configuration files
        self.default_level = match level.to_lowercase().as_str() {
            "warning" => "warn".to_string(),
            other => other.to_string(),
        };
        self
    }

    pub fn enable_all(&mut self) {
        self.enabled_crates
            .extend(KNOWN_CRATES.iter().map(|c| c.to_string()));
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` for enabled crates, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Filter directive for `EnvFilter`.
    ///
    /// Format: `neurocarto-probe=debug,info`, or just the default level when no
    /// crate is enabled.
    pub fn to_filter_string(&self) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name))
            .collect();
        filters.push(self.default_level.clone());
        filters.join(",")
    }
}

/// Parse debug flags from the process arguments and `NEUROCARTO_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());

    if let Ok(env_var) = env::var(DEBUG_ENV) {
        apply_debug_env(&mut flags, &env_var);
    }

    flags
}

fn apply_debug_env(flags: &mut CrateDebugFlags, value: &str) {
    if value.trim() == "all" {
        flags.enable_all();
        return;
    }

    flags.enabled_crates.extend(
        value
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
    );
}

/// Help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {}=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", "),
        DEBUG_ENV,
        DEBUG_ENV
    )
}
