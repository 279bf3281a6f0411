// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for NeuroCarto
//!
//! Console logging is always available. With the `file-logging` feature,
//! [`init_logging`] also writes per-crate JSON log files into a timestamped
//! run folder and applies a retention policy to older runs.

use anyhow::{anyhow, Result};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cli::CrateDebugFlags;

/// Initialize human-readable console logging
///
/// # Errors
/// Fails when the filter built from `debug_flags` is malformed or a global
/// subscriber is already installed.
pub fn init_console_logging(debug_flags: &CrateDebugFlags) -> Result<()> {
    let filter = debug_flags.to_filter_string();
    let env_filter = EnvFilter::try_new(&filter)
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", filter, e))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .finish()
        .try_init()
        .map_err(|e| anyhow!("Failed to install console logger: {}", e))?;

    tracing::debug!(target: "neurocarto", "Console logging ready ({})", filter);
    Ok(())
}

#[cfg(feature = "file-logging")]
pub use file::{init_logging, init_logging_default, LoggingGuard};

#[cfg(feature = "file-logging")]
mod file {
    use std::path::{Path, PathBuf};

    use anyhow::{anyhow, Context, Result};
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use tracing_appender::rolling;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer, Registry};

    use crate::cli::CrateDebugFlags;

    const RUN_PREFIX: &str = "run_";
    const RUN_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Keeps the non-blocking writers alive; logs are flushed on drop
    pub struct LoggingGuard {
        _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
        log_dir: PathBuf,
    }

    impl LoggingGuard {
        /// Run folder of this process
        pub fn log_dir(&self) -> &Path {
            &self.log_dir
        }
    }

    /// Initialize console output plus per-crate file logs
    ///
    /// Creates a timestamped folder structure:
    /// ```text
    /// ./logs/
    ///   └── run_20250101_120000/
    ///       ├── neurocarto-probe.log
    ///       ├── neurocarto-probe-npx.log
    ///       └── neurocarto.log (combined)
    /// ```
    ///
    /// # Arguments
    /// * `debug_flags` - Per-crate debug flags for filtering
    /// * `log_dir` - Base directory for logs (default: `./logs`)
    /// * `retention_days` - Keep logs for N days (default: 30)
    /// * `retention_runs` - Keep N most recent runs (default: 10)
    pub fn init_logging(
        debug_flags: &CrateDebugFlags,
        log_dir: Option<PathBuf>,
        retention_days: Option<u64>,
        retention_runs: Option<usize>,
    ) -> Result<LoggingGuard> {
        let base_log_dir = log_dir.unwrap_or_else(|| PathBuf::from("./logs"));

        let timestamp = Utc::now().format(RUN_FORMAT);
        let run_folder = base_log_dir.join(format!("{}{}", RUN_PREFIX, timestamp));
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

        cleanup_old_logs(&base_log_dir, retention_days, retention_runs)?;

        let filter = debug_flags.to_filter_string();
        let env_filter = || {
            EnvFilter::try_new(&filter)
                .map_err(|e| anyhow!("Invalid log filter '{}': {}", filter, e))
        };

        let mut layers = Vec::new();
        let mut file_guards = Vec::new();

        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_filter(env_filter()?)
            .boxed();
        layers.push(console_layer);

        for crate_name in crate::KNOWN_CRATES {
            let file_appender = rolling::never(&run_folder, format!("{}.log", crate_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            file_guards.push(guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(EnvFilter::new(format!("{}=debug,off", crate_name)))
                .boxed();
            layers.push(file_layer);
        }

        let combined_appender = rolling::never(&run_folder, "neurocarto.log");
        let (combined_non_blocking, combined_guard) = tracing_appender::non_blocking(combined_appender);
        file_guards.push(combined_guard);

        let combined_layer = tracing_subscriber::fmt::layer()
            .with_writer(combined_non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(env_filter()?)
            .boxed();
        layers.push(combined_layer);

        Registry::default()
            .with(layers)
            .try_init()
            .map_err(|e| anyhow!("Failed to install file logger: {}", e))?;

        Ok(LoggingGuard {
            _file_guards: file_guards,
            log_dir: run_folder,
        })
    }

    /// Initialize logging with default settings
    pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
        init_logging(debug_flags, None, None, None)
    }

    fn run_timestamp(dir_name: &str) -> Option<DateTime<Utc>> {
        let stamp = dir_name.strip_prefix(RUN_PREFIX)?;
        let naive = NaiveDateTime::parse_from_str(stamp, RUN_FORMAT).ok()?;
        Some(Utc.from_utc_datetime(&naive))
    }

    /// Remove run folders older than `retention_days`, then the oldest runs
    /// beyond `retention_runs`
    pub(crate) fn cleanup_old_logs(
        base_log_dir: &Path,
        retention_days: Option<u64>,
        retention_runs: Option<usize>,
    ) -> Result<()> {
        if !base_log_dir.exists() {
            return Ok(());
        }

        let retention_days = retention_days.unwrap_or(30);
        let retention_runs = retention_runs.unwrap_or(10);
        let cutoff_date = Utc::now() - chrono::Duration::days(retention_days as i64);

        let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
        for entry in std::fs::read_dir(base_log_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(dt) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(run_timestamp)
            {
                runs.push((path, dt));
            }
        }

        // newest first
        runs.sort_by(|a, b| b.1.cmp(&a.1));

        for (i, (path, dt)) in runs.iter().enumerate() {
            if *dt < cutoff_date || i >= retention_runs {
                if let Err(e) = std::fs::remove_dir_all(path) {
                    tracing::warn!(
                        target: "neurocarto",
                        "Failed to remove old log directory {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_run_timestamp() {
            let dt = run_timestamp("run_20250101_120000").unwrap();
            assert_eq!(dt.format(RUN_FORMAT).to_string(), "20250101_120000");
            assert!(run_timestamp("run_latest").is_none());
            assert!(run_timestamp("20250101_120000").is_none());
        }

        #[test]
        fn test_cleanup_keeps_recent_runs() {
            let dir = tempfile::tempdir().unwrap();
            let now = Utc::now();
            let mut names = Vec::new();
            for minutes in 0..5 {
                let stamp = (now - chrono::Duration::minutes(minutes)).format(RUN_FORMAT);
                let name = format!("{}{}", RUN_PREFIX, stamp);
                std::fs::create_dir(dir.path().join(&name)).unwrap();
                names.push(name);
            }
            std::fs::create_dir(dir.path().join("run_20000101_000000")).unwrap();
            std::fs::create_dir(dir.path().join("keep_me")).unwrap();

            cleanup_old_logs(dir.path(), Some(30), Some(3)).unwrap();

            assert!(dir.path().join(&names[0]).exists());
            assert!(dir.path().join(&names[2]).exists());
            assert!(!dir.path().join(&names[3]).exists());
            assert!(!dir.path().join("run_20000101_000000").exists());
            assert!(dir.path().join("keep_me").exists());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_an_error() {
        let flags = CrateDebugFlags::default().with_default_level("=[");
        assert!(init_console_logging(&flags).is_err());
    }
}
