// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Values are layered in three tiers:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, NeurocartoConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "neurocarto.toml";

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "NEUROCARTO_CONFIG_PATH";

/// Find the NeuroCarto configuration file
///
/// Search order:
/// 1. `NEUROCARTO_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neurocarto.toml`
/// 3. Parent directories, up to 5 levels
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by {} not found: {}",
                CONFIG_PATH_ENV,
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        search_paths.extend(
            cwd.ancestors()
                .skip(1)
                .take(5)
                .map(|dir| dir.join(CONFIG_FILE_NAME)),
        );
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet {} environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, or fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeurocartoConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NeurocartoConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    crate::validate_config(&config)?;
    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROCARTO_LOG_LEVEL` -> `system.log_level`
/// - `NEUROCARTO_DEBUG_MODE` -> `system.debug`
/// - `NEUROCARTO_DATA_DIR` -> `system.data_dir`
/// - `NEUROCARTO_PROBE_FAMILY` -> `probe.family`
/// - `NEUROCARTO_PROBE_TYPE` -> `probe.default_type`
/// - `NEUROCARTO_SELECTOR` -> `selection.selector`
/// - `NEUROCARTO_SEED` -> `selection.seed`
/// - `NEUROCARTO_SAMPLE_TIMES` -> `sampling.sample_times`
/// - `NEUROCARTO_WORKERS` -> `sampling.workers`
pub fn apply_environment_overrides(config: &mut NeurocartoConfig) {
    if let Ok(value) = env::var("NEUROCARTO_LOG_LEVEL") {
        config.system.log_level = value;
    }
    if let Ok(value) = env::var("NEUROCARTO_DEBUG_MODE") {
        config.system.debug = parse_flag(&value);
    }
    if let Ok(value) = env::var("NEUROCARTO_DATA_DIR") {
        config.system.data_dir = PathBuf::from(value);
    }

    if let Ok(value) = env::var("NEUROCARTO_PROBE_FAMILY") {
        config.probe.family = value;
    }
    if let Ok(value) = env::var("NEUROCARTO_PROBE_TYPE") {
        if let Ok(code) = value.parse::<u32>() {
            config.probe.default_type = code;
        }
    }

    if let Ok(value) = env::var("NEUROCARTO_SELECTOR") {
        config.selection.selector = value;
    }
    if let Ok(value) = env::var("NEUROCARTO_SEED") {
        if let Ok(seed) = value.parse::<u64>() {
            config.selection.seed = Some(seed);
        }
    }

    if let Ok(value) = env::var("NEUROCARTO_SAMPLE_TIMES") {
        if let Ok(times) = value.parse::<usize>() {
            config.sampling.sample_times = times;
        }
    }
    if let Ok(value) = env::var("NEUROCARTO_WORKERS") {
        if let Ok(workers) = value.parse::<usize>() {
            config.sampling.workers = workers;
        }
    }
}

/// Apply CLI argument overrides to configuration
///
/// Recognized keys: `log_level`, `debug`, `data_dir`, `probe`, `probe_type`,
/// `selector`, `seed`, `sample_times`, `workers`. Any other key of the form
/// `select.<name>` lands in `selection.params` (parsed as JSON when possible,
/// kept as a string otherwise).
pub fn apply_cli_overrides(config: &mut NeurocartoConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("log_level") {
        config.system.log_level = value.clone();
    }
    if let Some(value) = cli_args.get("debug") {
        config.system.debug = parse_flag(value);
    }
    if let Some(value) = cli_args.get("data_dir") {
        config.system.data_dir = PathBuf::from(value);
    }

    if let Some(value) = cli_args.get("probe") {
        config.probe.family = value.clone();
    }
    if let Some(value) = cli_args.get("probe_type") {
        if let Ok(code) = value.parse::<u32>() {
            config.probe.default_type = code;
        }
    }

    if let Some(value) = cli_args.get("selector") {
        config.selection.selector = value.clone();
    }
    if let Some(value) = cli_args.get("seed") {
        if let Ok(seed) = value.parse::<u64>() {
            config.selection.seed = Some(seed);
        }
    }

    if let Some(value) = cli_args.get("sample_times") {
        if let Ok(times) = value.parse::<usize>() {
            config.sampling.sample_times = times;
        }
    }
    if let Some(value) = cli_args.get("workers") {
        if let Ok(workers) = value.parse::<usize>() {
            config.sampling.workers = workers;
        }
    }

    for (key, value) in cli_args {
        if let Some(name) = key.strip_prefix("select.") {
            let parsed = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
            config.selection.params.insert(name.to_string(), parsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();

        env::set_var(CONFIG_PATH_ENV, dir.path().join("nope.toml"));
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::remove_var("NEUROCARTO_PROBE_TYPE");
        env::remove_var("NEUROCARTO_SEED");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[probe]").unwrap();
        writeln!(file, "default_type = 21").unwrap();
        writeln!(file, "[sampling]").unwrap();
        writeln!(file, "sample_times = 50").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.probe.default_type, 21);
        assert_eq!(config.probe.family, "npx");
        assert_eq!(config.sampling.sample_times, 50);
        assert_eq!(config.selection.seed, None);
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[probe\nfamily = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = NeurocartoConfig::default();

        env::set_var("NEUROCARTO_SEED", "17");
        env::set_var("NEUROCARTO_PROBE_TYPE", "0");
        env::set_var("NEUROCARTO_DEBUG_MODE", "yes");

        apply_environment_overrides(&mut config);

        env::remove_var("NEUROCARTO_SEED");
        env::remove_var("NEUROCARTO_PROBE_TYPE");
        env::remove_var("NEUROCARTO_DEBUG_MODE");

        assert_eq!(config.selection.seed, Some(17));
        assert_eq!(config.probe.default_type, 0);
        assert!(config.system.debug);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = NeurocartoConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("probe".to_string(), "np".to_string());
        cli_args.insert("sample_times".to_string(), "64".to_string());
        cli_args.insert("select.max_retry".to_string(), "5".to_string());
        cli_args.insert("select.mode".to_string(), "fast".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.probe.family, "np");
        assert_eq!(config.sampling.sample_times, 64);
        assert_eq!(
            config.selection.params.get("max_retry"),
            Some(&serde_json::json!(5))
        );
        assert_eq!(
            config.selection.params.get("mode"),
            Some(&serde_json::json!("fast"))
        );
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        // CLI overrides take precedence over environment variables
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[selection]").unwrap();
        writeln!(file, "seed = 1").unwrap();
        writeln!(file, "selector = \"file\"").unwrap();

        env::set_var("NEUROCARTO_SEED", "2");
        env::set_var("NEUROCARTO_SELECTOR", "env");

        let mut cli_args = HashMap::new();
        cli_args.insert("selector".to_string(), "cli".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("NEUROCARTO_SEED");
        env::remove_var("NEUROCARTO_SELECTOR");

        // CLI wins for selector, env wins for seed (no CLI override)
        assert_eq!(config.selection.selector, "cli");
        assert_eq!(config.selection.seed, Some(2));
    }
}
