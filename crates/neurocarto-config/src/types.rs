// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `neurocarto.toml`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeurocartoConfig {
    pub system: SystemConfig,
    pub probe: ProbeConfig,
    pub selection: SelectionConfig,
    pub sampling: SamplingConfig,
    pub blueprint: BlueprintConfig,
}

/// System-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub log_level: String,
    pub debug: bool,
    /// Where channel maps and blueprints are read from and written to.
    /// Empty means the current directory.
    pub data_dir: PathBuf,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
            data_dir: PathBuf::from(""),
        }
    }
}

/// Probe family selection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Registry name (or alias) of the probe family
    pub family: String,
    /// Probe type code used for new channel maps
    pub default_type: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            family: "npx".to_string(),
            default_type: 24,
        }
    }
}

/// Electrode selection run parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Selector variant name, `default` for the built-in selector
    pub selector: String,
    /// Seed for shuffled candidate order. `None` keeps the deterministic
    /// coverage order.
    pub seed: Option<u64>,
    /// Extra named parameters handed to the selector untouched
    pub params: BTreeMap<String, serde_json::Value>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            selector: "default".to_string(),
            seed: None,
            params: BTreeMap::new(),
        }
    }
}

/// Repeated-sampling statistics
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub sample_times: usize,
    /// Worker threads, 0 for the global rayon pool
    pub workers: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_times: 1000,
            workers: 0,
        }
    }
}

/// Blueprint file naming
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BlueprintConfig {
    pub suffix: String,
}

impl Default for BlueprintConfig {
    fn default() -> Self {
        Self {
            suffix: ".blueprint.npy".to_string(),
        }
    }
}
