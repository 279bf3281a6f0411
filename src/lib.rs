// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NeuroCarto
//!
//! Blueprint-driven electrode selection for high-density neural probes.
//!
//! A *blueprint* paints every physical electrode of a probe with a category
//! (required, excluded, low priority, density tiers). The selector turns it
//! into a channel map that respects the probe's channel budget and wiring
//! rule; statistics report how well the result covers the request.
//!
//! ## Feature Flags
//!
//! - **`npx`** (default): Neuropixels family (NP1, NP2 single/four shank)
//! - **`config`** (default): `neurocarto.toml` loader
//! - **`parallel`** (default): parallel repeated-sampling statistics
//! - **`observability`**: logging initialization and per-crate debug flags
//! - **`file-logging`**: per-run JSON log files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use neurocarto::prelude::*;
//! use neurocarto::npx::{NpxProbeDesp, CATE_FULL};
//!
//! let probe = NpxProbeDesp::new();
//! let chmap = probe.new_channelmap(24)?;
//!
//! let mut blueprint = probe.all_electrodes(24)?;
//! for e in blueprint.iter_mut().filter(|e| e.y < 1000.0) {
//!     e.category = CATE_FULL;
//! }
//!
//! let result = probe.select_electrodes(&chmap, blueprint.clone(), &SelectOptions::new())?;
//! let report = evaluate(&probe, &result, &blueprint);
//! println!("channel efficiency: {:.1}%", report.channel_efficiency * 100.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Core: neurocarto-probe                                 │
//! │  (ProbeDesp, blueprint codec, selector, statistics)     │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Families: neurocarto-probe-npx                         │
//! │  (channel maps, wiring rules, IMRO tables)              │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: neurocarto-config, -observability      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

use neurocarto_probe::ProbeRegistry;
#[cfg(feature = "config")]
use neurocarto_probe::{
    BlueprintFunctions, ElectrodeOf, ElectrodeProbability, ProbeDesp, ProbeResult, SelectOptions,
};

// Re-export the core
pub use neurocarto_probe as probe;

// Re-export probe families
#[cfg(feature = "npx")]
pub use neurocarto_probe_npx as npx;

// Re-export infrastructure
#[cfg(feature = "config")]
pub use neurocarto_config as config;

#[cfg(feature = "observability")]
pub use neurocarto_observability as observability;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Registry holding every probe family compiled into this build.
///
/// Neuropixels is registered as `npx` with the aliases `neuropixels` and `np`.
pub fn default_registry() -> ProbeRegistry {
    #[allow(unused_mut)]
    let mut registry = ProbeRegistry::new();

    #[cfg(feature = "npx")]
    registry.register(npx::FAMILY_NAME, &["neuropixels", "np"], || {
        std::sync::Arc::new(npx::NpxProbeDesp::new()) as std::sync::Arc<dyn neurocarto_probe::ProbeInfo>
    });

    tracing::debug!(target: "neurocarto", "Probe registry: {:?}", registry.names());
    registry
}

/// Selection options described by the `[selection]` configuration section.
///
/// Extra parameters are copied as-is; `selector` and `seed` override
/// parameters of the same name.
#[cfg(feature = "config")]
pub fn options_from_config(selection: &config::SelectionConfig) -> SelectOptions {
    let params = selection
        .params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let options = SelectOptions::from_map(params).with_selector(&selection.selector);
    match selection.seed {
        Some(seed) => options.with_seed(seed),
        None => options,
    }
}

/// Repeated-selection statistics sized by the `[sampling]` section
/// (`sample_times` runs on `workers` threads, 0 meaning the global pool)
#[cfg(feature = "config")]
pub fn sample_from_config<P>(
    probe: &P,
    chmap: &P::ChannelMap,
    blueprint: &[ElectrodeOf<P>],
    sampling: &config::SamplingConfig,
    options: &SelectOptions,
) -> ProbeResult<ElectrodeProbability>
where
    P: ProbeDesp + Sync + ?Sized,
    P::ChannelMap: Sync,
    P::Key: Send + Sync,
{
    neurocarto_probe::electrode_probability_with_workers(
        probe,
        chmap,
        blueprint,
        sampling.sample_times,
        sampling.workers,
        options,
    )
}

/// Blueprint toolkit bound to `chmap`, reading and writing blueprint files
/// with the `[blueprint]` suffix
#[cfg(feature = "config")]
pub fn blueprint_functions_from_config<'p, P: ProbeDesp + ?Sized>(
    probe: &'p P,
    chmap: P::ChannelMap,
    blueprint: &config::BlueprintConfig,
) -> ProbeResult<BlueprintFunctions<'p, P>> {
    Ok(BlueprintFunctions::new(probe, chmap)?.with_suffix(blueprint.suffix.as_str()))
}

/// Debug flags from the process arguments and environment, with the default
/// level taken from `system.log_level`
#[cfg(all(feature = "config", feature = "observability"))]
pub fn debug_flags_from_config(
    system: &config::SystemConfig,
) -> observability::CrateDebugFlags {
    let mut flags = observability::parse_debug_flags().with_default_level(&system.log_level);
    if system.debug {
        flags.enabled_crates.insert("neurocarto".to_string());
    }
    flags
}

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use neurocarto_probe::{
        blueprint_path, electrode_probability, evaluate, BlueprintFunctions, BlueprintSource,
        Category, ChannelMap, ElectrodeDesp, ElectrodeState, ProbeDesp, ProbeError,
        ProbeRegistry, ProbeResult, Region, SelectOptions, Universe,
    };

    #[cfg(feature = "npx")]
    pub use neurocarto_probe_npx::{NpxChannelMap, NpxElectrode, NpxProbeDesp};
}
