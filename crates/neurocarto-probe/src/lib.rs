// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# NeuroCarto Probe

Probe abstraction and electrode-selection engine.

A probe family describes its electrodes, channel map and hardware rule
through [`ProbeDesp`]. On top of that contract this crate provides:
- the blueprint codec (per-electrode category arrays and `.blueprint.npy` files)
- [`BlueprintFunctions`] for editing blueprints against a bound channel map,
  including zone clustering, filling, growing and shrinking
- the default category-driven electrode selector
- area/channel efficiency and repeated-sampling statistics
- a registry of type-erased probe families

## Architecture

- `electrode` → [`ElectrodeDesp`], [`ElectrodeState`], [`Category`]
- `channelmap` → the [`ChannelMap`] view every family map implements
- `desp` → the [`ProbeDesp`] capability contract
- `blueprint` → codec, file format and toolkit
- `select` → default selector, density tiers, option bag
- `stat` → efficiency metrics and sampling
- `registry` → [`ProbeRegistry`]

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

pub mod blueprint;
pub mod channelmap;
pub mod desp;
pub mod electrode;
pub mod error;
pub mod grid;
pub mod registry;
pub mod select;
pub mod stat;

pub use blueprint::{blueprint_path, blueprint_path_with_suffix, BlueprintFunctions, Region, Zone};
pub use channelmap::ChannelMap;
pub use desp::{BlueprintSource, ElectrodeOf, ProbeDesp, StatisticsExt, Universe};
pub use electrode::{Category, ElectrodeDesp, ElectrodeState};
pub use error::{ProbeError, ProbeResult};
pub use grid::{ElectrodeGrid, GridPos};
pub use registry::{downcast, ProbeInfo, ProbeRegistry};
pub use select::{CancelToken, DensityPattern, DensityTier, SelectOptions, DEFAULT_SELECTOR};
pub use stat::{
    channel_efficiency, electrode_probability, electrode_probability_with_workers, evaluate,
    request_electrode, EfficiencyReport, ElectrodeProbability,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
