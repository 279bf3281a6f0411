// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# NeuroCarto Neuropixels

Neuropixels probe family: NP1, NP2 single shank and NP2 four shank.

- `probe_type` → geometry and channel wiring per probe type
- `channelmap` → [`NpxChannelMap`], one electrode per readout channel
- `imro` → IMRO table reader/writer (`.imro` files)
- `desp` → [`NpxProbeDesp`], the [`neurocarto_probe::ProbeDesp`] implementation
- `stat` → density curves and the statistics table

Besides the core categories the family paints three density tiers:
[`CATE_FULL`], [`CATE_HALF`] and [`CATE_QUARTER`].

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

pub mod channelmap;
pub mod desp;
pub mod imro;
pub mod probe_type;
pub mod stat;

pub use channelmap::{ChannelSettings, NpxChannelMap, NpxElectrode};
pub use desp::{NpxElectrodeDesp, NpxProbeDesp, CATE_FULL, CATE_HALF, CATE_QUARTER};
pub use imro::ImroError;
pub use probe_type::{ProbeType, NP1, NP21, NP24, PROBE_TYPES};
pub use stat::{electrode_density, DensityCurve, NpxStatistics};

/// Registry name of the family
pub const FAMILY_NAME: &str = "npx";
