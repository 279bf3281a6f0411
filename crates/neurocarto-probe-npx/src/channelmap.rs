// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Neuropixels channel map.

Holds at most one electrode per readout channel. The channel of an electrode
is fixed by the probe type (see [`ProbeType::channel`]), so two electrodes are
compatible iff they map to different channels.
*/

use std::fmt;

use neurocarto_probe::{ChannelMap, ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};

use crate::probe_type::ProbeType;

/// Electrode identity: `(shank, column, row)`. Ordering is the canonical
/// electrode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NpxElectrode {
    pub shank: u32,
    pub column: u32,
    pub row: u32,
}

impl NpxElectrode {
    pub const fn new(shank: u32, column: u32, row: u32) -> Self {
        Self { shank, column, row }
    }

    /// Build from a shank-local electrode number
    pub fn from_number(probe_type: &ProbeType, shank: u32, electrode: u32) -> Self {
        let (column, row) = probe_type.column_row(electrode);
        Self { shank, column, row }
    }

    /// Shank-local electrode number
    pub fn number(&self, probe_type: &ProbeType) -> u32 {
        probe_type.electrode_number(self.column, self.row)
    }

    /// Bank of this electrode
    pub fn bank(&self, probe_type: &ProbeType) -> u32 {
        self.number(probe_type) / crate::probe_type::BANK_SIZE
    }

    pub fn channel(&self, probe_type: &ProbeType) -> u32 {
        probe_type.channel(self.shank, self.number(probe_type))
    }

    pub fn is_valid_for(&self, probe_type: &ProbeType) -> bool {
        self.shank < probe_type.n_shank
            && self.column < probe_type.n_col_shank
            && self.row < probe_type.n_row_shank
    }
}

impl fmt::Display for NpxElectrode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Electrode[{},{},{}]", self.shank, self.column, self.row)
    }
}

/// Reference and gain settings carried through IMRO tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettings {
    pub reference: u32,
    /// NP1 AP band gain
    pub ap_gain: u32,
    /// NP1 LF band gain
    pub lf_gain: u32,
    /// NP1 AP high-pass filter
    pub ap_filter: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            reference: 0,
            ap_gain: 500,
            lf_gain: 250,
            ap_filter: true,
        }
    }
}

/// Neuropixels channel map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpxChannelMap {
    probe_type: ProbeType,
    channels: Vec<Option<NpxElectrode>>,
    settings: ChannelSettings,
}

impl NpxChannelMap {
    pub fn new(probe_type: ProbeType) -> Self {
        Self {
            probe_type,
            channels: vec![None; probe_type.n_channels as usize],
            settings: ChannelSettings::default(),
        }
    }

    pub fn probe_type(&self) -> &ProbeType {
        &self.probe_type
    }

    pub fn settings(&self) -> &ChannelSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ChannelSettings {
        &mut self.settings
    }

    /// Wired electrodes in channel order
    pub fn electrodes(&self) -> impl Iterator<Item = &NpxElectrode> + '_ {
        self.channels.iter().flatten()
    }

    /// Wired electrodes as `(channel, electrode)` pairs
    pub fn channels(&self) -> impl Iterator<Item = (u32, &NpxElectrode)> + '_ {
        self.channels
            .iter()
            .enumerate()
            .filter_map(|(c, e)| e.as_ref().map(|e| (c as u32, e)))
    }

    pub fn get_channel(&self, channel: u32) -> Option<&NpxElectrode> {
        self.channels.get(channel as usize).and_then(Option::as_ref)
    }

    pub fn contains(&self, electrode: &NpxElectrode) -> bool {
        self.get_channel(electrode.channel(&self.probe_type)) == Some(electrode)
    }

    /// Wire `electrode` to its channel.
    ///
    /// # Errors
    /// `ProbeError::Format` for an electrode outside the probe geometry,
    /// `ProbeError::Conflict` when the channel holds another electrode and
    /// `overwrite` is false.
    pub fn add(&mut self, electrode: NpxElectrode, overwrite: bool) -> ProbeResult<()> {
        if !electrode.is_valid_for(&self.probe_type) {
            return Err(ProbeError::Format(format!(
                "{} outside {} geometry",
                electrode, self.probe_type.name
            )));
        }

        let channel = electrode.channel(&self.probe_type) as usize;
        match self.channels[channel] {
            Some(other) if other != electrode && !overwrite => Err(ProbeError::Conflict(format!(
                "channel {} already used by {}",
                channel, other
            ))),
            _ => {
                self.channels[channel] = Some(electrode);
                Ok(())
            }
        }
    }

    /// Unwire `electrode`. Returns whether it was wired.
    pub fn remove(&mut self, electrode: &NpxElectrode) -> bool {
        let channel = electrode.channel(&self.probe_type) as usize;
        match self.channels.get_mut(channel) {
            Some(slot) if slot.as_ref() == Some(electrode) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.channels.iter_mut().for_each(|c| *c = None);
    }
}

impl ChannelMap for NpxChannelMap {
    fn probe_code(&self) -> u32 {
        self.probe_type.code
    }

    fn len(&self) -> usize {
        self.channels.iter().filter(|c| c.is_some()).count()
    }

    fn n_channels(&self) -> usize {
        self.probe_type.n_channels as usize
    }
}
