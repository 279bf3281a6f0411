// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Probe descriptor: the capability contract every probe family implements.

A family implements [`ProbeDesp`] once for its concrete channel map type and
electrode identity type. The required methods cover vocabularies, channel map
construction and mutation, the channel map file codec and the hardware rule;
everything else (descriptions, lookups, rule-based pruning, the default
selector and the blueprint codec) has a default implementation written in
terms of those.

## Probe rule

[`ProbeDesp::probe_rule`] answers "if `e1` is selected, is `e2` still legally
selectable?" It must be a pure function of `(chmap, e1, e2)`. A family whose
restriction depends on selection order has to record that order inside the
channel map value itself.
*/

use std::fmt::Debug;
use std::hash::Hash;
use std::path::Path;

use crate::blueprint::codec;
use crate::channelmap::ChannelMap;
use crate::electrode::{Category, ElectrodeDesp, ElectrodeState};
use crate::error::ProbeResult;
use crate::select::{self, DensityTier, SelectOptions};

/// Electrode descriptor type of a probe family
pub type ElectrodeOf<P> = ElectrodeDesp<<P as ProbeDesp>::Key>;

/// Something that fixes the electrode universe of a probe type
#[derive(Debug, Clone, Copy)]
pub enum Universe<'a, M, K> {
    /// Probe type code
    Code(u32),
    /// The probe type of an existing channel map
    ChannelMap(&'a M),
    /// An explicit electrode list (canonical order is its identity order)
    Electrodes(&'a [ElectrodeDesp<K>]),
}

/// Where a blueprint array comes from
#[derive(Debug, Clone, Copy)]
pub enum BlueprintSource<'a> {
    /// Category codes already in memory
    Array(&'a [i32]),
    /// A `.blueprint.npy` file
    File(&'a Path),
}

/// Optional statistics capability of a probe family.
///
/// Obtained through [`ProbeDesp::statistics_ext`].
pub trait StatisticsExt<K, M> {
    /// Statistics table for a channel map and the blueprint it was derived from,
    /// as `(title, value)` rows.
    fn statistics_info(&self, chmap: &M, blueprint: &[ElectrodeDesp<K>]) -> Vec<(String, String)>;
}

/// Probe family descriptor
pub trait ProbeDesp {
    /// Electrode identity. Its `Ord` defines the canonical electrode order.
    type Key: Clone + Eq + Hash + Ord + Debug;

    /// Concrete channel map type
    type ChannelMap: ChannelMap;

    /// Supported probe types as `(display name, type code)`
    fn supported_type(&self) -> Vec<(&'static str, u32)>;

    /// Electrode states a user may assign. `Forbidden` is implicit and never listed.
    fn possible_states(&self) -> Vec<(&'static str, ElectrodeState)> {
        vec![
            ("Unused", ElectrodeState::Unused),
            ("Used", ElectrodeState::Used),
        ]
    }

    /// Categories a user may paint, including family extensions
    fn possible_categories(&self) -> Vec<(&'static str, Category)> {
        vec![
            ("Unset", Category::UNSET),
            ("Set", Category::SET),
            ("Forbidden", Category::FORBIDDEN),
            ("Low", Category::LOW),
        ]
    }

    /// Recognized channel map file extensions, including the leading dot
    fn channelmap_file_suffix(&self) -> Vec<&'static str>;

    /// Read a channel map file.
    ///
    /// # Errors
    /// `ProbeError::Io` when the file cannot be read, `ProbeError::Format` when
    /// its content does not describe a channel map of this family.
    fn load_from_file(&self, path: &Path) -> ProbeResult<Self::ChannelMap>;

    /// Write a channel map file
    fn save_to_file(&self, chmap: &Self::ChannelMap, path: &Path) -> ProbeResult<()>;

    /// Empty channel map of the given probe type
    fn new_channelmap(&self, code: u32) -> ProbeResult<Self::ChannelMap>;

    /// Empty channel map of the same probe type as `chmap`
    fn new_channelmap_like(&self, chmap: &Self::ChannelMap) -> ProbeResult<Self::ChannelMap> {
        self.new_channelmap(chmap.probe_code())
    }

    fn copy_channelmap(&self, chmap: &Self::ChannelMap) -> Self::ChannelMap {
        chmap.clone()
    }

    /// Every physical electrode of a probe type, in ascending identity order
    fn all_electrodes(&self, code: u32) -> ProbeResult<Vec<ElectrodeOf<Self>>>;

    /// Every physical electrode of the probe type of `chmap`
    fn all_electrodes_like(&self, chmap: &Self::ChannelMap) -> ProbeResult<Vec<ElectrodeOf<Self>>> {
        self.all_electrodes(chmap.probe_code())
    }

    /// Electrodes wired to channels in `chmap`.
    ///
    /// With `electrodes`, the matching descriptors are taken from that list
    /// instead of freshly built ones, in the list's order.
    fn all_channels(
        &self,
        chmap: &Self::ChannelMap,
        electrodes: Option<&[ElectrodeOf<Self>]>,
    ) -> Vec<ElectrodeOf<Self>>;

    /// Wire `e` to its channel and mark it `Used`.
    ///
    /// # Errors
    /// `ProbeError::Conflict` when the channel is taken and `overwrite` is false.
    /// With `overwrite`, the previous occupant is replaced.
    fn add_electrode(
        &self,
        chmap: &mut Self::ChannelMap,
        e: &mut ElectrodeOf<Self>,
        overwrite: bool,
    ) -> ProbeResult<()>;

    /// Unwire `e` if present; no-op otherwise
    fn del_electrode(&self, chmap: &mut Self::ChannelMap, e: &mut ElectrodeOf<Self>);

    /// Unwire every electrode
    fn clear_electrode(&self, chmap: &mut Self::ChannelMap);

    /// Pairwise hardware compatibility. See the module documentation.
    fn probe_rule(
        &self,
        chmap: &Self::ChannelMap,
        e1: &ElectrodeOf<Self>,
        e2: &ElectrodeOf<Self>,
    ) -> bool;

    /// True iff the channel budget holds and every pair of used electrodes
    /// passes [`probe_rule`](Self::probe_rule) in both directions
    fn is_valid(&self, chmap: &Self::ChannelMap) -> bool {
        if chmap.len() > chmap.n_channels() {
            return false;
        }

        let used = self.all_channels(chmap, None);
        for (i, e1) in used.iter().enumerate() {
            for e2 in &used[i + 1..] {
                if !self.probe_rule(chmap, e1, e2) || !self.probe_rule(chmap, e2, e1) {
                    return false;
                }
            }
        }
        true
    }

    /// Density-tier categories in processing order (densest first)
    fn density_tiers(&self) -> Vec<DensityTier> {
        Vec::new()
    }

    /// Build a new channel map from a blueprint.
    ///
    /// `chmap` only provides the probe type and rule context; it is never
    /// modified. The default runs [`select::select_default`].
    fn select_electrodes(
        &self,
        chmap: &Self::ChannelMap,
        blueprint: Vec<ElectrodeOf<Self>>,
        options: &SelectOptions,
    ) -> ProbeResult<Self::ChannelMap> {
        select::select_default(self, chmap, blueprint, options)
    }

    /// One category code per electrode in canonical order
    fn save_blueprint(&self, electrodes: &[ElectrodeOf<Self>]) -> Vec<i32> {
        codec::save_blueprint(electrodes)
    }

    /// Freshly copied universe electrodes carrying the categories of `source`
    fn load_blueprint(
        &self,
        source: BlueprintSource<'_>,
        universe: Universe<'_, Self::ChannelMap, Self::Key>,
    ) -> ProbeResult<Vec<ElectrodeOf<Self>>> {
        codec::load_blueprint(self, source, universe)
    }

    /// Capability query for the statistics extension
    fn statistics_ext(&self) -> Option<&dyn StatisticsExt<Self::Key, Self::ChannelMap>> {
        None
    }

    fn type_description(&self, code: u32) -> Option<&'static str> {
        self.supported_type()
            .into_iter()
            .find(|(_, c)| *c == code)
            .map(|(name, _)| name)
    }

    fn state_description(&self, state: ElectrodeState) -> Option<&'static str> {
        if state == ElectrodeState::Forbidden {
            return Some("Forbidden");
        }
        self.possible_states()
            .into_iter()
            .find(|(_, s)| *s == state)
            .map(|(name, _)| name)
    }

    fn category_description(&self, category: Category) -> Option<&'static str> {
        self.possible_categories()
            .into_iter()
            .find(|(_, c)| *c == category)
            .map(|(name, _)| name)
    }

    /// Find an electrode by identity
    fn get_electrode<'e>(
        &self,
        electrodes: &'e [ElectrodeOf<Self>],
        key: &Self::Key,
    ) -> Option<&'e ElectrodeOf<Self>> {
        electrodes.iter().find(|e| &e.electrode == key)
    }

    /// Value copy of an electrode list
    fn copy_electrodes(&self, electrodes: &[ElectrodeOf<Self>]) -> Vec<ElectrodeOf<Self>> {
        electrodes.to_vec()
    }

    /// Candidates that would violate the probe rule against any of
    /// `electrodes` if selected. An electrode is never checked against itself.
    fn invalid_electrodes<'c>(
        &self,
        chmap: &Self::ChannelMap,
        electrodes: &[ElectrodeOf<Self>],
        candidates: &'c [ElectrodeOf<Self>],
    ) -> Vec<&'c ElectrodeOf<Self>> {
        candidates
            .iter()
            .filter(|c| {
                electrodes
                    .iter()
                    .any(|e| e.electrode != c.electrode && !self.probe_rule(chmap, e, c))
            })
            .collect()
    }
}
