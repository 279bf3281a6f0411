// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Neuropixels probe descriptor.
*/

use std::path::Path;

use neurocarto_probe::{
    Category, ChannelMap, DensityPattern, DensityTier, ElectrodeDesp, ElectrodeState, ProbeDesp,
    ProbeError, ProbeResult, StatisticsExt,
};
use tracing::debug;

use crate::channelmap::{NpxChannelMap, NpxElectrode};
use crate::imro;
use crate::probe_type::{ProbeType, PROBE_TYPES};
use crate::stat::NpxStatistics;

/// Neuropixels electrode descriptor
pub type NpxElectrodeDesp = ElectrodeDesp<NpxElectrode>;

/// Full-density area
pub const CATE_FULL: Category = Category(11);
/// Half-density area
pub const CATE_HALF: Category = Category(12);
/// Quarter-density area
pub const CATE_QUARTER: Category = Category(13);

/// Neuropixels family descriptor
#[derive(Debug, Clone, Copy, Default)]
pub struct NpxProbeDesp {
    statistics: NpxStatistics,
}

impl NpxProbeDesp {
    pub fn new() -> Self {
        Self::default()
    }

    fn probe_type(code: u32) -> ProbeResult<ProbeType> {
        ProbeType::from_code(code).ok_or(ProbeError::UnknownProbeType(code))
    }

    /// Descriptor of one electrode
    pub fn electrode_desp(probe_type: &ProbeType, electrode: NpxElectrode) -> NpxElectrodeDesp {
        let (x, y) = probe_type.position(electrode.shank, electrode.column, electrode.row);
        ElectrodeDesp::new(
            electrode,
            electrode.shank,
            x,
            y,
            electrode.channel(probe_type),
        )
    }
}

impl ProbeDesp for NpxProbeDesp {
    type Key = NpxElectrode;
    type ChannelMap = NpxChannelMap;

    fn supported_type(&self) -> Vec<(&'static str, u32)> {
        PROBE_TYPES.iter().map(|t| (t.name, t.code)).collect()
    }

    fn possible_categories(&self) -> Vec<(&'static str, Category)> {
        vec![
            ("Unset", Category::UNSET),
            ("Set", Category::SET),
            ("Full Density", CATE_FULL),
            ("Half Density", CATE_HALF),
            ("Quarter Density", CATE_QUARTER),
            ("Low priority", Category::LOW),
            ("Excluded", Category::FORBIDDEN),
        ]
    }

    fn channelmap_file_suffix(&self) -> Vec<&'static str> {
        vec![".imro"]
    }

    fn load_from_file(&self, path: &Path) -> ProbeResult<NpxChannelMap> {
        imro::load(path)
    }

    fn save_to_file(&self, chmap: &NpxChannelMap, path: &Path) -> ProbeResult<()> {
        imro::save(chmap, path)
    }

    fn new_channelmap(&self, code: u32) -> ProbeResult<NpxChannelMap> {
        Ok(NpxChannelMap::new(Self::probe_type(code)?))
    }

    fn new_channelmap_like(&self, chmap: &NpxChannelMap) -> ProbeResult<NpxChannelMap> {
        let mut ret = NpxChannelMap::new(*chmap.probe_type());
        *ret.settings_mut() = *chmap.settings();
        Ok(ret)
    }

    fn all_electrodes(&self, code: u32) -> ProbeResult<Vec<NpxElectrodeDesp>> {
        let probe_type = Self::probe_type(code)?;
        let mut ret = Vec::with_capacity(probe_type.n_electrode_total() as usize);
        for shank in 0..probe_type.n_shank {
            for column in 0..probe_type.n_col_shank {
                for row in 0..probe_type.n_row_shank {
                    let e = NpxElectrode::new(shank, column, row);
                    ret.push(Self::electrode_desp(&probe_type, e));
                }
            }
        }
        Ok(ret)
    }

    fn all_channels(
        &self,
        chmap: &NpxChannelMap,
        electrodes: Option<&[NpxElectrodeDesp]>,
    ) -> Vec<NpxElectrodeDesp> {
        match electrodes {
            Some(list) => list
                .iter()
                .filter(|e| chmap.contains(&e.electrode))
                .cloned()
                .collect(),
            None => chmap
                .electrodes()
                .map(|e| {
                    let mut desp = Self::electrode_desp(chmap.probe_type(), *e);
                    desp.state = ElectrodeState::Used;
                    desp
                })
                .collect(),
        }
    }

    fn add_electrode(
        &self,
        chmap: &mut NpxChannelMap,
        e: &mut NpxElectrodeDesp,
        overwrite: bool,
    ) -> ProbeResult<()> {
        chmap.add(e.electrode, overwrite)?;
        e.state = ElectrodeState::Used;
        Ok(())
    }

    fn del_electrode(&self, chmap: &mut NpxChannelMap, e: &mut NpxElectrodeDesp) {
        chmap.remove(&e.electrode);
        e.state = ElectrodeState::Unused;
    }

    fn clear_electrode(&self, chmap: &mut NpxChannelMap) {
        chmap.clear();
    }

    fn probe_rule(
        &self,
        chmap: &NpxChannelMap,
        e1: &NpxElectrodeDesp,
        e2: &NpxElectrodeDesp,
    ) -> bool {
        let probe_type = chmap.probe_type();
        e1.electrode.channel(probe_type) != e2.electrode.channel(probe_type)
    }

    fn is_valid(&self, chmap: &NpxChannelMap) -> bool {
        // one electrode per channel slot already enforces the rule
        let valid = chmap.len() <= chmap.n_channels()
            && chmap
                .channels()
                .all(|(c, e)| e.channel(chmap.probe_type()) == c);
        debug!(target: "neurocarto-probe-npx", "Channel map valid: {}", valid);
        valid
    }

    fn density_tiers(&self) -> Vec<DensityTier> {
        vec![
            DensityTier::new(CATE_FULL, DensityPattern::Full),
            DensityTier::new(CATE_HALF, DensityPattern::Half),
            DensityTier::new(CATE_QUARTER, DensityPattern::Quarter),
        ]
    }

    fn statistics_ext(&self) -> Option<&dyn StatisticsExt<NpxElectrode, NpxChannelMap>> {
        Some(&self.statistics)
    }
}
