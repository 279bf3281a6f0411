// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Column probe used by the integration tests.
//!
//! Electrode `id` sits at column `id % cols`, row `id / cols` and is wired to
//! channel `column`, so two electrodes are compatible iff they sit in
//! different columns. The channel budget is the number of columns.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use neurocarto_probe::{
    Category, ChannelMap, DensityPattern, DensityTier, ElectrodeDesp, ElectrodeState, ProbeDesp,
    ProbeError, ProbeResult,
};

pub const COLUMN_PITCH: f64 = 10.0;
pub const ROW_PITCH: f64 = 20.0;

pub const CATE_FULL: Category = Category(11);
pub const CATE_HALF: Category = Category(12);

/// Type codes: 0 → 3 columns x 2 rows, 1 → 4 columns x 8 rows
pub fn geometry(code: u32) -> Option<(u32, u32)> {
    match code {
        0 => Some((3, 2)),
        1 => Some((4, 8)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    code: u32,
    cols: u32,
    rows: u32,
    /// channel → electrode id
    channels: Vec<Option<u32>>,
}

impl ColumnMap {
    pub fn electrodes(&self) -> Vec<u32> {
        let mut ret: Vec<u32> = self.channels.iter().flatten().copied().collect();
        ret.sort_unstable();
        ret
    }

    /// Test backdoor: wire `id` to channel `channel` regardless of the rule
    pub fn force(&mut self, channel: usize, id: u32) {
        self.channels[channel] = Some(id);
    }
}

impl ChannelMap for ColumnMap {
    fn probe_code(&self) -> u32 {
        self.code
    }

    fn len(&self) -> usize {
        self.channels.iter().filter(|c| c.is_some()).count()
    }

    fn n_channels(&self) -> usize {
        self.cols as usize
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnProbe {
    pub tiers: bool,
}

impl ColumnProbe {
    fn electrode(&self, cols: u32, id: u32) -> ElectrodeDesp<u32> {
        let col = id % cols;
        let row = id / cols;
        ElectrodeDesp::new(id, 0, col as f64 * COLUMN_PITCH, row as f64 * ROW_PITCH, col)
    }
}

impl ProbeDesp for ColumnProbe {
    type Key = u32;
    type ChannelMap = ColumnMap;

    fn supported_type(&self) -> Vec<(&'static str, u32)> {
        vec![("Column 3x2", 0), ("Column 4x8", 1)]
    }

    fn possible_categories(&self) -> Vec<(&'static str, Category)> {
        let mut ret = vec![
            ("Unset", Category::UNSET),
            ("Set", Category::SET),
            ("Forbidden", Category::FORBIDDEN),
            ("Low", Category::LOW),
        ];
        if self.tiers {
            ret.push(("Full", CATE_FULL));
            ret.push(("Half", CATE_HALF));
        }
        ret
    }

    fn channelmap_file_suffix(&self) -> Vec<&'static str> {
        vec![".colmap"]
    }

    fn load_from_file(&self, path: &Path) -> ProbeResult<ColumnMap> {
        let text = fs::read_to_string(path).map_err(|e| ProbeError::io(path, e))?;
        let mut tokens = text.split_whitespace();
        let code = tokens
            .next()
            .and_then(|t| t.parse::<u32>().ok())
            .ok_or_else(|| ProbeError::Format("missing type code".to_string()))?;
        let mut chmap = self.new_channelmap(code)?;
        for token in tokens {
            let id = token
                .parse::<u32>()
                .map_err(|_| ProbeError::Format(format!("bad electrode {}", token)))?;
            let mut e = self.electrode(chmap.cols, id);
            self.add_electrode(&mut chmap, &mut e, false)?;
        }
        Ok(chmap)
    }

    fn save_to_file(&self, chmap: &ColumnMap, path: &Path) -> ProbeResult<()> {
        let mut text = chmap.code.to_string();
        for id in chmap.electrodes() {
            text.push(' ');
            text.push_str(&id.to_string());
        }
        fs::write(path, text).map_err(|e| ProbeError::io(path, e))
    }

    fn new_channelmap(&self, code: u32) -> ProbeResult<ColumnMap> {
        let (cols, rows) = geometry(code).ok_or(ProbeError::UnknownProbeType(code))?;
        Ok(ColumnMap {
            code,
            cols,
            rows,
            channels: vec![None; cols as usize],
        })
    }

    fn all_electrodes(&self, code: u32) -> ProbeResult<Vec<ElectrodeDesp<u32>>> {
        let (cols, rows) = geometry(code).ok_or(ProbeError::UnknownProbeType(code))?;
        Ok((0..cols * rows).map(|id| self.electrode(cols, id)).collect())
    }

    fn all_channels(
        &self,
        chmap: &ColumnMap,
        electrodes: Option<&[ElectrodeDesp<u32>]>,
    ) -> Vec<ElectrodeDesp<u32>> {
        let used = chmap.electrodes();
        match electrodes {
            Some(list) => list
                .iter()
                .filter(|e| used.contains(&e.electrode))
                .cloned()
                .collect(),
            None => used
                .into_iter()
                .map(|id| {
                    let mut e = self.electrode(chmap.cols, id);
                    e.state = ElectrodeState::Used;
                    e
                })
                .collect(),
        }
    }

    fn add_electrode(
        &self,
        chmap: &mut ColumnMap,
        e: &mut ElectrodeDesp<u32>,
        overwrite: bool,
    ) -> ProbeResult<()> {
        let channel = (e.electrode % chmap.cols) as usize;
        match chmap.channels[channel] {
            Some(other) if other != e.electrode && !overwrite => {
                return Err(ProbeError::Conflict(format!(
                    "channel {} already used by electrode {}",
                    channel, other
                )));
            }
            _ => {}
        }
        chmap.channels[channel] = Some(e.electrode);
        e.state = ElectrodeState::Used;
        Ok(())
    }

    fn del_electrode(&self, chmap: &mut ColumnMap, e: &mut ElectrodeDesp<u32>) {
        let channel = (e.electrode % chmap.cols) as usize;
        if chmap.channels[channel] == Some(e.electrode) {
            chmap.channels[channel] = None;
        }
        e.state = ElectrodeState::Unused;
    }

    fn clear_electrode(&self, chmap: &mut ColumnMap) {
        chmap.channels.iter_mut().for_each(|c| *c = None);
    }

    fn probe_rule(
        &self,
        chmap: &ColumnMap,
        e1: &ElectrodeDesp<u32>,
        e2: &ElectrodeDesp<u32>,
    ) -> bool {
        e1.electrode % chmap.cols != e2.electrode % chmap.cols
    }

    fn density_tiers(&self) -> Vec<DensityTier> {
        if self.tiers {
            vec![
                DensityTier::new(CATE_FULL, DensityPattern::Full),
                DensityTier::new(CATE_HALF, DensityPattern::Half),
            ]
        } else {
            Vec::new()
        }
    }
}

/// Universe of `code` with the given `(id, category)` assignments
pub fn blueprint(code: u32, categories: &[(u32, Category)]) -> Vec<ElectrodeDesp<u32>> {
    let mut electrodes = ColumnProbe::default().all_electrodes(code).unwrap();
    for (id, category) in categories {
        electrodes[*id as usize].category = *category;
    }
    electrodes
}
