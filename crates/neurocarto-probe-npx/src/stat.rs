// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Neuropixels statistics: local electrode density curves and the statistics
table exposed through [`StatisticsExt`].
*/

use ahash::AHashSet;
use neurocarto_probe::{evaluate, ChannelMap, StatisticsExt};
use serde::Serialize;

use crate::channelmap::{NpxChannelMap, NpxElectrode};
use crate::desp::{NpxElectrodeDesp, NpxProbeDesp};

/// Density curve of one shank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    pub shank: u32,
    /// Local channel density per row, in `[0, 1]`
    pub density: Vec<f64>,
    /// Row depth in um
    pub y: Vec<f64>,
}

/// Local density of wired electrodes along each shank.
///
/// An electrode's density is the ratio of wired electrodes to physical
/// electrodes in its 3x3 neighbourhood. Each row keeps the maximum over its
/// wired electrodes, then the curve is smoothed by a width-3 maximum filter.
pub fn electrode_density(chmap: &NpxChannelMap) -> Vec<DensityCurve> {
    let kind = chmap.probe_type();
    let used: AHashSet<NpxElectrode> = chmap.electrodes().copied().collect();
    let n_col = kind.n_col_shank as i64;
    let n_row = kind.n_row_shank as i64;

    let density = |e: &NpxElectrode| -> f64 {
        let mut electrode = 0u32;
        let mut channel = 0u32;
        for dr in -1..=1i64 {
            for dc in -1..=1i64 {
                let c = e.column as i64 + dc;
                let r = e.row as i64 + dr;
                if (0..n_col).contains(&c) && (0..n_row).contains(&r) {
                    electrode += 1;
                    if used.contains(&NpxElectrode::new(e.shank, c as u32, r as u32)) {
                        channel += 1;
                    }
                }
            }
        }
        channel as f64 / electrode as f64
    };

    let y: Vec<f64> = (0..kind.n_row_shank)
        .map(|r| (r * kind.r_space) as f64)
        .collect();

    (0..kind.n_shank)
        .map(|shank| {
            let mut row_density = vec![0.0; kind.n_row_shank as usize];
            for e in used.iter().filter(|e| e.shank == shank) {
                let d = density(e);
                let slot = &mut row_density[e.row as usize];
                if d > *slot {
                    *slot = d;
                }
            }

            DensityCurve {
                shank,
                density: maximum_filter3(&row_density),
                y: y.clone(),
            }
        })
        .collect()
}

/// Width-3 running maximum, edges extended with the nearest value
fn maximum_filter3(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(1);
            let hi = (i + 1).min(n - 1);
            values[lo..=hi].iter().copied().fold(f64::MIN, f64::max)
        })
        .collect()
}

/// Statistics table of a Neuropixels channel map
#[derive(Debug, Clone, Copy, Default)]
pub struct NpxStatistics;

impl StatisticsExt<NpxElectrode, NpxChannelMap> for NpxStatistics {
    fn statistics_info(
        &self,
        chmap: &NpxChannelMap,
        blueprint: &[NpxElectrodeDesp],
    ) -> Vec<(String, String)> {
        let probe = NpxProbeDesp::new();
        let report = evaluate(&probe, chmap, blueprint);
        let valid = neurocarto_probe::ProbeDesp::is_valid(&probe, chmap);

        vec![
            (
                "used channels".to_string(),
                format!("{}/{}", chmap.len(), chmap.n_channels()),
            ),
            (
                "request electrodes".to_string(),
                format!("{}", report.requested),
            ),
            (
                "area efficiency".to_string(),
                format!("{:.1}%", report.area_efficiency * 100.0),
            ),
            (
                "channel efficiency".to_string(),
                format!("{:.1}%", report.channel_efficiency * 100.0),
            ),
            ("valid".to_string(), valid.to_string()),
        ]
    }
}
