// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Selection statistics.

Efficiency metrics are pure reporting functions over a `(blueprint, channel
map)` pair; the selector never consults them.

- requested: `SET` electrodes count 1, density-tier electrodes count the
  tier's weight (full 1, half 1/2, quarter 1/4)
- selected: used electrodes painted `SET` or a density tier, minus used
  electrodes painted `FORBIDDEN`, never below 0
- area efficiency `Aeff = selected / requested` (0 without requests)
- channel efficiency `Ceff = min(Aeff, 1 / Aeff)` (0 when `Aeff` is 0)

[`electrode_probability`] repeats a seeded selection run many times and
tallies how often each electrode gets picked.
*/

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::desp::{ElectrodeOf, ProbeDesp};
use crate::electrode::Category;
use crate::error::ProbeResult;
use crate::select::{DensityTier, SelectOptions};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Density-weighted number of electrodes a blueprint asks for
pub fn request_electrode(blueprint: &[Category], tiers: &[DensityTier]) -> f64 {
    blueprint
        .iter()
        .map(|&c| {
            if c == Category::SET {
                1.0
            } else {
                tiers
                    .iter()
                    .find(|t| t.category == c)
                    .map_or(0.0, DensityTier::weight)
            }
        })
        .sum()
}

/// Efficiency of one selection outcome
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EfficiencyReport {
    /// Density-weighted request
    pub requested: f64,
    /// Used electrodes inside requested areas
    pub selected: f64,
    pub area_efficiency: f64,
    pub channel_efficiency: f64,
}

impl EfficiencyReport {
    /// Report for explicit `requested`/`selected` totals
    pub fn from_counts(requested: f64, selected: f64) -> Self {
        let area_efficiency = if requested > 0.0 {
            (selected / requested).max(0.0)
        } else {
            0.0
        };

        Self {
            requested,
            selected,
            area_efficiency,
            channel_efficiency: channel_efficiency_of(area_efficiency),
        }
    }
}

/// `min(aeff, 1 / aeff)`, 0 for a non-positive `aeff`
pub fn channel_efficiency_of(area_efficiency: f64) -> f64 {
    if area_efficiency > 0.0 {
        area_efficiency.min(1.0 / area_efficiency)
    } else {
        0.0
    }
}

/// Efficiency of the electrodes at the `used` indices of `blueprint`
pub fn channel_efficiency(
    blueprint: &[Category],
    used: &[usize],
    tiers: &[DensityTier],
) -> EfficiencyReport {
    let requested = request_electrode(blueprint, tiers);

    let mut selected: f64 = 0.0;
    for c in used.iter().filter_map(|&i| blueprint.get(i)) {
        if *c == Category::SET || tiers.iter().any(|t| t.category == *c) {
            selected += 1.0;
        } else if *c == Category::FORBIDDEN {
            selected -= 1.0;
        }
    }

    EfficiencyReport::from_counts(requested, selected.max(0.0))
}

/// Efficiency of `chmap` against a blueprint given as an electrode list
pub fn evaluate<P: ProbeDesp + ?Sized>(
    probe: &P,
    chmap: &P::ChannelMap,
    blueprint: &[ElectrodeOf<P>],
) -> EfficiencyReport {
    let categories: Vec<Category> = blueprint.iter().map(|e| e.category).collect();
    let index: AHashMap<&P::Key, usize> = blueprint
        .iter()
        .enumerate()
        .map(|(i, e)| (&e.electrode, i))
        .collect();

    let used: Vec<usize> = probe
        .all_channels(chmap, None)
        .iter()
        .filter_map(|e| index.get(&e.electrode).copied())
        .collect();

    channel_efficiency(&categories, &used, &probe.density_tiers())
}

/// Outcome of repeated selection sampling
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElectrodeProbability {
    /// Number of runs
    pub sample_times: usize,
    /// Per electrode (canonical order) number of runs that selected it
    pub summation: Vec<u32>,
    /// Number of runs that produced a valid channel map
    pub complete: usize,
    /// Channel efficiency of every run
    pub channel_efficiency: Vec<f64>,
}

impl ElectrodeProbability {
    /// Empty tally over `n` electrodes
    pub fn new(n: usize) -> Self {
        Self {
            sample_times: 0,
            summation: vec![0; n],
            complete: 0,
            channel_efficiency: Vec::new(),
        }
    }

    /// Per electrode selection frequency
    pub fn probability(&self) -> Vec<f64> {
        if self.sample_times == 0 {
            return vec![0.0; self.summation.len()];
        }
        let n = self.sample_times as f64;
        self.summation.iter().map(|&c| c as f64 / n).collect()
    }

    pub fn complete_rate(&self) -> f64 {
        if self.sample_times == 0 {
            0.0
        } else {
            self.complete as f64 / self.sample_times as f64
        }
    }

    pub fn max_channel_efficiency(&self) -> f64 {
        self.channel_efficiency.iter().copied().fold(0.0, f64::max)
    }

    pub fn mean_channel_efficiency(&self) -> f64 {
        if self.channel_efficiency.is_empty() {
            return 0.0;
        }
        self.channel_efficiency.iter().sum::<f64>() / self.channel_efficiency.len() as f64
    }

    /// Population variance of the per-run channel efficiency
    pub fn channel_efficiency_var(&self) -> f64 {
        if self.channel_efficiency.is_empty() {
            return 0.0;
        }
        let mean = self.mean_channel_efficiency();
        self.channel_efficiency
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / self.channel_efficiency.len() as f64
    }

    /// Combine two partial tallies over the same universe
    pub fn merge(mut self, other: ElectrodeProbability) -> Self {
        if self.summation.len() < other.summation.len() {
            self.summation.resize(other.summation.len(), 0);
        }
        for (a, b) in self.summation.iter_mut().zip(&other.summation) {
            *a += b;
        }
        self.sample_times += other.sample_times;
        self.complete += other.complete;
        self.channel_efficiency.extend(other.channel_efficiency);
        self
    }

    fn record(&mut self, sample: Sample) {
        for i in sample.used {
            self.summation[i] += 1;
        }
        self.sample_times += 1;
        if sample.valid {
            self.complete += 1;
        }
        self.channel_efficiency.push(sample.efficiency);
    }
}

struct Sample {
    used: Vec<usize>,
    valid: bool,
    efficiency: f64,
}

/// Run the probe's selector `sample_times` times on `blueprint`.
///
/// Run `i` uses seed `base + i`, where `base` is the `seed` option (0 when
/// absent), so the outcome only depends on the base seed. With the
/// `parallel` feature runs are spread over the rayon pool.
///
/// # Errors
/// The first error of any run, `ProbeError::Cancelled` included.
pub fn electrode_probability<P>(
    probe: &P,
    chmap: &P::ChannelMap,
    blueprint: &[ElectrodeOf<P>],
    sample_times: usize,
    options: &SelectOptions,
) -> ProbeResult<ElectrodeProbability>
where
    P: ProbeDesp + Sync + ?Sized,
    P::ChannelMap: Sync,
    P::Key: Send + Sync,
{
    let mut blueprint = blueprint.to_vec();
    blueprint.sort_by(|a, b| a.electrode.cmp(&b.electrode));
    blueprint.dedup_by(|a, b| a.electrode == b.electrode);

    let base = options.seed().unwrap_or(0);
    let index: AHashMap<&P::Key, usize> = blueprint
        .iter()
        .enumerate()
        .map(|(i, e)| (&e.electrode, i))
        .collect();

    let run = |i: usize| -> ProbeResult<Sample> {
        let options = options.clone().with_seed(base.wrapping_add(i as u64));
        let result = probe.select_electrodes(chmap, blueprint.clone(), &options)?;

        let used: AHashSet<usize> = probe
            .all_channels(&result, None)
            .iter()
            .filter_map(|e| index.get(&e.electrode).copied())
            .collect();

        Ok(Sample {
            valid: probe.is_valid(&result),
            efficiency: evaluate(probe, &result, &blueprint).channel_efficiency,
            used: used.into_iter().collect(),
        })
    };

    #[cfg(feature = "parallel")]
    let samples: Vec<Sample> = (0..sample_times)
        .into_par_iter()
        .map(run)
        .collect::<ProbeResult<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let samples: Vec<Sample> = (0..sample_times)
        .map(run)
        .collect::<ProbeResult<Vec<_>>>()?;

    let mut ret = ElectrodeProbability::new(blueprint.len());
    for sample in samples {
        ret.record(sample);
    }

    debug!(
        target: "neurocarto-probe",
        "Sampled {} selections: complete rate {:.3}, max Ceff {:.3}",
        ret.sample_times,
        ret.complete_rate(),
        ret.max_channel_efficiency()
    );
    Ok(ret)
}

/// [`electrode_probability`] on a dedicated pool of `workers` threads.
///
/// `workers == 0` uses the global rayon pool. Without the `parallel` feature
/// runs are sequential and `workers` is ignored.
///
/// # Errors
/// `ProbeError::WorkerPool` when the pool cannot be built, otherwise as
/// [`electrode_probability`].
pub fn electrode_probability_with_workers<P>(
    probe: &P,
    chmap: &P::ChannelMap,
    blueprint: &[ElectrodeOf<P>],
    sample_times: usize,
    workers: usize,
    options: &SelectOptions,
) -> ProbeResult<ElectrodeProbability>
where
    P: ProbeDesp + Sync + ?Sized,
    P::ChannelMap: Sync,
    P::Key: Send + Sync,
{
    #[cfg(feature = "parallel")]
    if workers > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| crate::error::ProbeError::WorkerPool(e.to_string()))?;
        debug!(target: "neurocarto-probe", "Sampling on {} workers", workers);
        return pool.install(|| electrode_probability(probe, chmap, blueprint, sample_times, options));
    }

    #[cfg(not(feature = "parallel"))]
    debug!(target: "neurocarto-probe", "Sampling sequentially, {} workers ignored", workers);

    electrode_probability(probe, chmap, blueprint, sample_times, options)
}
