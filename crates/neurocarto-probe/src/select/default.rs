// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Default category-driven electrode selector.

Stages, each preceded by a cancellation checkpoint:

1. electrodes painted `FORBIDDEN` become `Forbidden` for the whole run;
2. `SET` electrodes, in canonical (identity) order;
3. the family's density tiers, densest first;
4. `LOW` electrodes.

Every committed electrode immediately forbids, through `probe_rule`, every
still-unused electrode it is incompatible with. Before committing, a
candidate is re-checked against all electrodes selected so far. The run stops
early once the channel budget is used up. `UNSET` electrodes are never picked.

Within a tier or the `LOW` stage, candidates are visited by `(y, shank, x)`
so a budget that runs out mid-stage still spreads over all shanks; ties fall
back to identity order. With a `seed` option the stage is shuffled instead.
`SET` always keeps canonical order, so conflicting `SET` electrodes are
resolved in favour of the earlier one.
*/

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, trace, warn};

use crate::channelmap::ChannelMap;
use crate::desp::{ElectrodeOf, ProbeDesp};
use crate::electrode::{Category, ElectrodeState};
use crate::error::{ProbeError, ProbeResult};
use crate::grid::ElectrodeGrid;

use super::density::DensityPattern;
use super::options::{SelectOptions, DEFAULT_SELECTOR};

/// Outcome of a selection run: the new channel map plus the blueprint
/// electrodes annotated with their final states
#[derive(Debug, Clone)]
pub struct Selection<K, M> {
    pub channelmap: M,
    /// Blueprint electrodes in canonical order
    pub electrodes: Vec<crate::electrode::ElectrodeDesp<K>>,
}

/// Default selector entry point used by [`ProbeDesp::select_electrodes`]
pub fn select_default<P: ProbeDesp + ?Sized>(
    probe: &P,
    chmap: &P::ChannelMap,
    blueprint: Vec<ElectrodeOf<P>>,
    options: &SelectOptions,
) -> ProbeResult<P::ChannelMap> {
    run_selection(probe, chmap, blueprint, options).map(|s| s.channelmap)
}

/// Run the default selector and keep the annotated blueprint.
///
/// # Errors
/// `ProbeError::UnknownSelector` when the options name a selector variant
/// other than [`DEFAULT_SELECTOR`].
/// `ProbeError::Cancelled` when the options' cancel token fires; the partial
/// run is discarded. Errors from the family's channel map construction are
/// passed through. Rule conflicts are never errors.
pub fn run_selection<P: ProbeDesp + ?Sized>(
    probe: &P,
    chmap: &P::ChannelMap,
    blueprint: Vec<ElectrodeOf<P>>,
    options: &SelectOptions,
) -> ProbeResult<Selection<P::Key, P::ChannelMap>> {
    if options.selector() != DEFAULT_SELECTOR {
        return Err(ProbeError::UnknownSelector(options.selector().to_string()));
    }

    let result = run_stages(probe, chmap, blueprint, options);
    if let Err(ProbeError::Cancelled) = &result {
        warn!(target: "neurocarto-probe", "Electrode selection cancelled, partial result discarded");
    }
    result
}

fn run_stages<P: ProbeDesp + ?Sized>(
    probe: &P,
    chmap: &P::ChannelMap,
    blueprint: Vec<ElectrodeOf<P>>,
    options: &SelectOptions,
) -> ProbeResult<Selection<P::Key, P::ChannelMap>> {
    let mut run = SelectionRun::new(probe, chmap, blueprint, options)?;
    run.forbid_categories();

    options.checkpoint()?;
    run.select_stage(Category::SET, None, StageOrder::Canonical)?;

    for tier in probe.density_tiers() {
        options.checkpoint()?;
        run.select_stage(tier.category, Some(tier.pattern), StageOrder::Coverage)?;
    }

    options.checkpoint()?;
    run.select_stage(Category::LOW, None, StageOrder::Coverage)?;

    debug!(
        target: "neurocarto-probe",
        "Selection done: {} of {} channels used",
        run.chmap.len(),
        run.chmap.n_channels()
    );

    Ok(Selection {
        channelmap: run.chmap,
        electrodes: run.electrodes,
    })
}

#[derive(Debug, Clone, Copy)]
enum StageOrder {
    Canonical,
    Coverage,
}

struct SelectionRun<'p, P: ProbeDesp + ?Sized> {
    probe: &'p P,
    chmap: P::ChannelMap,
    electrodes: Vec<ElectrodeOf<P>>,
    grid: ElectrodeGrid,
    selected: Vec<usize>,
    rng: Option<StdRng>,
}

impl<'p, P: ProbeDesp + ?Sized> SelectionRun<'p, P> {
    fn new(
        probe: &'p P,
        chmap: &P::ChannelMap,
        mut electrodes: Vec<ElectrodeOf<P>>,
        options: &SelectOptions,
    ) -> ProbeResult<Self> {
        electrodes.sort_by(|a, b| a.electrode.cmp(&b.electrode));
        electrodes.dedup_by(|a, b| a.electrode == b.electrode);
        for e in electrodes.iter_mut() {
            e.state = ElectrodeState::Unused;
        }

        let grid = ElectrodeGrid::new(&electrodes);

        Ok(Self {
            probe,
            chmap: probe.new_channelmap_like(chmap)?,
            electrodes,
            grid,
            selected: Vec::new(),
            rng: options.seed().map(StdRng::seed_from_u64),
        })
    }

    fn forbid_categories(&mut self) {
        for e in self.electrodes.iter_mut() {
            if e.category == Category::FORBIDDEN {
                e.state = ElectrodeState::Forbidden;
            }
        }
    }

    fn select_stage(
        &mut self,
        category: Category,
        pattern: Option<DensityPattern>,
        order: StageOrder,
    ) -> ProbeResult<()> {
        let mut candidates: Vec<usize> = self
            .electrodes
            .iter()
            .enumerate()
            .filter(|(_, e)| e.category == category && e.state == ElectrodeState::Unused)
            .map(|(i, _)| i)
            .collect();

        if let StageOrder::Coverage = order {
            match self.rng.as_mut() {
                Some(rng) => candidates.shuffle(rng),
                None => {
                    let electrodes = &self.electrodes;
                    candidates.sort_by(|&a, &b| coverage_order(electrodes, a, b));
                }
            }
        }

        let mut picked = 0usize;
        for i in candidates {
            if self.chmap.is_full() {
                debug!(target: "neurocarto-probe", "Channel budget exhausted during category {}", category);
                break;
            }

            if self.electrodes[i].state != ElectrodeState::Unused {
                continue;
            }

            if !self.compatible(i) {
                self.electrodes[i].state = ElectrodeState::Forbidden;
                continue;
            }

            match self
                .probe
                .add_electrode(&mut self.chmap, &mut self.electrodes[i], false)
            {
                Ok(()) => {}
                Err(ProbeError::Conflict(reason)) => {
                    trace!(target: "neurocarto-probe", "Skip {}: {}", self.electrodes[i], reason);
                    self.electrodes[i].state = ElectrodeState::Forbidden;
                    continue;
                }
                Err(err) => return Err(err),
            }

            self.selected.push(i);
            picked += 1;

            self.propagate(i);
            if let Some(pattern) = pattern {
                self.apply_pattern(i, category, pattern);
            }
        }

        debug!(target: "neurocarto-probe", "Category {}: picked {} electrodes", category, picked);
        Ok(())
    }

    /// Check `i` against every electrode selected so far
    fn compatible(&self, i: usize) -> bool {
        let candidate = &self.electrodes[i];
        self.selected
            .iter()
            .all(|&j| self.probe.probe_rule(&self.chmap, &self.electrodes[j], candidate))
    }

    /// Forbid every unused electrode the newly committed `i` rules out
    fn propagate(&mut self, i: usize) {
        let picked = self.electrodes[i].clone();
        for j in 0..self.electrodes.len() {
            if j == i {
                continue;
            }
            let forbid = {
                let e = &self.electrodes[j];
                e.state == ElectrodeState::Unused && !self.probe.probe_rule(&self.chmap, &picked, e)
            };
            if forbid {
                self.electrodes[j].state = ElectrodeState::Forbidden;
            }
        }
    }

    /// Forbid same-tier lattice neighbours so the tier keeps its density
    fn apply_pattern(&mut self, i: usize, category: Category, pattern: DensityPattern) {
        for &(dx, dy) in pattern.exclusion_offsets() {
            if let Some(j) = self.grid.offset(i, dx, dy) {
                let e = &mut self.electrodes[j];
                if e.category == category && e.state == ElectrodeState::Unused {
                    e.state = ElectrodeState::Forbidden;
                }
            }
        }
    }
}

fn coverage_order<K>(
    electrodes: &[crate::electrode::ElectrodeDesp<K>],
    a: usize,
    b: usize,
) -> Ordering {
    let ea = &electrodes[a];
    let eb = &electrodes[b];
    ea.y
        .total_cmp(&eb.y)
        .then(ea.s.cmp(&eb.s))
        .then(ea.x.total_cmp(&eb.x))
        .then(a.cmp(&b))
}
