// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Zone editing on top of [`BlueprintFunctions`].

A zone is a connected area of electrodes that share one category on one
shank, connectivity being taken on the lattice of [`ElectrodeGrid`]. Zone
operations are pure: they take a blueprint and return a modified copy.

[`ElectrodeGrid`]: crate::grid::ElectrodeGrid
*/

use std::collections::{BTreeMap, VecDeque};
use std::ops::Range;

use tracing::debug;

use crate::desp::ProbeDesp;
use crate::electrode::Category;
use crate::error::ProbeResult;

use super::functions::BlueprintFunctions;

const SIDES: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const SURROUNDING: [(i64, i64); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Connected same-category area of a blueprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Label as returned by [`BlueprintFunctions::find_clustering`], from 1
    pub label: usize,
    pub category: Category,
    pub shank: u32,
    /// Universe indices, ascending
    pub electrodes: Vec<usize>,
    /// Inclusive lattice bounding box `(x_min, x_max, y_min, y_max)`
    pub bounds: (i64, i64, i64, i64),
}

impl Zone {
    pub fn len(&self) -> usize {
        self.electrodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.electrodes.is_empty()
    }
}

impl<'p, P: ProbeDesp + ?Sized> BlueprintFunctions<'p, P> {
    /// Label the zones of `blueprint`.
    ///
    /// Only electrodes in `categories` take part (every category except
    /// `UNSET` by default). With `diagonal`, corner neighbours are connected
    /// too. Returns one label per electrode, `0` outside every zone; labels
    /// are numbered by the lowest universe index of their zone.
    pub fn find_clustering(
        &self,
        blueprint: &[Category],
        categories: Option<&[Category]>,
        diagonal: bool,
    ) -> ProbeResult<Vec<usize>> {
        self.check_length(blueprint.len())?;

        let member = |c: Category| match categories {
            Some(categories) => categories.contains(&c),
            None => !c.is_unset(),
        };
        let neighbours: &[(i64, i64)] = if diagonal { &SURROUNDING } else { &SIDES };
        let grid = self.grid();

        let mut labels = vec![0usize; blueprint.len()];
        let mut next = 0;
        let mut queue = VecDeque::new();

        for start in 0..blueprint.len() {
            if labels[start] != 0 || !member(blueprint[start]) {
                continue;
            }

            next += 1;
            labels[start] = next;
            queue.push_back(start);

            while let Some(i) = queue.pop_front() {
                for &(dx, dy) in neighbours {
                    if let Some(j) = grid.offset(i, dx, dy) {
                        if labels[j] == 0 && blueprint[j] == blueprint[start] {
                            labels[j] = next;
                            queue.push_back(j);
                        }
                    }
                }
            }
        }

        debug!(target: "neurocarto-probe", "Found {} blueprint zones", next);
        Ok(labels)
    }

    /// Zones of `blueprint` ordered by label, see [`find_clustering`](Self::find_clustering)
    pub fn clustering_zones(
        &self,
        blueprint: &[Category],
        categories: Option<&[Category]>,
        diagonal: bool,
    ) -> ProbeResult<Vec<Zone>> {
        let labels = self.find_clustering(blueprint, categories, diagonal)?;
        Ok(self.zones_of(blueprint, &labels))
    }

    /// Fill every zone of `categories` out to a rectangle.
    ///
    /// - `threshold`: zones smaller than this are left alone, or reset to
    ///   `UNSET` with `unset`.
    /// - `gap`: only fill vertical gaps of at most `gap` rows between
    ///   electrodes of the zone in the same column. `None` fills the whole
    ///   bounding box.
    ///
    /// Only `UNSET` electrodes are painted.
    pub fn fill(
        &self,
        blueprint: &[Category],
        categories: Option<&[Category]>,
        threshold: Option<usize>,
        gap: Option<i64>,
        unset: bool,
    ) -> ProbeResult<Vec<Category>> {
        let zones = self.clustering_zones(blueprint, categories, true)?;
        let grid = self.grid();
        let mut ret = blueprint.to_vec();

        for zone in &zones {
            if threshold.map_or(false, |t| zone.len() < t) {
                if unset {
                    for &i in &zone.electrodes {
                        ret[i] = Category::UNSET;
                    }
                }
                continue;
            }

            let mut paint = |x: i64, y: i64| {
                if let Some(j) = grid.lookup((zone.shank, x, y)) {
                    if ret[j].is_unset() {
                        ret[j] = zone.category;
                    }
                }
            };

            let (x0, x1, y0, y1) = zone.bounds;
            match gap {
                None => {
                    for x in x0..=x1 {
                        for y in y0..=y1 {
                            paint(x, y);
                        }
                    }
                }
                Some(gap) => {
                    let mut columns: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
                    for &i in &zone.electrodes {
                        let (_, x, y) = grid.position(i);
                        columns.entry(x).or_default().push(y);
                    }
                    for (x, mut rows) in columns {
                        rows.sort_unstable();
                        for w in rows.windows(2) {
                            if w[1] - w[0] - 1 <= gap {
                                for y in w[0] + 1..w[1] {
                                    paint(x, y);
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(ret)
    }

    /// Grow every zone of `category` by `step = (x, y)` lattice steps.
    ///
    /// Grown electrodes get `value` (`category` by default). Only zones whose
    /// size lies in `size` are grown. Without `bi`, zones only grow towards
    /// positive x/y. Without `overwrite`, only `UNSET` electrodes change.
    #[allow(clippy::too_many_arguments)]
    pub fn extend(
        &self,
        blueprint: &[Category],
        category: Category,
        step: (i64, i64),
        value: Option<Category>,
        size: Option<Range<usize>>,
        bi: bool,
        overwrite: bool,
    ) -> ProbeResult<Vec<Category>> {
        let zones = self.clustering_zones(blueprint, Some(&[category]), true)?;
        let value = value.unwrap_or(category);
        let offsets = step_offsets(step, bi);
        let grid = self.grid();
        let mut ret = blueprint.to_vec();

        for zone in zones.iter().filter(|z| in_size(z, &size)) {
            for &i in &zone.electrodes {
                for &(dx, dy) in &offsets {
                    if let Some(j) = grid.offset(i, dx, dy) {
                        if blueprint[j] != category && (overwrite || blueprint[j].is_unset()) {
                            ret[j] = value;
                        }
                    }
                }
            }
        }

        Ok(ret)
    }

    /// Shrink every zone of `category` by `step = (x, y)` lattice steps.
    ///
    /// An electrode stays in its zone only when every electrode within `step`
    /// also belongs to the zone; the probe border counts as outside. Without
    /// `bi`, zones only shrink from their positive x/y side. Removed electrodes
    /// become `UNSET`.
    pub fn reduce(
        &self,
        blueprint: &[Category],
        category: Category,
        step: (i64, i64),
        size: Option<Range<usize>>,
        bi: bool,
    ) -> ProbeResult<Vec<Category>> {
        let labels = self.find_clustering(blueprint, Some(&[category]), true)?;
        let zones = self.zones_of(blueprint, &labels);
        let offsets = step_offsets(step, bi);
        let grid = self.grid();
        let mut ret = blueprint.to_vec();

        for zone in zones.iter().filter(|z| in_size(z, &size)) {
            for &i in &zone.electrodes {
                let inner = offsets.iter().all(|&(dx, dy)| {
                    grid.offset(i, dx, dy)
                        .map_or(false, |j| labels[j] == zone.label)
                });
                if !inner {
                    ret[i] = Category::UNSET;
                }
            }
        }

        Ok(ret)
    }

    /// Replace NaN values by the mean of the finite values within
    /// `kernel = (x, y)` lattice steps on the same shank. Values without any
    /// finite neighbour stay NaN.
    pub fn interpolate_nan(&self, values: &[f64], kernel: (i64, i64)) -> ProbeResult<Vec<f64>> {
        self.check_length(values.len())?;
        let grid = self.grid();
        let (kx, ky) = (kernel.0.abs(), kernel.1.abs());

        Ok(values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                if !v.is_nan() {
                    return v;
                }
                let mut sum = 0.0;
                let mut n = 0usize;
                for dx in -kx..=kx {
                    for dy in -ky..=ky {
                        if let Some(j) = grid.offset(i, dx, dy) {
                            if values[j].is_finite() {
                                sum += values[j];
                                n += 1;
                            }
                        }
                    }
                }
                if n == 0 {
                    f64::NAN
                } else {
                    sum / n as f64
                }
            })
            .collect())
    }

    fn zones_of(&self, blueprint: &[Category], labels: &[usize]) -> Vec<Zone> {
        let grid = self.grid();
        let mut zones: Vec<Zone> = Vec::new();

        // the first electrode of label k comes after the first one of label k - 1
        for (i, &label) in labels.iter().enumerate() {
            if label == 0 {
                continue;
            }
            let (s, x, y) = grid.position(i);
            if label > zones.len() {
                zones.push(Zone {
                    label,
                    category: blueprint[i],
                    shank: s,
                    electrodes: vec![i],
                    bounds: (x, x, y, y),
                });
            } else {
                let zone = &mut zones[label - 1];
                zone.electrodes.push(i);
                let (x0, x1, y0, y1) = zone.bounds;
                zone.bounds = (x0.min(x), x1.max(x), y0.min(y), y1.max(y));
            }
        }
        zones
    }
}

fn in_size(zone: &Zone, size: &Option<Range<usize>>) -> bool {
    size.as_ref().map_or(true, |r| r.contains(&zone.len()))
}

/// Lattice offsets covered by a step, origin excluded
fn step_offsets(step: (i64, i64), bi: bool) -> Vec<(i64, i64)> {
    let (sx, sy) = (step.0.abs(), step.1.abs());
    let (lx, ly) = if bi { (-sx, -sy) } else { (0, 0) };

    let mut ret = Vec::new();
    for dx in lx..=sx {
        for dy in ly..=sy {
            if (dx, dy) != (0, 0) {
                ret.push((dx, dy));
            }
        }
    }
    ret
}
