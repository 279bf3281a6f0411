// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Position grid over an electrode universe.

Electrode positions are snapped onto an integer lattice `(shank, x / dx, y / dy)`
where `dx`/`dy` are the smallest spacing between distinct x/y values in the
universe. The lattice lets density patterns and blueprint moves talk about
"the neighbour one column to the left" without knowing the probe geometry.
*/

use ahash::AHashMap;

use crate::electrode::ElectrodeDesp;

/// Lattice coordinate `(shank, column step, row step)`
pub type GridPos = (u32, i64, i64);

/// Lattice index over an electrode universe
#[derive(Debug, Clone)]
pub struct ElectrodeGrid {
    dx: f64,
    dy: f64,
    positions: Vec<GridPos>,
    index: AHashMap<GridPos, usize>,
}

impl ElectrodeGrid {
    /// Build the lattice for `electrodes`; position `i` of the grid refers to
    /// `electrodes[i]`.
    ///
    /// A universe with a single distinct x (or y) value gets a unit spacing on
    /// that axis.
    pub fn new<K>(electrodes: &[ElectrodeDesp<K>]) -> Self {
        let dx = min_spacing(electrodes.iter().map(|e| e.x));
        let dy = min_spacing(electrodes.iter().map(|e| e.y));

        let positions: Vec<GridPos> = electrodes
            .iter()
            .map(|e| (e.s, (e.x / dx).round() as i64, (e.y / dy).round() as i64))
            .collect();

        let mut index = AHashMap::with_capacity(positions.len());
        for (i, p) in positions.iter().enumerate() {
            index.entry(*p).or_insert(i);
        }

        Self {
            dx,
            dy,
            positions,
            index,
        }
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Lattice position of electrode `i`
    pub fn position(&self, i: usize) -> GridPos {
        self.positions[i]
    }

    /// Universe index at a lattice position
    pub fn lookup(&self, pos: GridPos) -> Option<usize> {
        self.index.get(&pos).copied()
    }

    /// Universe index of the electrode at `(x, y)` um on shank `s`
    pub fn lookup_position(&self, s: u32, x: f64, y: f64) -> Option<usize> {
        self.lookup((s, (x / self.dx).round() as i64, (y / self.dy).round() as i64))
    }

    /// Universe index of the electrode `(tx, ty)` lattice steps away from `i`,
    /// staying on the same shank
    pub fn offset(&self, i: usize, tx: i64, ty: i64) -> Option<usize> {
        let (s, x, y) = self.positions[i];
        self.lookup((s, x + tx, y + ty))
    }
}

fn min_spacing(values: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();

    let spacing = values
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .fold(f64::INFINITY, f64::min);

    if spacing.is_finite() {
        spacing
    } else {
        1.0
    }
}
