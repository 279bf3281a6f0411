// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Density tiers.

A density tier is a family-specific category (full, half, quarter, ...) that
asks for electrodes at a given spatial density. After an electrode is picked
in a tier, its pattern forbids lattice neighbours on the same shank so the
remaining picks land at the requested density.
*/

use serde::{Deserialize, Serialize};

use crate::electrode::Category;

/// Spatial pattern of a density tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DensityPattern {
    /// Every electrode
    Full,
    /// Checkerboard
    Half,
    /// One electrode per 2x2 block, staggered between columns
    Quarter,
}

const HALF_OFFSETS: &[(i64, i64)] = &[(-1, 0), (1, 0), (0, -1), (0, 1)];

const QUARTER_OFFSETS: &[(i64, i64)] = &[
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (0, -2),
    (0, 2),
];

impl DensityPattern {
    /// Fraction of the area's electrodes this pattern requests
    pub fn weight(self) -> f64 {
        match self {
            DensityPattern::Full => 1.0,
            DensityPattern::Half => 0.5,
            DensityPattern::Quarter => 0.25,
        }
    }

    /// Lattice offsets `(dx, dy)` forbidden around a picked electrode
    pub fn exclusion_offsets(self) -> &'static [(i64, i64)] {
        match self {
            DensityPattern::Full => &[],
            DensityPattern::Half => HALF_OFFSETS,
            DensityPattern::Quarter => QUARTER_OFFSETS,
        }
    }
}

/// A density-tier category declared by a probe family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityTier {
    pub category: Category,
    pub pattern: DensityPattern,
}

impl DensityTier {
    pub const fn new(category: Category, pattern: DensityPattern) -> Self {
        Self { category, pattern }
    }

    pub fn weight(&self) -> f64 {
        self.pattern.weight()
    }
}
