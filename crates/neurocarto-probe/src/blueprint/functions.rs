// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Blueprint toolkit.

[`BlueprintFunctions`] binds a probe descriptor to one channel map and keeps
the probe type's electrode universe, a lattice index over it and a working
blueprint (`Vec<Category>` aligned with the universe). Blueprint arrays passed
to its methods must have the universe's length; pure operations return new
arrays and never touch the working blueprint.
*/

use std::path::{Path, PathBuf};

use ahash::AHashMap;
use tracing::debug;

use crate::desp::{BlueprintSource, ElectrodeOf, ProbeDesp, Universe};
use crate::electrode::{Category, ElectrodeState};
use crate::error::{ProbeError, ProbeResult};
use crate::grid::ElectrodeGrid;
use crate::select::SelectOptions;

use super::codec::resolve_universe;
use super::npy;

/// Electrodes addressed by a blueprint operation
#[derive(Debug, Clone, Copy)]
pub enum Region<'a> {
    /// One universe index
    Index(usize),
    /// Universe indices
    Indices(&'a [usize]),
    /// Boolean mask aligned with the universe
    Mask(&'a [bool]),
    /// Every electrode whose category is one of these, looked up in the
    /// blueprint argument of the operation, or in the working blueprint for
    /// operations without one
    Categories(&'a [Category]),
}

/// Blueprint editing functions bound to a probe and a channel map
pub struct BlueprintFunctions<'p, P: ProbeDesp + ?Sized> {
    probe: &'p P,
    channelmap: P::ChannelMap,
    electrodes: Vec<ElectrodeOf<P>>,
    grid: ElectrodeGrid,
    blueprint: Vec<Category>,
    changed: bool,
    suffix: String,
}

impl<'p, P: ProbeDesp + ?Sized> Clone for BlueprintFunctions<'p, P> {
    fn clone(&self) -> Self {
        Self {
            probe: self.probe,
            channelmap: self.channelmap.clone(),
            electrodes: self.electrodes.clone(),
            grid: self.grid.clone(),
            blueprint: self.blueprint.clone(),
            changed: self.changed,
            suffix: self.suffix.clone(),
        }
    }
}

impl<'p, P: ProbeDesp + ?Sized> BlueprintFunctions<'p, P> {
    /// Bind to an existing channel map
    pub fn new(probe: &'p P, channelmap: P::ChannelMap) -> ProbeResult<Self> {
        let electrodes = resolve_universe(probe, Universe::ChannelMap(&channelmap))?;
        let grid = ElectrodeGrid::new(&electrodes);
        let blueprint = electrodes.iter().map(|e| e.category).collect();

        Ok(Self {
            probe,
            channelmap,
            electrodes,
            grid,
            blueprint,
            changed: false,
            suffix: npy::BLUEPRINT_SUFFIX.to_string(),
        })
    }

    /// Bind to a new empty channel map of the given probe type
    pub fn for_type(probe: &'p P, code: u32) -> ProbeResult<Self> {
        let channelmap = probe.new_channelmap(code)?;
        Self::new(probe, channelmap)
    }

    /// Use `suffix` instead of `.blueprint.npy` for blueprint files
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Blueprint file suffix
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn probe(&self) -> &'p P {
        self.probe
    }

    pub fn channelmap(&self) -> &P::ChannelMap {
        &self.channelmap
    }

    /// Universe electrodes in canonical order
    pub fn electrodes(&self) -> &[ElectrodeOf<P>] {
        &self.electrodes
    }

    pub fn grid(&self) -> &ElectrodeGrid {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.electrodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.electrodes.is_empty()
    }

    // ==================== //
    // channel map functions //
    // ==================== //

    /// Add universe electrodes to the bound channel map
    pub fn add_electrodes(&mut self, region: Region<'_>, overwrite: bool) -> ProbeResult<()> {
        for i in self.region_indices(region)? {
            let mut e = self.electrodes[i].clone();
            self.probe.add_electrode(&mut self.channelmap, &mut e, overwrite)?;
        }
        Ok(())
    }

    /// Remove universe electrodes from the bound channel map
    pub fn del_electrodes(&mut self, region: Region<'_>) -> ProbeResult<()> {
        for i in self.region_indices(region)? {
            let mut e = self.electrodes[i].clone();
            self.probe.del_electrode(&mut self.channelmap, &mut e);
        }
        Ok(())
    }

    /// Universe indices of the electrodes selected in `chmap` (the bound map by default)
    pub fn selected_electrodes(&self, chmap: Option<&P::ChannelMap>) -> Vec<usize> {
        let chmap = chmap.unwrap_or(&self.channelmap);
        self.index_blueprint(&self.probe.all_channels(chmap, None))
    }

    /// Replace the bound channel map's selection with the selection of `chmap`
    pub fn set_channelmap(&mut self, chmap: &P::ChannelMap) -> ProbeResult<()> {
        let selected = self.probe.all_channels(chmap, None);
        self.probe.clear_electrode(&mut self.channelmap);
        for mut e in selected {
            self.probe.add_electrode(&mut self.channelmap, &mut e, true)?;
        }
        Ok(())
    }

    /// Run the probe's selector on the working blueprint
    pub fn select_electrodes(&self, options: &SelectOptions) -> ProbeResult<P::ChannelMap> {
        let blueprint = self.apply_blueprint(self.electrodes.clone(), &self.blueprint);
        self.probe
            .select_electrodes(&self.channelmap, blueprint, options)
    }

    // =================== //
    // blueprint functions //
    // =================== //

    /// Copy of the working blueprint
    pub fn blueprint(&self) -> Vec<Category> {
        self.blueprint.clone()
    }

    /// All-`UNSET` blueprint
    pub fn new_blueprint(&self) -> Vec<Category> {
        vec![Category::UNSET; self.electrodes.len()]
    }

    /// Whether the working blueprint was replaced since construction
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Replace the working blueprint.
    ///
    /// # Errors
    /// `ProbeError::Format` on a length mismatch.
    pub fn set_blueprint(&mut self, blueprint: Vec<Category>) -> ProbeResult<()> {
        self.check_length(blueprint.len())?;
        self.blueprint = blueprint;
        self.changed = true;
        Ok(())
    }

    /// Reset every electrode of the working blueprint to `category`
    pub fn fill_blueprint(&mut self, category: Category) {
        self.blueprint.iter_mut().for_each(|c| *c = category);
        self.changed = true;
    }

    /// Replace the working blueprint with the categories of an electrode list
    pub fn set_blueprint_electrodes(&mut self, electrodes: &[ElectrodeOf<P>]) {
        self.blueprint = self.from_blueprint(electrodes);
        self.changed = true;
    }

    /// Blueprint of an electrode list. Universe electrodes missing from the
    /// list are `UNSET`.
    pub fn from_blueprint(&self, electrodes: &[ElectrodeOf<P>]) -> Vec<Category> {
        let categories: AHashMap<&P::Key, Category> = electrodes
            .iter()
            .map(|e| (&e.electrode, e.category))
            .collect();

        self.electrodes
            .iter()
            .map(|e| {
                categories
                    .get(&e.electrode)
                    .copied()
                    .unwrap_or(Category::UNSET)
            })
            .collect()
    }

    /// Copy `blueprint` onto `electrodes` and derive their states from the
    /// bound channel map: selected electrodes become `Used`, electrodes they
    /// invalidate become `Forbidden`, the rest `Unused`.
    pub fn apply_blueprint(
        &self,
        mut electrodes: Vec<ElectrodeOf<P>>,
        blueprint: &[Category],
    ) -> Vec<ElectrodeOf<P>> {
        for e in electrodes.iter_mut() {
            e.state = ElectrodeState::Unused;
        }

        let used = self.probe.all_channels(&self.channelmap, None);
        for u in &used {
            for t in electrodes.iter_mut() {
                if t.electrode != u.electrode && !self.probe.probe_rule(&self.channelmap, u, t) {
                    t.state = ElectrodeState::Forbidden;
                }
            }
        }

        let index: AHashMap<&P::Key, usize> = self
            .electrodes
            .iter()
            .enumerate()
            .map(|(i, e)| (&e.electrode, i))
            .collect();

        for t in electrodes.iter_mut() {
            if used.iter().any(|u| u.electrode == t.electrode) {
                t.state = ElectrodeState::Used;
            }
            if let Some(category) = index.get(&t.electrode).and_then(|&i| blueprint.get(i)) {
                t.category = *category;
            }
        }

        electrodes
    }

    /// Sorted, deduplicated universe indices of an electrode list, matched
    /// by lattice position
    pub fn index_blueprint(&self, electrodes: &[ElectrodeOf<P>]) -> Vec<usize> {
        let mut ret: Vec<usize> = electrodes
            .iter()
            .filter_map(|e| self.grid.lookup_position(e.s, e.x, e.y))
            .collect();
        ret.sort_unstable();
        ret.dedup();
        ret
    }

    /// Load the working blueprint from `<file><suffix>`
    pub fn load_blueprint(&mut self, file: &Path) -> ProbeResult<&[Category]> {
        let path = npy::blueprint_path_with_suffix(file, &self.suffix);
        let electrodes = self.probe.load_blueprint(
            BlueprintSource::File(&path),
            Universe::Electrodes(&self.electrodes),
        )?;
        self.set_blueprint_electrodes(&electrodes);
        Ok(&self.blueprint)
    }

    /// Save `blueprint` (the working blueprint by default) to
    /// `<file><suffix>` and return the path written
    pub fn save_blueprint(
        &self,
        file: &Path,
        blueprint: Option<&[Category]>,
    ) -> ProbeResult<PathBuf> {
        let blueprint = blueprint.unwrap_or(&self.blueprint);
        self.check_length(blueprint.len())?;

        let mut electrodes = self.electrodes.clone();
        for (e, c) in electrodes.iter_mut().zip(blueprint) {
            e.category = *c;
        }

        let path = npy::blueprint_path_with_suffix(file, &self.suffix);
        npy::write_blueprint(&path, &self.probe.save_blueprint(&electrodes))?;
        Ok(path)
    }

    /// Copy of `blueprint` with `region` set to `category`
    pub fn set(
        &self,
        blueprint: &[Category],
        region: Region<'_>,
        category: Category,
    ) -> ProbeResult<Vec<Category>> {
        self.check_length(blueprint.len())?;
        let mask = self.region_mask(blueprint, region)?;
        Ok(blueprint
            .iter()
            .zip(mask)
            .map(|(&c, m)| if m { category } else { c })
            .collect())
    }

    /// Copy of `blueprint` with `region` reset to `UNSET`
    pub fn unset(&self, blueprint: &[Category], region: Region<'_>) -> ProbeResult<Vec<Category>> {
        self.set(blueprint, region, Category::UNSET)
    }

    /// Paint `category` onto the working blueprint, only where it is still `UNSET`
    pub fn paint(&mut self, region: Region<'_>, category: Category) -> ProbeResult<()> {
        let painted = self.set(&self.blueprint, region, category)?;
        let merged = self.merge(&self.blueprint, &painted)?;
        self.set_blueprint(merged)
    }

    /// Reset `region` of the working blueprint to `UNSET`
    pub fn erase(&mut self, region: Region<'_>) -> ProbeResult<()> {
        let erased = self.unset(&self.blueprint, region)?;
        self.set_blueprint(erased)
    }

    /// Merge two blueprints. `former` wins wherever it is not `UNSET`.
    pub fn merge(&self, former: &[Category], latter: &[Category]) -> ProbeResult<Vec<Category>> {
        self.check_length(former.len())?;
        self.check_length(latter.len())?;
        Ok(former
            .iter()
            .zip(latter)
            .map(|(&a, &b)| if a.is_unset() { b } else { a })
            .collect())
    }

    /// Merge `other` under the working blueprint and keep the result
    pub fn merge_into(&mut self, other: &[Category]) -> ProbeResult<&[Category]> {
        let merged = self.merge(&self.blueprint, other)?;
        self.set_blueprint(merged)?;
        Ok(&self.blueprint)
    }

    /// Electrodes whose category is one of `categories`. Without categories,
    /// every electrode that is neither `UNSET` nor `FORBIDDEN`.
    pub fn mask(&self, blueprint: &[Category], categories: Option<&[Category]>) -> Vec<bool> {
        match categories {
            Some(categories) => blueprint.iter().map(|c| categories.contains(c)).collect(),
            None => blueprint
                .iter()
                .map(|&c| c != Category::UNSET && c != Category::FORBIDDEN)
                .collect(),
        }
    }

    /// Number of electrodes in `categories`, optionally restricted to `mask`
    pub fn count_categories(
        &self,
        blueprint: &[Category],
        categories: &[Category],
        mask: Option<&[bool]>,
    ) -> usize {
        blueprint
            .iter()
            .enumerate()
            .filter(|&(i, c)| {
                categories.contains(c) && mask.map_or(true, |m| m.get(i).copied().unwrap_or(false))
            })
            .count()
    }

    /// Electrodes the probe rule rules out if the electrodes of `categories`
    /// (restricted to `region`) were selected.
    ///
    /// With `overwrite`, the source electrodes themselves may be reported too.
    pub fn invalid(
        &self,
        blueprint: &[Category],
        region: Option<Region<'_>>,
        categories: Option<&[Category]>,
        overwrite: bool,
    ) -> ProbeResult<Vec<bool>> {
        self.check_length(blueprint.len())?;

        let mut sources = self.mask(blueprint, categories);
        if let Some(region) = region {
            let restrict = self.region_mask(blueprint, region)?;
            for (s, r) in sources.iter_mut().zip(restrict) {
                *s = *s && r;
            }
        }

        let mut ret = vec![false; blueprint.len()];
        for (i, _) in sources.iter().enumerate().filter(|(_, s)| **s) {
            let e1 = &self.electrodes[i];
            for (j, e2) in self.electrodes.iter().enumerate() {
                if i != j && !ret[j] && !self.probe.probe_rule(&self.channelmap, e1, e2) {
                    ret[j] = true;
                }
            }
        }

        if !overwrite {
            for (r, s) in ret.iter_mut().zip(&sources) {
                *r = *r && !s;
            }
        }

        debug!(
            target: "neurocarto-probe",
            "{} electrodes invalidated by {} sources",
            ret.iter().filter(|r| **r).count(),
            sources.iter().filter(|s| **s).count()
        );
        Ok(ret)
    }

    /// Copy of `blueprint` with every [`invalid`](Self::invalid) electrode set to `value`
    pub fn invalid_set(
        &self,
        blueprint: &[Category],
        region: Option<Region<'_>>,
        categories: Option<&[Category]>,
        value: Category,
        overwrite: bool,
    ) -> ProbeResult<Vec<Category>> {
        let invalid = self.invalid(blueprint, region, categories, overwrite)?;
        Ok(blueprint
            .iter()
            .zip(invalid)
            .map(|(&c, m)| if m { value } else { c })
            .collect())
    }

    /// Shift per-electrode values by `(tx, ty)` lattice steps on each shank.
    ///
    /// Only electrodes inside `mask` move (all by default). Their old places
    /// are reset to `init`; values moved off the shank are dropped.
    pub fn move_i<T: Clone>(
        &self,
        values: &[T],
        tx: i64,
        ty: i64,
        mask: Option<&[bool]>,
        init: T,
    ) -> ProbeResult<Vec<T>> {
        self.check_length(values.len())?;
        let moving = |i: usize| mask.map_or(true, |m| m.get(i).copied().unwrap_or(false));

        let mut ret = values.to_vec();
        for (i, v) in ret.iter_mut().enumerate() {
            if moving(i) {
                *v = init.clone();
            }
        }
        for (i, v) in values.iter().enumerate() {
            if !moving(i) {
                continue;
            }
            if let Some(j) = self.grid.offset(i, tx, ty) {
                ret[j] = v.clone();
            }
        }
        Ok(ret)
    }

    /// [`move_i`](Self::move_i) with a shift given in um, rounded to lattice steps
    pub fn move_um<T: Clone>(
        &self,
        values: &[T],
        tx: f64,
        ty: f64,
        mask: Option<&[bool]>,
        init: T,
    ) -> ProbeResult<Vec<T>> {
        let tx = (tx / self.grid.dx()).round() as i64;
        let ty = (ty / self.grid.dy()).round() as i64;
        self.move_i(values, tx, ty, mask, init)
    }

    pub(super) fn check_length(&self, len: usize) -> ProbeResult<()> {
        if len != self.electrodes.len() {
            return Err(ProbeError::length_mismatch(self.electrodes.len(), len));
        }
        Ok(())
    }

    /// Resolve `region` to a universe mask. `Region::Categories` is matched
    /// against `blueprint`.
    fn region_mask(&self, blueprint: &[Category], region: Region<'_>) -> ProbeResult<Vec<bool>> {
        let n = self.electrodes.len();
        let check = |i: usize| {
            if i < n {
                Ok(i)
            } else {
                Err(ProbeError::Format(format!(
                    "electrode index {} out of range for {} electrodes",
                    i, n
                )))
            }
        };

        match region {
            Region::Categories(categories) => {
                self.check_length(blueprint.len())?;
                Ok(self.mask(blueprint, Some(categories)))
            }
            Region::Mask(mask) => {
                self.check_length(mask.len())?;
                Ok(mask.to_vec())
            }
            Region::Index(i) => {
                let mut ret = vec![false; n];
                ret[check(i)?] = true;
                Ok(ret)
            }
            Region::Indices(indices) => {
                let mut ret = vec![false; n];
                for &i in indices {
                    ret[check(i)?] = true;
                }
                Ok(ret)
            }
        }
    }

    /// Universe indices of `region`, resolved against the working blueprint
    fn region_indices(&self, region: Region<'_>) -> ProbeResult<Vec<usize>> {
        Ok(self
            .region_mask(&self.blueprint, region)?
            .into_iter()
            .enumerate()
            .filter(|(_, m)| *m)
            .map(|(i, _)| i)
            .collect())
    }
}
