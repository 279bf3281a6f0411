// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Blueprint codec.

A blueprint is the compact form of an electrode list: one category code per
electrode of the probe type's universe, in canonical (ascending identity)
order. Saving sorts by identity, so the array does not depend on the order of
the input list. Loading always starts from a fresh copy of the universe;
states are reset to `Unused` and are never part of a blueprint.
*/

use crate::desp::{BlueprintSource, ElectrodeOf, ProbeDesp, Universe};
use crate::electrode::{Category, ElectrodeDesp, ElectrodeState};
use crate::error::{ProbeError, ProbeResult};

use super::npy;

/// Category codes of `electrodes` in canonical order.
///
/// Duplicate identities keep the first occurrence.
pub fn save_blueprint<K: Ord>(electrodes: &[ElectrodeDesp<K>]) -> Vec<i32> {
    let mut order: Vec<&ElectrodeDesp<K>> = electrodes.iter().collect();
    order.sort_by(|a, b| a.electrode.cmp(&b.electrode));
    order.dedup_by(|a, b| a.electrode == b.electrode);
    order.into_iter().map(|e| e.category.code()).collect()
}

/// Universe electrodes carrying the categories of `source`.
///
/// # Errors
/// - `ProbeError::Io` when a blueprint file cannot be read
/// - `ProbeError::Format` when the file is not a blueprint or its length does
///   not match the universe
/// - `ProbeError::UnknownProbeType` when the universe is given by an
///   unsupported type code
pub fn load_blueprint<P: ProbeDesp + ?Sized>(
    probe: &P,
    source: BlueprintSource<'_>,
    universe: Universe<'_, P::ChannelMap, P::Key>,
) -> ProbeResult<Vec<ElectrodeOf<P>>> {
    let mut electrodes = resolve_universe(probe, universe)?;

    let file_codes;
    let codes: &[i32] = match source {
        BlueprintSource::Array(codes) => codes,
        BlueprintSource::File(path) => {
            file_codes = npy::read_blueprint(path)?;
            &file_codes
        }
    };

    if codes.len() != electrodes.len() {
        return Err(ProbeError::length_mismatch(electrodes.len(), codes.len()));
    }

    for (e, &code) in electrodes.iter_mut().zip(codes) {
        e.state = ElectrodeState::Unused;
        e.category = Category(code);
    }
    Ok(electrodes)
}

/// Fresh copy of the universe, in canonical order
pub fn resolve_universe<P: ProbeDesp + ?Sized>(
    probe: &P,
    universe: Universe<'_, P::ChannelMap, P::Key>,
) -> ProbeResult<Vec<ElectrodeOf<P>>> {
    let mut electrodes = match universe {
        Universe::Code(code) => probe.all_electrodes(code)?,
        Universe::ChannelMap(chmap) => probe.all_electrodes_like(chmap)?,
        Universe::Electrodes(list) => list.to_vec(),
    };
    electrodes.sort_by(|a, b| a.electrode.cmp(&b.electrode));
    electrodes.dedup_by(|a, b| a.electrode == b.electrode);
    Ok(electrodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_is_order_independent() {
        let a = ElectrodeDesp::new(2u32, 0, 0.0, 20.0, 2).with_category(Category::LOW);
        let b = ElectrodeDesp::new(0u32, 0, 0.0, 0.0, 0).with_category(Category::SET);
        let c = ElectrodeDesp::new(1u32, 0, 32.0, 0.0, 1);

        let forward = save_blueprint(&[a.clone(), b.clone(), c.clone()]);
        let reverse = save_blueprint(&[c, b, a]);
        assert_eq!(forward, vec![1, 0, 3]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_save_empty() {
        let empty: Vec<ElectrodeDesp<u32>> = Vec::new();
        assert!(save_blueprint(&empty).is_empty());
    }
}
