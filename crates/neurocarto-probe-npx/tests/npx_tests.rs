// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuropixels family integration tests

use neurocarto_probe::{
    evaluate, BlueprintFunctions, Category, ChannelMap, ElectrodeState, ProbeDesp, ProbeError,
    Region, SelectOptions,
};
use neurocarto_probe_npx::{
    electrode_density, NpxChannelMap, NpxElectrode, NpxElectrodeDesp, NpxProbeDesp, CATE_FULL,
    CATE_HALF, CATE_QUARTER, NP1, NP24,
};
use tempfile::TempDir;

fn painted(
    probe: &NpxProbeDesp,
    code: u32,
    paint: impl Fn(&NpxElectrode) -> Option<Category>,
) -> Vec<NpxElectrodeDesp> {
    let mut electrodes = probe.all_electrodes(code).unwrap();
    for e in electrodes.iter_mut() {
        if let Some(c) = paint(&e.electrode) {
            e.category = c;
        }
    }
    electrodes
}

// ============================================================================
// IMRO files
// ============================================================================

#[test]
fn test_imro_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Run1.imro");

    let probe = NpxProbeDesp::new();
    let mut chmap = probe.new_channelmap(24).unwrap();
    chmap.settings_mut().reference = 1;
    for (shank, n) in [(0, 0), (1, 10), (2, 500), (3, 1279)] {
        chmap
            .add(NpxElectrode::from_number(&NP24, shank, n), false)
            .unwrap();
    }

    probe.save_to_file(&chmap, &path).unwrap();
    let loaded = probe.load_from_file(&path).unwrap();

    assert_eq!(loaded.probe_code(), 24);
    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded.settings().reference, 1);
    let a: Vec<_> = chmap.electrodes().collect();
    let b: Vec<_> = loaded.electrodes().collect();
    assert_eq!(a, b);
}

#[test]
fn test_imro_file_errors() {
    let dir = TempDir::new().unwrap();
    let probe = NpxProbeDesp::new();

    let missing = dir.path().join("missing.imro");
    assert!(matches!(
        probe.load_from_file(&missing),
        Err(ProbeError::Io { .. })
    ));

    let garbage = dir.path().join("garbage.imro");
    std::fs::write(&garbage, "not an imro table").unwrap();
    assert!(probe.load_from_file(&garbage).unwrap_err().is_format_error());
}

#[test]
fn test_unknown_probe_type() {
    let probe = NpxProbeDesp::new();
    assert!(matches!(
        probe.new_channelmap(1),
        Err(ProbeError::UnknownProbeType(1))
    ));
    assert!(probe.all_electrodes(1).is_err());
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_select_set_area_on_np1() {
    let probe = NpxProbeDesp::new();
    let chmap = probe.new_channelmap(0).unwrap();
    // rows 0..200 hold electrodes 0..400, wrapping 16 channels
    let blueprint = painted(&probe, 0, |e| (e.row < 200).then_some(Category::SET));

    let result = probe
        .select_electrodes(&chmap, blueprint.clone(), &SelectOptions::new())
        .unwrap();

    assert!(chmap.is_empty());
    assert_eq!(result.len(), 384);
    assert!(result.is_full());
    assert!(probe.is_valid(&result));
    assert!(result.electrodes().all(|e| e.row < 200));

    let report = evaluate(&probe, &result, &blueprint);
    assert_eq!(report.requested, 400.0);
    assert_eq!(report.selected, 384.0);
    assert!((report.area_efficiency - 0.96).abs() < 1e-9);
}

#[test]
fn test_full_tier_spreads_over_shanks() {
    let probe = NpxProbeDesp::new();
    let chmap = probe.new_channelmap(24).unwrap();
    let blueprint = painted(&probe, 24, |_| Some(CATE_FULL));

    let result = probe
        .select_electrodes(&chmap, blueprint, &SelectOptions::new())
        .unwrap();

    assert_eq!(result.len(), 384);
    assert!(probe.is_valid(&result));
    for shank in 0..4 {
        let rows: Vec<u32> = result
            .electrodes()
            .filter(|e| e.shank == shank)
            .map(|e| e.row)
            .collect();
        assert_eq!(rows.len(), 96);
        assert_eq!(rows.iter().max(), Some(&47));
    }
}

#[test]
fn test_half_tier_checkerboard() {
    let probe = NpxProbeDesp::new();
    let chmap = probe.new_channelmap(0).unwrap();
    let blueprint = painted(&probe, 0, |e| (e.row < 10).then_some(CATE_HALF));

    let result = probe
        .select_electrodes(&chmap, blueprint.clone(), &SelectOptions::new())
        .unwrap();

    assert_eq!(result.len(), 10);
    assert!(result.electrodes().all(|e| (e.row + e.column) % 2 == 0));

    let report = evaluate(&probe, &result, &blueprint);
    assert_eq!(report.requested, 10.0);
    assert_eq!(report.channel_efficiency, 1.0);
}

#[test]
fn test_quarter_tier_alternating_rows() {
    let probe = NpxProbeDesp::new();
    let chmap = probe.new_channelmap(0).unwrap();
    let blueprint = painted(&probe, 0, |e| (e.row < 100).then_some(CATE_QUARTER));

    let result = probe
        .select_electrodes(&chmap, blueprint.clone(), &SelectOptions::new())
        .unwrap();

    assert_eq!(result.len(), 50);
    let mut used: Vec<(u32, u32)> = result.electrodes().map(|e| (e.row, e.column)).collect();
    used.sort_unstable();
    let expected: Vec<(u32, u32)> = (0..50).map(|i| (2 * i, i % 2)).collect();
    assert_eq!(used, expected);

    let report = evaluate(&probe, &result, &blueprint);
    assert_eq!(report.requested, 50.0);
    assert_eq!(report.channel_efficiency, 1.0);
}

#[test]
fn test_excluded_area_never_selected() {
    let probe = NpxProbeDesp::new();
    let chmap = probe.new_channelmap(21).unwrap();
    let blueprint = painted(&probe, 21, |e| {
        Some(if e.row < 20 {
            Category::FORBIDDEN
        } else {
            Category::LOW
        })
    });

    let result = probe
        .select_electrodes(&chmap, blueprint, &SelectOptions::new().with_seed(5))
        .unwrap();

    assert_eq!(result.len(), 384);
    assert!(result.electrodes().all(|e| e.row >= 20));
    assert!(probe.is_valid(&result));
}

// ============================================================================
// Blueprint toolkit and statistics
// ============================================================================

#[test]
fn test_blueprint_functions_on_npx() {
    let probe = NpxProbeDesp::new();
    let chmap = probe.new_channelmap(0).unwrap();
    let mut bp = BlueprintFunctions::new(&probe, chmap.clone()).unwrap();
    assert_eq!(bp.len(), 960);

    let area: Vec<usize> = (0..bp.len())
        .filter(|&i| bp.electrodes()[i].electrode.row < 50)
        .collect();
    let blueprint = bp
        .set(&bp.blueprint(), Region::Indices(&area), CATE_FULL)
        .unwrap();
    assert_eq!(bp.count_categories(&blueprint, &[CATE_FULL], None), 100);
    bp.set_blueprint(blueprint).unwrap();

    let result = bp.select_electrodes(&SelectOptions::new()).unwrap();
    assert_eq!(result.len(), 100);

    let dir = TempDir::new().unwrap();
    let path = bp.save_blueprint(&dir.path().join("run1"), None).unwrap();
    assert!(path.to_string_lossy().ends_with("run1.blueprint.npy"));

    let mut other = BlueprintFunctions::new(&probe, chmap).unwrap();
    other.load_blueprint(&path).unwrap();
    assert_eq!(other.blueprint(), bp.blueprint());
}

#[test]
fn test_statistics_table() {
    let probe = NpxProbeDesp::new();
    let chmap = probe.new_channelmap(0).unwrap();
    let blueprint = painted(&probe, 0, |e| (e.row < 100).then_some(Category::SET));
    let result = probe
        .select_electrodes(&chmap, blueprint.clone(), &SelectOptions::new())
        .unwrap();

    let stat = probe.statistics_ext().unwrap();
    let table = stat.statistics_info(&result, &blueprint);
    let get = |title: &str| {
        table
            .iter()
            .find(|(t, _)| t.as_str() == title)
            .map(|(_, v)| v.as_str())
    };

    assert_eq!(get("used channels"), Some("200/384"));
    assert_eq!(get("request electrodes"), Some("200"));
    assert_eq!(get("channel efficiency"), Some("100.0%"));
    assert_eq!(get("valid"), Some("true"));
}

#[test]
fn test_density_follows_selection() {
    let probe = NpxProbeDesp::new();
    let chmap = probe.new_channelmap(0).unwrap();
    let blueprint = painted(&probe, 0, |e| (e.row < 10).then_some(CATE_HALF));
    let result: NpxChannelMap = probe
        .select_electrodes(&chmap, blueprint, &SelectOptions::new())
        .unwrap();

    let curve = &electrode_density(&result)[0];
    assert_eq!(curve.y.len(), NP1.n_row_shank as usize);
    assert_eq!(curve.density[5], 0.5);
    assert_eq!(curve.density[100], 0.0);
}

#[test]
fn test_selection_resets_states() {
    let probe = NpxProbeDesp::new();
    let chmap = probe.new_channelmap(0).unwrap();
    let mut blueprint = painted(&probe, 0, |e| (e.row == 0).then_some(Category::SET));
    blueprint
        .iter_mut()
        .for_each(|e| e.state = ElectrodeState::Forbidden);

    let result = probe
        .select_electrodes(&chmap, blueprint, &SelectOptions::new())
        .unwrap();
    assert_eq!(result.len(), 2);
}

// ============================================================================
// Properties
// ============================================================================

mod properties {
    use super::*;
    use neurocarto_probe_npx::imro;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn overwriting_adds_keep_np24_valid(
            picks in prop::collection::vec((0u32..4, 0u32..1280), 0..600)
        ) {
            let probe = NpxProbeDesp::new();
            let mut chmap = probe.new_channelmap(24).unwrap();
            for (shank, n) in picks {
                chmap.add(NpxElectrode::from_number(&NP24, shank, n), true).unwrap();
            }

            prop_assert!(chmap.len() <= 384);
            prop_assert!(probe.is_valid(&chmap));

            let reloaded = imro::parse(&imro::format(&chmap)).unwrap();
            let a: Vec<_> = chmap.electrodes().collect();
            let b: Vec<_> = reloaded.electrodes().collect();
            prop_assert_eq!(a, b);
        }
    }
}
