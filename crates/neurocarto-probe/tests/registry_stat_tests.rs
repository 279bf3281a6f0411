// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Probe registry and sampling statistics tests

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{blueprint, ColumnProbe};
use neurocarto_probe::stat::channel_efficiency_of;
use neurocarto_probe::{
    downcast, electrode_probability, electrode_probability_with_workers, Category, ProbeDesp, ProbeInfo, ProbeRegistry,
    SelectOptions,
};
use proptest::prelude::*;

fn registry() -> ProbeRegistry {
    let mut registry = ProbeRegistry::new();
    registry.register("Column", &["col", "columns"], || {
        Arc::new(ColumnProbe::default()) as Arc<dyn ProbeInfo>
    });
    registry
}

#[test]
fn test_registry_lookup() {
    let registry = registry();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.names(), vec!["column"]);
    assert_eq!(registry.resolve("COL"), Some("column"));
    assert_eq!(registry.resolve("npx"), None);

    let info = registry.get("columns").unwrap();
    assert_eq!(info.channelmap_file_suffix(), vec![".colmap"]);
    assert!(registry.get("unknown").is_none());
}

#[test]
fn test_registry_downcast() {
    let registry = registry();
    let info = registry.get("column").unwrap();

    let probe: &ColumnProbe = downcast(info.as_ref()).unwrap();
    let chmap = ProbeDesp::new_channelmap(probe, 0).unwrap();
    assert!(ProbeDesp::is_valid(probe, &chmap));

    assert!(downcast::<String>(info.as_ref()).is_none());
}

#[test]
fn test_registry_find_by_suffix() {
    let registry = registry();
    let (name, _) = registry.find_by_suffix(Path::new("data/Run1.COLMAP")).unwrap();
    assert_eq!(name, "column");
    assert!(registry.find_by_suffix(Path::new("data/run1.imro")).is_none());
}

#[test]
fn test_electrode_probability() {
    let probe = ColumnProbe::default();
    let chmap = ProbeDesp::new_channelmap(&probe, 1).unwrap();
    let all: Vec<(u32, Category)> = (0..32).map(|id| (id, Category::SET)).collect();
    let bp = blueprint(1, &all);
    let options = SelectOptions::new().with_seed(3);

    let p = electrode_probability(&probe, &chmap, &bp, 8, &options).unwrap();
    assert_eq!(p.sample_times, 8);
    assert_eq!(p.complete, 8);
    assert_eq!(p.summation.len(), 32);
    assert_eq!(p.summation.iter().sum::<u32>(), 32);
    assert_eq!(p.channel_efficiency.len(), 8);

    // SET keeps canonical order, so every run picks the first row
    assert_eq!(&p.summation[..4], &[8, 8, 8, 8]);
    assert_eq!(p.probability()[0], 1.0);
    assert_eq!(p.complete_rate(), 1.0);

    let again = electrode_probability(&probe, &chmap, &bp, 8, &options).unwrap();
    assert_eq!(again, p);
}

#[test]
fn test_electrode_probability_low_fill_is_reproducible() {
    let probe = ColumnProbe::default();
    let chmap = ProbeDesp::new_channelmap(&probe, 1).unwrap();
    let all: Vec<(u32, Category)> = (0..32).map(|id| (id, Category::LOW)).collect();
    let bp = blueprint(1, &all);
    let options = SelectOptions::new().with_seed(11);

    let a = electrode_probability(&probe, &chmap, &bp, 16, &options).unwrap();
    let b = electrode_probability(&probe, &chmap, &bp, 16, &options).unwrap();
    assert_eq!(a.summation, b.summation);
    assert_eq!(a.summation.iter().sum::<u32>(), 64);
    assert_eq!(a.complete, 16);
    // no SET/tier request -> zero efficiency
    assert_eq!(a.max_channel_efficiency(), 0.0);

    let merged = a.clone().merge(b);
    assert_eq!(merged.sample_times, 32);
}

#[test]
fn test_electrode_probability_worker_count() {
    let probe = ColumnProbe::default();
    let chmap = ProbeDesp::new_channelmap(&probe, 1).unwrap();
    let all: Vec<(u32, Category)> = (0..32).map(|id| (id, Category::LOW)).collect();
    let bp = blueprint(1, &all);
    let options = SelectOptions::new().with_seed(5);

    let global = electrode_probability(&probe, &chmap, &bp, 12, &options).unwrap();
    for workers in [0, 1, 3] {
        let pooled =
            electrode_probability_with_workers(&probe, &chmap, &bp, 12, workers, &options)
                .unwrap();
        assert_eq!(pooled, global);
    }
}

proptest! {
    #[test]
    fn prop_channel_efficiency_symmetric(aeff in 0.001f64..1000.0) {
        let ceff = channel_efficiency_of(aeff);
        let inverse = channel_efficiency_of(1.0 / aeff);
        prop_assert!((ceff - inverse).abs() < 1e-9);
        prop_assert!((0.0..=1.0).contains(&ceff));
    }
}

#[test]
fn test_channel_efficiency_zero() {
    assert_eq!(channel_efficiency_of(0.0), 0.0);
    assert_eq!(channel_efficiency_of(1.0), 1.0);
}
