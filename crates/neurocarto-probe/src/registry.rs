// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Probe family registry.

Maps family names and aliases to factories producing type-erased descriptors.
[`ProbeInfo`] exposes the object-safe part of a [`ProbeDesp`]; the concrete
descriptor is recovered with [`ProbeInfo::as_any`] / [`downcast`].
*/

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ahash::AHashMap;
use tracing::{debug, warn};

use crate::desp::ProbeDesp;
use crate::electrode::{Category, ElectrodeState};
use crate::select::DensityTier;

/// Object-safe view of a probe descriptor
pub trait ProbeInfo: Send + Sync + Any {
    fn supported_type(&self) -> Vec<(&'static str, u32)>;

    fn possible_states(&self) -> Vec<(&'static str, ElectrodeState)>;

    fn possible_categories(&self) -> Vec<(&'static str, Category)>;

    fn channelmap_file_suffix(&self) -> Vec<&'static str>;

    fn density_tiers(&self) -> Vec<DensityTier>;

    /// Provide access to `Any` for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl<P: ProbeDesp + Send + Sync + 'static> ProbeInfo for P {
    fn supported_type(&self) -> Vec<(&'static str, u32)> {
        ProbeDesp::supported_type(self)
    }

    fn possible_states(&self) -> Vec<(&'static str, ElectrodeState)> {
        ProbeDesp::possible_states(self)
    }

    fn possible_categories(&self) -> Vec<(&'static str, Category)> {
        ProbeDesp::possible_categories(self)
    }

    fn channelmap_file_suffix(&self) -> Vec<&'static str> {
        ProbeDesp::channelmap_file_suffix(self)
    }

    fn density_tiers(&self) -> Vec<DensityTier> {
        ProbeDesp::density_tiers(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Concrete descriptor behind a registry entry
pub fn downcast<P: 'static>(info: &dyn ProbeInfo) -> Option<&P> {
    info.as_any().downcast_ref::<P>()
}

type Factory = Arc<dyn Fn() -> Arc<dyn ProbeInfo> + Send + Sync>;

/// Registry of probe families
#[derive(Clone, Default)]
pub struct ProbeRegistry {
    factories: BTreeMap<String, Factory>,
    aliases: AHashMap<String, String>,
}

impl fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("families", &self.names())
            .field("aliases", &self.aliases)
            .finish()
    }
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a family under `name` and its `aliases`.
    ///
    /// Names are case-insensitive. Re-registering a name replaces it.
    pub fn register<F>(&mut self, name: &str, aliases: &[&str], factory: F)
    where
        F: Fn() -> Arc<dyn ProbeInfo> + Send + Sync + 'static,
    {
        let name = name.to_lowercase();
        if self.factories.insert(name.clone(), Arc::new(factory)).is_some() {
            warn!(target: "neurocarto-probe", "Probe family '{}' registered twice, replacing", name);
        }
        for alias in aliases {
            self.aliases.insert(alias.to_lowercase(), name.clone());
        }
        debug!(target: "neurocarto-probe", "Registered probe family '{}' (aliases: {:?})", name, aliases);
    }

    /// Canonical family name of a name or alias
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        if let Some((key, _)) = self.factories.get_key_value(&name) {
            return Some(key.as_str());
        }
        self.aliases.get(&name).map(String::as_str)
    }

    /// New descriptor of a family, by name or alias
    pub fn get(&self, name: &str) -> Option<Arc<dyn ProbeInfo>> {
        let name = self.resolve(name)?;
        self.factories.get(name).map(|factory| factory())
    }

    /// Family that claims the suffix of `path`
    pub fn find_by_suffix(&self, path: &Path) -> Option<(&str, Arc<dyn ProbeInfo>)> {
        let file_name = path.file_name()?.to_str()?.to_lowercase();
        self.factories.iter().find_map(|(name, factory)| {
            let info = factory();
            let claims = info
                .channelmap_file_suffix()
                .iter()
                .any(|suffix| file_name.ends_with(&suffix.to_lowercase()));
            claims.then(|| (name.as_str(), info))
        })
    }

    /// Registered family names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
