// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Electrode descriptor: identity plus selection state and intent for one
physical electrode.
*/

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Selection outcome of an electrode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ElectrodeState {
    /// Selectable, not selected
    #[default]
    Unused = 0,
    /// Wired to a channel
    Used = 1,
    /// Not selectable. Only set by probe rules and the selector.
    Forbidden = 2,
}

impl ElectrodeState {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ElectrodeState::Unused),
            1 => Some(ElectrodeState::Used),
            2 => Some(ElectrodeState::Forbidden),
            _ => None,
        }
    }
}

/// Selection intent painted onto an electrode.
///
/// The four base categories are shared by every probe family. Families add
/// their own codes (density tiers, for example) starting at
/// [`Category::EXTENSION_BASE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub i32);

impl Category {
    /// No intent
    pub const UNSET: Category = Category(0);
    /// Must be selected if possible
    pub const SET: Category = Category(1);
    /// Must never be selected
    pub const FORBIDDEN: Category = Category(2);
    /// Low priority fill
    pub const LOW: Category = Category(3);
    /// First code available to family-specific categories
    pub const EXTENSION_BASE: i32 = 10;

    pub const fn code(self) -> i32 {
        self.0
    }

    pub fn is_unset(self) -> bool {
        self == Category::UNSET
    }
}

impl From<i32> for Category {
    fn from(code: i32) -> Self {
        Category(code)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One physical electrode.
///
/// Two descriptors are equal iff their `electrode` identities are equal;
/// position, channel, state and category do not take part in equality or
/// hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectrodeDesp<K> {
    /// Shank index
    pub s: u32,
    /// Horizontal position in um
    pub x: f64,
    /// Vertical position in um
    pub y: f64,
    /// Identity
    pub electrode: K,
    /// Readout channel, display only
    pub channel: u32,
    pub state: ElectrodeState,
    pub category: Category,
}

impl<K> ElectrodeDesp<K> {
    pub fn new(electrode: K, s: u32, x: f64, y: f64, channel: u32) -> Self {
        Self {
            s,
            x,
            y,
            electrode,
            channel,
            state: ElectrodeState::Unused,
            category: Category::UNSET,
        }
    }

    /// Builder-style category assignment
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn is_used(&self) -> bool {
        self.state == ElectrodeState::Used
    }

    pub fn is_forbidden(&self) -> bool {
        self.state == ElectrodeState::Forbidden
    }
}

impl<K: PartialEq> PartialEq for ElectrodeDesp<K> {
    fn eq(&self, other: &Self) -> bool {
        self.electrode == other.electrode
    }
}

impl<K: Eq> Eq for ElectrodeDesp<K> {}

impl<K: Hash> Hash for ElectrodeDesp<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.electrode.hash(state);
    }
}

impl<K: fmt::Debug> fmt::Display for ElectrodeDesp<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Electrode[{:?}]", self.electrode)
    }
}
