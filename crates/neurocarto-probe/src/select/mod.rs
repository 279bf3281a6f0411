// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Electrode selection: turning a blueprint into a hardware-valid channel map.
*/

pub mod default;
pub mod density;
pub mod options;

pub use default::{run_selection, select_default, Selection};
pub use density::{DensityPattern, DensityTier};
pub use options::{CancelToken, SelectOptions, DEFAULT_SELECTOR, OPTION_SEED, OPTION_SELECTOR};
