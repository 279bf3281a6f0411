// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Blueprints: per-electrode category arrays, their file format and the editing
toolkit built on top of them.
*/

pub mod codec;
pub mod functions;
pub mod npy;
pub mod zone;

pub use codec::{load_blueprint, resolve_universe, save_blueprint};
pub use functions::{BlueprintFunctions, Region};
pub use npy::{
    blueprint_path, blueprint_path_with_suffix, read_blueprint, write_blueprint, BLUEPRINT_SUFFIX,
};
pub use zone::Zone;
