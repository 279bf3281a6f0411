// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Neuropixels probe types.

| type | code | shanks | electrodes/shank | layout | pitch (col/row/shank) |
|------|------|--------|------------------|--------|-----------------------|
| NP1  | 0    | 1      | 960              | 2x480  | 32 / 20 / -           |
| NP21 | 21   | 1      | 1280             | 2x640  | 32 / 15 / -           |
| NP24 | 24   | 4      | 1280             | 2x640  | 32 / 15 / 250         |

Every type has 384 readout channels. Electrode `e` of a shank sits at column
`e % 2`, row `e / 2` and belongs to bank `e / 384`.
*/

use serde::Serialize;

/// Geometry and channel budget of one Neuropixels probe type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ProbeType {
    pub code: u32,
    pub name: &'static str,
    pub n_shank: u32,
    pub n_col_shank: u32,
    pub n_row_shank: u32,
    pub n_channels: u32,
    /// Column pitch in um
    pub c_space: u32,
    /// Row pitch in um
    pub r_space: u32,
    /// Shank pitch in um
    pub s_space: u32,
}

/// Electrodes wired to one bank of channels
pub const BANK_SIZE: u32 = 384;

/// NP24 channel permutation block
pub const NP24_BLOCK: u32 = 48;

pub const NP1: ProbeType = ProbeType {
    code: 0,
    name: "Neuropixels probe",
    n_shank: 1,
    n_col_shank: 2,
    n_row_shank: 480,
    n_channels: 384,
    c_space: 32,
    r_space: 20,
    s_space: 0,
};

pub const NP21: ProbeType = ProbeType {
    code: 21,
    name: "Neuropixels probe 2.0 single shank",
    n_shank: 1,
    n_col_shank: 2,
    n_row_shank: 640,
    n_channels: 384,
    c_space: 32,
    r_space: 15,
    s_space: 0,
};

pub const NP24: ProbeType = ProbeType {
    code: 24,
    name: "Neuropixels probe 2.0 four shank",
    n_shank: 4,
    n_col_shank: 2,
    n_row_shank: 640,
    n_channels: 384,
    c_space: 32,
    r_space: 15,
    s_space: 250,
};

pub const PROBE_TYPES: [ProbeType; 3] = [NP1, NP21, NP24];

impl ProbeType {
    pub fn from_code(code: u32) -> Option<ProbeType> {
        PROBE_TYPES.iter().copied().find(|t| t.code == code)
    }

    pub fn n_electrode_shank(&self) -> u32 {
        self.n_col_shank * self.n_row_shank
    }

    pub fn n_electrode_total(&self) -> u32 {
        self.n_shank * self.n_electrode_shank()
    }

    /// Banks per shank, counting a partial last bank
    pub fn n_bank(&self) -> u32 {
        (self.n_electrode_shank() + BANK_SIZE - 1) / BANK_SIZE
    }

    /// Shank-local electrode number of `(column, row)`
    pub fn electrode_number(&self, column: u32, row: u32) -> u32 {
        row * self.n_col_shank + column
    }

    /// `(column, row)` of a shank-local electrode number
    pub fn column_row(&self, electrode: u32) -> (u32, u32) {
        (electrode % self.n_col_shank, electrode / self.n_col_shank)
    }

    /// Readout channel of a shank-local electrode
    pub fn channel(&self, shank: u32, electrode: u32) -> u32 {
        let local = electrode % BANK_SIZE;
        if self.code == NP24.code {
            let n_block = BANK_SIZE / NP24_BLOCK;
            let block = (local / NP24_BLOCK + 2 * shank) % n_block;
            block * NP24_BLOCK + local % NP24_BLOCK
        } else {
            local
        }
    }

    /// Electrode position `(x, y)` in um
    pub fn position(&self, shank: u32, column: u32, row: u32) -> (f64, f64) {
        let x = shank * self.s_space + column * self.c_space;
        let y = row * self.r_space;
        (x as f64, y as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(ProbeType::from_code(0), Some(NP1));
        assert_eq!(ProbeType::from_code(24), Some(NP24));
        assert_eq!(ProbeType::from_code(3), None);
    }

    #[test]
    fn test_sizes() {
        assert_eq!(NP1.n_electrode_shank(), 960);
        assert_eq!(NP1.n_bank(), 3);
        assert_eq!(NP21.n_electrode_total(), 1280);
        assert_eq!(NP24.n_electrode_total(), 5120);
        assert_eq!(NP24.n_bank(), 4);
    }

    #[test]
    fn test_channel_mapping() {
        assert_eq!(NP1.channel(0, 5), 5);
        assert_eq!(NP1.channel(0, 389), 5);
        assert_eq!(NP21.channel(0, 1279), 1279 % 384);

        // shank 0 is identity, shank 1 shifts by two blocks
        assert_eq!(NP24.channel(0, 50), 50);
        assert_eq!(NP24.channel(1, 0), 96);
        assert_eq!(NP24.channel(3, 300), (300 / 48 + 6) % 8 * 48 + 300 % 48);

        // every bank of every shank covers all channels exactly once
        for shank in 0..4 {
            let mut seen = vec![false; 384];
            for e in 0..384 {
                let c = NP24.channel(shank, e) as usize;
                assert!(!seen[c]);
                seen[c] = true;
            }
        }
    }

    #[test]
    fn test_geometry() {
        assert_eq!(NP1.column_row(7), (1, 3));
        assert_eq!(NP1.electrode_number(1, 3), 7);
        assert_eq!(NP24.position(2, 1, 10), (532.0, 150.0));
    }
}
