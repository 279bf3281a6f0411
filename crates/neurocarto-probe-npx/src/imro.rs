// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
IMRO table codec.

An IMRO table is a single line of parenthesised records: a header `(type,n)`
followed by `n` channel entries. Entry layout depends on the probe type:

| type | entry                                  |
|------|----------------------------------------|
| 0    | `(ch bank ref ap_gain lf_gain ap_hp)`  |
| 21   | `(ch bank_mask ref electrode)`         |
| 24   | `(ch shank bank ref electrode)`        |

Only wired channels are written, so `n` is the number of used channels.
SpikeGLX only accepts complete tables (`n` equal to the channel count), so a
partially wired map saved here has to be completed before it is loaded into
the acquisition software.
*/

use std::fs;
use std::path::Path;

use neurocarto_probe::{ProbeError, ProbeResult};
use thiserror::Error;
use tracing::{info, warn};

use crate::channelmap::{NpxChannelMap, NpxElectrode};
use crate::probe_type::{ProbeType, BANK_SIZE, NP1, NP21, NP24};

/// IMRO parse errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImroError {
    #[error("Empty IMRO table")]
    Empty,

    #[error("Malformed record {index}: {record}")]
    Malformed { index: usize, record: String },

    #[error("Unsupported probe type: {0}")]
    UnsupportedType(u32),

    #[error("Header announces {expected} entries, found {actual}")]
    EntryCount { expected: usize, actual: usize },

    #[error("Entry {index}: electrode {electrode} does not map to channel {channel}")]
    ChannelMismatch {
        index: usize,
        channel: u32,
        electrode: u32,
    },

    #[error("Entry {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

impl From<ImroError> for ProbeError {
    fn from(err: ImroError) -> Self {
        match err {
            ImroError::UnsupportedType(code) => ProbeError::UnknownProbeType(code),
            other => ProbeError::Format(other.to_string()),
        }
    }
}

/// Parse an IMRO table.
///
/// A channel listed twice keeps its first electrode.
pub fn parse(text: &str) -> Result<NpxChannelMap, ImroError> {
    let mut records = records(text)?.into_iter();

    let header = records.next().ok_or(ImroError::Empty)?;
    let (code, count) = parse_header(&header)?;
    let probe_type = ProbeType::from_code(code).ok_or(ImroError::UnsupportedType(code))?;

    let entries: Vec<String> = records.collect();
    if entries.len() != count {
        return Err(ImroError::EntryCount {
            expected: count,
            actual: entries.len(),
        });
    }

    let mut chmap = NpxChannelMap::new(probe_type);
    for (i, entry) in entries.iter().enumerate() {
        let index = i + 1;
        let values = numbers(entry, index)?;
        let (channel, electrode) = parse_entry(&probe_type, &values, index, &mut chmap)?;

        if electrode.channel(&probe_type) != channel {
            return Err(ImroError::ChannelMismatch {
                index,
                channel,
                electrode: electrode.number(&probe_type),
            });
        }

        if chmap.get_channel(channel).is_some() {
            warn!(target: "neurocarto-probe-npx", "IMRO entry {} reuses channel {}, ignored", index, channel);
            continue;
        }

        chmap
            .add(electrode, false)
            .map_err(|e| ImroError::InvalidEntry {
                index,
                reason: e.to_string(),
            })?;
    }

    Ok(chmap)
}

/// Format a channel map as an IMRO table.
///
/// Unwired channels are left out; see the module documentation.
pub fn format(chmap: &NpxChannelMap) -> String {
    let probe_type = chmap.probe_type();
    let settings = chmap.settings();

    let mut ret = format!("({},{})", probe_type.code, chmap.electrodes().count());
    for (channel, e) in chmap.channels() {
        let number = e.number(probe_type);
        let bank = number / BANK_SIZE;
        let entry = match probe_type.code {
            c if c == NP21.code => format!(
                "({} {} {} {})",
                channel,
                1u32 << bank,
                settings.reference,
                number
            ),
            c if c == NP24.code => format!(
                "({} {} {} {} {})",
                channel, e.shank, bank, settings.reference, number
            ),
            _ => format!(
                "({} {} {} {} {} {})",
                channel,
                bank,
                settings.reference,
                settings.ap_gain,
                settings.lf_gain,
                u8::from(settings.ap_filter)
            ),
        };
        ret.push_str(&entry);
    }
    ret
}

/// Read an `.imro` file
pub fn load(path: &Path) -> ProbeResult<NpxChannelMap> {
    let text = fs::read_to_string(path).map_err(|e| ProbeError::io(path, e))?;
    let chmap = parse(&text)?;
    info!(
        target: "neurocarto-probe-npx",
        "📂 Loaded {} channels ({}) from {}",
        chmap.electrodes().count(),
        chmap.probe_type().name,
        path.display()
    );
    Ok(chmap)
}

/// Write an `.imro` file
pub fn save(chmap: &NpxChannelMap, path: &Path) -> ProbeResult<()> {
    fs::write(path, format(chmap)).map_err(|e| ProbeError::io(path, e))?;
    info!(target: "neurocarto-probe-npx", "💾 Saved IMRO table to {}", path.display());
    Ok(())
}

fn records(text: &str) -> Result<Vec<String>, ImroError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ImroError::Empty);
    }

    let mut ret = Vec::new();
    for (index, chunk) in text.split(')').enumerate() {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        let body = chunk.strip_prefix('(').ok_or_else(|| ImroError::Malformed {
            index,
            record: chunk.to_string(),
        })?;
        ret.push(body.to_string());
    }
    Ok(ret)
}

fn parse_header(header: &str) -> Result<(u32, usize), ImroError> {
    let malformed = || ImroError::Malformed {
        index: 0,
        record: header.to_string(),
    };
    let (code, count) = header.split_once(',').ok_or_else(malformed)?;
    let code = code.trim().parse::<u32>().map_err(|_| malformed())?;
    let count = count.trim().parse::<usize>().map_err(|_| malformed())?;
    Ok((code, count))
}

fn numbers(entry: &str, index: usize) -> Result<Vec<u32>, ImroError> {
    entry
        .split_whitespace()
        .map(|t| {
            t.parse::<u32>().map_err(|_| ImroError::Malformed {
                index,
                record: entry.to_string(),
            })
        })
        .collect()
}

fn expect_len(values: &[u32], n: usize, index: usize) -> Result<(), ImroError> {
    if values.len() == n {
        Ok(())
    } else {
        Err(ImroError::InvalidEntry {
            index,
            reason: format!("expected {} fields, got {}", n, values.len()),
        })
    }
}

/// Decode one entry into `(channel, electrode)`; settings go into `chmap`
fn parse_entry(
    probe_type: &ProbeType,
    values: &[u32],
    index: usize,
    chmap: &mut NpxChannelMap,
) -> Result<(u32, NpxElectrode), ImroError> {
    let out_of_range = |number: u32| ImroError::InvalidEntry {
        index,
        reason: format!(
            "electrode {} outside {} electrodes per shank",
            number,
            probe_type.n_electrode_shank()
        ),
    };

    match probe_type.code {
        c if c == NP1.code => {
            expect_len(values, 6, index)?;
            let (channel, bank) = (values[0], values[1]);
            let settings = chmap.settings_mut();
            settings.reference = values[2];
            settings.ap_gain = values[3];
            settings.lf_gain = values[4];
            settings.ap_filter = values[5] != 0;

            let number = bank
                .checked_mul(BANK_SIZE)
                .and_then(|n| n.checked_add(channel))
                .ok_or_else(|| ImroError::InvalidEntry {
                    index,
                    reason: format!("bank {} channel {} outside probe", bank, channel),
                })?;
            if number >= probe_type.n_electrode_shank() {
                return Err(out_of_range(number));
            }
            Ok((channel, NpxElectrode::from_number(probe_type, 0, number)))
        }
        c if c == NP21.code => {
            expect_len(values, 4, index)?;
            let (channel, mask, number) = (values[0], values[1], values[3]);
            chmap.settings_mut().reference = values[2];

            if number >= probe_type.n_electrode_shank() {
                return Err(out_of_range(number));
            }
            if mask != 1 << (number / BANK_SIZE) {
                return Err(ImroError::InvalidEntry {
                    index,
                    reason: format!("bank mask {} does not match electrode {}", mask, number),
                });
            }
            Ok((channel, NpxElectrode::from_number(probe_type, 0, number)))
        }
        _ => {
            expect_len(values, 5, index)?;
            let (channel, shank, bank, number) = (values[0], values[1], values[2], values[4]);
            chmap.settings_mut().reference = values[3];

            if shank >= probe_type.n_shank {
                return Err(ImroError::InvalidEntry {
                    index,
                    reason: format!("shank {} outside probe", shank),
                });
            }
            if number >= probe_type.n_electrode_shank() {
                return Err(out_of_range(number));
            }
            if bank != number / BANK_SIZE {
                return Err(ImroError::InvalidEntry {
                    index,
                    reason: format!("bank {} does not match electrode {}", bank, number),
                });
            }
            Ok((channel, NpxElectrode::from_number(probe_type, shank, number)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurocarto_probe::ChannelMap;

    #[test]
    fn test_np1_format() {
        let mut chmap = NpxChannelMap::new(NP1);
        chmap.add(NpxElectrode::from_number(&NP1, 0, 1), false).unwrap();
        chmap.add(NpxElectrode::from_number(&NP1, 0, 400), false).unwrap();
        assert_eq!(format(&chmap), "(0,2)(1 0 0 500 250 1)(16 1 0 500 250 1)");
    }

    #[test]
    fn test_np21_np24_format() {
        let mut chmap = NpxChannelMap::new(NP21);
        chmap.add(NpxElectrode::from_number(&NP21, 0, 800), false).unwrap();
        assert_eq!(format(&chmap), "(21,1)(32 4 0 800)");

        let mut chmap = NpxChannelMap::new(NP24);
        chmap.add(NpxElectrode::from_number(&NP24, 1, 0), false).unwrap();
        assert_eq!(format(&chmap), "(24,1)(96 1 0 0 0)");
    }

    #[test]
    fn test_parse_format_roundtrip() {
        for probe_type in [NP1, NP21, NP24] {
            let mut chmap = NpxChannelMap::new(probe_type);
            for shank in 0..probe_type.n_shank {
                for number in [0, 7, 383, 500] {
                    let _ = chmap.add(NpxElectrode::from_number(&probe_type, shank, number), false);
                }
            }
            chmap.settings_mut().reference = 1;
            let parsed = parse(&format(&chmap)).unwrap();
            assert_eq!(parsed.len(), chmap.len());
            assert!(chmap.electrodes().all(|e| parsed.contains(e)));
            assert_eq!(parsed.settings().reference, 1);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("  ").unwrap_err(), ImroError::Empty);
        assert_eq!(parse("(7,0)").unwrap_err(), ImroError::UnsupportedType(7));
        assert!(matches!(
            parse("(0,2)(1 0 0 500 250 1)").unwrap_err(),
            ImroError::EntryCount { expected: 2, actual: 1 }
        ));
        assert!(matches!(
            parse("(0,1)(1 0 0 500 x 1)").unwrap_err(),
            ImroError::Malformed { .. }
        ));
        assert!(matches!(
            parse("(0,1)(1 0 0 500)").unwrap_err(),
            ImroError::InvalidEntry { .. }
        ));
        assert!(matches!(
            parse("(21,1)(5 1 0 6)").unwrap_err(),
            ImroError::ChannelMismatch { .. }
        ));
        assert!(matches!(
            parse("(21,1)(5 2 0 5)").unwrap_err(),
            ImroError::InvalidEntry { .. }
        ));
        assert!(matches!(
            parse("(24,1)(0 4 0 0 0)").unwrap_err(),
            ImroError::InvalidEntry { .. }
        ));
    }

    #[test]
    fn test_np1_bank_overflow_is_an_error() {
        assert!(matches!(
            parse("(0,1)(0 4294967295 0 500 250 1)").unwrap_err(),
            ImroError::InvalidEntry { index: 1, .. }
        ));
        assert!(matches!(
            parse("(0,1)(4294967295 1 0 500 250 1)").unwrap_err(),
            ImroError::InvalidEntry { index: 1, .. }
        ));

        let err: ProbeError = parse("(0,1)(0 4294967295 0 500 250 1)").unwrap_err().into();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_format_lists_wired_channels_only() {
        let mut chmap = NpxChannelMap::new(NP24);
        for number in 0..10 {
            chmap.add(NpxElectrode::from_number(&NP24, 0, number), false).unwrap();
        }
        let table = format(&chmap);
        assert!(table.starts_with("(24,10)"));
        assert_eq!(table.matches('(').count(), 11);
        assert_eq!(parse(&table).unwrap().len(), 10);
    }

    #[test]
    fn test_duplicate_channel_keeps_first() {
        let chmap = parse("(0,2)(3 0 0 500 250 1)(3 1 0 500 250 1)").unwrap();
        assert_eq!(chmap.len(), 1);
        assert!(chmap.contains(&NpxElectrode::from_number(&NP1, 0, 3)));
    }

    #[test]
    fn test_error_conversion() {
        let err: ProbeError = ImroError::UnsupportedType(9).into();
        assert!(matches!(err, ProbeError::UnknownProbeType(9)));
        let err: ProbeError = ImroError::Empty.into();
        assert!(err.is_format_error());
    }
}
