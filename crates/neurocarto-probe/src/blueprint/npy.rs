// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Blueprint file codec.

Blueprints are stored as NumPy `.npy` files holding a 1-D integer array, one
category code per electrode in canonical order.

# Format
- magic `\x93NUMPY` (6 bytes) + major/minor version (2 bytes)
- header length: u16 LE (v1.x) or u32 LE (v2.x/v3.x)
- ASCII header dict `{'descr': '<i8', 'fortran_order': False, 'shape': (N,), }`,
  space padded and newline terminated so the data starts on a 64-byte boundary
- raw array data

Arrays are written as `<i8`. Reading accepts signed integers of 1, 2, 4 or 8
bytes in either byte order.
*/

use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tracing::info;

use crate::error::{ProbeError, ProbeResult};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGNMENT: usize = 64;

/// Conventional blueprint file suffix
pub const BLUEPRINT_SUFFIX: &str = ".blueprint.npy";

/// Normalise `path` to `<stem>.blueprint.npy`.
///
/// `run1.imro` becomes `run1.blueprint.npy`; a path that already ends with the
/// blueprint suffix is returned unchanged.
pub fn blueprint_path(path: &Path) -> PathBuf {
    blueprint_path_with_suffix(path, BLUEPRINT_SUFFIX)
}

/// [`blueprint_path`] with a custom suffix such as `.bp.npy`
pub fn blueprint_path_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let already = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.ends_with(suffix));

    if already {
        path.to_path_buf()
    } else {
        path.with_extension(suffix.trim_start_matches('.'))
    }
}

/// Encode category codes as `.npy` bytes
pub fn encode_npy(codes: &[i32]) -> Vec<u8> {
    let mut header = format!(
        "{{'descr': '<i8', 'fortran_order': False, 'shape': ({},), }}",
        codes.len()
    );
    // 6 magic + 2 version + 2 header length + header + '\n'
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    header.push_str(&" ".repeat(padding));
    header.push('\n');

    let mut bytes = Vec::with_capacity(MAGIC.len() + 4 + header.len() + codes.len() * 8);
    bytes.extend_from_slice(MAGIC);
    bytes.push(1);
    bytes.push(0);
    let mut len = [0u8; 2];
    LittleEndian::write_u16(&mut len, header.len() as u16);
    bytes.extend_from_slice(&len);
    bytes.extend_from_slice(header.as_bytes());

    let mut value = [0u8; 8];
    for &code in codes {
        LittleEndian::write_i64(&mut value, code as i64);
        bytes.extend_from_slice(&value);
    }
    bytes
}

/// Decode `.npy` bytes into category codes
pub fn decode_npy(bytes: &[u8]) -> ProbeResult<Vec<i32>> {
    if bytes.len() < MAGIC.len() + 4 || &bytes[..MAGIC.len()] != MAGIC {
        return Err(ProbeError::Format("not a .npy file (bad magic)".to_string()));
    }

    let major = bytes[6];
    let (header_start, header_len) = match major {
        1 => (10, LittleEndian::read_u16(&bytes[8..10]) as usize),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(ProbeError::Format("truncated .npy header".to_string()));
            }
            (12, LittleEndian::read_u32(&bytes[8..12]) as usize)
        }
        v => {
            return Err(ProbeError::Format(format!(
                "unsupported .npy version {}",
                v
            )))
        }
    };

    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err(ProbeError::Format("truncated .npy header".to_string()));
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| ProbeError::Format("non-ASCII .npy header".to_string()))?;

    let header = NpyHeader::parse(header)?;
    let data = &bytes[data_start..];
    let expected = header.length * header.item_size;
    if data.len() < expected {
        return Err(ProbeError::Format(format!(
            "truncated .npy data: expected {} bytes, got {}",
            expected,
            data.len()
        )));
    }

    data[..expected]
        .chunks_exact(header.item_size)
        .map(|chunk| header.read_value(chunk))
        .collect()
}

/// Write a blueprint array to `path` (suffix not normalised)
pub fn write_blueprint(path: &Path, codes: &[i32]) -> ProbeResult<()> {
    fs::write(path, encode_npy(codes)).map_err(|e| ProbeError::io(path, e))?;
    info!(target: "neurocarto-probe", "💾 Saved blueprint ({} electrodes) to {}", codes.len(), path.display());
    Ok(())
}

/// Read a blueprint array from `path`
pub fn read_blueprint(path: &Path) -> ProbeResult<Vec<i32>> {
    let bytes = fs::read(path).map_err(|e| ProbeError::io(path, e))?;
    let codes = decode_npy(&bytes)?;
    info!(target: "neurocarto-probe", "📂 Loaded blueprint ({} electrodes) from {}", codes.len(), path.display());
    Ok(codes)
}

#[derive(Debug)]
struct NpyHeader {
    big_endian: bool,
    item_size: usize,
    length: usize,
}

impl NpyHeader {
    fn parse(header: &str) -> ProbeResult<Self> {
        let descr = dict_value(header, "descr")
            .and_then(quoted)
            .ok_or_else(|| ProbeError::Format("missing descr in .npy header".to_string()))?;

        let (order, kind) = descr.split_at(1.min(descr.len()));
        let big_endian = match order {
            "<" | "|" | "=" => false,
            ">" => true,
            _ => return Err(ProbeError::Format(format!("unsupported dtype {}", descr))),
        };
        let item_size = match kind {
            "i1" => 1,
            "i2" => 2,
            "i4" => 4,
            "i8" => 8,
            _ => return Err(ProbeError::Format(format!("unsupported dtype {}", descr))),
        };

        let fortran = dict_value(header, "fortran_order")
            .ok_or_else(|| ProbeError::Format("missing fortran_order in .npy header".to_string()))?;
        if fortran.starts_with("True") {
            return Err(ProbeError::Format("fortran ordered arrays are not supported".to_string()));
        }

        let shape = dict_value(header, "shape")
            .ok_or_else(|| ProbeError::Format("missing shape in .npy header".to_string()))?;
        let dims: Vec<&str> = shape
            .trim_start_matches('(')
            .split(')')
            .next()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .collect();
        if dims.len() != 1 {
            return Err(ProbeError::Format(format!(
                "blueprint must be a 1-D array, got shape ({})",
                dims.join(", ")
            )));
        }
        let length = dims[0]
            .parse::<usize>()
            .map_err(|_| ProbeError::Format(format!("bad shape {}", dims[0])))?;

        Ok(Self {
            big_endian,
            item_size,
            length,
        })
    }

    fn read_value(&self, chunk: &[u8]) -> ProbeResult<i32> {
        let value: i64 = match (self.item_size, self.big_endian) {
            (1, _) => chunk[0] as i8 as i64,
            (2, false) => LittleEndian::read_i16(chunk) as i64,
            (2, true) => BigEndian::read_i16(chunk) as i64,
            (4, false) => LittleEndian::read_i32(chunk) as i64,
            (4, true) => BigEndian::read_i32(chunk) as i64,
            (_, false) => LittleEndian::read_i64(chunk),
            (_, true) => BigEndian::read_i64(chunk),
        };
        i32::try_from(value)
            .map_err(|_| ProbeError::Format(format!("category code {} out of range", value)))
    }
}

/// Raw text following `'key':` in a python dict literal
fn dict_value<'h>(header: &'h str, key: &str) -> Option<&'h str> {
    let pattern = format!("'{}':", key);
    let start = header.find(&pattern)? + pattern.len();
    Some(header[start..].trim_start())
}

/// Leading quoted string literal of `value`, without its quotes
fn quoted(value: &str) -> Option<&str> {
    let quote = value.chars().next().filter(|&c| c == '\'' || c == '"')?;
    let rest = &value[1..];
    rest.find(quote).map(|end| &rest[..end])
}
