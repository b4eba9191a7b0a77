//! Reader for NumPy `.npy` payloads, limited to what voice embeddings use:
//! little-endian `f4`/`f8` data in C order.

use regex::Regex;
use serde_json::{Number, Value};

use crate::error::{CoreError, Result};

const MAGIC: &[u8] = b"\x93NUMPY";

#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub descr: String,
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

#[derive(Debug, PartialEq)]
struct Header {
    descr: String,
    fortran_order: bool,
    shape: Vec<usize>,
}

fn asset(message: impl Into<String>) -> CoreError {
    CoreError::Asset(message.into())
}

fn parse_header(text: &str) -> Result<Header> {
    let descr_re = Regex::new(r"'descr'\s*:\s*'([^']+)'").map_err(|e| asset(e.to_string()))?;
    let order_re =
        Regex::new(r"'fortran_order'\s*:\s*(True|False)").map_err(|e| asset(e.to_string()))?;
    let shape_re = Regex::new(r"'shape'\s*:\s*\(([^)]*)\)").map_err(|e| asset(e.to_string()))?;

    let descr = descr_re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| asset("npy header has no descr"))?;

    let fortran_order = order_re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str() == "True")
        .ok_or_else(|| asset("npy header has no fortran_order"))?;

    let dims = shape_re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| asset("npy header has no shape"))?;

    let shape = dims
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            d.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|_| asset(format!("bad dimension {d:?} in npy shape")))
        })
        .collect::<Result<Vec<usize>>>()?;

    Ok(Header {
        descr,
        fortran_order,
        shape,
    })
}

pub fn parse(bytes: &[u8]) -> Result<NpyArray> {
    if bytes.len() < 10 || !bytes.starts_with(MAGIC) {
        return Err(asset("not an npy payload"));
    }

    let major = bytes[6];
    let (header_len, header_start): (usize, usize) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(asset("truncated npy header"));
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        v => return Err(asset(format!("unsupported npy version {v}"))),
    };

    let data_start = header_start
        .checked_add(header_len)
        .ok_or_else(|| asset("npy header length overflows"))?;
    if bytes.len() < data_start {
        return Err(asset("truncated npy header"));
    }

    let header_text = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| asset("npy header is not text"))?;
    let header = parse_header(header_text)?;

    if header.fortran_order {
        return Err(asset("fortran-ordered arrays are not supported"));
    }

    let width = match header.descr.as_str() {
        "<f4" => 4,
        "<f8" => 8,
        other => return Err(asset(format!("unsupported npy dtype {other}"))),
    };

    let needed = header
        .shape
        .iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(*d))
        .and_then(|count| count.checked_mul(width))
        .ok_or_else(|| asset(format!("npy shape {:?} overflows", header.shape)))?;

    let payload = &bytes[data_start..];
    if payload.len() < needed {
        return Err(asset(format!(
            "npy data holds {} bytes, shape {:?} needs {}",
            payload.len(),
            header.shape,
            needed
        )));
    }

    let data: Vec<f64> = payload[..needed]
        .chunks_exact(width)
        .map(|chunk| match chunk {
            [b0, b1, b2, b3] => f32::from_le_bytes([*b0, *b1, *b2, *b3]) as f64,
            _ => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                f64::from_le_bytes(buf)
            }
        })
        .collect();

    Ok(NpyArray {
        descr: header.descr,
        shape: header.shape,
        data,
    })
}

fn number(x: f64) -> Value {
    Number::from_f64(x).map(Value::Number).unwrap_or(Value::Null)
}

fn nest(shape: &[usize], data: &[f64]) -> Value {
    match shape {
        [] => data.first().map_or(Value::Null, |x| number(*x)),
        [_] => Value::Array(data.iter().map(|x| number(*x)).collect()),
        [outer, inner @ ..] => {
            let stride: usize = inner.iter().product();
            Value::Array(
                (0..*outer)
                    .map(|i| nest(inner, &data[i * stride..(i + 1) * stride]))
                    .collect(),
            )
        }
    }
}

impl NpyArray {
    /// Nested JSON lists following `shape`; non-finite values become `null`.
    pub fn to_json(&self) -> Value {
        nest(&self.shape, &self.data)
    }
}

#[cfg(test)]
pub(crate) fn encode_f32(shape: &[usize], values: &[f32]) -> Vec<u8> {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    let shape_text = match dims.len() {
        1 => format!("({},)", dims[0]),
        _ => format!("({})", dims.join(", ")),
    };
    let mut header = format!("{{'descr': '<f4', 'fortran_order': False, 'shape': {shape_text}, }}");
    while (10 + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');

    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}
