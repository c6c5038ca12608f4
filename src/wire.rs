// src/wire.rs

//! Primitive read/write helpers shared by the encoder, decoder and inspector.
//!
//! Every multi-byte quantity is little-endian. Writers append to a `Vec<u8>`;
//! the [`Reader`] is a forward-only cursor that checks the remaining length
//! before every read.

use crate::error::{BorshError, Result};

/// Size of a length or count prefix.
pub const LEN_PREFIX: usize = 4;

pub(crate) fn check_int_width(width: u8) -> Result<usize> {
    match width {
        1 | 2 | 4 | 8 | 16 => Ok(usize::from(width)),
        other => Err(BorshError::Unsupported(format!(
            "integer width of {other} bytes"
        ))),
    }
}

/// Writes the low `width` bytes of `value`.
pub(crate) fn write_uint(out: &mut Vec<u8>, value: u128, width: u8) -> Result<()> {
    let w = check_int_width(width)?;
    if w < 16 && value >> (w * 8) != 0 {
        return Err(BorshError::Unsupported(format!(
            "{value} does not fit in {w} unsigned bytes"
        )));
    }
    out.extend_from_slice(&value.to_le_bytes()[..w]);
    Ok(())
}

/// Writes the low `width` bytes of the two's complement of `value`.
pub(crate) fn write_int(out: &mut Vec<u8>, value: i128, width: u8) -> Result<()> {
    let w = check_int_width(width)?;
    if w < 16 {
        let bits = w * 8;
        let min = -(1i128 << (bits - 1));
        let max = (1i128 << (bits - 1)) - 1;
        if value < min || value > max {
            return Err(BorshError::Unsupported(format!(
                "{value} does not fit in {w} signed bytes"
            )));
        }
    }
    out.extend_from_slice(&value.to_le_bytes()[..w]);
    Ok(())
}

/// Writes an IEEE-754 float. A 4-byte float only accepts values an `f32`
/// holds exactly; NaN passes through.
pub(crate) fn write_float(out: &mut Vec<u8>, value: f64, width: u8) -> Result<()> {
    match width {
        4 => {
            let narrowed = value as f32;
            if f64::from(narrowed) != value && !value.is_nan() {
                return Err(BorshError::Unsupported(format!(
                    "{value} is not representable as a 4-byte float"
                )));
            }
            out.extend_from_slice(&narrowed.to_le_bytes());
        }
        8 => out.extend_from_slice(&value.to_le_bytes()),
        other => {
            return Err(BorshError::Unsupported(format!(
                "float width of {other} bytes"
            )));
        }
    }
    Ok(())
}

/// Writes a `u32` length prefix.
pub(crate) fn write_len(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| {
        BorshError::Unsupported(format!("length {len} exceeds the u32 prefix"))
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

/// A bounds-checked forward cursor over an input buffer.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Starts reading at the beginning of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Consumes exactly `n` bytes.
    ///
    /// # Errors
    ///
    /// [`BorshError::Truncated`] if fewer than `n` bytes remain; the cursor
    /// does not move.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(BorshError::Truncated {
                needed: n,
                remaining,
            });
        }
        let bytes = self.buf.get(self.pos..self.pos + n).ok_or(BorshError::Truncated {
            needed: n,
            remaining,
        })?;
        self.pos += n;
        Ok(bytes)
    }

    /// Consumes a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Consumes a `u32` length prefix.
    pub fn read_len(&mut self) -> Result<usize> {
        let mut raw = [0u8; LEN_PREFIX];
        raw.copy_from_slice(self.take(LEN_PREFIX)?);
        usize::try_from(u32::from_le_bytes(raw))
            .map_err(|_| BorshError::Malformed("length prefix exceeds usize".into()))
    }

    /// Consumes `width` bytes as an unsigned integer.
    pub fn read_uint(&mut self, width: u8) -> Result<u128> {
        let w = check_int_width(width)?;
        let mut raw = [0u8; 16];
        raw[..w].copy_from_slice(self.take(w)?);
        Ok(u128::from_le_bytes(raw))
    }

    /// Consumes `width` bytes as a two's complement integer, sign-extending.
    pub fn read_int(&mut self, width: u8) -> Result<i128> {
        let w = check_int_width(width)?;
        let bytes = self.take(w)?;
        let negative = bytes[w - 1] & 0x80 != 0;
        let mut raw = if negative { [0xFF; 16] } else { [0u8; 16] };
        raw[..w].copy_from_slice(bytes);
        Ok(i128::from_le_bytes(raw))
    }

    /// Consumes an IEEE-754 float of `width` bytes.
    pub fn read_float(&mut self, width: u8) -> Result<f64> {
        match width {
            4 => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(self.take(4)?);
                Ok(f64::from(f32::from_le_bytes(raw)))
            }
            8 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(self.take(8)?);
                Ok(f64::from_le_bytes(raw))
            }
            other => Err(BorshError::Unsupported(format!(
                "float width of {other} bytes"
            ))),
        }
    }
}
