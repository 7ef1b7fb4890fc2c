use std::marker::PhantomData;

use byteorder::ByteOrder;

use crate::{PlyError, ScalarType};

/// Reads single typed values from a PLY body, one after another.
pub trait ScalarReader {
    fn read_scalar(&mut self, data_type: ScalarType) -> Result<f64, PlyError>;

    /// Read a list length. Negative counts read as an empty list.
    fn read_count(&mut self, count_type: ScalarType) -> Result<usize, PlyError> {
        // Float to int casts saturate, so negatives and NaN become 0.
        Ok(self.read_scalar(count_type)? as usize)
    }
}

/// Binary reader over the whole input with an explicit byte cursor.
pub struct BinValReader<'a, E: ByteOrder> {
    data: &'a [u8],
    offset: usize,
    _endian: PhantomData<E>,
}

impl<'a, E: ByteOrder> BinValReader<'a, E> {
    /// Start reading `data` at byte `offset`.
    pub(crate) fn new(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            offset,
            _endian: PhantomData,
        }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    fn take(&mut self, width: usize) -> Result<&'a [u8], PlyError> {
        let data = self.data;
        let bytes = self
            .offset
            .checked_add(width)
            .and_then(|end| data.get(self.offset..end))
            .ok_or(PlyError::OutOfBounds {
                offset: self.offset,
                width,
                len: data.len(),
            })?;
        self.offset += width;
        Ok(bytes)
    }
}

impl<E: ByteOrder> ScalarReader for BinValReader<'_, E> {
    fn read_scalar(&mut self, data_type: ScalarType) -> Result<f64, PlyError> {
        let bytes = self.take(data_type.size_bytes())?;
        Ok(match data_type {
            ScalarType::I8 => bytes[0] as i8 as f64,
            ScalarType::U8 => bytes[0] as f64,
            ScalarType::I16 => E::read_i16(bytes) as f64,
            ScalarType::U16 => E::read_u16(bytes) as f64,
            ScalarType::I32 => E::read_i32(bytes) as f64,
            ScalarType::U32 => E::read_u32(bytes) as f64,
            ScalarType::F32 => E::read_f32(bytes) as f64,
            ScalarType::F64 => E::read_f64(bytes),
        })
    }
}

/// ASCII reader over whitespace separated tokens.
///
/// Running out of tokens yields [`PlyError::TokensExhausted`], which the body decoder
/// treats as the end of usable data rather than a failure.
pub struct AsciiValReader<'a> {
    body: &'a [u8],
    pos: usize,
}

impl<'a> AsciiValReader<'a> {
    pub(crate) fn new(body: &'a [u8]) -> Self {
        Self { body, pos: 0 }
    }

    fn next_token(&mut self) -> Option<&'a [u8]> {
        let rest = &self.body[self.pos..];
        let start = rest.iter().position(|b| !b.is_ascii_whitespace())?;
        let len = rest[start..]
            .iter()
            .position(|b| b.is_ascii_whitespace())
            .unwrap_or(rest.len() - start);
        self.pos += start + len;
        Some(&rest[start..start + len])
    }
}

impl ScalarReader for AsciiValReader<'_> {
    fn read_scalar(&mut self, data_type: ScalarType) -> Result<f64, PlyError> {
        let token = self.next_token().ok_or(PlyError::TokensExhausted)?;
        parse_ascii_number(token, data_type)
    }
}

/// Parse a token with the numeric family of `data_type`.
///
/// Integer types truncate a fractional token toward zero.
pub(crate) fn parse_ascii_number(token: &[u8], data_type: ScalarType) -> Result<f64, PlyError> {
    let invalid = || PlyError::InvalidNumber(String::from_utf8_lossy(token).into_owned());
    let text = std::str::from_utf8(token).map_err(|_| invalid())?;

    if data_type.is_integer() {
        if let Ok(value) = text.parse::<i64>() {
            return Ok(value as f64);
        }
        text.parse::<f64>().map(f64::trunc).map_err(|_| invalid())
    } else {
        text.parse::<f64>().map_err(|_| invalid())
    }
}
