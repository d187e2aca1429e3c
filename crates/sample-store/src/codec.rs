//! Row encoding and decoding.
//!
//! This module packs an ordered list of field values into a single
//! contiguous buffer and walks such buffers back into values.
//!
//! # Encoding Format
//!
//! Fields are written back to back in declared column order with no
//! padding and no row-level header. Each field starts with a one-byte tag:
//!
//! | Tag | Name       | Payload                                      |
//! |-----|------------|----------------------------------------------|
//! | 1   | Null       | none                                         |
//! | 2   | Int8       | 1 byte                                       |
//! | 3   | Int32      | 4 bytes, little-endian                       |
//! | 4   | Int64      | 8 bytes, little-endian                       |
//! | 5   | String     | `u32` stored length + `u32` real length + data |
//! | 6   | TinyString | `u8` length + data (at most 255 bytes)       |
//!
//! The end of a row is never recorded; it is found by walking the tags
//! from offset 0. Random access to a field is therefore O(column index).
//!
//! The long-string form carries two lengths so the format can later hold
//! compressed payloads. Today both are always equal, and the decoder
//! rejects rows where they differ.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use sample_common::constants::{
    LONG_LENGTH_SIZE, MAX_FIELD_LENGTH, TAG_SIZE, TINY_LENGTH_SIZE, TINY_STRING_MAX,
};
use sample_common::{SampleError, SampleResult, Value};

/// Type tags for the packed field encoding.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTag {
    /// SQL NULL, no payload.
    Null = 1,
    /// Integer that fits in `i8`.
    Int8 = 2,
    /// Integer that fits in `i32`.
    Int32 = 3,
    /// Any other integer.
    Int64 = 4,
    /// Byte string of 256 bytes or more.
    String = 5,
    /// Byte string of at most 255 bytes.
    TinyString = 6,
}

impl FieldTag {
    /// Decodes a tag byte.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(FieldTag::Null),
            2 => Some(FieldTag::Int8),
            3 => Some(FieldTag::Int32),
            4 => Some(FieldTag::Int64),
            5 => Some(FieldTag::String),
            6 => Some(FieldTag::TinyString),
            _ => None,
        }
    }

    /// Picks the tag a value will be encoded with.
    pub fn for_value(value: &Value) -> Self {
        match value {
            Value::Null => FieldTag::Null,
            Value::Int(v) => {
                if i8::try_from(*v).is_ok() {
                    FieldTag::Int8
                } else if i32::try_from(*v).is_ok() {
                    FieldTag::Int32
                } else {
                    FieldTag::Int64
                }
            }
            Value::Bytes(b) if b.len() <= TINY_STRING_MAX => FieldTag::TinyString,
            Value::Bytes(_) => FieldTag::String,
        }
    }
}

/// A single encoded row.
///
/// Rows are immutable once encoded. Cloning is cheap (reference counted),
/// but the store itself never shares a row: it moves from the writer into
/// a table and from the table out to exactly one reader.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedRow(Bytes);

impl EncodedRow {
    /// Wraps an already-encoded buffer.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self(bytes)
    }

    /// Returns the length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the buffer is empty (a zero-column row).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the buffer as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the underlying `Bytes`.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl std::fmt::Debug for EncodedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncodedRow({} bytes)", self.0.len())
    }
}

/// Row codec for one table.
///
/// The codec only needs the declared column count, which decoding uses to
/// know how many fields to walk.
#[derive(Debug, Clone, Copy)]
pub struct RowCodec {
    /// Number of columns per row.
    width: usize,
}

impl RowCodec {
    /// Creates a codec for rows of `width` columns.
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    /// Returns the column count.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Encodes a row.
    ///
    /// Integers are classified by range and strings by length. Callers
    /// check byte values with [`field_length_fits`] first.
    ///
    /// # Panics
    ///
    /// Panics if a byte value is longer than `u32::MAX` bytes.
    pub fn encode(&self, fields: &[Value]) -> EncodedRow {
        let total: usize = fields.iter().map(encoded_width).sum();
        let mut buf = BytesMut::with_capacity(total);

        for value in fields {
            encode_field(value, &mut buf);
        }

        debug_assert_eq!(buf.len(), total);
        EncodedRow(buf.freeze())
    }

    /// Decodes a row into exactly `width` values.
    ///
    /// Fails with a format error if the buffer runs out before `width`
    /// fields have been read.
    pub fn decode(&self, row: &EncodedRow) -> SampleResult<Vec<Value>> {
        let mut values = Vec::with_capacity(self.width);
        let mut offset = 0;

        for column in 0..self.width {
            if offset >= row.0.len() {
                return Err(SampleError::format(
                    offset,
                    format!("row ends after {column} of {} fields", self.width),
                ));
            }
            let (value, consumed) = decode_field(&row.0, offset)?;
            values.push(value);
            offset += consumed;
        }

        Ok(values)
    }

    /// Decodes a single field without decoding the rest of the row.
    pub fn read_field(&self, row: &EncodedRow, column: usize) -> SampleResult<Value> {
        if column >= self.width {
            return Err(SampleError::format(
                0,
                format!("column {column} out of range for width {}", self.width),
            ));
        }
        let offset = field_at(&row.0, column)?;
        let (value, _) = decode_field(&row.0, offset)?;
        Ok(value)
    }

    /// Recomputes the length of a row by walking its fields.
    pub fn encoded_len(&self, row: &EncodedRow) -> SampleResult<usize> {
        let mut offset = 0;
        for _ in 0..self.width {
            offset += width_at(&row.0, offset)?;
        }
        Ok(offset)
    }
}

/// Returns true if a byte value of `len` bytes can be encoded.
pub fn field_length_fits(len: usize) -> bool {
    len <= MAX_FIELD_LENGTH
}

/// Returns the number of bytes `value` occupies once encoded, tag included.
pub fn encoded_width(value: &Value) -> usize {
    TAG_SIZE
        + match value {
            Value::Null => 0,
            Value::Int(_) => match FieldTag::for_value(value) {
                FieldTag::Int8 => 1,
                FieldTag::Int32 => 4,
                _ => 8,
            },
            Value::Bytes(b) if b.len() <= TINY_STRING_MAX => TINY_LENGTH_SIZE + b.len(),
            Value::Bytes(b) => 2 * LONG_LENGTH_SIZE + b.len(),
        }
}

fn encode_field(value: &Value, buf: &mut BytesMut) {
    let tag = FieldTag::for_value(value);
    buf.put_u8(tag as u8);

    match value {
        Value::Null => {}
        Value::Int(v) => match tag {
            FieldTag::Int8 => buf.put_i8(*v as i8),
            FieldTag::Int32 => buf.put_i32_le(*v as i32),
            _ => buf.put_i64_le(*v),
        },
        Value::Bytes(b) => {
            if tag == FieldTag::TinyString {
                buf.put_u8(b.len() as u8);
            } else {
                assert!(
                    field_length_fits(b.len()),
                    "field of {} bytes exceeds the long-string limit",
                    b.len()
                );
                // Stored and real length; equal until payloads are compressed.
                buf.put_u32_le(b.len() as u32);
                buf.put_u32_le(b.len() as u32);
            }
            buf.put_slice(b);
        }
    }
}

/// Returns the encoded width of the field starting at `buf[0]`.
pub fn field_width(buf: &[u8]) -> SampleResult<usize> {
    width_at(buf, 0)
}

/// Returns the offset of field `column` by walking the preceding fields.
pub fn field_at(buf: &[u8], column: usize) -> SampleResult<usize> {
    let mut offset = 0;
    for _ in 0..column {
        offset += width_at(buf, offset)?;
    }
    if offset >= buf.len() {
        return Err(SampleError::format(
            offset,
            format!("row has no field {column}"),
        ));
    }
    Ok(offset)
}

fn width_at(buf: &[u8], offset: usize) -> SampleResult<usize> {
    let field = buf
        .get(offset..)
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| SampleError::format(offset, "unexpected end of row"))?;

    let tag = FieldTag::from_u8(field[0])
        .ok_or_else(|| SampleError::format(offset, format!("unknown field tag {}", field[0])))?;

    let width = match tag {
        FieldTag::Null => TAG_SIZE,
        FieldTag::Int8 => TAG_SIZE + 1,
        FieldTag::Int32 => TAG_SIZE + 4,
        FieldTag::Int64 => TAG_SIZE + 8,
        FieldTag::TinyString => {
            let len = *field
                .get(TAG_SIZE)
                .ok_or_else(|| SampleError::format(offset, "missing string length"))?;
            TAG_SIZE + TINY_LENGTH_SIZE + usize::from(len)
        }
        FieldTag::String => {
            if field.len() < TAG_SIZE + 2 * LONG_LENGTH_SIZE {
                return Err(SampleError::format(offset, "missing string lengths"));
            }
            let mut lengths = &field[TAG_SIZE..];
            let stored = lengths.get_u32_le() as usize;
            TAG_SIZE + 2 * LONG_LENGTH_SIZE + stored
        }
    };

    if field.len() < width {
        return Err(SampleError::format(
            offset,
            format!("{tag:?} field needs {width} bytes, {} remain", field.len()),
        ));
    }
    Ok(width)
}

/// Decodes the field at `offset`, returning it with its encoded width.
fn decode_field(buf: &Bytes, offset: usize) -> SampleResult<(Value, usize)> {
    let width = width_at(buf, offset)?;
    let mut payload = &buf[offset + TAG_SIZE..offset + width];

    let value = match FieldTag::from_u8(buf[offset]) {
        Some(FieldTag::Null) => Value::Null,
        Some(FieldTag::Int8) => Value::Int(i64::from(payload.get_i8())),
        Some(FieldTag::Int32) => Value::Int(i64::from(payload.get_i32_le())),
        Some(FieldTag::Int64) => Value::Int(payload.get_i64_le()),
        Some(FieldTag::TinyString) => {
            let start = offset + TAG_SIZE + TINY_LENGTH_SIZE;
            Value::Bytes(buf.slice(start..offset + width))
        }
        Some(FieldTag::String) => {
            let stored = payload.get_u32_le();
            let real = payload.get_u32_le();
            if stored != real {
                return Err(SampleError::format(
                    offset,
                    format!("stored length {stored} differs from real length {real}"),
                ));
            }
            let start = offset + TAG_SIZE + 2 * LONG_LENGTH_SIZE;
            Value::Bytes(buf.slice(start..offset + width))
        }
        // width_at already rejected unknown tags
        None => return Err(SampleError::format(offset, "unknown field tag")),
    };

    Ok((value, width))
}
