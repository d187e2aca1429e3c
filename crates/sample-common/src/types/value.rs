//! Field values.
//!
//! The store distinguishes only three kinds of column content: null,
//! integral, and textual/binary. The integration layer that maps a host's
//! column types onto these is responsible for choosing the variant.

use std::fmt;

use bytes::Bytes;

/// One field of a row.
///
/// Integers are always carried as `i64`; the codec picks the narrowest
/// encoded width on its own. Text and binary columns share the `Bytes`
/// variant, which keeps decoded strings zero-copy slices of the row buffer.
///
/// # Example
///
/// ```rust
/// use sample_common::types::Value;
///
/// let id = Value::from(42_i32);
/// let name = Value::from("alice");
/// let missing = Value::from(None::<i64>);
///
/// assert_eq!(id.as_int(), Some(42));
/// assert_eq!(name.as_bytes(), Some(&b"alice"[..]));
/// assert!(missing.is_null());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    /// SQL NULL.
    #[default]
    Null,
    /// Any integral column.
    Int(i64),
    /// Any textual or binary column.
    Bytes(Bytes),
}

impl Value {
    /// Creates a byte value by copying a slice.
    #[inline]
    #[must_use]
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(bytes))
    }

    /// Returns true if this is a null.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer, if this is an integral value.
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the bytes, if this is a textual or binary value.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the bytes as UTF-8 text, if they are valid.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::copy_from_slice(s.as_bytes())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(v))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Self::Bytes(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) if b.len() <= 64 => write!(f, "Bytes({s:?})"),
                _ => write!(f, "Bytes(<{} bytes>)", b.len()),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}
