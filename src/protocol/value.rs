//! Typed values
//!
//! The wire only carries bytes. The low nibble of the flags word stored
//! alongside an item records which `Value` variant produced those bytes, so
//! a later read can rebuild the same variant.
//!
//! ## Type Tags
//! - 0: STRING         - raw bytes (UTF-8 text or binary)
//! - 1: LONG           - ASCII decimal i64
//! - 2: DOUBLE         - ASCII decimal f64
//! - 3: BOOL           - "1" / "0"
//! - 4: SERIALIZED     - bincode, fixed-width integers
//! - 5: ALT_SERIALIZED - bincode, varint integers
//!
//! Any other tag is handed back untouched as [`Value::Raw`].

use std::fmt;

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{McError, Result};

/// Bits of the flags word that hold the type tag
pub const TYPE_MASK: u32 = 0x0f;

/// Type tag stored in the low nibble of the flags word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeTag {
    String = 0,
    Long = 1,
    Double = 2,
    Bool = 3,
    Serialized = 4,
    AltSerialized = 5,
}

impl TypeTag {
    /// Extract the tag from a flags word
    pub fn from_flags(flags: u32) -> Option<Self> {
        match flags & TYPE_MASK {
            0 => Some(TypeTag::String),
            1 => Some(TypeTag::Long),
            2 => Some(TypeTag::Double),
            3 => Some(TypeTag::Bool),
            4 => Some(TypeTag::Serialized),
            5 => Some(TypeTag::AltSerialized),
            _ => None,
        }
    }

    pub fn flags(self) -> u32 {
        self as u32
    }
}

/// A value stored in or read from the cache
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 text
    String(String),

    /// Binary-safe string, stored with the STRING tag
    Bytes(Vec<u8>),

    Long(i64),

    Double(f64),

    Bool(bool),

    /// Opaque blob in the primary serialized format
    Serialized(Vec<u8>),

    /// Opaque blob in the alternate serialized format
    AltSerialized(Vec<u8>),

    /// Item whose flags carry a tag this client does not know
    Raw { flags: u32, bytes: Vec<u8> },
}

impl Value {
    // =========================================================================
    // Wire Conversion
    // =========================================================================

    /// Flags word and payload bytes for storing this value
    pub fn encode(&self) -> (u32, Vec<u8>) {
        match self {
            Value::String(s) => (TypeTag::String.flags(), s.as_bytes().to_vec()),
            Value::Bytes(b) => (TypeTag::String.flags(), b.clone()),
            Value::Long(n) => (TypeTag::Long.flags(), n.to_string().into_bytes()),
            Value::Double(x) => (TypeTag::Double.flags(), x.to_string().into_bytes()),
            Value::Bool(b) => {
                let text: &[u8] = if *b { b"1" } else { b"0" };
                (TypeTag::Bool.flags(), text.to_vec())
            }
            Value::Serialized(blob) => (TypeTag::Serialized.flags(), blob.clone()),
            Value::AltSerialized(blob) => (TypeTag::AltSerialized.flags(), blob.clone()),
            Value::Raw { flags, bytes } => (*flags, bytes.clone()),
        }
    }

    /// Rebuild a value from the flags word and payload of a stored item
    pub fn decode(flags: u32, bytes: &[u8]) -> Result<Self> {
        let tag = match TypeTag::from_flags(flags) {
            Some(tag) => tag,
            None => {
                return Ok(Value::Raw {
                    flags,
                    bytes: bytes.to_vec(),
                })
            }
        };

        match tag {
            TypeTag::String => Ok(match std::str::from_utf8(bytes) {
                Ok(text) => Value::String(text.to_string()),
                Err(_) => Value::Bytes(bytes.to_vec()),
            }),
            TypeTag::Long => parse_text(bytes, "integer").map(Value::Long),
            TypeTag::Double => parse_text(bytes, "float").map(Value::Double),
            TypeTag::Bool => Ok(Value::Bool(!(bytes.is_empty() || bytes == b"0"))),
            TypeTag::Serialized => Ok(Value::Serialized(bytes.to_vec())),
            TypeTag::AltSerialized => Ok(Value::AltSerialized(bytes.to_vec())),
        }
    }

    // =========================================================================
    // Generic Serialization
    // =========================================================================

    /// Serialize any serde value into the primary blob format
    pub fn serialize<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Value::Serialized(bincode::serialize(value)?))
    }

    /// Serialize any serde value into the alternate blob format
    pub fn serialize_alt<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Value::AltSerialized(bincode::DefaultOptions::new().serialize(value)?))
    }

    /// Deserialize a blob produced by [`Value::serialize`] or
    /// [`Value::serialize_alt`]
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Value::Serialized(blob) => Ok(bincode::deserialize(blob)?),
            Value::AltSerialized(blob) => Ok(bincode::DefaultOptions::new().deserialize(blob)?),
            other => Err(McError::Serialization(format!(
                "expected a serialized value, got {}",
                other.type_name()
            ))),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Payload bytes of any string-like or blob variant
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(s.as_bytes()),
            Value::Bytes(b) | Value::Serialized(b) | Value::AltSerialized(b) => Some(b.as_slice()),
            Value::Raw { bytes, .. } => Some(bytes.as_slice()),
            _ => None,
        }
    }

    /// Variant name, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Bool(_) => "bool",
            Value::Serialized(_) => "serialized",
            Value::AltSerialized(_) => "alt-serialized",
            Value::Raw { .. } => "raw",
        }
    }
}

fn parse_text<T: std::str::FromStr>(bytes: &[u8], kind: &str) -> Result<T> {
    // Counters rewritten in place may carry trailing padding
    std::str::from_utf8(bytes)
        .ok()
        .map(str::trim)
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| {
            McError::Serialization(format!(
                "cannot parse {:?} as {}",
                String::from_utf8_lossy(bytes),
                kind
            ))
        })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Long(n) => write!(f, "{}", n),
            Value::Double(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Bytes(b) | Value::Serialized(b) | Value::AltSerialized(b) => {
                write!(f, "<{} {} bytes>", self.type_name(), b.len())
            }
            Value::Raw { flags, bytes } => {
                write!(f, "<raw flags=0x{:08x} {} bytes>", flags, bytes.len())
            }
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Double(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}
