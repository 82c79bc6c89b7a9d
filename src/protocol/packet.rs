//! Packet definitions
//!
//! A `Packet` is the single wire-level entity, used for both requests and
//! responses. Packets are built once per call with the consuming `with_*`
//! methods and never mutated after they are sent or decoded.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{McError, Result};
use super::{Opcode, Status};

/// Fixed header size, independent of body size
pub const HEADER_SIZE: usize = 24;

/// Magic byte of a request frame
pub const REQUEST_MAGIC: u8 = 0x80;

/// Magic byte of a response frame
pub const RESPONSE_MAGIC: u8 = 0x81;

/// One binary protocol frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Request (0x80) or response (0x81)
    pub magic: u8,

    /// Raw opcode byte; see [`Packet::kind`]
    pub opcode: u8,

    /// Reserved, always 0
    pub data_type: u8,

    /// Response status, meaningless on requests
    pub status: u16,

    /// Echo token
    pub opaque: u32,

    /// Compare-and-swap token (two 32-bit words on the wire)
    pub cas: u64,

    pub extras: Bytes,
    pub key: Bytes,
    pub value: Bytes,
}

impl Packet {
    /// Create an empty request for `opcode`
    pub fn request(opcode: Opcode) -> Self {
        Self {
            magic: REQUEST_MAGIC,
            opcode: opcode as u8,
            data_type: 0,
            status: 0,
            opaque: 0,
            cas: 0,
            extras: Bytes::new(),
            key: Bytes::new(),
            value: Bytes::new(),
        }
    }

    /// Create an empty response for `opcode` carrying `status`
    pub fn response(opcode: Opcode, status: Status) -> Self {
        Self {
            magic: RESPONSE_MAGIC,
            status: status.code(),
            ..Self::request(opcode)
        }
    }

    pub fn with_key(mut self, key: &[u8]) -> Self {
        self.key = Bytes::copy_from_slice(key);
        self
    }

    pub fn with_value(mut self, value: impl Into<Bytes>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_extras(mut self, extras: impl Into<Bytes>) -> Self {
        self.extras = extras.into();
        self
    }

    pub fn with_cas(mut self, cas: u64) -> Self {
        self.cas = cas;
        self
    }

    pub fn with_opaque(mut self, opaque: u32) -> Self {
        self.opaque = opaque;
        self
    }

    /// Opcode classification, `None` for bytes outside the opcode table
    pub fn kind(&self) -> Option<Opcode> {
        Opcode::from_u8(self.opcode)
    }

    pub fn is(&self, opcode: Opcode) -> bool {
        self.opcode == opcode as u8
    }

    /// Status classification of a response
    pub fn outcome(&self) -> Status {
        Status::from_code(self.status)
    }

    /// Total body length: extras + key + value
    pub fn body_len(&self) -> usize {
        self.extras.len() + self.key.len() + self.value.len()
    }

    /// CAS token split into its (high, low) header words
    pub fn cas_words(&self) -> (u32, u32) {
        ((self.cas >> 32) as u32, self.cas as u32)
    }

    /// Leading 32-bit word of the extras, 0 when shorter than 4 bytes
    pub fn flags(&self) -> u32 {
        match self.extras.get(..4) {
            Some(word) => u32::from_be_bytes([word[0], word[1], word[2], word[3]]),
            None => 0,
        }
    }

    /// Value read as text, replacing invalid UTF-8
    pub fn value_text(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }

    /// Pass a successful response through, turn any other status into
    /// [`McError::Protocol`]
    pub fn ensure_success(self) -> Result<Self> {
        if self.outcome().is_success() {
            Ok(self)
        } else {
            Err(McError::protocol(self))
        }
    }
}

// =============================================================================
// Extras Layouts
// =============================================================================

/// SET/ADD/REPLACE extras: flags (4) + expiration (4)
pub fn store_extras(flags: u32, ttl: u32) -> Bytes {
    let mut extras = BytesMut::with_capacity(8);
    extras.put_u32(flags);
    extras.put_u32(ttl);
    extras.freeze()
}

/// TOUCH/FLUSH extras: expiration (4)
pub fn expiration_extras(ttl: u32) -> Bytes {
    Bytes::copy_from_slice(&ttl.to_be_bytes())
}

/// INCREMENT/DECREMENT extras: delta (8) + initial value (8) + expiration (4)
pub fn counter_extras(offset: u64, initial: u64, ttl: u32) -> Bytes {
    let mut extras = BytesMut::with_capacity(20);
    extras.put_u64(offset);
    extras.put_u64(initial);
    extras.put_u32(ttl);
    extras.freeze()
}

/// Reassemble a 64-bit counter from the two big-endian words of a response
/// value
pub fn counter_value(value: &[u8]) -> Result<u64> {
    if value.len() < 8 {
        return Err(McError::MalformedPacket(format!(
            "counter value: expected 8 bytes, got {}",
            value.len()
        )));
    }
    let high = u32::from_be_bytes([value[0], value[1], value[2], value[3]]) as u64;
    let low = u32::from_be_bytes([value[4], value[5], value[6], value[7]]) as u64;
    Ok((high << 32) | low)
}
