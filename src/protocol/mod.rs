//! Protocol Module
//!
//! Defines the memcached binary wire protocol as seen from a client.
//!
//! ## Frame Format
//! ```text
//! ┌────────────────────┬────────────┬─────────────┬──────────────────────┐
//! │   Header (24)      │ Extras (n) │   Key (k)   │      Value (rest)    │
//! └────────────────────┴────────────┴─────────────┴──────────────────────┘
//! ```
//!
//! ### Magic
//! - 0x80: request
//! - 0x81: response
//!
//! ### Status Codes
//! - 0x0000: NO_ERROR
//! - 0x0001: KEY_NOT_FOUND
//! - 0x0002: KEY_EXISTS
//! - 0x0005: ITEM_NOT_STORED
//! - others: see [`Status`]

mod opcode;
mod status;
mod packet;
mod codec;
mod value;

pub use opcode::Opcode;
pub use status::Status;
pub use packet::{
    counter_extras, counter_value, expiration_extras, store_extras, Packet, HEADER_SIZE,
    REQUEST_MAGIC, RESPONSE_MAGIC,
};
pub use codec::{
    decode_packet, encode_request, encode_response, read_packet, read_packets_while,
    write_request, write_response, MAX_BODY_SIZE,
};
pub use value::{TypeTag, Value, TYPE_MASK};
