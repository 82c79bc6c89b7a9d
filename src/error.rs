//! Error types for mcbin
//!
//! Provides a unified error type for all client operations.
//!
//! Expected cache states (a missing key on `get`, an existing key on `add`,
//! ...) are never reported through this type; they come back as ordinary
//! return values from the [`Client`](crate::Client) methods.

use std::io;

use thiserror::Error;

use crate::protocol::{Packet, Status};

/// Result type alias using McError
pub type Result<T> = std::result::Result<T, McError>;

/// Unified error type for mcbin operations
#[derive(Debug, Error)]
pub enum McError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Failed to connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("Failed to exchange command with {addr}: {reason}")]
    Send { addr: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    #[error("Protocol error 0x{:04x}: {message}", .status.code())]
    Protocol {
        status: Status,
        message: String,
        packet: Box<Packet>,
    },

    // -------------------------------------------------------------------------
    // Value Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl McError {
    /// Build a protocol error from a response carrying a nonzero status
    pub fn protocol(packet: Packet) -> Self {
        let status = packet.outcome();
        Self::Protocol {
            status,
            message: status.as_str().to_string(),
            packet: Box::new(packet),
        }
    }

    /// Status of a protocol error, if this is one
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error came from a read that ran out of time
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Send { reason, .. } => reason.starts_with("timed out"),
            Self::Io(e) => matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut),
            _ => false,
        }
    }
}

impl From<bincode::Error> for McError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
