//! # mcbin
//!
//! A memcached client speaking the binary protocol:
//! - Typed values (string, integer, float, bool, serialized blobs)
//! - One persistent TCP connection, opened on demand
//! - Soft cache outcomes returned as values, not errors
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Client                               │
//! │        (get / set / add / incr / stats / get_multi ...)      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Packet
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Protocol Codec                             │
//! │         (24-byte header + extras/key/value body)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  bytes
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Connection                               │
//! │            (single TCP stream, framed reads)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use mcbin::{Client, Config, Value};
//!
//! let client = Client::new(Config::builder().host("127.0.0.1").port(11211).build())?;
//! client.set("greeting", "hello", 60)?;
//! assert_eq!(client.get("greeting")?, Some(Value::from("hello")));
//! # Ok::<(), mcbin::McError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{McError, Result};
pub use config::Config;
pub use client::{CasValue, Client};
pub use protocol::{Opcode, Packet, Status, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mcbin
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
