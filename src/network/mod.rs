//! Network Module
//!
//! TCP transport to the cache server.
//!
//! ## Architecture
//! - Exactly one stream per `Connection`, opened on first use
//! - Frames are read by header length: 24 bytes plus the body length
//!   stored at header offset 8
//! - One request in flight at a time

mod connection;

pub use connection::Connection;
