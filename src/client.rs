//! Client Module
//!
//! The command layer: typed cache operations over one shared connection.
//!
//! ## Responsibilities
//! - Build a request packet per operation
//! - Send it and wait for the response
//! - Classify the response status (success, soft outcome, error)
//! - Decode values and counters

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{McError, Result};
use crate::network::Connection;
use crate::protocol::{
    counter_extras, counter_value, expiration_extras, store_extras, Opcode, Packet, Status, Value,
};

/// Longest key the server accepts
pub const MAX_KEY_LENGTH: usize = 250;

/// A value together with the CAS token it was read with
#[derive(Debug, Clone, PartialEq)]
pub struct CasValue {
    pub value: Value,
    pub cas: u64,
}

/// Memcached client
///
/// ## Concurrency Model
///
/// The connection carries one request at a time and pairs responses with
/// requests by order alone. The client therefore holds `connection` locked
/// for a whole exchange, so one `Client` can be shared across threads
/// (`Arc<Client>`) with callers serialized. Use one client per thread for
/// parallel requests.
///
/// ## Outcomes
///
/// Expected cache states come back as values: a missing key is `None` or
/// `false`, an existing key on `add` is `false`. Any other nonzero status is
/// [`McError::Protocol`].
pub struct Client {
    /// Client configuration
    config: Config,

    /// The single stream to the server
    connection: Mutex<Connection>,
}

impl Client {
    /// Create a client; the stream is opened on first use
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let connection = Connection::new(&config);
        Ok(Self {
            config,
            connection: Mutex::new(connection),
        })
    }

    /// Create a client and open its stream immediately
    pub fn connect(config: Config) -> Result<Self> {
        let client = Self::new(config)?;
        client.connection.lock().connect(None)?;
        Ok(client)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connection.lock().is_connected()
    }

    /// Drop the stream; the next call reconnects
    pub fn close(&self) {
        self.connection.lock().close();
    }

    // =========================================================================
    // Retrieval
    // =========================================================================

    /// Get a value by key, `None` if absent
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.gets(key)?.map(|item| item.value))
    }

    /// Get a value and its CAS token, `None` if absent
    pub fn gets(&self, key: &str) -> Result<Option<CasValue>> {
        check_key(key)?;
        let request = Packet::request(Opcode::Get).with_key(key.as_bytes());
        let response = self.execute(&request)?;
        found_item(response)
    }

    /// Get several keys, one GETK request each
    ///
    /// Every requested key appears in the result, absent ones as `None`.
    pub fn get_multi<I, K>(&self, keys: I) -> Result<HashMap<String, Option<Value>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let items = self.get_multi_with_cas(keys)?;
        Ok(items
            .into_iter()
            .map(|(key, item)| (key, item.map(|item| item.value)))
            .collect())
    }

    /// Like [`Client::get_multi`], keeping each item's CAS token
    pub fn get_multi_with_cas<I, K>(&self, keys: I) -> Result<HashMap<String, Option<CasValue>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys: Vec<K> = keys.into_iter().collect();
        for key in &keys {
            check_key(key.as_ref())?;
        }

        let timeout = self.timeout();
        let mut connection = self.connection.lock();
        let mut items = HashMap::with_capacity(keys.len());

        for key in keys {
            let key = key.as_ref();
            let request = Packet::request(Opcode::GetK).with_key(key.as_bytes());
            let response = connection.send_command(&request, timeout)?;

            if !response.key.is_empty() && response.key != key.as_bytes() {
                return Err(McError::MalformedPacket(format!(
                    "GETK for {:?} answered for {:?}",
                    key,
                    String::from_utf8_lossy(&response.key)
                )));
            }
            items.insert(key.to_string(), found_item(response)?);
        }

        Ok(items)
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Store a value unconditionally
    pub fn set(&self, key: &str, value: impl Into<Value>, ttl: u32) -> Result<bool> {
        let response = self.store(Opcode::Set, key, &value.into(), ttl, 0)?;
        stored(response, &[])
    }

    /// Store only if the key does not exist; `false` if it does
    pub fn add(&self, key: &str, value: impl Into<Value>, ttl: u32) -> Result<bool> {
        let response = self.store(Opcode::Add, key, &value.into(), ttl, 0)?;
        stored(response, &[Status::KeyExists])
    }

    /// Store only if the key exists; `false` if it does not
    pub fn replace(&self, key: &str, value: impl Into<Value>, ttl: u32) -> Result<bool> {
        let response = self.store(Opcode::Replace, key, &value.into(), ttl, 0)?;
        stored(response, &[Status::KeyNotFound])
    }

    /// Store only if the item still carries `cas`; `false` on a conflict
    pub fn cas(&self, cas: u64, key: &str, value: impl Into<Value>, ttl: u32) -> Result<bool> {
        let response = self.store(Opcode::Set, key, &value.into(), ttl, cas)?;
        stored(response, &[Status::KeyExists])
    }

    /// Append raw bytes to an existing item; `false` if it is missing
    pub fn append(&self, key: &str, data: impl AsRef<[u8]>) -> Result<bool> {
        self.concat(Opcode::Append, key, data.as_ref())
    }

    /// Prepend raw bytes to an existing item; `false` if it is missing
    pub fn prepend(&self, key: &str, data: impl AsRef<[u8]>) -> Result<bool> {
        self.concat(Opcode::Prepend, key, data.as_ref())
    }

    /// Store several items, one SET request each
    ///
    /// The first nonzero status ends the batch with [`McError::Protocol`];
    /// items sent before it stay stored.
    pub fn set_multi<I, K, V>(&self, items: I, ttl: u32) -> Result<HashMap<String, bool>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let items: Vec<(K, Value)> = items
            .into_iter()
            .map(|(key, value)| (key, value.into()))
            .collect();
        for (key, _) in &items {
            check_key(key.as_ref())?;
        }

        let timeout = self.timeout();
        let mut connection = self.connection.lock();
        let mut results = HashMap::with_capacity(items.len());

        for (key, value) in items {
            let key = key.as_ref();
            let request = store_request(Opcode::Set, key, &value, ttl, 0);
            let response = connection.send_command(&request, timeout)?;
            results.insert(key.to_string(), stored(response, &[])?);
        }

        Ok(results)
    }

    // =========================================================================
    // Removal & Expiry
    // =========================================================================

    /// Delete a key; a key that is already gone counts as deleted
    pub fn delete(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        let request = Packet::request(Opcode::Delete).with_key(key.as_bytes());
        let response = self.execute(&request)?;
        match response.outcome() {
            Status::KeyNotFound => Ok(true),
            _ => response.ensure_success().map(|_| true),
        }
    }

    /// Set a new expiration; `false` if the key is missing
    pub fn touch(&self, key: &str, ttl: u32) -> Result<bool> {
        check_key(key)?;
        let request = Packet::request(Opcode::Touch)
            .with_key(key.as_bytes())
            .with_extras(expiration_extras(ttl));
        let response = self.execute(&request)?;
        stored(response, &[Status::KeyNotFound])
    }

    /// Invalidate every item, after `ttl` seconds when nonzero
    pub fn flush(&self, ttl: u32) -> Result<bool> {
        let request = Packet::request(Opcode::Flush).with_extras(expiration_extras(ttl));
        let response = self.execute(&request)?;
        stored(response, &[])
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Add `offset` to a counter, creating it with `initial` if missing
    pub fn increment(&self, key: &str, offset: u64, initial: u64, ttl: u32) -> Result<u64> {
        self.counter(Opcode::Increment, key, offset, initial, ttl)
    }

    /// Subtract `offset` from a counter (the server floors it at 0),
    /// creating it with `initial` if missing
    pub fn decrement(&self, key: &str, offset: u64, initial: u64, ttl: u32) -> Result<u64> {
        self.counter(Opcode::Decrement, key, offset, initial, ttl)
    }

    // =========================================================================
    // Server
    // =========================================================================

    /// Server version string
    pub fn version(&self) -> Result<String> {
        let response = self.execute(&Packet::request(Opcode::Version))?;
        Ok(response.ensure_success()?.value_text())
    }

    /// Server statistics, optionally for one category (`"items"`,
    /// `"slabs"`, ...)
    ///
    /// The server answers with one STAT packet per entry and ends the run
    /// with an empty-key packet.
    pub fn stats(&self, kind: Option<&str>) -> Result<HashMap<String, String>> {
        let mut request = Packet::request(Opcode::Stat);
        if let Some(kind) = kind {
            request = request.with_key(kind.as_bytes());
        }

        let mut stats = HashMap::new();
        let timeout = self.timeout();
        self.connection
            .lock()
            .send_and_collect(&request, timeout, |packet| {
                if !packet.is(Opcode::Stat) || packet.key.is_empty() {
                    return false;
                }
                let name = String::from_utf8_lossy(&packet.key).into_owned();
                stats.insert(name, packet.value_text());
                true
            })?;

        Ok(stats)
    }

    /// Round-trip an empty request
    pub fn noop(&self) -> Result<()> {
        let response = self.execute(&Packet::request(Opcode::Noop))?;
        response.ensure_success().map(|_| ())
    }

    /// Ask the server to close the connection, then drop the stream
    pub fn quit(&self) -> Result<()> {
        let timeout = self.timeout();
        let mut connection = self.connection.lock();
        let response = connection.send_command(&Packet::request(Opcode::Quit), timeout);
        connection.close();
        response?.ensure_success().map(|_| ())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn timeout(&self) -> Option<Duration> {
        self.config.timeout()
    }

    /// One request/response exchange under the connection lock
    fn execute(&self, request: &Packet) -> Result<Packet> {
        let timeout = self.timeout();
        self.connection.lock().send_command(request, timeout)
    }

    fn store(
        &self,
        opcode: Opcode,
        key: &str,
        value: &Value,
        ttl: u32,
        cas: u64,
    ) -> Result<Packet> {
        check_key(key)?;
        self.execute(&store_request(opcode, key, value, ttl, cas))
    }

    fn concat(&self, opcode: Opcode, key: &str, data: &[u8]) -> Result<bool> {
        check_key(key)?;
        let request = Packet::request(opcode)
            .with_key(key.as_bytes())
            .with_value(data.to_vec());
        let response = self.execute(&request)?;
        stored(response, &[Status::ItemNotStored])
    }

    fn counter(
        &self,
        opcode: Opcode,
        key: &str,
        offset: u64,
        initial: u64,
        ttl: u32,
    ) -> Result<u64> {
        check_key(key)?;
        let request = Packet::request(opcode)
            .with_key(key.as_bytes())
            .with_extras(counter_extras(offset, initial, ttl));
        let response = self.execute(&request)?.ensure_success()?;
        counter_value(&response.value)
    }
}

/// Build a SET/ADD/REPLACE request
fn store_request(opcode: Opcode, key: &str, value: &Value, ttl: u32, cas: u64) -> Packet {
    let (flags, bytes) = value.encode();
    Packet::request(opcode)
        .with_key(key.as_bytes())
        .with_value(bytes)
        .with_extras(store_extras(flags, ttl))
        .with_cas(cas)
}

/// `true` on success, `false` for a listed soft status, error otherwise
fn stored(response: Packet, soft: &[Status]) -> Result<bool> {
    let status = response.outcome();
    if status.is_success() {
        return Ok(true);
    }
    if soft.contains(&status) {
        tracing::debug!("{:?} not applied: {}", response.kind(), status);
        return Ok(false);
    }
    Err(McError::protocol(response))
}

/// Decode a GET/GETK response, `None` for a missing key
fn found_item(response: Packet) -> Result<Option<CasValue>> {
    if response.outcome() == Status::KeyNotFound {
        return Ok(None);
    }
    let response = response.ensure_success()?;
    let value = Value::decode(response.flags(), &response.value)?;
    Ok(Some(CasValue {
        value,
        cas: response.cas,
    }))
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(McError::InvalidKey("key must not be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(McError::InvalidKey(format!(
            "key of {} bytes exceeds {} bytes",
            key.len(),
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
