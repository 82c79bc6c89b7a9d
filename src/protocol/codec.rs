//! Protocol codec
//!
//! Encoding and decoding functions for the binary wire protocol.
//!
//! ## Wire Format
//!
//! ### Header (24 bytes, big-endian)
//! ```text
//! ┌─────────┬─────────┬──────────────┬────────────┬────────────┬────────────┐
//! │Magic (1)│Opcode(1)│ Key len (2)  │ Extras (1) │DataType (1)│ Status (2) │
//! ├─────────┴─────────┴──────────────┴────────────┴────────────┴────────────┤
//! │ Total body length (4)                                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │ Opaque (4)                                                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │ CAS high word (4)                │ CAS low word (4)                     │
//! └──────────────────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! ### Body (total body length bytes)
//! ```text
//! ┌──────────────┬──────────────┬─────────────────────────────┐
//! │   Extras     │     Key      │           Value             │
//! └──────────────┴──────────────┴─────────────────────────────┘
//! ```
//! The value is whatever remains after extras and key.

use std::io::{self, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{McError, Result};
use super::packet::{Packet, HEADER_SIZE, REQUEST_MAGIC};

/// Maximum body size accepted from a stream (2 MB)
pub const MAX_BODY_SIZE: u32 = 2 * 1024 * 1024;

/// Offset of the total body length field inside the header
const BODY_LEN_OFFSET: usize = 8;

// =============================================================================
// Encoding
// =============================================================================

/// Encode a request frame
///
/// Always emits the request magic and a zero status, whatever the packet
/// carries in those fields.
pub fn encode_request(packet: &Packet) -> Result<Bytes> {
    encode_frame(packet, REQUEST_MAGIC, 0)
}

/// Encode a response frame with the packet's own magic and status
pub fn encode_response(packet: &Packet) -> Result<Bytes> {
    encode_frame(packet, packet.magic, packet.status)
}

fn encode_frame(packet: &Packet, magic: u8, status: u16) -> Result<Bytes> {
    let key_len = u16::try_from(packet.key.len()).map_err(|_| {
        McError::InvalidArgument(format!(
            "key of {} bytes does not fit the 16-bit key length field",
            packet.key.len()
        ))
    })?;
    let extras_len = u8::try_from(packet.extras.len()).map_err(|_| {
        McError::InvalidArgument(format!(
            "extras of {} bytes do not fit the 8-bit extras length field",
            packet.extras.len()
        ))
    })?;
    let body_len = u32::try_from(packet.body_len()).map_err(|_| {
        McError::InvalidArgument(format!(
            "body of {} bytes does not fit the 32-bit length field",
            packet.body_len()
        ))
    })?;
    let (cas_high, cas_low) = packet.cas_words();

    let mut frame = BytesMut::with_capacity(HEADER_SIZE + packet.body_len());
    frame.put_u8(magic);
    frame.put_u8(packet.opcode);
    frame.put_u16(key_len);
    frame.put_u8(extras_len);
    frame.put_u8(packet.data_type);
    frame.put_u16(status);
    frame.put_u32(body_len);
    frame.put_u32(packet.opaque);
    frame.put_u32(cas_high);
    frame.put_u32(cas_low);

    frame.put_slice(&packet.extras);
    frame.put_slice(&packet.key);
    frame.put_slice(&packet.value);

    Ok(frame.freeze())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode one frame from the front of `bytes`
///
/// Bytes past the end of the frame are ignored.
pub fn decode_packet(bytes: &[u8]) -> Result<Packet> {
    if bytes.len() < HEADER_SIZE {
        return Err(McError::MalformedPacket(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    // Parse header
    let mut header = &bytes[..HEADER_SIZE];
    let magic = header.get_u8();
    let opcode = header.get_u8();
    let key_len = header.get_u16() as usize;
    let extras_len = header.get_u8() as usize;
    let data_type = header.get_u8();
    let status = header.get_u16();
    let body_len = header.get_u32() as usize;
    let opaque = header.get_u32();
    let cas_high = header.get_u32() as u64;
    let cas_low = header.get_u32() as u64;

    let available = bytes.len() - HEADER_SIZE;
    if available < body_len {
        return Err(McError::MalformedPacket(format!(
            "Incomplete body: expected {} bytes, got {}",
            body_len, available
        )));
    }

    if extras_len + key_len > body_len {
        return Err(McError::MalformedPacket(format!(
            "Body of {} bytes cannot hold {} extras bytes and {} key bytes",
            body_len, extras_len, key_len
        )));
    }

    // Split body: [extras][key][value]
    let body = &bytes[HEADER_SIZE..HEADER_SIZE + body_len];
    let (extras, rest) = body.split_at(extras_len);
    let (key, value) = rest.split_at(key_len);

    Ok(Packet {
        magic,
        opcode,
        data_type,
        status,
        opaque,
        cas: (cas_high << 32) | cas_low,
        extras: Bytes::copy_from_slice(extras),
        key: Bytes::copy_from_slice(key),
        value: Bytes::copy_from_slice(value),
    })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame from a stream
///
/// Reads exactly `24 + body length` bytes. Returns `Ok(None)` if the stream
/// ends before the first byte of a frame, and `MalformedPacket` if it ends
/// part way through one.
pub fn read_packet<R: Read>(reader: &mut R) -> Result<Option<Packet>> {
    // Read header first
    let mut header = [0u8; HEADER_SIZE];
    let read = read_full(reader, &mut header)?;
    if read == 0 {
        return Ok(None);
    }
    if read < HEADER_SIZE {
        return Err(McError::MalformedPacket(format!(
            "Stream closed after {} of {} header bytes",
            read, HEADER_SIZE
        )));
    }

    // Parse body length
    let body_len = u32::from_be_bytes([
        header[BODY_LEN_OFFSET],
        header[BODY_LEN_OFFSET + 1],
        header[BODY_LEN_OFFSET + 2],
        header[BODY_LEN_OFFSET + 3],
    ]);

    // Validate body length
    if body_len > MAX_BODY_SIZE {
        return Err(McError::MalformedPacket(format!(
            "Body too large: {} bytes (max {})",
            body_len, MAX_BODY_SIZE
        )));
    }

    // Read body into the same buffer
    let mut frame = Vec::with_capacity(HEADER_SIZE + body_len as usize);
    frame.extend_from_slice(&header);
    frame.resize(HEADER_SIZE + body_len as usize, 0);
    let read = read_full(reader, &mut frame[HEADER_SIZE..])?;
    if read < body_len as usize {
        return Err(McError::MalformedPacket(format!(
            "Stream closed after {} of {} body bytes",
            read, body_len
        )));
    }

    decode_packet(&frame).map(Some)
}

/// Read frames one at a time and hand each to `on_packet` until it returns
/// `false`
///
/// Nothing past the frame that stopped the loop is read. Returns the number
/// of frames consumed.
pub fn read_packets_while<R, F>(reader: &mut R, mut on_packet: F) -> Result<usize>
where
    R: Read,
    F: FnMut(Packet) -> Result<bool>,
{
    let mut count = 0;
    loop {
        let packet = read_packet(reader)?.ok_or_else(|| {
            McError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream closed before the terminal packet",
            ))
        })?;
        count += 1;
        if !on_packet(packet)? {
            return Ok(count);
        }
    }
}

/// Write a request frame to a stream
pub fn write_request<W: Write>(writer: &mut W, packet: &Packet) -> Result<()> {
    let bytes = encode_request(packet)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Write a response frame to a stream
pub fn write_response<W: Write>(writer: &mut W, packet: &Packet) -> Result<()> {
    let bytes = encode_response(packet)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Fill `buf` as far as the stream allows, returning the bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
