//! Codec Tests
//!
//! Tests for packet encoding/decoding and stream framing.

use std::io::Cursor;

use bytes::Bytes;
use mcbin::protocol::{
    decode_packet, encode_request, encode_response, read_packet, read_packets_while,
    store_extras, write_request, write_response, Opcode, Packet, Status, HEADER_SIZE,
    MAX_BODY_SIZE, REQUEST_MAGIC, RESPONSE_MAGIC,
};
use mcbin::McError;

// =============================================================================
// Helper Functions
// =============================================================================

fn round_trip(packet: &Packet) -> Packet {
    let encoded = encode_request(packet).unwrap();
    decode_packet(&encoded).unwrap()
}

fn stat(name: &str, value: &str) -> Packet {
    Packet::response(Opcode::Stat, Status::NoError)
        .with_key(name.as_bytes())
        .with_value(value.as_bytes().to_vec())
}

// =============================================================================
// Request Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_get() {
    let packet = Packet::request(Opcode::Get).with_key(b"hello");
    let decoded = round_trip(&packet);

    assert_eq!(decoded, packet);
    assert!(decoded.is(Opcode::Get));
    assert_eq!(decoded.key, Bytes::from_static(b"hello"));
    assert!(decoded.extras.is_empty());
    assert!(decoded.value.is_empty());
}

#[test]
fn test_encode_decode_set() {
    let packet = Packet::request(Opcode::Set)
        .with_key(b"mykey")
        .with_value(b"myvalue".to_vec())
        .with_extras(store_extras(0x0000_0001, 3600))
        .with_opaque(0xcafe_f00d)
        .with_cas(0x0123_4567_89ab_cdef);

    assert_eq!(round_trip(&packet), packet);
}

#[test]
fn test_encode_decode_every_field_combination() {
    let extras_options: [&[u8]; 2] = [b"", b"\x00\x00\x00\x02\x00\x00\x00\x3c"];
    let key_options: [&[u8]; 2] = [b"", b"key"];
    let value_options: [&[u8]; 2] = [b"", b"some value"];

    for opcode in [Opcode::Get, Opcode::Set, Opcode::Flush, Opcode::Stat, Opcode::Version] {
        for extras in extras_options {
            for key in key_options {
                for value in value_options {
                    let packet = Packet::request(opcode)
                        .with_extras(extras.to_vec())
                        .with_key(key)
                        .with_value(value.to_vec());
                    let decoded = round_trip(&packet);
                    assert_eq!(decoded, packet);
                    assert_eq!(decoded.body_len(), extras.len() + key.len() + value.len());
                }
            }
        }
    }
}

#[test]
fn test_encode_decode_binary_data() {
    // Test with binary data containing null bytes and high bytes
    let binary_key: Vec<u8> = vec![0x00, 0x01, 0xFF, 0xFE, 0x80];
    let binary_value: Vec<u8> = (0..=255).collect();

    let packet = Packet::request(Opcode::Set)
        .with_key(&binary_key)
        .with_value(binary_value.clone());
    let decoded = round_trip(&packet);

    assert_eq!(&decoded.key[..], &binary_key[..]);
    assert_eq!(&decoded.value[..], &binary_value[..]);
}

#[test]
fn test_request_encoding_ignores_magic_and_status() {
    let packet = Packet::response(Opcode::Get, Status::KeyNotFound);

    let encoded = encode_request(&packet).unwrap();
    assert_eq!(encoded[0], REQUEST_MAGIC);
    assert_eq!(&encoded[6..8], &[0x00, 0x00]);
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_response_with_status() {
    let packet =
        Packet::response(Opcode::Get, Status::KeyNotFound).with_value(b"Not found".to_vec());
    let encoded = encode_response(&packet).unwrap();
    let decoded = decode_packet(&encoded).unwrap();

    assert_eq!(decoded.magic, RESPONSE_MAGIC);
    assert_eq!(decoded.outcome(), Status::KeyNotFound);
    assert_eq!(decoded.value_text(), "Not found");
}

#[test]
fn test_decode_unknown_opcode_and_status() {
    let mut packet = Packet::response(Opcode::Noop, Status::NoError);
    packet.opcode = 0xee;
    packet.status = 0x0042;

    let decoded = decode_packet(&encode_response(&packet).unwrap()).unwrap();
    assert_eq!(decoded.kind(), None);
    assert_eq!(decoded.outcome(), Status::Unmapped(0x0042));
}

#[test]
fn test_decode_ignores_trailing_bytes() {
    let packet = Packet::request(Opcode::Get).with_key(b"k");
    let mut encoded = encode_request(&packet).unwrap().to_vec();
    encoded.extend_from_slice(b"next frame");

    assert_eq!(decode_packet(&encoded).unwrap(), packet);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_incomplete_header() {
    let bytes = [0x81, 0x00, 0x00]; // Only 3 bytes, need 24
    let result = decode_packet(&bytes);
    assert!(matches!(result, Err(McError::MalformedPacket(_))));
    assert!(result.unwrap_err().to_string().contains("Incomplete header"));
}

#[test]
fn test_incomplete_body() {
    // Header says 10 bytes of body, only 5 follow
    let mut bytes = vec![0u8; HEADER_SIZE];
    bytes[0] = RESPONSE_MAGIC;
    bytes[8..12].copy_from_slice(&10u32.to_be_bytes());
    bytes.extend_from_slice(b"hello");

    let result = decode_packet(&bytes);
    assert!(matches!(result, Err(McError::MalformedPacket(_))));
    assert!(result.unwrap_err().to_string().contains("Incomplete body"));
}

#[test]
fn test_body_too_small_for_key_and_extras() {
    // key length 8 + extras length 4 in a 6-byte body
    let mut bytes = vec![0u8; HEADER_SIZE];
    bytes[0] = RESPONSE_MAGIC;
    bytes[2..4].copy_from_slice(&8u16.to_be_bytes());
    bytes[4] = 4;
    bytes[8..12].copy_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(b"abcdef");

    assert!(matches!(decode_packet(&bytes), Err(McError::MalformedPacket(_))));
}

#[test]
fn test_huge_declared_body_does_not_over_read() {
    let mut bytes = vec![0u8; HEADER_SIZE];
    bytes[0] = RESPONSE_MAGIC;
    bytes[8..12].copy_from_slice(&u32::MAX.to_be_bytes());

    assert!(matches!(decode_packet(&bytes), Err(McError::MalformedPacket(_))));
}

#[test]
fn test_key_too_long_for_header() {
    let key = vec![b'k'; u16::MAX as usize + 1];
    let packet = Packet::request(Opcode::Get).with_key(&key);

    assert!(matches!(encode_request(&packet), Err(McError::InvalidArgument(_))));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_write_read_request() {
    let packet = Packet::request(Opcode::Set)
        .with_key(b"key")
        .with_value(b"value".to_vec())
        .with_extras(store_extras(0, 0));

    let mut buffer = Vec::new();
    write_request(&mut buffer, &packet).unwrap();

    let mut cursor = Cursor::new(buffer);
    let decoded = read_packet(&mut cursor).unwrap().unwrap();
    assert_eq!(decoded, packet);
}

#[test]
fn test_stream_multiple_responses() {
    let responses = vec![
        Packet::response(Opcode::Get, Status::NoError).with_value(b"data".to_vec()),
        Packet::response(Opcode::Get, Status::KeyNotFound),
        Packet::response(Opcode::Version, Status::NoError).with_value(b"1.6.21".to_vec()),
        Packet::response(Opcode::Noop, Status::NoError),
    ];

    // Write all responses to buffer
    let mut buffer = Vec::new();
    for response in &responses {
        write_response(&mut buffer, response).unwrap();
    }

    // Read them back
    let mut cursor = Cursor::new(buffer);
    for expected in &responses {
        let decoded = read_packet(&mut cursor).unwrap().unwrap();
        assert_eq!(&decoded, expected);
    }
    assert!(read_packet(&mut cursor).unwrap().is_none());
}

#[test]
fn test_stream_empty_is_none() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    assert!(read_packet(&mut cursor).unwrap().is_none());
}

#[test]
fn test_stream_truncated_frame() {
    let packet = Packet::response(Opcode::Get, Status::NoError).with_value(b"abcdef".to_vec());
    let encoded = encode_response(&packet).unwrap();

    // Cut inside the header
    let mut cursor = Cursor::new(encoded[..10].to_vec());
    assert!(matches!(read_packet(&mut cursor), Err(McError::MalformedPacket(_))));

    // Cut inside the body
    let mut cursor = Cursor::new(encoded[..encoded.len() - 2].to_vec());
    assert!(matches!(read_packet(&mut cursor), Err(McError::MalformedPacket(_))));
}

#[test]
fn test_stream_rejects_oversized_body() {
    let mut header = vec![0u8; HEADER_SIZE];
    header[0] = RESPONSE_MAGIC;
    header[8..12].copy_from_slice(&(MAX_BODY_SIZE + 1).to_be_bytes());

    let mut cursor = Cursor::new(header);
    let result = read_packet(&mut cursor);
    assert!(result.unwrap_err().to_string().contains("Body too large"));
}

#[test]
fn test_read_packets_while_stops_at_terminal_packet() {
    let frames = vec![
        stat("pid", "1"),
        stat("uptime", "100"),
        Packet::response(Opcode::Stat, Status::NoError),
        stat("never", "read"),
    ];
    let mut buffer = Vec::new();
    for frame in &frames {
        write_response(&mut buffer, frame).unwrap();
    }
    let first_three: u64 = frames[..3]
        .iter()
        .map(|f| (HEADER_SIZE + f.body_len()) as u64)
        .sum();

    let mut seen = Vec::new();
    let mut cursor = Cursor::new(buffer);
    let count = read_packets_while(&mut cursor, |packet| {
        if packet.key.is_empty() {
            return Ok(false);
        }
        seen.push((packet.value_text(), packet.key.clone()));
        Ok(true)
    })
    .unwrap();

    assert_eq!(count, 3);
    assert_eq!(seen.len(), 2);
    assert_eq!(cursor.position(), first_three);
}

#[test]
fn test_read_packets_while_stream_ends_early() {
    let mut buffer = Vec::new();
    write_response(&mut buffer, &stat("pid", "1")).unwrap();

    let mut cursor = Cursor::new(buffer);
    let result = read_packets_while(&mut cursor, |_| Ok(true));
    assert!(matches!(result, Err(McError::Io(_))));
}

// =============================================================================
// Wire Format Verification Tests
// =============================================================================

#[test]
fn test_wire_format_get() {
    let packet = Packet::request(Opcode::Get).with_key(b"test");
    let encoded = encode_request(&packet).unwrap();

    assert_eq!(encoded.len(), HEADER_SIZE + 4);
    assert_eq!(encoded[0], 0x80); // request magic
    assert_eq!(encoded[1], 0x00); // GET
    assert_eq!(&encoded[2..4], &[0x00, 0x04]); // key len = 4
    assert_eq!(encoded[4], 0x00); // no extras
    assert_eq!(encoded[5], 0x00); // data type
    assert_eq!(&encoded[6..8], &[0x00, 0x00]); // status unused
    assert_eq!(&encoded[8..12], &[0x00, 0x00, 0x00, 0x04]); // body len = 4
    assert_eq!(&encoded[24..28], b"test");
}

#[test]
fn test_wire_format_set_body_order() {
    let packet = Packet::request(Opcode::Set)
        .with_key(b"k")
        .with_value(b"v".to_vec())
        .with_extras(store_extras(2, 60))
        .with_cas(0x0000_0001_0000_0002);
    let encoded = encode_request(&packet).unwrap();

    assert_eq!(encoded[4], 8); // extras len
    assert_eq!(&encoded[8..12], &[0x00, 0x00, 0x00, 0x0a]); // 8 + 1 + 1
    assert_eq!(&encoded[16..20], &[0x00, 0x00, 0x00, 0x01]); // cas high word
    assert_eq!(&encoded[20..24], &[0x00, 0x00, 0x00, 0x02]); // cas low word
    assert_eq!(&encoded[24..32], &[0, 0, 0, 2, 0, 0, 0, 60]); // [extras]
    assert_eq!(encoded[32], b'k'); // [key]
    assert_eq!(encoded[33], b'v'); // [value]
}
