//! Codec behaviour across the full addressing/flag space.

use bytes::Bytes;
use rand::RngExt;
use skeinframe::{AddrMode, Address, FrameControlField, Frame, FrameType};

fn address_for(mode: AddrMode, seed: u8) -> Address {
    match mode {
        AddrMode::Short => Address::short_bytes([seed, seed.wrapping_add(1)]),
        AddrMode::Extended => Address::extended([
            seed,
            seed.wrapping_add(1),
            seed.wrapping_add(2),
            seed.wrapping_add(3),
            seed.wrapping_add(4),
            seed.wrapping_add(5),
            seed.wrapping_add(6),
            seed.wrapping_add(7),
        ]),
        _ => Address::none(),
    }
}

/// Build one frame for a given corner of the configuration space.
fn frame_for(
    dest: AddrMode,
    src: AddrMode,
    suppress_seq: bool,
    compress_pan: bool,
    payload: &[u8],
) -> Frame {
    let mut frame = Frame {
        sequence_number: 0x42,
        ..Frame::default()
    };
    frame.fcf.sequence_number_suppression = suppress_seq;
    frame.set_destination_address(address_for(dest, 0x10));
    frame.set_source_address(address_for(src, 0x20));
    frame.dest_pan_id = 0xBEEF;
    if compress_pan {
        frame.fcf.pan_id_compression = true;
        frame.src_pan_id = 0xBEEF;
    } else {
        frame.src_pan_id = 0xCAFE;
    }
    frame.set_payload(payload);
    frame
}

const MODES: [AddrMode; 3] = [AddrMode::None, AddrMode::Short, AddrMode::Extended];

#[test]
fn roundtrip_all_addressing_combinations() {
    for dest in MODES {
        for src in MODES {
            for suppress_seq in [false, true] {
                for compress_pan in [false, true] {
                    let frame = frame_for(dest, src, suppress_seq, compress_pan, b"payload");
                    let encoded = frame.encode().unwrap();
                    let parsed = Frame::parse(&encoded).unwrap();

                    assert_eq!(parsed.fcf, frame.fcf);
                    assert_eq!(parsed.dest_address, frame.dest_address);
                    assert_eq!(parsed.src_address, frame.src_address);
                    assert_eq!(parsed.payload, frame.payload);
                    if !suppress_seq {
                        assert_eq!(parsed.sequence_number, 0x42);
                    }
                    if dest != AddrMode::None {
                        assert_eq!(parsed.dest_pan_id, 0xBEEF);
                    }
                    if src != AddrMode::None {
                        // Compression mirrors whatever destination PAN came
                        // off the wire (0 when no destination is present).
                        let expected = if compress_pan {
                            parsed.dest_pan_id
                        } else {
                            0xCAFE
                        };
                        assert_eq!(parsed.src_pan_id, expected);
                    }
                }
            }
        }
    }
}

#[test]
fn declared_length_matches_header_arithmetic() {
    let payload = b"0123456789";
    for dest in MODES {
        for src in MODES {
            for suppress_seq in [false, true] {
                for compress_pan in [false, true] {
                    let frame = frame_for(dest, src, suppress_seq, compress_pan, payload);
                    let encoded = frame.encode().unwrap();

                    let mut header = 2; // FCF
                    if !suppress_seq {
                        header += 1;
                    }
                    if dest != AddrMode::None {
                        header += 2 + dest.wire_len();
                    }
                    if src != AddrMode::None {
                        if !compress_pan {
                            header += 2;
                        }
                        header += src.wire_len();
                    }

                    // Declared length = header + payload + length byte + terminator.
                    assert_eq!(encoded[0] as usize, header + payload.len() + 2);
                    assert_eq!(encoded.len(), encoded[0] as usize);
                }
            }
        }
    }
}

#[test]
fn pan_compression_elides_source_pan() {
    let compressed = frame_for(AddrMode::Short, AddrMode::Short, false, true, b"x");
    let expanded = frame_for(AddrMode::Short, AddrMode::Short, false, false, b"x");
    assert_eq!(
        compressed.encoded_len(),
        expanded.encoded_len() - 2,
        "compression must drop exactly the two source-PAN bytes"
    );

    let parsed = Frame::parse(&compressed.encode().unwrap()).unwrap();
    assert_eq!(parsed.src_pan_id, parsed.dest_pan_id);
}

#[test]
fn every_truncated_prefix_fails_cleanly() {
    let frame = frame_for(AddrMode::Extended, AddrMode::Extended, false, false, b"data");
    let encoded = frame.encode().unwrap();
    for cut in 0..encoded.len() {
        assert!(
            Frame::parse(&encoded[..cut]).is_err(),
            "prefix of {cut} bytes must not parse"
        );
    }
}

#[test]
fn shortened_declared_length_fails_mid_field() {
    let frame = frame_for(AddrMode::Extended, AddrMode::Extended, false, false, b"data");
    let mut bytes = frame.encode().unwrap().to_vec();
    let full = bytes[0];
    // Walk the declared length down through every field boundary.
    for declared in 2..full {
        bytes[0] = declared;
        match Frame::parse(&bytes) {
            Ok(parsed) => {
                // A shorter declared length can still parse once the header
                // fits; the payload just shrinks with it.
                assert!(parsed.payload.len() < frame.payload.len());
            }
            Err(_) => {}
        }
    }
    bytes[0] = full;
    assert!(Frame::parse(&bytes).is_ok());
}

#[test]
fn random_payloads_roundtrip() {
    let mut rng = rand::rng();
    for _ in 0..64 {
        let len = rng.random_range(0..=103);
        let mut payload = vec![0u8; len];
        rng.fill(&mut payload[..]);

        let frame = frame_for(AddrMode::Short, AddrMode::Short, false, true, &payload);
        let parsed = Frame::parse(&frame.encode().unwrap()).unwrap();
        assert_eq!(parsed.payload, Bytes::from(payload));
    }
}

#[test]
fn ack_frame_has_minimal_header() {
    let mut frame = Frame {
        sequence_number: 9,
        ..Frame::default()
    };
    frame.fcf.frame_type = FrameType::Ack;
    let encoded = frame.encode().unwrap();
    // Length byte + FCF + seq + terminator: nothing else.
    assert_eq!(encoded.len(), 5);

    let parsed = Frame::parse(&encoded).unwrap();
    assert_eq!(parsed.fcf.frame_type, FrameType::Ack);
    assert_eq!(parsed.sequence_number, 9);
    assert!(parsed.payload.is_empty());
}

#[test]
fn fcf_template_survives_wire() {
    let mut frame = frame_for(AddrMode::Short, AddrMode::Extended, false, false, b"");
    frame.fcf.ack_request = true;
    frame.fcf.frame_pending = true;
    frame.fcf.security_enabled = true;
    let parsed = Frame::parse(&frame.encode().unwrap()).unwrap();
    assert!(parsed.fcf.ack_request);
    assert!(parsed.fcf.frame_pending);
    assert!(parsed.fcf.security_enabled);
}

#[test]
fn payload_never_reads_past_declared_length() {
    // Slice longer than the declared frame: trailing garbage is ignored.
    let frame = frame_for(AddrMode::Short, AddrMode::Short, false, true, b"ok");
    let mut bytes = frame.encode().unwrap().to_vec();
    bytes.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    let parsed = Frame::parse(&bytes).unwrap();
    assert_eq!(&parsed.payload[..], b"ok");
}

#[test]
fn default_fcf_wire_value() {
    assert_eq!(FrameControlField::default().to_bits(), 0x1001);
}
