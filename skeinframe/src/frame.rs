//! MAC frame model and the bit-exact wire codec.
//!
//! Wire layout (all multi-byte fields little-endian):
//!
//! ```text
//! +-----+--------+-------+----------+------------+---------+------------+---------+------+
//! | len | FCF    | seq   | dest PAN | dest addr  | src PAN | src addr   | payload | 0x00 |
//! | 1B  | 2B     | 0|1B  | 0|2B     | 0|2|8B     | 0|2B    | 0|2|8B     | N       | 1B   |
//! +-----+--------+-------+----------+------------+---------+------------+---------+------+
//! ```
//!
//! The length byte counts the whole frame including itself and the trailing
//! terminator. Optional fields are omitted, never zero-filled: the sequence
//! number is absent when suppressed, the destination PAN ID is present only
//! with a destination address, and the source PAN ID is elided under PAN ID
//! compression (the parser then mirrors the destination PAN).

use bytes::{BufMut, Bytes, BytesMut};

use crate::address::{AddrMode, Address};
use crate::error::{FrameError, Result};
use crate::fcf::FrameControlField;

/// Maximum total frame size on the wire, length byte and terminator included.
pub const MAX_FRAME_LEN: usize = 128;

/// Worst-case MAC header: FCF + sequence number + two PAN IDs + two extended
/// addresses.
pub const MAX_HEADER_LEN: usize = 2 + 1 + 2 + 8 + 2 + 8;

/// Length byte at the front plus terminator byte at the back.
pub const FRAMING_OVERHEAD: usize = 2;

/// A MAC frame.
///
/// Address lengths always match the corresponding FCF address-mode bits;
/// the setters below keep the two in step. Signal-quality metadata (RSSI,
/// LQI) travels out-of-band next to the raw bytes, not inside the frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub fcf: FrameControlField,
    /// Valid only when the FCF does not suppress sequence numbers.
    pub sequence_number: u8,
    pub dest_pan_id: u16,
    pub dest_address: Address,
    pub src_pan_id: u16,
    pub src_address: Address,
    pub payload: Bytes,
}

impl Frame {
    /// Set the destination address, updating the FCF addressing mode to match.
    pub fn set_destination_address(&mut self, address: Address) {
        self.fcf.dest_addr_mode = address.mode();
        self.dest_address = address;
    }

    /// Set the source address, updating the FCF addressing mode to match.
    pub fn set_source_address(&mut self, address: Address) {
        self.fcf.src_addr_mode = address.mode();
        self.src_address = address;
    }

    /// Put both sides on `pan_id` and enable PAN ID compression, so the
    /// source PAN is elided on the wire.
    pub fn set_pan(&mut self, pan_id: u16) {
        self.dest_pan_id = pan_id;
        self.src_pan_id = pan_id;
        self.fcf.pan_id_compression = true;
    }

    /// Copy `data` in as the frame payload.
    pub fn set_payload(&mut self, data: &[u8]) {
        self.payload = Bytes::copy_from_slice(data);
    }

    /// Bytes before the payload: length byte, FCF, and the optional fields
    /// the FCF calls for.
    pub fn header_len(&self) -> usize {
        let mut len = 1 + FrameControlField::WIRE_LEN;
        if !self.fcf.sequence_number_suppression {
            len += 1;
        }
        if self.fcf.dest_addr_mode != AddrMode::None {
            len += 2;
        }
        len += self.fcf.dest_addr_mode.wire_len();
        if self.fcf.src_addr_mode != AddrMode::None && !self.fcf.pan_id_compression {
            len += 2;
        }
        len += self.fcf.src_addr_mode.wire_len();
        len
    }

    /// The total number of bytes this frame will occupy when encoded.
    pub fn encoded_len(&self) -> usize {
        self.header_len() + self.payload.len() + 1
    }

    /// Encode this frame into wire bytes.
    ///
    /// Fails with [`FrameError::Oversize`] when the encoded frame would not
    /// fit in [`MAX_FRAME_LEN`]; callers segment payloads to the MTU before
    /// building.
    pub fn encode(&self) -> Result<Bytes> {
        let total = self.encoded_len();
        if total > MAX_FRAME_LEN {
            return Err(FrameError::Oversize {
                size: total,
                max: MAX_FRAME_LEN,
            });
        }
        let mut buf = BytesMut::with_capacity(total);
        self.encode_into(&mut buf);
        Ok(buf.freeze())
    }

    /// Encode into a pre-allocated `BytesMut` without the size check.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        debug_assert_eq!(self.dest_address.wire_len(), self.fcf.dest_addr_mode.wire_len());
        debug_assert_eq!(self.src_address.wire_len(), self.fcf.src_addr_mode.wire_len());

        buf.put_u8(self.encoded_len() as u8);
        buf.put_u16_le(self.fcf.to_bits());
        if !self.fcf.sequence_number_suppression {
            buf.put_u8(self.sequence_number);
        }
        if self.fcf.dest_addr_mode != AddrMode::None {
            buf.put_u16_le(self.dest_pan_id);
        }
        buf.put_slice(self.dest_address.as_bytes());
        if self.fcf.src_addr_mode != AddrMode::None && !self.fcf.pan_id_compression {
            buf.put_u16_le(self.src_pan_id);
        }
        buf.put_slice(self.src_address.as_bytes());
        buf.put_slice(&self.payload);
        buf.put_u8(0x00);
    }

    /// Decode a frame from raw wire bytes.
    ///
    /// Byte 0 is the declared total length; the fields of interest span
    /// bytes `[1, length - 1)`, the last byte being the terminator. Parsing
    /// is strictly sequential and fails as soon as a field would extend past
    /// the declared length; nothing past the declared length or the supplied
    /// slice is ever read.
    pub fn parse(data: &[u8]) -> Result<Frame> {
        let total = data.first().copied().ok_or(FrameError::Truncated {
            field: "length",
            needed: 1,
            remaining: 0,
        })? as usize;
        if total < FRAMING_OVERHEAD {
            return Err(FrameError::Truncated {
                field: "length",
                needed: FRAMING_OVERHEAD,
                remaining: total,
            });
        }
        if total > data.len() {
            return Err(FrameError::Truncated {
                field: "frame",
                needed: total,
                remaining: data.len(),
            });
        }
        // Interior bytes between the length byte and the terminator.
        let mut rest = &data[1..total - 1];

        let fcf_bytes = take(&mut rest, FrameControlField::WIRE_LEN, "fcf")?;
        let fcf = FrameControlField::from_bits(u16::from_le_bytes([fcf_bytes[0], fcf_bytes[1]]));

        let sequence_number = if fcf.sequence_number_suppression {
            0
        } else {
            take(&mut rest, 1, "sequence number")?[0]
        };

        let dest_pan_id = if fcf.dest_addr_mode != AddrMode::None {
            let b = take(&mut rest, 2, "destination PAN ID")?;
            u16::from_le_bytes([b[0], b[1]])
        } else {
            0
        };

        let dest_address = Address::from_wire(
            fcf.dest_addr_mode,
            take(&mut rest, fcf.dest_addr_mode.wire_len(), "destination address")?,
        );

        let src_present = fcf.src_addr_mode != AddrMode::None;
        let src_pan_id = if src_present && !fcf.pan_id_compression {
            let b = take(&mut rest, 2, "source PAN ID")?;
            u16::from_le_bytes([b[0], b[1]])
        } else if src_present {
            // Compressed: the source shares the destination PAN.
            dest_pan_id
        } else {
            0
        };

        let src_address = Address::from_wire(
            fcf.src_addr_mode,
            take(&mut rest, fcf.src_addr_mode.wire_len(), "source address")?,
        );

        // Whatever remains up to the declared length is the payload.
        let payload = Bytes::copy_from_slice(rest);

        Ok(Frame {
            fcf,
            sequence_number,
            dest_pan_id,
            dest_address,
            src_pan_id,
            src_address,
            payload,
        })
    }
}

/// Split `n` bytes off the front of `rest`, or fail with the field name.
fn take<'a>(rest: &mut &'a [u8], n: usize, field: &'static str) -> Result<&'a [u8]> {
    if rest.len() < n {
        return Err(FrameError::Truncated {
            field,
            needed: n,
            remaining: rest.len(),
        });
    }
    let (head, tail) = rest.split_at(n);
    *rest = tail;
    Ok(head)
}
