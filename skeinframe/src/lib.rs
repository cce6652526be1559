//! skeinframe -- IEEE 802.15.4 MAC frame codec for the skein link-layer stack.
//!
//! Parses raw frame bytes into a structured [`Frame`] and serialises a
//! [`Frame`] back into wire bytes, honouring every optional-field rule the
//! frame control field implies:
//! - **Address**: absent, 16-bit short, or 64-bit extended MAC addressing
//! - **FrameControlField**: the packed 16-bit header, bit-exact
//! - **Frame**: the full MAC frame with PAN IDs, addresses, and payload
//!
//! All multi-byte numeric fields are little-endian on the wire.

pub mod address;
pub mod error;
pub mod fcf;
pub mod frame;

// Re-export key public types at crate root.
pub use address::{AddrMode, Address, BROADCAST};
pub use error::{FrameError, Result};
pub use fcf::{FrameControlField, FrameType, FrameVersion};
pub use frame::{Frame, FRAMING_OVERHEAD, MAX_FRAME_LEN, MAX_HEADER_LEN};
