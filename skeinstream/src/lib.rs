//! skeinstream -- reliable byte-stream adapter over IEEE 802.15.4-class radios.
//!
//! Sits on top of a packet-oriented, unreliable radio medium and presents a
//! continuous, ordered, duplicate-free byte stream:
//! - outbound bytes are staged in a ring buffer and cut into MTU-sized frames
//! - confirmed sends run a stop-and-wait acknowledgment/retry discipline
//! - inbound frames are sequence-validated, deduplicated, and reassembled,
//!   with backpressure by deferral when the receive buffer cannot hold a
//!   payload
//!
//! Frame parsing and building live in the `skeinframe` crate. The radio
//! itself stays behind the [`RadioDriver`] trait; transmit outcomes come
//! back through the [`TxNotifier`] capability handed out at session start.

pub mod arq;
pub mod config;
pub mod error;
pub mod radio;
pub mod ring;
pub mod stream;

// Re-export key public types at crate root.
pub use arq::{ArqState, TxNotifier};
pub use config::{StreamConfig, MTU};
pub use error::{Result, StreamError};
pub use radio::{LinkQuality, RadioDriver, RawFrame, TxError};
pub use ring::RingBuffer;
pub use stream::FrameStream;
