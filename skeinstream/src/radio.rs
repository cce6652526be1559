//! The radio collaborator contract.
//!
//! The stream core never touches hardware. It is handed a [`RadioDriver`]
//! at session construction and requires exactly two things from it: a way
//! to hand a built frame to the radio, and a pull-style source of raw
//! received frames. Transmit completion is reported asynchronously through
//! the [`crate::arq::TxNotifier`] capability, never through the `transmit`
//! return value alone.
//!
//! Channel/power/PAN bring-up and other radio configuration stay on the
//! driver side of this boundary.

use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

/// Signal-quality metadata delivered alongside each received frame, outside
/// the wire bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkQuality {
    /// Received signal strength in dBm.
    pub rssi: i8,
    /// Link quality indicator, 0-255.
    pub lqi: u8,
    /// Channel the frame arrived on (11-26).
    pub channel: u8,
}

/// One raw frame pulled from the radio, exactly as received on air.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub bytes: Bytes,
    pub link: LinkQuality,
}

/// Transmit failure reasons reported by the radio layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TxError {
    #[error("channel busy during clear channel assessment")]
    CcaBusy,
    #[error("transmission aborted")]
    Abort,
    #[error("no acknowledgment received")]
    NoAck,
    #[error("invalid acknowledgment frame")]
    InvalidAck,
    #[error("denied by coexistence arbitration")]
    Coexistence,
    #[error("security processing failed")]
    Security,
}

/// What the stream core requires from the surrounding radio layer.
pub trait RadioDriver: Send {
    /// Hand a fully built frame to the radio for transmission.
    ///
    /// An `Ok` return only means the radio accepted the frame; the outcome
    /// of the attempt arrives later via the session's `TxNotifier`.
    fn transmit(&mut self, frame: &[u8]) -> Result<(), TxError>;

    /// Pull the next inbound frame, waiting at most `timeout`.
    fn receive_next(&mut self, timeout: Duration) -> Option<RawFrame>;
}
