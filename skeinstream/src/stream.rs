//! The reliable byte-stream adapter.
//!
//! Turns a sequence of independently addressed, size-limited, occasionally
//! lost frames into a continuous, ordered, duplicate-free byte stream.
//! Outbound bytes are staged in a TX ring and cut into MTU-sized frames;
//! confirmed sends run a stop-and-wait retry discipline against the radio's
//! completion notifications. Inbound frames are sequence-validated,
//! deduplicated, and reassembled through an RX ring, with backpressure by
//! deferral when the ring cannot hold a payload.
//!
//! Exactly one outbound frame is in flight at a time; reception and
//! transmission interleave freely on their separate rings and counters.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, warn};

use skeinframe::{AddrMode, Frame};

use crate::arq::{ArqState, TxNotifier, TxSignal};
use crate::config::{StreamConfig, ACK_WAIT_MARGIN, MTU};
use crate::error::{Result, StreamError};
use crate::radio::{LinkQuality, RadioDriver};
use crate::ring::RingBuffer;

/// A partially delivered inbound payload held while the RX ring is full.
struct PendingPayload {
    payload: Bytes,
    offset: usize,
}

/// Reliable byte stream over a frame-oriented radio.
///
/// Created at session start from a [`StreamConfig`] and a radio driver;
/// dropping the stream ends the session, discards all buffered data, and
/// turns any still-outstanding radio notification into a no-op.
pub struct FrameStream {
    config: StreamConfig,
    radio: Box<dyn RadioDriver>,
    signal: TxSignal,
    tx_ring: RingBuffer,
    rx_ring: RingBuffer,
    /// Sequence number the next outbound frame will carry, mod 256.
    tx_seq: u8,
    /// Last accepted inbound sequence number; None until the first frame.
    last_rx_seq: Option<u8>,
    pending: Option<PendingPayload>,
    last_link: Option<LinkQuality>,
}

impl FrameStream {
    pub fn new(config: StreamConfig, radio: Box<dyn RadioDriver>) -> Self {
        let tx_ring = RingBuffer::new(config.tx_buffer_size);
        let rx_ring = RingBuffer::new(config.rx_buffer_size);
        Self {
            radio,
            signal: TxSignal::new(),
            tx_ring,
            rx_ring,
            // Outbound numbering starts at 1.
            tx_seq: 1,
            last_rx_seq: None,
            pending: None,
            last_link: None,
            config,
        }
    }

    /// Capability for the radio layer to report transmit outcomes. Bound to
    /// this session; goes dead when the stream is dropped.
    pub fn notifier(&self) -> TxNotifier {
        self.signal.notifier()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn mtu(&self) -> usize {
        MTU
    }

    /// Current per-attempt ARQ state.
    pub fn arq_state(&self) -> ArqState {
        self.signal.state()
    }

    /// Signal quality of the most recently accepted frame.
    pub fn last_link_quality(&self) -> Option<LinkQuality> {
        self.last_link
    }

    /// Sequence number the next outbound frame will carry.
    pub fn next_sequence_number(&self) -> u8 {
        self.tx_seq
    }

    // ---------------------------------------------------------------------
    // Write path
    // ---------------------------------------------------------------------

    /// Stage one byte; a TX ring grown to MTU capacity flushes automatically.
    /// Returns the number of bytes accepted (0 or 1).
    pub fn write_byte(&mut self, byte: u8) -> usize {
        let accepted = self.tx_ring.write(byte);
        if self.tx_ring.is_full() {
            self.flush();
        }
        accepted as usize
    }

    /// Stage a chunk of bytes.
    ///
    /// A chunk shorter than the MTU is flushed immediately so short writes
    /// do not sit in the ring; longer chunks leave their tail staged for a
    /// later flush or follow-up write.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let mut written = 0;
        for &byte in data {
            if self.write_byte(byte) == 0 {
                break;
            }
            written += 1;
        }
        if data.len() < MTU {
            self.flush();
        }
        written
    }

    /// Drain the TX ring and send its contents as one frame, with or
    /// without confirmation per the FCF template.
    pub fn flush(&mut self) {
        let len = self.tx_ring.available();
        if len == 0 {
            return;
        }
        let mut chunk = vec![0u8; len];
        let n = self.tx_ring.read_slice(&mut chunk);
        chunk.truncate(n);
        if self.config.ack_active() {
            self.send_with_confirmation(&chunk);
        } else {
            self.send_without_confirmation(&chunk);
        }
    }

    /// Free space in the TX staging ring.
    pub fn available_for_write(&self) -> usize {
        self.tx_ring.available_for_write()
    }

    /// Frame template applied to one outgoing payload.
    fn build_frame(&self, payload: &[u8]) -> Result<Bytes> {
        let mut frame = Frame {
            fcf: self.config.fcf,
            sequence_number: self.tx_seq,
            ..Frame::default()
        };
        frame.set_destination_address(self.config.dest_address);
        if self.config.local_address.mode() != AddrMode::None {
            frame.set_source_address(self.config.local_address);
        }
        frame.set_pan(self.config.pan_id);
        frame.set_payload(payload);
        Ok(frame.encode()?)
    }

    fn advance_sequence(&mut self) {
        self.tx_seq = self.tx_seq.wrapping_add(1);
    }

    /// Best-effort single transmission: no retry, failures only logged.
    fn send_without_confirmation(&mut self, payload: &[u8]) {
        if let Err(e) = self.try_send_unconfirmed(payload) {
            warn!(error = %e, len = payload.len(), "failed to send frame");
        }
        thread::sleep(self.config.send_delay);
    }

    fn try_send_unconfirmed(&mut self, payload: &[u8]) -> Result<()> {
        let bytes = self.build_frame(payload)?;
        self.radio.transmit(&bytes).map_err(StreamError::Radio)?;
        debug!(len = payload.len(), seq = self.tx_seq, "sent frame");
        self.advance_sequence();
        Ok(())
    }

    /// Stop-and-wait transmission with a retry budget.
    ///
    /// The same frame bytes (same sequence number) are retransmitted on
    /// failure or ack timeout. When the budget runs out the sequence number
    /// still advances, so the peer's duplicate and gap accounting stays
    /// consistent; the loss is visible only as a diagnostic.
    fn send_with_confirmation(&mut self, payload: &[u8]) {
        let bytes = match self.build_frame(payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, len = payload.len(), "cannot build outbound frame");
                return;
            }
        };

        let mut remaining = self.config.retry_count.max(1);
        let mut attempt = 0u32;
        loop {
            self.signal.arm();
            debug!(attempt, len = payload.len(), seq = self.tx_seq, "sending frame");
            if let Err(e) = self.radio.transmit(&bytes) {
                self.signal.fail(e);
            }

            let deadline = Instant::now() + self.config.ack_timeout + ACK_WAIT_MARGIN;
            match self.signal.wait_until(deadline) {
                ArqState::Confirmed => {
                    self.advance_sequence();
                    break;
                }
                outcome => {
                    if outcome == ArqState::Failed {
                        debug!(
                            attempt,
                            error = ?self.signal.last_error(),
                            "send failed, retrying"
                        );
                    } else {
                        debug!(attempt, "confirmation timed out, retrying");
                    }
                    remaining -= 1;
                    if remaining == 0 {
                        warn!(
                            seq = self.tx_seq,
                            attempts = attempt + 1,
                            "retry budget exhausted, dropping frame"
                        );
                        self.advance_sequence();
                        break;
                    }
                    thread::sleep(self.config.send_delay);
                }
            }
            attempt += 1;
        }
        self.signal.reset();
        thread::sleep(self.config.send_delay);
    }

    // ---------------------------------------------------------------------
    // Read path
    // ---------------------------------------------------------------------

    /// Make one step of receive progress.
    ///
    /// Returns true when a frame's payload was fully committed to the RX
    /// ring; false when nothing could be pulled, the frame was discarded
    /// (malformed or duplicate), or delivery is still deferred for space.
    /// A deferred frame is always drained before a new frame is pulled.
    pub fn receive(&mut self) -> bool {
        if self.pending.is_some() {
            return self.drain_pending();
        }

        let raw = match self.radio.receive_next(self.config.receive_poll_timeout) {
            Some(raw) => raw,
            None => return false,
        };

        let frame = match Frame::parse(&raw.bytes) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, len = raw.bytes.len(), "discarding malformed frame");
                return false;
            }
        };

        debug!(
            len = frame.payload.len(),
            seq = frame.sequence_number,
            "received frame"
        );

        if self.config.sequence_numbers_active() && !self.accept_sequence(frame.sequence_number) {
            return false;
        }
        self.last_link = Some(raw.link);

        self.pending = Some(PendingPayload {
            payload: frame.payload,
            offset: 0,
        });
        self.drain_pending()
    }

    /// Duplicate suppression and gap detection, mod 256.
    ///
    /// The first frame of a session is accepted unconditionally. An exact
    /// repeat of the last accepted number is a retransmission and is
    /// dropped; any other value is accepted, with non-successors noted as a
    /// gap. No reordering or recovery is attempted.
    fn accept_sequence(&mut self, seq: u8) -> bool {
        if let Some(last) = self.last_rx_seq {
            if seq == last {
                debug!(seq, "retransmission ignored");
                return false;
            }
            let expected = last.wrapping_add(1);
            if seq != expected {
                debug!(expected, got = seq, "sequence gap");
            }
        }
        self.last_rx_seq = Some(seq);
        true
    }

    /// Push as much of the deferred payload as fits into the RX ring.
    /// Progress is reported only once the whole payload is committed.
    fn drain_pending(&mut self) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        pending.offset += self.rx_ring.write_slice(&pending.payload[pending.offset..]);
        if pending.offset == pending.payload.len() {
            self.pending = None;
            true
        } else {
            debug!(
                deferred = pending.payload.len() - pending.offset,
                "rx buffer full, frame delivery deferred"
            );
            false
        }
    }

    /// Read one byte, attempting one receive step first.
    pub fn read_byte(&mut self) -> Option<u8> {
        self.receive();
        self.rx_ring.read()
    }

    /// Fill `dest` from the stream under the configured read timeout.
    pub fn read(&mut self, dest: &mut [u8]) -> usize {
        self.read_with_timeout(dest, self.config.read_timeout)
    }

    /// Fill `dest` from the stream.
    ///
    /// Drives receive steps until enough bytes are buffered, progress
    /// stops, or `timeout` elapses; then bulk-reads whatever is available.
    /// The overall deadline is independent of the per-frame poll timeout.
    pub fn read_with_timeout(&mut self, dest: &mut [u8], timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        while self.rx_ring.available() < dest.len()
            && self.receive()
            && Instant::now() < deadline
        {}
        self.rx_ring.read_slice(dest)
    }

    /// Next byte without consuming it; tries one receive step when empty.
    pub fn peek(&mut self) -> Option<u8> {
        if self.rx_ring.is_empty() {
            self.receive();
        }
        self.rx_ring.peek()
    }

    /// Bytes buffered and ready to read.
    pub fn available(&self) -> usize {
        self.rx_ring.available()
    }
}

impl io::Write for FrameStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(FrameStream::write(self, buf))
    }

    // Transport-level failures never surface here; callers observe only
    // byte counts.
    fn flush(&mut self) -> io::Result<()> {
        FrameStream::flush(self);
        Ok(())
    }
}

impl io::Read for FrameStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(FrameStream::read(self, buf))
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        // Session teardown: late radio notifications become no-ops, all
        // buffered and pending data is discarded.
        self.signal.retire();
        self.tx_ring.clear();
        self.rx_ring.clear();
        self.pending = None;
    }
}
