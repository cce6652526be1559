//! Session configuration.

use std::time::Duration;

use skeinframe::{Address, FrameControlField, BROADCAST};

/// Maximum payload bytes per frame.
///
/// Chosen so the worst-case MAC header, the payload, and the length and
/// terminator bytes stay within `skeinframe::MAX_FRAME_LEN`.
pub const MTU: usize = 116;

/// Margin added on top of the configured ack wait when computing the
/// confirmation deadline.
pub(crate) const ACK_WAIT_MARGIN: Duration = Duration::from_millis(100);

/// Plain configuration values consumed at session start.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// PAN this session lives on; applied to outgoing frames with PAN ID
    /// compression enabled.
    pub pan_id: u16,
    /// Address of this device, used as the source of outgoing frames.
    pub local_address: Address,
    /// Where outgoing frames are addressed.
    pub dest_address: Address,
    /// FCF template applied to every outgoing frame. The ack-request bit
    /// selects confirmed sends; sequence-number suppression disables
    /// duplicate detection on both directions.
    pub fcf: FrameControlField,
    /// How long the radio waits for a link-layer ack.
    pub ack_timeout: Duration,
    /// Retry budget for confirmed sends (total attempts).
    pub retry_count: u32,
    /// Delay between send attempts.
    pub send_delay: Duration,
    /// Receive reassembly ring capacity.
    pub rx_buffer_size: usize,
    /// Transmit staging ring capacity; a full ring triggers a frame send.
    pub tx_buffer_size: usize,
    /// Upper bound on a single inbound poll.
    pub receive_poll_timeout: Duration,
    /// Overall deadline for a `read` call.
    pub read_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            pan_id: 0,
            local_address: Address::none(),
            dest_address: BROADCAST,
            fcf: FrameControlField::default(),
            ack_timeout: Duration::from_millis(1),
            retry_count: 2,
            send_delay: Duration::from_millis(10),
            rx_buffer_size: 1024 + MTU,
            tx_buffer_size: MTU,
            receive_poll_timeout: Duration::from_millis(20),
            read_timeout: Duration::from_secs(1),
        }
    }
}

impl StreamConfig {
    /// Confirmed sends are selected by the ack-request bit in the template.
    pub fn ack_active(&self) -> bool {
        self.fcf.ack_request
    }

    /// Sequence validation applies only when numbers are on the wire.
    pub fn sequence_numbers_active(&self) -> bool {
        !self.fcf.sequence_number_suppression
    }
}
