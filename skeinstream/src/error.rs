use thiserror::Error;

use skeinframe::FrameError;

use crate::radio::TxError;

/// Errors internal to the stream plumbing.
///
/// These never cross into the byte-stream API: callers observe only byte
/// availability and counts, and transport-level failures show up there as
/// reduced or delayed throughput.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("radio rejected transmit: {0}")]
    Radio(TxError),
}

pub type Result<T> = std::result::Result<T, StreamError>;
