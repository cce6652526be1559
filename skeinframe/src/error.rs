use thiserror::Error;

/// All errors produced by the skein frame codec.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("truncated frame: {field} needs {needed} bytes, {remaining} remain")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("frame too large: {size} bytes exceeds maximum {max}")]
    Oversize { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
