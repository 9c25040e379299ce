use thiserror::Error;

use crate::shared::constants::VIDEO_EXTENSIONS;

/// Failures raised while constructing a [`VideoReader`](crate::capture::video_reader::VideoReader).
///
/// Reading never produces one of these: a failed read ends the stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error(
        "invalid file extension for {descriptor}; expected one of: {}",
        VIDEO_EXTENSIONS.join(", ")
    )]
    InvalidSource { descriptor: String },
    #[error("failed to read from {descriptor}: {reason}")]
    SourceUnavailable { descriptor: String, reason: String },
    #[error("invalid reader configuration: {0}")]
    InvalidConfig(&'static str),
}
