//! Protocol error types.

use serde::Serialize;
use thiserror::Error;

use crate::types::DeviceFamily;

/// Errors produced by the fallible stages of the decode pipeline.
///
/// None of these escape [`BusDecoder`](crate::BusDecoder); they are wrapped into
/// [`Diagnostic::Rejected`](crate::Diagnostic::Rejected) events.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ProtocolError {
    /// Frame is too short for the requested operation.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum length required.
        expected: usize,
        /// Actual frame length.
        actual: usize,
    },

    /// Integrity check failed.
    #[error("checksum mismatch: computed 0x{computed:02X}, received 0x{received:02X}")]
    ChecksumMismatch {
        /// Checksum computed over the frame.
        computed: u8,
        /// Checksum byte carried by the frame.
        received: u8,
    },

    /// Payload is shorter than the family layout requires.
    #[error("{family} payload too short: expected {expected} bytes, got {actual}")]
    PayloadTooShort {
        /// Family whose decoder rejected the payload.
        family: DeviceFamily,
        /// Bytes the decoder reads.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// Payload slice does not fit inside the frame.
    #[error("payload out of bounds for a {len}-byte frame")]
    PayloadOutOfBounds {
        /// Frame length.
        len: usize,
    },
}

impl ProtocolError {
    /// Stable snake_case tag, used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::FrameTooShort { .. } => "frame_too_short",
            ProtocolError::ChecksumMismatch { .. } => "checksum_mismatch",
            ProtocolError::PayloadTooShort { .. } => "payload_too_short",
            ProtocolError::PayloadOutOfBounds { .. } => "payload_out_of_bounds",
        }
    }
}
