//! Base frame decoding: header fields and payload slice.

use serde::Serialize;

use crate::constants::*;
use crate::error::ProtocolError;
use crate::types::DeviceAddress;

/// Fields common to every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameHeader {
    /// Protocol id (high nibble of byte 3).
    pub protocol: u8,
    /// Sequence number (low nibble of byte 3).
    pub sequence: u8,
    /// Destination address (bytes 5–6).
    pub destination: DeviceAddress,
    /// Source address (bytes 7–8).
    pub source: DeviceAddress,
    /// Command byte (byte 9).
    pub command: u8,
}

impl FrameHeader {
    /// Decode the header and borrow the payload of a delimited frame.
    ///
    /// The payload runs from byte 10 up to, but excluding, the checksum and
    /// terminator. The checksum is not verified here.
    pub fn decode(frame: &[u8]) -> Result<(FrameHeader, &[u8]), ProtocolError> {
        if frame.len() < MIN_FRAME_SIZE {
            return Err(ProtocolError::FrameTooShort {
                expected: MIN_FRAME_SIZE,
                actual: frame.len(),
            });
        }

        let header = FrameHeader {
            protocol: frame[PROTOCOL_OFFSET] >> 4,
            sequence: frame[PROTOCOL_OFFSET] & 0x0F,
            destination: DeviceAddress::from_be_bytes([
                frame[DESTINATION_OFFSET],
                frame[DESTINATION_OFFSET + 1],
            ]),
            source: DeviceAddress::from_be_bytes([frame[SOURCE_OFFSET], frame[SOURCE_OFFSET + 1]]),
            command: frame[COMMAND_OFFSET],
        };

        let payload = frame
            .get(PAYLOAD_OFFSET..frame.len() - TRAILER_LEN)
            .ok_or(ProtocolError::PayloadOutOfBounds { len: frame.len() })?;

        Ok((header, payload))
    }
}
