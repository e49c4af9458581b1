//! Frame integrity check.
//!
//! The checksum is the wrapping 8-bit sum of bytes 2 through 17 (the marker
//! bytes are excluded), carried in byte 18. Any single-bit flip inside the
//! window changes the sum; multi-byte corruption can collide mod 256.

use crate::constants::{CHECKSUM_OFFSET, CHECKSUM_RANGE};
use crate::error::ProtocolError;

/// Compute the checksum of a candidate frame.
///
/// Returns `None` if the frame is too short to carry a checksum byte.
pub fn compute(frame: &[u8]) -> Option<u8> {
    if frame.len() <= CHECKSUM_OFFSET {
        return None;
    }
    frame
        .get(CHECKSUM_RANGE)
        .map(|window| window.iter().fold(0u8, |sum, &b| sum.wrapping_add(b)))
}

/// Verify the checksum byte of a candidate frame.
pub fn verify(frame: &[u8]) -> Result<(), ProtocolError> {
    match (compute(frame), frame.get(CHECKSUM_OFFSET)) {
        (Some(computed), Some(&received)) if computed == received => Ok(()),
        (Some(computed), Some(&received)) => Err(ProtocolError::ChecksumMismatch {
            computed,
            received,
        }),
        _ => Err(ProtocolError::FrameTooShort {
            expected: CHECKSUM_OFFSET + 1,
            actual: frame.len(),
        }),
    }
}

/// Whether the frame's checksum byte matches.
pub fn is_valid(frame: &[u8]) -> bool {
    verify(frame).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIGHT_FRAME: [u8; 21] = [
        0xAA, 0x55, 0x00, 0x10, 0x00, 0x01, 0x00, 0x0E, 0x05, 0x01, 0xFF, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x24, 0x0D, 0x0D,
    ];

    #[test]
    fn test_compute() {
        assert_eq!(compute(&LIGHT_FRAME), Some(0x24));
        assert!(is_valid(&LIGHT_FRAME));
    }

    #[test]
    fn test_marker_bytes_not_covered() {
        let mut frame = LIGHT_FRAME;
        frame[0] = 0x00;
        frame[1] = 0x00;
        assert!(is_valid(&frame));
    }

    #[test]
    fn test_mismatch() {
        let mut frame = LIGHT_FRAME;
        frame[18] = 0x25;
        assert_eq!(
            verify(&frame),
            Err(ProtocolError::ChecksumMismatch {
                computed: 0x24,
                received: 0x25
            })
        );
    }

    #[test]
    fn test_too_short() {
        assert_eq!(compute(&LIGHT_FRAME[..18]), None);
        assert_eq!(compute(&LIGHT_FRAME[..19]), Some(0x24));
        assert_eq!(
            verify(&LIGHT_FRAME[..10]),
            Err(ProtocolError::FrameTooShort {
                expected: 19,
                actual: 10
            })
        );
    }

    #[test]
    fn test_wrapping_sum() {
        let mut frame = [0xFFu8; 21];
        // 16 * 0xFF = 0xFF0 -> 0xF0
        frame[18] = 0xF0;
        assert!(is_valid(&frame));
    }
}
