//! Protocol constants
//!
//! Byte values, offsets and sizes of the home-automation bus frame format.
//!
//! ```text
//! +----+----+-----+-----------+-----+--------+--------+-----+---------+-------+----+----+
//! | AA | 55 | rsv | proto/seq | rsv | dst BE | src BE | cmd | payload | cksum | 0D | 0D |
//! +----+----+-----+-----------+-----+--------+--------+-----+---------+-------+----+----+
//!   0    1     2        3        4    5..=6    7..=8     9    10..     len-3  len-2 len-1
//! ```

use std::ops::RangeInclusive;

// ============================================================================
// Framing
// ============================================================================

/// First start-of-frame marker byte.
pub const FRAME_START_1: u8 = 0xAA;
/// Second start-of-frame marker byte.
pub const FRAME_START_2: u8 = 0x55;
/// Two-byte end-of-frame terminator.
pub const FRAME_END: [u8; 2] = [0x0D, 0x0D];

/// Shortest frame accepted by the decode pipeline.
pub const MIN_FRAME_SIZE: usize = 21;
/// Capacity of the assembly buffer. Reaching it without a terminator forces a reset.
pub const MAX_FRAME_SIZE: usize = 256;

// ============================================================================
// Field offsets
// ============================================================================

/// Protocol id (high nibble) and sequence number (low nibble).
pub const PROTOCOL_OFFSET: usize = 3;
/// Destination address, big-endian.
pub const DESTINATION_OFFSET: usize = 5;
/// Source address, big-endian.
pub const SOURCE_OFFSET: usize = 7;
/// Command byte.
pub const COMMAND_OFFSET: usize = 9;
/// First payload byte.
pub const PAYLOAD_OFFSET: usize = 10;
/// Bytes after the payload: checksum plus the two terminator bytes.
pub const TRAILER_LEN: usize = 3;

/// Bytes covered by the checksum (marker bytes excluded).
pub const CHECKSUM_RANGE: RangeInclusive<usize> = 2..=17;
/// Offset of the checksum byte.
pub const CHECKSUM_OFFSET: usize = 18;

// ============================================================================
// Addressing
// ============================================================================

/// Address of the bus controller (wallpad). One side of every attributable frame.
pub const CONTROLLER_ADDRESS: u16 = 0x0100;

/// Family code for lights.
pub const FAMILY_LIGHT: u8 = 0x0E;
/// Family code for switched outlets.
pub const FAMILY_OUTLET: u8 = 0x3B;
/// Family code for the heating/boiler controller.
pub const FAMILY_HEATING: u8 = 0x36;
/// Family code for air conditioners.
pub const FAMILY_AIR_CONDITIONER: u8 = 0x39;

// ============================================================================
// Payload layouts
// ============================================================================

/// Slots per binary-state (light/outlet) payload.
pub const BINARY_SLOT_COUNT: usize = 8;
/// Payload byte meaning "slot is on".
pub const SLOT_ON: u8 = 0xFF;
/// Bytes read by the heating decoder.
pub const HEATING_PAYLOAD_LEN: usize = 7;
/// Bytes read by the air-conditioning decoder.
pub const AIR_CONDITIONER_PAYLOAD_LEN: usize = 6;

/// AC mode: cooling.
pub const AC_MODE_COOLING: u8 = 0x00;
/// AC mode: fan only.
pub const AC_MODE_FAN_ONLY: u8 = 0x01;
/// AC mode: dehumidify.
pub const AC_MODE_DRY: u8 = 0x02;
/// AC mode: automatic.
pub const AC_MODE_AUTO: u8 = 0x03;

/// AC fan: off.
pub const FAN_SPEED_OFF: u8 = 0x00;
/// AC fan: low.
pub const FAN_SPEED_LOW: u8 = 0x01;
/// AC fan: medium.
pub const FAN_SPEED_MEDIUM: u8 = 0x02;
/// AC fan: high.
pub const FAN_SPEED_HIGH: u8 = 0x03;
