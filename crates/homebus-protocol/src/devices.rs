//! Per-family payload decoders.
//!
//! ## Payload layouts
//!
//! | Family          | Bytes | Layout                                                         |
//! |-----------------|-------|----------------------------------------------------------------|
//! | Light / Outlet  | 8     | one byte per slot, `0xFF` = on                                 |
//! | Heating         | 7     | flags, away, target, hot water, current, heating water, error  |
//! | Air conditioner | 6     | power, mode, fan, (unused), current, target                    |

use serde::Serialize;
use tracing::debug;

use crate::constants::*;
use crate::error::ProtocolError;
use crate::registry::DiscoveryRegistry;
use crate::types::{AcMode, BinaryCategory, DeviceFamily, FanSpeed, SlotSet, SwitchState};

/// Borrow the first `len` payload bytes, or fail for `family`.
fn require(family: DeviceFamily, payload: &[u8], len: usize) -> Result<&[u8], ProtocolError> {
    payload.get(..len).ok_or(ProtocolError::PayloadTooShort {
        family,
        expected: len,
        actual: payload.len(),
    })
}

// ============================================================================
// Binary state (lights / outlets)
// ============================================================================

/// State of one discovered slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotReport {
    /// Slot id (0–7).
    pub slot: u8,
    /// Current state.
    pub state: SwitchState,
}

/// Result of decoding one light/outlet frame.
///
/// When `discovery_skipped` is set the frame carried no usable state: `slots`
/// is empty and sinks should not treat the report as a state change. It is
/// still a decoded frame and counts as one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinaryStateReport {
    /// Light or outlet.
    pub category: BinaryCategory,
    /// Room id.
    pub room: u8,
    /// States of every discovered slot in the room, ascending.
    pub slots: Vec<SlotReport>,
    /// Slots this frame added to the registry.
    pub newly_discovered: SlotSet,
    /// Every slot read on, so discovery and reporting were skipped.
    pub discovery_skipped: bool,
}

/// Decode a light/outlet payload and update the registry.
///
/// When all eight slots read `0xFF` the frame is ignored: absent slots may be
/// padded to `0xFF`, so real slots cannot be told apart. Otherwise every on
/// slot is recorded, and every slot known for the room (including ones found
/// in earlier frames) is reported.
pub fn decode_binary_state(
    category: BinaryCategory,
    room: u8,
    payload: &[u8],
    registry: &mut DiscoveryRegistry,
) -> Result<BinaryStateReport, ProtocolError> {
    let bytes = require(category.family(), payload, BINARY_SLOT_COUNT)?;

    if bytes.iter().all(|&b| b == SLOT_ON) {
        debug!(%category, room, "all slots on, skipping discovery");
        return Ok(BinaryStateReport {
            category,
            room,
            slots: Vec::new(),
            newly_discovered: SlotSet::new(),
            discovery_skipped: true,
        });
    }

    let mut newly_discovered = SlotSet::new();
    for (slot, &byte) in (0u8..).zip(bytes) {
        if SwitchState::from_byte(byte).is_on() && registry.insert(category, room, slot) {
            debug!(%category, room, slot, "discovered slot");
            newly_discovered.insert(slot);
        }
    }

    let slots = registry
        .slots(category, room)
        .iter()
        .map(|slot| SlotReport {
            slot,
            state: SwitchState::from_byte(bytes[usize::from(slot)]),
        })
        .collect();

    Ok(BinaryStateReport {
        category,
        room,
        slots,
        newly_discovered,
        discovery_skipped: false,
    })
}

// ============================================================================
// Heating
// ============================================================================

/// Heating controller state for one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeatingState {
    /// Room id.
    pub room: u8,
    /// Space heating running.
    pub heating_on: bool,
    /// Hot water running.
    pub hot_water_on: bool,
    /// Away mode set.
    pub away_mode: bool,
    /// Target room temperature (°C).
    pub target_temp: u8,
    /// Hot water temperature (°C).
    pub hot_water_temp: u8,
    /// Current room temperature (°C).
    pub current_temp: u8,
    /// Heating water temperature (°C).
    pub heating_water_temp: u8,
    /// Boiler error code, 0 when healthy.
    pub boiler_error_code: u8,
}

impl HeatingState {
    /// Decode a heating payload (7 bytes used).
    pub fn decode(room: u8, payload: &[u8]) -> Result<Self, ProtocolError> {
        let p = require(DeviceFamily::Heating, payload, HEATING_PAYLOAD_LEN)?;
        Ok(HeatingState {
            room,
            heating_on: p[0] >> 4 == 1,
            hot_water_on: p[0] & 0x0F == 2,
            away_mode: p[1] & 0x0F == 1,
            target_temp: p[2],
            hot_water_temp: p[3],
            current_temp: p[4],
            heating_water_temp: p[5],
            boiler_error_code: p[6],
        })
    }
}

// ============================================================================
// Air conditioning
// ============================================================================

/// Air-conditioner state for one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AirConditionerState {
    /// Room id.
    pub room: u8,
    /// Unit powered on.
    pub power_on: bool,
    /// Operating mode.
    pub mode: AcMode,
    /// Fan speed.
    pub fan_speed: FanSpeed,
    /// Current room temperature (°C).
    pub current_temp: u8,
    /// Target temperature (°C).
    pub target_temp: u8,
}

impl AirConditionerState {
    /// Decode an air-conditioner payload (6 bytes used).
    pub fn decode(room: u8, payload: &[u8]) -> Result<Self, ProtocolError> {
        let p = require(DeviceFamily::AirConditioner, payload, AIR_CONDITIONER_PAYLOAD_LEN)?;
        Ok(AirConditionerState {
            room,
            power_on: p[0] >> 4 == 1,
            mode: AcMode::from(p[1]),
            fan_speed: FanSpeed::from(p[2]),
            current_temp: p[4],
            target_temp: p[5],
        })
    }
}
