//! Common types used in the protocol.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::constants::*;

/// A 16-bit bus address: family code in the high byte, room id in the low byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeviceAddress(pub u16);

impl DeviceAddress {
    /// The bus controller.
    pub const CONTROLLER: DeviceAddress = DeviceAddress(CONTROLLER_ADDRESS);

    /// Build an address from its big-endian wire bytes.
    pub const fn from_be_bytes(bytes: [u8; 2]) -> Self {
        DeviceAddress(u16::from_be_bytes(bytes))
    }

    /// Build an address from a family code and room id.
    pub const fn from_parts(family_code: u8, room: u8) -> Self {
        DeviceAddress(((family_code as u16) << 8) | room as u16)
    }

    /// Raw family code (high byte).
    pub const fn family_code(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Room id (low byte).
    pub const fn room(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Whether this is the controller sentinel.
    pub const fn is_controller(self) -> bool {
        self.0 == CONTROLLER_ADDRESS
    }

    /// The device family, if the family code is one we decode.
    pub fn family(self) -> Option<DeviceFamily> {
        DeviceFamily::from_code(self.family_code())
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Device families carried on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    /// Lights (binary state, 8 slots per room).
    Light,
    /// Switched outlets (binary state, 8 slots per room).
    Outlet,
    /// Heating/boiler controller.
    Heating,
    /// Air conditioner.
    AirConditioner,
}

impl DeviceFamily {
    /// Look up a family by its address high byte.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            FAMILY_LIGHT => Some(DeviceFamily::Light),
            FAMILY_OUTLET => Some(DeviceFamily::Outlet),
            FAMILY_HEATING => Some(DeviceFamily::Heating),
            FAMILY_AIR_CONDITIONER => Some(DeviceFamily::AirConditioner),
            _ => None,
        }
    }

    /// The address high byte for this family.
    pub const fn code(self) -> u8 {
        match self {
            DeviceFamily::Light => FAMILY_LIGHT,
            DeviceFamily::Outlet => FAMILY_OUTLET,
            DeviceFamily::Heating => FAMILY_HEATING,
            DeviceFamily::AirConditioner => FAMILY_AIR_CONDITIONER,
        }
    }

    /// The binary-state category, for lights and outlets.
    pub const fn binary_category(self) -> Option<BinaryCategory> {
        match self {
            DeviceFamily::Light => Some(BinaryCategory::Light),
            DeviceFamily::Outlet => Some(BinaryCategory::Outlet),
            DeviceFamily::Heating | DeviceFamily::AirConditioner => None,
        }
    }

    /// Snake-case name, suitable for metric labels.
    pub const fn as_str(self) -> &'static str {
        match self {
            DeviceFamily::Light => "light",
            DeviceFamily::Outlet => "outlet",
            DeviceFamily::Heating => "heating",
            DeviceFamily::AirConditioner => "air_conditioner",
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFamily::AirConditioner => f.write_str("air conditioner"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Families handled by the binary-state decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryCategory {
    /// Lights.
    Light,
    /// Outlets.
    Outlet,
}

impl BinaryCategory {
    /// The owning device family.
    pub const fn family(self) -> DeviceFamily {
        match self {
            BinaryCategory::Light => DeviceFamily::Light,
            BinaryCategory::Outlet => DeviceFamily::Outlet,
        }
    }

    /// Snake-case name, suitable for metric labels.
    pub const fn as_str(self) -> &'static str {
        self.family().as_str()
    }
}

impl fmt::Display for BinaryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On/off state of one binary slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchState {
    /// Payload byte was anything other than `0xFF`.
    Off,
    /// Payload byte was `0xFF`.
    On,
}

impl SwitchState {
    /// Interpret one binary-state payload byte.
    pub const fn from_byte(byte: u8) -> Self {
        if byte == SLOT_ON {
            SwitchState::On
        } else {
            SwitchState::Off
        }
    }

    /// Whether the slot is on.
    pub const fn is_on(self) -> bool {
        matches!(self, SwitchState::On)
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchState::On => f.write_str("ON"),
            SwitchState::Off => f.write_str("OFF"),
        }
    }
}

/// A set of binary slot ids (0–7), stored as a bit mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SlotSet(u8);

impl SlotSet {
    /// An empty set.
    pub const fn new() -> Self {
        SlotSet(0)
    }

    /// Insert a slot. Returns `true` if it was not already present.
    ///
    /// Slots outside 0–7 are ignored and return `false`.
    pub fn insert(&mut self, slot: u8) -> bool {
        if usize::from(slot) >= BINARY_SLOT_COUNT {
            return false;
        }
        let bit = 1u8 << slot;
        let added = self.0 & bit == 0;
        self.0 |= bit;
        added
    }

    /// Whether the slot is present.
    pub const fn contains(self, slot: u8) -> bool {
        slot < BINARY_SLOT_COUNT as u8 && self.0 & (1 << slot) != 0
    }

    /// Number of slots present.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether no slot is present.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bit mask (bit `n` = slot `n`).
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Slots in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..BINARY_SLOT_COUNT as u8).filter(move |&slot| self.contains(slot))
    }
}

impl FromIterator<u8> for SlotSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = SlotSet::new();
        for slot in iter {
            set.insert(slot);
        }
        set
    }
}

impl Serialize for SlotSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Air-conditioner operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcMode {
    /// Cooling.
    Cooling,
    /// Fan only.
    FanOnly,
    /// Dehumidify.
    Dry,
    /// Automatic.
    Auto,
    /// Unrecognized mode byte.
    Unknown(u8),
}

impl From<u8> for AcMode {
    fn from(code: u8) -> Self {
        match code {
            AC_MODE_COOLING => AcMode::Cooling,
            AC_MODE_FAN_ONLY => AcMode::FanOnly,
            AC_MODE_DRY => AcMode::Dry,
            AC_MODE_AUTO => AcMode::Auto,
            _ => AcMode::Unknown(code),
        }
    }
}

impl fmt::Display for AcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcMode::Cooling => write!(f, "Cooling"),
            AcMode::FanOnly => write!(f, "Fan Only"),
            AcMode::Dry => write!(f, "Dry"),
            AcMode::Auto => write!(f, "Auto"),
            AcMode::Unknown(code) => write!(f, "Unknown (0x{:02X})", code),
        }
    }
}

/// Air-conditioner fan speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FanSpeed {
    /// Fan off.
    Off,
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
    /// Unrecognized fan byte.
    Unknown(u8),
}

impl From<u8> for FanSpeed {
    fn from(code: u8) -> Self {
        match code {
            FAN_SPEED_OFF => FanSpeed::Off,
            FAN_SPEED_LOW => FanSpeed::Low,
            FAN_SPEED_MEDIUM => FanSpeed::Medium,
            FAN_SPEED_HIGH => FanSpeed::High,
            _ => FanSpeed::Unknown(code),
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanSpeed::Off => write!(f, "Off"),
            FanSpeed::Low => write!(f, "Low"),
            FanSpeed::Medium => write!(f, "Medium"),
            FanSpeed::High => write!(f, "High"),
            FanSpeed::Unknown(code) => write!(f, "Unknown (0x{:02X})", code),
        }
    }
}
