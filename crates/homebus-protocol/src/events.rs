//! Events produced by the decoder.
//!
//! Every completed (or abandoned) frame yields at most one [`BusEvent`]. Device
//! state and diagnostics are plain values; turning them into log lines or
//! telemetry is up to the [`EventSink`](crate::EventSink).

use std::fmt;

use serde::{Serialize, Serializer};

use crate::devices::{AirConditionerState, BinaryStateReport, HeatingState};
use crate::error::ProtocolError;
use crate::header::FrameHeader;
use crate::types::{DeviceAddress, DeviceFamily};

fn serialize_hex<T: AsRef<[u8]>, S: Serializer>(
    bytes: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode_upper(bytes))
}

/// One decoder output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BusEvent {
    /// A well-formed frame attributed to a known device.
    Device {
        /// Header of the frame.
        header: FrameHeader,
        /// Decoded device state.
        report: DeviceReport,
    },
    /// A frame that was dropped or could not be attributed.
    Diagnostic(Diagnostic),
}

impl BusEvent {
    /// The device report, if this is a device event.
    pub fn report(&self) -> Option<&DeviceReport> {
        match self {
            BusEvent::Device { report, .. } => Some(report),
            BusEvent::Diagnostic(_) => None,
        }
    }

    /// The diagnostic, if this is a diagnostic event.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            BusEvent::Diagnostic(diagnostic) => Some(diagnostic),
            BusEvent::Device { .. } => None,
        }
    }
}

impl From<Diagnostic> for BusEvent {
    fn from(diagnostic: Diagnostic) -> Self {
        BusEvent::Diagnostic(diagnostic)
    }
}

/// Decoded state, one variant per device family decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decoder", rename_all = "snake_case")]
pub enum DeviceReport {
    /// Light or outlet slots.
    BinaryState(BinaryStateReport),
    /// Heating controller.
    Heating(HeatingState),
    /// Air conditioner.
    AirConditioner(AirConditionerState),
}

impl DeviceReport {
    /// Family the report was decoded for.
    pub fn family(&self) -> DeviceFamily {
        match self {
            DeviceReport::BinaryState(report) => report.category.family(),
            DeviceReport::Heating(_) => DeviceFamily::Heating,
            DeviceReport::AirConditioner(_) => DeviceFamily::AirConditioner,
        }
    }

    /// Room the report refers to.
    pub fn room(&self) -> u8 {
        match self {
            DeviceReport::BinaryState(report) => report.room,
            DeviceReport::Heating(state) => state.room,
            DeviceReport::AirConditioner(state) => state.room,
        }
    }
}

/// Why a frame produced no device state.
///
/// All of these are recovered locally; the decoder keeps listening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "diagnostic", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Terminator seen before the minimum frame length.
    FrameTooShort {
        /// Bytes buffered, markers and terminator included.
        len: usize,
        /// Buffered bytes.
        #[serde(serialize_with = "serialize_hex")]
        raw: Vec<u8>,
    },
    /// Assembly buffer filled without a terminator.
    BufferOverflow {
        /// Bytes discarded.
        len: usize,
    },
    /// Frame was delimited but failed checksum or payload validation.
    Rejected {
        /// What failed.
        error: ProtocolError,
        /// The full frame.
        #[serde(serialize_with = "serialize_hex")]
        raw: Vec<u8>,
    },
    /// Neither address is the controller.
    UnknownAddressing {
        /// Destination address.
        destination: DeviceAddress,
        /// Source address.
        source: DeviceAddress,
        /// The full frame.
        #[serde(serialize_with = "serialize_hex")]
        raw: Vec<u8>,
    },
    /// Address family code has no decoder.
    UnknownDeviceFamily {
        /// Raw family code.
        family: u8,
        /// Room id.
        room: u8,
    },
}

impl Diagnostic {
    /// Stable snake_case tag, used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::FrameTooShort { .. } => "frame_too_short",
            Diagnostic::BufferOverflow { .. } => "buffer_overflow",
            Diagnostic::Rejected { error, .. } => error.kind(),
            Diagnostic::UnknownAddressing { .. } => "unknown_addressing",
            Diagnostic::UnknownDeviceFamily { .. } => "unknown_device_family",
        }
    }

    /// Raw frame bytes carried by the diagnostic, if any.
    pub fn raw(&self) -> Option<&[u8]> {
        match self {
            Diagnostic::FrameTooShort { raw, .. }
            | Diagnostic::Rejected { raw, .. }
            | Diagnostic::UnknownAddressing { raw, .. } => Some(raw),
            Diagnostic::BufferOverflow { .. } | Diagnostic::UnknownDeviceFamily { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::FrameTooShort { len, .. } => {
                write!(f, "frame too short: {} bytes before terminator", len)
            }
            Diagnostic::BufferOverflow { len } => {
                write!(f, "no terminator within {} bytes, buffer dropped", len)
            }
            Diagnostic::Rejected { error, .. } => write!(f, "frame rejected: {}", error),
            Diagnostic::UnknownAddressing {
                destination,
                source,
                ..
            } => write!(
                f,
                "neither end is the controller: {} -> {}",
                source, destination
            ),
            Diagnostic::UnknownDeviceFamily { family, room } => {
                write!(f, "unknown device family 0x{:02X} in room {}", family, room)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::UnknownDeviceFamily {
            family: 0x44,
            room: 3,
        };
        assert_eq!(diag.to_string(), "unknown device family 0x44 in room 3");
    }

    #[test]
    fn test_diagnostic_kind() {
        let diag = Diagnostic::Rejected {
            error: ProtocolError::ChecksumMismatch {
                computed: 1,
                received: 2,
            },
            raw: vec![],
        };
        assert_eq!(diag.kind(), "checksum_mismatch");
        assert_eq!(Diagnostic::BufferOverflow { len: 256 }.kind(), "buffer_overflow");
        assert_eq!(Diagnostic::BufferOverflow { len: 256 }.raw(), None);
    }

    #[test]
    fn test_diagnostic_json() {
        let event = BusEvent::from(Diagnostic::UnknownAddressing {
            destination: DeviceAddress(0x0E01),
            source: DeviceAddress(0x3B02),
            raw: vec![0xAA, 0x55, 0x0D],
        });
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "diagnostic");
        assert_eq!(json["diagnostic"], "unknown_addressing");
        assert_eq!(json["destination"], 0x0E01);
        assert_eq!(json["raw"], "AA550D");
    }

    #[test]
    fn test_rejected_json_carries_error() {
        let event = BusEvent::from(Diagnostic::Rejected {
            error: ProtocolError::ChecksumMismatch {
                computed: 0x24,
                received: 0x00,
            },
            raw: vec![0x01],
        });
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["diagnostic"], "rejected");
        assert_eq!(json["error"]["error"], "checksum_mismatch");
        assert_eq!(json["error"]["computed"], 0x24);
    }
}
