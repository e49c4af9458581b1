//! Routing of decoded frames to the family decoders.

use crate::devices::{decode_binary_state, AirConditionerState, HeatingState};
use crate::events::{BusEvent, DeviceReport, Diagnostic};
use crate::header::FrameHeader;
use crate::registry::DiscoveryRegistry;
use crate::types::{BinaryCategory, DeviceAddress, DeviceFamily};

/// Pick the device end of a frame.
///
/// Frames to the controller are classified by their source, frames from the
/// controller by their destination. Anything else is not attributable.
pub fn resolve_device(header: &FrameHeader) -> Option<DeviceAddress> {
    if header.destination.is_controller() {
        Some(header.source)
    } else if header.source.is_controller() {
        Some(header.destination)
    } else {
        None
    }
}

/// Classify a checksum-valid frame and run the matching family decoder.
///
/// `frame` is the full frame, kept for diagnostics.
pub fn dispatch(
    header: &FrameHeader,
    payload: &[u8],
    frame: &[u8],
    registry: &mut DiscoveryRegistry,
) -> BusEvent {
    let Some(device) = resolve_device(header) else {
        return Diagnostic::UnknownAddressing {
            destination: header.destination,
            source: header.source,
            raw: frame.to_vec(),
        }
        .into();
    };

    let room = device.room();
    let Some(family) = device.family() else {
        return Diagnostic::UnknownDeviceFamily {
            family: device.family_code(),
            room,
        }
        .into();
    };

    let report = match family {
        DeviceFamily::Light => decode_binary_state(BinaryCategory::Light, room, payload, registry)
            .map(DeviceReport::BinaryState),
        DeviceFamily::Outlet => decode_binary_state(BinaryCategory::Outlet, room, payload, registry)
            .map(DeviceReport::BinaryState),
        DeviceFamily::Heating => HeatingState::decode(room, payload).map(DeviceReport::Heating),
        DeviceFamily::AirConditioner => {
            AirConditionerState::decode(room, payload).map(DeviceReport::AirConditioner)
        }
    };

    match report {
        Ok(report) => BusEvent::Device {
            header: *header,
            report,
        },
        Err(error) => Diagnostic::Rejected {
            error,
            raw: frame.to_vec(),
        }
        .into(),
    }
}
