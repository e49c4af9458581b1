//! The decode pipeline and its caller-facing session type.

use tracing::trace;

use crate::assembler::{Assembled, AssemblerState, FrameAssembler};
use crate::checksum;
use crate::dispatch::dispatch;
use crate::events::{BusEvent, Diagnostic};
use crate::header::FrameHeader;
use crate::registry::DiscoveryRegistry;

/// Receiver of decoder output.
pub trait EventSink {
    /// Handle one event. Must not block the decoder for long.
    fn handle(&mut self, event: BusEvent);
}

impl EventSink for Vec<BusEvent> {
    fn handle(&mut self, event: BusEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn handle(&mut self, event: BusEvent) {
        (**self).handle(event)
    }
}

/// Adapts a closure into an [`EventSink`].
pub struct FnSink<F>(pub F);

impl<F: FnMut(BusEvent)> EventSink for FnSink<F> {
    fn handle(&mut self, event: BusEvent) {
        (self.0)(event)
    }
}

/// A passive bus decoder.
///
/// Owns the partial frame and the discovery registry. One instance per byte
/// source; access from several sources must be serialized by the caller.
///
/// ```
/// use homebus_protocol::{BusDecoder, DeviceReport};
///
/// let mut decoder = BusDecoder::new();
/// let events = decoder.feed(&[
///     0xAA, 0x55, 0x00, 0x10, 0x00, 0x01, 0x00, 0x0E, 0x05, 0x01, 0xFF,
///     0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x24, 0x0D, 0x0D,
/// ]);
///
/// assert_eq!(events.len(), 1);
/// assert!(matches!(events[0].report(), Some(DeviceReport::BinaryState(_))));
/// ```
#[derive(Debug, Default)]
pub struct BusDecoder {
    assembler: FrameAssembler,
    registry: DiscoveryRegistry,
}

impl BusDecoder {
    /// Create a decoder with an empty registry.
    pub fn new() -> Self {
        BusDecoder {
            assembler: FrameAssembler::new(),
            registry: DiscoveryRegistry::new(),
        }
    }

    /// Feed one byte. Returns an event when the byte completed or abandoned a frame.
    pub fn push_byte(&mut self, byte: u8) -> Option<BusEvent> {
        let event = match self.assembler.push(byte)? {
            Assembled::Frame(frame) => self.decode_frame(&frame),
            Assembled::TooShort(frame) => Diagnostic::FrameTooShort {
                len: frame.len(),
                raw: frame.to_vec(),
            }
            .into(),
            Assembled::Overflow { len } => Diagnostic::BufferOverflow { len }.into(),
        };
        Some(event)
    }

    /// Feed a chunk of bytes and collect the resulting events.
    pub fn feed(&mut self, data: &[u8]) -> Vec<BusEvent> {
        let mut events = Vec::new();
        self.feed_into(data, &mut events);
        events
    }

    /// Feed a chunk of bytes, handing each event to `sink` as it is produced.
    pub fn feed_into<S: EventSink + ?Sized>(&mut self, data: &[u8], sink: &mut S) {
        for &byte in data {
            if let Some(event) = self.push_byte(byte) {
                sink.handle(event);
            }
        }
    }

    /// Run checksum, header decoding and dispatch on an already-delimited frame.
    pub fn decode_frame(&mut self, frame: &[u8]) -> BusEvent {
        if let Err(error) = checksum::verify(frame) {
            trace!(%error, "dropping frame");
            return Diagnostic::Rejected {
                error,
                raw: frame.to_vec(),
            }
            .into();
        }

        let (header, payload) = match FrameHeader::decode(frame) {
            Ok(decoded) => decoded,
            Err(error) => {
                return Diagnostic::Rejected {
                    error,
                    raw: frame.to_vec(),
                }
                .into()
            }
        };

        trace!(
            protocol = header.protocol,
            sequence = header.sequence,
            destination = %header.destination,
            source = %header.source,
            command = header.command,
            "frame accepted"
        );

        dispatch(&header, payload, frame, &mut self.registry)
    }

    /// Devices discovered so far.
    pub fn registry(&self) -> &DiscoveryRegistry {
        &self.registry
    }

    /// Current assembler state.
    pub fn assembler_state(&self) -> AssemblerState {
        self.assembler.state()
    }

    /// Drop any partial frame. Discoveries are kept.
    pub fn reset(&mut self) {
        self.assembler.reset();
    }
}
