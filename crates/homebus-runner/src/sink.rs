//! Event sinks: log records, JSON lines and metrics.

use std::collections::BTreeMap;
use std::io::Write;

use homebus_metrics::{metric_defs, MetricLabels};
use homebus_protocol::{
    AirConditionerState, BinaryStateReport, BusEvent, DeviceReport, Diagnostic, EventSink,
    FrameHeader, HeatingState,
};
use tracing::{debug, info, warn};

use crate::error::RunnerError;

/// Hands every event to two sinks in turn.
pub struct Tee<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn handle(&mut self, event: BusEvent) {
        self.0.handle(event.clone());
        self.1.handle(event);
    }
}

// ============================================================================
// Log output
// ============================================================================

/// Renders events as `tracing` records: `info` for device state, `warn` for
/// diagnostics.
#[derive(Debug, Default)]
pub struct LogSink {
    rooms: BTreeMap<u8, String>,
}

impl LogSink {
    /// `rooms` maps room ids to display names.
    pub fn new(rooms: BTreeMap<u8, String>) -> Self {
        LogSink { rooms }
    }

    /// Display name for a room, e.g. `Kitchen (room 5)` or `room 5`.
    pub fn room_label(&self, room: u8) -> String {
        match self.rooms.get(&room) {
            Some(name) => format!("{} (room {})", name, room),
            None => format!("room {}", room),
        }
    }

    fn log_binary(&self, header: &FrameHeader, report: &BinaryStateReport) {
        let room = self.room_label(report.room);
        if report.discovery_skipped {
            debug!(
                category = %report.category,
                %room,
                sequence = header.sequence,
                "all slots on, frame ignored"
            );
            return;
        }
        for slot in report.newly_discovered.iter() {
            info!(
                category = %report.category,
                %room,
                slot,
                source = %header.source,
                "discovered {} {}",
                report.category,
                slot
            );
        }
        for slot in &report.slots {
            info!(
                category = %report.category,
                %room,
                slot = slot.slot,
                state = %slot.state,
                protocol = header.protocol,
                sequence = header.sequence,
                command = header.command,
                source = %header.source,
                destination = %header.destination,
                "{} {} slot {}: {}",
                report.category,
                room,
                slot.slot,
                slot.state
            );
        }
    }

    fn log_heating(&self, header: &FrameHeader, state: &HeatingState) {
        info!(
            room = %self.room_label(state.room),
            heating = state.heating_on,
            hot_water = state.hot_water_on,
            away = state.away_mode,
            target_c = state.target_temp,
            current_c = state.current_temp,
            hot_water_c = state.hot_water_temp,
            heating_water_c = state.heating_water_temp,
            protocol = header.protocol,
            sequence = header.sequence,
            command = header.command,
            source = %header.source,
            destination = %header.destination,
            "heating"
        );
        if state.boiler_error_code != 0 {
            warn!(
                room = %self.room_label(state.room),
                code = state.boiler_error_code,
                source = %header.source,
                "boiler reports error code {}",
                state.boiler_error_code
            );
        }
    }

    fn log_air_conditioner(&self, header: &FrameHeader, state: &AirConditionerState) {
        info!(
            room = %self.room_label(state.room),
            power = state.power_on,
            mode = %state.mode,
            fan = %state.fan_speed,
            current_c = state.current_temp,
            target_c = state.target_temp,
            protocol = header.protocol,
            sequence = header.sequence,
            command = header.command,
            source = %header.source,
            destination = %header.destination,
            "air conditioner"
        );
    }

    fn log_diagnostic(&self, diagnostic: &Diagnostic) {
        match diagnostic.raw() {
            Some(raw) => warn!(
                kind = diagnostic.kind(),
                raw = %hex::encode_upper(raw),
                "{}",
                diagnostic
            ),
            None => warn!(kind = diagnostic.kind(), "{}", diagnostic),
        }
    }
}

impl EventSink for LogSink {
    fn handle(&mut self, event: BusEvent) {
        match &event {
            BusEvent::Device { header, report } => match report {
                DeviceReport::BinaryState(report) => self.log_binary(header, report),
                DeviceReport::Heating(state) => self.log_heating(header, state),
                DeviceReport::AirConditioner(state) => self.log_air_conditioner(header, state),
            },
            BusEvent::Diagnostic(diagnostic) => self.log_diagnostic(diagnostic),
        }
    }
}

// ============================================================================
// JSON output
// ============================================================================

/// Writes one JSON object per event, newline separated.
///
/// The first write error is kept and returned by [`JsonSink::finish`]; later
/// events are dropped.
pub struct JsonSink<W: Write> {
    writer: W,
    error: Option<RunnerError>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        JsonSink {
            writer,
            error: None,
        }
    }

    /// Write any serializable record as one line.
    pub fn write_record<T: serde::Serialize + ?Sized>(&mut self, record: &T) {
        if self.error.is_some() {
            return;
        }
        let result = serde_json::to_writer(&mut self.writer, record)
            .map_err(RunnerError::from)
            .and_then(|()| self.writer.write_all(b"\n").map_err(RunnerError::from));
        if let Err(e) = result {
            self.error = Some(e);
        }
    }

    /// Whether a write has failed.
    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Take the first write error, if any.
    pub fn take_error(&mut self) -> Option<RunnerError> {
        self.error.take()
    }

    /// Flush and hand the writer back, or the first error seen.
    pub fn finish(mut self) -> Result<W, RunnerError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> EventSink for JsonSink<W> {
    fn handle(&mut self, event: BusEvent) {
        self.write_record(&event);
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// Records events through the `metrics` facade. A no-op until a recorder is
/// installed.
#[derive(Debug, Clone)]
pub struct MetricsSink {
    labels: MetricLabels,
}

impl MetricsSink {
    pub fn new(labels: MetricLabels) -> Self {
        MetricsSink { labels }
    }

    /// Count raw bytes read from the bus.
    pub fn record_bytes(&self, n: usize) {
        let labels = self.labels.to_labels();
        metrics::counter!(metric_defs::BYTES_RECEIVED.name, labels.as_slice()).increment(n as u64);
    }

    fn record_temperature(&self, family: &'static str, room: u8, reading: &'static str, value: u8) {
        let labels = self.labels.with(&[
            ("family", family.to_string()),
            ("room", room.to_string()),
            ("reading", reading.to_string()),
        ]);
        metrics::histogram!(metric_defs::TEMPERATURE.name, labels.as_slice())
            .record(f64::from(value));
    }

    fn record_report(&self, report: &DeviceReport) {
        let family = report.family().as_str();
        let labels = self.labels.with(&[("family", family.to_string())]);
        metrics::counter!(metric_defs::FRAMES_DECODED.name, labels.as_slice()).increment(1);

        match report {
            DeviceReport::BinaryState(report) => {
                let found = report.newly_discovered.len();
                if found > 0 {
                    let category = report.category.as_str().to_string();
                    let labels = self.labels.with(&[("category", category)]);
                    metrics::counter!(metric_defs::SLOTS_DISCOVERED.name, labels.as_slice())
                        .increment(found as u64);
                    metrics::gauge!(metric_defs::KNOWN_SLOTS.name, labels.as_slice())
                        .increment(found as f64);
                }
            }
            DeviceReport::Heating(state) => {
                self.record_temperature(family, state.room, "current", state.current_temp);
                self.record_temperature(family, state.room, "target", state.target_temp);
                self.record_temperature(family, state.room, "hot_water", state.hot_water_temp);
                let heating_water = state.heating_water_temp;
                self.record_temperature(family, state.room, "heating_water", heating_water);
            }
            DeviceReport::AirConditioner(state) => {
                self.record_temperature(family, state.room, "current", state.current_temp);
                self.record_temperature(family, state.room, "target", state.target_temp);
            }
        }
    }
}

impl EventSink for MetricsSink {
    fn handle(&mut self, event: BusEvent) {
        match &event {
            BusEvent::Device { report, .. } => self.record_report(report),
            BusEvent::Diagnostic(diagnostic) => {
                let labels = self.labels.with(&[("kind", diagnostic.kind().to_string())]);
                metrics::counter!(metric_defs::DIAGNOSTICS.name, labels.as_slice()).increment(1);
            }
        }
    }
}

/// The output side of a run: log records or JSON lines.
pub enum OutputSink<W: Write> {
    Log(LogSink),
    Json(JsonSink<W>),
}

impl<W: Write> OutputSink<W> {
    /// Take the first JSON write error, if any.
    pub fn take_error(&mut self) -> Option<RunnerError> {
        match self {
            OutputSink::Json(sink) => sink.take_error(),
            OutputSink::Log(_) => None,
        }
    }
}

impl<W: Write> EventSink for OutputSink<W> {
    fn handle(&mut self, event: BusEvent) {
        match self {
            OutputSink::Log(sink) => sink.handle(event),
            OutputSink::Json(sink) => sink.handle(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homebus_protocol::BusDecoder;

    const LIGHT_FRAME: [u8; 21] = [
        0xAA, 0x55, 0x00, 0x10, 0x00, 0x01, 0x00, 0x0E, 0x05, 0x01, 0xFF, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x24, 0x0D, 0x0D,
    ];

    #[test]
    fn test_room_label() {
        let mut rooms = BTreeMap::new();
        rooms.insert(5, "Kitchen".to_string());
        let sink = LogSink::new(rooms);
        assert_eq!(sink.room_label(5), "Kitchen (room 5)");
        assert_eq!(sink.room_label(6), "room 6");
    }

    #[test]
    fn test_json_lines() {
        let mut decoder = BusDecoder::new();
        let mut sink = JsonSink::new(Vec::new());
        decoder.feed_into(&LIGHT_FRAME, &mut sink);
        decoder.feed_into(&[0xAA, 0x55, 0x0D, 0x0D], &mut sink);

        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "device");
        assert_eq!(lines[0]["report"]["decoder"], "binary_state");
        assert_eq!(lines[0]["report"]["slots"][0]["state"], "on");
        assert_eq!(lines[1]["diagnostic"], "frame_too_short");
        assert_eq!(lines[1]["raw"], "AA550D0D");
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_keeps_first_error() {
        let mut sink = JsonSink::new(FailingWriter);
        sink.handle(Diagnostic::BufferOverflow { len: 256 }.into());
        sink.handle(Diagnostic::BufferOverflow { len: 256 }.into());
        assert!(sink.has_failed());
        assert!(sink.finish().is_err());
    }

    #[test]
    fn test_tee_delivers_to_both() {
        let mut left: Vec<BusEvent> = Vec::new();
        let mut right: Vec<BusEvent> = Vec::new();
        let mut decoder = BusDecoder::new();
        decoder.feed_into(&LIGHT_FRAME, &mut Tee(&mut left, &mut right));
        assert_eq!(left.len(), 1);
        assert_eq!(left, right);
    }

    #[test]
    fn test_sinks_without_recorder() {
        let mut decoder = BusDecoder::new();
        let mut sink = Tee(LogSink::default(), MetricsSink::new(MetricLabels::new("test")));
        decoder.feed_into(&LIGHT_FRAME, &mut sink);
        decoder.feed_into(&[0xAA, 0x55, 0x0D, 0x0D], &mut sink);
        sink.1.record_bytes(25);
    }
}
