//! Running totals and periodic throughput reports.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use homebus_protocol::{BusEvent, EventSink};
use serde::Serialize;

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    /// Raw bytes fed to the decoder.
    pub bytes: u64,
    /// Frames decoded into device state.
    pub frames_decoded: u64,
    /// Diagnostic count per kind.
    pub diagnostics: BTreeMap<&'static str, u64>,
}

impl DecodeStats {
    /// Count bytes read from the input.
    pub fn add_bytes(&mut self, n: usize) {
        self.bytes += n as u64;
    }

    /// Total events of any kind.
    pub fn total_events(&self) -> u64 {
        self.frames_decoded + self.total_diagnostics()
    }

    /// Total diagnostics of any kind.
    pub fn total_diagnostics(&self) -> u64 {
        self.diagnostics.values().sum()
    }
}

impl EventSink for DecodeStats {
    fn handle(&mut self, event: BusEvent) {
        match &event {
            BusEvent::Device { .. } => self.frames_decoded += 1,
            BusEvent::Diagnostic(diagnostic) => {
                *self.diagnostics.entry(diagnostic.kind()).or_insert(0) += 1;
            }
        }
    }
}

/// A throughput snapshot.
#[derive(Debug, Clone)]
pub struct PeriodicStats {
    /// Wall time since the run started.
    pub wall_elapsed: Duration,
    /// Cumulative bytes.
    pub total_bytes: u64,
    /// Cumulative decoded frames.
    pub total_frames: u64,
    /// Cumulative diagnostics.
    pub total_diagnostics: u64,
    /// Bytes per second over the last interval.
    pub byte_rate: f64,
    /// Decoded frames per second over the last interval.
    pub frame_rate: f64,
    /// Resident memory in bytes, 0 when unavailable.
    pub memory_bytes: usize,
}

impl PeriodicStats {
    /// Format memory size in human-readable format with fixed width.
    pub fn memory_human_readable(&self) -> String {
        let bytes = self.memory_bytes as f64;
        if bytes >= 1_073_741_824.0 {
            format!("{:>7.2} GB", bytes / 1_073_741_824.0)
        } else if bytes >= 1_048_576.0 {
            format!("{:>7.2} MB", bytes / 1_048_576.0)
        } else if bytes >= 1024.0 {
            format!("{:>7.2} KB", bytes / 1024.0)
        } else {
            format!("{:>7} B ", self.memory_bytes)
        }
    }
}

/// Emits a [`PeriodicStats`] at most once per interval.
#[derive(Debug)]
pub struct StatsReporter {
    interval: Option<Duration>,
    start: Instant,
    last_report: Instant,
    last_bytes: u64,
    last_frames: u64,
}

impl StatsReporter {
    /// `None` disables reporting.
    pub fn new(interval: Option<Duration>) -> Self {
        let now = Instant::now();
        StatsReporter {
            interval,
            start: now,
            last_report: now,
            last_bytes: 0,
            last_frames: 0,
        }
    }

    /// Return a snapshot if the interval has elapsed since the last one.
    pub fn check(&mut self, stats: &DecodeStats) -> Option<PeriodicStats> {
        let interval = self.interval?;
        let now = Instant::now();
        let since_last = now.duration_since(self.last_report);
        if since_last < interval {
            return None;
        }

        let secs = since_last.as_secs_f64().max(f64::EPSILON);
        let snapshot = PeriodicStats {
            wall_elapsed: now.duration_since(self.start),
            total_bytes: stats.bytes,
            total_frames: stats.frames_decoded,
            total_diagnostics: stats.total_diagnostics(),
            byte_rate: stats.bytes.saturating_sub(self.last_bytes) as f64 / secs,
            frame_rate: stats.frames_decoded.saturating_sub(self.last_frames) as f64 / secs,
            memory_bytes: memory_stats::memory_stats()
                .map(|m| m.physical_mem)
                .unwrap_or(0),
        };

        self.last_report = now;
        self.last_bytes = stats.bytes;
        self.last_frames = stats.frames_decoded;
        Some(snapshot)
    }
}
