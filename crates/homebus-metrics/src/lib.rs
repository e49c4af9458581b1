//! Metrics infrastructure for the homebus decoder.
//!
//! This crate describes every metric the runner records. Metrics are declared
//! as structured [`Metric`] constants so names, units and expected labels live
//! in one place. The `metrics` crate is re-exported for convenience.
//!
//! # Example
//!
//! ```rust,ignore
//! use homebus_metrics::{MetricLabels, metric_defs, describe_metrics};
//!
//! // Initialize metrics descriptions at startup
//! describe_metrics();
//!
//! let labels = MetricLabels::new("apartment");
//! metrics::counter!(
//!     metric_defs::FRAMES_DECODED.name,
//!     &labels.with(&[("family", "light".to_string())])
//! )
//! .increment(1);
//! ```
//!
//! # Metric Type
//!
//! ```rust
//! use homebus_metrics::{Metric, MetricKind};
//! use metrics::Unit;
//!
//! const MY_COUNTER: Metric = Metric::counter("my.counter")
//!     .with_description("A counter metric")
//!     .with_unit(Unit::Count)
//!     .with_labels(&["bus", "family"]);
//!
//! MY_COUNTER.describe();
//! metrics::counter!(MY_COUNTER.name).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
    /// A histogram for recording distributions.
    Histogram,
}

/// A metric declaration with its metadata.
///
/// Use the const constructors to declare metrics at compile time.
///
/// ```rust
/// use homebus_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const FRAMES: Metric = Metric::counter("homebus.bus.frames")
///     .with_description("Frames seen on the bus")
///     .with_unit(Unit::Count)
///     .with_labels(&["bus"]);
///
/// assert_eq!(FRAMES.name, "homebus.bus.frames");
/// assert_eq!(FRAMES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "homebus.bus.bytes_received").
    pub name: &'static str,
    /// The kind of metric.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// The unit of measurement, if any.
    pub unit: Option<Unit>,
    /// Expected label keys.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Counter,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new gauge metric with the given name.
    pub const fn gauge(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Gauge,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new histogram metric with the given name.
    pub const fn histogram(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Histogram,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit for the metric.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys for the metric.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    ///
    /// Call once at startup, after the recorder is installed.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions for the decoder.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Standard Label Keys
    // ========================================================================

    /// Labels present on every metric.
    pub const STANDARD_LABELS: &[&str] = &["bus"];

    // ========================================================================
    // Bus Layer Metrics
    // ========================================================================

    /// Raw bytes fed to the decoder.
    ///
    /// Labels: bus
    pub const BYTES_RECEIVED: Metric = Metric::counter("homebus.bus.bytes_received")
        .with_description("Raw bytes read from the bus")
        .with_unit(Unit::Bytes)
        .with_labels(&["bus"]);

    /// Frames decoded into device state.
    ///
    /// Labels: bus, family
    pub const FRAMES_DECODED: Metric = Metric::counter("homebus.bus.frames_decoded")
        .with_description("Frames decoded into device state")
        .with_unit(Unit::Count)
        .with_labels(&["bus", "family"]);

    /// Frames dropped or not attributable.
    ///
    /// Labels: bus, kind (frame_too_short, checksum_mismatch, buffer_overflow, ...)
    pub const DIAGNOSTICS: Metric = Metric::counter("homebus.bus.diagnostics")
        .with_description("Frames dropped or not attributable to a device")
        .with_unit(Unit::Count)
        .with_labels(&["bus", "kind"]);

    // ========================================================================
    // Discovery Metrics
    // ========================================================================

    /// Light and outlet slots discovered.
    ///
    /// Labels: bus, category
    pub const SLOTS_DISCOVERED: Metric = Metric::counter("homebus.discovery.slots_discovered")
        .with_description("Light and outlet slots discovered")
        .with_unit(Unit::Count)
        .with_labels(&["bus", "category"]);

    /// Slots currently known per category.
    ///
    /// Labels: bus, category
    pub const KNOWN_SLOTS: Metric = Metric::gauge("homebus.discovery.known_slots")
        .with_description("Slots currently known to the discovery registry")
        .with_unit(Unit::Count)
        .with_labels(&["bus", "category"]);

    // ========================================================================
    // Device Metrics
    // ========================================================================

    /// Temperatures reported by heating and air-conditioning units, in °C.
    ///
    /// Labels: bus, family, room, reading (current, target, hot_water, heating_water)
    pub const TEMPERATURE: Metric = Metric::histogram("homebus.device.temperature_c")
        .with_description("Heating and air conditioning temperatures in degrees Celsius")
        .with_labels(&["bus", "family", "room", "reading"]);

    /// Returns a slice of all defined metrics.
    pub const ALL: &[&Metric] = &[
        // Bus
        &BYTES_RECEIVED,
        &FRAMES_DECODED,
        &DIAGNOSTICS,
        // Discovery
        &SLOTS_DISCOVERED,
        &KNOWN_SLOTS,
        // Devices
        &TEMPERATURE,
    ];
}

/// Labels identifying which bus a metric came from.
///
/// ```rust
/// use homebus_metrics::MetricLabels;
///
/// let labels = MetricLabels::new("apartment");
/// let extended = labels.with(&[("family", "light".to_string())]);
///
/// assert!(extended.iter().any(|(k, v)| *k == "bus" && v == "apartment"));
/// assert!(extended.iter().any(|(k, v)| *k == "family" && v == "light"));
/// ```
#[derive(Debug, Clone)]
pub struct MetricLabels {
    /// Bus name, from configuration.
    pub bus: String,
}

impl MetricLabels {
    /// Creates labels for the named bus.
    pub fn new(bus: impl Into<String>) -> Self {
        Self { bus: bus.into() }
    }

    /// Converts the labels to the metrics crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![("bus", self.bus.clone())]
    }

    /// Returns labels with additional key-value pairs.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Describes all metrics.
///
/// Call once at startup, after installing a recorder, so exporters such as
/// Prometheus can publish help text and units.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

/// Installs a Prometheus recorder serving `/metrics` on `addr`.
///
/// The exporter runs its HTTP listener on a background thread.
#[cfg(feature = "prometheus")]
pub fn install_prometheus_exporter(
    addr: std::net::SocketAddr,
) -> Result<(), metrics_exporter_prometheus::BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    describe_metrics();
    Ok(())
}
