//! Command-line runner for the homebus decoder.
//!
//! Reads bus bytes from a capture file, stdin or a TCP gateway, feeds them to
//! a [`BusDecoder`], and reports events as log records or JSON lines.

pub mod bridge;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod sink;
pub mod stats;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use homebus_metrics::MetricLabels;
use homebus_protocol::{BusDecoder, DiscoveryRegistry};
use serde::Serialize;
use tracing::info;

pub use cli::Cli;
pub use config::{InputFormat, InputSource, OutputFormat, RunnerConfig, Settings};
pub use error::RunnerError;

use bridge::BridgeReader;
use capture::for_each_chunk;
use sink::{JsonSink, LogSink, MetricsSink, OutputSink, Tee};
use stats::{DecodeStats, PeriodicStats, StatsReporter};

/// Final JSON record written when a registry summary is requested.
#[derive(Serialize)]
struct RunSummary<'a> {
    event: &'static str,
    registry: &'a DiscoveryRegistry,
    stats: &'a DecodeStats,
}

/// One decoding session: a decoder plus its sinks and counters.
pub struct Runner {
    settings: Settings,
    decoder: BusDecoder,
    stats: DecodeStats,
    metrics: MetricsSink,
}

impl Runner {
    pub fn new(settings: Settings) -> Self {
        let metrics = MetricsSink::new(MetricLabels::new(settings.bus_name.clone()));
        Runner {
            settings,
            decoder: BusDecoder::new(),
            stats: DecodeStats::default(),
            metrics,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn decoder(&self) -> &BusDecoder {
        &self.decoder
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Decode `input` to its end. JSON output goes to `out`; log output goes
    /// through `tracing`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<(), RunnerError> {
        let mut output = match self.settings.output {
            OutputFormat::Log => OutputSink::Log(LogSink::new(self.settings.rooms.clone())),
            OutputFormat::Json => OutputSink::Json(JsonSink::new(out)),
        };
        let mut reporter = StatsReporter::new(self.settings.stats_interval);

        let decoder = &mut self.decoder;
        let stats = &mut self.stats;
        let metrics = &mut self.metrics;
        for_each_chunk(input, self.settings.input_format, |chunk| {
            stats.add_bytes(chunk.len());
            metrics.record_bytes(chunk.len());
            decoder.feed_into(chunk, &mut Tee(&mut *stats, Tee(&mut *metrics, &mut output)));

            if let Some(e) = output.take_error() {
                return Err(e);
            }
            if let Some(snapshot) = reporter.check(stats) {
                log_periodic(&snapshot);
            }
            Ok(())
        })?;

        if self.settings.registry_summary {
            self.report_registry(&mut output);
        }

        info!(
            bytes = self.stats.bytes,
            frames = self.stats.frames_decoded,
            diagnostics = self.stats.total_diagnostics(),
            known_slots = self.decoder.registry().iter().map(|e| e.slots.len()).sum::<usize>(),
            "input ended"
        );

        match output {
            OutputSink::Json(sink) => sink.finish().map(|_| ()),
            OutputSink::Log(_) => Ok(()),
        }
    }

    fn report_registry<W: Write>(&self, output: &mut OutputSink<W>) {
        let registry = self.decoder.registry();
        match output {
            OutputSink::Log(sink) => {
                if registry.is_empty() {
                    info!("no lights or outlets discovered");
                }
                for entry in registry.iter() {
                    let slots: Vec<u8> = entry.slots.iter().collect();
                    info!(
                        category = %entry.category,
                        room = %sink.room_label(entry.room),
                        slots = ?slots,
                        "known {} slots in {}: {:?}",
                        entry.category,
                        sink.room_label(entry.room),
                        slots
                    );
                }
            }
            OutputSink::Json(sink) => sink.write_record(&RunSummary {
                event: "summary",
                registry,
                stats: &self.stats,
            }),
        }
    }
}

fn log_periodic(snapshot: &PeriodicStats) {
    info!(
        elapsed_s = snapshot.wall_elapsed.as_secs(),
        bytes = snapshot.total_bytes,
        frames = snapshot.total_frames,
        diagnostics = snapshot.total_diagnostics,
        "{:.0} B/s, {:.1} frames/s, memory {}",
        snapshot.byte_rate,
        snapshot.frame_rate,
        snapshot.memory_human_readable().trim()
    );
}

#[cfg(feature = "prometheus")]
fn install_exporter(cli: &Cli) -> Result<(), RunnerError> {
    if let Some(addr) = cli.prometheus {
        homebus_metrics::install_prometheus_exporter(addr)
            .map_err(|e| RunnerError::Metrics(e.to_string()))?;
        info!(%addr, "serving Prometheus metrics");
    }
    Ok(())
}

#[cfg(not(feature = "prometheus"))]
fn install_exporter(_cli: &Cli) -> Result<(), RunnerError> {
    Ok(())
}

/// Entry point behind `main`: resolve settings, set up logging and metrics,
/// open the input and run to completion.
pub fn run_cli(cli: Cli) -> Result<(), RunnerError> {
    let settings = Settings::from_cli(&cli)?;
    logging::init_tracing(settings.log_filter.as_deref())?;

    install_exporter(&cli)?;

    let mut runner = Runner::new(settings);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match runner.settings().input.clone() {
        InputSource::Stdin => {
            info!("reading from stdin");
            let stdin = io::stdin();
            let input = stdin.lock();
            runner.run(input, &mut out)
        }
        InputSource::File(path) => {
            info!(path = %path.display(), "reading capture");
            let file = File::open(&path)?;
            runner.run(BufReader::new(file), &mut out)
        }
        InputSource::Bridge {
            address,
            reconnect_delay,
        } => {
            let (reader, handle) = BridgeReader::connect(&address, reconnect_delay)?;
            // Wake the loop when the gateway is quiet so stats reports keep coming.
            let reader = reader.with_idle_timeout(runner.settings().stats_interval);
            ctrlc::set_handler(move || handle.close())
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            runner.run(BufReader::new(reader), &mut out)
        }
    }
}
