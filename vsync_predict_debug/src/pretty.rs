// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Times are
//! printed in milliseconds.

use std::io::Write;

use vsync_predict_core::fit::FitError;
use vsync_predict_core::history::SampleVerdict;
use vsync_predict_core::time::{Duration, Timestamp};
use vsync_predict_core::trace::{
    FitRejectedEvent, ModelUpdateEvent, PeriodChangeEvent, PhaseCheckEvent, PredictionEvent,
    PredictionMode, SampleEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn ms(t: Timestamp) -> f64 {
    Duration(t.nanos()).as_millis_f64()
}

fn verdict_name(verdict: SampleVerdict) -> &'static str {
    match verdict {
        SampleVerdict::Accepted => "accepted",
        SampleVerdict::OutOfPhase => "out-of-phase",
        SampleVerdict::Duplicate => "duplicate",
    }
}

fn mode_name(mode: PredictionMode) -> &'static str {
    match mode {
        PredictionMode::Cold => "cold",
        PredictionMode::Warm => "warm",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_sample(&mut self, e: &SampleEvent) {
        let _ = writeln!(
            self.writer,
            "[sample] display={} ts={:.3}ms {}",
            e.display,
            ms(e.timestamp),
            verdict_name(e.verdict),
        );
    }

    fn on_model_update(&mut self, e: &ModelUpdateEvent) {
        let _ = writeln!(
            self.writer,
            "[model] display={} ideal={:.3}ms period={:.6}ms intercept={}ns",
            e.display,
            e.ideal_period.as_millis_f64(),
            e.model.slope.as_millis_f64(),
            e.model.intercept.nanos(),
        );
    }

    fn on_fit_rejected(&mut self, e: &FitRejectedEvent) {
        let reason = match e.error {
            FitError::Degenerate => "degenerate".to_owned(),
            FitError::Diverged { slope } => {
                format!("diverged period={:.6}ms", slope.as_millis_f64())
            }
        };
        let _ = writeln!(
            self.writer,
            "[fit:rejected] display={} ts={:.3}ms ideal={:.3}ms {reason}",
            e.display,
            ms(e.timestamp),
            e.ideal_period.as_millis_f64(),
        );
    }

    fn on_prediction(&mut self, e: &PredictionEvent) {
        let _ = writeln!(
            self.writer,
            "[predict] display={} {} at={:.3}ms next={:.3}ms (+{:.3}ms)",
            e.display,
            mode_name(e.mode),
            ms(e.time_point),
            ms(e.prediction),
            (e.prediction - e.time_point).as_millis_f64(),
        );
    }

    fn on_period_change(&mut self, e: &PeriodChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[period] display={} ideal={:.3}ms",
            e.display,
            e.period.as_millis_f64(),
        );
    }

    fn on_phase_check(&mut self, e: &PhaseCheckEvent) {
        let phase = if e.in_phase { "in-phase" } else { "skip" };
        let _ = writeln!(
            self.writer,
            "[phase] display={} at={:.3}ms vsync={:.3}ms seq={} divisor={} {phase}",
            e.display,
            ms(e.time_point),
            ms(e.vsync_time),
            e.sequence,
            e.divisor,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsync_predict_core::display::DisplayId;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_writer()).unwrap()
    }

    #[test]
    fn pretty_print_prediction() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_prediction(&PredictionEvent {
            display: DisplayId(2),
            mode: PredictionMode::Cold,
            time_point: Timestamp(1_000_000),
            prediction: Timestamp(17_666_667),
        });
        let output = output(sink);
        assert!(output.starts_with("[predict]"), "got: {output}");
        assert!(output.contains("display=2"), "got: {output}");
        assert!(output.contains("cold"), "got: {output}");
        assert!(output.contains("next=17.667ms"), "got: {output}");
    }

    #[test]
    fn pretty_print_rejections() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_sample(&SampleEvent {
            display: DisplayId(0),
            timestamp: Timestamp(8_000_000),
            verdict: SampleVerdict::OutOfPhase,
        });
        sink.on_fit_rejected(&FitRejectedEvent {
            display: DisplayId(0),
            timestamp: Timestamp(8_000_000),
            ideal_period: Duration(16_666_667),
            error: FitError::Diverged {
                slope: Duration(25_000_000),
            },
        });
        let output = output(sink);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2, "got: {output}");
        assert!(lines[0].contains("out-of-phase"), "got: {output}");
        assert!(lines[1].contains("diverged period=25.000000ms"), "got: {output}");
    }

    #[test]
    fn pretty_print_phase_check() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_phase_check(&PhaseCheckEvent {
            display: DisplayId(1),
            time_point: Timestamp(33_333_334),
            vsync_time: Timestamp(33_333_334),
            sequence: 3,
            divisor: 2,
            in_phase: false,
        });
        let output = output(sink);
        assert!(output.contains("seq=3 divisor=2 skip"), "got: {output}");
    }
}
