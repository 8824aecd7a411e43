// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Predictor state is exported as counter tracks (`"ph": "C"`) named
//! `VSP-*`, one process per display. Fit rejections and phase checks are
//! instant events.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use vsync_predict_core::display::DisplayId;
use vsync_predict_core::time::Timestamp;
use vsync_predict_core::trace::PredictionMode;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted from nanoseconds to microseconds. Period changes
/// carry no time of their own and are placed at `ts = 0`.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Sample(e) => {
                events.push(counter(
                    "VSP-ts",
                    e.display,
                    e.timestamp,
                    json!({
                        "value": e.timestamp.nanos(),
                        "verdict": format!("{:?}", e.verdict),
                    }),
                ));
            }
            RecordedEvent::ModelUpdate(e) => {
                events.push(counter(
                    "VSP-period",
                    e.display,
                    e.timestamp,
                    json!({ "value": e.model.slope.nanos() }),
                ));
                events.push(counter(
                    "VSP-intercept",
                    e.display,
                    e.timestamp,
                    json!({ "value": e.model.intercept.nanos() }),
                ));
            }
            RecordedEvent::FitRejected(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FitRejected",
                    "cat": "Model",
                    "ts": nanos_to_us(e.timestamp),
                    "pid": e.display.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "ideal_period_ns": e.ideal_period.nanos(),
                        "error": e.error.to_string(),
                    }
                }));
            }
            RecordedEvent::Prediction(e) => {
                let mode = match e.mode {
                    PredictionMode::Cold => 0,
                    PredictionMode::Warm => 1,
                };
                events.push(counter(
                    "VSP-mode",
                    e.display,
                    e.time_point,
                    json!({ "value": mode }),
                ));
                events.push(counter(
                    "VSP-prediction",
                    e.display,
                    e.time_point,
                    json!({
                        "value": (e.prediction - e.time_point).as_millis_f64(),
                        "prediction_ns": e.prediction.nanos(),
                    }),
                ));
            }
            RecordedEvent::PeriodChange(e) => {
                events.push(counter(
                    "VSP-setPeriod",
                    e.display,
                    Timestamp(0),
                    json!({ "value": e.period.nanos() }),
                ));
            }
            RecordedEvent::PhaseCheck(e) => {
                let name = if e.in_phase { "InPhase" } else { "OutOfPhase" };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Phase",
                    "ts": nanos_to_us(e.time_point),
                    "pid": e.display.0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "vsync_ns": e.vsync_time.nanos(),
                        "sequence": e.sequence,
                        "divisor": e.divisor,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn counter(name: &str, display: DisplayId, at: Timestamp, args: Value) -> Value {
    json!({
        "ph": "C",
        "name": name,
        "cat": "VsyncPredictor",
        "ts": nanos_to_us(at),
        "pid": display.0,
        "tid": 0,
        "args": args,
    })
}

fn nanos_to_us(t: Timestamp) -> f64 {
    t.nanos() as f64 / 1000.0
}
