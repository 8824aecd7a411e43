// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated vsync source and scheduler that exercise the predictor and the
//! diagnostics pipeline.
//!
//! A "hardware" thread feeds jittered vsync timestamps into one shared
//! [`VsyncPredictor`], switching refresh rate halfway through and back again.
//! A "scheduler" thread concurrently asks for predictions at 30 fps. Events
//! are recorded with a [`RecorderSink`], exported as a Chrome trace JSON file
//! and replayed through a [`PrettyPrintSink`] into a text log.

use std::fs::File;
use std::io::{self, BufWriter};

use vsync_predict_core::display::DisplayId;
use vsync_predict_core::fps::Fps;
use vsync_predict_core::predictor::VsyncPredictor;
use vsync_predict_core::time::{Duration, Timestamp};
use vsync_predict_core::tracker::PredictorConfig;

use vsync_predict_debug::pretty::PrettyPrintSink;
use vsync_predict_debug::recorder::{RecordedEvent, RecorderSink, decode, replay};

const VSYNC_COUNT: u64 = 240;
/// 60 Hz refresh period in nanoseconds.
const PERIOD_60HZ: Duration = Duration(16_666_667);
/// 120 Hz refresh period in nanoseconds.
const PERIOD_120HZ: Duration = Duration(8_333_333);
/// Largest simulated timestamp jitter, either side.
const JITTER_NS: i64 = 150_000;
const START: Timestamp = Timestamp(1_000_000_000);

fn main() -> io::Result<()> {
    let predictor = VsyncPredictor::with_sink(
        DisplayId(0),
        PERIOD_60HZ,
        PredictorConfig::verbose(),
        RecorderSink::new(),
    );
    predictor.set_render_rate(Fps::from_hz(30.0));

    let (accepted, frames) = std::thread::scope(|s| {
        let hardware = s.spawn(|| feed_vsyncs(&predictor));
        let scheduler = s.spawn(|| schedule_frames(&predictor));
        (hardware.join(), scheduler.join())
    });
    let accepted = accepted.unwrap_or_default();
    let frames = frames.unwrap_or_default();

    println!("{}", predictor.dump());
    println!(
        "accepted {accepted}/{VSYNC_COUNT} samples, scheduled {} frames",
        frames.len()
    );

    let bytes = predictor.into_sink().into_bytes();

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let mut writer = BufWriter::new(File::create(path)?);
    vsync_predict_debug::chrome::export(&bytes, &mut writer)?;
    println!("Wrote {path} ({} bytes recorded)", bytes.len());

    // -- replay -------------------------------------------------------------
    let log_path = "trace.log";
    let mut log = PrettyPrintSink::with_writer(BufWriter::new(File::create(log_path)?));
    let replayed = replay(&bytes, &mut log);
    println!("Wrote {log_path} ({replayed} events)");

    // Mode switches and rejected fits also go to stdout.
    let mut pretty = PrettyPrintSink::new(Box::new(io::stdout()));
    for event in decode(&bytes).filter(|e| {
        matches!(
            e,
            RecordedEvent::PeriodChange(_) | RecordedEvent::FitRejected(_)
        )
    }) {
        event.dispatch(&mut pretty);
    }
    Ok(())
}

/// Feeds jittered vsyncs: 60 Hz, then 120 Hz, then 60 Hz again.
fn feed_vsyncs(predictor: &VsyncPredictor<RecorderSink>) -> u64 {
    let mut rng = Lcg(0x5eed);
    let mut accepted = 0;
    let mut vsync = START;
    let mut period = PERIOD_60HZ;

    for n in 0..VSYNC_COUNT {
        if n == VSYNC_COUNT / 2 {
            period = PERIOD_120HZ;
            predictor.set_period(period);
        } else if n == VSYNC_COUNT * 3 / 4 {
            period = PERIOD_60HZ;
            predictor.set_period(period);
        }
        vsync = vsync + period;
        let jitter = Duration(rng.next_in(JITTER_NS));
        if predictor.add_sample(vsync + jitter) {
            accepted += 1;
        }
        std::thread::yield_now();
    }
    accepted
}

/// Asks for the next 30 fps frame boundary, then checks it is in phase.
fn schedule_frames(predictor: &VsyncPredictor<RecorderSink>) -> Vec<Timestamp> {
    let thirty = Fps::from_hz(30.0);
    let mut frames = Vec::new();
    let mut now = START;
    while frames.len() < 60 {
        let frame = predictor.predict(now);
        if predictor.is_in_phase(frame, thirty) {
            frames.push(frame);
        }
        now = frame + Duration(1);
        std::thread::yield_now();
    }
    frames
}

/// Small deterministic generator for timestamp jitter.
struct Lcg(u64);

impl Lcg {
    /// Returns a value in `-bound..=bound`.
    fn next_in(&mut self, bound: i64) -> i64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let span = bound.unsigned_abs() * 2 + 1;
        i64::try_from((self.0 >> 33) % span).unwrap_or(0) - bound
    }
}
