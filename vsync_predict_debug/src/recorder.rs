// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording, decoding and replay.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`], and [`replay`] feeds them to another
//! sink in recording order.
//!
//! Decoding stops at the first unknown tag or truncated record.

use vsync_predict_core::display::DisplayId;
use vsync_predict_core::fit::{FitError, Model};
use vsync_predict_core::history::SampleVerdict;
use vsync_predict_core::time::{Duration, Timestamp};
use vsync_predict_core::trace::{
    FitRejectedEvent, ModelUpdateEvent, PeriodChangeEvent, PhaseCheckEvent, PredictionEvent,
    PredictionMode, SampleEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_SAMPLE: u8 = 1;
const TAG_MODEL_UPDATE: u8 = 2;
const TAG_FIT_REJECTED: u8 = 3;
const TAG_PREDICTION: u8 = 4;
const TAG_PERIOD_CHANGE: u8 = 5;
const TAG_PHASE_CHECK: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_display(&mut self, d: DisplayId) {
        self.write_u64(d.0);
    }

    fn write_verdict(&mut self, v: SampleVerdict) {
        self.write_u8(match v {
            SampleVerdict::Accepted => 0,
            SampleVerdict::OutOfPhase => 1,
            SampleVerdict::Duplicate => 2,
        });
    }

    fn write_mode(&mut self, m: PredictionMode) {
        self.write_u8(match m {
            PredictionMode::Cold => 0,
            PredictionMode::Warm => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_sample(&mut self, e: &SampleEvent) {
        self.write_u8(TAG_SAMPLE);
        self.write_display(e.display);
        self.write_i64(e.timestamp.nanos());
        self.write_verdict(e.verdict);
    }

    fn on_model_update(&mut self, e: &ModelUpdateEvent) {
        self.write_u8(TAG_MODEL_UPDATE);
        self.write_display(e.display);
        self.write_i64(e.timestamp.nanos());
        self.write_i64(e.ideal_period.nanos());
        self.write_i64(e.model.slope.nanos());
        self.write_i64(e.model.intercept.nanos());
    }

    fn on_fit_rejected(&mut self, e: &FitRejectedEvent) {
        self.write_u8(TAG_FIT_REJECTED);
        self.write_display(e.display);
        self.write_i64(e.timestamp.nanos());
        self.write_i64(e.ideal_period.nanos());
        match e.error {
            FitError::Degenerate => {
                self.write_u8(0);
                self.write_i64(0);
            }
            FitError::Diverged { slope } => {
                self.write_u8(1);
                self.write_i64(slope.nanos());
            }
        }
    }

    fn on_prediction(&mut self, e: &PredictionEvent) {
        self.write_u8(TAG_PREDICTION);
        self.write_display(e.display);
        self.write_mode(e.mode);
        self.write_i64(e.time_point.nanos());
        self.write_i64(e.prediction.nanos());
    }

    fn on_period_change(&mut self, e: &PeriodChangeEvent) {
        self.write_u8(TAG_PERIOD_CHANGE);
        self.write_display(e.display);
        self.write_i64(e.period.nanos());
    }

    fn on_phase_check(&mut self, e: &PhaseCheckEvent) {
        self.write_u8(TAG_PHASE_CHECK);
        self.write_display(e.display);
        self.write_i64(e.time_point.nanos());
        self.write_i64(e.vsync_time.nanos());
        self.write_i64(e.sequence);
        self.write_u32(e.divisor);
        self.write_u8(u8::from(e.in_phase));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`SampleEvent`].
    Sample(SampleEvent),
    /// A [`ModelUpdateEvent`].
    ModelUpdate(ModelUpdateEvent),
    /// A [`FitRejectedEvent`].
    FitRejected(FitRejectedEvent),
    /// A [`PredictionEvent`].
    Prediction(PredictionEvent),
    /// A [`PeriodChangeEvent`].
    PeriodChange(PeriodChangeEvent),
    /// A [`PhaseCheckEvent`].
    PhaseCheck(PhaseCheckEvent),
}

impl RecordedEvent {
    /// The display the event belongs to.
    #[must_use]
    pub fn display(&self) -> DisplayId {
        match self {
            Self::Sample(e) => e.display,
            Self::ModelUpdate(e) => e.display,
            Self::FitRejected(e) => e.display,
            Self::Prediction(e) => e.display,
            Self::PeriodChange(e) => e.display,
            Self::PhaseCheck(e) => e.display,
        }
    }

    /// Dispatches the event to the matching `sink` method.
    pub fn dispatch(&self, sink: &mut dyn TraceSink) {
        match self {
            Self::Sample(e) => sink.on_sample(e),
            Self::ModelUpdate(e) => sink.on_model_update(e),
            Self::FitRejected(e) => sink.on_fit_rejected(e),
            Self::Prediction(e) => sink.on_prediction(e),
            Self::PeriodChange(e) => sink.on_period_change(e),
            Self::PhaseCheck(e) => sink.on_phase_check(e),
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Replays a recording into `sink`, returning the number of events
/// delivered.
pub fn replay(bytes: &[u8], sink: &mut dyn TraceSink) -> usize {
    let mut count = 0;
    for event in decode(bytes) {
        event.dispatch(sink);
        count += 1;
    }
    count
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_i64(&mut self) -> Option<i64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = i64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_display(&mut self) -> Option<DisplayId> {
        self.read_u64().map(DisplayId)
    }

    fn read_timestamp(&mut self) -> Option<Timestamp> {
        self.read_i64().map(Timestamp)
    }

    fn read_duration(&mut self) -> Option<Duration> {
        self.read_i64().map(Duration)
    }

    fn read_verdict(&mut self) -> Option<SampleVerdict> {
        Some(match self.read_u8()? {
            0 => SampleVerdict::Accepted,
            1 => SampleVerdict::OutOfPhase,
            _ => SampleVerdict::Duplicate,
        })
    }

    fn read_mode(&mut self) -> Option<PredictionMode> {
        Some(match self.read_u8()? {
            0 => PredictionMode::Cold,
            _ => PredictionMode::Warm,
        })
    }

    fn decode_sample(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Sample(SampleEvent {
            display: self.read_display()?,
            timestamp: self.read_timestamp()?,
            verdict: self.read_verdict()?,
        }))
    }

    fn decode_model_update(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ModelUpdate(ModelUpdateEvent {
            display: self.read_display()?,
            timestamp: self.read_timestamp()?,
            ideal_period: self.read_duration()?,
            model: Model {
                slope: self.read_duration()?,
                intercept: self.read_duration()?,
            },
        }))
    }

    fn decode_fit_rejected(&mut self) -> Option<RecordedEvent> {
        let display = self.read_display()?;
        let timestamp = self.read_timestamp()?;
        let ideal_period = self.read_duration()?;
        let kind = self.read_u8()?;
        let slope = self.read_duration()?;
        let error = match kind {
            0 => FitError::Degenerate,
            _ => FitError::Diverged { slope },
        };
        Some(RecordedEvent::FitRejected(FitRejectedEvent {
            display,
            timestamp,
            ideal_period,
            error,
        }))
    }

    fn decode_prediction(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Prediction(PredictionEvent {
            display: self.read_display()?,
            mode: self.read_mode()?,
            time_point: self.read_timestamp()?,
            prediction: self.read_timestamp()?,
        }))
    }

    fn decode_period_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PeriodChange(PeriodChangeEvent {
            display: self.read_display()?,
            period: self.read_duration()?,
        }))
    }

    fn decode_phase_check(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseCheck(PhaseCheckEvent {
            display: self.read_display()?,
            time_point: self.read_timestamp()?,
            vsync_time: self.read_timestamp()?,
            sequence: self.read_i64()?,
            divisor: self.read_u32()?,
            in_phase: self.read_u8()? != 0,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_SAMPLE => self.decode_sample(),
            TAG_MODEL_UPDATE => self.decode_model_update(),
            TAG_FIT_REJECTED => self.decode_fit_rejected(),
            TAG_PREDICTION => self.decode_prediction(),
            TAG_PERIOD_CHANGE => self.decode_period_change(),
            TAG_PHASE_CHECK => self.decode_phase_check(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
