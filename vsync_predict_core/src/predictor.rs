// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thread-safe vsync predictor.
//!
//! [`VsyncPredictor`] wraps a [`VsyncTracker`] and its trace sink in a single
//! [`Mutex`]. Every operation takes the lock for its whole duration, so a
//! prediction never observes a half-updated model, and events reach the sink
//! in the order the operations took effect.
//!
//! The hardware vsync thread calls [`add_sample`](VsyncPredictor::add_sample)
//! and [`set_period`](VsyncPredictor::set_period); any number of render
//! threads call [`predict`](VsyncPredictor::predict) and
//! [`is_in_phase`](VsyncPredictor::is_in_phase).
//!
//! A panic inside an operation is fatal. It poisons the lock, and every later
//! call panics too instead of serving from state the failed operation may
//! have left behind.

use std::string::String;
use std::sync::Mutex;

use crate::display::DisplayId;
use crate::fit::Model;
use crate::fps::{Fps, FrameRateDivisor};
use crate::time::{Duration, Timestamp};
use crate::trace::{NoopSink, TraceSink, Tracer};
use crate::tracker::{PredictorConfig, VsyncTracker};

const POISONED: &str = "vsync predictor state poisoned by an earlier panic";

#[derive(Debug)]
struct State<S> {
    tracker: VsyncTracker,
    sink: S,
}

/// Vsync predictor for one display, shareable across threads.
#[derive(Debug)]
pub struct VsyncPredictor<S: TraceSink + Send = NoopSink> {
    state: Mutex<State<S>>,
}

impl VsyncPredictor {
    /// Creates a predictor that discards trace events.
    ///
    /// # Panics
    ///
    /// See [`VsyncTracker::new`].
    #[must_use]
    pub fn new(display: DisplayId, ideal_period: Duration, config: PredictorConfig) -> Self {
        Self::with_sink(display, ideal_period, config, NoopSink)
    }
}

impl<S: TraceSink + Send> VsyncPredictor<S> {
    /// Creates a predictor that reports trace events to `sink`.
    ///
    /// # Panics
    ///
    /// See [`VsyncTracker::new`].
    #[must_use]
    pub fn with_sink(
        display: DisplayId,
        ideal_period: Duration,
        config: PredictorConfig,
        sink: S,
    ) -> Self {
        Self::from_tracker(VsyncTracker::new(display, ideal_period, config), sink)
    }

    /// Wraps an already configured tracker.
    #[must_use]
    pub fn from_tracker(tracker: VsyncTracker, sink: S) -> Self {
        Self {
            state: Mutex::new(State { tracker, sink }),
        }
    }

    /// Replaces the frame-rate divisor policy.
    pub fn set_divisor(&self, policy: impl FrameRateDivisor + Send + 'static) {
        self.with_state(|tracker, _| tracker.set_divisor(policy));
    }

    /// Offers a hardware vsync timestamp. See [`VsyncTracker::add_sample`].
    pub fn add_sample(&self, timestamp: Timestamp) -> bool {
        self.with_state(|tracker, tracer| tracker.add_sample(timestamp, tracer))
    }

    /// Predicts the next vsync at or after `time_point`. See
    /// [`VsyncTracker::predict`].
    pub fn predict(&self, time_point: Timestamp) -> Timestamp {
        self.with_state(|tracker, tracer| tracker.predict(time_point, tracer))
    }

    /// The period of the active model.
    #[must_use]
    pub fn current_period(&self) -> Duration {
        self.with_state(|tracker, _| tracker.current_period())
    }

    /// The active model.
    #[must_use]
    pub fn model(&self) -> Model {
        self.with_state(|tracker, _| tracker.model())
    }

    /// Switches to a new nominal period. See [`VsyncTracker::set_period`].
    pub fn set_period(&self, period: Duration) {
        self.with_state(|tracker, tracer| tracker.set_period(period, tracer));
    }

    /// Returns `true` while the predictor is still learning.
    #[must_use]
    pub fn needs_more_samples(&self) -> bool {
        self.with_state(|tracker, _| tracker.needs_more_samples())
    }

    /// Drops back to the trivial model for the active period.
    pub fn reset_model(&self) {
        self.with_state(|tracker, _| tracker.reset_model());
    }

    /// Returns whether `time_point` is a frame boundary for `frame_rate`.
    /// See [`VsyncTracker::is_in_phase`].
    pub fn is_in_phase(&self, time_point: Timestamp, frame_rate: Fps) -> bool {
        self.with_state(|tracker, tracer| tracker.is_in_phase(time_point, frame_rate, tracer))
    }

    /// Sets the rate the renderer targets.
    pub fn set_render_rate(&self, frame_rate: Fps) {
        self.with_state(|tracker, _| tracker.set_render_rate(frame_rate));
    }

    /// The display this predictor serves.
    #[must_use]
    pub fn display(&self) -> DisplayId {
        self.with_state(|tracker, _| tracker.display())
    }

    /// Renders the rate map as text.
    #[must_use]
    pub fn dump(&self) -> String {
        self.with_state(|tracker, _| {
            let mut out = String::new();
            // Writing into a `String` cannot fail.
            _ = tracker.dump(&mut out);
            out
        })
    }

    /// Consumes the predictor and returns its trace sink.
    ///
    /// # Panics
    ///
    /// Panics if an earlier operation panicked.
    #[must_use]
    pub fn into_sink(self) -> S {
        match self.state.into_inner() {
            Ok(state) => state.sink,
            Err(_) => panic!("{POISONED}"),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut VsyncTracker, &mut Tracer<'_>) -> R) -> R {
        let Ok(mut guard) = self.state.lock() else {
            panic!("{POISONED}");
        };
        let State { tracker, sink } = &mut *guard;
        let mut tracer = Tracer::new(sink);
        f(tracker, &mut tracer)
    }
}
