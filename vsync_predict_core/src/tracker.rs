// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vsync model tracking and prediction for one display.
//!
//! [`VsyncTracker`] owns every piece of predictor state: the sample
//! [`History`], the per-mode [`RateMap`], the cached [`VsyncSequence`]
//! reference point and the optional render rate. It is single-threaded
//! (`&mut self`); [`VsyncPredictor`](crate::predictor::VsyncPredictor) puts it
//! behind a lock.
//!
//! # Learning and converged states
//!
//! While fewer than [`PredictorConfig::min_samples`] samples are buffered the
//! tracker reports the trivial model (ideal period, zero intercept). Once
//! enough samples are in, every accepted sample refits the model. A rejected
//! fit, a mode switch or an explicit reset drops back to learning.
//!
//! # Render-rate phase
//!
//! With a render rate below the native rate, [`predict`](VsyncTracker::predict)
//! only returns vsyncs whose sequence number is a multiple of the frame-rate
//! divisor, so consecutive frames land one render period apart.

use alloc::boxed::Box;
use core::fmt;

use crate::display::DisplayId;
use crate::fit::{Model, fit};
use crate::fps::{Fps, FrameRateDivisor, RoundedDivisor};
use crate::history::History;
use crate::rate_map::RateMap;
use crate::time::{Duration, Timestamp};
use crate::trace::{
    FitRejectedEvent, ModelUpdateEvent, PeriodChangeEvent, PhaseCheckEvent, PredictionEvent,
    PredictionMode, SampleEvent, Tracer,
};

const MAX_PERCENT: u32 = 100;

/// Tuning constants for a [`VsyncTracker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PredictorConfig {
    /// Capacity of the sample ring.
    pub history_size: usize,
    /// Samples required before a model is fitted.
    pub min_samples: usize,
    /// Outlier band, as a percentage of the ideal period (clamped to 100).
    pub outlier_tolerance_percent: u32,
    /// Emit per-sample and per-fit trace events.
    pub verbose_trace: bool,
}

impl PredictorConfig {
    /// Default tuning for a compositor vsync source.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            history_size: 20,
            min_samples: 6,
            outlier_tolerance_percent: 20,
            verbose_trace: false,
        }
    }

    /// [`standard`](Self::standard) with per-sample tracing enabled.
    #[must_use]
    pub const fn verbose() -> Self {
        Self {
            verbose_trace: true,
            ..Self::standard()
        }
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// A predicted vsync and its sequence number.
///
/// Sequence numbers count vsyncs relative to the first prediction made; only
/// their differences and residues matter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VsyncSequence {
    /// Time of the vsync.
    pub vsync_time: Timestamp,
    /// Its sequence number.
    pub sequence: i64,
}

/// Single-threaded vsync predictor state for one display.
pub struct VsyncTracker {
    display: DisplayId,
    config: PredictorConfig,
    history: History,
    rates: RateMap,
    last_sequence: Option<VsyncSequence>,
    render_rate: Option<Fps>,
    divisor: Box<dyn FrameRateDivisor + Send>,
}

impl fmt::Debug for VsyncTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VsyncTracker")
            .field("display", &self.display)
            .field("config", &self.config)
            .field("history", &self.history)
            .field("rates", &self.rates)
            .field("last_sequence", &self.last_sequence)
            .field("render_rate", &self.render_rate)
            .finish_non_exhaustive()
    }
}

impl VsyncTracker {
    /// Creates a tracker in the learning state for `ideal_period`, using the
    /// [`RoundedDivisor`] rate policy.
    ///
    /// # Panics
    ///
    /// Panics if `ideal_period` is not positive, if `history_size` is zero,
    /// or if `min_samples` exceeds `history_size`.
    #[must_use]
    pub fn new(display: DisplayId, ideal_period: Duration, config: PredictorConfig) -> Self {
        assert!(ideal_period.is_positive(), "ideal period must be positive");
        assert!(config.history_size > 0, "history size must not be zero");
        assert!(
            config.min_samples <= config.history_size,
            "minimum samples must fit in the history"
        );
        let config = PredictorConfig {
            outlier_tolerance_percent: config.outlier_tolerance_percent.min(MAX_PERCENT),
            ..config
        };
        Self {
            display,
            config,
            history: History::with_capacity(config.history_size),
            rates: RateMap::new(ideal_period),
            last_sequence: None,
            render_rate: None,
            divisor: Box::new(RoundedDivisor),
        }
    }

    /// Replaces the frame-rate divisor policy.
    #[must_use]
    pub fn with_divisor(mut self, policy: impl FrameRateDivisor + Send + 'static) -> Self {
        self.set_divisor(policy);
        self
    }

    /// Replaces the frame-rate divisor policy in place.
    pub fn set_divisor(&mut self, policy: impl FrameRateDivisor + Send + 'static) {
        self.divisor = Box::new(policy);
    }

    /// Offers a hardware vsync timestamp.
    ///
    /// Returns `true` if the sample was admitted and the model updated (the
    /// trivial model counts while learning), `false` if the sample was
    /// rejected as an outlier or duplicate, or if the refit failed and the
    /// model was reset.
    pub fn add_sample(&mut self, timestamp: Timestamp, tracer: &mut Tracer<'_>) -> bool {
        let ideal = self.rates.active_period();
        let tolerance = self.config.outlier_tolerance_percent;
        let verdict = self.history.classify(timestamp, ideal, tolerance);

        if self.config.verbose_trace {
            tracer.sample(&SampleEvent {
                display: self.display,
                timestamp,
                verdict,
            });
        }

        if !verdict.is_accepted() {
            // While learning there is no trustworthy period yet, so start over
            // from this sample. Once converged, keep the model and only
            // remember how far vsync has progressed.
            self.history.raise_known(timestamp);
            if self.history.len() < self.config.min_samples {
                self.history.clear();
            } else if let Some(newest) = self.history.newest() {
                self.history.raise_known(newest);
            }
            return false;
        }

        self.history.push(timestamp);

        if self.history.len() < self.config.min_samples {
            self.rates.reset_active();
            return true;
        }

        let current = self.rates.active_model();
        match fit(self.history.as_slice(), current.slope, ideal, tolerance) {
            Ok(model) => {
                self.rates.set_active_model(model);
                if self.config.verbose_trace {
                    tracer.model_update(&ModelUpdateEvent {
                        display: self.display,
                        timestamp,
                        ideal_period: ideal,
                        model,
                    });
                }
                true
            }
            Err(error) => {
                self.rates.reset_active();
                self.history.clear();
                tracer.fit_rejected(&FitRejectedEvent {
                    display: self.display,
                    timestamp,
                    ideal_period: ideal,
                    error,
                });
                false
            }
        }
    }

    /// The period of the active model.
    #[must_use]
    pub fn current_period(&self) -> Duration {
        self.rates.active_model().slope
    }

    /// The active model.
    #[must_use]
    pub fn model(&self) -> Model {
        self.rates.active_model()
    }

    /// Predicts the next vsync at or after `time_point`, honouring the render
    /// rate, and updates the cached sequence reference.
    ///
    /// # Panics
    ///
    /// Panics if the model produces a prediction earlier than `time_point`.
    /// That indicates a defect in the predictor, never bad input.
    pub fn predict(&mut self, time_point: Timestamp, tracer: &mut Tracer<'_>) -> Timestamp {
        let current = self.sequence_at(time_point, tracer);

        let phase = self.render_rate_phase(current.sequence);
        let prediction = if phase == 0 {
            current.vsync_time
        } else {
            let slope = self.rates.active_model().slope;
            let approximate = current.vsync_time + Duration(slope.nanos() * phase);
            self.predict_from(approximate - Duration(slope.nanos() / 2), tracer)
        };

        self.last_sequence = Some(current);
        prediction
    }

    /// Returns whether the vsync nearest `time_point` is a frame boundary for
    /// `frame_rate`.
    ///
    /// Rates that are not integer divisors of the native rate, the native
    /// rate itself, and `time_point == 0` are always in phase. Sequence
    /// numbers are counted from the last [`predict`](Self::predict) call.
    #[must_use]
    pub fn is_in_phase(
        &self,
        time_point: Timestamp,
        frame_rate: Fps,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let divisor = self.divisor_for(frame_rate);
        if divisor <= 1 || time_point.nanos() == 0 {
            return true;
        }

        let slope = self.rates.active_model().slope;
        let just_before = time_point - Duration(slope.nanos() / 2);
        let nearest = self.sequence_at(just_before, tracer);
        let in_phase = nearest.sequence.rem_euclid(i64::from(divisor)) == 0;

        tracer.phase_check(&PhaseCheckEvent {
            display: self.display,
            time_point,
            vsync_time: nearest.vsync_time,
            sequence: nearest.sequence,
            divisor,
            in_phase,
        });
        in_phase
    }

    /// Sets the rate the renderer targets.
    pub fn set_render_rate(&mut self, frame_rate: Fps) {
        self.render_rate = Some(frame_rate);
    }

    /// Switches to a new nominal period, restoring its cached model if it has
    /// one, and drops buffered samples.
    ///
    /// # Panics
    ///
    /// Panics if `period` is not positive.
    pub fn set_period(&mut self, period: Duration, tracer: &mut Tracer<'_>) {
        assert!(period.is_positive(), "vsync period must be positive");
        tracer.period_change(&PeriodChangeEvent {
            display: self.display,
            period,
        });
        self.rates.set_active(period);
        self.history.clear();
    }

    /// Returns `true` while learning.
    #[must_use]
    pub fn needs_more_samples(&self) -> bool {
        self.history.len() < self.config.min_samples
    }

    /// Forces the trivial model for the active period and drops buffered
    /// samples.
    pub fn reset_model(&mut self) {
        self.rates.reset_active();
        self.history.clear();
    }

    /// Writes a human-readable snapshot of the rate map, the render rate and
    /// the cached sequence reference.
    ///
    /// # Errors
    ///
    /// Propagates errors from `out`.
    pub fn dump(&self, out: &mut impl fmt::Write) -> fmt::Result {
        writeln!(
            out,
            "display {}: ideal period = {:.2}ms",
            self.display,
            self.rates.active_period().as_millis_f64()
        )?;
        if let Some(rate) = self.render_rate() {
            writeln!(out, "  render rate = {rate}")?;
        }
        if let Some(last) = self.last_sequence() {
            writeln!(
                out,
                "  last vsync = {}ns, sequence {}",
                last.vsync_time.nanos(),
                last.sequence
            )?;
        }
        writeln!(out, "  rate map:")?;
        for (ideal, model) in self.rates.iter() {
            writeln!(
                out,
                "    ideal period {:.2}ms: period = {:.2}ms, intercept = {}ns",
                ideal.as_millis_f64(),
                model.slope.as_millis_f64(),
                model.intercept.nanos()
            )?;
        }
        Ok(())
    }

    /// The display this tracker serves.
    #[must_use]
    pub fn display(&self) -> DisplayId {
        self.display
    }

    /// The effective configuration (tolerance already clamped).
    #[must_use]
    pub fn config(&self) -> PredictorConfig {
        self.config
    }

    /// The active nominal period.
    #[must_use]
    pub fn ideal_period(&self) -> Duration {
        self.rates.active_period()
    }

    /// The anchor used while no samples are buffered.
    #[must_use]
    pub fn known_timestamp(&self) -> Option<Timestamp> {
        self.history.known_timestamp()
    }

    /// Number of buffered samples.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.history.len()
    }

    /// The configured render rate, if any.
    #[must_use]
    pub fn render_rate(&self) -> Option<Fps> {
        self.render_rate
    }

    /// The reference point cached by the last prediction.
    #[must_use]
    pub fn last_sequence(&self) -> Option<VsyncSequence> {
        self.last_sequence
    }

    /// The per-mode model cache.
    #[must_use]
    pub fn rate_map(&self) -> &RateMap {
        &self.rates
    }

    fn divisor_for(&self, frame_rate: Fps) -> u32 {
        let native = Fps::from_period(self.rates.active_period());
        self.divisor.divisor(native, frame_rate)
    }

    fn render_rate_phase(&self, sequence: i64) -> i64 {
        let Some(rate) = self.render_rate else {
            return 0;
        };
        let divisor = self.divisor_for(rate);
        if divisor <= 1 {
            return 0;
        }
        let divisor = i64::from(divisor);
        (divisor - sequence.rem_euclid(divisor)) % divisor
    }

    fn sequence_at(&self, time_point: Timestamp, tracer: &mut Tracer<'_>) -> VsyncSequence {
        let vsync_time = self.predict_from(time_point, tracer);
        let Some(last) = self.last_sequence else {
            return VsyncSequence {
                vsync_time,
                sequence: 0,
            };
        };
        let slope = self.rates.active_model().slope.nanos();
        let elapsed = (vsync_time - last.vsync_time).nanos();
        VsyncSequence {
            vsync_time,
            sequence: last.sequence + round_div(elapsed, slope),
        }
    }

    fn predict_from(&self, time_point: Timestamp, tracer: &mut Tracer<'_>) -> Timestamp {
        let ideal = self.rates.active_period();

        let Some(oldest) = self.history.oldest() else {
            let known = self.history.known_timestamp().unwrap_or(time_point);
            let periods_out = (time_point - known).nanos() / ideal.nanos() + 1;
            let prediction = known + Duration(periods_out * ideal.nanos());
            tracer.prediction(&PredictionEvent {
                display: self.display,
                mode: PredictionMode::Cold,
                time_point,
                prediction,
            });
            return prediction;
        };

        let Model { slope, intercept } = self.rates.active_model();
        let zero_point = oldest + intercept;
        let ordinal = ceil_div((time_point - zero_point).nanos(), slope.nanos());
        let prediction = zero_point + Duration(ordinal * slope.nanos());

        tracer.prediction(&PredictionEvent {
            display: self.display,
            mode: PredictionMode::Warm,
            time_point,
            prediction,
        });

        if prediction < time_point {
            panic!(
                "vsync model miscalculation on display {}: prediction {} for time point {} \
                 (slope {}, intercept {}, oldest sample {}, ordinal {})",
                self.display,
                prediction.nanos(),
                time_point.nanos(),
                slope.nanos(),
                intercept.nanos(),
                oldest.nanos(),
                ordinal,
            );
        }
        prediction
    }
}

/// `ceil(n / d)` for positive `d`.
fn ceil_div(n: i64, d: i64) -> i64 {
    let q = n.div_euclid(d);
    if n.rem_euclid(d) == 0 { q } else { q + 1 }
}

/// `n / d` rounded to nearest, halves away from zero, for positive `d`.
fn round_div(n: i64, d: i64) -> i64 {
    let q = n / d;
    if (n % d).abs() * 2 >= d { q + n.signum() } else { q }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::*;

    const P: i64 = 16_666_667;
    const IDEAL: Duration = Duration(P);
    const T0: i64 = 10_000_000_000;

    fn at(periods: i64) -> Timestamp {
        Timestamp(T0 + periods * P)
    }

    fn at_half(half_periods: i64) -> Timestamp {
        Timestamp(T0 + half_periods * P / 2)
    }

    fn tracker() -> VsyncTracker {
        VsyncTracker::new(DisplayId(0), IDEAL, PredictorConfig::standard())
    }

    fn converged() -> VsyncTracker {
        let mut t = tracker();
        for n in 0..10 {
            assert!(t.add_sample(at(n), &mut Tracer::none()));
        }
        t
    }

    #[test]
    fn learning_reports_trivial_model() {
        let mut t = tracker();
        for n in 0..5 {
            assert!(t.add_sample(at(n), &mut Tracer::none()));
            assert!(t.needs_more_samples());
            assert_eq!(t.model(), Model::trivial(IDEAL));
        }
    }

    #[test]
    fn converges_on_exact_period() {
        let mut t = tracker();
        for n in 0..5 {
            assert!(t.add_sample(at(n), &mut Tracer::none()));
        }
        assert!(t.add_sample(at(5), &mut Tracer::none()));
        assert!(!t.needs_more_samples());
        assert_eq!(t.current_period(), IDEAL);
        assert_eq!(t.model().intercept, Duration::ZERO);

        for n in 6..10 {
            assert!(t.add_sample(at(n), &mut Tracer::none()));
        }
        assert_eq!(t.predict(at_half(19), &mut Tracer::none()), at(10));
    }

    #[test]
    fn tracks_a_slightly_slow_display() {
        let mut t = tracker();
        let true_period = 16_700_000;
        for n in 0..12 {
            assert!(t.add_sample(Timestamp(T0 + n * true_period), &mut Tracer::none()));
        }
        let slope = t.current_period().nanos();
        assert!((slope - true_period).abs() <= 1, "got {slope}");
        // Tolerance band around the ideal period.
        assert!((slope - P).abs() * 100 / P <= 20);
    }

    #[test]
    fn half_period_sample_rejected_once_converged() {
        let mut t = converged();
        let model = t.model();
        let count = t.sample_count();

        let late = at_half(21);
        assert!(!t.add_sample(late, &mut Tracer::none()));
        assert_eq!(t.model(), model);
        assert_eq!(t.sample_count(), count);
        assert_eq!(t.known_timestamp(), Some(late));
    }

    #[test]
    fn duplicate_sample_rejected_once_converged() {
        let mut t = converged();
        let model = t.model();
        assert!(!t.add_sample(at(9), &mut Tracer::none()));
        assert_eq!(t.model(), model);
        // The newest buffered sample becomes the known timestamp.
        assert_eq!(t.known_timestamp(), Some(at(9)));
    }

    #[test]
    fn rejection_while_learning_starts_over() {
        let mut t = tracker();
        assert!(t.add_sample(at(0), &mut Tracer::none()));
        assert!(t.add_sample(at(1), &mut Tracer::none()));
        assert!(!t.add_sample(at_half(3), &mut Tracer::none()));
        assert_eq!(t.sample_count(), 0);
        assert_eq!(t.known_timestamp(), Some(at_half(3)));
        assert_eq!(t.model(), Model::trivial(IDEAL));

        // The next sample is accepted unconditionally.
        assert!(t.add_sample(at(5), &mut Tracer::none()));
        assert_eq!(t.sample_count(), 1);
    }

    #[test]
    fn degenerate_fit_resets_model() {
        let config = PredictorConfig {
            history_size: 4,
            min_samples: 1,
            ..PredictorConfig::standard()
        };
        let mut t = VsyncTracker::new(DisplayId(0), IDEAL, config);
        // A single sample has no ordinal spread.
        assert!(!t.add_sample(at(0), &mut Tracer::none()));
        assert_eq!(t.sample_count(), 0);
        assert_eq!(t.model(), Model::trivial(IDEAL));
        assert_eq!(t.known_timestamp(), Some(at(0)));
    }

    #[test]
    fn drifted_model_diverges_and_resets() {
        let mut t = converged();
        // A model far off the ideal period buckets the next refit badly.
        t.rates.set_active_model(Model {
            slope: Duration(25_000_000),
            intercept: Duration::ZERO,
        });

        // In phase with the ideal period, so the validator admits it.
        assert!(!t.add_sample(at(10), &mut Tracer::none()));
        assert_eq!(t.model(), Model::trivial(IDEAL));
        assert_eq!(t.sample_count(), 0);
        assert!(t.needs_more_samples());
        assert_eq!(t.known_timestamp(), Some(at(10)));
    }

    #[test]
    fn predictions_are_never_early() {
        let mut t = tracker();
        // Jittered hardware timestamps.
        let jitter = [0, 120_000, -80_000, 40_000, -150_000, 90_000, 0, -30_000];
        for (n, offset) in (0..16).zip(jitter.iter().cycle()) {
            let ts = Timestamp(T0 + n * P + offset);
            let _ = t.add_sample(ts, &mut Tracer::none());
        }
        assert!(!t.needs_more_samples());
        let mut point = T0 - 3 * P;
        while point < T0 + 40 * P {
            let prediction = t.predict(Timestamp(point), &mut Tracer::none());
            assert!(prediction >= Timestamp(point), "{prediction:?} < {point}");
            assert!(prediction.nanos() - point <= t.current_period().nanos());
            point += 1_234_567;
        }
    }

    #[test]
    fn prediction_on_a_vsync_returns_that_vsync() {
        let mut t = converged();
        assert_eq!(t.predict(at(12), &mut Tracer::none()), at(12));
        assert_eq!(t.predict(Timestamp(at(12).nanos() + 1), &mut Tracer::none()), at(13));
    }

    #[test]
    fn cold_prediction_without_history() {
        let mut t = tracker();
        let now = Timestamp(5_000);
        assert_eq!(t.predict(now, &mut Tracer::none()), Timestamp(5_000 + P));
    }

    #[test]
    fn cold_prediction_anchors_on_known_timestamp() {
        let mut t = converged();
        t.set_period(IDEAL, &mut Tracer::none());
        assert_eq!(t.sample_count(), 0);
        assert_eq!(t.known_timestamp(), Some(at(9)));

        assert_eq!(t.predict(at_half(29), &mut Tracer::none()), at(15));
        assert_eq!(t.predict(at(15), &mut Tracer::none()), at(16));
        // Requests before the anchor still return a future vsync.
        let early = t.predict(at(4), &mut Tracer::none());
        assert!(early > at(4));
    }

    #[test]
    fn set_period_clears_history_and_keeps_known() {
        let mut t = tracker();
        for n in 0..3 {
            assert!(t.add_sample(at(n), &mut Tracer::none()));
        }
        t.reset_model();
        assert_eq!(t.known_timestamp(), Some(at(2)));

        for n in 0..4 {
            assert!(t.add_sample(at(n), &mut Tracer::none()));
        }
        // Older samples than the known timestamp never lower it.
        t.set_period(Duration(8_333_333), &mut Tracer::none());
        assert_eq!(t.sample_count(), 0);
        assert_eq!(t.known_timestamp(), Some(at(3)));
        assert_eq!(t.ideal_period(), Duration(8_333_333));
        assert_eq!(t.model(), Model::trivial(Duration(8_333_333)));
        assert!(t.needs_more_samples());
    }

    #[test]
    fn mode_switch_restores_cached_model() {
        let true_period = 16_700_000;
        let mut t = tracker();
        for n in 0..8 {
            assert!(t.add_sample(Timestamp(T0 + n * true_period), &mut Tracer::none()));
        }
        let learned = t.model();
        assert_ne!(learned, Model::trivial(IDEAL));

        t.set_period(Duration(8_333_333), &mut Tracer::none());
        assert_eq!(t.current_period(), Duration(8_333_333));
        t.set_period(IDEAL, &mut Tracer::none());
        assert_eq!(t.model(), learned);
        assert!(t.needs_more_samples());
    }

    #[test]
    fn rate_map_is_bounded() {
        let mut t = tracker();
        for i in 1..=31 {
            t.set_period(Duration(P + i * 1_000), &mut Tracer::none());
            assert!(t.rate_map().len() <= RateMap::CAPACITY);
            assert!(t.rate_map().contains(t.ideal_period()));
        }
        assert!(!t.rate_map().contains(IDEAL));
    }

    #[test]
    fn reset_model_returns_to_learning() {
        let mut t = converged();
        t.reset_model();
        assert!(t.needs_more_samples());
        assert_eq!(t.model(), Model::trivial(IDEAL));
        assert_eq!(t.known_timestamp(), Some(at(9)));
    }

    #[test]
    fn half_render_rate_skips_alternate_vsyncs() {
        let mut t = converged();
        t.set_render_rate(Fps::from_hz(30.0));

        let first = t.predict(at_half(19), &mut Tracer::none());
        let second = t.predict(at_half(21), &mut Tracer::none());
        assert_eq!(first, at(10));
        assert_eq!(second, at(12));
        assert_eq!(second - first, Duration(2 * P));
        // The reference stays on the unskipped vsync.
        assert_eq!(
            t.last_sequence(),
            Some(VsyncSequence {
                vsync_time: at(11),
                sequence: 1,
            })
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn panic_during_predict_leaves_reference_untouched() {
        use std::panic::{AssertUnwindSafe, catch_unwind};

        let mut t = converged().with_divisor(|_: Fps, _: Fps| -> u32 {
            panic!("policy failure");
        });
        t.set_render_rate(Fps::from_hz(30.0));
        let result = catch_unwind(AssertUnwindSafe(|| t.predict(at(10), &mut Tracer::none())));
        assert!(result.is_err());
        assert_eq!(t.last_sequence(), None);
    }

    #[test]
    fn native_render_rate_does_not_skip() {
        let mut t = converged();
        t.set_render_rate(Fps::from_period(IDEAL));
        assert_eq!(t.predict(at_half(19), &mut Tracer::none()), at(10));
        assert_eq!(t.predict(at_half(21), &mut Tracer::none()), at(11));
    }

    #[test]
    fn in_phase_at_native_rate_is_always_true() {
        let mut t = converged();
        let _ = t.predict(at(10), &mut Tracer::none());
        let native = Fps::from_period(IDEAL);
        for n in 10..20 {
            assert!(t.is_in_phase(at(n), native, &mut Tracer::none()));
        }
        assert!(t.is_in_phase(Timestamp(0), Fps::from_hz(30.0), &mut Tracer::none()));
    }

    #[test]
    fn in_phase_at_half_rate_alternates() {
        let mut t = converged();
        let _ = t.predict(at_half(19), &mut Tracer::none());
        let half = Fps::from_hz(30.0);
        let phases: Vec<bool> = (10..16)
            .map(|n| t.is_in_phase(at(n), half, &mut Tracer::none()))
            .collect();
        assert_eq!(phases, [true, false, true, false, true, false]);
    }

    #[test]
    fn custom_divisor_policy_is_used() {
        let mut t = converged().with_divisor(|_: Fps, _: Fps| 3_u32);
        t.set_render_rate(Fps::from_hz(20.0));
        let first = t.predict(at(10), &mut Tracer::none());
        let second = t.predict(at(11), &mut Tracer::none());
        assert_eq!(first, at(10));
        assert_eq!(second, at(13));
    }

    #[test]
    fn tolerance_is_clamped() {
        let config = PredictorConfig {
            outlier_tolerance_percent: 250,
            ..PredictorConfig::standard()
        };
        let t = VsyncTracker::new(DisplayId(0), IDEAL, config);
        assert_eq!(t.config().outlier_tolerance_percent, 100);
    }

    #[test]
    #[should_panic(expected = "ideal period must be positive")]
    fn zero_ideal_period_panics() {
        let _ = VsyncTracker::new(DisplayId(0), Duration::ZERO, PredictorConfig::standard());
    }

    #[test]
    fn dump_lists_every_cached_mode() {
        let mut t = converged();
        t.set_period(Duration(8_333_333), &mut Tracer::none());
        let mut out = String::new();
        t.dump(&mut out).unwrap();
        assert!(out.contains("ideal period = 8.33ms"), "got: {out}");
        assert!(out.contains("ideal period 16.67ms: period = 16.67ms"), "got: {out}");
        assert!(out.contains("ideal period 8.33ms: period = 8.33ms, intercept = 0ns"));
        assert!(!out.contains("render rate"), "got: {out}");
        assert!(!out.contains("last vsync"), "got: {out}");

        t.set_render_rate(Fps::from_hz(30.0));
        let _ = t.predict(Timestamp(1_000), &mut Tracer::none());
        let mut out = String::new();
        t.dump(&mut out).unwrap();
        assert!(out.contains("render rate = 30.00 Hz"), "got: {out}");
        assert!(out.contains("sequence 0"), "got: {out}");
    }

    #[test]
    fn integer_rounding_helpers() {
        assert_eq!(ceil_div(10, 5), 2);
        assert_eq!(ceil_div(11, 5), 3);
        assert_eq!(ceil_div(-11, 5), -2);
        assert_eq!(round_div(12, 5), 2);
        assert_eq!(round_div(13, 5), 3);
        assert_eq!(round_div(-12, 5), -2);
        assert_eq!(round_div(-13, 5), -3);
        assert_eq!(round_div(5, 10), 1);
        assert_eq!(round_div(-5, 10), -1);
        assert_eq!(round_div(-4, 10), 0);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn verbose_config_traces_samples_and_models() {
        use crate::trace::TraceSink;

        #[derive(Default)]
        struct Counts {
            samples: usize,
            models: usize,
            predictions: usize,
        }
        impl TraceSink for Counts {
            fn on_sample(&mut self, _: &SampleEvent) {
                self.samples += 1;
            }
            fn on_model_update(&mut self, _: &ModelUpdateEvent) {
                self.models += 1;
            }
            fn on_prediction(&mut self, _: &PredictionEvent) {
                self.predictions += 1;
            }
        }

        let mut quiet = Counts::default();
        let mut t = tracker();
        for n in 0..8 {
            let _ = t.add_sample(at(n), &mut Tracer::new(&mut quiet));
        }
        assert_eq!(quiet.samples, 0);
        assert_eq!(quiet.models, 0);

        let mut loud = Counts::default();
        let mut t = VsyncTracker::new(DisplayId(0), IDEAL, PredictorConfig::verbose());
        for n in 0..8 {
            let _ = t.add_sample(at(n), &mut Tracer::new(&mut loud));
        }
        let _ = t.predict(at(9), &mut Tracer::new(&mut loud));
        assert_eq!(loud.samples, 8);
        assert_eq!(loud.models, 3);
        assert_eq!(loud.predictions, 1);
    }
}
