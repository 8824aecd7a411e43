// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the predictor.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! predictor emits. All method bodies default to no-ops, so implementing only
//! the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Events are observational. Nothing a sink does can change what the
//! predictor returns.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::display::DisplayId;
use crate::fit::{FitError, Model};
use crate::history::SampleVerdict;
use crate::time::{Duration, Timestamp};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which path produced a prediction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PredictionMode {
    /// No buffered samples: extrapolated from the known timestamp and the
    /// ideal period.
    Cold,
    /// Extrapolated from the fitted model and the buffered samples.
    Warm,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for every hardware timestamp offered to the predictor.
///
/// Only emitted when verbose tracing is configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleEvent {
    /// Display the sample belongs to.
    pub display: DisplayId,
    /// The offered timestamp.
    pub timestamp: Timestamp,
    /// How the validator classified it.
    pub verdict: SampleVerdict,
}

/// Emitted when a fit is committed for the active period.
///
/// Only emitted when verbose tracing is configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelUpdateEvent {
    /// Display the model belongs to.
    pub display: DisplayId,
    /// Sample that triggered the fit.
    pub timestamp: Timestamp,
    /// Nominal period the model is cached under.
    pub ideal_period: Duration,
    /// The committed model.
    pub model: Model,
}

/// Emitted when a fit is rejected and the model reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitRejectedEvent {
    /// Display the model belongs to.
    pub display: DisplayId,
    /// Sample that triggered the fit.
    pub timestamp: Timestamp,
    /// Nominal period the model is cached under.
    pub ideal_period: Duration,
    /// Why the fit was rejected.
    pub error: FitError,
}

/// Emitted for every prediction computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PredictionEvent {
    /// Display the prediction is for.
    pub display: DisplayId,
    /// Which path produced it.
    pub mode: PredictionMode,
    /// Requested time point.
    pub time_point: Timestamp,
    /// Predicted vsync at or after `time_point`.
    pub prediction: Timestamp,
}

/// Emitted when the nominal period changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodChangeEvent {
    /// Display whose mode changed.
    pub display: DisplayId,
    /// The new nominal period.
    pub period: Duration,
}

/// Emitted for every in-phase query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseCheckEvent {
    /// Display the query is for.
    pub display: DisplayId,
    /// Queried time point.
    pub time_point: Timestamp,
    /// Vsync nearest to `time_point`.
    pub vsync_time: Timestamp,
    /// Sequence number of that vsync.
    pub sequence: i64,
    /// Divisor between the native rate and the queried rate.
    pub divisor: u32,
    /// The answer returned.
    pub in_phase: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the predictor.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a timestamp is offered.
    fn on_sample(&mut self, e: &SampleEvent) {
        _ = e;
    }

    /// Called when a fitted model is committed.
    fn on_model_update(&mut self, e: &ModelUpdateEvent) {
        _ = e;
    }

    /// Called when a fit is rejected.
    fn on_fit_rejected(&mut self, e: &FitRejectedEvent) {
        _ = e;
    }

    /// Called for every prediction.
    fn on_prediction(&mut self, e: &PredictionEvent) {
        _ = e;
    }

    /// Called when the nominal period changes.
    fn on_period_change(&mut self, e: &PeriodChangeEvent) {
        _ = e;
    }

    /// Called for every in-phase query.
    fn on_phase_check(&mut self, e: &PhaseCheckEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`SampleEvent`].
    #[inline]
    pub fn sample(&mut self, e: &SampleEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_sample(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ModelUpdateEvent`].
    #[inline]
    pub fn model_update(&mut self, e: &ModelUpdateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_model_update(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FitRejectedEvent`].
    #[inline]
    pub fn fit_rejected(&mut self, e: &FitRejectedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_fit_rejected(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PredictionEvent`].
    #[inline]
    pub fn prediction(&mut self, e: &PredictionEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_prediction(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PeriodChangeEvent`].
    #[inline]
    pub fn period_change(&mut self, e: &PeriodChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_period_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseCheckEvent`].
    #[inline]
    pub fn phase_check(&mut self, e: &PhaseCheckEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_check(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
