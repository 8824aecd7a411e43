// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Refresh rates and the frame-rate divisor policy.
//!
//! [`Fps`] is a rate in Hz. The predictor only needs rates for phase
//! alignment: when the renderer targets a rate lower than the display's
//! native rate, the [`FrameRateDivisor`] policy decides how many native
//! vsyncs make up one rendered frame.

use core::fmt;

use crate::time::Duration;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// A refresh or frame rate in Hz.
#[derive(Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Fps(pub f32);

impl Fps {
    /// Creates a rate from a frequency in Hz.
    #[inline]
    #[must_use]
    pub const fn from_hz(hz: f32) -> Self {
        Self(hz)
    }

    /// Creates a rate from a period. Non-positive periods yield an invalid
    /// (zero) rate.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "refresh rates are far inside f32 range"
    )]
    pub fn from_period(period: Duration) -> Self {
        if !period.is_positive() {
            return Self(0.0);
        }
        Self((NANOS_PER_SECOND / period.nanos() as f64) as f32)
    }

    /// Returns the frequency in Hz.
    #[inline]
    #[must_use]
    pub const fn hz(self) -> f32 {
        self.0
    }

    /// Returns `true` for a finite, strictly positive rate.
    #[inline]
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }
}

impl fmt::Debug for Fps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fps({:.2})", self.0)
    }
}

impl fmt::Display for Fps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} Hz", self.0)
    }
}

/// Refresh-rate policy: how many display vsyncs make up one frame at
/// `frame_rate`.
///
/// Return values `0` and `1` both mean "no phase skipping": `0` reports that
/// `frame_rate` is not an integer divisor of `display_rate`, `1` that the two
/// rates match.
pub trait FrameRateDivisor {
    /// Returns the integer ratio `display_rate / frame_rate`, or `0` if there
    /// is none.
    fn divisor(&self, display_rate: Fps, frame_rate: Fps) -> u32;
}

impl<F> FrameRateDivisor for F
where
    F: Fn(Fps, Fps) -> u32,
{
    fn divisor(&self, display_rate: Fps, frame_rate: Fps) -> u32 {
        self(display_rate, frame_rate)
    }
}

/// Default divisor policy: rounds the rate ratio to the nearest integer and
/// rejects ratios that are not close to one.
///
/// The tolerance is tight enough to tell NTSC-style fractional rates apart
/// from their integer neighbours (59.94 Hz is not a divisor of 60 Hz).
#[derive(Clone, Copy, Debug, Default)]
pub struct RoundedDivisor;

impl RoundedDivisor {
    /// Largest distance from an integer ratio still treated as a divisor.
    pub const THRESHOLD: f64 = 0.0009;
}

impl FrameRateDivisor for RoundedDivisor {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "ratio is clamped to the u32 range before the cast"
    )]
    fn divisor(&self, display_rate: Fps, frame_rate: Fps) -> u32 {
        if !frame_rate.is_valid() || !display_rate.is_valid() {
            return 0;
        }
        let ratio = f64::from(display_rate.0) / f64::from(frame_rate.0);
        let ratio = if ratio > f64::from(u32::MAX) {
            f64::from(u32::MAX)
        } else {
            ratio
        };
        let rounded = (ratio + 0.5) as u32;
        let error = ratio - f64::from(rounded);
        let error = if error < 0.0 { -error } else { error };
        if error > Self::THRESHOLD {
            return 0;
        }
        rounded
    }
}
