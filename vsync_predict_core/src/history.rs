// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded history of observed vsync timestamps.
//!
//! [`History`] is a fixed-capacity ring: samples are appended until the ring
//! is full, after which each new sample overwrites the slot after the most
//! recent write. Storage is allocated once at construction and never grows.
//!
//! Clearing the ring does not forget where vsync was: the largest timestamp
//! seen so far is kept as the *known timestamp*, which anchors predictions
//! while no samples are buffered.
//!
//! [`History::validate`] decides whether an incoming timestamp lines up with
//! the expected period before it is admitted.

use alloc::vec::Vec;

use crate::time::{Duration, Timestamp};

const MAX_PERCENT: i128 = 100;

/// Outcome of checking a timestamp against the buffered history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleVerdict {
    /// The timestamp is consistent with the current period.
    Accepted,
    /// The timestamp does not land near a whole multiple of the period after
    /// the last admitted sample.
    OutOfPhase,
    /// The timestamp is within tolerance of a sample already buffered.
    Duplicate,
}

impl SampleVerdict {
    /// Returns `true` for [`SampleVerdict::Accepted`].
    #[inline]
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Fixed-capacity ring of recent vsync timestamps plus the known timestamp.
#[derive(Clone, Debug)]
pub struct History {
    samples: Vec<Timestamp>,
    capacity: usize,
    last_index: Option<usize>,
    known: Option<Timestamp>,
}

impl History {
    /// Creates an empty history holding at most `capacity` samples.
    ///
    /// `capacity == 0` is promoted to `1`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            last_index: None,
            known: None,
        }
    }

    /// Maximum number of buffered samples.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when no samples are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Buffered samples in slot order (not time order once the ring wraps).
    #[must_use]
    pub fn as_slice(&self) -> &[Timestamp] {
        &self.samples
    }

    /// The most recently admitted sample.
    #[must_use]
    pub fn last(&self) -> Option<Timestamp> {
        self.last_index.and_then(|i| self.samples.get(i).copied())
    }

    /// The smallest buffered timestamp.
    #[must_use]
    pub fn oldest(&self) -> Option<Timestamp> {
        self.samples.iter().min().copied()
    }

    /// The largest buffered timestamp.
    #[must_use]
    pub fn newest(&self) -> Option<Timestamp> {
        self.samples.iter().max().copied()
    }

    /// The anchor kept across clears, if any sample was ever seen.
    #[must_use]
    pub fn known_timestamp(&self) -> Option<Timestamp> {
        self.known
    }

    /// Admits a sample, overwriting the oldest slot once full.
    pub fn push(&mut self, timestamp: Timestamp) {
        if self.samples.len() < self.capacity {
            self.samples.push(timestamp);
            self.last_index = Some(self.samples.len() - 1);
        } else {
            let next = self.last_index.map_or(0, |i| (i + 1) % self.capacity);
            self.samples[next] = timestamp;
            self.last_index = Some(next);
        }
    }

    /// Raises the known timestamp to at least `timestamp`.
    pub fn raise_known(&mut self, timestamp: Timestamp) {
        self.known = Some(self.known.map_or(timestamp, |k| k.max(timestamp)));
    }

    /// Drops every buffered sample, folding the largest into the known
    /// timestamp first.
    pub fn clear(&mut self) {
        if let Some(newest) = self.newest() {
            self.raise_known(newest);
        }
        self.samples.clear();
        self.last_index = None;
    }

    /// Classifies `timestamp` against the buffered samples.
    ///
    /// With nothing to compare against every timestamp is accepted.
    /// Otherwise the distance from the last admitted sample, taken modulo
    /// `ideal_period`, must sit within `tolerance_percent` of either end of
    /// the period, and the timestamp must not be within `tolerance_percent`
    /// of a sample already buffered.
    #[must_use]
    pub fn classify(
        &self,
        timestamp: Timestamp,
        ideal_period: Duration,
        tolerance_percent: u32,
    ) -> SampleVerdict {
        let Some(last) = self.last() else {
            return SampleVerdict::Accepted;
        };
        let period = i128::from(ideal_period.nanos());
        if period <= 0 {
            return SampleVerdict::Accepted;
        }
        let tolerance = i128::from(tolerance_percent);

        let residual = i128::from((timestamp - last).nanos()).rem_euclid(period);
        let percent = residual * MAX_PERCENT / period;
        if percent > tolerance && percent < MAX_PERCENT - tolerance {
            return SampleVerdict::OutOfPhase;
        }

        let nearest = self
            .samples
            .iter()
            .map(|s| (i128::from(timestamp.nanos()) - i128::from(s.nanos())).abs())
            .min();
        if let Some(nearest) = nearest
            && nearest * MAX_PERCENT / period < tolerance
        {
            return SampleVerdict::Duplicate;
        }

        SampleVerdict::Accepted
    }

    /// Returns `true` if `timestamp` may be admitted.
    ///
    /// See [`classify`](Self::classify).
    #[must_use]
    pub fn validate(
        &self,
        timestamp: Timestamp,
        ideal_period: Duration,
        tolerance_percent: u32,
    ) -> bool {
        self.classify(timestamp, ideal_period, tolerance_percent)
            .is_accepted()
    }
}
