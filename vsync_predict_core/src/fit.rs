// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Least-squares vsync model fitting.
//!
//! A [`Model`] maps a vsync ordinal to a timestamp:
//!
//! ```text
//! vsync(n) = oldest_sample + intercept + n * slope
//! ```
//!
//! [`fit`] regresses the buffered timestamps (Y) against their ordinals (X),
//! where each ordinal is the sample's distance from the oldest sample rounded
//! to a whole number of *current* model periods. Everything is integer
//! arithmetic with `i128` accumulators; ordinals are scaled by
//! [`ORDINAL_SCALE`] so their mean keeps three decimal places.

use core::fmt;

use crate::time::{Duration, Timestamp};

/// Fixed-point scale applied to ordinals.
pub const ORDINAL_SCALE: i128 = 1000;

const MAX_PERCENT: i128 = 100;

/// Fitted vsync model for one ideal period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Model {
    /// Estimated true vsync period.
    pub slope: Duration,
    /// Offset of the first predicted vsync from the oldest buffered sample.
    pub intercept: Duration,
}

impl Model {
    /// The model used before enough samples have been seen: the nominal
    /// period with no offset.
    #[inline]
    #[must_use]
    pub const fn trivial(ideal_period: Duration) -> Self {
        Self {
            slope: ideal_period,
            intercept: Duration::ZERO,
        }
    }

}

/// Why a fit was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FitError {
    /// All samples fell into one ordinal bucket, so there is no spread to
    /// regress against.
    Degenerate,
    /// The fitted period is further from the ideal period than the outlier
    /// tolerance allows, or not positive.
    Diverged {
        /// The rejected period.
        slope: Duration,
    },
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degenerate => f.write_str("degenerate fit: no ordinal spread"),
            Self::Diverged { slope } => {
                write!(f, "fitted period {}ns diverged from ideal", slope.nanos())
            }
        }
    }
}

impl core::error::Error for FitError {}

/// Fits a model to `samples`.
///
/// `current_slope` buckets samples into ordinals; a zero slope puts every
/// sample in bucket zero, which always yields [`FitError::Degenerate`].
/// The result is rejected when its slope is not positive or differs from
/// `ideal_period` by more than `tolerance_percent`.
///
/// # Errors
///
/// See [`FitError`]. An empty `samples` slice is degenerate.
#[expect(
    clippy::cast_possible_truncation,
    reason = "means, slope and intercept are bounded by sample spread, which fits in i64"
)]
pub fn fit(
    samples: &[Timestamp],
    current_slope: Duration,
    ideal_period: Duration,
    tolerance_percent: u32,
) -> Result<Model, FitError> {
    let Some(oldest) = samples.iter().min().copied() else {
        return Err(FitError::Degenerate);
    };
    let n = samples.len() as i128;
    let period = i128::from(current_slope.nanos());

    let ordinal = |y: i128| {
        if period == 0 {
            0
        } else {
            (y + period / 2) / period * ORDINAL_SCALE
        }
    };

    let mut sum_y = 0_i128;
    let mut sum_x = 0_i128;
    for s in samples {
        let y = i128::from((*s - oldest).nanos());
        sum_y += y;
        sum_x += ordinal(y);
    }
    let mean_y = sum_y / n;
    let mean_x = sum_x / n;

    let mut top = 0_i128;
    let mut bottom = 0_i128;
    for s in samples {
        let y = i128::from((*s - oldest).nanos());
        let dy = y - mean_y;
        let dx = ordinal(y) - mean_x;
        top += dy * dx;
        bottom += dx * dx;
    }

    if bottom == 0 {
        return Err(FitError::Degenerate);
    }

    let slope = top * ORDINAL_SCALE / bottom;
    let intercept = mean_y - slope * mean_x / ORDINAL_SCALE;
    let slope_d = Duration(slope as i64);

    let ideal = i128::from(ideal_period.nanos());
    if slope <= 0 || ideal <= 0 {
        return Err(FitError::Diverged { slope: slope_d });
    }
    let percent = (slope - ideal).abs() * MAX_PERCENT / ideal;
    if percent > i128::from(tolerance_percent) {
        return Err(FitError::Diverged { slope: slope_d });
    }

    Ok(Model {
        slope: slope_d,
        intercept: Duration(intercept as i64),
    })
}
