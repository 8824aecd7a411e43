// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Physical display identification.
//!
//! [`DisplayId`] is a lightweight handle naming the display a predictor
//! serves. The embedder assigns it; core only carries it on trace events and
//! in diagnostics.

use core::fmt;

/// Identifies the physical display a predictor instance belongs to.
///
/// One predictor exists per connected display, so trace consumers use this
/// to tell counters from different displays apart.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DisplayId(pub u64);

impl fmt::Debug for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayId({})", self.0)
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
