// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hardware vsync model fitting and prediction.
//!
//! `vsync_predict_core` learns the true refresh period and phase of a display
//! from the hardware vsync timestamps it reports, and predicts when future
//! vsyncs will occur. It is `no_std` compatible (with `alloc`); the
//! thread-safe [`VsyncPredictor`](predictor::VsyncPredictor) wrapper needs
//! the `std` feature.
//!
//! # Architecture
//!
//! ```text
//!   hardware vsync ──► History::classify() ──► History (ring) ──► fit()
//!                                                                    │
//!                 ┌──────────────────────────────────────────────────┘
//!                 ▼
//!   RateMap (model per ideal period) ──► VsyncTracker::predict()
//!                                                 │
//!                                                 ▼
//!                             render-rate phase alignment ──► Timestamp
//! ```
//!
//! **[`time`]**: nanosecond [`Timestamp`](time::Timestamp) and signed
//! [`Duration`](time::Duration).
//!
//! **[`history`]**: fixed-capacity ring of samples, the known-timestamp
//! anchor, and the outlier/duplicate validator.
//!
//! **[`fit`]**: integer least-squares fit of timestamps against vsync
//! ordinals.
//!
//! **[`rate_map`]**: bounded per-mode cache of fitted models.
//!
//! **[`fps`]**: refresh rates and the frame-rate divisor policy.
//!
//! **[`tracker`]**: [`VsyncTracker`](tracker::VsyncTracker), the
//! single-threaded predictor, and its [`PredictorConfig`](tracker::PredictorConfig).
//!
//! **[`predictor`]**: the locked, shareable wrapper (`std` only).
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with
//! the zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Example
//!
//! ```
//! use vsync_predict_core::display::DisplayId;
//! use vsync_predict_core::time::{Duration, Timestamp};
//! use vsync_predict_core::trace::Tracer;
//! use vsync_predict_core::tracker::{PredictorConfig, VsyncTracker};
//!
//! let period = Duration(16_666_667);
//! let mut tracker = VsyncTracker::new(DisplayId(0), period, PredictorConfig::standard());
//! for n in 0..8 {
//!     tracker.add_sample(Timestamp(n * period.nanos()), &mut Tracer::none());
//! }
//! let next = tracker.predict(Timestamp(8 * period.nanos() - 1), &mut Tracer::none());
//! assert_eq!(next, Timestamp(8 * period.nanos()));
//! ```
//!
//! # Crate features
//!
//! - `std` (enabled by default): Enables the [`predictor`] module.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod display;
pub mod fit;
pub mod fps;
pub mod history;
#[cfg(feature = "std")]
pub mod predictor;
pub mod rate_map;
pub mod time;
pub mod trace;
pub mod tracker;
