// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-mode model cache.
//!
//! Displays switch between a handful of refresh rates. [`RateMap`] keeps the
//! fitted [`Model`] for each nominal period it has seen so that returning to
//! a known mode starts from the learned model instead of the trivial one.
//!
//! The cache is bounded by [`RateMap::CAPACITY`]. Overflow evicts the entry
//! inserted longest ago, never the active one.

use alloc::collections::VecDeque;

use hashbrown::HashMap;

use crate::fit::Model;
use crate::time::Duration;

/// Bounded map from nominal period to fitted model, in insertion order.
#[derive(Clone, Debug)]
pub struct RateMap {
    models: HashMap<Duration, Model>,
    order: VecDeque<Duration>,
    active: Duration,
}

impl RateMap {
    /// Maximum number of cached periods.
    pub const CAPACITY: usize = 30;

    /// Creates a map whose only entry is the trivial model for `ideal_period`,
    /// which becomes the active period.
    #[must_use]
    pub fn new(ideal_period: Duration) -> Self {
        let mut map = Self {
            models: HashMap::with_capacity(Self::CAPACITY),
            order: VecDeque::with_capacity(Self::CAPACITY),
            active: ideal_period,
        };
        map.insert_trivial(ideal_period);
        map
    }

    /// Number of cached periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Always `false`: the active period has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Returns `true` if `period` has a cached model.
    #[must_use]
    pub fn contains(&self, period: Duration) -> bool {
        self.models.contains_key(&period)
    }

    /// The active nominal period.
    #[must_use]
    pub fn active_period(&self) -> Duration {
        self.active
    }

    /// The model for the active period.
    #[must_use]
    pub fn active_model(&self) -> Model {
        self.models
            .get(&self.active)
            .copied()
            .unwrap_or(Model::trivial(self.active))
    }

    /// Replaces the model for the active period.
    pub fn set_active_model(&mut self, model: Model) {
        let active = self.active;
        if !self.models.contains_key(&active) {
            self.insert_trivial(active);
        }
        self.models.insert(active, model);
    }

    /// Resets the active period to its trivial model.
    pub fn reset_active(&mut self) {
        self.set_active_model(Model::trivial(self.active));
    }

    /// Returns the model for `period`, caching a trivial one if absent.
    pub fn get(&mut self, period: Duration) -> Model {
        if let Some(model) = self.models.get(&period) {
            return *model;
        }
        self.insert_trivial(period)
    }

    /// Makes `period` the active period, creating a trivial entry for it if
    /// it has not been seen (evicting the oldest entry when full).
    pub fn set_active(&mut self, period: Duration) {
        self.active = period;
        if !self.models.contains_key(&period) {
            self.insert_trivial(period);
        }
    }

    /// Iterates `(ideal period, model)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Duration, Model)> + '_ {
        self.order
            .iter()
            .filter_map(|p| self.models.get(p).map(|m| (*p, *m)))
    }

    fn insert_trivial(&mut self, period: Duration) -> Model {
        if self.models.len() >= Self::CAPACITY {
            self.evict_oldest();
        }
        let model = Model::trivial(period);
        self.models.insert(period, model);
        self.order.push_back(period);
        model
    }

    fn evict_oldest(&mut self) {
        let Some(pos) = self.order.iter().position(|p| *p != self.active) else {
            return;
        };
        if let Some(period) = self.order.remove(pos) {
            self.models.remove(&period);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    const P60: Duration = Duration(16_666_667);
    const P90: Duration = Duration(11_111_111);
    const P120: Duration = Duration(8_333_333);

    #[test]
    fn new_map_holds_trivial_active_entry() {
        let map = RateMap::new(P60);
        assert_eq!(map.len(), 1);
        assert_eq!(map.active_period(), P60);
        assert_eq!(map.active_model(), Model::trivial(P60));
    }

    #[test]
    fn switching_back_restores_learned_model() {
        let mut map = RateMap::new(P60);
        let learned = Model {
            slope: Duration(16_660_000),
            intercept: Duration(1_200),
        };
        map.set_active_model(learned);

        map.set_active(P120);
        assert_eq!(map.active_model(), Model::trivial(P120));

        map.set_active(P60);
        assert_eq!(map.active_model(), learned);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn get_creates_trivial_entry() {
        let mut map = RateMap::new(P60);
        assert!(!map.contains(P90));
        assert_eq!(map.get(P90), Model::trivial(P90));
        assert!(map.contains(P90));
        assert_eq!(map.active_period(), P60);
    }

    #[test]
    fn overflow_evicts_insertion_oldest() {
        let mut map = RateMap::new(P60);
        for i in 1..=30 {
            map.set_active(Duration(P60.nanos() + i));
            assert!(map.len() <= RateMap::CAPACITY);
        }
        assert_eq!(map.len(), RateMap::CAPACITY);
        assert!(!map.contains(P60), "first period should be evicted");
        assert!(map.contains(Duration(P60.nanos() + 1)));

        map.set_active(Duration(P60.nanos() + 31));
        assert!(!map.contains(Duration(P60.nanos() + 1)));
        assert_eq!(map.len(), RateMap::CAPACITY);
    }

    #[test]
    fn eviction_never_removes_active_period() {
        let mut map = RateMap::new(P60);
        for i in 1..30 {
            let _ = map.get(Duration(P60.nanos() + i));
        }
        assert_eq!(map.len(), RateMap::CAPACITY);
        // P60 is both the oldest and the active entry.
        let _ = map.get(P120);
        assert!(map.contains(P60));
        assert!(!map.contains(Duration(P60.nanos() + 1)));
    }

    #[test]
    fn reset_active_restores_trivial() {
        let mut map = RateMap::new(P60);
        map.set_active_model(Model {
            slope: Duration(16_000_000),
            intercept: Duration(-50),
        });
        map.reset_active();
        assert_eq!(map.active_model(), Model::trivial(P60));
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut map = RateMap::new(P60);
        map.set_active(P120);
        map.set_active(P90);
        map.set_active(P60);
        let periods: Vec<_> = map.iter().map(|(p, _)| p).collect();
        assert_eq!(periods, [P60, P120, P90]);
    }
}
