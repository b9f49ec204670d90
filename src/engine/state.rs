//! Aggregate game state
//!
//! `GameState` is the single mutable aggregate the engine owns: the resource
//! pools, the per-activity records, and the monotonic game clock. External
//! callers only ever see it through engine reads or the persistence layer.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::activity::OwnedActivity;
use crate::catalog::Catalog;

/// The whole mutable state of one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Money on hand; spent permanently by clicks and purchases
    pub money: u64,
    /// Juice not currently held by a running activity
    pub juice_free: f64,
    /// The full juice pool. Running activities hold juice out of
    /// `juice_free` but it stays counted here until released.
    /// Invariant: `juice_free <= juice_total`.
    pub juice_total: f64,
    /// Prestige currency, accrued over time; consumed whole by meditation
    pub seeds: f64,
    /// Automation currency; only meditation grants these
    pub ideas: u64,
    /// One record per catalog entry, keyed by activity id
    pub owned: AHashMap<String, OwnedActivity>,
    /// Monotonic in-game clock in seconds; never decreases, survives prestige
    pub elapsed_seconds: f64,
}

impl GameState {
    /// A fresh game: everything zero, one zeroed record per catalog entry
    pub fn fresh(catalog: &Catalog) -> Self {
        let mut state = Self {
            money: 0,
            juice_free: 0.0,
            juice_total: 0.0,
            seeds: 0.0,
            ideas: 0,
            owned: AHashMap::new(),
            elapsed_seconds: 0.0,
        };
        state.ensure_owned(catalog);
        state
    }

    /// Create missing records for catalog entries this state has never seen.
    /// Called on fresh games and after loading a save written against an
    /// older catalog.
    pub fn ensure_owned(&mut self, catalog: &Catalog) {
        for def in catalog.all() {
            self.owned
                .entry(def.id.clone())
                .or_insert_with(OwnedActivity::new);
        }
    }

    /// Juice currently held by in-flight runs
    pub fn outstanding_reservations(&self) -> f64 {
        self.owned.values().map(|rec| rec.reserved_juice).sum()
    }

    /// Whether the invariant set holds. Commands must leave this true;
    /// the engine debug-asserts it and the test suites assert it directly.
    pub fn invariants_hold(&self) -> bool {
        const EPS: f64 = 1e-9;
        if self.juice_free < -EPS || self.juice_free > self.juice_total + EPS {
            return false;
        }
        if self.seeds < -EPS || self.elapsed_seconds < -EPS {
            return false;
        }
        self.owned.values().all(|rec| {
            rec.active_instances <= rec.total_instances
                && rec.progress >= -EPS
                && rec.reserved_juice >= -EPS
                && (rec.running || (rec.progress == 0.0 && rec.reserved_juice == 0.0))
        })
    }
}
