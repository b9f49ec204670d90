//! Per-activity owned state
//!
//! One `OwnedActivity` exists per catalog entry for the whole session. It is
//! created zeroed, mutated by the engine commands and the tick, and reset
//! (but never destroyed) by prestige.

use serde::{Deserialize, Serialize};

/// Runtime state for one catalog entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnedActivity {
    /// Instances purchased
    pub total_instances: u32,
    /// Instances currently counted for cost and production.
    /// Invariant: `active_instances <= total_instances`.
    pub active_instances: u32,
    /// Automation levels purchased; survives prestige
    pub automation_level: u32,
    /// Whether automation is switched on; survives prestige
    pub automated: bool,
    /// Whether a run is in flight
    pub running: bool,
    /// Seconds of progress into the current run, `0 <= progress <= duration`
    pub progress: f64,
    /// Juice held by the in-flight run; released on completion.
    /// Zero while idle.
    pub reserved_juice: f64,
}

impl OwnedActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inactive_instances(&self) -> u32 {
        self.total_instances - self.active_instances
    }

    /// Start a run, holding the given juice until `finish_run`
    pub fn begin_run(&mut self, reserved_juice: f64) {
        self.running = true;
        self.progress = 0.0;
        self.reserved_juice = reserved_juice;
    }

    /// Complete the in-flight run, returning the juice it held
    pub fn finish_run(&mut self) -> f64 {
        let released = self.reserved_juice;
        self.running = false;
        self.progress = 0.0;
        self.reserved_juice = 0.0;
        released
    }

    /// Prestige reset: wipe instances and the in-flight run, keep automation
    pub fn reset_for_prestige(&mut self) {
        self.total_instances = 0;
        self.active_instances = 0;
        self.running = false;
        self.progress = 0.0;
        self.reserved_juice = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let rec = OwnedActivity::new();
        assert_eq!(rec.total_instances, 0);
        assert_eq!(rec.active_instances, 0);
        assert_eq!(rec.automation_level, 0);
        assert!(!rec.automated);
        assert!(!rec.running);
        assert_eq!(rec.reserved_juice, 0.0);
    }

    #[test]
    fn test_run_lifecycle_releases_exact_reservation() {
        let mut rec = OwnedActivity::new();
        rec.total_instances = 2;
        rec.active_instances = 2;

        rec.begin_run(1.25);
        assert!(rec.running);
        assert_eq!(rec.progress, 0.0);

        rec.progress = 3.0;
        // active count changing mid-run must not change what was reserved
        rec.active_instances = 1;

        let released = rec.finish_run();
        assert_eq!(released, 1.25);
        assert!(!rec.running);
        assert_eq!(rec.progress, 0.0);
        assert_eq!(rec.reserved_juice, 0.0);
    }

    #[test]
    fn test_prestige_reset_preserves_automation() {
        let mut rec = OwnedActivity {
            total_instances: 5,
            active_instances: 3,
            automation_level: 2,
            automated: true,
            running: true,
            progress: 0.7,
            reserved_juice: 0.4,
        };

        rec.reset_for_prestige();

        assert_eq!(rec.total_instances, 0);
        assert_eq!(rec.active_instances, 0);
        assert!(!rec.running);
        assert_eq!(rec.progress, 0.0);
        assert_eq!(rec.reserved_juice, 0.0);
        assert_eq!(rec.automation_level, 2, "automation level must survive");
        assert!(rec.automated, "automation toggle must survive");
    }
}
