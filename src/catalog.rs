//! Activity catalog - defines what the player can click and buy
//!
//! Activities specify run duration, cost curves, and production curves,
//! and come in two kinds: jobs (money-biased) and outlets (juice-biased).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two kinds of activity
///
/// Jobs bias toward money production with little or no juice upkeep;
/// outlets bias toward juice production and usually hold juice while
/// running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    Job,
    Outlet,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityKind::Job => write!(f, "job"),
            ActivityKind::Outlet => write!(f, "outlet"),
        }
    }
}

/// An activity definition
///
/// Cost and production are pure functions of the active-instance count,
/// driven by the base fields below. Costs are monotonically non-decreasing
/// in the instance count for any base >= 0 and growth >= 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDef {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Job or outlet
    pub kind: ActivityKind,
    /// Seconds one run takes to complete
    pub base_duration: f64,
    /// Money cost of running one instance
    pub base_money_cost: u64,
    /// Juice held while one instance runs
    pub base_juice_cost: f64,
    /// Money produced by one instance per completed run
    pub base_money_rate: u64,
    /// Juice permanently added by one instance per completed run
    pub base_juice_rate: f64,
    /// Geometric growth applied to money cost per additional instance
    pub cost_growth: f64,
}

impl ActivityDef {
    /// Money cost of a run at the given active-instance count
    pub fn money_cost(&self, active: u32) -> u64 {
        if active == 0 {
            return 0;
        }
        let scale = self.cost_growth.powi(active as i32 - 1);
        (self.base_money_cost as f64 * active as f64 * scale).round() as u64
    }

    /// Juice held for the duration of a run at the given active-instance count
    pub fn juice_cost(&self, active: u32) -> f64 {
        self.base_juice_cost * active as f64
    }

    /// Money credited per completed run at the given active-instance count
    pub fn money_rate(&self, active: u32) -> u64 {
        self.base_money_rate * active as u64
    }

    /// Juice credited per completed run at the given active-instance count
    pub fn juice_rate(&self, active: u32) -> f64 {
        self.base_juice_rate * active as f64
    }
}

/// Catalog of all available activities
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    activities: Vec<ActivityDef>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in phase-1 roster
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        // Jobs: money earners, cheap on juice. The first one is free to run
        // and free to buy so a fresh game can bootstrap from zero.
        catalog.add(ActivityDef {
            id: "doodle".into(),
            name: "Sketch Doodles".into(),
            kind: ActivityKind::Job,
            base_duration: 1.0,
            base_money_cost: 0,
            base_juice_cost: 0.0,
            base_money_rate: 1,
            base_juice_rate: 0.0,
            cost_growth: 1.0,
        });
        catalog.add(ActivityDef {
            id: "memes".into(),
            name: "Post Memes".into(),
            kind: ActivityKind::Job,
            base_duration: 3.0,
            base_money_cost: 2,
            base_juice_cost: 0.1,
            base_money_rate: 8,
            base_juice_rate: 0.0,
            cost_growth: 1.15,
        });
        catalog.add(ActivityDef {
            id: "stream".into(),
            name: "Stream Sketching".into(),
            kind: ActivityKind::Job,
            base_duration: 10.0,
            base_money_cost: 20,
            base_juice_cost: 0.5,
            base_money_rate: 90,
            base_juice_rate: 0.01,
            cost_growth: 1.15,
        });
        catalog.add(ActivityDef {
            id: "commission".into(),
            name: "Take Commissions".into(),
            kind: ActivityKind::Job,
            base_duration: 30.0,
            base_money_cost: 150,
            base_juice_cost: 2.0,
            base_money_rate: 700,
            base_juice_rate: 0.0,
            cost_growth: 1.18,
        });
        catalog.add(ActivityDef {
            id: "zine".into(),
            name: "Publish Zines".into(),
            kind: ActivityKind::Job,
            base_duration: 120.0,
            base_money_cost: 1_200,
            base_juice_cost: 6.0,
            base_money_rate: 6_000,
            base_juice_rate: 0.25,
            cost_growth: 1.2,
        });
        // Phase-1 goal: buying one instance of this is "winning"
        catalog.add(ActivityDef {
            id: "construct".into(),
            name: "Create a Construct".into(),
            kind: ActivityKind::Job,
            base_duration: 600.0,
            base_money_cost: 250_000,
            base_juice_cost: 100.0,
            base_money_rate: 1_000_000,
            base_juice_rate: 10.0,
            cost_growth: 1.25,
        });

        // Outlets: juice growers, cost money to run. The first one needs no
        // juice so the pool can start from nothing.
        catalog.add(ActivityDef {
            id: "journal".into(),
            name: "Morning Pages".into(),
            kind: ActivityKind::Outlet,
            base_duration: 5.0,
            base_money_cost: 10,
            base_juice_cost: 0.0,
            base_money_rate: 0,
            base_juice_rate: 0.05,
            cost_growth: 1.12,
        });
        catalog.add(ActivityDef {
            id: "jam".into(),
            name: "Doodle Jams".into(),
            kind: ActivityKind::Outlet,
            base_duration: 15.0,
            base_money_cost: 60,
            base_juice_cost: 1.0,
            base_money_rate: 2,
            base_juice_rate: 0.6,
            cost_growth: 1.15,
        });
        catalog.add(ActivityDef {
            id: "openmic".into(),
            name: "Open Mic Night".into(),
            kind: ActivityKind::Outlet,
            base_duration: 60.0,
            base_money_cost: 400,
            base_juice_cost: 4.0,
            base_money_rate: 16,
            base_juice_rate: 3.0,
            cost_growth: 1.15,
        });
        catalog.add(ActivityDef {
            id: "retreat".into(),
            name: "Weekend Retreat".into(),
            kind: ActivityKind::Outlet,
            base_duration: 300.0,
            base_money_cost: 3_000,
            base_juice_cost: 20.0,
            base_money_rate: 128,
            base_juice_rate: 18.0,
            cost_growth: 1.18,
        });

        catalog
    }

    /// Add an activity to the catalog
    pub fn add(&mut self, def: ActivityDef) {
        debug_assert!(def.base_duration > 0.0, "activity duration must be positive");
        debug_assert!(def.cost_growth >= 1.0, "cost growth must not shrink");
        self.activities.push(def);
    }

    /// Look up an activity by id
    pub fn get(&self, id: &str) -> Option<&ActivityDef> {
        self.activities.iter().find(|a| a.id == id)
    }

    /// Look up the nth activity of a kind (menus address activities this way)
    pub fn by_target(&self, kind: ActivityKind, idx: usize) -> Option<&ActivityDef> {
        self.of_kind(kind).nth(idx)
    }

    /// All activities of a kind, in catalog order
    pub fn of_kind(&self, kind: ActivityKind) -> impl Iterator<Item = &ActivityDef> {
        self.activities.iter().filter(move |a| a.kind == kind)
    }

    /// All activities, jobs first
    pub fn all(&self) -> &[ActivityDef] {
        &self.activities
    }

    /// Load a catalog from a TOML file
    pub fn load_from_toml(path: &std::path::Path) -> Result<Self, CatalogLoadError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogLoadError::IoError(e.to_string()))?;
        Self::parse_toml(&content)
    }

    /// Parse a catalog from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, CatalogLoadError> {
        let toml_data: TomlActivities =
            toml::from_str(content).map_err(|e| CatalogLoadError::ParseError(e.to_string()))?;

        let mut catalog = Self::new();
        for activity in toml_data.activities {
            catalog.add(activity.into_def()?);
        }
        Ok(catalog)
    }
}

/// Error type for catalog loading
#[derive(Debug, Clone, Error)]
pub enum CatalogLoadError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("invalid activity kind: {0}")]
    InvalidKind(String),
    #[error("invalid duration for {0}: must be positive")]
    InvalidDuration(String),
}

/// TOML representation of the catalog file
#[derive(Debug, Deserialize)]
struct TomlActivities {
    activities: Vec<TomlActivity>,
}

/// TOML representation of a single activity
#[derive(Debug, Deserialize)]
struct TomlActivity {
    id: String,
    name: String,
    kind: String,
    base_duration: f64,
    #[serde(default)]
    base_money_cost: u64,
    #[serde(default)]
    base_juice_cost: f64,
    #[serde(default)]
    base_money_rate: u64,
    #[serde(default)]
    base_juice_rate: f64,
    #[serde(default = "default_cost_growth")]
    cost_growth: f64,
}

fn default_cost_growth() -> f64 {
    1.15
}

impl TomlActivity {
    fn into_def(self) -> Result<ActivityDef, CatalogLoadError> {
        let kind = match self.kind.to_lowercase().as_str() {
            "job" => ActivityKind::Job,
            "outlet" => ActivityKind::Outlet,
            _ => return Err(CatalogLoadError::InvalidKind(self.kind)),
        };

        if self.base_duration <= 0.0 {
            return Err(CatalogLoadError::InvalidDuration(self.id));
        }

        Ok(ActivityDef {
            id: self.id,
            name: self.name,
            kind,
            base_duration: self.base_duration,
            base_money_cost: self.base_money_cost,
            base_juice_cost: self.base_juice_cost,
            base_money_rate: self.base_money_rate,
            base_juice_rate: self.base_juice_rate,
            cost_growth: self.cost_growth.max(1.0),
        })
    }
}
