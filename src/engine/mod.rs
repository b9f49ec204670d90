//! Simulation engine - command surface and tick
//!
//! The engine owns the one `GameState` and is the only thing that mutates
//! it. Hosts drive it with a periodic `update` plus synchronous commands in
//! between; every command is all-or-nothing and the invariant set holds
//! after each one. The whole engine is single-threaded by design: commands
//! take `&mut self` and run to completion, so a multithreaded host must
//! serialize access behind its own lock.

pub mod display;
pub mod state;

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::catalog::{ActivityDef, ActivityKind, Catalog};
use crate::core::config::EngineConfig;
use crate::core::error::{CoreError, Result, RulesViolation};
use crate::persist::{self, PersistError};

use state::GameState;

/// Things that happened during one `update` call, for host display
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    /// A run completed and credited production
    RunCompleted {
        id: String,
        money_earned: u64,
        juice_earned: f64,
        multiplier: f64,
    },
    /// An automated activity restarted itself after completing
    AutomationTriggered { id: String },
    /// An automated activity could not afford its next run
    AutomationStalled { id: String },
}

/// Result of a successful `click`
#[derive(Debug, Clone, PartialEq)]
pub struct ClickReceipt {
    pub name: String,
    pub money_spent: u64,
    pub juice_reserved: f64,
    pub duration: f64,
}

/// Result of a successful instance purchase
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseReceipt {
    pub name: String,
    pub price: u64,
    pub total_instances: u32,
    /// Whether the new instance could be set active right away. A false
    /// here is not an error: the instance exists but stays inactive until
    /// resources allow activating it.
    pub activated: bool,
}

/// Result of a successful automation purchase
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationReceipt {
    pub name: String,
    pub price_ideas: u64,
    pub level: u32,
}

/// Result of a successful prestige
#[derive(Debug, Clone, PartialEq)]
pub struct PrestigeReceipt {
    pub seeds_spent: f64,
    pub ideas_gained: u64,
    pub ideas_total: u64,
}

/// The simulation engine
#[derive(Debug)]
pub struct Engine {
    catalog: Catalog,
    config: EngineConfig,
    state: GameState,
    save_path: Option<PathBuf>,
}

impl Engine {
    /// A fresh game with no save path
    pub fn new(catalog: Catalog, config: EngineConfig) -> Self {
        let state = GameState::fresh(&catalog);
        Self {
            catalog,
            config,
            state,
            save_path: None,
        }
    }

    /// Restore the game at `path`, or start fresh when no save exists.
    ///
    /// On a successful load the real time the process was closed is fed
    /// through `update` once, so automated activities and the game clock
    /// advance as if the game had kept running. A corrupt or incompatible
    /// save is returned as an error for the caller to decide about; the
    /// file is never deleted or migrated here.
    pub fn load_or_new(
        path: &Path,
        catalog: Catalog,
        config: EngineConfig,
    ) -> std::result::Result<Self, PersistError> {
        match persist::load(path)? {
            Some((mut state, shutdown_time)) => {
                state.ensure_owned(&catalog);
                let offline_seconds =
                    ((Utc::now() - shutdown_time).num_milliseconds() as f64 / 1000.0).max(0.0);
                let mut engine = Self {
                    catalog,
                    config,
                    state,
                    save_path: Some(path.to_path_buf()),
                };
                let events = engine.update(offline_seconds);
                tracing::info!(
                    offline_seconds,
                    completions = events.len(),
                    "restored save with offline catch-up"
                );
                Ok(engine)
            }
            None => {
                tracing::info!("no save found; starting a fresh game");
                let mut engine = Self::new(catalog, config);
                engine.save_path = Some(path.to_path_buf());
                Ok(engine)
            }
        }
    }

    /// Persist to the configured save path; a no-op when none is set
    pub fn save(&self) -> std::result::Result<(), PersistError> {
        match &self.save_path {
            Some(path) => persist::save(path, &self.state),
            None => {
                tracing::debug!("no save path configured; skipping save");
                Ok(())
            }
        }
    }

    /// Persist to an explicit path
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), PersistError> {
        persist::save(path, &self.state)
    }

    pub fn set_save_path(&mut self, path: Option<PathBuf>) {
        self.save_path = path;
    }

    // === Command surface ===

    /// Start a run of the target activity.
    ///
    /// Money is spent permanently; the juice cost is held out of the free
    /// pool until the run completes.
    pub fn click(&mut self, kind: ActivityKind, idx: usize) -> Result<ClickReceipt> {
        let def = resolve(&self.catalog, kind, idx)?;
        let (money_spent, juice_reserved) = start_run(&mut self.state, def)?;
        tracing::debug!(activity = %def.id, money_spent, juice_reserved, "run started");
        debug_assert!(self.state.invariants_hold());
        Ok(ClickReceipt {
            name: def.name.clone(),
            money_spent,
            juice_reserved,
            duration: def.base_duration,
        })
    }

    /// Buy one more instance of the target activity.
    ///
    /// The price is the run cost evaluated at one more instance than
    /// currently owned. The new instance activates immediately when the
    /// larger active count is affordable right now; otherwise it is added
    /// inactive, which the receipt reports.
    pub fn buy_instance(&mut self, kind: ActivityKind, idx: usize) -> Result<PurchaseReceipt> {
        let def = resolve(&self.catalog, kind, idx)?;
        let state = &mut self.state;
        let rec = state.owned.entry(def.id.clone()).or_default();

        let price = def.money_cost(rec.total_instances + 1);
        if state.money < price {
            return Err(RulesViolation::InsufficientResources(format!(
                "the next instance of {} costs ${}",
                def.name, price
            ))
            .into());
        }
        state.money -= price;
        rec.total_instances += 1;

        let next_active = rec.active_instances + 1;
        let activated = state.money >= def.money_cost(next_active)
            && state.juice_free >= def.juice_cost(next_active);
        if activated {
            rec.active_instances = next_active;
        }

        let total_instances = rec.total_instances;
        tracing::debug!(activity = %def.id, price, total_instances, activated, "instance bought");
        debug_assert!(self.state.invariants_hold());
        Ok(PurchaseReceipt {
            name: def.name.clone(),
            price,
            total_instances,
            activated,
        })
    }

    /// Buy the next automation level for the target activity. Paid in
    /// ideas; does not switch automation on.
    pub fn buy_automation(&mut self, kind: ActivityKind, idx: usize) -> Result<AutomationReceipt> {
        let def = resolve(&self.catalog, kind, idx)?;
        let price = self.config.automation_price(
            self.state
                .owned
                .get(&def.id)
                .map(|rec| rec.automation_level)
                .unwrap_or(0),
        );
        let state = &mut self.state;
        if state.ideas < price {
            return Err(RulesViolation::InsufficientResources(format!(
                "the next automation for {} costs {}i",
                def.name, price
            ))
            .into());
        }
        state.ideas -= price;
        let rec = state.owned.entry(def.id.clone()).or_default();
        rec.automation_level += 1;

        let level = rec.automation_level;
        tracing::debug!(activity = %def.id, price, level, "automation bought");
        debug_assert!(self.state.invariants_hold());
        Ok(AutomationReceipt {
            name: def.name.clone(),
            price_ideas: price,
            level,
        })
    }

    /// Set more instances active. Fails when that many instances do not
    /// exist, or when the higher active cost is not currently affordable.
    pub fn activate(&mut self, kind: ActivityKind, idx: usize, amount: u32) -> Result<u32> {
        let def = resolve(&self.catalog, kind, idx)?;
        let state = &mut self.state;
        let rec = state.owned.entry(def.id.clone()).or_default();

        let new_active = rec
            .active_instances
            .checked_add(amount)
            .ok_or_else(|| RulesViolation::InvalidAmount("activation count overflow".into()))?;
        if new_active > rec.total_instances {
            return Err(RulesViolation::InvalidAmount(format!(
                "only {} instances of {} exist",
                rec.total_instances, def.name
            ))
            .into());
        }
        if state.money < def.money_cost(new_active) || state.juice_free < def.juice_cost(new_active)
        {
            return Err(RulesViolation::InsufficientResources(format!(
                "running {} instances of {} takes ${} and {:.4} juice",
                new_active,
                def.name,
                def.money_cost(new_active),
                def.juice_cost(new_active)
            ))
            .into());
        }

        rec.active_instances = new_active;
        debug_assert!(self.state.invariants_hold());
        Ok(new_active)
    }

    /// Set fewer instances active. Never releases the juice an in-flight
    /// run already holds; that comes back when the run completes.
    pub fn deactivate(&mut self, kind: ActivityKind, idx: usize, amount: u32) -> Result<u32> {
        let def = resolve(&self.catalog, kind, idx)?;
        let rec = self.state.owned.entry(def.id.clone()).or_default();

        if amount > rec.active_instances {
            return Err(RulesViolation::InvalidAmount(format!(
                "only {} instances of {} are active",
                rec.active_instances, def.name
            ))
            .into());
        }
        rec.active_instances -= amount;
        let remaining = rec.active_instances;
        debug_assert!(self.state.invariants_hold());
        Ok(remaining)
    }

    /// Switch automation on. Requires at least one automation level.
    pub fn enable_automation(&mut self, kind: ActivityKind, idx: usize) -> Result<()> {
        let def = resolve(&self.catalog, kind, idx)?;
        let rec = self.state.owned.entry(def.id.clone()).or_default();
        if rec.automation_level == 0 {
            return Err(RulesViolation::NoAutomationOwned(def.name.clone()).into());
        }
        rec.automated = true;
        Ok(())
    }

    /// Switch automation off. Always allowed.
    pub fn disable_automation(&mut self, kind: ActivityKind, idx: usize) -> Result<()> {
        let def = resolve(&self.catalog, kind, idx)?;
        let rec = self.state.owned.entry(def.id.clone()).or_default();
        rec.automated = false;
        Ok(())
    }

    pub fn get_active_count(&self, kind: ActivityKind, idx: usize) -> Result<u32> {
        let def = resolve(&self.catalog, kind, idx)?;
        Ok(self
            .state
            .owned
            .get(&def.id)
            .map(|rec| rec.active_instances)
            .unwrap_or(0))
    }

    pub fn get_automated(&self, kind: ActivityKind, idx: usize) -> Result<bool> {
        let def = resolve(&self.catalog, kind, idx)?;
        Ok(self
            .state
            .owned
            .get(&def.id)
            .map(|rec| rec.automated)
            .unwrap_or(false))
    }

    /// Debug override of the aggregate resources. Only non-negativity is
    /// checked. The juice override sets the pool total; the free amount is
    /// recomputed under whatever runs are currently holding juice.
    pub fn set_state(&mut self, money: u64, juice: f64, seeds: f64, ideas: u64) -> Result<()> {
        if juice < 0.0 {
            return Err(RulesViolation::InvalidAmount("juice must be >= 0".into()).into());
        }
        if seeds < 0.0 {
            return Err(RulesViolation::InvalidAmount("seeds must be >= 0".into()).into());
        }
        self.state.money = money;
        self.state.seeds = seeds;
        self.state.ideas = ideas;
        self.state.juice_total = juice;
        let reserved = self.state.outstanding_reservations();
        self.state.juice_free = (juice - reserved).max(0.0);
        tracing::debug!(money, juice, seeds, ideas, "debug state override applied");
        debug_assert!(self.state.invariants_hold());
        Ok(())
    }

    /// Meditate: convert every seed into ideas and reset progress.
    ///
    /// Money, juice, instances and in-flight runs are wiped; automation
    /// levels, the automation toggles, existing ideas and the game clock
    /// survive.
    pub fn prestige(&mut self) -> Result<PrestigeReceipt> {
        if self.state.seeds < 1.0 {
            return Err(RulesViolation::InsufficientSeeds(self.state.seeds).into());
        }

        let seeds_spent = self.state.seeds;
        let ideas_gained = self.config.ideas_from_seeds(seeds_spent);
        self.state.ideas = self.state.ideas.saturating_add(ideas_gained);
        self.state.seeds = 0.0;
        self.state.money = 0;
        self.state.juice_free = 0.0;
        self.state.juice_total = 0.0;
        for rec in self.state.owned.values_mut() {
            rec.reset_for_prestige();
        }

        let ideas_total = self.state.ideas;
        tracing::info!(seeds_spent, ideas_gained, ideas_total, "meditated");
        debug_assert!(self.state.invariants_hold());
        Ok(PrestigeReceipt {
            seeds_spent,
            ideas_gained,
            ideas_total,
        })
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// The game clock and seed accrual advance unconditionally; every
    /// running activity advances its progress and completes when it
    /// reaches its duration. Automated activities restart themselves
    /// within the same call, carrying completion overshoot into the next
    /// run, so one large `dt` completes the same runs as many small ones.
    pub fn update(&mut self, dt: f64) -> Vec<TickEvent> {
        let dt = dt.max(0.0);
        let mut events = Vec::new();

        self.state.elapsed_seconds += dt;
        self.state.seeds +=
            dt * self.config.seed_rate * (1.0 + self.state.juice_total * self.config.seed_juice_factor);

        for def in self.catalog.all() {
            advance_activity(&self.config, def, &mut self.state, dt, &mut events);
        }

        debug_assert!(self.state.invariants_hold());
        events
    }

    // === Pure reads ===

    pub fn money(&self) -> u64 {
        self.state.money
    }

    pub fn juice_free(&self) -> f64 {
        self.state.juice_free
    }

    pub fn juice_total(&self) -> f64 {
        self.state.juice_total
    }

    pub fn seeds(&self) -> f64 {
        self.state.seeds
    }

    pub fn ideas(&self) -> u64 {
        self.state.ideas
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.state.elapsed_seconds
    }

    /// Read-only view of the aggregate state
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

fn resolve(catalog: &Catalog, kind: ActivityKind, idx: usize) -> Result<&ActivityDef> {
    catalog
        .by_target(kind, idx)
        .ok_or_else(|| CoreError::NotFound(format!("{} {}", kind, idx)))
}

/// Shared click semantics: validate, spend money, hold juice, mark running.
/// Used by the click command and by automated restarts during the tick.
fn start_run(
    state: &mut GameState,
    def: &ActivityDef,
) -> std::result::Result<(u64, f64), RulesViolation> {
    let rec = state.owned.entry(def.id.clone()).or_default();
    if rec.running {
        return Err(RulesViolation::AlreadyRunning(def.name.clone()));
    }

    let money_cost = def.money_cost(rec.active_instances);
    let juice_cost = def.juice_cost(rec.active_instances);
    if state.money < money_cost || state.juice_free < juice_cost {
        return Err(RulesViolation::InsufficientResources(format!(
            "running {} takes ${} and {:.4} juice",
            def.name, money_cost, juice_cost
        )));
    }

    state.money -= money_cost;
    state.juice_free -= juice_cost;
    rec.begin_run(juice_cost);
    Ok((money_cost, juice_cost))
}

/// Advance one activity's run, completing as many times as `dt` covers.
/// An idle automated activity with active instances starts itself here, so
/// automation needs no seed click after a prestige or a restored save.
fn advance_activity(
    config: &EngineConfig,
    def: &ActivityDef,
    state: &mut GameState,
    dt: f64,
    events: &mut Vec<TickEvent>,
) {
    let (running, automated, active) = {
        let Some(rec) = state.owned.get_mut(&def.id) else {
            return;
        };
        if rec.running {
            rec.progress += dt;
        }
        (rec.running, rec.automated, rec.active_instances)
    };
    if !running {
        if automated && active > 0 {
            match start_run(state, def) {
                Ok(_) => events.push(TickEvent::AutomationTriggered { id: def.id.clone() }),
                Err(violation) => {
                    tracing::debug!(activity = %def.id, %violation, "automation cannot start")
                }
            }
        }
        return;
    }

    loop {
        let Some(rec) = state.owned.get_mut(&def.id) else {
            return;
        };
        if !rec.running || rec.progress < def.base_duration {
            break;
        }

        let overshoot = rec.progress - def.base_duration;
        let automated = rec.automated;
        let released = rec.finish_run();
        // production is credited at the active count in effect now, not at
        // click time, and boosted from the second automation level onward
        let multiplier = config.automation_multiplier(rec.automation_level);
        let money_earned = (def.money_rate(rec.active_instances) as f64 * multiplier).round() as u64;
        let juice_earned = def.juice_rate(rec.active_instances) * multiplier;

        state.money = state.money.saturating_add(money_earned);
        state.juice_total += juice_earned;
        // the clamp only bites after a debug override shrank the pool under
        // an outstanding reservation
        state.juice_free = (state.juice_free + released + juice_earned).min(state.juice_total);

        events.push(TickEvent::RunCompleted {
            id: def.id.clone(),
            money_earned,
            juice_earned,
            multiplier,
        });

        if !automated {
            break;
        }
        match start_run(state, def) {
            Ok(_) => {
                if let Some(rec) = state.owned.get_mut(&def.id) {
                    rec.progress = overshoot;
                }
                events.push(TickEvent::AutomationTriggered { id: def.id.clone() });
            }
            Err(violation) => {
                tracing::debug!(activity = %def.id, %violation, "automation stalled");
                events.push(TickEvent::AutomationStalled { id: def.id.clone() });
                break;
            }
        }
    }
}
