//! Plain-text views of the game
//!
//! The engine owns no rendering; it hands hosts finished strings (the
//! status line, activity cards, store listings) and `Display` texts for
//! command receipts, and they show them however they like.

use std::fmt;

use crate::activity::OwnedActivity;
use crate::catalog::ActivityDef;
use crate::core::config::EngineConfig;

use super::{
    AutomationReceipt, ClickReceipt, Engine, PrestigeReceipt, PurchaseReceipt, TickEvent,
};

const BAR_WIDTH: usize = 12;

impl Engine {
    /// One-line summary: money, juice, seeds and ideas, game time
    pub fn status_line(&self) -> String {
        format!(
            "${} | {:.2}/{:.2} juice | {:.4} seeds, {} ideas | {}",
            self.state.money,
            self.state.juice_free,
            self.state.juice_total,
            self.state.seeds,
            self.state.ideas,
            fmt_duration(self.state.elapsed_seconds),
        )
    }

    /// The main play view: status line plus one card per owned activity
    pub fn status(&self) -> String {
        let mut out = self.status_line();
        out.push('\n');

        let mut any = false;
        for def in self.catalog.all() {
            let Some(rec) = self.state.owned.get(&def.id) else {
                continue;
            };
            if rec.total_instances == 0 && !rec.running {
                continue;
            }
            any = true;
            out.push('\n');
            out.push_str(&activity_card(def, rec, &self.config));
        }
        if !any {
            out.push_str("\nNo activities owned yet; the store has more.");
        }
        out
    }

    /// The store view: instance prices and automation prices for every
    /// catalog entry
    pub fn show_store(&self) -> String {
        let mut out = String::from("== Instances ==\n");
        for def in self.catalog.all() {
            let owned = self
                .state
                .owned
                .get(&def.id)
                .map(|rec| rec.total_instances)
                .unwrap_or(0);
            let price = def.money_cost(owned + 1);
            out.push_str(&format!(
                "${:<10} {} ({})  {}  run -${} -{:.2}J  yield +${} +{:.2}J\n",
                price,
                def.name,
                def.kind,
                fmt_duration(def.base_duration),
                def.money_cost(1),
                def.juice_cost(1),
                def.money_rate(1),
                def.juice_rate(1),
            ));
        }

        out.push_str("\n== Automations ==\n");
        for def in self.catalog.all() {
            let level = self
                .state
                .owned
                .get(&def.id)
                .map(|rec| rec.automation_level)
                .unwrap_or(0);
            let price = self.config.automation_price(level);
            out.push_str(&format!(
                "{:<10} {}  (level {}, x{:.1})\n",
                format!("{}i", price),
                def.name,
                level,
                self.config.automation_multiplier(level),
            ));
        }
        out
    }
}

fn activity_card(def: &ActivityDef, rec: &OwnedActivity, config: &EngineConfig) -> String {
    let active = rec.active_instances;
    let mut card = format!(
        "{} ({})  x{}:{}  next ${}\n",
        def.name,
        def.kind,
        active,
        rec.inactive_instances(),
        def.money_cost(rec.total_instances + 1),
    );
    card.push_str(&format!(
        "  run -${} -{:.4}J | yield +${} +{:.4}J | {}\n",
        def.money_cost(active),
        def.juice_cost(active),
        def.money_rate(active),
        def.juice_rate(active),
        fmt_duration(def.base_duration),
    ));

    if rec.running {
        let remaining = (def.base_duration - rec.progress).max(0.0);
        card.push_str(&format!(
            "  [{}] {} left",
            progress_bar(rec.progress, def.base_duration),
            fmt_duration(remaining),
        ));
    } else {
        card.push_str("  idle");
    }

    if rec.automation_level > 0 {
        card.push_str(&format!(
            " | auto x{:.1} {}",
            config.automation_multiplier(rec.automation_level),
            if rec.automated { "on" } else { "off" },
        ));
    } else {
        card.push_str(" | no auto");
    }
    card.push('\n');
    card
}

fn progress_bar(progress: f64, duration: f64) -> String {
    let frac = if duration > 0.0 {
        (progress / duration).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let filled = (frac * BAR_WIDTH as f64).floor() as usize;
    let mut bar = "=".repeat(filled.min(BAR_WIDTH));
    bar.push_str(&".".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)));
    bar
}

fn fmt_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}h{:02}m{:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m{:02}s", m, s)
    } else if total == 0 && seconds > 0.0 {
        format!("{:.1}s", seconds)
    } else {
        format!("{}s", s)
    }
}

impl fmt::Display for ClickReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Started {}: spent ${}, holding {:.4} juice; done in {}.",
            self.name,
            self.money_spent,
            self.juice_reserved,
            fmt_duration(self.duration),
        )
    }
}

impl fmt::Display for PurchaseReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bought instance #{} of {} for ${}",
            self.total_instances, self.name, self.price,
        )?;
        if self.activated {
            write!(f, "; it is now active.")
        } else {
            write!(f, "; resources are short, so it was added inactive.")
        }
    }
}

impl fmt::Display for AutomationReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bought automation level {} for {} ({}i).",
            self.level, self.name, self.price_ideas,
        )
    }
}

impl fmt::Display for PrestigeReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Meditated: {:.4} seeds sprouted into {} ideas ({} total). Everything else starts over.",
            self.seeds_spent, self.ideas_gained, self.ideas_total,
        )
    }
}

impl fmt::Display for TickEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickEvent::RunCompleted {
                id,
                money_earned,
                juice_earned,
                multiplier,
            } => write!(
                f,
                "{} finished: +${} +{:.4}J (x{:.1})",
                id, money_earned, juice_earned, multiplier,
            ),
            TickEvent::AutomationTriggered { id } => write!(f, "{} restarted automatically", id),
            TickEvent::AutomationStalled { id } => {
                write!(f, "{} is automated but cannot afford its next run", id)
            }
        }
    }
}
