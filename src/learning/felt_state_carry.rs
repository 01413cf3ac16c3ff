//! Cross-turn SELF-distance carry (spec.md §4.8 "Aggregate influence is
//! informational, used by the *next* turn's initial felt-state... not
//! applied mid-turn to avoid feedback loops").
//!
//! Every classified nexus contributes a `self_distance_influence` this
//! turn; the mean across all of them is persisted per user and read back
//! as a bias on BOND's baseline self-distance at the start of the turn
//! after. Grounded on the same per-user EMA-keyed-store shape as
//! `EntityTracker`/`FamilyLearner`.

use serde::{Deserialize, Serialize};

use crate::nexus::Nexus;

/// The aggregate `self_distance_influence` carried forward into the next
/// turn's BOND baseline (spec.md §4.8).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FeltStateCarry {
    pub self_distance_bias: f64,
}

impl FeltStateCarry {
    /// Aggregate one turn's classified nexuses into the bias carried to
    /// the next turn: the mean `self_distance_influence` across all of
    /// them, zero when no nexus formed this turn.
    pub fn from_nexuses(nexuses: &[Nexus]) -> Self {
        if nexuses.is_empty() {
            return Self::default();
        }
        let sum: f64 = nexuses.iter().map(|n| n.self_distance_influence).sum();
        Self {
            self_distance_bias: sum / nexuses.len() as f64,
        }
    }
}
