//! Epoch Orchestrator + Trackers (C13, spec.md §4.13).
//!
//! A regime state machine (EXPLORING -> CONVERGING -> STABLE ->
//! COMMITTED) that governs, per epoch, the Hebbian/V0 learning rates
//! and the iteration budget used elsewhere in the turn pipeline, plus
//! six durable EMA trackers fed per-turn observations. Grounded on
//! `agent/heartbeat.rs`'s periodic-runner-with-config shape for the
//! regime loop and `estimation/learner.rs`'s EMA-update pattern for the
//! trackers.

pub mod trackers;

use serde::{Deserialize, Serialize};

use crate::config::EpochConfig;

pub use trackers::{
    CycleConvergenceTracker, GateCascadeTracker, NeighborWordTracker, NexusFallbackTracker,
    OrganConfidenceTracker, UrgencyBucket, WordOccasionTracker,
};

/// A regime in the exploration-to-commitment progression (spec.md
/// §4.13).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Exploring,
    Converging,
    Stable,
    Committed,
}

/// Fixed parameters for one regime (spec.md §4.13 table).
#[derive(Debug, Clone, Copy)]
pub struct RegimeParams {
    pub tau: f64,
    pub exploration_entropy: f64,
    pub min_iterations: u32,
    pub max_iterations: u32,
    pub hebbian_rate: f64,
    pub v0_rate: f64,
}

impl Regime {
    pub fn params(self) -> RegimeParams {
        match self {
            Regime::Exploring => RegimeParams {
                tau: 0.30,
                exploration_entropy: 0.30,
                min_iterations: 2,
                max_iterations: 3,
                hebbian_rate: 0.08,
                v0_rate: 0.15,
            },
            Regime::Converging => RegimeParams {
                tau: 0.50,
                exploration_entropy: 0.15,
                min_iterations: 3,
                max_iterations: 4,
                hebbian_rate: 0.05,
                v0_rate: 0.10,
            },
            Regime::Stable => RegimeParams {
                tau: 0.65,
                exploration_entropy: 0.05,
                min_iterations: 4,
                max_iterations: 5,
                hebbian_rate: 0.03,
                v0_rate: 0.08,
            },
            Regime::Committed => RegimeParams {
                tau: 0.75,
                exploration_entropy: 0.00,
                min_iterations: 5,
                max_iterations: 5,
                hebbian_rate: 0.02,
                v0_rate: 0.05,
            },
        }
    }

    fn promote(self) -> Self {
        match self {
            Regime::Exploring => Regime::Converging,
            Regime::Converging => Regime::Stable,
            Regime::Stable => Regime::Committed,
            Regime::Committed => Regime::Committed,
        }
    }

    fn demote(self) -> Self {
        match self {
            Regime::Exploring => Regime::Exploring,
            Regime::Converging => Regime::Exploring,
            Regime::Stable => Regime::Converging,
            Regime::Committed => Regime::Stable,
        }
    }
}

/// One closed epoch's aggregate outcome, used to decide the next
/// regime transition (spec.md §4.13 "per-epoch: R6 = mean R5").
#[derive(Debug, Clone, Copy)]
pub struct EpochSummary {
    pub turns: u32,
    pub successes: u32,
}

impl EpochSummary {
    fn success_rate(self) -> f64 {
        if self.turns == 0 {
            0.0
        } else {
            self.successes as f64 / self.turns as f64
        }
    }
}

/// The regime state machine plus its six trackers, persisted as one
/// unit (spec.md §4.13, §6 persisted state layout).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochOrchestrator {
    regime: Regime,
    /// Adaptive tau offset, reset on promotion/demotion, accumulated
    /// by repeated low-success epochs (spec.md §4.13 "adaptive tau
    /// drops by 0.10 if success rate < 0.50 for an epoch").
    tau_drop: f64,
    consecutive_promotion_epochs: u32,
    current_epoch_turns: u32,
    current_epoch_successes: u32,
    /// R7: global EMA of R5 across all turns ever seen.
    global_reward_ema: f64,

    pub word_occasions: WordOccasionTracker,
    pub cycle_convergence: CycleConvergenceTracker,
    pub gate_cascade: GateCascadeTracker,
    pub nexus_fallback: NexusFallbackTracker,
    pub neighbor_words: NeighborWordTracker,
    pub organ_confidence: OrganConfidenceTracker,
}

impl EpochOrchestrator {
    pub fn new() -> Self {
        Self {
            regime: Regime::Exploring,
            tau_drop: 0.0,
            consecutive_promotion_epochs: 0,
            current_epoch_turns: 0,
            current_epoch_successes: 0,
            global_reward_ema: 0.5,
            word_occasions: WordOccasionTracker::new(0.2),
            cycle_convergence: CycleConvergenceTracker::default(),
            gate_cascade: GateCascadeTracker::default(),
            nexus_fallback: NexusFallbackTracker::new(0.1),
            neighbor_words: NeighborWordTracker::new(0.2),
            organ_confidence: OrganConfidenceTracker::new(0.1),
        }
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    /// Effective tau for the current regime, after the adaptive drop
    /// (spec.md §4.13).
    pub fn effective_tau(&self) -> f64 {
        (self.regime.params().tau - self.tau_drop).max(0.0)
    }

    pub fn params(&self) -> RegimeParams {
        self.regime.params()
    }

    /// R5: per-turn task-level reward, `satisfaction >= effective tau`
    /// (spec.md §4.13).
    pub fn task_reward(&self, satisfaction: f64) -> bool {
        satisfaction >= self.effective_tau()
    }

    /// Record one turn's outcome against the current epoch and update
    /// R7 (the global reward EMA), per spec.md §4.13's R5/R7 definitions.
    pub fn record_turn(&mut self, satisfaction: f64, config: &EpochConfig) {
        let success = self.task_reward(satisfaction);
        self.current_epoch_turns += 1;
        if success {
            self.current_epoch_successes += 1;
        }
        let r5 = if success { 1.0 } else { 0.0 };
        self.global_reward_ema =
            (1.0 - config.success_rate_alpha) * self.global_reward_ema + config.success_rate_alpha * r5;
    }

    pub fn global_reward(&self) -> f64 {
        self.global_reward_ema
    }

    /// Close the current epoch: compute R6 (mean R5 this epoch), apply
    /// the adaptive tau drop, and run the promotion/demotion transition
    /// rule (spec.md §4.13). Returns the closed epoch's summary.
    pub fn close_epoch(&mut self, config: &EpochConfig) -> EpochSummary {
        let summary = EpochSummary {
            turns: self.current_epoch_turns,
            successes: self.current_epoch_successes,
        };
        let r6 = summary.success_rate();
        let params = self.regime.params();

        if r6 < 0.50 {
            self.tau_drop += config.adaptive_tau_drop;
        }

        if r6 >= params.tau {
            self.consecutive_promotion_epochs += 1;
            if self.consecutive_promotion_epochs >= config.promotion_epochs {
                self.regime = self.regime.promote();
                self.consecutive_promotion_epochs = 0;
                self.tau_drop = 0.0;
            }
        } else {
            self.consecutive_promotion_epochs = 0;
            let regression_floor = (params.tau - config.regression_margin).max(0.0);
            if r6 < regression_floor {
                self.regime = self.regime.demote();
                self.tau_drop = 0.0;
            }
        }

        self.current_epoch_turns = 0;
        self.current_epoch_successes = 0;
        summary
    }

    /// Close the current epoch once it reaches `config.epoch_length`
    /// turns. Called after every `record_turn` so the regime state
    /// machine advances on its own rather than needing an external
    /// scheduler (spec.md §4.13's transition rule has no caller besides
    /// this orchestrator in the turn pipeline).
    pub fn maybe_close_epoch(&mut self, config: &EpochConfig) -> Option<EpochSummary> {
        if self.current_epoch_turns >= config.epoch_length {
            Some(self.close_epoch(config))
        } else {
            None
        }
    }
}

impl Default for EpochOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
