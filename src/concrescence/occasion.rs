//! Per-cycle snapshot types (spec.md §3 "Occasion").

use serde::{Deserialize, Serialize};

use crate::field::SemanticField;
use crate::organs::OrganResult;

/// Why the concrescence loop stopped descending (spec.md §4.5 step f).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceReason {
    Kairos,
    EnergyStable,
    Crystallization,
    MaxCycles,
}

/// Lure direction, intensity and ethical/safety posture for one occasion
/// (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectiveAim {
    /// The atom name with the strongest activation this cycle, across all
    /// organs; `None` if nothing activated.
    pub lure_direction: Option<String>,
    pub intensity: f64,
    pub coherence_target: f64,
    pub satisfaction_goal: f64,
    pub ethical_weight: f64,
    pub safety_constrained: bool,
}

/// A single V0 cycle's full snapshot (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Occasion {
    pub cycle: u32,
    pub organ_results: Vec<OrganResult>,
    pub fields: Vec<SemanticField>,
    pub v0: f64,
    pub field_coherence: f64,
    pub morphogenetic_pressure: f64,
    pub satisfaction: f64,
    pub kairos_detected: bool,
    pub subjective_aim: SubjectiveAim,
}

/// The full trajectory of one turn's concrescence loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcrescenceResult {
    pub occasions: Vec<Occasion>,
    pub convergence_reason: ConvergenceReason,
    pub kairos_cycle: Option<u32>,
}

impl ConcrescenceResult {
    pub fn final_occasion(&self) -> &Occasion {
        self.occasions.last().expect("at least one cycle always runs")
    }

    pub fn v0_trajectory(&self) -> Vec<f64> {
        self.occasions.iter().map(|o| o.v0).collect()
    }

    pub fn cycles_used(&self) -> u32 {
        self.occasions.len() as u32
    }
}
