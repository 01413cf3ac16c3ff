//! Nexus Intersection Composer (C6), Nexus Type Classifier (C7), and
//! SELF-Matrix Governor (C8) — spec.md §4.6-§4.8.
//!
//! Deterministic, pure functions over one cycle's semantic fields and the
//! current R-matrix snapshot (read-only mid-turn, spec.md §5). Grounded on
//! `agent::router`'s match-based decision-tree style for the classifier.

mod classifier;
mod composer;
mod self_matrix;

pub use classifier::{classify, OrganInsights};
pub use composer::compose_nexuses;
pub use self_matrix::{SelfMatrixOutput, Zone};

use serde::{Deserialize, Serialize};

use crate::organs::OrganKind;

/// The closed set of 14 nexus types (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NexusType {
    // Constitutional
    PreExisting,
    Innate,
    Contrast,
    Relational,
    Fragmented,
    Protective,
    Absorbed,
    Isolated,
    // Crisis-oriented
    Paradox,
    Dissociative,
    Disruptive,
    Recursive,
    Looped,
    Urgency,
}

impl NexusType {
    pub fn category(self) -> NexusCategory {
        use NexusType::*;
        match self {
            PreExisting | Innate | Contrast | Relational | Fragmented | Protective | Absorbed
            | Isolated => NexusCategory::Constitutional,
            Paradox | Dissociative | Disruptive | Recursive | Looped | Urgency => {
                NexusCategory::CrisisOriented
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NexusCategory {
    Constitutional,
    CrisisOriented,
}

/// Ordered least to most intrusive (spec.md §4.6 safety tie-break: "witness
/// < attune < hold < validate < ground < minimal").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TherapeuticStance {
    Witness,
    Attune,
    Hold,
    Validate,
    Ground,
    Minimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    Safe,
    Edge,
    Breach,
}

/// Which direction a nexus nudges the *next* turn's initial self-distance
/// baseline (spec.md §4.8; aggregate influence is informational, applied
/// only to the next turn, never mid-turn).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModulationDirection {
    TowardSelf,
    AwaySelf,
    Neutral,
}

/// One intersection point where >= 2 organs agree on an atom (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nexus {
    pub atom: String,
    pub participants: Vec<OrganKind>,
    pub activations: Vec<(OrganKind, f64)>,
    pub intersection_strength: f64,
    pub agreement: f64,
    pub field_strength: f64,
    pub r_matrix_weight: f64,
    pub emission_readiness: f64,
    pub nexus_type: NexusType,
    pub nexus_category: NexusCategory,
    pub self_distance_influence: f64,
    pub modulation_direction: ModulationDirection,
    pub therapeutic_stance: TherapeuticStance,
    pub safety_level: SafetyLevel,
    pub classification_confidence: f64,
    /// `true` when this nexus was admitted via the co-activation fallback
    /// rather than the intersection-strength bar (spec.md §4.6 step 5).
    pub co_activation: bool,
}
