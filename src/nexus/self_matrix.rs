//! SELF-Matrix Governor (C8, spec.md §4.8).
//!
//! `Zone` is a pure, monotone step function of `BOND.self_distance`
//! (spec.md §3 invariant, §8 property 5). Stance/safety/influence are
//! deterministic lookups keyed by `(NexusCategory, NexusType)` and the
//! zone, computed after classification assigns a nexus's type.

use serde::{Deserialize, Serialize};

use super::{ModulationDirection, NexusCategory, NexusType, SafetyLevel, TherapeuticStance};

/// SELF-distance zones (spec.md §3/§4.8), fixed thresholds 0.15, 0.25,
/// 0.35, 0.60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// [0.00, 0.15] Core SELF.
    Z1CoreSelf,
    /// [0.15, 0.25) Inner Relational.
    Z2InnerRelational,
    /// [0.25, 0.35) Symbolic Threshold.
    Z3SymbolicThreshold,
    /// [0.35, 0.60) Shadow/Compost.
    Z4ShadowCompost,
    /// [0.60, 1.00] Exile/Collapse.
    Z5ExileCollapse,
}

impl Zone {
    pub fn from_self_distance(self_distance: f64) -> Self {
        if self_distance < 0.15 {
            Zone::Z1CoreSelf
        } else if self_distance < 0.25 {
            Zone::Z2InnerRelational
        } else if self_distance < 0.35 {
            Zone::Z3SymbolicThreshold
        } else if self_distance < 0.60 {
            Zone::Z4ShadowCompost
        } else {
            Zone::Z5ExileCollapse
        }
    }

    /// Ordinal position, for the transformation signature's zone
    /// before/after/movement dimensions (0..=4, normalized by dividing by
    /// 4.0 at the call site).
    pub fn ordinal(self) -> u8 {
        match self {
            Zone::Z1CoreSelf => 0,
            Zone::Z2InnerRelational => 1,
            Zone::Z3SymbolicThreshold => 2,
            Zone::Z4ShadowCompost => 3,
            Zone::Z5ExileCollapse => 4,
        }
    }
}

/// The per-nexus output of the SELF-Matrix governor.
#[derive(Debug, Clone, Copy)]
pub struct SelfMatrixOutput {
    pub zone: Zone,
    pub therapeutic_stance: TherapeuticStance,
    pub safety_level: SafetyLevel,
    pub self_distance_influence: f64,
    pub modulation_direction: ModulationDirection,
}

/// Therapeutic stance per `(category, type)` (spec.md §4.8, "Therapeutic
/// stance per (category, type) mapping in §4.7 output").
fn stance_for(nexus_type: NexusType) -> TherapeuticStance {
    use NexusType::*;
    match nexus_type {
        PreExisting | Innate => TherapeuticStance::Witness,
        Relational | Contrast => TherapeuticStance::Attune,
        Protective | Isolated => TherapeuticStance::Hold,
        Fragmented => TherapeuticStance::Hold,
        Absorbed => TherapeuticStance::Validate,
        Paradox => TherapeuticStance::Validate,
        Disruptive | Urgency => TherapeuticStance::Ground,
        Recursive | Looped => TherapeuticStance::Ground,
        Dissociative => TherapeuticStance::Minimal,
    }
}

/// Safety level: `safe` in Z1-Z2 with a Constitutional type, `edge` for
/// Z3-Z4 or moderate crisis, `breach` for Z5 or Dissociative/Urgency
/// (spec.md §4.8).
fn safety_for(zone: Zone, category: NexusCategory, nexus_type: NexusType) -> SafetyLevel {
    if matches!(nexus_type, NexusType::Dissociative | NexusType::Urgency) || zone == Zone::Z5ExileCollapse
    {
        return SafetyLevel::Breach;
    }
    match (zone, category) {
        (Zone::Z1CoreSelf | Zone::Z2InnerRelational, NexusCategory::Constitutional) => SafetyLevel::Safe,
        (Zone::Z1CoreSelf | Zone::Z2InnerRelational, NexusCategory::CrisisOriented) => SafetyLevel::Edge,
        (Zone::Z3SymbolicThreshold | Zone::Z4ShadowCompost, _) => SafetyLevel::Edge,
        _ => SafetyLevel::Edge,
    }
}

/// Whether this constitutional type reads as "healthy" (pulls toward
/// SELF) vs "protective" (pulls slightly away, spec.md §4.8).
fn is_healthy_constitutional(nexus_type: NexusType) -> bool {
    matches!(
        nexus_type,
        NexusType::PreExisting | NexusType::Innate | NexusType::Relational
    )
}

/// Whether a crisis type is "severe" (escalating) vs "stuck" (looping
/// without escalation, spec.md §4.8: contributes zero influence).
fn is_severe_crisis(nexus_type: NexusType) -> bool {
    matches!(nexus_type, NexusType::Dissociative | NexusType::Urgency | NexusType::Disruptive)
}

/// `self_distance_influence` and its direction (spec.md §4.8):
/// Constitutional healthy -> `-0.05*S`; Constitutional protective ->
/// `+0.02*(1-S)`; Crisis severe -> `+0.10*(1-S)`; Crisis stuck -> `0`.
fn influence_for(category: NexusCategory, nexus_type: NexusType, satisfaction: f64) -> (f64, ModulationDirection) {
    match category {
        NexusCategory::Constitutional if is_healthy_constitutional(nexus_type) => {
            (-0.05 * satisfaction, ModulationDirection::TowardSelf)
        }
        NexusCategory::Constitutional => (0.02 * (1.0 - satisfaction), ModulationDirection::AwaySelf),
        NexusCategory::CrisisOriented if is_severe_crisis(nexus_type) => {
            (0.10 * (1.0 - satisfaction), ModulationDirection::AwaySelf)
        }
        NexusCategory::CrisisOriented => (0.0, ModulationDirection::Neutral),
    }
}

/// Compute the full SELF-Matrix output for one classified nexus.
pub fn govern(self_distance: f64, nexus_type: NexusType, satisfaction: f64) -> SelfMatrixOutput {
    let zone = Zone::from_self_distance(self_distance);
    let category = nexus_type.category();
    let (self_distance_influence, modulation_direction) = influence_for(category, nexus_type, satisfaction);
    SelfMatrixOutput {
        zone,
        therapeutic_stance: stance_for(nexus_type),
        safety_level: safety_for(zone, category, nexus_type),
        self_distance_influence: self_distance_influence.clamp(-0.05, 0.10),
        modulation_direction,
    }
}
