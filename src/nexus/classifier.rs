//! Nexus Type Classifier (C7, spec.md §4.7).
//!
//! A deterministic two-level decision tree: level 1 picks
//! Constitutional/Crisis-Oriented from NDAM/EO/BOND readings, level 2
//! picks one of the 14 types from a fixed discriminator table. No
//! learning; re-classifying the same organ insights is a pure function
//! (spec.md §8 property 8).

use crate::organs::{DominantPart, OrganDetail, OrganKind, OrganResult, PolyvagalState, TemporalState};

use super::self_matrix::govern;
use super::{Nexus, NexusType};

/// The subset of organ readings the classifier needs, gathered once per
/// cycle from the final-cycle `OrganResult`s rather than threaded through
/// every nexus individually.
#[derive(Debug, Clone, Copy)]
pub struct OrganInsights {
    pub self_distance: f64,
    pub dominant_part: DominantPart,
    pub polyvagal_state: PolyvagalState,
    pub urgency_level: f64,
    pub temporal_state: TemporalState,
    pub coherence_repair_needed: f64,
}

impl OrganInsights {
    /// Extract insights from one cycle's organ results. Missing/dormant
    /// organs fall back to maximally-benign defaults (mid relational
    /// self-distance, ventral, zero urgency, normal time, no repair
    /// needed) so classification degrades gracefully rather than panics.
    pub fn from_results(results: &[OrganResult]) -> Self {
        let mut insights = OrganInsights {
            self_distance: 0.20,
            dominant_part: DominantPart::SelfLed,
            polyvagal_state: PolyvagalState::Ventral,
            urgency_level: 0.0,
            temporal_state: TemporalState::Normal,
            coherence_repair_needed: 0.0,
        };
        for r in results {
            match &r.detail {
                OrganDetail::Bond { self_distance, dominant_part } => {
                    insights.self_distance = *self_distance;
                    insights.dominant_part = *dominant_part;
                }
                OrganDetail::Eo { polyvagal_state } => insights.polyvagal_state = *polyvagal_state,
                OrganDetail::Ndam { urgency_level } => insights.urgency_level = *urgency_level,
                OrganDetail::Rnx { temporal_state } => insights.temporal_state = *temporal_state,
                OrganDetail::Sans { coherence_repair_needed } => {
                    insights.coherence_repair_needed = *coherence_repair_needed
                }
                OrganDetail::Card { .. } | OrganDetail::None => {}
            }
        }
        insights
    }
}

fn is_crisis(insights: &OrganInsights) -> bool {
    insights.urgency_level >= 0.7
        || (insights.polyvagal_state == PolyvagalState::Dorsal && insights.dominant_part == DominantPart::Exile)
        || (insights.dominant_part == DominantPart::Exile && insights.urgency_level >= 0.5)
}

fn classify_crisis_type(insights: &OrganInsights, participants: &[OrganKind]) -> NexusType {
    if insights.polyvagal_state == PolyvagalState::Dorsal {
        return NexusType::Dissociative;
    }
    if insights.urgency_level >= 0.85 {
        return NexusType::Urgency;
    }
    if insights.temporal_state == TemporalState::Suspended {
        return NexusType::Recursive;
    }
    if matches!(insights.temporal_state, TemporalState::Looped | TemporalState::Repeating) {
        return NexusType::Looped;
    }
    if insights.dominant_part == DominantPart::Firefighter && insights.urgency_level > 0.6 {
        return NexusType::Disruptive;
    }
    if insights.urgency_level > 0.7 && insights.self_distance > 0.3 && insights.self_distance < 0.5 {
        return NexusType::Paradox;
    }
    // Fallback within crisis category: the highest-urgency generic type.
    let _ = participants;
    NexusType::Urgency
}

fn classify_constitutional_type(insights: &OrganInsights, participants: &[OrganKind]) -> NexusType {
    let d = insights.self_distance;
    let has_wisdom_or_authenticity =
        participants.contains(&OrganKind::Wisdom) || participants.contains(&OrganKind::Authenticity);

    if d < 0.15 {
        return if has_wisdom_or_authenticity {
            NexusType::Innate
        } else {
            NexusType::PreExisting
        };
    }
    if d < 0.25 {
        return NexusType::Relational;
    }
    if d < 0.35 {
        return NexusType::Contrast;
    }
    if d < 0.60 {
        if insights.dominant_part == DominantPart::Firefighter {
            return NexusType::Protective;
        }
        if insights.coherence_repair_needed > 0.7 {
            return NexusType::Fragmented;
        }
        // Isolated doesn't require a part-activation signal (unlike
        // Protective/Fragmented above), so it is this band's default
        // regardless of whether SANS participates in the nexus.
        return NexusType::Isolated;
    }
    NexusType::Absorbed
}

/// Classify every nexus in place, filling in `nexus_type`, `nexus_category`,
/// `therapeutic_stance`, `safety_level`, `self_distance_influence`,
/// `modulation_direction` and `classification_confidence` from the shared
/// `OrganInsights` and the turn's running satisfaction estimate.
pub fn classify(nexuses: &mut [Nexus], insights: &OrganInsights, satisfaction: f64) {
    let category_is_crisis = is_crisis(insights);
    for nexus in nexuses.iter_mut() {
        let nexus_type = if category_is_crisis {
            classify_crisis_type(insights, &nexus.participants)
        } else {
            classify_constitutional_type(insights, &nexus.participants)
        };
        let output = govern(insights.self_distance, nexus_type, satisfaction);
        nexus.nexus_type = nexus_type;
        nexus.nexus_category = nexus_type.category();
        nexus.therapeutic_stance = output.therapeutic_stance;
        nexus.safety_level = output.safety_level;
        nexus.self_distance_influence = output.self_distance_influence;
        nexus.modulation_direction = output.modulation_direction;
        // Confidence: how decisively the discriminating signal cleared
        // its threshold band, scaled by this nexus's own agreement.
        let discriminator_margin = if category_is_crisis {
            insights.urgency_level
        } else {
            1.0 - insights.self_distance
        };
        nexus.classification_confidence = (0.5 + 0.5 * discriminator_margin).clamp(0.0, 1.0) * nexus.agreement;
    }
}
