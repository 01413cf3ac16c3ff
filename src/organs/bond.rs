//! BOND: attachment quality and IFS-style part activation (spec.md §3,
//! §4.8 SELF-Matrix zone). `self_distance` is read as a pure signal by the
//! SELF-Matrix regardless of this organ's own coherence (spec.md §4.8
//! invariant I-ORD): a turn can be BOND-dormant yet still carry a
//! meaningful `self_distance` baseline.

use crate::error::OrganError;

use super::lure::{self, AtomPattern};
use super::{DominantPart, Organ, OrganDetail, OrganInput, OrganKind, OrganResult};

const PATTERNS: &[AtomPattern] = &[
    AtomPattern {
        atom: "trust",
        keywords: &["i trust you", "i feel safe talking to you", "this feels secure"],
    },
    AtomPattern {
        atom: "attachment_rupture",
        keywords: &["you abandoned", "i feel rejected", "betrayed", "you left"],
    },
    AtomPattern {
        atom: "repair",
        keywords: &["let's work this out", "i want to reconnect", "can we fix this"],
    },
    AtomPattern {
        atom: "closeness",
        keywords: &["i feel close to you", "i feel connected"],
    },
    AtomPattern {
        atom: "part_blending",
        keywords: &["part of me", "one side of me"],
    },
    AtomPattern {
        atom: "self_leadership",
        keywords: &["i can hold this", "i know what i need"],
    },
];

/// Baseline, relational self-distance (roughly Z2) applied in the absence
/// of any part-activation signal (spec.md §4.8 zone table).
const BASELINE_SELF_DISTANCE: f64 = 0.20;

const SAFE_KEYWORDS: &[&str] = &["i feel safe", "i trust you", "i feel calm", "i feel grounded"];
const RUPTURE_KEYWORDS: &[&str] = &["i feel alone", "abandoned", "rejected", "betrayed"];
const EXILE_KEYWORDS: &[&str] = &[
    "can't feel anything",
    "i feel numb",
    "i feel empty",
    "shut down",
    "nothing matters",
];
const FIREFIGHTER_KEYWORDS: &[&str] = &[
    "falling apart",
    "i'm overwhelmed",
    "i can't cope",
    "losing it",
    "out of control",
];
const MANAGER_KEYWORDS: &[&str] = &["i should", "i need to fix", "i have to control", "i need a plan"];

/// `carried_bias` is the prior turn's aggregate `self_distance_influence`
/// (spec.md §4.8, zero on a user's first turn), applied to the baseline
/// before this turn's own part-activation delta.
fn estimate_self_distance(text_lower: &str, carried_bias: f64) -> (f64, DominantPart) {
    let candidates: [(DominantPart, &[&str], f64); 5] = [
        (DominantPart::SelfLed, SAFE_KEYWORDS, -0.05),
        (DominantPart::Exile, EXILE_KEYWORDS, 0.45),
        (DominantPart::Firefighter, FIREFIGHTER_KEYWORDS, 0.30),
        (DominantPart::Exile, RUPTURE_KEYWORDS, 0.15),
        (DominantPart::Manager, MANAGER_KEYWORDS, 0.10),
    ];

    let mut best_part = DominantPart::SelfLed;
    let mut best_weight = 0.0_f64;
    let mut delta = 0.0_f64;

    for (part, keywords, weight) in candidates {
        let coverage = lure::keyword_coverage(text_lower, keywords);
        if coverage <= 0.0 {
            continue;
        }
        let weighted = coverage * weight.abs();
        if weighted > best_weight {
            best_weight = weighted;
            best_part = part;
            delta = coverage * weight;
        }
    }

    let self_distance = (BASELINE_SELF_DISTANCE + carried_bias + delta).clamp(0.0, 1.0);
    (self_distance, best_part)
}

#[derive(Debug, Default)]
pub struct BondOrgan;

impl Organ for BondOrgan {
    fn kind(&self) -> OrganKind {
        OrganKind::Bond
    }

    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError> {
        let atoms = input.catalog.atoms_for(OrganKind::Bond);
        let (lure_field, atom_activations) = lure::compute_lure_field(
            input.text,
            atoms,
            PATTERNS,
            input.embedder,
            input.embedding_lure_enabled,
        );
        let base_coherence = lure::coherence_from_activations(&atom_activations);
        let coherence =
            (base_coherence + 0.3 * input.entity_organ_boost[OrganKind::Bond.index()]).clamp(0.0, 1.0);
        let lure = atom_activations.values().cloned().fold(0.0, f64::max);
        let (self_distance, dominant_part) =
            estimate_self_distance(&input.text.to_lowercase(), input.self_distance_bias);
        Ok(OrganResult {
            organ: OrganKind::Bond,
            coherence,
            lure,
            lure_field,
            atom_activations,
            detail: OrganDetail::Bond {
                self_distance,
                dominant_part,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::Catalog;
    use crate::turn_context::{EntityPrehension, TemporalContext};

    fn process(text: &str) -> OrganResult {
        let catalog = Catalog::load().unwrap();
        let temporal = TemporalContext::from_timestamp(chrono::Utc::now());
        let entity = EntityPrehension::default();
        let input = OrganInput {
            text,
            catalog: &catalog,
            entity_prehension: &entity,
            temporal: &temporal,
            prior_fields: &[],
            entity_organ_boost: &[0.0; 12],
            self_distance_bias: 0.0,
            embedder: None,
            embedding_lure_enabled: false,
        };
        BondOrgan.process(&input).unwrap()
    }

    #[test]
    fn entity_boost_raises_coherence() {
        let catalog = Catalog::load().unwrap();
        let temporal = TemporalContext::from_timestamp(chrono::Utc::now());
        let entity = EntityPrehension::default();
        let mut boost = [0.0; 12];
        boost[OrganKind::Bond.index()] = 1.0;
        let input = OrganInput {
            text: "just a normal day",
            catalog: &catalog,
            entity_prehension: &entity,
            temporal: &temporal,
            prior_fields: &[],
            entity_organ_boost: &boost,
            self_distance_bias: 0.0,
            embedder: None,
            embedding_lure_enabled: false,
        };
        let boosted = BondOrgan.process(&input).unwrap();
        let baseline = process("just a normal day");
        assert!(boosted.coherence > baseline.coherence);
    }

    #[test]
    fn carried_bias_shifts_baseline_self_distance() {
        let catalog = Catalog::load().unwrap();
        let temporal = TemporalContext::from_timestamp(chrono::Utc::now());
        let entity = EntityPrehension::default();
        let input = OrganInput {
            text: "just checking in today",
            catalog: &catalog,
            entity_prehension: &entity,
            temporal: &temporal,
            prior_fields: &[],
            entity_organ_boost: &[0.0; 12],
            self_distance_bias: 0.10,
            embedder: None,
            embedding_lure_enabled: false,
        };
        let biased = BondOrgan.process(&input).unwrap();
        let baseline = process("just checking in today");
        match (biased.detail, baseline.detail) {
            (OrganDetail::Bond { self_distance: with_bias, .. }, OrganDetail::Bond { self_distance: without, .. }) => {
                assert!((with_bias - without - 0.10).abs() < 1e-9);
            }
            _ => panic!("expected Bond detail"),
        }
    }

    #[test]
    fn safe_trusting_language_yields_low_self_distance() {
        let result = process("i feel safe talking to you, i trust you");
        match result.detail {
            OrganDetail::Bond { self_distance, dominant_part } => {
                assert!(self_distance < BASELINE_SELF_DISTANCE);
                assert_eq!(dominant_part, DominantPart::SelfLed);
            }
            _ => panic!("expected Bond detail"),
        }
    }

    #[test]
    fn numbness_yields_exile_and_high_self_distance() {
        let result = process("i can't feel anything anymore, i feel empty");
        match result.detail {
            OrganDetail::Bond { self_distance, dominant_part } => {
                assert!(self_distance > 0.5);
                assert_eq!(dominant_part, DominantPart::Exile);
            }
            _ => panic!("expected Bond detail"),
        }
    }

    #[test]
    fn overwhelm_yields_firefighter() {
        let result = process("everything is falling apart, i'm overwhelmed");
        match result.detail {
            OrganDetail::Bond { dominant_part, .. } => {
                assert_eq!(dominant_part, DominantPart::Firefighter);
            }
            _ => panic!("expected Bond detail"),
        }
    }
}
