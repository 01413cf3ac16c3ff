//! CARD: response-scale calibration — how much intensity the moment can
//! hold (spec.md §3, §4.9 emission scale clamp).

use crate::error::OrganError;

use super::lure::{self, AtomPattern};
use super::{Organ, OrganDetail, OrganInput, OrganKind, OrganResult, RecommendedScale};

const PATTERNS: &[AtomPattern] = &[
    AtomPattern {
        atom: "micro_step",
        keywords: &["just a small thing", "one tiny step"],
    },
    AtomPattern {
        atom: "gentle_pace",
        keywords: &["gently", "slowly", "take it easy"],
    },
    AtomPattern {
        atom: "moderate_engagement",
        keywords: &["let's talk through this", "i want to work on this"],
    },
    AtomPattern {
        atom: "full_intensity",
        keywords: &["i need to go all in", "let's really dig into this"],
    },
    AtomPattern {
        atom: "scale_down",
        keywords: &["that's too much", "can we slow down"],
    },
    AtomPattern {
        atom: "scale_up",
        keywords: &["i'm ready for more", "push me a little"],
    },
];

const MICRO_KEYWORDS: &[&str] = &[
    "i can't feel anything",
    "i feel empty",
    "shut down",
    "too much",
    "can we slow down",
];
const FULL_KEYWORDS: &[&str] = &[
    "i need to go all in",
    "let's really dig into this",
    "i'm ready for more",
];
const GENTLE_KEYWORDS: &[&str] = &["died", "grief", "loss", "gently", "take it easy", "fragile"];

fn estimate_scale(text_lower: &str) -> RecommendedScale {
    let candidates = [
        (RecommendedScale::Micro, MICRO_KEYWORDS),
        (RecommendedScale::Full, FULL_KEYWORDS),
        (RecommendedScale::Gentle, GENTLE_KEYWORDS),
    ];
    candidates
        .iter()
        .map(|(scale, keywords)| (*scale, lure::keyword_coverage(text_lower, keywords)))
        .filter(|(_, coverage)| *coverage > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(scale, _)| scale)
        .unwrap_or(RecommendedScale::Moderate)
}

#[derive(Debug, Default)]
pub struct CardOrgan;

impl Organ for CardOrgan {
    fn kind(&self) -> OrganKind {
        OrganKind::Card
    }

    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError> {
        let atoms = input.catalog.atoms_for(OrganKind::Card);
        let (lure_field, atom_activations) = lure::compute_lure_field(
            input.text,
            atoms,
            PATTERNS,
            input.embedder,
            input.embedding_lure_enabled,
        );
        let coherence = lure::coherence_from_activations(&atom_activations);
        let lure = atom_activations.values().cloned().fold(0.0, f64::max);
        let recommended_scale = estimate_scale(&input.text.to_lowercase());
        Ok(OrganResult {
            organ: OrganKind::Card,
            coherence,
            lure,
            lure_field,
            atom_activations,
            detail: OrganDetail::Card { recommended_scale },
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
        CardOrgan.process(&input).unwrap()
    }

    #[test]
    fn shutdown_language_recommends_micro_scale() {
        let result = process("i feel empty, shut down, that's too much right now");
        match result.detail {
            OrganDetail::Card { recommended_scale } => assert_eq!(recommended_scale, RecommendedScale::Micro),
            _ => panic!("expected Card detail"),
        }
    }

    #[test]
    fn ordinary_text_recommends_moderate_scale() {
        let result = process("how's your week going");
        match result.detail {
            OrganDetail::Card { recommended_scale } => assert_eq!(recommended_scale, RecommendedScale::Moderate),
            _ => panic!("expected Card detail"),
        }
    }
}
