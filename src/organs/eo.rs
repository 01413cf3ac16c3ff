//! EO: polyvagal-state reading — ventral safety, sympathetic
//! mobilization, or dorsal shutdown (spec.md §3, scenarios S1/S2/S3).

use crate::error::OrganError;

use super::lure::{self, AtomPattern};
use super::{Organ, OrganDetail, OrganInput, OrganKind, OrganResult, PolyvagalState};

const PATTERNS: &[AtomPattern] = &[
    AtomPattern {
        atom: "ventral_cue",
        keywords: &["i feel safe", "i feel calm", "i feel connected", "i trust you"],
    },
    AtomPattern {
        atom: "sympathetic_activation",
        keywords: &["overwhelmed", "anxious", "racing", "panicking", "falling apart"],
    },
    AtomPattern {
        atom: "dorsal_shutdown",
        keywords: &["i feel numb", "i feel empty", "shut down", "can't feel anything", "disconnected"],
    },
    AtomPattern {
        atom: "mixed_state",
        keywords: &["part of me is calm but", "i don't know what i feel"],
    },
    AtomPattern {
        atom: "co_regulation",
        keywords: &["talking to you helps", "this is helping me calm down"],
    },
    AtomPattern {
        atom: "numbness",
        keywords: &["nothing feels real", "i can't feel my body"],
    },
];

const VENTRAL_KEYWORDS: &[&str] = &["i feel safe", "i feel calm", "i feel connected", "i trust you", "this is helping me calm down"];
const SYMPATHETIC_KEYWORDS: &[&str] = &["overwhelmed", "anxious", "racing", "panicking", "falling apart", "can't cope"];
const DORSAL_KEYWORDS: &[&str] = &["i feel numb", "i feel empty", "shut down", "can't feel anything", "disconnected", "nothing feels real"];

fn estimate_polyvagal_state(text_lower: &str) -> PolyvagalState {
    let candidates = [
        (PolyvagalState::Dorsal, DORSAL_KEYWORDS),
        (PolyvagalState::Sympathetic, SYMPATHETIC_KEYWORDS),
        (PolyvagalState::Ventral, VENTRAL_KEYWORDS),
    ];
    let scored: Vec<(PolyvagalState, f64)> = candidates
        .iter()
        .map(|(state, keywords)| (*state, lure::keyword_coverage(text_lower, keywords)))
        .filter(|(_, coverage)| *coverage > 0.0)
        .collect();

    match scored.len() {
        0 => PolyvagalState::Mixed,
        1 => scored[0].0,
        _ => {
            if scored.iter().any(|(s, _)| *s == PolyvagalState::Ventral)
                && scored.iter().any(|(s, _)| *s != PolyvagalState::Ventral)
            {
                PolyvagalState::Mixed
            } else {
                scored
                    .into_iter()
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(s, _)| s)
                    .unwrap_or(PolyvagalState::Mixed)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct EoOrgan;

impl Organ for EoOrgan {
    fn kind(&self) -> OrganKind {
        OrganKind::Eo
    }

    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError> {
        let atoms = input.catalog.atoms_for(OrganKind::Eo);
        let (lure_field, atom_activations) = lure::compute_lure_field(
            input.text,
            atoms,
            PATTERNS,
            input.embedder,
            input.embedding_lure_enabled,
        );
        let coherence = lure::coherence_from_activations(&atom_activations);
        let lure = atom_activations.values().cloned().fold(0.0, f64::max);
        let polyvagal_state = estimate_polyvagal_state(&input.text.to_lowercase());
        Ok(OrganResult {
            organ: OrganKind::Eo,
            coherence,
            lure,
            lure_field,
            atom_activations,
            detail: OrganDetail::Eo { polyvagal_state },
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
        EoOrgan.process(&input).unwrap()
    }

    #[test]
    fn safe_language_reads_ventral() {
        let result = process("i feel safe talking to you");
        match result.detail {
            OrganDetail::Eo { polyvagal_state } => assert_eq!(polyvagal_state, PolyvagalState::Ventral),
            _ => panic!("expected Eo detail"),
        }
    }

    #[test]
    fn numbness_reads_dorsal() {
        let result = process("i can't feel anything anymore, i feel empty and disconnected");
        match result.detail {
            OrganDetail::Eo { polyvagal_state } => assert_eq!(polyvagal_state, PolyvagalState::Dorsal),
            _ => panic!("expected Eo detail"),
        }
    }

    #[test]
    fn overwhelm_reads_sympathetic() {
        let result = process("i'm overwhelmed and everything is falling apart");
        match result.detail {
            OrganDetail::Eo { polyvagal_state } => assert_eq!(polyvagal_state, PolyvagalState::Sympathetic),
            _ => panic!("expected Eo detail"),
        }
    }
}
