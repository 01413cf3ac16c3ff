//! AUTHENTICITY: honesty, directness and boundary-naming, including the
//! speaker's own vulnerability (spec.md §3).

use crate::error::OrganError;

use super::lure::{self, AtomPattern};
use super::{Organ, OrganDetail, OrganInput, OrganKind, OrganResult};

const PATTERNS: &[AtomPattern] = &[
    AtomPattern {
        atom: "honesty",
        keywords: &["honestly", "to be honest", "truthfully"],
    },
    AtomPattern {
        atom: "vulnerability",
        keywords: &["i'm scared to say", "this is hard to admit", "i feel exposed"],
    },
    AtomPattern {
        atom: "directness",
        keywords: &["i need to say", "straight up", "plainly"],
    },
    AtomPattern {
        atom: "congruence",
        keywords: &["what i actually feel", "the truth is"],
    },
    AtomPattern {
        atom: "naming_truth",
        keywords: &["let's call it what it is", "name this"],
    },
    AtomPattern {
        atom: "boundary",
        keywords: &["i can't do that", "that's not okay with me", "i need space"],
    },
];

#[derive(Debug, Default)]
pub struct AuthenticityOrgan;

impl Organ for AuthenticityOrgan {
    fn kind(&self) -> OrganKind {
        OrganKind::Authenticity
    }

    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError> {
        let atoms = input.catalog.atoms_for(OrganKind::Authenticity);
        let (lure_field, atom_activations) = lure::compute_lure_field(
            input.text,
            atoms,
            PATTERNS,
            input.embedder,
            input.embedding_lure_enabled,
        );
        let coherence = lure::coherence_from_activations(&atom_activations);
        let lure = atom_activations.values().cloned().fold(0.0, f64::max);
        Ok(OrganResult {
            organ: OrganKind::Authenticity,
            coherence,
            lure,
            lure_field,
            atom_activations,
            detail: OrganDetail::None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::Catalog;
    use crate::turn_context::{EntityPrehension, TemporalContext};

    #[test]
    fn boundary_language_activates_boundary_atom() {
        let catalog = Catalog::load().unwrap();
        let temporal = TemporalContext::from_timestamp(chrono::Utc::now());
        let entity = EntityPrehension::default();
        let input = OrganInput {
            text: "i need space right now, that's not okay with me",
            catalog: &catalog,
            entity_prehension: &entity,
            temporal: &temporal,
            prior_fields: &[],
            entity_organ_boost: &[0.0; 12],
            self_distance_bias: 0.0,
            embedder: None,
            embedding_lure_enabled: false,
        };
        let result = AuthenticityOrgan.process(&input).unwrap();
        assert!(result.atom_activations["boundary"] > 0.0);
    }
}
