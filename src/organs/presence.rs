//! PRESENCE: groundedness and embodied here-and-now attention (spec.md
//! §3, scenario S4 "held without needing to be fixed").

use crate::error::OrganError;

use super::lure::{self, AtomPattern};
use super::{Organ, OrganDetail, OrganInput, OrganKind, OrganResult};

const PATTERNS: &[AtomPattern] = &[
    AtomPattern {
        atom: "groundedness",
        keywords: &["grounded", "steady", "planted"],
    },
    AtomPattern {
        atom: "stillness",
        keywords: &["still", "quiet moment", "pause"],
    },
    AtomPattern {
        atom: "embodiment",
        keywords: &["in my body", "i feel it in my chest", "tight in my stomach"],
    },
    AtomPattern {
        atom: "here_now",
        keywords: &["right now", "in this moment", "today"],
    },
    AtomPattern {
        atom: "breath",
        keywords: &["breathe", "breath", "exhale"],
    },
    AtomPattern {
        atom: "witnessing",
        keywords: &["just be with me", "witness this", "sit with me"],
    },
];

#[derive(Debug, Default)]
pub struct PresenceOrgan;

impl Organ for PresenceOrgan {
    fn kind(&self) -> OrganKind {
        OrganKind::Presence
    }

    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError> {
        let atoms = input.catalog.atoms_for(OrganKind::Presence);
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
            organ: OrganKind::Presence,
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
    fn embodied_language_activates_embodiment_atom() {
        let catalog = Catalog::load().unwrap();
        let temporal = TemporalContext::from_timestamp(chrono::Utc::now());
        let entity = EntityPrehension::default();
        let input = OrganInput {
            text: "i feel it in my chest, just sit with me a moment",
            catalog: &catalog,
            entity_prehension: &entity,
            temporal: &temporal,
            prior_fields: &[],
            entity_organ_boost: &[0.0; 12],
            self_distance_bias: 0.0,
            embedder: None,
            embedding_lure_enabled: false,
        };
        let result = PresenceOrgan.process(&input).unwrap();
        assert!(result.atom_activations["embodiment"] > 0.0);
        assert!(result.atom_activations["witnessing"] > 0.0);
    }
}
