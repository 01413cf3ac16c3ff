//! EMPATHY: attunement to another's felt experience, particularly grief
//! and shared pain (spec.md §3, scenario S4).

use crate::error::OrganError;

use super::lure::{self, AtomPattern};
use super::{Organ, OrganDetail, OrganInput, OrganKind, OrganResult};

const PATTERNS: &[AtomPattern] = &[
    AtomPattern {
        atom: "attunement",
        keywords: &["i understand", "that makes sense", "i can imagine"],
    },
    AtomPattern {
        atom: "grief",
        keywords: &["died", "passed away", "loss", "grief", "mourning", "miss them"],
    },
    AtomPattern {
        atom: "compassion",
        keywords: &["i'm so sorry", "that's so hard", "my heart goes out"],
    },
    AtomPattern {
        atom: "resonance",
        keywords: &["me too", "i've felt that", "i know that feeling"],
    },
    AtomPattern {
        atom: "tenderness",
        keywords: &["gently", "tender", "soft place"],
    },
    AtomPattern {
        atom: "shared_pain",
        keywords: &["it hurts", "painful", "aching", "it still hurts"],
    },
    AtomPattern {
        atom: "warmth",
        keywords: &["warmth", "care about you", "i care"],
    },
];

#[derive(Debug, Default)]
pub struct EmpathyOrgan;

impl Organ for EmpathyOrgan {
    fn kind(&self) -> OrganKind {
        OrganKind::Empathy
    }

    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError> {
        let atoms = input.catalog.atoms_for(OrganKind::Empathy);
        let (lure_field, atom_activations) = lure::compute_lure_field(
            input.text,
            atoms,
            PATTERNS,
            input.embedder,
            input.embedding_lure_enabled,
        );
        let base_coherence = lure::coherence_from_activations(&atom_activations);
        let coherence =
            (base_coherence + 0.3 * input.entity_organ_boost[OrganKind::Empathy.index()]).clamp(0.0, 1.0);
        let lure = atom_activations.values().cloned().fold(0.0, f64::max);
        Ok(OrganResult {
            organ: OrganKind::Empathy,
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
    fn entity_boost_raises_coherence_on_otherwise_flat_text() {
        let catalog = Catalog::load().unwrap();
        let temporal = TemporalContext::from_timestamp(chrono::Utc::now());
        let entity = EntityPrehension::default();
        let flat_input = |boost: &[f64; 12]| OrganInput {
            text: "the weather today",
            catalog: &catalog,
            entity_prehension: &entity,
            temporal: &temporal,
            prior_fields: &[],
            entity_organ_boost: boost,
            self_distance_bias: 0.0,
            embedder: None,
            embedding_lure_enabled: false,
        };
        let baseline = EmpathyOrgan.process(&flat_input(&[0.0; 12])).unwrap();
        let mut boost = [0.0; 12];
        boost[OrganKind::Empathy.index()] = 1.0;
        let boosted = EmpathyOrgan.process(&flat_input(&boost)).unwrap();
        assert!(boosted.coherence > baseline.coherence);
    }

    #[test]
    fn grief_language_activates_grief_atom() {
        let catalog = Catalog::load().unwrap();
        let temporal = TemporalContext::from_timestamp(chrono::Utc::now());
        let entity = EntityPrehension::default();
        let input = OrganInput {
            text: "my dad died two months ago and it still hurts",
            catalog: &catalog,
            entity_prehension: &entity,
            temporal: &temporal,
            prior_fields: &[],
            entity_organ_boost: &[0.0; 12],
            self_distance_bias: 0.0,
            embedder: None,
            embedding_lure_enabled: false,
        };
        let result = EmpathyOrgan.process(&input).unwrap();
        assert!(result.coherence > 0.5);
        assert!(result.atom_activations["grief"] > 0.0);
    }
}
