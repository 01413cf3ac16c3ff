//! NEXUS: the twelfth, meta-level organ — senses convergence and
//! integration language directly, independent of whatever nexus C6-C8
//! later forms from the other eleven organs' fields (spec.md §3).
//! Usually dormant; this is expected (spec.md §4.2 non-participation).

use crate::error::OrganError;

use super::lure::{self, AtomPattern};
use super::{Organ, OrganDetail, OrganInput, OrganKind, OrganResult};

const PATTERNS: &[AtomPattern] = &[
    AtomPattern {
        atom: "convergence",
        keywords: &["it's all connecting", "this all fits together"],
    },
    AtomPattern {
        atom: "bridging",
        keywords: &["that connects to", "this relates to what you said"],
    },
    AtomPattern {
        atom: "emergence",
        keywords: &["something new is happening", "i'm seeing this differently now"],
    },
    AtomPattern {
        atom: "synthesis",
        keywords: &["putting it all together", "bringing it together"],
    },
    AtomPattern {
        atom: "integration_point",
        keywords: &["it all makes sense now", "now i understand"],
    },
    AtomPattern {
        atom: "threshold_crossing",
        keywords: &["i'm ready to move on", "i've crossed a line for myself"],
    },
    AtomPattern {
        atom: "crystallization",
        keywords: &["it just clicked", "it's suddenly clear"],
    },
];

#[derive(Debug, Default)]
pub struct NexusOrgan;

impl Organ for NexusOrgan {
    fn kind(&self) -> OrganKind {
        OrganKind::Nexus
    }

    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError> {
        let atoms = input.catalog.atoms_for(OrganKind::Nexus);
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
            organ: OrganKind::Nexus,
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
    fn is_dormant_for_ordinary_text() {
        let catalog = Catalog::load().unwrap();
        let temporal = TemporalContext::from_timestamp(chrono::Utc::now());
        let entity = EntityPrehension::default();
        let input = OrganInput {
            text: "what time should we meet tomorrow",
            catalog: &catalog,
            entity_prehension: &entity,
            temporal: &temporal,
            prior_fields: &[],
            entity_organ_boost: &[0.0; 12],
            self_distance_bias: 0.0,
            embedder: None,
            embedding_lure_enabled: false,
        };
        let result = NexusOrgan.process(&input).unwrap();
        assert_eq!(result.coherence, 0.0);
    }

    #[test]
    fn crystallization_language_activates() {
        let catalog = Catalog::load().unwrap();
        let temporal = TemporalContext::from_timestamp(chrono::Utc::now());
        let entity = EntityPrehension::default();
        let input = OrganInput {
            text: "it just clicked, it all makes sense now",
            catalog: &catalog,
            entity_prehension: &entity,
            temporal: &temporal,
            prior_fields: &[],
            entity_organ_boost: &[0.0; 12],
            self_distance_bias: 0.0,
            embedder: None,
            embedding_lure_enabled: false,
        };
        let result = NexusOrgan.process(&input).unwrap();
        assert!(result.coherence > 0.0);
    }
}
