//! NDAM: distress-mobilization detection — the organ most directly
//! responsible for flagging a turn as a crisis candidate (spec.md §3,
//! scenario S2).

use crate::error::OrganError;

use super::lure::{self, AtomPattern};
use super::{Organ, OrganDetail, OrganInput, OrganKind, OrganResult};

const PATTERNS: &[AtomPattern] = &[
    AtomPattern {
        atom: "overwhelm",
        keywords: &["overwhelmed", "too much", "can't handle"],
    },
    AtomPattern {
        atom: "crisis_marker",
        keywords: &["crisis", "emergency", "can't go on"],
    },
    AtomPattern {
        atom: "mobilization",
        keywords: &["i need help now", "something has to change now"],
    },
    AtomPattern {
        atom: "distress_spike",
        keywords: &["panicking", "spiraling", "losing it"],
    },
    AtomPattern {
        atom: "urgent_need",
        keywords: &["please help", "i need someone", "right now"],
    },
    AtomPattern {
        atom: "collapse_risk",
        keywords: &["falling apart", "can't cope", "breaking down"],
    },
];

const URGENCY_KEYWORDS: &[&str] = &[
    "overwhelmed",
    "everything is falling apart",
    "crisis",
    "emergency",
    "can't cope",
    "can't go on",
    "help me",
    "panicking",
    "spiraling",
    "losing it",
];

#[derive(Debug, Default)]
pub struct NdamOrgan;

impl Organ for NdamOrgan {
    fn kind(&self) -> OrganKind {
        OrganKind::Ndam
    }

    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError> {
        let atoms = input.catalog.atoms_for(OrganKind::Ndam);
        let (lure_field, atom_activations) = lure::compute_lure_field(
            input.text,
            atoms,
            PATTERNS,
            input.embedder,
            input.embedding_lure_enabled,
        );
        let coherence = lure::coherence_from_activations(&atom_activations);
        let lure = atom_activations.values().cloned().fold(0.0, f64::max);
        let urgency_level = lure::keyword_coverage(&input.text.to_lowercase(), URGENCY_KEYWORDS);
        Ok(OrganResult {
            organ: OrganKind::Ndam,
            coherence,
            lure,
            lure_field,
            atom_activations,
            detail: OrganDetail::Ndam { urgency_level },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::Catalog;
    use crate::turn_context::{EntityPrehension, TemporalContext};

    #[test]
    fn crisis_language_drives_urgency_high() {
        let catalog = Catalog::load().unwrap();
        let temporal = TemporalContext::from_timestamp(chrono::Utc::now());
        let entity = EntityPrehension::default();
        let input = OrganInput {
            text: "i'm overwhelmed, everything is falling apart and i can't cope",
            catalog: &catalog,
            entity_prehension: &entity,
            temporal: &temporal,
            prior_fields: &[],
            entity_organ_boost: &[0.0; 12],
            self_distance_bias: 0.0,
            embedder: None,
            embedding_lure_enabled: false,
        };
        let result = NdamOrgan.process(&input).unwrap();
        match result.detail {
            OrganDetail::Ndam { urgency_level } => assert!(urgency_level >= 0.3),
            _ => panic!("expected Ndam detail"),
        }
    }

    #[test]
    fn calm_text_yields_zero_urgency() {
        let catalog = Catalog::load().unwrap();
        let temporal = TemporalContext::from_timestamp(chrono::Utc::now());
        let entity = EntityPrehension::default();
        let input = OrganInput {
            text: "thanks for checking in, things are fine today",
            catalog: &catalog,
            entity_prehension: &entity,
            temporal: &temporal,
            prior_fields: &[],
            entity_organ_boost: &[0.0; 12],
            self_distance_bias: 0.0,
            embedder: None,
            embedding_lure_enabled: false,
        };
        let result = NdamOrgan.process(&input).unwrap();
        match result.detail {
            OrganDetail::Ndam { urgency_level } => assert_eq!(urgency_level, 0.0),
            _ => panic!("expected Ndam detail"),
        }
    }
}
