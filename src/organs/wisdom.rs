//! WISDOM: perspective-taking and pattern-recognition across time,
//! holding paradox rather than collapsing it (spec.md §3).

use crate::error::OrganError;

use super::lure::{self, AtomPattern};
use super::{Organ, OrganDetail, OrganInput, OrganKind, OrganResult};

const PATTERNS: &[AtomPattern] = &[
    AtomPattern {
        atom: "perspective",
        keywords: &["looking back", "in the bigger picture", "from another angle"],
    },
    AtomPattern {
        atom: "discernment",
        keywords: &["what matters here", "the real question", "underneath this"],
    },
    AtomPattern {
        atom: "integration",
        keywords: &["it all makes sense now", "coming together", "now i see"],
    },
    AtomPattern {
        atom: "pattern_recognition",
        keywords: &["every time", "this keeps happening", "it's a pattern"],
    },
    AtomPattern {
        atom: "long_view",
        keywords: &["over the years", "eventually", "in the long run"],
    },
    AtomPattern {
        atom: "paradox_holding",
        keywords: &["both things are true", "at the same time", "and also"],
    },
];

#[derive(Debug, Default)]
pub struct WisdomOrgan;

impl Organ for WisdomOrgan {
    fn kind(&self) -> OrganKind {
        OrganKind::Wisdom
    }

    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError> {
        let atoms = input.catalog.atoms_for(OrganKind::Wisdom);
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
            organ: OrganKind::Wisdom,
            coherence,
            lure,
            lure_field,
            atom_activations,
            detail: OrganDetail::None,
        })
    }
}
