//! LISTENING: tracks whether the turn shows attentive, reflective uptake
//! of what came before, independent of emotional content (spec.md §3).

use crate::error::OrganError;

use super::lure::{self, AtomPattern};
use super::{Organ, OrganDetail, OrganInput, OrganKind, OrganResult};

const PATTERNS: &[AtomPattern] = &[
    AtomPattern {
        atom: "attending",
        keywords: &["i'm listening", "i hear you", "tell me more", "go on"],
    },
    AtomPattern {
        atom: "reflecting",
        keywords: &["it sounds like", "so you're saying", "what i'm hearing"],
    },
    AtomPattern {
        atom: "clarifying",
        keywords: &["what do you mean", "can you say more", "help me understand"],
    },
    AtomPattern {
        atom: "silence_holding",
        keywords: &["take your time", "no rush", "i'm here"],
    },
    AtomPattern {
        atom: "paraphrasing",
        keywords: &["in other words", "to put it differently"],
    },
    AtomPattern {
        atom: "tracking",
        keywords: &["earlier you said", "you mentioned", "going back to"],
    },
    AtomPattern {
        atom: "pacing",
        keywords: &["let's slow down", "one thing at a time", "step by step"],
    },
];

#[derive(Debug, Default)]
pub struct ListeningOrgan;

impl Organ for ListeningOrgan {
    fn kind(&self) -> OrganKind {
        OrganKind::Listening
    }

    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError> {
        let atoms = input.catalog.atoms_for(OrganKind::Listening);
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
            organ: OrganKind::Listening,
            coherence,
            lure,
            lure_field,
            atom_activations,
            detail: OrganDetail::None,
        })
    }
}
