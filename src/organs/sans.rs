//! SANS: safety-signal scanning and internal-coherence repair (spec.md
//! §3). `coherence_repair_needed` feeds the SELF-Matrix safety-level
//! computation alongside BOND's `self_distance` (spec.md §4.8).

use crate::error::OrganError;

use super::lure::{self, AtomPattern};
use super::{Organ, OrganDetail, OrganInput, OrganKind, OrganResult};

const PATTERNS: &[AtomPattern] = &[
    AtomPattern {
        atom: "safety_signal",
        keywords: &["i feel safe here", "this is a safe space"],
    },
    AtomPattern {
        atom: "threat_scan",
        keywords: &["is this safe", "can i trust this", "watching for"],
    },
    AtomPattern {
        atom: "coherence_repair",
        keywords: &["i'm confused", "don't know who i am", "i can't think straight"],
    },
    AtomPattern {
        atom: "boundary_violation",
        keywords: &["you crossed a line", "that's not okay", "you pushed too far"],
    },
    AtomPattern {
        atom: "settling",
        keywords: &["i'm settling down", "starting to feel okay"],
    },
    AtomPattern {
        atom: "hypervigilance",
        keywords: &["on edge", "can't relax", "always watching"],
    },
];

const FRAGMENTATION_KEYWORDS: &[&str] = &[
    "i'm confused",
    "don't know who i am",
    "can't think straight",
    "everything is a blur",
    "falling apart",
];

#[derive(Debug, Default)]
pub struct SansOrgan;

impl Organ for SansOrgan {
    fn kind(&self) -> OrganKind {
        OrganKind::Sans
    }

    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError> {
        let atoms = input.catalog.atoms_for(OrganKind::Sans);
        let (lure_field, atom_activations) = lure::compute_lure_field(
            input.text,
            atoms,
            PATTERNS,
            input.embedder,
            input.embedding_lure_enabled,
        );
        let coherence = lure::coherence_from_activations(&atom_activations);
        let lure = atom_activations.values().cloned().fold(0.0, f64::max);
        let coherence_repair_needed =
            lure::keyword_coverage(&input.text.to_lowercase(), FRAGMENTATION_KEYWORDS);
        Ok(OrganResult {
            organ: OrganKind::Sans,
            coherence,
            lure,
            lure_field,
            atom_activations,
            detail: OrganDetail::Sans {
                coherence_repair_needed,
            },
        })
    }
}
