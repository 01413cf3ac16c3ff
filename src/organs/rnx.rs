//! RNX: temporal distortion detection — loops, rumination and
//! suspended-time states (spec.md §3).

use crate::error::OrganError;

use super::lure::{self, AtomPattern};
use super::{Organ, OrganDetail, OrganInput, OrganKind, OrganResult, TemporalState};

const PATTERNS: &[AtomPattern] = &[
    AtomPattern {
        atom: "looping",
        keywords: &["round and round", "going in circles"],
    },
    AtomPattern {
        atom: "suspension",
        keywords: &["frozen in time", "stuck in that moment", "time stopped"],
    },
    AtomPattern {
        atom: "repetition",
        keywords: &["again and again", "every time", "same thing happens"],
    },
    AtomPattern {
        atom: "time_distortion",
        keywords: &["i can't tell how long", "time doesn't feel real"],
    },
    AtomPattern {
        atom: "rumination",
        keywords: &["i keep replaying", "can't stop thinking about"],
    },
    AtomPattern {
        atom: "stuck_point",
        keywords: &["i can't move forward", "i'm stuck"],
    },
];

const SUSPENDED_KEYWORDS: &[&str] = &["frozen in time", "stuck in that moment", "time stopped"];
const LOOPED_KEYWORDS: &[&str] = &["round and round", "going in circles", "i keep replaying"];
const REPEATING_KEYWORDS: &[&str] = &["again and again", "every time", "same thing happens"];

fn estimate_temporal_state(text_lower: &str) -> TemporalState {
    let candidates = [
        (TemporalState::Suspended, SUSPENDED_KEYWORDS),
        (TemporalState::Looped, LOOPED_KEYWORDS),
        (TemporalState::Repeating, REPEATING_KEYWORDS),
    ];
    candidates
        .iter()
        .map(|(state, keywords)| (*state, lure::keyword_coverage(text_lower, keywords)))
        .filter(|(_, coverage)| *coverage > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(state, _)| state)
        .unwrap_or(TemporalState::Normal)
}

#[derive(Debug, Default)]
pub struct RnxOrgan;

impl Organ for RnxOrgan {
    fn kind(&self) -> OrganKind {
        OrganKind::Rnx
    }

    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError> {
        let atoms = input.catalog.atoms_for(OrganKind::Rnx);
        let (lure_field, atom_activations) = lure::compute_lure_field(
            input.text,
            atoms,
            PATTERNS,
            input.embedder,
            input.embedding_lure_enabled,
        );
        let coherence = lure::coherence_from_activations(&atom_activations);
        let lure = atom_activations.values().cloned().fold(0.0, f64::max);
        let temporal_state = estimate_temporal_state(&input.text.to_lowercase());
        Ok(OrganResult {
            organ: OrganKind::Rnx,
            coherence,
            lure,
            lure_field,
            atom_activations,
            detail: OrganDetail::Rnx { temporal_state },
        })
    }
}
