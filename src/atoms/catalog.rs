//! Static atom data. Building this is the one fallible step in loading the
//! catalog (duplicate atoms, empty organs, or a malformed meta-atom would
//! all be a packaging bug, so we validate eagerly rather than trusting the
//! literal tables below).

use std::collections::{HashMap, HashSet};

use crate::error::CatalogError;
use crate::organs::OrganKind;

use super::{Atom, Catalog, EMBEDDING_DIM};

/// Deterministic unit-length "prototype embedding" for an atom name.
///
/// Real prototypes would come from an embedding model fit on example
/// utterances per atom; here we derive a stable, reproducible vector from
/// the atom's name so that every process sees byte-identical prototypes
/// (spec.md §8 property 6 requires bit-equal organ results across runs)
/// without shipping 384 hand-authored floats per atom.
fn prototype_embedding(seed_text: &str) -> Vec<f32> {
    let mut state = splitmix64_seed(seed_text);
    let mut v = Vec::with_capacity(EMBEDDING_DIM);
    for _ in 0..EMBEDDING_DIM {
        state = splitmix64_next(state);
        // Map to roughly N(0,1) via a cheap Box-Muller-free trick: center
        // the top 53 bits of state in [-1, 1].
        let x = ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0;
        v.push(x as f32);
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

fn splitmix64_seed(text: &str) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in text.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

fn splitmix64_next(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

fn atom(name: &'static str, organ: OrganKind) -> Atom {
    Atom {
        name,
        bridges: None,
        organ: Some(organ),
        prototype: prototype_embedding(name),
    }
}

fn meta_atom(name: &'static str, bridges: &[OrganKind]) -> Atom {
    Atom {
        name,
        bridges: Some(bridges.to_vec()),
        organ: None,
        prototype: prototype_embedding(name),
    }
}

const LISTENING_ATOMS: &[&str] = &[
    "attending",
    "reflecting",
    "clarifying",
    "silence_holding",
    "paraphrasing",
    "tracking",
    "pacing",
];

const EMPATHY_ATOMS: &[&str] = &[
    "attunement",
    "grief",
    "compassion",
    "resonance",
    "tenderness",
    "shared_pain",
    "warmth",
];

const WISDOM_ATOMS: &[&str] = &[
    "perspective",
    "discernment",
    "integration",
    "pattern_recognition",
    "long_view",
    "paradox_holding",
];

const AUTHENTICITY_ATOMS: &[&str] = &[
    "honesty",
    "vulnerability",
    "directness",
    "congruence",
    "naming_truth",
    "boundary",
];

const PRESENCE_ATOMS: &[&str] = &[
    "groundedness",
    "stillness",
    "embodiment",
    "here_now",
    "breath",
    "witnessing",
];

const BOND_ATOMS: &[&str] = &[
    "trust",
    "attachment_rupture",
    "repair",
    "closeness",
    "part_blending",
    "self_leadership",
];

const SANS_ATOMS: &[&str] = &[
    "safety_signal",
    "threat_scan",
    "coherence_repair",
    "boundary_violation",
    "settling",
    "hypervigilance",
];

const NDAM_ATOMS: &[&str] = &[
    "overwhelm",
    "crisis_marker",
    "mobilization",
    "distress_spike",
    "urgent_need",
    "collapse_risk",
];

const RNX_ATOMS: &[&str] = &[
    "looping",
    "suspension",
    "repetition",
    "time_distortion",
    "rumination",
    "stuck_point",
];

const EO_ATOMS: &[&str] = &[
    "ventral_cue",
    "sympathetic_activation",
    "dorsal_shutdown",
    "mixed_state",
    "co_regulation",
    "numbness",
];

const CARD_ATOMS: &[&str] = &[
    "micro_step",
    "gentle_pace",
    "moderate_engagement",
    "full_intensity",
    "scale_down",
    "scale_up",
];

const NEXUS_ATOMS: &[&str] = &[
    "convergence",
    "bridging",
    "emergence",
    "synthesis",
    "integration_point",
    "threshold_crossing",
    "crystallization",
];

/// (name, bridged organs) for the 10 meta-atoms (spec.md §4.1).
const META_ATOMS: &[(&str, &[OrganKind])] = {
    use OrganKind::*;
    &[
        ("fierce_holding", &[Empathy, Authenticity, Bond]),
        ("grounded_witnessing", &[Presence, Listening]),
        ("wise_tenderness", &[Wisdom, Empathy]),
        ("safe_enough_truth", &[Sans, Authenticity]),
        ("regulated_repair", &[Eo, Bond]),
        ("urgent_grounding", &[Ndam, Presence]),
        ("temporal_release", &[Rnx, Wisdom]),
        ("calibrated_intensity", &[Card, Ndam]),
        ("attuned_bridge", &[Listening, Empathy, Bond]),
        ("crystallized_insight", &[Nexus, Wisdom, Authenticity]),
    ]
};

pub(super) fn build() -> Result<Catalog, CatalogError> {
    let mut by_organ: HashMap<OrganKind, Vec<Atom>> = HashMap::new();
    let mut seen_names: HashSet<&'static str> = HashSet::new();
    let mut owner_of: HashMap<&'static str, OrganKind> = HashMap::new();

    for (organ, names) in [
        (OrganKind::Listening, LISTENING_ATOMS),
        (OrganKind::Empathy, EMPATHY_ATOMS),
        (OrganKind::Wisdom, WISDOM_ATOMS),
        (OrganKind::Authenticity, AUTHENTICITY_ATOMS),
        (OrganKind::Presence, PRESENCE_ATOMS),
        (OrganKind::Bond, BOND_ATOMS),
        (OrganKind::Sans, SANS_ATOMS),
        (OrganKind::Ndam, NDAM_ATOMS),
        (OrganKind::Rnx, RNX_ATOMS),
        (OrganKind::Eo, EO_ATOMS),
        (OrganKind::Card, CARD_ATOMS),
        (OrganKind::Nexus, NEXUS_ATOMS),
    ] {
        if names.is_empty() {
            return Err(CatalogError::EmptyOrgan {
                organ: organ.as_str(),
            });
        }
        let mut atoms = Vec::with_capacity(names.len());
        for &name in names {
            if let Some(&first_owner) = owner_of.get(name) {
                return Err(CatalogError::DuplicateAtom {
                    atom: name,
                    first: first_owner.as_str(),
                    second: organ.as_str(),
                });
            }
            owner_of.insert(name, organ);
            seen_names.insert(name);
            let a = atom(name, organ);
            if a.prototype.len() != EMBEDDING_DIM {
                return Err(CatalogError::BadEmbeddingDimension {
                    atom: name,
                    got: a.prototype.len(),
                    expected: EMBEDDING_DIM,
                });
            }
            atoms.push(a);
        }
        by_organ.insert(organ, atoms);
    }

    let mut meta_atoms = Vec::with_capacity(META_ATOMS.len());
    for &(name, bridges) in META_ATOMS {
        if bridges.is_empty() {
            return Err(CatalogError::EmptyMetaAtom { name });
        }
        meta_atoms.push(meta_atom(name, bridges));
    }

    Ok(Catalog {
        by_organ,
        meta_atoms,
    })
}
