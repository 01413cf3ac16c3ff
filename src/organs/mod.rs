//! Organ Prehension (C2).
//!
//! Twelve organs, one trait, many implementations — grounded on the
//! teacher's `SuccessEvaluator`/`Database` shape (`evaluation/success.rs`,
//! `db/mod.rs`): a single trait with a handful of fields that vary per
//! implementation rather than an inheritance hierarchy.

mod authenticity;
mod bond;
mod card;
mod empathy;
mod eo;
mod listening;
pub mod lure;
mod ndam;
mod nexus_organ;
mod presence;
pub mod prehension;
mod rnx;
mod sans;
mod wisdom;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::atoms::Catalog;
use crate::embeddings::EmbeddingProvider;
use crate::error::OrganError;
use crate::field::SemanticField;
use crate::turn_context::{EntityPrehension, TemporalContext};

pub use authenticity::AuthenticityOrgan;
pub use bond::BondOrgan;
pub use card::CardOrgan;
pub use empathy::EmpathyOrgan;
pub use eo::EoOrgan;
pub use listening::ListeningOrgan;
pub use ndam::NdamOrgan;
pub use nexus_organ::NexusOrgan;
pub use presence::PresenceOrgan;
pub use rnx::RnxOrgan;
pub use sans::SansOrgan;
pub use wisdom::WisdomOrgan;

/// The twelve organs (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrganKind {
    Listening,
    Empathy,
    Wisdom,
    Authenticity,
    Presence,
    Bond,
    Sans,
    Ndam,
    Rnx,
    Eo,
    Card,
    Nexus,
}

impl OrganKind {
    pub const ALL: [OrganKind; 12] = [
        OrganKind::Listening,
        OrganKind::Empathy,
        OrganKind::Wisdom,
        OrganKind::Authenticity,
        OrganKind::Presence,
        OrganKind::Bond,
        OrganKind::Sans,
        OrganKind::Ndam,
        OrganKind::Rnx,
        OrganKind::Eo,
        OrganKind::Card,
        OrganKind::Nexus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrganKind::Listening => "LISTENING",
            OrganKind::Empathy => "EMPATHY",
            OrganKind::Wisdom => "WISDOM",
            OrganKind::Authenticity => "AUTHENTICITY",
            OrganKind::Presence => "PRESENCE",
            OrganKind::Bond => "BOND",
            OrganKind::Sans => "SANS",
            OrganKind::Ndam => "NDAM",
            OrganKind::Rnx => "RNX",
            OrganKind::Eo => "EO",
            OrganKind::Card => "CARD",
            OrganKind::Nexus => "NEXUS",
        }
    }

    /// Fixed index into the 12-wide coherence slice used by the
    /// transformation signature and the R-matrix (spec.md §3).
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap()
    }
}

/// IFS-style part a turn's BOND reading is dominated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantPart {
    Manager,
    Firefighter,
    Exile,
    SelfLed,
}

/// Polyvagal state reported by EO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolyvagalState {
    Ventral,
    Sympathetic,
    Dorsal,
    Mixed,
}

/// Temporal state reported by RNX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalState {
    Normal,
    Suspended,
    Looped,
    Repeating,
}

/// Intensity scale recommended by CARD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedScale {
    Micro,
    Gentle,
    Moderate,
    Full,
}

/// Organ-specific fields that don't belong on the shared result (spec.md
/// §9 "Dynamic polymorphism over organs": these live on BOND's/EO's/etc.
/// variant, not on every organ).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrganDetail {
    None,
    Bond {
        self_distance: f64,
        dominant_part: DominantPart,
    },
    Eo {
        polyvagal_state: PolyvagalState,
    },
    Ndam {
        urgency_level: f64,
    },
    Rnx {
        temporal_state: TemporalState,
    },
    Card {
        recommended_scale: RecommendedScale,
    },
    Sans {
        coherence_repair_needed: f64,
    },
}

/// The result of one organ's prehension of one cycle (spec.md §3/§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganResult {
    pub organ: OrganKind,
    pub coherence: f64,
    pub lure: f64,
    /// Sums to 1 +/- 1e-6 (spec.md invariant).
    pub lure_field: HashMap<String, f64>,
    pub atom_activations: HashMap<String, f64>,
    pub detail: OrganDetail,
}

impl OrganResult {
    /// A legal, inert result for an organ that did not participate this
    /// cycle (spec.md §4.2 "non-participation is legal") or whose
    /// processing failed and was masked (spec.md §4.2 failure policy).
    pub fn neutral(organ: OrganKind, atoms: &[&'static str]) -> Self {
        let uniform = if atoms.is_empty() {
            0.0
        } else {
            1.0 / atoms.len() as f64
        };
        Self {
            organ,
            coherence: 0.0,
            lure: uniform,
            lure_field: atoms.iter().map(|a| (a.to_string(), uniform)).collect(),
            atom_activations: HashMap::new(),
            detail: OrganDetail::None,
        }
    }

    /// `true` if `sum(lure_field)` is within tolerance of 1.0.
    pub fn lure_field_normalized(&self) -> bool {
        let sum: f64 = self.lure_field.values().sum();
        (sum - 1.0).abs() <= 1e-6 || self.lure_field.is_empty()
    }
}

/// Everything one organ needs to process one cycle. Organs are
/// conceptually parallel within a cycle (spec.md §5) and must not depend
/// on each other's intra-cycle state — only on this shared, read-only
/// bundle.
pub struct OrganInput<'a> {
    pub text: &'a str,
    pub catalog: &'a Catalog,
    pub entity_prehension: &'a EntityPrehension,
    pub temporal: &'a TemporalContext,
    /// Fields produced by the previous cycle (empty on cycle 1).
    pub prior_fields: &'a [SemanticField],
    /// Per-organ coherence boost from the entity tracker's stored profile
    /// for whichever entities are named in `entity_prehension`, indexed by
    /// `OrganKind::index()` (spec.md §4.12 pre-emission predictor; all
    /// zero when no entity is recognized or none has a stored profile).
    pub entity_organ_boost: &'a [f64; 12],
    /// This user's carried `self_distance_influence` aggregate from the
    /// prior turn's nexuses, applied as a bias on BOND's baseline
    /// self-distance (spec.md §4.8; zero on a user's first turn).
    pub self_distance_bias: f64,
    pub embedder: Option<&'a dyn EmbeddingProvider>,
    pub embedding_lure_enabled: bool,
}

/// One organ's prehension of the shared input.
pub trait Organ: Send + Sync {
    fn kind(&self) -> OrganKind;

    /// Map `input` to a coherence, lure field and atom activations.
    /// Implementations must never panic; any internal failure should be
    /// returned as `Err` so the driver in `prehension` can mask it to a
    /// neutral result (spec.md §4.2 failure policy).
    fn process(&self, input: &OrganInput<'_>) -> Result<OrganResult, OrganError>;
}

/// Construct one boxed trait object per organ, in `OrganKind::ALL` order.
pub fn build_organs() -> Vec<Box<dyn Organ>> {
    vec![
        Box::new(ListeningOrgan::default()),
        Box::new(EmpathyOrgan::default()),
        Box::new(WisdomOrgan::default()),
        Box::new(AuthenticityOrgan::default()),
        Box::new(PresenceOrgan::default()),
        Box::new(BondOrgan::default()),
        Box::new(SansOrgan::default()),
        Box::new(NdamOrgan::default()),
        Box::new(RnxOrgan::default()),
        Box::new(EoOrgan::default()),
        Box::new(CardOrgan::default()),
        Box::new(NexusOrgan::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organ_kind_index_matches_all_order() {
        for (i, k) in OrganKind::ALL.iter().enumerate() {
            assert_eq!(k.index(), i);
        }
    }

    #[test]
    fn neutral_result_has_uniform_lure_field() {
        let r = OrganResult::neutral(OrganKind::Sans, &["a", "b", "c", "d"]);
        assert_eq!(r.coherence, 0.0);
        assert!(r.lure_field_normalized());
        for v in r.lure_field.values() {
            assert!((v - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn build_organs_has_twelve_in_order() {
        let organs = build_organs();
        assert_eq!(organs.len(), 12);
        for (organ, kind) in organs.iter().zip(OrganKind::ALL) {
            assert_eq!(organ.kind(), kind);
        }
    }
}
