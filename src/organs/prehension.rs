//! The C2 driver: runs all twelve organs for one cycle against the shared
//! input, masking any organ failure to a neutral result rather than
//! aborting the turn (spec.md §4.2 failure policy).
//!
//! Organs are conceptually parallel within a cycle (spec.md §5); each
//! individual `Organ::process` call is cheap synchronous CPU work, so
//! this driver runs them sequentially in `OrganKind::ALL` order rather
//! than paying task-spawn overhead for twelve keyword scans (spec.md
//! line 185 permits either).

use crate::atoms::Catalog;
use crate::embeddings::EmbeddingProvider;
use crate::organs::{Organ, OrganInput, OrganKind, OrganResult};
use crate::turn_context::{EntityPrehension, TemporalContext};

use crate::field::SemanticField;

/// Run every organ once against the shared input, in `OrganKind::ALL`
/// order in the returned vector (ordering among organs is not otherwise
/// observable per spec.md §5).
#[allow(clippy::too_many_arguments)]
pub fn run_cycle(
    organs: &[Box<dyn Organ>],
    text: &str,
    catalog: &Catalog,
    entity_prehension: &EntityPrehension,
    temporal: &TemporalContext,
    prior_fields: &[SemanticField],
    entity_organ_boost: &[f64; 12],
    self_distance_bias: f64,
    embedder: Option<&dyn EmbeddingProvider>,
    embedding_lure_enabled: bool,
) -> Vec<OrganResult> {
    let input = OrganInput {
        text,
        catalog,
        entity_prehension,
        temporal,
        prior_fields,
        entity_organ_boost,
        self_distance_bias,
        embedder,
        embedding_lure_enabled,
    };

    organs
        .iter()
        .map(|organ| match organ.process(&input) {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!(organ = organ.kind().as_str(), error = %err, "organ failed, masking to neutral result");
                neutral_for(organ.kind(), catalog)
            }
        })
        .collect()
}

fn neutral_for(kind: OrganKind, catalog: &Catalog) -> OrganResult {
    let names: Vec<&'static str> = catalog.atoms_for(kind).iter().map(|a| a.name).collect();
    OrganResult::neutral(kind, &names)
}
