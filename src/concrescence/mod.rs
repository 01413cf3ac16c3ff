//! V0 Concrescence Loop (C5, spec.md §4.5).
//!
//! The cycle driver: owns the `C_max = 5` multi-cycle energy descent,
//! calling into C2 (organ prehension) -> C3 (field extraction) -> C4
//! (meta-atom activation) each cycle, checking the Kairos window and
//! convergence conditions, and returning the full `Occasion` trajectory.
//! Grounded on `agent::heartbeat`'s owns-its-own-loop shape, generalized
//! from wall-clock ticks to cycles.

mod energy;
mod occasion;

pub use occasion::{ConcrescenceResult, ConvergenceReason, Occasion, SubjectiveAim};

use crate::atoms::Catalog;
use crate::config::ConcrescenceConfig;
use crate::embeddings::EmbeddingProvider;
use crate::field::{self, SemanticField};
use crate::learning::RMatrix;
use crate::meta_atoms;
use crate::organs::{prehension, Organ};
use crate::turn_context::{EntityPrehension, TemporalContext};

/// Build the subjective aim for one cycle from its fields and field
/// coherence (spec.md §3 "Occasion carries a SubjectiveAim").
fn subjective_aim(
    fields: &[SemanticField],
    field_coherence: f64,
    satisfaction_goal: f64,
    safety_constrained: bool,
) -> SubjectiveAim {
    let mut lure_direction = None;
    let mut intensity = 0.0_f64;
    for f in fields {
        for (atom, activation) in &f.activations {
            if *activation > intensity {
                intensity = *activation;
                lure_direction = Some(atom.clone());
            }
        }
    }
    SubjectiveAim {
        lure_direction,
        intensity,
        coherence_target: field_coherence,
        satisfaction_goal,
        ethical_weight: if safety_constrained { 1.0 } else { 0.5 },
        safety_constrained,
    }
}

/// Run the full concrescence loop for one turn.
#[allow(clippy::too_many_arguments)]
pub fn run_turn(
    text: &str,
    catalog: &Catalog,
    organs: &[Box<dyn Organ>],
    entity_prehension: &EntityPrehension,
    temporal: &TemporalContext,
    r_matrix: &RMatrix,
    config: &ConcrescenceConfig,
    nexus_config: &crate::config::NexusConfig,
    entity_organ_boost: &[f64; 12],
    self_distance_bias: f64,
    embedder: Option<&dyn EmbeddingProvider>,
    embedding_lure_enabled: bool,
) -> ConcrescenceResult {
    let kairos_window = config.kairos_profile.window();
    let mut occasions: Vec<Occasion> = Vec::with_capacity(config.max_cycles as usize);
    let mut v0 = config.v0_initial;
    let mut prior_v0_delta = 0.0_f64;
    let mut kairos_cycle: Option<u32> = None;
    let mut convergence_reason = ConvergenceReason::MaxCycles;
    let mut prior_fields: Vec<SemanticField> = Vec::new();

    for cycle in 1..=config.max_cycles {
        let results = prehension::run_cycle(
            organs,
            text,
            catalog,
            entity_prehension,
            temporal,
            &prior_fields,
            entity_organ_boost,
            self_distance_bias,
            embedder,
            embedding_lure_enabled,
        );
        let mut fields = field::extract_fields(&results);
        meta_atoms::activate_meta_atoms(&mut fields, catalog, nexus_config);

        let field_coherence = field::field_coherence(&results);
        // No prior occasion to read satisfaction from yet: start from the
        // optimistic prior implied by `V0_initial = 1.0` (nothing has gone
        // wrong) rather than a neutral 0.5, so a turn with no organ
        // engagement at all doesn't manufacture V0 descent out of a
        // placeholder (spec.md §8 boundary 9).
        let mean_satisfaction_so_far = if occasions.is_empty() {
            1.0
        } else {
            occasions.iter().map(|o| o.satisfaction).sum::<f64>() / occasions.len() as f64
        };

        let e_t = energy::energy_delta_for_cycle(
            &config.weights,
            mean_satisfaction_so_far,
            prior_v0_delta,
            field_coherence,
            r_matrix,
            &results,
            &fields,
        );

        let previous_v0 = v0;
        v0 = (v0 - e_t).clamp(0.0, 1.0);
        prior_v0_delta = (v0 - previous_v0).abs();

        let pressure = energy::morphogenetic_pressure(&fields, &results);
        let satisfaction = energy::occasion_satisfaction(field_coherence, v0, kairos_window);

        let kairos_detected = v0 >= kairos_window.0 && v0 <= kairos_window.1;
        if kairos_detected && kairos_cycle.is_none() {
            kairos_cycle = Some(cycle);
        }

        let safety_constrained = pressure >= config.crystallization_pressure;
        let aim = subjective_aim(&fields, field_coherence, satisfaction, safety_constrained);

        occasions.push(Occasion {
            cycle,
            organ_results: results,
            fields: fields.clone(),
            v0,
            field_coherence,
            morphogenetic_pressure: pressure,
            satisfaction,
            kairos_detected,
            subjective_aim: aim,
        });

        prior_fields = fields;

        if kairos_detected {
            convergence_reason = ConvergenceReason::Kairos;
            break;
        }
        if pressure >= config.crystallization_pressure {
            convergence_reason = ConvergenceReason::Crystallization;
            break;
        }
        if prior_v0_delta < config.convergence_epsilon {
            convergence_reason = ConvergenceReason::EnergyStable;
            break;
        }
    }

    ConcrescenceResult {
        occasions,
        convergence_reason,
        kairos_cycle,
    }
}
