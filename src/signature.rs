//! 65-D Transformation Signature (spec.md §4.11, §9).
//!
//! One fixed-width vector per turn capturing how the turn moved the felt
//! state from its first to its final cycle: V0 descent, per-organ
//! coherence/lure shift, polyvagal/zone/self-distance movement,
//! satisfaction evolution, convergence characteristics, emission path and
//! field-agreement statistics. Feeds the family learner (C11) and the
//! entity-organ tracker (C12). L2-normalized before use in either.

use serde::{Deserialize, Serialize};

use crate::concrescence::ConcrescenceResult;
use crate::learning::RMatrix;
use crate::nexus::{Nexus, OrganInsights, Zone};
use crate::organs::OrganKind;

pub const DIMENSIONS: usize = 65;

/// Which strategy produced the turn's emission (spec.md §4.9/§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionPath {
    Direct,
    Fusion,
    Learned,
    Minimal,
}

impl EmissionPath {
    fn one_hot(self) -> [f64; 4] {
        match self {
            EmissionPath::Direct => [1.0, 0.0, 0.0, 0.0],
            EmissionPath::Fusion => [0.0, 1.0, 0.0, 0.0],
            EmissionPath::Learned => [0.0, 0.0, 1.0, 0.0],
            EmissionPath::Minimal => [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// A turn's 65-D transformation signature, L2-normalized (spec.md §3
/// invariant "signature is L2-normalized within 1e-6").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationSignature {
    pub values: Vec<f64>,
}

impl TransformationSignature {
    pub fn is_normalized(&self) -> bool {
        let norm: f64 = self.values.iter().map(|v| v * v).sum::<f64>().sqrt();
        (norm - 1.0).abs() <= 1e-6 || norm < 1e-9
    }

    pub fn cosine_similarity(&self, other: &[f64]) -> f64 {
        if self.values.len() != other.len() {
            return 0.0;
        }
        let dot: f64 = self.values.iter().zip(other).map(|(a, b)| a * b).sum();
        let norm_a: f64 = self.values.iter().map(|v| v * v).sum::<f64>().sqrt();
        let norm_b: f64 = other.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm_a <= 0.0 || norm_b <= 0.0 {
            0.0
        } else {
            (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
        }
    }
}

fn l2_normalize(mut values: Vec<f64>) -> Vec<f64> {
    let norm: f64 = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 1e-9 {
        for v in &mut values {
            *v /= norm;
        }
    }
    values
}

fn urgency_of(insights: &OrganInsights) -> f64 {
    insights.urgency_level
}

fn field_agreement_stats(nexuses: &[Nexus], r_matrix: &RMatrix) -> [f64; 8] {
    let n = nexuses.len().max(1) as f64;
    let pairwise_agreement_mean = nexuses.iter().map(|n| n.agreement).sum::<f64>() / n;
    let strengths: Vec<f64> = nexuses.iter().map(|n| n.intersection_strength).collect();
    let total: f64 = strengths.iter().sum::<f64>().max(1e-9);
    let mut sorted = strengths.clone();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
    let top1 = sorted.first().copied().unwrap_or(0.0) / total;
    let top3 = sorted.iter().take(3).sum::<f64>() / total;
    let entropy = {
        let probs: Vec<f64> = strengths.iter().map(|s| s / total).filter(|p| *p > 0.0).collect();
        let raw = -probs.iter().map(|p| p * p.ln()).sum::<f64>();
        let max_entropy = (nexuses.len().max(1) as f64).ln().max(1e-9);
        (raw / max_entropy).clamp(0.0, 1.0)
    };
    let polarization = 1.0 - entropy;
    let nexus_count_norm = (nexuses.len() as f64 / 14.0).clamp(0.0, 1.0);
    let mean_emission_readiness = nexuses.iter().map(|n| n.emission_readiness).sum::<f64>() / n;
    let organs: Vec<OrganKind> = {
        let mut set: Vec<OrganKind> = nexuses.iter().flat_map(|n| n.participants.clone()).collect();
        set.sort();
        set.dedup();
        set
    };
    let mean_r_matrix_weight = r_matrix.mean_over_pairs(&organs);
    [
        pairwise_agreement_mean,
        entropy,
        polarization,
        top1,
        top3,
        nexus_count_norm,
        mean_emission_readiness,
        mean_r_matrix_weight,
    ]
}

/// Build the 65-D transformation signature for one completed turn
/// (spec.md §4.11). Organ order is fixed to `OrganKind::ALL`; dormant
/// organs contribute zero shift rather than being excluded, matching the
/// R-matrix's fixed-width indexing.
pub fn compute(
    result: &ConcrescenceResult,
    r_matrix: &RMatrix,
    nexuses: &[Nexus],
    emission_path: EmissionPath,
) -> TransformationSignature {
    let first = &result.occasions[0];
    let last = result.final_occasion();

    let before = OrganInsights::from_results(&first.organ_results);
    let after = OrganInsights::from_results(&last.organ_results);
    let zone_before = Zone::from_self_distance(before.self_distance);
    let zone_after = Zone::from_self_distance(after.self_distance);

    let mut v: Vec<f64> = Vec::with_capacity(DIMENSIONS);

    // 0-5: V0 descent summary.
    v.push(first.v0);
    v.push(last.v0);
    v.push(last.v0 - first.v0);
    v.push(result.cycles_used() as f64 / 5.0);
    v.push(result.kairos_cycle.map(|c| c as f64 / 5.0).unwrap_or(0.0));
    v.push(if result.kairos_cycle.is_some() { 1.0 } else { 0.0 });

    // 6-17: per-organ coherence shift.
    for organ in OrganKind::ALL {
        let before_c = first
            .organ_results
            .iter()
            .find(|r| r.organ == organ)
            .map(|r| r.coherence)
            .unwrap_or(0.0);
        let after_c = last
            .organ_results
            .iter()
            .find(|r| r.organ == organ)
            .map(|r| r.coherence)
            .unwrap_or(0.0);
        v.push(after_c - before_c);
    }

    // 18-29: per-organ lure shift.
    for organ in OrganKind::ALL {
        let before_l = first
            .organ_results
            .iter()
            .find(|r| r.organ == organ)
            .map(|r| r.lure)
            .unwrap_or(0.0);
        let after_l = last
            .organ_results
            .iter()
            .find(|r| r.organ == organ)
            .map(|r| r.lure)
            .unwrap_or(0.0);
        v.push(after_l - before_l);
    }

    // 30-32: polyvagal before/after/transition.
    let polyvagal_code = |p: crate::organs::PolyvagalState| -> f64 {
        use crate::organs::PolyvagalState::*;
        match p {
            Ventral => 0.0,
            Sympathetic => 1.0,
            Mixed => 2.0,
            Dorsal => 3.0,
        }
    };
    let pv_before = polyvagal_code(before.polyvagal_state) / 3.0;
    let pv_after = polyvagal_code(after.polyvagal_state) / 3.0;
    v.push(pv_before);
    v.push(pv_after);
    v.push(pv_after - pv_before);

    // 33-35: zone before/after/movement.
    let zb = zone_before.ordinal() as f64 / 4.0;
    let za = zone_after.ordinal() as f64 / 4.0;
    v.push(zb);
    v.push(za);
    v.push(za - zb);

    // 36-41: satisfaction evolution.
    let satisfactions: Vec<f64> = result.occasions.iter().map(|o| o.satisfaction).collect();
    let mean_satisfaction = satisfactions.iter().sum::<f64>() / satisfactions.len() as f64;
    let min_satisfaction = satisfactions.iter().cloned().fold(1.0_f64, f64::min);
    let max_satisfaction = satisfactions.iter().cloned().fold(0.0_f64, f64::max);
    v.push(first.satisfaction);
    v.push(last.satisfaction);
    v.push(last.satisfaction - first.satisfaction);
    v.push(mean_satisfaction);
    v.push(min_satisfaction);
    v.push(max_satisfaction);

    // 42-45: convergence characteristics.
    let convergence_code = match result.convergence_reason {
        crate::concrescence::ConvergenceReason::Kairos => 0.0,
        crate::concrescence::ConvergenceReason::EnergyStable => 1.0,
        crate::concrescence::ConvergenceReason::Crystallization => 2.0,
        crate::concrescence::ConvergenceReason::MaxCycles => 3.0,
    };
    v.push(result.cycles_used() as f64 / 5.0);
    v.push(last.field_coherence);
    v.push(last.morphogenetic_pressure);
    v.push(convergence_code / 3.0);

    // 46-47: urgency shift.
    v.push(urgency_of(&before));
    v.push(urgency_of(&after));

    // 48-51: emission path one-hot.
    v.extend(emission_path.one_hot());

    // 52-59: field-agreement dims.
    v.extend(field_agreement_stats(nexuses, r_matrix));

    // 60-62: self-distance before/after/movement.
    v.push(before.self_distance);
    v.push(after.self_distance);
    v.push(after.self_distance - before.self_distance);

    // 63: mean final-cycle R-matrix coupling among active organs.
    let active_organs: Vec<OrganKind> = last
        .organ_results
        .iter()
        .filter(|r| r.coherence > 0.05)
        .map(|r| r.organ)
        .collect();
    v.push(r_matrix.mean_over_pairs(&active_organs));

    // 64: dominant-part-transition flag.
    v.push(if before.dominant_part != after.dominant_part { 1.0 } else { 0.0 });

    debug_assert_eq!(v.len(), DIMENSIONS);

    TransformationSignature {
        values: l2_normalize(v),
    }
}
