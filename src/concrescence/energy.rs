//! The V0 energy update `E(t)` (spec.md §4.5).
//!
//! `E(t) = alpha*(1-S) + beta*delta_E + gamma*(1-A) + delta*(1-R) +
//! zeta*phi(I) + eta*L`. Each term and the morphogenetic-pressure/salience
//! function `phi(I)` are pure functions of the current cycle's readings,
//! so the whole update is independently testable away from the loop
//! driver.

use crate::config::EnergyWeights;
use crate::field::SemanticField;
use crate::learning::RMatrix;
use crate::organs::{OrganDetail, OrganResult};

/// Morphogenetic pressure `phi(I)`: how insistently the input is pressing
/// for resolution, derived from the strongest atom activation this cycle
/// and NDAM's urgency reading (spec.md §4.5, §4.8 crystallization
/// trigger).
pub fn morphogenetic_pressure(fields: &[SemanticField], results: &[OrganResult]) -> f64 {
    let max_activation = fields
        .iter()
        .flat_map(|f| f.activations.values())
        .cloned()
        .fold(0.0_f64, f64::max);
    let urgency = results
        .iter()
        .find_map(|r| match r.detail {
            OrganDetail::Ndam { urgency_level } => Some(urgency_level),
            _ => None,
        })
        .unwrap_or(0.0);
    (0.6 * max_activation + 0.4 * urgency).clamp(0.0, 1.0)
}

/// Per-cycle satisfaction estimate used internally to drive `S` in `E(t)`:
/// a blend of field coherence and closeness to the kairos window's
/// center, since a turn that is both coherent and near-ripe is "going
/// well" even before any emission is produced.
pub fn occasion_satisfaction(field_coherence: f64, v0: f64, kairos_window: (f64, f64)) -> f64 {
    let center = (kairos_window.0 + kairos_window.1) / 2.0;
    let half_width = (kairos_window.1 - kairos_window.0) / 2.0;
    let proximity = if half_width <= 0.0 {
        0.0
    } else {
        (1.0 - (v0 - center).abs() / (0.5_f64.max(half_width))).clamp(0.0, 1.0)
    };
    (0.5 * field_coherence + 0.5 * proximity).clamp(0.0, 1.0)
}

/// `E(t)`: the amount V0 descends this cycle.
#[allow(clippy::too_many_arguments)]
pub fn energy_delta(
    weights: &EnergyWeights,
    mean_satisfaction_so_far: f64,
    prior_v0_delta: f64,
    field_agreement: f64,
    r_weighted_coherence: f64,
    morphogenetic_pressure: f64,
    r_weighted_lure: f64,
) -> f64 {
    let e = weights.alpha * (1.0 - mean_satisfaction_so_far)
        + weights.beta * prior_v0_delta
        + weights.gamma * (1.0 - field_agreement)
        + weights.delta * (1.0 - r_weighted_coherence)
        + weights.zeta * morphogenetic_pressure
        + weights.eta * r_weighted_lure;
    e.clamp(0.0, 1.0)
}

/// Mean coherence across every organ, including dormant ones as zero: how
/// much of anything the organism is actually attending to this cycle.
fn engagement(results: &[OrganResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.coherence).sum::<f64>() / results.len() as f64
}

/// Convenience wrapper pulling the R-matrix-weighted coherence/lure terms
/// directly from one cycle's organ results.
///
/// The field-agreement and R-weighted-coherence deficiency terms (`1-A`,
/// `1-R` in `energy_delta`) are scaled by `engagement` before being
/// folded in: with every organ silent, `A=1` and `R=0` is a degenerate
/// "agreement" reading (twelve zeros trivially agree with each other),
/// not evidence the turn should dissolve V0 toward kairos. Scaling both
/// deficiency terms down in proportion to how little the organs are
/// actually attending prevents a turn with no organ engagement at all
/// from manufacturing V0 descent it hasn't earned (spec.md §8 boundary
/// 9); a fully-engaged cycle (`engagement = 1`) recovers the formula
/// exactly as specified.
pub fn energy_delta_for_cycle(
    weights: &EnergyWeights,
    mean_satisfaction_so_far: f64,
    prior_v0_delta: f64,
    field_agreement: f64,
    r_matrix: &RMatrix,
    results: &[OrganResult],
    fields: &[SemanticField],
) -> f64 {
    let engagement = engagement(results);
    let r_weighted_coherence = r_matrix.weighted_coherence(results);
    let r_weighted_lure = r_matrix.weighted_lure(results);
    let pressure = morphogenetic_pressure(fields, results);
    let adjusted_agreement = 1.0 - engagement * (1.0 - field_agreement);
    let adjusted_r_coherence = 1.0 - engagement * (1.0 - r_weighted_coherence);
    energy_delta(
        weights,
        mean_satisfaction_so_far,
        prior_v0_delta,
        adjusted_agreement,
        adjusted_r_coherence,
        pressure,
        r_weighted_lure,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_is_in_unit_range() {
        let weights = EnergyWeights {
            alpha: 0.35,
            beta: 0.10,
            gamma: 0.15,
            delta: 0.10,
            zeta: 0.10,
            eta: 0.20,
        };
        let e = energy_delta(&weights, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0);
        assert!((0.0..=1.0).contains(&e));
    }

    #[test]
    fn perfect_conditions_yield_minimal_energy() {
        let weights = EnergyWeights {
            alpha: 0.35,
            beta: 0.10,
            gamma: 0.15,
            delta: 0.10,
            zeta: 0.10,
            eta: 0.20,
        };
        let e = energy_delta(&weights, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0);
        assert!(e < 0.01);
    }

    #[test]
    fn occasion_satisfaction_peaks_at_kairos_center() {
        let at_center = occasion_satisfaction(1.0, 0.40, (0.30, 0.50));
        let far_away = occasion_satisfaction(1.0, 1.0, (0.30, 0.50));
        assert!(at_center > far_away);
    }

    #[test]
    fn zero_engagement_yields_zero_energy_delta() {
        use crate::learning::RMatrix;
        use crate::organs::{OrganKind, OrganResult};

        let weights = EnergyWeights {
            alpha: 0.35,
            beta: 0.10,
            gamma: 0.15,
            delta: 0.10,
            zeta: 0.10,
            eta: 0.20,
        };
        let results: Vec<OrganResult> = OrganKind::ALL
            .iter()
            .map(|k| OrganResult::neutral(*k, &[]))
            .collect();
        let r_matrix = RMatrix::default();
        let e = energy_delta_for_cycle(&weights, 1.0, 0.0, 1.0, &r_matrix, &results, &[]);
        assert!(e < 1e-9, "e = {e}");
    }
}
