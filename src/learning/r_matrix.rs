//! Hebbian R-Matrix (C10, spec.md §4.10).
//!
//! A symmetric 12x12 coupling matrix over `OrganKind`, initialized to
//! `0.05` off the diagonal and `0.0` on it. Updated at turn end by an
//! outcome-gated Hebbian rule; read-only during a turn's own cycles
//! (spec.md §5). Grounded on `estimation::EstimationLearner`'s EMA-update
//! shape, generalized from one `alpha` per category to one coupling value
//! per organ pair.

use serde::{Deserialize, Serialize};

use crate::config::HebbianConfig;
use crate::error::InvariantViolation;
use crate::organs::{OrganKind, OrganResult};

const N: usize = 12;

/// Outcome gate applied to the Hebbian update (spec.md §4.10): `+1` for a
/// positively-rated/high-satisfaction turn, `-0.5` for a negative/low one,
/// `0` (no update) otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutcomeGate {
    Positive,
    Negative,
    Neutral,
}

impl OutcomeGate {
    pub fn from_satisfaction(satisfaction: f64, user_rated_negative: bool) -> Self {
        if user_rated_negative || satisfaction < 0.35 {
            OutcomeGate::Negative
        } else if satisfaction >= 0.65 {
            OutcomeGate::Positive
        } else {
            OutcomeGate::Neutral
        }
    }

    fn weight(self) -> f64 {
        match self {
            OutcomeGate::Positive => 1.0,
            OutcomeGate::Negative => -0.5,
            OutcomeGate::Neutral => 0.0,
        }
    }
}

/// Symmetric 12x12 organ-coupling matrix (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RMatrix {
    #[serde(with = "matrix_serde")]
    values: [[f64; N]; N],
}

mod matrix_serde {
    use super::N;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(m: &[[f64; N]; N], s: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<Vec<f64>> = m.iter().map(|row| row.to_vec()).collect();
        rows.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[[f64; N]; N], D::Error> {
        let rows: Vec<Vec<f64>> = Vec::deserialize(d)?;
        let mut out = [[0.0; N]; N];
        for (i, row) in rows.into_iter().enumerate().take(N) {
            for (j, v) in row.into_iter().enumerate().take(N) {
                out[i][j] = v;
            }
        }
        Ok(out)
    }
}

impl Default for RMatrix {
    fn default() -> Self {
        let mut values = [[0.05; N]; N];
        for i in 0..N {
            values[i][i] = 0.0;
        }
        Self { values }
    }
}

impl RMatrix {
    pub fn get(&self, a: OrganKind, b: OrganKind) -> f64 {
        self.values[a.index()][b.index()]
    }

    /// Outcome-gated Hebbian update (spec.md §4.10):
    /// `R[i,j] <- R[i,j] + eta*(a_i*a_j - R[i,j])*g`, clipped to `[0,
    /// r_max]`, with symmetry and a zero diagonal enforced afterward.
    /// `eta` may be lowered toward `eta_floor` by the caller when
    /// `std(R) > std_saturation_threshold` for a full epoch (spec.md §9
    /// escape valve); this function always uses whatever `eta` it's given.
    pub fn update(&mut self, results: &[OrganResult], gate: OutcomeGate, config: &HebbianConfig, eta_override: Option<f64>) {
        let eta = eta_override.unwrap_or(config.eta);
        let g = gate.weight();
        if g == 0.0 {
            return;
        }
        let coherence: [f64; N] = {
            let mut c = [0.0; N];
            for r in results {
                c[r.organ.index()] = r.coherence;
            }
            c
        };

        for i in 0..N {
            for j in 0..N {
                if i == j {
                    continue;
                }
                let target = coherence[i] * coherence[j];
                let delta = eta * (target - self.values[i][j]) * g;
                self.values[i][j] = (self.values[i][j] + delta).clamp(0.0, config.r_max);
            }
        }
        self.enforce_symmetry();
    }

    /// Average the two directions of each off-diagonal pair so symmetry
    /// holds exactly despite independent clamping above.
    fn enforce_symmetry(&mut self) {
        for i in 0..N {
            self.values[i][i] = 0.0;
            for j in (i + 1)..N {
                let avg = (self.values[i][j] + self.values[j][i]) / 2.0;
                self.values[i][j] = avg;
                self.values[j][i] = avg;
            }
        }
    }

    /// Standard deviation of the off-diagonal entries (spec.md §9 escape
    /// valve trigger: `std(R) > 0.08`).
    pub fn std_off_diagonal(&self) -> f64 {
        let mut vals = Vec::with_capacity(N * (N - 1));
        for i in 0..N {
            for j in 0..N {
                if i != j {
                    vals.push(self.values[i][j]);
                }
            }
        }
        let mean = vals.iter().sum::<f64>() / vals.len() as f64;
        let variance = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / vals.len() as f64;
        variance.sqrt()
    }

    /// `R-matrix-weighted coherence` term used by the V0 energy update
    /// (spec.md §4.5): mean over all organ pairs of `R[i,j] *
    /// coherence_i * coherence_j`, normalized by the mean pairwise weight
    /// so the result stays in `[0,1]` when coherences do.
    pub fn weighted_coherence(&self, results: &[OrganResult]) -> f64 {
        let mut coherence = [0.0; N];
        for r in results {
            coherence[r.organ.index()] = r.coherence;
        }
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        for i in 0..N {
            for j in (i + 1)..N {
                let w = self.values[i][j];
                weighted_sum += w * coherence[i] * coherence[j];
                weight_sum += w;
            }
        }
        if weight_sum <= 0.0 {
            0.0
        } else {
            (weighted_sum / weight_sum).clamp(0.0, 1.0)
        }
    }

    /// `R-matrix-weighted mean organ lure` (spec.md §4.5 `L` term): each
    /// organ's lure weighted by its row sum in `R` (how coupled it is to
    /// the rest of the organ set).
    pub fn weighted_lure(&self, results: &[OrganResult]) -> f64 {
        let mut lure = [0.0; N];
        for r in results {
            lure[r.organ.index()] = r.lure;
        }
        let row_sums: [f64; N] = {
            let mut s = [0.0; N];
            for i in 0..N {
                s[i] = (0..N).filter(|&j| j != i).map(|j| self.values[i][j]).sum();
            }
            s
        };
        let total_weight: f64 = row_sums.iter().sum();
        if total_weight <= 0.0 {
            lure.iter().sum::<f64>() / N as f64
        } else {
            (0..N).map(|i| lure[i] * row_sums[i]).sum::<f64>() / total_weight
        }
    }

    /// Mean `R[i,j]` over a set of participating organ pairs, used by C6's
    /// `r_matrix_weight` nexus attribute.
    pub fn mean_over_pairs(&self, organs: &[OrganKind]) -> f64 {
        if organs.len() < 2 {
            return 0.0;
        }
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..organs.len() {
            for j in (i + 1)..organs.len() {
                sum += self.get(organs[i], organs[j]);
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Validate the §3 invariants hold; used at persistence round-trip
    /// boundaries and after every update in debug builds.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        for i in 0..N {
            if self.values[i][i] != 0.0 {
                return Err(InvariantViolation::RMatrixOutOfRange {
                    i,
                    j: i,
                    value: self.values[i][i],
                    r_max: 1.0,
                });
            }
            for j in 0..N {
                let v = self.values[i][j];
                if !(0.0..=1.0).contains(&v) {
                    return Err(InvariantViolation::RMatrixOutOfRange { i, j, value: v, r_max: 1.0 });
                }
                if (v - self.values[j][i]).abs() > 1e-9 {
                    return Err(InvariantViolation::RMatrixAsymmetric {
                        i,
                        j,
                        a: v,
                        b: self.values[j][i],
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organs::OrganDetail;
    use std::collections::HashMap;

    fn result(organ: OrganKind, coherence: f64) -> OrganResult {
        OrganResult {
            organ,
            coherence,
            lure: coherence,
            lure_field: HashMap::new(),
            atom_activations: HashMap::new(),
            detail: OrganDetail::None,
        }
    }

    #[test]
    fn default_matrix_is_symmetric_with_zero_diagonal() {
        let m = RMatrix::default();
        m.validate().unwrap();
        assert_eq!(m.get(OrganKind::Empathy, OrganKind::Bond), 0.05);
        assert_eq!(m.get(OrganKind::Bond, OrganKind::Bond), 0.0);
    }

    #[test]
    fn positive_gate_pulls_toward_coactivation() {
        let mut m = RMatrix::default();
        let config = HebbianConfig::default();
        let results: Vec<OrganResult> = OrganKind::ALL
            .iter()
            .map(|k| result(*k, if *k == OrganKind::Empathy || *k == OrganKind::Bond { 1.0 } else { 0.0 }))
            .collect();
        for _ in 0..200 {
            m.update(&results, OutcomeGate::Positive, &config, None);
        }
        m.validate().unwrap();
        assert!(m.get(OrganKind::Empathy, OrganKind::Bond) > 0.9);
    }

    #[test]
    fn neutral_gate_does_not_update() {
        let mut m = RMatrix::default();
        let config = HebbianConfig::default();
        let before = m.get(OrganKind::Empathy, OrganKind::Bond);
        let results: Vec<OrganResult> = OrganKind::ALL.iter().map(|k| result(*k, 1.0)).collect();
        m.update(&results, OutcomeGate::Neutral, &config, None);
        assert_eq!(m.get(OrganKind::Empathy, OrganKind::Bond), before);
    }

    #[test]
    fn weighted_coherence_is_zero_when_all_coherences_zero() {
        let m = RMatrix::default();
        let results: Vec<OrganResult> = OrganKind::ALL.iter().map(|k| result(*k, 0.0)).collect();
        assert_eq!(m.weighted_coherence(&results), 0.0);
    }

    #[test]
    fn serde_round_trip_preserves_values() {
        let mut m = RMatrix::default();
        let config = HebbianConfig::default();
        let results: Vec<OrganResult> = OrganKind::ALL.iter().map(|k| result(*k, 0.7)).collect();
        m.update(&results, OutcomeGate::Positive, &config, None);
        let json = serde_json::to_string(&m).unwrap();
        let back: RMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(m.values, back.values);
    }
}
