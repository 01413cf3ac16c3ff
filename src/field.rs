//! Semantic Field Extractor (C3).
//!
//! Converts one cycle's organ activations into per-organ semantic fields
//! over atoms (spec.md §4.3). Pure function of the organ results; no
//! external grounding needed beyond the `OrganResult` shape from
//! `crate::organs`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::organs::{OrganKind, OrganResult};

/// Minimum coherence for an organ to contribute a field this cycle.
pub const NEGLIGIBLE_COHERENCE: f64 = 0.05;

/// A per-organ mapping atom -> activation, carrying the organ's coherence
/// and lure as field-level attributes (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticField {
    pub organ: OrganKind,
    pub coherence: f64,
    pub lure: f64,
    /// The organ's lure field, preserved as metadata (spec.md §4.3).
    pub lure_field: HashMap<String, f64>,
    /// Scaled atom activations: `(0.5 + 0.5*lure) * coherence` applied to
    /// each of the organ's detected atom activations.
    pub activations: HashMap<String, f64>,
}

impl SemanticField {
    pub fn activation_of(&self, atom: &str) -> f64 {
        self.activations.get(atom).copied().unwrap_or(0.0)
    }
}

/// Extract one `SemanticField` per organ whose coherence clears
/// `NEGLIGIBLE_COHERENCE`, scaling atom activations per spec.md §4.3.
pub fn extract_fields(results: &[OrganResult]) -> Vec<SemanticField> {
    results
        .iter()
        .filter(|r| r.coherence > NEGLIGIBLE_COHERENCE)
        .map(|r| {
            let scale = (0.5 + 0.5 * r.lure) * r.coherence;
            let activations = r
                .atom_activations
                .iter()
                .map(|(atom, a)| (atom.clone(), (a * scale).clamp(0.0, 1.0)))
                .collect();
            SemanticField {
                organ: r.organ,
                coherence: r.coherence,
                lure: r.lure,
                lure_field: r.lure_field.clone(),
                activations,
            }
        })
        .collect()
}

/// `K = 1 - std(organ_coherences)` across all 12 organs, including the
/// dormant ones as zero (spec.md §4.5 field coherence, "DAE 3.0 std
/// formula").
pub fn field_coherence(results: &[OrganResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let coherences: Vec<f64> = results.iter().map(|r| r.coherence).collect();
    let mean = coherences.iter().sum::<f64>() / coherences.len() as f64;
    let variance =
        coherences.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / coherences.len() as f64;
    (1.0 - variance.sqrt()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organs::OrganResult;

    fn result_with(organ: OrganKind, coherence: f64, lure: f64, atom: &str, activation: f64) -> OrganResult {
        let mut lure_field = HashMap::new();
        lure_field.insert(atom.to_string(), 1.0);
        let mut atom_activations = HashMap::new();
        atom_activations.insert(atom.to_string(), activation);
        OrganResult {
            organ,
            coherence,
            lure,
            lure_field,
            atom_activations,
            detail: crate::organs::OrganDetail::None,
        }
    }

    #[test]
    fn negligible_coherence_organs_are_excluded() {
        let results = vec![
            result_with(OrganKind::Empathy, 0.8, 0.6, "grief", 0.9),
            result_with(OrganKind::Sans, 0.0, 0.0, "settling", 0.0),
        ];
        let fields = extract_fields(&results);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].organ, OrganKind::Empathy);
    }

    #[test]
    fn activation_scaling_matches_formula() {
        let results = vec![result_with(OrganKind::Empathy, 0.8, 0.6, "grief", 1.0)];
        let fields = extract_fields(&results);
        let expected = (0.5 + 0.5 * 0.6) * 0.8;
        assert!((fields[0].activation_of("grief") - expected).abs() < 1e-9);
    }

    #[test]
    fn field_coherence_is_one_when_all_equal() {
        let results = vec![
            result_with(OrganKind::Empathy, 0.5, 0.5, "grief", 0.5),
            result_with(OrganKind::Bond, 0.5, 0.5, "trust", 0.5),
        ];
        assert!((field_coherence(&results) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn field_coherence_drops_with_divergence() {
        let results = vec![
            result_with(OrganKind::Empathy, 1.0, 0.5, "grief", 0.5),
            result_with(OrganKind::Bond, 0.0, 0.5, "trust", 0.5),
        ];
        assert!(field_coherence(&results) < 1.0);
    }
}
