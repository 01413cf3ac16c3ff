//! Nexus Intersection Composer (C6, spec.md §4.6).

use std::collections::BTreeMap;

use crate::config::NexusConfig;
use crate::field::SemanticField;
use crate::learning::RMatrix;
use crate::organs::OrganKind;

use super::{ModulationDirection, Nexus, NexusCategory, NexusType, SafetyLevel, TherapeuticStance};

/// Tiered threshold reduction applied downstream of field coherence `K`
/// (spec.md §4.5 step b / §4.6 step 2): `K >= 0.70` -> 40% reduction,
/// `0.50 <= K < 0.70` -> 20%, otherwise 0%.
pub fn tiered_activation_threshold(base: f64, field_coherence: f64) -> f64 {
    if field_coherence >= 0.70 {
        base * 0.60
    } else if field_coherence >= 0.50 {
        base * 0.80
    } else {
        base
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Compose nexuses from the final cycle's fields, weighted by the current
/// R-matrix snapshot (spec.md §4.6). `nexus_type`/`nexus_category`/
/// `therapeutic_stance`/`safety_level`/`classification_confidence` are
/// left at placeholder values; `classifier::classify` fills them in.
pub fn compose_nexuses(
    fields: &[SemanticField],
    r_matrix: &RMatrix,
    field_coherence: f64,
    coherence_gate: f64,
    config: &NexusConfig,
) -> Vec<Nexus> {
    let threshold = tiered_activation_threshold(config.activation_threshold, field_coherence);

    // atom -> [(organ, activation)]
    let mut by_atom: BTreeMap<&str, Vec<(OrganKind, f64)>> = BTreeMap::new();
    for field in fields {
        for (atom, activation) in &field.activations {
            by_atom.entry(atom.as_str()).or_default().push((field.organ, *activation));
        }
    }

    let mut nexuses = Vec::new();
    for (atom, all_activations) in by_atom {
        let participating: Vec<(OrganKind, f64)> = all_activations
            .iter()
            .filter(|(_, a)| *a >= threshold)
            .cloned()
            .collect();

        if participating.len() < 2 {
            continue;
        }

        let organs: Vec<OrganKind> = participating.iter().map(|(o, _)| *o).collect();
        let activation_values: Vec<f64> = participating.iter().map(|(_, a)| *a).collect();

        let mut strength = 0.0;
        for i in 0..participating.len() {
            for j in (i + 1)..participating.len() {
                let (oi, ai) = participating[i];
                let (oj, aj) = participating[j];
                strength += ai * aj * r_matrix.get(oi, oj);
            }
        }

        let agreement = (1.0 - std_dev(&activation_values)).clamp(0.0, 1.0);
        let field_strength = activation_values.iter().sum::<f64>() / activation_values.len() as f64;
        let r_matrix_weight = r_matrix.mean_over_pairs(&organs);
        let emission_readiness =
            0.4 * strength + 0.3 * agreement + 0.2 * field_strength + 0.1 * coherence_gate;

        // A co-activation nexus: two-or-more organs share an atom above
        // threshold but intersection strength is weak (R-matrix coupling
        // between them hasn't learned yet). Still admitted so sparse
        // nexus formation doesn't collapse to nothing (spec.md §4.6 step
        // 5).
        let co_activation = strength < 0.05;

        nexuses.push(Nexus {
            atom: atom.to_string(),
            participants: organs,
            activations: participating,
            intersection_strength: strength,
            agreement,
            field_strength,
            r_matrix_weight,
            emission_readiness,
            nexus_type: NexusType::Relational,
            nexus_category: NexusCategory::Constitutional,
            self_distance_influence: 0.0,
            modulation_direction: ModulationDirection::Neutral,
            therapeutic_stance: TherapeuticStance::Witness,
            safety_level: SafetyLevel::Safe,
            classification_confidence: 0.0,
            co_activation,
        });
    }

    nexuses.sort_by(|a, b| b.intersection_strength.total_cmp(&a.intersection_strength));
    nexuses.truncate(config.top_k);
    nexuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NexusConfig;
    use std::collections::HashMap;

    fn field(organ: OrganKind, coherence: f64, atom: &str, activation: f64) -> SemanticField {
        let mut activations = HashMap::new();
        activations.insert(atom.to_string(), activation);
        SemanticField {
            organ,
            coherence,
            lure: 0.5,
            lure_field: HashMap::new(),
            activations,
        }
    }

    #[test]
    fn no_nexus_with_single_participant() {
        let fields = vec![field(OrganKind::Empathy, 0.8, "grief", 0.9)];
        let r = RMatrix::default();
        let config = NexusConfig::default();
        let nexuses = compose_nexuses(&fields, &r, 0.5, 1.0, &config);
        assert!(nexuses.is_empty());
    }

    #[test]
    fn two_organs_sharing_an_atom_form_a_nexus() {
        let fields = vec![
            field(OrganKind::Empathy, 0.9, "grief", 0.9),
            field(OrganKind::Bond, 0.9, "grief", 0.85),
        ];
        let r = RMatrix::default();
        let config = NexusConfig::default();
        let nexuses = compose_nexuses(&fields, &r, 0.5, 1.0, &config);
        assert_eq!(nexuses.len(), 1);
        assert_eq!(nexuses[0].participants.len(), 2);
        assert!(nexuses[0].agreement > 0.9);
    }

    #[test]
    fn identical_full_activation_across_all_organs_yields_perfect_agreement() {
        let fields: Vec<SemanticField> = OrganKind::ALL
            .iter()
            .map(|k| field(*k, 1.0, "shared", 1.0))
            .collect();
        let r = RMatrix::default();
        let config = NexusConfig::default();
        let nexuses = compose_nexuses(&fields, &r, 1.0, 1.0, &config);
        assert_eq!(nexuses.len(), 1);
        assert!((nexuses[0].agreement - 1.0).abs() < 1e-9);
        assert_eq!(nexuses[0].participants.len(), 12);
    }

    #[test]
    fn tiered_threshold_reduces_with_high_field_coherence() {
        let base = 0.30;
        assert!((tiered_activation_threshold(base, 0.9) - 0.18).abs() < 1e-9);
        assert!((tiered_activation_threshold(base, 0.6) - 0.24).abs() < 1e-9);
        assert!((tiered_activation_threshold(base, 0.2) - 0.30).abs() < 1e-9);
    }
}
