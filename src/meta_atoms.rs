//! Meta-Atom Activator (C4).
//!
//! For each meta-atom, if every bridged organ clears the bridge-coherence
//! threshold and contributes at least the minimum atom activation, the
//! meta-atom is added to the fields of all participating organs at the
//! mean of their contributions (spec.md §4.4). Meta-atoms are how shared
//! semantics enter the nexus layer (C6).

use crate::atoms::Catalog;
use crate::config::NexusConfig;
use crate::field::SemanticField;

/// Mutates `fields` in place, adding each satisfied meta-atom's activation
/// to every participating organ's field.
pub fn activate_meta_atoms(fields: &mut [SemanticField], catalog: &Catalog, config: &NexusConfig) {
    for meta in catalog.meta_atoms() {
        let Some(bridges) = meta.bridges.as_ref() else {
            continue;
        };

        // An organ "contributes" to a meta-atom via its own atoms whose
        // activation already cleared the minimum; we approximate this
        // with the organ's coherence (bridge gate) and its strongest
        // atom activation (contribution amount), which is the most
        // direct reading of "each organ contributes a minimum atom
        // activation" without requiring meta-atoms to pre-exist in the
        // per-organ catalog data.
        let mut contributions = Vec::with_capacity(bridges.len());
        let mut all_satisfied = true;
        for organ in bridges {
            let Some(field) = fields.iter().find(|f| f.organ == *organ) else {
                all_satisfied = false;
                break;
            };
            if field.coherence < config.bridge_threshold {
                all_satisfied = false;
                break;
            }
            let strongest = field
                .activations
                .values()
                .cloned()
                .fold(0.0_f64, f64::max);
            if strongest < config.bridge_min_contribution {
                all_satisfied = false;
                break;
            }
            contributions.push(strongest);
        }

        if !all_satisfied || contributions.is_empty() {
            continue;
        }

        let mean = contributions.iter().sum::<f64>() / contributions.len() as f64;
        for organ in bridges {
            if let Some(field) = fields.iter_mut().find(|f| f.organ == *organ) {
                field.activations.insert(meta.name.to_string(), mean);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organs::OrganKind;
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
    fn meta_atom_activates_when_all_organs_clear_thresholds() {
        let catalog = Catalog::load().unwrap();
        let config = NexusConfig::default();
        // wise_tenderness bridges {WISDOM, EMPATHY}
        let mut fields = vec![
            field(OrganKind::Wisdom, 0.8, "perspective", 0.6),
            field(OrganKind::Empathy, 0.8, "grief", 0.7),
        ];
        activate_meta_atoms(&mut fields, &catalog, &config);
        for f in &fields {
            assert!(f.activations.contains_key("wise_tenderness"));
        }
    }

    #[test]
    fn meta_atom_does_not_activate_when_one_organ_absent() {
        let catalog = Catalog::load().unwrap();
        let config = NexusConfig::default();
        let mut fields = vec![field(OrganKind::Wisdom, 0.8, "perspective", 0.6)];
        activate_meta_atoms(&mut fields, &catalog, &config);
        assert!(!fields[0].activations.contains_key("wise_tenderness"));
    }
}
