//! Shared pattern/embedding lure computation (spec.md §4.2).
//!
//! Two modes coexist: (a) pattern-based (keyword/regex over atom
//! vocabularies), (b) embedding-based (cosine similarity of a sentence
//! embedding to each atom prototype, softmaxed). When both apply, combine
//! as `0.7*pattern + 0.3*embedding`. Atom activations are the raw,
//! unnormalized per-atom signal, not the (normalized) lure field.

use std::collections::HashMap;

use crate::atoms::Atom;
use crate::embeddings::{cosine_similarity, EmbeddingProvider};

/// One atom's keyword vocabulary for the pattern-based path.
pub struct AtomPattern {
    pub atom: &'static str,
    pub keywords: &'static [&'static str],
}

fn softmax(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return vec![];
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum <= 0.0 {
        let uniform = 1.0 / values.len() as f64;
        vec![uniform; values.len()]
    } else {
        exps.iter().map(|e| e / sum).collect()
    }
}

fn uniform_field(atoms: &[AtomPattern]) -> HashMap<String, f64> {
    let n = atoms.len().max(1) as f64;
    atoms
        .iter()
        .map(|a| (a.atom.to_string(), 1.0 / n))
        .collect()
}

/// Count of distinct keyword matches for each atom, scaled to a raw
/// per-atom activation (not yet normalized into a lure field).
fn pattern_activations(text_lower: &str, atoms: &[AtomPattern]) -> Vec<f64> {
    atoms
        .iter()
        .map(|pat| {
            let hits = pat
                .keywords
                .iter()
                .filter(|kw| text_lower.contains(*kw))
                .count();
            if pat.keywords.is_empty() {
                0.0
            } else {
                (hits as f64 / pat.keywords.len() as f64).min(1.0)
            }
        })
        .collect()
}

/// Compute the lure field and raw atom activations for one organ's fixed
/// atom set, given the input text and (optionally) the organ's atom
/// prototype embeddings from the catalog.
///
/// Returns `(lure_field, atom_activations)`. `lure_field` always sums to 1
/// (spec.md invariant); `atom_activations` are the unnormalized signals
/// that drove it, used downstream by field extraction and nexus
/// intersection rather than by the lure field itself.
pub fn compute_lure_field(
    text: &str,
    organ_atoms: &[Atom],
    patterns: &[AtomPattern],
    embedder: Option<&dyn EmbeddingProvider>,
    embedding_enabled: bool,
) -> (HashMap<String, f64>, HashMap<String, f64>) {
    if patterns.is_empty() || organ_atoms.is_empty() {
        return (HashMap::new(), HashMap::new());
    }

    let text_lower = text.to_lowercase();
    let raw_pattern = pattern_activations(&text_lower, patterns);

    let all_zero = raw_pattern.iter().all(|v| *v == 0.0);
    let pattern_dist = if all_zero {
        vec![1.0 / patterns.len() as f64; patterns.len()]
    } else {
        softmax(&raw_pattern.iter().map(|v| v * 4.0).collect::<Vec<_>>())
    };

    let combined_dist = if embedding_enabled {
        if let Some(embedder) = embedder {
            match embedder.embed(text) {
                Ok(text_vec) => {
                    let sims: Vec<f64> = patterns
                        .iter()
                        .map(|pat| {
                            organ_atoms
                                .iter()
                                .find(|a| a.name == pat.atom)
                                .map(|a| cosine_similarity(&text_vec, &a.prototype))
                                .unwrap_or(0.0)
                        })
                        .collect();
                    let embedding_dist = softmax(&sims.iter().map(|v| v * 4.0).collect::<Vec<_>>());
                    pattern_dist
                        .iter()
                        .zip(embedding_dist.iter())
                        .map(|(p, e)| 0.7 * p + 0.3 * e)
                        .collect()
                }
                Err(_) => pattern_dist.clone(),
            }
        } else {
            pattern_dist.clone()
        }
    } else {
        pattern_dist.clone()
    };

    let norm_sum: f64 = combined_dist.iter().sum();
    let lure_field: HashMap<String, f64> = patterns
        .iter()
        .zip(combined_dist.iter())
        .map(|(pat, v)| (pat.atom.to_string(), v / norm_sum))
        .collect();

    let atom_activations: HashMap<String, f64> = patterns
        .iter()
        .zip(raw_pattern.iter())
        .map(|(pat, v)| (pat.atom.to_string(), *v))
        .collect();

    (lure_field, atom_activations)
}

/// Convenience for organs that found nothing: a uniform field over their
/// own atom set (spec.md §4.2 "non-participation is legal").
pub fn neutral_lure_field(patterns: &[AtomPattern]) -> HashMap<String, f64> {
    uniform_field(patterns)
}

/// Coherence from raw atom activations: zero when nothing matched (legal
/// non-participation), otherwise scaled up from the strongest signal.
pub fn coherence_from_activations(raw: &HashMap<String, f64>) -> f64 {
    let max = raw.values().cloned().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        0.0
    } else {
        (0.25 + 0.75 * max).min(1.0)
    }
}

/// Count how many of `keywords` appear in `text_lower`, returning a
/// coverage ratio in `[0,1]`.
pub fn keyword_coverage(text_lower: &str, keywords: &[&str]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let hits = keywords.iter().filter(|kw| text_lower.contains(*kw)).count();
    (hits as f64 / keywords.len() as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::Catalog;
    use crate::organs::OrganKind;

    const PATTERNS: &[AtomPattern] = &[
        AtomPattern {
            atom: "grief",
            keywords: &["died", "loss", "grief", "mourning"],
        },
        AtomPattern {
            atom: "compassion",
            keywords: &["understand", "care", "compassion"],
        },
    ];

    #[test]
    fn lure_field_always_sums_to_one() {
        let catalog = Catalog::load().unwrap();
        let atoms = catalog.atoms_for(OrganKind::Empathy).to_vec();
        let (field, _) = compute_lure_field("my mom died two months ago", &atoms, PATTERNS, None, false);
        let sum: f64 = field.values().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn matching_text_favors_matching_atom() {
        let catalog = Catalog::load().unwrap();
        let atoms = catalog.atoms_for(OrganKind::Empathy).to_vec();
        let (field, activations) =
            compute_lure_field("my mom died and it's been a loss of grief", &atoms, PATTERNS, None, false);
        assert!(field["grief"] > field["compassion"]);
        assert!(activations["grief"] > 0.0);
    }

    #[test]
    fn no_match_yields_uniform_field() {
        let catalog = Catalog::load().unwrap();
        let atoms = catalog.atoms_for(OrganKind::Empathy).to_vec();
        let (field, _) = compute_lure_field("asdf qwer zxcv", &atoms, PATTERNS, None, false);
        assert!((field["grief"] - 0.5).abs() < 1e-9);
        assert!((field["compassion"] - 0.5).abs() < 1e-9);
    }
}
