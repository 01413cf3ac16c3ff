//! Emission Generator + Response Assembler (C9, spec.md §4.9).
//!
//! Three strategies selected per top nexus by `emission_readiness`:
//! direct (>= 0.85), fusion (0.70-0.85), learned-fallback (< 0.70),
//! overridden to minimal-holding below 0.50 confidence in Z5 or under a
//! safety breach. Grounded on the teacher's `llm`-collaborator shape for
//! the learned-fallback path; direct/fusion are pure local composition.

pub mod language_model;
pub mod phrases;

use std::time::Duration;

use crate::nexus::{Nexus, SafetyLevel, TherapeuticStance, Zone};
use crate::organs::OrganKind;
use crate::signature::EmissionPath;
use crate::turn_context::{EntityPrehension, TemporalContext};

use language_model::EmissionLanguageModel;
use phrases::Intensity;

/// The assembled emission for one turn (spec.md §6 `TurnResult`
/// "emission_text, emission_confidence, emission_path").
#[derive(Debug, Clone)]
pub struct EmissionOutput {
    pub text: String,
    pub confidence: f64,
    pub path: EmissionPath,
}

/// Pick the nexus to emit from: highest `emission_readiness`, ties
/// broken toward the less intrusive therapeutic stance (spec.md §4.6
/// "witness < attune < hold < validate < ground < minimal").
fn top_nexus<'a>(nexuses: &'a [Nexus], readiness_epsilon: f64) -> Option<&'a Nexus> {
    nexuses.iter().fold(None, |best: Option<&Nexus>, candidate| match best {
        None => Some(candidate),
        Some(current) => {
            let diff = candidate.emission_readiness - current.emission_readiness;
            if diff > readiness_epsilon {
                Some(candidate)
            } else if diff.abs() <= readiness_epsilon
                && candidate.therapeutic_stance < current.therapeutic_stance
            {
                Some(candidate)
            } else {
                Some(current)
            }
        }
    })
}

fn role_order(organ: OrganKind) -> usize {
    match organ {
        OrganKind::Listening => 0,
        OrganKind::Empathy => 1,
        OrganKind::Presence => 2,
        OrganKind::Wisdom => 3,
        OrganKind::Authenticity => 4,
        _ => usize::MAX,
    }
}

/// Compose a fusion emission from up to 3 top nexuses ordered LISTENING
/// -> EMPATHY -> PRESENCE -> WISDOM -> AUTHENTICITY (spec.md §4.9).
fn fusion_text(top: &[&Nexus], intensity: Intensity) -> String {
    let mut ordered: Vec<&Nexus> = top.to_vec();
    ordered.sort_by_key(|n| {
        n.participants
            .iter()
            .map(|o| role_order(*o))
            .min()
            .unwrap_or(usize::MAX)
    });
    ordered.truncate(3);

    let mut role_phrases = Vec::new();
    for nexus in &ordered {
        let role = nexus.participants.iter().find(|o| role_order(**o) != usize::MAX);
        if let Some((action, quality)) = role.and_then(|o| phrases::role_words(*o)) {
            let topic = nexus.atom.replace('_', " ");
            if quality.is_empty() {
                role_phrases.push(format!("{action} {topic}?"));
            } else {
                role_phrases.push(format!("{action} {topic}, {quality}?"));
            }
        } else {
            role_phrases.push(phrases::phrase_for(&nexus.atom, intensity));
        }
    }
    role_phrases.join(" ")
}

/// Build the learned-fallback prompt from the top nexus types, SELF
/// zone, temporal context and entity prehension (spec.md §4.9
/// "...never invent a nexus").
fn learned_prompt(top: &[&Nexus], zone: Zone, temporal: &TemporalContext, entities: &EntityPrehension) -> String {
    let types: Vec<String> = top.iter().map(|n| format!("{:?}", n.nexus_type)).collect();
    let top_entity = entities.top_entity().map(|(e, _)| e).unwrap_or("");
    format!(
        "{}\nRespond with a single short, warm, present-tense sentence. \
         Nexus types observed: {}. SELF zone: {:?}. Time of day: {:?}. \
         Mentioned: {}. Do not invent facts not present in these signals.",
        top.first().map(|n| n.atom.replace('_', " ")).unwrap_or_default(),
        types.join(", "),
        zone,
        temporal.time_of_day,
        top_entity,
    )
}

/// Generate the emission for one turn (spec.md §4.9).
#[allow(clippy::too_many_arguments)]
pub async fn generate(
    nexuses: &[Nexus],
    zone: Zone,
    v0: f64,
    temporal: &TemporalContext,
    entity_prehension: &EntityPrehension,
    language_model: &dyn EmissionLanguageModel,
    timeout: Duration,
    max_tokens: u32,
    readiness_epsilon: f64,
) -> EmissionOutput {
    let Some(top) = top_nexus(nexuses, readiness_epsilon) else {
        return EmissionOutput {
            text: phrases::minimal_holding(0).to_string(),
            confidence: 0.0,
            path: EmissionPath::Minimal,
        };
    };

    let readiness = top.emission_readiness;
    let severe = zone == Zone::Z5ExileCollapse || top.safety_level == SafetyLevel::Breach;

    if readiness < 0.50 && severe {
        return EmissionOutput {
            text: phrases::minimal_holding(top.atom.len()).to_string(),
            confidence: readiness,
            path: EmissionPath::Minimal,
        };
    }

    if readiness >= 0.85 {
        let intensity = Intensity::choose(v0, top.safety_level);
        return EmissionOutput {
            text: phrases::phrase_for(&top.atom, intensity),
            confidence: readiness,
            path: EmissionPath::Direct,
        };
    }

    if readiness >= 0.70 {
        let mut ranked: Vec<&Nexus> = nexuses.iter().collect();
        ranked.sort_by(|a, b| b.emission_readiness.total_cmp(&a.emission_readiness));
        ranked.truncate(3);
        let intensity = Intensity::choose(v0, top.safety_level);
        return EmissionOutput {
            text: fusion_text(&ranked, intensity),
            confidence: readiness,
            path: EmissionPath::Fusion,
        };
    }

    let mut ranked: Vec<&Nexus> = nexuses.iter().collect();
    ranked.sort_by(|a, b| b.emission_readiness.total_cmp(&a.emission_readiness));
    ranked.truncate(3);
    let prompt = learned_prompt(&ranked, zone, temporal, entity_prehension);

    match language_model.generate(&prompt, max_tokens, timeout).await {
        Ok(text) if !text.trim().is_empty() => EmissionOutput {
            text,
            confidence: readiness,
            path: EmissionPath::Learned,
        },
        _ => {
            tracing::warn!("learned-fallback emission degraded to minimal-holding");
            EmissionOutput {
                text: phrases::minimal_holding(top.atom.len()).to_string(),
                confidence: readiness,
                path: EmissionPath::Minimal,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nexus::{ModulationDirection, NexusCategory, NexusType};
    use language_model::DeterministicEmissionLanguageModel;

    fn nexus(atom: &str, readiness: f64, stance: TherapeuticStance, safety: SafetyLevel) -> Nexus {
        Nexus {
            atom: atom.to_string(),
            participants: vec![OrganKind::Empathy, OrganKind::Bond],
            activations: vec![(OrganKind::Empathy, 0.8), (OrganKind::Bond, 0.8)],
            intersection_strength: 0.5,
            agreement: 0.9,
            field_strength: 0.8,
            r_matrix_weight: 0.1,
            emission_readiness: readiness,
            nexus_type: NexusType::Relational,
            nexus_category: NexusCategory::Constitutional,
            self_distance_influence: 0.0,
            modulation_direction: ModulationDirection::Neutral,
            therapeutic_stance: stance,
            safety_level: safety,
            classification_confidence: 0.8,
            co_activation: false,
        }
    }

    fn entities() -> EntityPrehension {
        EntityPrehension::default()
    }

    fn temporal() -> TemporalContext {
        TemporalContext::from_timestamp(chrono::Utc::now())
    }

    #[tokio::test]
    async fn high_readiness_emits_direct() {
        let nexuses = vec![nexus("fierce_holding", 0.9, TherapeuticStance::Witness, SafetyLevel::Safe)];
        let model = DeterministicEmissionLanguageModel;
        let out = generate(
            &nexuses,
            Zone::Z2InnerRelational,
            0.8,
            &temporal(),
            &entities(),
            &model,
            Duration::from_secs(1),
            64,
            0.02,
        )
        .await;
        assert_eq!(out.path, EmissionPath::Direct);
    }

    #[tokio::test]
    async fn mid_readiness_emits_fusion() {
        let nexuses = vec![nexus("grief", 0.75, TherapeuticStance::Attune, SafetyLevel::Safe)];
        let model = DeterministicEmissionLanguageModel;
        let out = generate(
            &nexuses,
            Zone::Z2InnerRelational,
            0.6,
            &temporal(),
            &entities(),
            &model,
            Duration::from_secs(1),
            64,
            0.02,
        )
        .await;
        assert_eq!(out.path, EmissionPath::Fusion);
    }

    #[tokio::test]
    async fn low_readiness_queries_language_model() {
        let nexuses = vec![nexus("grief", 0.6, TherapeuticStance::Attune, SafetyLevel::Safe)];
        let model = DeterministicEmissionLanguageModel;
        let out = generate(
            &nexuses,
            Zone::Z2InnerRelational,
            0.6,
            &temporal(),
            &entities(),
            &model,
            Duration::from_secs(1),
            64,
            0.02,
        )
        .await;
        assert_eq!(out.path, EmissionPath::Learned);
    }

    #[tokio::test]
    async fn low_readiness_in_exile_zone_is_minimal() {
        let nexuses = vec![nexus("collapse_risk", 0.3, TherapeuticStance::Ground, SafetyLevel::Breach)];
        let model = DeterministicEmissionLanguageModel;
        let out = generate(
            &nexuses,
            Zone::Z5ExileCollapse,
            0.9,
            &temporal(),
            &entities(),
            &model,
            Duration::from_secs(1),
            64,
            0.02,
        )
        .await;
        assert_eq!(out.path, EmissionPath::Minimal);
    }

    #[tokio::test]
    async fn no_nexuses_is_minimal() {
        let model = DeterministicEmissionLanguageModel;
        let out = generate(
            &[],
            Zone::Z1CoreSelf,
            1.0,
            &temporal(),
            &entities(),
            &model,
            Duration::from_secs(1),
            64,
            0.02,
        )
        .await;
        assert_eq!(out.path, EmissionPath::Minimal);
    }
}
