//! Entity-Organ Tracker (C12, spec.md §4.12).
//!
//! Per `(user_id, entity_value)`, an EMA profile of which organs that
//! entity tends to activate and what felt state tends to accompany it.
//! Grounded on `estimation::EstimationLearner`'s EMA-update shape, same
//! alpha-driven update applied per-organ instead of per-category.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EntityTrackerConfig;
use crate::organs::{OrganKind, OrganResult};

/// One entity's learned organ-activation profile and typical felt state
/// (spec.md §3/§4.12).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityOrganAssociation {
    pub entity_value: String,
    pub user_id: String,
    /// EMA organ-coherence boost, indexed by `OrganKind::index()`.
    pub organ_boost: [f64; 12],
    pub typical_polyvagal: f64,
    pub typical_self_distance: f64,
    pub typical_urgency: f64,
    pub typical_v0: f64,
    pub mention_count: u64,
    pub success_count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub co_mentions: HashMap<String, u64>,
}

impl EntityOrganAssociation {
    fn new(entity_value: String, user_id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            entity_value,
            user_id,
            organ_boost: [0.0; 12],
            typical_polyvagal: 0.0,
            typical_self_distance: 0.20,
            typical_urgency: 0.0,
            typical_v0: 1.0,
            mention_count: 0,
            success_count: 0,
            first_seen: timestamp,
            last_seen: timestamp,
            co_mentions: HashMap::new(),
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.mention_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.mention_count as f64
        }
    }

    fn ema_update(
        &mut self,
        results: &[OrganResult],
        polyvagal_code: f64,
        self_distance: f64,
        urgency: f64,
        v0_final: f64,
        satisfaction: f64,
        success_threshold: f64,
        timestamp: DateTime<Utc>,
        alpha: f64,
    ) {
        for r in results {
            let idx = r.organ.index();
            self.organ_boost[idx] = (1.0 - alpha) * self.organ_boost[idx] + alpha * r.coherence;
        }
        self.typical_polyvagal = (1.0 - alpha) * self.typical_polyvagal + alpha * polyvagal_code;
        self.typical_self_distance = (1.0 - alpha) * self.typical_self_distance + alpha * self_distance;
        self.typical_urgency = (1.0 - alpha) * self.typical_urgency + alpha * urgency;
        self.typical_v0 = (1.0 - alpha) * self.typical_v0 + alpha * v0_final;
        self.mention_count += 1;
        if satisfaction >= success_threshold {
            self.success_count += 1;
        }
        self.last_seen = timestamp;
    }
}

/// Tracks entity-organ associations across turns, keyed by `(user_id,
/// entity_value)` (spec.md §4.12).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityTracker {
    associations: HashMap<(String, String), EntityOrganAssociation>,
}

impl EntityTracker {
    pub fn new() -> Self {
        Self { associations: HashMap::new() }
    }

    pub fn get(&self, user_id: &str, entity_value: &str) -> Option<&EntityOrganAssociation> {
        self.associations.get(&(user_id.to_string(), entity_value.to_string()))
    }

    /// Update every entity mentioned this turn (spec.md §4.12 "for each
    /// entity, EMA-update per-organ boost..."). `entities` maps entity
    /// value to this turn's relevance confidence; only entities clearing
    /// a trivial presence bar participate.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        user_id: &str,
        entities: &HashMap<String, f64>,
        results: &[OrganResult],
        polyvagal_code: f64,
        self_distance: f64,
        urgency: f64,
        v0_final: f64,
        satisfaction: f64,
        timestamp: DateTime<Utc>,
        config: &EntityTrackerConfig,
    ) {
        let mentioned: Vec<&String> = entities.iter().filter(|(_, conf)| **conf > 0.0).map(|(k, _)| k).collect();
        for entity_value in &mentioned {
            let key = (user_id.to_string(), (*entity_value).clone());
            let assoc = self
                .associations
                .entry(key)
                .or_insert_with(|| EntityOrganAssociation::new((*entity_value).clone(), user_id.to_string(), timestamp));
            assoc.ema_update(
                results,
                polyvagal_code,
                self_distance,
                urgency,
                v0_final,
                satisfaction,
                config.success_threshold,
                timestamp,
                config.alpha,
            );
            for other in &mentioned {
                if *other != *entity_value {
                    *assoc.co_mentions.entry((*other).clone()).or_insert(0) += 1;
                }
            }
        }
    }

    /// Predict which known entities are relevant to the current turn by
    /// cosine similarity between the current per-organ coherence vector
    /// and each entity's stored organ-boost profile (spec.md §4.12
    /// "pre-emission path... predict relevant entities").
    pub fn predict_relevant_entities(
        &self,
        user_id: &str,
        current_coherence: &[f64; 12],
        top_k: usize,
    ) -> Vec<(String, f64)> {
        let mut scored: Vec<(String, f64)> = self
            .associations
            .values()
            .filter(|a| a.user_id == user_id)
            .map(|a| (a.entity_value.clone(), cosine12(&a.organ_boost, current_coherence)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);
        scored
    }
}

/// Pre-emission per-organ boost for this turn's recognized entities
/// (spec.md §4.12, scenario S6): the confidence-weighted average of each
/// named entity's stored `organ_boost` profile. Entities with no stored
/// history (first mention) contribute nothing. Returns all zeros when
/// `entities` is empty or none are known yet.
pub fn predicted_boost(tracker: &EntityTracker, user_id: &str, entities: &HashMap<String, f64>) -> [f64; 12] {
    let mut sum = [0.0_f64; 12];
    let mut weight_total = 0.0_f64;
    for (entity_value, confidence) in entities {
        if *confidence <= 0.0 {
            continue;
        }
        if let Some(assoc) = tracker.get(user_id, entity_value) {
            for i in 0..12 {
                sum[i] += assoc.organ_boost[i] * confidence;
            }
            weight_total += confidence;
        }
    }
    if weight_total <= 0.0 {
        return [0.0; 12];
    }
    for v in &mut sum {
        *v /= weight_total;
    }
    sum
}

fn cosine12(a: &[f64; 12], b: &[f64; 12]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f64 = a.iter().map(|v| v * v).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|v| v * v).sum::<f64>().sqrt();
    if na <= 0.0 || nb <= 0.0 {
        0.0
    } else {
        (dot / (na * nb)).clamp(-1.0, 1.0)
    }
}

/// Build a `[f64; 12]` coherence vector from one cycle's organ results,
/// indexed by `OrganKind::index()`, for use with `predict_relevant_entities`.
pub fn coherence_vector(results: &[OrganResult]) -> [f64; 12] {
    let mut v = [0.0; 12];
    for r in results {
        v[r.organ.index()] = r.coherence;
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organs::OrganDetail;
    use std::collections::HashMap as Map;

    fn result(organ: OrganKind, coherence: f64) -> OrganResult {
        OrganResult {
            organ,
            coherence,
            lure: 0.5,
            lure_field: Map::new(),
            atom_activations: Map::new(),
            detail: OrganDetail::None,
        }
    }

    #[test]
    fn new_entity_is_created_on_first_mention() {
        let mut tracker = EntityTracker::new();
        let config = EntityTrackerConfig::default();
        let mut entities = HashMap::new();
        entities.insert("mom".to_string(), 0.9);
        let results = vec![result(OrganKind::Empathy, 0.8)];
        tracker.update("u1", &entities, &results, 0.0, 0.2, 0.1, 0.5, 0.8, Utc::now(), &config);
        let assoc = tracker.get("u1", "mom").unwrap();
        assert_eq!(assoc.mention_count, 1);
        assert_eq!(assoc.success_count, 1);
        assert!(assoc.organ_boost[OrganKind::Empathy.index()] > 0.0);
    }

    #[test]
    fn co_mentions_are_recorded() {
        let mut tracker = EntityTracker::new();
        let config = EntityTrackerConfig::default();
        let mut entities = HashMap::new();
        entities.insert("mom".to_string(), 0.9);
        entities.insert("dad".to_string(), 0.7);
        let results = vec![result(OrganKind::Empathy, 0.8)];
        tracker.update("u1", &entities, &results, 0.0, 0.2, 0.1, 0.5, 0.8, Utc::now(), &config);
        let assoc = tracker.get("u1", "mom").unwrap();
        assert_eq!(assoc.co_mentions.get("dad"), Some(&1));
    }

    #[test]
    fn success_rate_tracks_satisfaction_threshold() {
        let mut tracker = EntityTracker::new();
        let config = EntityTrackerConfig::default();
        let mut entities = HashMap::new();
        entities.insert("mom".to_string(), 0.9);
        let results = vec![result(OrganKind::Empathy, 0.8)];
        tracker.update("u1", &entities, &results, 0.0, 0.2, 0.1, 0.5, 0.9, Utc::now(), &config);
        tracker.update("u1", &entities, &results, 0.0, 0.2, 0.1, 0.5, 0.2, Utc::now(), &config);
        let assoc = tracker.get("u1", "mom").unwrap();
        assert_eq!(assoc.mention_count, 2);
        assert!((assoc.success_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn predicted_boost_is_zero_for_unknown_entity() {
        let tracker = EntityTracker::new();
        let mut entities = HashMap::new();
        entities.insert("emma".to_string(), 0.9);
        let boost = predicted_boost(&tracker, "u1", &entities);
        assert_eq!(boost, [0.0; 12]);
    }

    #[test]
    fn predicted_boost_reflects_stored_profile() {
        let mut tracker = EntityTracker::new();
        let config = EntityTrackerConfig::default();
        let mut entities = HashMap::new();
        entities.insert("emma".to_string(), 0.9);
        let results = vec![result(OrganKind::Bond, 0.8), result(OrganKind::Empathy, 0.7)];
        for _ in 0..5 {
            tracker.update("u1", &entities, &results, 0.0, 0.2, 0.1, 0.9, 0.9, Utc::now(), &config);
        }
        let boost = predicted_boost(&tracker, "u1", &entities);
        assert!(boost[OrganKind::Bond.index()] > 0.5);
        assert!(boost[OrganKind::Empathy.index()] > 0.4);
        assert!(boost[OrganKind::Listening.index()].abs() < 1e-9);
    }

    #[test]
    fn prediction_favors_similar_organ_profile() {
        let mut tracker = EntityTracker::new();
        let config = EntityTrackerConfig::default();
        let mut entities = HashMap::new();
        entities.insert("mom".to_string(), 0.9);
        let results = vec![result(OrganKind::Empathy, 0.9)];
        for _ in 0..5 {
            tracker.update("u1", &entities, &results, 0.0, 0.2, 0.1, 0.5, 0.8, Utc::now(), &config);
        }
        let mut current = [0.0; 12];
        current[OrganKind::Empathy.index()] = 0.9;
        let predictions = tracker.predict_relevant_entities("u1", &current, 5);
        assert_eq!(predictions[0].0, "mom");
        assert!(predictions[0].1 > 0.9);
    }
}
