//! Family Learner (C11, spec.md §4.11).
//!
//! Clusters turns by their 65-D transformation signatures: cosine
//! similarity against each family's unit-norm centroid, adaptive
//! threshold as the catalog matures, EMA centroid update. Grounded on
//! `estimation::EstimationLearner`'s EMA-update shape (same alpha-driven
//! update, same min-sample gating), generalized from a per-category float
//! to a per-family 65-D centroid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::FamilyConfig;
use crate::signature::TransformationSignature;

/// One recorded member of a family (spec.md §3 "members: ordered list of
/// (turn_id, signature, satisfaction, emission)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub turn_id: String,
    pub signature: Vec<f64>,
    pub satisfaction: f64,
    pub v0_final: f64,
    pub emission: String,
    pub recorded_at: DateTime<Utc>,
}

/// A cluster of transformation signatures sharing a felt-state "shape"
/// (spec.md §3 "Family").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    pub family_id: Uuid,
    pub centroid: Vec<f64>,
    pub members: Vec<FamilyMember>,
    pub mature: bool,
    pub member_count: usize,
    pub mean_satisfaction: f64,
    pub user_id: Option<String>,
}

impl Family {
    fn new(id: Uuid, signature: &TransformationSignature, user_id: Option<String>) -> Self {
        Self {
            family_id: id,
            centroid: signature.values.clone(),
            members: Vec::new(),
            mature: false,
            member_count: 0,
            mean_satisfaction: 0.0,
            user_id,
        }
    }

    fn add_member(&mut self, member: FamilyMember, config: &FamilyConfig) {
        self.members.push(member);
        self.member_count = self.members.len();
        self.mean_satisfaction =
            self.members.iter().map(|m| m.satisfaction).sum::<f64>() / self.member_count as f64;
        self.mature = self.member_count >= config.min_family_size;
    }

    /// Per-family V0 target: mean of members' `V0_final` on successful
    /// turns, consumed by the next turn's concrescence loop (spec.md
    /// §4.11 "surfaces per-family V0 targets").
    pub fn v0_target(&self, success_threshold: f64) -> Option<f64> {
        let successful: Vec<f64> = self
            .members
            .iter()
            .filter(|m| m.satisfaction >= success_threshold)
            .map(|m| m.v0_final)
            .collect();
        if successful.is_empty() {
            None
        } else {
            Some(successful.iter().sum::<f64>() / successful.len() as f64)
        }
    }
}

fn l2_normalize(values: &mut [f64]) {
    let norm: f64 = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 1e-9 {
        for v in values.iter_mut() {
            *v /= norm;
        }
    }
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f64 = a.iter().map(|v| v * v).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|v| v * v).sum::<f64>().sqrt();
    if na <= 0.0 || nb <= 0.0 {
        0.0
    } else {
        (dot / (na * nb)).clamp(-1.0, 1.0)
    }
}

/// Clusters transformation signatures into families, maintaining one
/// EMA centroid per family (spec.md §4.11).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FamilyLearner {
    families: Vec<Family>,
}

impl FamilyLearner {
    pub fn new() -> Self {
        Self { families: Vec::new() }
    }

    pub fn families(&self) -> &[Family] {
        &self.families
    }

    pub fn family(&self, id: Uuid) -> Option<&Family> {
        self.families.iter().find(|f| f.family_id == id)
    }

    /// Adaptive similarity threshold: `0.55` while the catalog is young,
    /// rising to `0.65` then `0.75` as more turns accumulate (spec.md
    /// §4.11 "adaptive 0.55 -> 0.65 -> 0.75 as the catalog matures").
    /// Catalog maturity is read off the total member count across all
    /// families, since that is the only available proxy for "how much
    /// has been learned so far" (recorded in DESIGN.md as an Open
    /// Question resolution).
    pub fn theta_sim(&self, config: &FamilyConfig) -> f64 {
        let total_turns: usize = self.families.iter().map(|f| f.member_count).sum();
        if total_turns < 20 {
            config.theta_sim_start
        } else if total_turns < 100 {
            config.theta_sim_mid
        } else {
            config.theta_sim_mature
        }
    }

    /// Assign this turn's signature to its closest family by cosine
    /// similarity, creating a new family if none clears `theta_sim`.
    /// Returns the assigned family's id.
    pub fn assign(
        &mut self,
        turn_id: String,
        signature: &TransformationSignature,
        satisfaction: f64,
        v0_final: f64,
        emission: String,
        user_id: Option<String>,
        recorded_at: DateTime<Utc>,
        config: &FamilyConfig,
    ) -> Uuid {
        let theta = self.theta_sim(config);
        let closest = self
            .families
            .iter_mut()
            .filter(|f| f.user_id.is_none() || f.user_id == user_id)
            .map(|f| {
                let sim = cosine(&f.centroid, &signature.values);
                (sim, f)
            })
            .max_by(|a, b| a.0.total_cmp(&b.0));

        let member = FamilyMember {
            turn_id,
            signature: signature.values.clone(),
            satisfaction,
            v0_final,
            emission,
            recorded_at,
        };

        if let Some((sim, family)) = closest {
            if sim >= theta {
                let id = family.family_id;
                for (c, s) in family.centroid.iter_mut().zip(&signature.values) {
                    *c = (1.0 - config.centroid_alpha) * *c + config.centroid_alpha * s;
                }
                l2_normalize(&mut family.centroid);
                family.add_member(member, config);
                return id;
            }
        }

        let id = Uuid::new_v4();
        let mut family = Family::new(id, signature, user_id);
        family.add_member(member, config);
        self.families.push(family);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(values: Vec<f64>) -> TransformationSignature {
        let mut v = values;
        l2_normalize(&mut v);
        TransformationSignature { values: v }
    }

    #[test]
    fn first_turn_creates_a_new_family() {
        let mut learner = FamilyLearner::new();
        let config = FamilyConfig::default();
        let s = sig(vec![1.0; 65]);
        let id = learner.assign(
            "t1".into(),
            &s,
            0.8,
            0.4,
            "ok".into(),
            None,
            Utc::now(),
            &config,
        );
        assert_eq!(learner.families().len(), 1);
        assert_eq!(learner.family(id).unwrap().member_count, 1);
        assert!(!learner.family(id).unwrap().mature);
    }

    #[test]
    fn similar_signature_joins_existing_family() {
        let mut learner = FamilyLearner::new();
        let config = FamilyConfig::default();
        let mut base = vec![0.0; 65];
        base[0] = 1.0;
        let s1 = sig(base.clone());
        let id1 = learner.assign("t1".into(), &s1, 0.8, 0.4, "ok".into(), None, Utc::now(), &config);

        let mut near = vec![0.0; 65];
        near[0] = 0.95;
        near[1] = 0.05;
        let s2 = sig(near);
        let id2 = learner.assign("t2".into(), &s2, 0.8, 0.4, "ok".into(), None, Utc::now(), &config);

        assert_eq!(id1, id2);
        assert_eq!(learner.families().len(), 1);
        assert_eq!(learner.family(id1).unwrap().member_count, 2);
    }

    #[test]
    fn dissimilar_signature_creates_new_family() {
        let mut learner = FamilyLearner::new();
        let config = FamilyConfig::default();
        let mut base = vec![0.0; 65];
        base[0] = 1.0;
        learner.assign("t1".into(), &sig(base), 0.8, 0.4, "ok".into(), None, Utc::now(), &config);

        let mut orthogonal = vec![0.0; 65];
        orthogonal[64] = 1.0;
        learner.assign("t2".into(), &sig(orthogonal), 0.8, 0.4, "ok".into(), None, Utc::now(), &config);

        assert_eq!(learner.families().len(), 2);
    }

    #[test]
    fn maturity_at_three_members() {
        let mut learner = FamilyLearner::new();
        let config = FamilyConfig::default();
        let mut base = vec![0.0; 65];
        base[0] = 1.0;
        let mut id = Uuid::nil();
        for i in 0..3 {
            id = learner.assign(
                format!("t{i}"),
                &sig(base.clone()),
                0.8,
                0.4,
                "ok".into(),
                None,
                Utc::now(),
                &config,
            );
        }
        assert!(learner.family(id).unwrap().mature);
    }

    #[test]
    fn v0_target_only_counts_successful_members() {
        let mut family = Family::new(Uuid::new_v4(), &sig(vec![1.0; 65]), None);
        let config = FamilyConfig::default();
        family.add_member(
            FamilyMember {
                turn_id: "a".into(),
                signature: vec![0.0; 65],
                satisfaction: 0.9,
                v0_final: 0.40,
                emission: String::new(),
                recorded_at: Utc::now(),
            },
            &config,
        );
        family.add_member(
            FamilyMember {
                turn_id: "b".into(),
                signature: vec![0.0; 65],
                satisfaction: 0.1,
                v0_final: 0.90,
                emission: String::new(),
                recorded_at: Utc::now(),
            },
            &config,
        );
        assert_eq!(family.v0_target(0.6), Some(0.40));
    }
}
