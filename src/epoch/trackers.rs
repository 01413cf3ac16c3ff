//! The six epoch-learning trackers (spec.md §4.13 (i)-(vi)).
//!
//! Each tracker is a durable, EMA-aggregated JSON structure, safe to
//! absent data (a fresh tracker starts empty and degrades gracefully
//! rather than requiring warm state). Grounded on
//! `estimation::EstimationLearner`'s EMA-update shape, one instance per
//! concern instead of one per estimate category.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::organs::{OrganKind, PolyvagalState};

const N: usize = 12;

fn ema_update_slice(slice: &mut [f64; N], results_coherence: &[f64; N], alpha: f64) {
    for i in 0..N {
        slice[i] = (1.0 - alpha) * slice[i] + alpha * results_coherence[i];
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// (i) word -> organ activation EMA (spec.md §4.13 (i)).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordOccasionTracker {
    words: HashMap<String, [f64; N]>,
    alpha: f64,
}

impl WordOccasionTracker {
    pub fn new(alpha: f64) -> Self {
        Self { words: HashMap::new(), alpha }
    }

    pub fn observe(&mut self, word: &str, coherence: &[f64; N]) {
        let entry = self.words.entry(word.to_lowercase()).or_insert([0.0; N]);
        ema_update_slice(entry, coherence, self.alpha);
    }

    pub fn profile_for(&self, word: &str) -> Option<&[f64; N]> {
        self.words.get(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Coarse urgency bucket for the cycle-convergence tracker's keying
/// (spec.md §4.13 (ii) "per polyvagal x urgency bucket").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyBucket {
    Low,
    Medium,
    High,
}

impl UrgencyBucket {
    pub fn from_urgency(urgency: f64) -> Self {
        if urgency < 0.35 {
            UrgencyBucket::Low
        } else if urgency < 0.7 {
            UrgencyBucket::Medium
        } else {
            UrgencyBucket::High
        }
    }
}

/// (ii) mean cycles-to-kairos per `(polyvagal, urgency)` bucket
/// (spec.md §4.13 (ii)).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleConvergenceTracker {
    #[serde(with = "bucket_map_serde")]
    buckets: HashMap<(PolyvagalState, UrgencyBucket), (f64, u64)>,
}

mod bucket_map_serde {
    use super::{PolyvagalState, UrgencyBucket};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(
        m: &HashMap<(PolyvagalState, UrgencyBucket), (f64, u64)>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        let entries: Vec<(PolyvagalState, UrgencyBucket, f64, u64)> =
            m.iter().map(|((p, u), (mean, count))| (*p, *u, *mean, *count)).collect();
        entries.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<HashMap<(PolyvagalState, UrgencyBucket), (f64, u64)>, D::Error> {
        let entries = Vec::<(PolyvagalState, UrgencyBucket, f64, u64)>::deserialize(d)?;
        Ok(entries.into_iter().map(|(p, u, mean, count)| ((p, u), (mean, count))).collect())
    }
}

impl CycleConvergenceTracker {
    pub fn observe(&mut self, polyvagal: PolyvagalState, urgency: f64, cycles_used: u32) {
        let key = (polyvagal, UrgencyBucket::from_urgency(urgency));
        let entry = self.buckets.entry(key).or_insert((0.0, 0));
        let (mean, count) = entry;
        *count += 1;
        *mean += (cycles_used as f64 - *mean) / *count as f64;
    }

    pub fn mean_cycles(&self, polyvagal: PolyvagalState, urgency: f64) -> Option<f64> {
        self.buckets
            .get(&(polyvagal, UrgencyBucket::from_urgency(urgency)))
            .map(|(mean, _)| *mean)
    }
}

/// (iii) pass/fail counts per named gate, with bottleneck identification
/// (spec.md §4.13 (iii)).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateCascadeTracker {
    gates: HashMap<String, (u64, u64)>,
}

impl GateCascadeTracker {
    pub fn observe(&mut self, gate_name: &str, passed: bool) {
        let entry = self.gates.entry(gate_name.to_string()).or_insert((0, 0));
        if passed {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }

    pub fn pass_rate(&self, gate_name: &str) -> Option<f64> {
        self.gates.get(gate_name).map(|(pass, fail)| {
            let total = pass + fail;
            if total == 0 {
                1.0
            } else {
                *pass as f64 / total as f64
            }
        })
    }

    /// The gate with the lowest pass rate, the cascade's bottleneck.
    pub fn bottleneck(&self) -> Option<&str> {
        self.gates
            .keys()
            .filter_map(|name| self.pass_rate(name).map(|rate| (name.as_str(), rate)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(name, _)| name)
    }
}

/// (iv) NEXUS-vs-fallback decision log (spec.md §4.13 (iv)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NexusFallbackTracker {
    nexus_used: u64,
    fallback_used: u64,
    accuracy_ema: f64,
    processing_time_ema_ms: f64,
    alpha: f64,
}

impl NexusFallbackTracker {
    pub fn new(alpha: f64) -> Self {
        Self {
            nexus_used: 0,
            fallback_used: 0,
            accuracy_ema: 0.5,
            processing_time_ema_ms: 0.0,
            alpha,
        }
    }

    pub fn observe(&mut self, used_nexus: bool, satisfaction: f64, processing_time_ms: f64) {
        if used_nexus {
            self.nexus_used += 1;
        } else {
            self.fallback_used += 1;
        }
        self.accuracy_ema = (1.0 - self.alpha) * self.accuracy_ema + self.alpha * satisfaction;
        self.processing_time_ema_ms =
            (1.0 - self.alpha) * self.processing_time_ema_ms + self.alpha * processing_time_ms;
    }

    pub fn usage_rate(&self) -> f64 {
        let total = self.nexus_used + self.fallback_used;
        if total == 0 {
            0.0
        } else {
            self.nexus_used as f64 / total as f64
        }
    }

    /// Target usage rate is >= 0.80 (spec.md §4.13 (iv)).
    pub fn meets_target(&self) -> bool {
        self.usage_rate() >= 0.80
    }

    pub fn accuracy_ema(&self) -> f64 {
        self.accuracy_ema
    }
}

impl Default for NexusFallbackTracker {
    fn default() -> Self {
        Self::new(0.1)
    }
}

/// (v) left/right 3-neighbor-word -> organ boost EMA (spec.md §4.13
/// (v)). Keyed by `(neighbor_word, signed_offset)` where `offset` in
/// `-3..=-1` is left context and `1..=3` is right context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeighborWordTracker {
    #[serde(with = "neighbor_map_serde")]
    neighbors: HashMap<(String, i8), [f64; N]>,
    alpha: f64,
}

mod neighbor_map_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(
        m: &HashMap<(String, i8), [f64; 12]>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        let entries: Vec<(String, i8, Vec<f64>)> =
            m.iter().map(|((w, o), v)| (w.clone(), *o, v.to_vec())).collect();
        entries.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<HashMap<(String, i8), [f64; 12]>, D::Error> {
        let entries = Vec::<(String, i8, Vec<f64>)>::deserialize(d)?;
        Ok(entries
            .into_iter()
            .map(|(w, o, v)| {
                let mut arr = [0.0; 12];
                for (i, x) in v.into_iter().take(12).enumerate() {
                    arr[i] = x;
                }
                ((w, o), arr)
            })
            .collect())
    }
}

impl NeighborWordTracker {
    pub fn new(alpha: f64) -> Self {
        Self { neighbors: HashMap::new(), alpha }
    }

    /// `words` is the turn tokenized in order; `coherence` is this
    /// turn's organ-coherence vector applied uniformly to every word's
    /// neighbors (the organ activation isn't per-word in this model, so
    /// the turn-level reading is the best available signal).
    pub fn observe_turn(&mut self, words: &[&str], coherence: &[f64; N]) {
        for (i, _word) in words.iter().enumerate() {
            for offset in -3i8..=3 {
                if offset == 0 {
                    continue;
                }
                let j = i as i64 + offset as i64;
                if j < 0 || j as usize >= words.len() {
                    continue;
                }
                let neighbor = words[j as usize].to_lowercase();
                let entry = self.neighbors.entry((neighbor, offset)).or_insert([0.0; N]);
                ema_update_slice(entry, coherence, self.alpha);
            }
        }
    }

    pub fn profile_for(&self, word: &str, offset: i8) -> Option<&[f64; N]> {
        self.neighbors.get(&(word.to_lowercase(), offset))
    }
}

/// (vi) per-organ success EMA; healthy differentiation requires `std >=
/// 0.08` (spec.md §4.13 (vi)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganConfidenceTracker {
    success_ema: [f64; N],
    alpha: f64,
}

impl OrganConfidenceTracker {
    pub fn new(alpha: f64) -> Self {
        Self { success_ema: [0.5; N], alpha }
    }

    pub fn observe(&mut self, organ: OrganKind, satisfaction: f64) {
        let idx = organ.index();
        self.success_ema[idx] = (1.0 - self.alpha) * self.success_ema[idx] + self.alpha * satisfaction;
    }

    pub fn success_ema(&self, organ: OrganKind) -> f64 {
        self.success_ema[organ.index()]
    }

    pub fn std(&self) -> f64 {
        std_dev(&self.success_ema)
    }

    /// `true` when organ confidences have differentiated enough to be
    /// useful (spec.md §4.13 (vi) "required std >= 0.08").
    pub fn well_differentiated(&self) -> bool {
        self.std() >= 0.08
    }
}

impl Default for OrganConfidenceTracker {
    fn default() -> Self {
        Self::new(0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_occasion_tracker_ema_updates() {
        let mut tracker = WordOccasionTracker::new(0.2);
        let mut coherence = [0.0; N];
        coherence[OrganKind::Empathy.index()] = 0.8;
        tracker.observe("grief", &coherence);
        tracker.observe("grief", &coherence);
        let profile = tracker.profile_for("grief").unwrap();
        assert!(profile[OrganKind::Empathy.index()] > 0.0);
    }

    #[test]
    fn cycle_convergence_tracks_running_mean() {
        let mut tracker = CycleConvergenceTracker::default();
        tracker.observe(PolyvagalState::Ventral, 0.2, 2);
        tracker.observe(PolyvagalState::Ventral, 0.2, 4);
        let mean = tracker.mean_cycles(PolyvagalState::Ventral, 0.2).unwrap();
        assert!((mean - 3.0).abs() < 1e-9);
    }

    #[test]
    fn gate_cascade_identifies_bottleneck() {
        let mut tracker = GateCascadeTracker::default();
        tracker.observe("safety_gate", true);
        tracker.observe("safety_gate", true);
        tracker.observe("coherence_gate", true);
        tracker.observe("coherence_gate", false);
        assert_eq!(tracker.bottleneck(), Some("coherence_gate"));
    }

    #[test]
    fn nexus_fallback_usage_rate() {
        let mut tracker = NexusFallbackTracker::new(0.2);
        tracker.observe(true, 0.8, 12.0);
        tracker.observe(true, 0.8, 12.0);
        tracker.observe(false, 0.5, 500.0);
        assert!((tracker.usage_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert!(!tracker.meets_target());
    }

    #[test]
    fn organ_confidence_differentiation() {
        let mut tracker = OrganConfidenceTracker::new(0.5);
        tracker.observe(OrganKind::Empathy, 0.95);
        tracker.observe(OrganKind::Ndam, 0.05);
        assert!(tracker.well_differentiated());
    }
}
