//! Shared per-turn context types (spec.md §6 "Context recognized options").
//!
//! These are read-only inputs threaded through prehension, concrescence and
//! emission; none of them are mutated mid-turn.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Coarse time-of-day bucket, supplied or derived from `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

/// Temporal context for the turn (spec.md §6 `temporal`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalContext {
    pub timestamp: DateTime<Utc>,
    pub time_of_day: TimeOfDay,
    pub is_weekend: bool,
    pub is_work_hours: bool,
}

impl TemporalContext {
    pub fn from_timestamp(timestamp: DateTime<Utc>) -> Self {
        let weekday = timestamp.weekday();
        let hour = timestamp.hour();
        Self {
            timestamp,
            time_of_day: TimeOfDay::from_hour(hour),
            is_weekend: matches!(weekday, chrono::Weekday::Sat | chrono::Weekday::Sun),
            is_work_hours: !matches!(weekday, chrono::Weekday::Sat | chrono::Weekday::Sun)
                && (9..18).contains(&hour),
        }
    }
}

/// A single named gate's pass/fail outcome (spec.md §6 `gate_results`,
/// §4.13 gate-cascade quality tracker).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub gate_name: String,
    pub passed: bool,
    pub detail: Option<String>,
}

/// A word and the organ it was observed to activate, supplied by the
/// external entity/memory prehension collaborator (spec.md §6
/// `word_occasions`, §4.13 tracker (i)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordOccasion {
    pub word: String,
    pub organ: String,
}

/// Pre-emission entity prehension: entities extracted from the current
/// turn plus whatever the external entity/memory collaborator resolved
/// about them (spec.md §6 `current_turn_entities`, `entity_prehension`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityPrehension {
    /// Entity value -> confidence that it is relevant to this turn.
    pub current_turn_entities: HashMap<String, f64>,
    /// Entity value -> free-form structured context resolved externally
    /// (e.g. from a knowledge/graph store). Absent entries degrade
    /// gracefully (spec.md §6).
    pub resolved_context: HashMap<String, serde_json::Value>,
}

impl EntityPrehension {
    pub fn is_empty(&self) -> bool {
        self.current_turn_entities.is_empty()
    }

    pub fn top_entity(&self) -> Option<(&str, f64)> {
        self.current_turn_entities
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, v)| (k.as_str(), *v))
    }
}

/// The full set of optional context fields a caller of `process_turn` may
/// supply (spec.md §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnContextInput {
    pub conversation_id: Option<String>,
    pub turn_number: Option<u64>,
    pub entity_prehension: Option<EntityPrehension>,
    pub temporal: Option<TemporalContext>,
    pub nexus_extraction_used: Option<bool>,
    pub word_occasions: Option<Vec<WordOccasion>>,
    pub gate_results: Option<Vec<GateResult>>,
    pub epoch_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn time_of_day_buckets() {
        assert_eq!(TimeOfDay::from_hour(8), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(14), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(19), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(2), TimeOfDay::Night);
    }

    #[test]
    fn temporal_context_from_known_weekday() {
        // 2026-07-27 is a Monday.
        let ts = Utc.with_ymd_and_hms(2026, 7, 27, 10, 0, 0).unwrap();
        let ctx = TemporalContext::from_timestamp(ts);
        assert!(!ctx.is_weekend);
        assert!(ctx.is_work_hours);
    }
}
