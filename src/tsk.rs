//! Transductive Summary Kernel recorder (C14, spec.md §4.14).
//!
//! Writes one immutable per-turn record under
//! `tsk_records/<user_id>/<turn_id>.json`, holding everything needed to
//! reconstruct the V0 descent (spec.md §4.5) and family-assignment
//! (spec.md §4.11) computations for audit or offline learning. Storage is
//! append-only: a record is never rewritten once written. A recording
//! failure is logged and swallowed; it must never retract or corrupt the
//! emission already returned for the turn (spec.md §4.14). Grounded on
//! `history::store::JobEventRecord`'s flat append-only-event shape,
//! adapted from a Postgres row to a standalone JSON file.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::concrescence::ConcrescenceResult;
use crate::emission::EmissionOutput;
use crate::nexus::{Nexus, Zone};
use crate::signature::EmissionPath;

/// The durable per-turn record (spec.md §4.14, §3 "TSK").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TskRecord {
    pub turn_id: Uuid,
    pub user_id: String,
    pub recorded_at: DateTime<Utc>,
    pub input_text: String,
    pub emission_text: String,
    pub emission_confidence: f64,
    pub emission_path: EmissionPath,
    pub concrescence: ConcrescenceResult,
    pub nexuses: Vec<Nexus>,
    pub zone: Zone,
    pub signature: Vec<f64>,
    pub family_id: Option<Uuid>,
    pub user_satisfaction: Option<f64>,
    pub used_nexus: bool,
    pub processing_time_ms: u64,
}

impl TskRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        turn_id: Uuid,
        user_id: String,
        recorded_at: DateTime<Utc>,
        input_text: String,
        emission: &EmissionOutput,
        concrescence: ConcrescenceResult,
        nexuses: Vec<Nexus>,
        zone: Zone,
        signature: Vec<f64>,
        family_id: Option<Uuid>,
        user_satisfaction: Option<f64>,
        processing_time_ms: u64,
    ) -> Self {
        let used_nexus = !nexuses.is_empty() && emission.path != EmissionPath::Learned;
        Self {
            turn_id,
            user_id,
            recorded_at,
            input_text,
            emission_text: emission.text.clone(),
            emission_confidence: emission.confidence,
            emission_path: emission.path,
            concrescence,
            nexuses,
            zone,
            signature,
            family_id,
            user_satisfaction,
            used_nexus,
            processing_time_ms,
        }
    }
}

/// Writes `TskRecord`s to `state_dir/tsk_records/<user_id>/<turn_id>.json`.
pub struct TskRecorder {
    state_dir: PathBuf,
}

impl TskRecorder {
    pub fn new(state_dir: PathBuf) -> Self {
        Self { state_dir }
    }

    fn path_for(&self, record: &TskRecord) -> PathBuf {
        self.state_dir
            .join("tsk_records")
            .join(&record.user_id)
            .join(format!("{}.json", record.turn_id))
    }

    /// Append one record. Never returns an error to the caller: a failed
    /// write is logged and swallowed (spec.md §4.14 "Recording failure is
    /// non-fatal and must never corrupt the emission").
    pub async fn record(&self, record: &TskRecord) {
        let path = self.path_for(record);
        if let Err(error) = self.try_record(&path, record).await {
            tracing::warn!(turn_id = %record.turn_id, user_id = %record.user_id, %error, "TSK record write failed");
        }
    }

    async fn try_record(&self, path: &std::path::Path, record: &TskRecord) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(path, json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concrescence::{ConvergenceReason, Occasion, SubjectiveAim};

    fn sample_concrescence() -> ConcrescenceResult {
        ConcrescenceResult {
            occasions: vec![Occasion {
                cycle: 1,
                organ_results: Vec::new(),
                fields: Vec::new(),
                v0: 0.4,
                field_coherence: 0.5,
                morphogenetic_pressure: 0.1,
                satisfaction: 0.6,
                kairos_detected: true,
                subjective_aim: SubjectiveAim {
                    lure_direction: None,
                    intensity: 0.0,
                    coherence_target: 0.5,
                    satisfaction_goal: 0.6,
                    ethical_weight: 0.5,
                    safety_constrained: false,
                },
            }],
            convergence_reason: ConvergenceReason::Kairos,
            kairos_cycle: Some(1),
        }
    }

    #[tokio::test]
    async fn record_is_written_under_user_directory() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = TskRecorder::new(dir.path().to_path_buf());
        let emission = EmissionOutput {
            text: "I'm here with you.".to_string(),
            confidence: 0.9,
            path: EmissionPath::Direct,
        };
        let record = TskRecord::new(
            Uuid::new_v4(),
            "user-1".to_string(),
            Utc::now(),
            "I feel overwhelmed".to_string(),
            &emission,
            sample_concrescence(),
            Vec::new(),
            Zone::Z2InnerRelational,
            vec![0.1; 65],
            None,
            Some(0.8),
            12,
        );
        recorder.record(&record).await;

        let path = dir.path().join("tsk_records").join("user-1").join(format!("{}.json", record.turn_id));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn recording_to_an_unwritable_path_does_not_panic() {
        let recorder = TskRecorder::new(PathBuf::from("/proc/__dae_hyphae_tsk_unwritable__"));
        let emission = EmissionOutput {
            text: "hi".to_string(),
            confidence: 0.5,
            path: EmissionPath::Minimal,
        };
        let record = TskRecord::new(
            Uuid::new_v4(),
            "user-2".to_string(),
            Utc::now(),
            "text".to_string(),
            &emission,
            sample_concrescence(),
            Vec::new(),
            Zone::Z1CoreSelf,
            vec![0.0; 65],
            None,
            None,
            1,
        );
        recorder.record(&record).await;
    }
}
