//! JSON-backed persistence for learned state (spec.md §5, §6 "Persisted
//! state layout").
//!
//! One JSON file per concern under `state_dir`: single global
//! `r_matrix.json`, `epoch.json` and `family_learner.json` files (family
//! clustering is population-wide per spec.md §4.11, not per user), and one
//! `entities/<user_id>.json` / `felt_state/<user_id>.json` per user. Every
//! write takes an exclusive
//! `fs4` file lock on a sibling `.lock` file so a crashed or concurrent
//! process can never observe a half-written file, and writes land via a
//! temp-file-then-rename so a reader never sees a partial JSON body.
//! Per-user files are additionally serialized in-process with a
//! `dashmap`-backed keyed mutex (spec.md §5 "per-user serialization"), so
//! two turns for the same user id never race the same file even before
//! the filesystem lock is taken; the single R-matrix/epoch/family-learner
//! files share one process-wide lock for the same reason. Grounded on
//! `history::Store`'s
//! single-owner-struct-over-a-backing-store shape, adapted from a
//! Postgres pool to single-writer JSON files.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use fs4::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::epoch::EpochOrchestrator;
use crate::error::StateWriteError;
use crate::learning::entity_tracker::EntityTracker;
use crate::learning::family::FamilyLearner;
use crate::learning::felt_state_carry::FeltStateCarry;
use crate::learning::r_matrix::RMatrix;

/// Single-process handle to the on-disk state tree.
pub struct StateStore {
    state_dir: PathBuf,
    global_lock: Mutex<()>,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl StateStore {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            state_dir,
            global_lock: Mutex::new(()),
            user_locks: DashMap::new(),
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn path_for(&self, relative: &str) -> PathBuf {
        self.state_dir.join(relative)
    }

    /// Read and deserialize `path`, falling back to `T::default()` when
    /// the file is absent or corrupt (spec.md §4.13 trackers "safe to
    /// absent data", generalized to every persisted concern).
    fn read_json<T: DeserializeOwned + Default>(&self, path: &Path) -> T {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|error| {
                tracing::warn!(path = %path.display(), %error, "corrupt state file, starting fresh");
                T::default()
            }),
            Err(_) => T::default(),
        }
    }

    fn write_json_locked<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StateWriteError> {
        let path_str = path.display().to_string();
        let io_err = |e: std::io::Error| StateWriteError::Io {
            path: path_str.clone(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let lock_path = path.with_extension("lock");
        let lock_file = File::create(&lock_path).map_err(io_err)?;
        lock_file
            .lock_exclusive()
            .map_err(|_| StateWriteError::Lock { path: path_str.clone() })?;

        let json = serde_json::to_string_pretty(value).map_err(|e| StateWriteError::Serialize {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;

        let tmp_path = path.with_extension("json.tmp");
        let result = fs::write(&tmp_path, json)
            .and_then(|_| fs::rename(&tmp_path, path))
            .map_err(io_err);

        FileExt::unlock(&lock_file).ok();
        result
    }

    pub fn load_r_matrix(&self) -> RMatrix {
        self.read_json(&self.path_for("r_matrix.json"))
    }

    pub async fn save_r_matrix(&self, matrix: &RMatrix) -> Result<(), StateWriteError> {
        let _guard = self.global_lock.lock().await;
        self.write_json_locked(&self.path_for("r_matrix.json"), matrix)
    }

    pub fn load_epoch(&self) -> EpochOrchestrator {
        self.read_json(&self.path_for("epoch.json"))
    }

    pub async fn save_epoch(&self, orchestrator: &EpochOrchestrator) -> Result<(), StateWriteError> {
        let _guard = self.global_lock.lock().await;
        self.write_json_locked(&self.path_for("epoch.json"), orchestrator)
    }

    /// Load the single, population-wide family learner (spec.md §4.11
    /// clusters turns across all users, not per user).
    pub fn load_family_learner(&self) -> FamilyLearner {
        self.read_json(&self.path_for("family_learner.json"))
    }

    pub async fn save_family_learner(&self, learner: &FamilyLearner) -> Result<(), StateWriteError> {
        let _guard = self.global_lock.lock().await;
        self.write_json_locked(&self.path_for("family_learner.json"), learner)
    }

    pub fn load_entity_tracker(&self, user_id: &str) -> EntityTracker {
        self.read_json(&self.path_for(&format!("entities/{user_id}.json")))
    }

    pub async fn save_entity_tracker(
        &self,
        user_id: &str,
        tracker: &EntityTracker,
    ) -> Result<(), StateWriteError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        self.write_json_locked(&self.path_for(&format!("entities/{user_id}.json")), tracker)
    }

    /// Load the prior turn's carried SELF-distance bias for this user
    /// (spec.md §4.8; defaults to zero bias for a first turn).
    pub fn load_felt_state_carry(&self, user_id: &str) -> FeltStateCarry {
        self.read_json(&self.path_for(&format!("felt_state/{user_id}.json")))
    }

    pub async fn save_felt_state_carry(
        &self,
        user_id: &str,
        carry: &FeltStateCarry,
    ) -> Result<(), StateWriteError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        self.write_json_locked(&self.path_for(&format!("felt_state/{user_id}.json")), carry)
    }
}
