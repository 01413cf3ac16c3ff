//! Turn Orchestrator.
//!
//! Wires C1-C14 into the single external entrypoint named by spec.md §6:
//! `process_turn(user_id, user_input, user_satisfaction?, context?) ->
//! TurnResult`. Grounded on the teacher's `agent::router`'s
//! owns-its-collaborators-behind-one-struct shape: one long-lived `Engine`
//! holding the catalog, organs, R-matrix, epoch state and every external
//! collaborator, with turns serialized per `user_id` the same way the
//! teacher serializes per-conversation state.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::atoms::Catalog;
use crate::config::Config;
use crate::embeddings::{EmbeddingProvider, FastEmbedProvider};
use crate::emission::language_model::{EmissionLanguageModel, HttpEmissionLanguageModel};
use crate::emission::{self, phrases};
use crate::epoch::EpochOrchestrator;
use crate::error::{CatalogError, InputError, TurnError};
use crate::learning::entity_tracker;
use crate::learning::r_matrix::OutcomeGate;
use crate::learning::{FamilyLearner, FeltStateCarry, RMatrix};
use crate::nexus::{self, Nexus, OrganInsights, Zone};
use crate::organs::{self, Organ, OrganResult, PolyvagalState};
use crate::persistence::StateStore;
use crate::signature::{self, EmissionPath};
use crate::tsk::{TskRecord, TskRecorder};
use crate::turn_context::{EntityPrehension, TemporalContext, TurnContextInput};

/// The V0/convergence/zone/family view of a completed turn (spec.md §6
/// `TurnResult.felt_states`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeltStates {
    pub v0_trajectory: Vec<f64>,
    pub convergence_cycles: u32,
    pub convergence_reason: crate::concrescence::ConvergenceReason,
    pub kairos_flag: bool,
    pub zone: Zone,
    pub polyvagal: PolyvagalState,
    pub satisfaction_final: f64,
    pub family_id: Option<Uuid>,
    pub transformation_signature: Vec<f64>,
    /// Set only when the turn degraded per spec.md §7's propagation
    /// policy; holds `TurnError::token()`.
    pub error: Option<String>,
}

/// The full per-turn output (spec.md §6 "Outputs").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResult {
    pub turn_id: Uuid,
    pub emission_text: String,
    pub emission_confidence: f64,
    pub emission_path: EmissionPath,
    pub organ_results: Vec<OrganResult>,
    pub nexuses: Vec<Nexus>,
    pub felt_states: FeltStates,
    pub processing_time_ms: u64,
}

/// A minimal-holding turn result for an early-captured error (spec.md §7
/// "a turn that violates an invariant returns a minimal-holding emission
/// with emission_path = 'minimal' and a structured error token in
/// felt_states['error']"). Used for every `TurnError` variant, not only
/// invariant violations, per the propagation policy on `TurnError`.
fn minimal_turn_result(turn_id: Uuid, token: &'static str, processing_time_ms: u64) -> TurnResult {
    TurnResult {
        turn_id,
        emission_text: phrases::minimal_holding(0).to_string(),
        emission_confidence: 0.0,
        emission_path: EmissionPath::Minimal,
        organ_results: Vec::new(),
        nexuses: Vec::new(),
        felt_states: FeltStates {
            v0_trajectory: Vec::new(),
            convergence_cycles: 0,
            convergence_reason: crate::concrescence::ConvergenceReason::MaxCycles,
            kairos_flag: false,
            zone: Zone::Z1CoreSelf,
            polyvagal: PolyvagalState::Ventral,
            satisfaction_final: 0.0,
            family_id: None,
            transformation_signature: Vec::new(),
            error: Some(token.to_string()),
        },
        processing_time_ms,
    }
}

fn validate_input(user_id: &str, user_input: &str, user_satisfaction: Option<f64>) -> Result<(), InputError> {
    if user_id.trim().is_empty() {
        return Err(InputError::EmptyUserId);
    }
    if user_input.trim().is_empty() {
        return Err(InputError::EmptyInput);
    }
    if let Some(s) = user_satisfaction {
        if !(0.0..=1.0).contains(&s) {
            return Err(InputError::SatisfactionOutOfRange(s));
        }
    }
    Ok(())
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// The long-lived process: owns the static catalog, the twelve organs,
/// every external collaborator, and the shared learning state (spec.md §5
/// "R-matrix/family/entity-tracker state is process-wide").
pub struct Engine {
    config: Config,
    catalog: Catalog,
    organs: Vec<Box<dyn Organ>>,
    embedder: Option<Box<dyn EmbeddingProvider>>,
    language_model: Box<dyn EmissionLanguageModel>,
    store: StateStore,
    tsk: TskRecorder,
    r_matrix: RwLock<RMatrix>,
    epoch: RwLock<EpochOrchestrator>,
    /// Population-wide family clustering (spec.md §4.11); shared across
    /// every user the same way `r_matrix` and `epoch` are.
    family_learner: RwLock<FamilyLearner>,
    turn_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Engine {
    /// Build the real, production `Engine`: HTTP language model, and the
    /// `fastembed` embedder if `config.embedding_lure_enabled`. Only
    /// `CatalogError` is fatal (spec.md §7); an embedder that fails to
    /// initialize degrades to the pattern-only lure path with a warning.
    pub fn new(config: Config) -> Result<Self, CatalogError> {
        let embedder = build_embedder(&config);
        let language_model = Box::new(HttpEmissionLanguageModel::new(config.language_model.clone()));
        Self::with_collaborators(config, language_model, embedder)
    }

    /// The injectable constructor, used in tests to swap in deterministic
    /// collaborators.
    pub fn with_collaborators(
        config: Config,
        language_model: Box<dyn EmissionLanguageModel>,
        embedder: Option<Box<dyn EmbeddingProvider>>,
    ) -> Result<Self, CatalogError> {
        let catalog = Catalog::load()?;
        let organs = organs::build_organs();
        let store = StateStore::new(config.persistence.state_dir.clone());
        let tsk = TskRecorder::new(config.persistence.state_dir.clone());
        let r_matrix = RwLock::new(store.load_r_matrix());
        let epoch = RwLock::new(store.load_epoch());
        let family_learner = RwLock::new(store.load_family_learner());
        Ok(Self {
            config,
            catalog,
            organs,
            embedder,
            language_model,
            store,
            tsk,
            r_matrix,
            epoch,
            family_learner,
            turn_locks: DashMap::new(),
        })
    }

    fn turn_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.turn_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run one conversational turn end to end (spec.md §6). Never returns
    /// an `Err`: every captured failure degrades to a minimal-holding
    /// `TurnResult` with `felt_states.error` set, per spec.md §7's
    /// propagation policy.
    pub async fn process_turn(
        &self,
        user_id: &str,
        user_input: &str,
        user_satisfaction: Option<f64>,
        context: Option<TurnContextInput>,
    ) -> TurnResult {
        let turn_id = Uuid::new_v4();
        let start = Instant::now();

        if let Err(input_error) = validate_input(user_id, user_input, user_satisfaction) {
            let token = TurnError::from(input_error).token();
            return minimal_turn_result(turn_id, token, start.elapsed().as_millis() as u64);
        }

        // Serialize every turn for this user_id: the entity-tracker reads
        // and writes below must not interleave with another in-flight
        // turn for the same user (spec.md §5). R-matrix and family
        // learner are population-wide and separately writer-locked.
        let lock = self.turn_lock(user_id);
        let _turn_guard = lock.lock().await;

        let context = context.unwrap_or_default();
        let entity_prehension = context.entity_prehension.clone().unwrap_or_default();
        let temporal = context
            .temporal
            .clone()
            .unwrap_or_else(|| TemporalContext::from_timestamp(Utc::now()));

        let r_matrix = self.r_matrix.read().await.clone();
        let mut tracker = self.store.load_entity_tracker(user_id);

        // Pre-emission entity boost (spec.md §4.12, scenario S6): bias
        // BOND and EMPATHY toward whatever typical profile this turn's
        // recognized entities carried on past turns, before C2 runs.
        let entity_organ_boost =
            entity_tracker::predicted_boost(&tracker, user_id, &entity_prehension.current_turn_entities);

        // Carried SELF-distance bias (spec.md §4.8): the previous turn's
        // aggregate nexus `self_distance_influence`, folded into this
        // turn's initial BOND baseline rather than applied mid-turn.
        let felt_state_bias = self.store.load_felt_state_carry(user_id).self_distance_bias;

        let result = crate::concrescence::run_turn(
            user_input,
            &self.catalog,
            &self.organs,
            &entity_prehension,
            &temporal,
            &r_matrix,
            &self.config.concrescence,
            &self.config.nexus,
            &entity_organ_boost,
            felt_state_bias,
            self.embedder.as_deref(),
            self.config.embedding_lure_enabled,
        );

        let last = result.final_occasion();
        let insights = OrganInsights::from_results(&last.organ_results);
        let zone = Zone::from_self_distance(insights.self_distance);

        let mut nexuses = nexus::compose_nexuses(
            &last.fields,
            &r_matrix,
            last.field_coherence,
            last.field_coherence,
            &self.config.nexus,
        );
        nexus::classify(&mut nexuses, &insights, last.satisfaction);

        let emission = emission::generate(
            &nexuses,
            zone,
            last.v0,
            &temporal,
            &entity_prehension,
            self.language_model.as_ref(),
            self.config.timeouts.language_model_timeout,
            self.config.language_model.max_tokens,
            self.config.nexus.readiness_epsilon,
        )
        .await;

        let signature = signature::compute(&result, &r_matrix, &nexuses, emission.path);

        // The satisfaction signal gating this turn's learning updates:
        // the caller's explicit rating when supplied, else the model's
        // own computed occasion satisfaction (spec.md §6 `user_satisfaction?`).
        let satisfaction = user_satisfaction.unwrap_or(last.satisfaction);
        let used_nexus = !nexuses.is_empty() && emission.path != EmissionPath::Learned;

        let coherence_vec = entity_tracker::coherence_vector(&last.organ_results);
        let polyvagal_code = match insights.polyvagal_state {
            PolyvagalState::Ventral => 0.0,
            PolyvagalState::Sympathetic => 1.0,
            PolyvagalState::Mixed => 2.0,
            PolyvagalState::Dorsal => 3.0,
        };

        if !entity_prehension.is_empty() {
            tracker.update(
                user_id,
                &entity_prehension.current_turn_entities,
                &last.organ_results,
                polyvagal_code,
                insights.self_distance,
                insights.urgency_level,
                last.v0,
                satisfaction,
                Utc::now(),
                &self.config.entity_tracker,
            );
        }

        // Family clustering is population-wide (spec.md §4.11): `user_id`
        // is left `None` so turns from different users can join the same
        // family, matching the data model's power-law expectation across
        // the whole population rather than one family tree per user.
        let family_id = {
            let mut learner = self.family_learner.write().await;
            let id = learner.assign(
                turn_id.to_string(),
                &signature,
                satisfaction,
                last.v0,
                emission.text.clone(),
                None,
                Utc::now(),
                &self.config.family,
            );
            if let Err(error) = self.store.save_family_learner(&learner).await {
                tracing::warn!(turn_id = %turn_id, %error, "failed to persist family learner");
            }
            id
        };

        {
            let gate = OutcomeGate::from_satisfaction(satisfaction, false);
            // spec.md §4.13: each regime carries its own Hebbian learning
            // rate. spec.md §4.10/§9: that rate drops further toward
            // `eta_floor` once the matrix's off-diagonal std saturates,
            // regardless of regime.
            let regime_eta = self.epoch.read().await.params().hebbian_rate;
            let mut matrix = self.r_matrix.write().await;
            let eta = if matrix.std_off_diagonal() > self.config.hebbian.std_saturation_threshold {
                self.config.hebbian.eta_floor
            } else {
                regime_eta
            };
            matrix.update(&last.organ_results, gate, &self.config.hebbian, Some(eta));
            if let Err(error) = self.store.save_r_matrix(&matrix).await {
                tracing::warn!(turn_id = %turn_id, %error, "failed to persist r_matrix");
            }
        }

        if let Err(error) = self.store.save_entity_tracker(user_id, &tracker).await {
            tracing::warn!(turn_id = %turn_id, %error, "failed to persist entity tracker");
        }

        let felt_state_carry = FeltStateCarry::from_nexuses(&nexuses);
        if let Err(error) = self.store.save_felt_state_carry(user_id, &felt_state_carry).await {
            tracing::warn!(turn_id = %turn_id, %error, "failed to persist felt state carry");
        }

        {
            let mut epoch = self.epoch.write().await;
            epoch.record_turn(satisfaction, &self.config.epoch);
            if let Some(summary) = epoch.maybe_close_epoch(&self.config.epoch) {
                tracing::debug!(
                    turn_id = %turn_id,
                    regime = ?epoch.regime(),
                    turns = summary.turns,
                    successes = summary.successes,
                    "epoch closed"
                );
            }
            for word_occasion in &context.word_occasions.clone().unwrap_or_default() {
                epoch.word_occasions.observe(&word_occasion.word, &coherence_vec);
            }
            let words = tokenize(user_input);
            epoch.neighbor_words.observe_turn(&words, &coherence_vec);
            epoch
                .cycle_convergence
                .observe(insights.polyvagal_state, insights.urgency_level, result.cycles_used());
            for gate_result in &context.gate_results.clone().unwrap_or_default() {
                epoch.gate_cascade.observe(&gate_result.gate_name, gate_result.passed);
            }
            epoch
                .nexus_fallback
                .observe(used_nexus, satisfaction, start.elapsed().as_millis() as f64);
            for organ_result in last.organ_results.iter().filter(|r| r.coherence > 0.05) {
                epoch.organ_confidence.observe(organ_result.organ, satisfaction);
            }
            if let Err(error) = self.store.save_epoch(&epoch).await {
                tracing::warn!(turn_id = %turn_id, %error, "failed to persist epoch orchestrator");
            }
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;

        let record = TskRecord::new(
            turn_id,
            user_id.to_string(),
            Utc::now(),
            user_input.to_string(),
            &emission,
            result.clone(),
            nexuses.clone(),
            zone,
            signature.values.clone(),
            Some(family_id),
            user_satisfaction,
            processing_time_ms,
        );
        self.tsk.record(&record).await;

        TurnResult {
            turn_id,
            emission_text: emission.text,
            emission_confidence: emission.confidence,
            emission_path: emission.path,
            organ_results: last.organ_results.clone(),
            nexuses,
            felt_states: FeltStates {
                v0_trajectory: result.v0_trajectory(),
                convergence_cycles: result.cycles_used(),
                convergence_reason: result.convergence_reason,
                kairos_flag: result.kairos_cycle.is_some(),
                zone,
                polyvagal: insights.polyvagal_state,
                satisfaction_final: satisfaction,
                family_id: Some(family_id),
                transformation_signature: signature.values,
                error: None,
            },
            processing_time_ms,
        }
    }
}

fn build_embedder(config: &Config) -> Option<Box<dyn EmbeddingProvider>> {
    if !config.embedding_lure_enabled {
        return None;
    }
    match FastEmbedProvider::new() {
        Ok(provider) => Some(Box::new(provider)),
        Err(error) => {
            tracing::warn!(%error, "embedding model failed to initialize, falling back to pattern-only lure");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emission::language_model::DeterministicEmissionLanguageModel;
    use tempfile::tempdir;

    fn test_engine(state_dir: std::path::PathBuf) -> Engine {
        let mut config = Config::default();
        config.persistence.state_dir = state_dir;
        Engine::with_collaborators(config, Box::new(DeterministicEmissionLanguageModel), None)
            .expect("catalog must load")
    }

    #[tokio::test]
    async fn empty_input_degrades_to_minimal_with_input_error_token() {
        let dir = tempdir().unwrap();
        let engine = test_engine(dir.path().to_path_buf());
        let result = engine.process_turn("user-1", "   ", None, None).await;
        assert_eq!(result.emission_path, EmissionPath::Minimal);
        assert_eq!(result.felt_states.error.as_deref(), Some("input_error"));
    }

    #[tokio::test]
    async fn out_of_range_satisfaction_degrades_to_minimal() {
        let dir = tempdir().unwrap();
        let engine = test_engine(dir.path().to_path_buf());
        let result = engine.process_turn("user-1", "hello", Some(1.5), None).await;
        assert_eq!(result.felt_states.error.as_deref(), Some("input_error"));
    }

    #[tokio::test]
    async fn ordinary_turn_produces_an_emission_and_assigns_a_family() {
        let dir = tempdir().unwrap();
        let engine = test_engine(dir.path().to_path_buf());
        let result = engine
            .process_turn("user-1", "i feel safe talking to you and i trust you", Some(0.8), None)
            .await;
        assert!(result.felt_states.error.is_none());
        assert!(!result.emission_text.is_empty());
        assert!(result.felt_states.family_id.is_some());
        assert_eq!(result.felt_states.transformation_signature.len(), crate::signature::DIMENSIONS);
    }

    #[tokio::test]
    async fn turns_for_the_same_user_serialize_without_deadlock() {
        let dir = tempdir().unwrap();
        let engine = std::sync::Arc::new(test_engine(dir.path().to_path_buf()));
        let mut handles = Vec::new();
        for i in 0..4 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .process_turn("shared-user", &format!("turn number {i}"), Some(0.7), None)
                    .await
            }));
        }
        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.felt_states.error.is_none());
        }
    }
}
