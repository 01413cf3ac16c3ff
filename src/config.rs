//! Runtime configuration.
//!
//! Loaded from environment (via `dotenvy` + `serde`, teacher convention:
//! `crate::config::{LlmConfig, GoogleConfig, DatabaseConfig}`) and
//! overridable from the bounded CLI surface (spec.md §6).

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Which Kairos window profile to use (spec.md §9 Open Question: two
/// windows are cited across source documents; both are implemented and
/// selectable rather than guessed).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KairosProfile {
    /// `[0.30, 0.50]`, tuned for conversational V0 descent. Default.
    Conversational,
    /// `[0.45, 0.70]`, cited for ARC-AGI style tasks.
    ArcAgi,
}

impl KairosProfile {
    pub fn window(self) -> (f64, f64) {
        match self {
            KairosProfile::Conversational => (0.30, 0.50),
            KairosProfile::ArcAgi => (0.45, 0.70),
        }
    }
}

/// Weights for the V0 energy update `E(t)` (spec.md §4.5).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnergyWeights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    pub zeta: f64,
    pub eta: f64,
}

impl Default for EnergyWeights {
    fn default() -> Self {
        Self {
            alpha: 0.35,
            beta: 0.10,
            gamma: 0.15,
            delta: 0.10,
            zeta: 0.10,
            eta: 0.20,
        }
    }
}

/// Parameters governing the V0 concrescence loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConcrescenceConfig {
    pub max_cycles: u32,
    pub v0_initial: f64,
    pub kairos_profile: KairosProfile,
    pub convergence_epsilon: f64,
    pub crystallization_pressure: f64,
    pub weights: EnergyWeights,
}

impl Default for ConcrescenceConfig {
    fn default() -> Self {
        Self {
            max_cycles: 5,
            v0_initial: 1.0,
            kairos_profile: KairosProfile::Conversational,
            convergence_epsilon: 0.1,
            crystallization_pressure: 0.85,
            weights: EnergyWeights::default(),
        }
    }
}

/// Parameters governing nexus intersection composition (spec.md §4.6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NexusConfig {
    pub activation_threshold: f64,
    pub bridge_threshold: f64,
    pub bridge_min_contribution: f64,
    pub top_k: usize,
    pub readiness_epsilon: f64,
}

impl Default for NexusConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 0.30,
            bridge_threshold: 0.5,
            bridge_min_contribution: 0.3,
            top_k: 10,
            readiness_epsilon: 0.02,
        }
    }
}

/// Parameters for the Hebbian R-matrix update (spec.md §4.10).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HebbianConfig {
    pub eta: f64,
    pub eta_floor: f64,
    pub r_max: f64,
    pub std_saturation_threshold: f64,
}

impl Default for HebbianConfig {
    fn default() -> Self {
        Self {
            eta: 0.05,
            eta_floor: 0.01,
            r_max: 1.0,
            std_saturation_threshold: 0.08,
        }
    }
}

/// Parameters for the family learner (spec.md §4.11).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub min_family_size: usize,
    pub centroid_alpha: f64,
    pub theta_sim_start: f64,
    pub theta_sim_mid: f64,
    pub theta_sim_mature: f64,
}

impl Default for FamilyConfig {
    fn default() -> Self {
        Self {
            min_family_size: 3,
            centroid_alpha: 0.20,
            theta_sim_start: 0.55,
            theta_sim_mid: 0.65,
            theta_sim_mature: 0.75,
        }
    }
}

/// Parameters for the entity-organ tracker (spec.md §4.12).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EntityTrackerConfig {
    pub alpha: f64,
    pub success_threshold: f64,
}

impl Default for EntityTrackerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.15,
            success_threshold: 0.6,
        }
    }
}

/// Parameters for the epoch orchestrator's regime state machine
/// (spec.md §4.13).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EpochConfig {
    /// Epochs of sustained promotion-floor success before a regime
    /// promotes.
    pub promotion_epochs: u32,
    /// EMA smoothing for the per-epoch/global success-rate trackers.
    pub success_rate_alpha: f64,
    /// How far below a regime's tau the regression floor sits.
    pub regression_margin: f64,
    /// Adaptive tau drop applied when an epoch's success rate < 0.50.
    pub adaptive_tau_drop: f64,
    /// Turns per epoch before the orchestrator auto-closes the current
    /// epoch and evaluates the promotion/demotion transition rule.
    /// spec.md §4.13 defines epochs by regime-transition behavior but
    /// never names a turn-count boundary; fixed here as the smallest
    /// batch that lets `promotion_epochs` consecutive epochs still
    /// reflect a meaningfully-sized sample per regime.
    pub epoch_length: u32,
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            promotion_epochs: 2,
            success_rate_alpha: 0.2,
            regression_margin: 0.15,
            adaptive_tau_drop: 0.10,
            epoch_length: 20,
        }
    }
}

/// Per-turn and external-collaborator timeouts (spec.md §5).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(with = "duration_ms")]
    pub turn_budget: Duration,
    #[serde(with = "duration_ms")]
    pub language_model_timeout: Duration,
    #[serde(with = "duration_ms")]
    pub knowledge_store_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            turn_budget: Duration::from_secs(3),
            language_model_timeout: Duration::from_secs(5),
            knowledge_store_timeout: Duration::from_millis(100),
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}

/// Language-model collaborator configuration (spec.md §6 contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageModelConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip)]
    pub api_key: Option<SecretString>,
}

impl Default for LanguageModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 256,
            api_key: None,
        }
    }
}

/// Where persisted state (R-matrix, families, entity tracker, trackers,
/// TSK records) lives on disk (spec.md §6 "Persisted state layout").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub state_dir: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        let state_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dae-hyphae");
        Self { state_dir }
    }
}

/// Top-level configuration assembled at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub concrescence: ConcrescenceConfig,
    pub nexus: NexusConfig,
    pub hebbian: HebbianConfig,
    pub family: FamilyConfig,
    pub entity_tracker: EntityTrackerConfig,
    pub epoch: EpochConfig,
    pub timeouts: TimeoutConfig,
    pub language_model: LanguageModelConfig,
    pub persistence: PersistenceConfig,
    /// Use the embedding-based lure path in addition to pattern-based
    /// (spec.md §4.2). Disabled by default so that organ results stay
    /// bit-deterministic without a loaded embedding model (spec.md §8
    /// property 6).
    pub embedding_lure_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concrescence: ConcrescenceConfig::default(),
            nexus: NexusConfig::default(),
            hebbian: HebbianConfig::default(),
            family: FamilyConfig::default(),
            entity_tracker: EntityTrackerConfig::default(),
            epoch: EpochConfig::default(),
            timeouts: TimeoutConfig::default(),
            language_model: LanguageModelConfig::default(),
            persistence: PersistenceConfig::default(),
            embedding_lure_enabled: false,
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    /// Mirrors the teacher's `dotenvy::dotenv().ok()` + env-overlay pattern.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Config::default();

        if let Ok(dir) = std::env::var("DAE_HYPHAE_STATE_DIR") {
            config.persistence.state_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("DAE_HYPHAE_LLM_BASE_URL") {
            config.language_model.base_url = url;
        }
        if let Ok(model) = std::env::var("DAE_HYPHAE_LLM_MODEL") {
            config.language_model.model = model;
        }
        if let Ok(key) = std::env::var("DAE_HYPHAE_LLM_API_KEY") {
            config.language_model.api_key = Some(SecretString::from(key));
        }
        if std::env::var("DAE_HYPHAE_KAIROS_PROFILE")
            .map(|v| v.eq_ignore_ascii_case("arc-agi"))
            .unwrap_or(false)
        {
            config.concrescence.kairos_profile = KairosProfile::ArcAgi;
        }
        if std::env::var("DAE_HYPHAE_EMBEDDING_LURE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
        {
            config.embedding_lure_enabled = true;
        }

        config
    }
}

/// Bounded CLI surface (spec.md §6): a single command that reads a turn
/// from stdin or a flag and writes a `TurnResult` to stdout.
#[derive(Debug, clap::Parser)]
#[command(name = "dae-hyphae", about = "Run one conversational turn")]
pub struct CliArgs {
    /// Opaque user identifier.
    #[arg(long, env = "DAE_HYPHAE_USER_ID")]
    pub user_id: Option<String>,

    /// User input text. If omitted, the turn is read as JSON from stdin.
    #[arg(long)]
    pub input: Option<String>,

    /// Reported user satisfaction for the *previous* turn, in [0,1].
    #[arg(long)]
    pub satisfaction: Option<f64>,

    /// Directory holding persisted state. Overrides the environment/default.
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Pretty-print the JSON result.
    #[arg(long)]
    pub pretty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kairos_profiles_have_distinct_windows() {
        assert_eq!(KairosProfile::Conversational.window(), (0.30, 0.50));
        assert_eq!(KairosProfile::ArcAgi.window(), (0.45, 0.70));
    }

    #[test]
    fn default_config_is_deterministic() {
        let a = Config::default();
        let b = Config::default();
        assert_eq!(a.concrescence.max_cycles, b.concrescence.max_cycles);
        assert!(!a.embedding_lure_enabled);
    }
}
