//! Crate-wide error types.
//!
//! Kinds mirror the error taxonomy of the turn pipeline rather than any one
//! subsystem: `InputError` rejects malformed context before prehension,
//! `OrganFailure` is captured and masked (it never escapes this module —
//! see `organs::prehension`), `ExternalUnavailable` covers the knowledge
//! store and language-model collaborators, `StateWriteError` covers
//! persistence, `CatalogError` is the one fatal-at-startup kind, and
//! `InvariantViolation` is raised when a §3 invariant is detected broken at
//! a component boundary.

use uuid::Uuid;

/// Errors from loading the static atom/meta-atom catalog. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("organ {organ} has no atoms registered")]
    EmptyOrgan { organ: &'static str },

    #[error("meta-atom {name} names no organs")]
    EmptyMetaAtom { name: &'static str },

    #[error("atom {atom} is claimed by both organ {first} and organ {second}")]
    DuplicateAtom {
        atom: &'static str,
        first: &'static str,
        second: &'static str,
    },

    #[error("prototype embedding for atom {atom} has dimension {got}, expected {expected}")]
    BadEmbeddingDimension {
        atom: &'static str,
        got: usize,
        expected: usize,
    },
}

/// Errors surfaced by an individual organ's `process`. Always captured and
/// masked to a neutral result by the prehension driver; never propagated to
/// the caller of `process_turn`.
#[derive(Debug, thiserror::Error)]
pub enum OrganError {
    #[error("organ {organ} failed: {reason}")]
    Failed { organ: &'static str, reason: String },

    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),
}

/// Errors from the concrescence (V0 descent) loop.
#[derive(Debug, thiserror::Error)]
pub enum ConcrescenceError {
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Errors from nexus composition/classification.
#[derive(Debug, thiserror::Error)]
pub enum NexusError {
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Errors from emission generation/assembly.
#[derive(Debug, thiserror::Error)]
pub enum EmissionError {
    #[error("language model unavailable: {0}")]
    External(#[from] ExternalUnavailable),
}

/// Errors from the learning substrate (R-matrix, families, entity tracker).
#[derive(Debug, thiserror::Error)]
pub enum LearningError {
    #[error("signature has wrong dimensionality: got {got}, expected {expected}")]
    BadSignatureDimension { got: usize, expected: usize },

    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// A collaborator outside the core (knowledge store, language model) failed
/// or timed out. Always degrades the emission path; never aborts the turn.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExternalUnavailable {
    #[error("{collaborator} timed out after {elapsed_ms}ms")]
    Timeout {
        collaborator: &'static str,
        elapsed_ms: u64,
    },

    #[error("{collaborator} returned an error: {reason}")]
    Failed {
        collaborator: &'static str,
        reason: String,
    },
}

/// Persistence write failed. Logged once via `tracing::warn!` and then
/// shelved — never retried, and never surfaced to the `process_turn`
/// caller; the in-memory state for this turn is still returned, only the
/// on-disk copy is stale until a later successful write.
#[derive(Debug, thiserror::Error)]
pub enum StateWriteError {
    #[error("failed to write {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to acquire lock on {path}")]
    Lock { path: String },

    #[error("failed to serialize state for {path}: {reason}")]
    Serialize { path: String, reason: String },
}

/// A §3 data-model invariant was detected broken at a component boundary.
/// Fatal for the turn (not the process); the turn degrades to a
/// minimal-holding emission with this recorded in `felt_states["error"]`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvariantViolation {
    #[error("lure field for organ {organ} sums to {sum}, expected 1.0 +/- 1e-6")]
    LureFieldNotNormalized { organ: &'static str, sum: f64 },

    #[error("signature is not L2-normalized: norm = {norm}")]
    SignatureNotNormalized { norm: f64 },

    #[error("nexus at atom {atom} has {participants} participant(s), need >= 2")]
    NexusTooFewParticipants {
        atom: &'static str,
        participants: usize,
    },

    #[error("R-matrix entry ({i},{j}) = {value} out of [0, {r_max}]")]
    RMatrixOutOfRange { i: usize, j: usize, value: f64, r_max: f64 },

    #[error("R-matrix is not symmetric at ({i},{j}): {a} != {b}")]
    RMatrixAsymmetric { i: usize, j: usize, a: f64, b: f64 },
}

/// The error returned to the caller of `process_turn` for a malformed
/// request, rejected before any organ runs.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("user_id must not be empty")]
    EmptyUserId,

    #[error("user_input must not be empty")]
    EmptyInput,

    #[error("user_satisfaction {0} is out of range [0,1]")]
    SatisfactionOutOfRange(f64),
}

/// Top-level error for a single turn. Only `Catalog` aborts the process (at
/// startup, before any turn runs); every other variant is captured inside
/// `process_turn` and converted into a minimal-holding `TurnResult` rather
/// than propagated, per spec.md §7's propagation policy.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("input rejected: {0}")]
    Input(#[from] InputError),

    #[error(transparent)]
    Concrescence(#[from] ConcrescenceError),

    #[error(transparent)]
    Nexus(#[from] NexusError),

    #[error(transparent)]
    Emission(#[from] EmissionError),

    #[error(transparent)]
    Learning(#[from] LearningError),

    #[error("catalog failed to load: {0}")]
    Catalog(#[from] CatalogError),
}

impl TurnError {
    /// A short machine-readable token for `felt_states["error"]`.
    pub fn token(&self) -> &'static str {
        match self {
            TurnError::Input(_) => "input_error",
            TurnError::Concrescence(_) => "invariant_violation",
            TurnError::Nexus(_) => "invariant_violation",
            TurnError::Emission(_) => "external_unavailable",
            TurnError::Learning(_) => "invariant_violation",
            TurnError::Catalog(_) => "catalog_error",
        }
    }
}

/// Ties a persistence error to the turn that triggered the write, for
/// logging; never constructed as part of the public error surface.
#[derive(Debug, thiserror::Error)]
#[error("turn {turn_id} failed to persist: {source}")]
pub struct TurnPersistenceFailure {
    pub turn_id: Uuid,
    #[source]
    pub source: StateWriteError,
}
