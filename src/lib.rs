//! dae-hyphae: a trauma-aware conversational organism built from twelve
//! organ prehensions, a V0 concrescence loop, nexus formation and
//! SELF-Matrix governance, and a learning substrate that adapts the
//! organism's own coupling over many turns (spec.md §1).
//!
//! The public surface is intentionally small: construct one [`Engine`]
//! per process and call [`Engine::process_turn`] (or the free
//! [`process_turn`] function below) once per conversational turn.

pub mod atoms;
pub mod concrescence;
pub mod config;
pub mod embeddings;
pub mod emission;
pub mod epoch;
pub mod error;
pub mod field;
pub mod learning;
pub mod meta_atoms;
pub mod nexus;
pub mod organs;
pub mod persistence;
pub mod signature;
pub mod tsk;
pub mod turn;
pub mod turn_context;

pub use config::Config;
pub use error::TurnError;
pub use turn::{Engine, FeltStates, TurnResult};
pub use turn_context::TurnContextInput;

/// Run one conversational turn against an already-constructed [`Engine`]
/// (spec.md §6: "`process_turn` is exposed both as a library function
/// ... and via the bounded CLI binary"). A thin wrapper so callers who
/// don't want to think about methods-vs-functions can import one name.
pub async fn process_turn(
    engine: &Engine,
    user_id: &str,
    user_input: &str,
    user_satisfaction: Option<f64>,
    context: Option<TurnContextInput>,
) -> TurnResult {
    engine.process_turn(user_id, user_input, user_satisfaction, context).await
}
