//! Learning substrate: C10 Hebbian R-Matrix, C11 Family Learner, C12
//! Entity-Organ Tracker (spec.md §4.10-§4.12).
//!
//! All three are process-wide shared state with a single-writer rule
//! (spec.md §5): the R-matrix behind a global writer lock, families and
//! entity associations serialized per `user_id`. Grounded on the teacher's
//! `estimation::EstimationLearner` (`estimation/learner.rs`): the same
//! `alpha`-driven EMA update and "not enough samples yet" gating, applied
//! here to three different keyed stores instead of one.

pub mod entity_tracker;
pub mod family;
pub mod felt_state_carry;
pub mod r_matrix;

pub use entity_tracker::{EntityOrganAssociation, EntityTracker};
pub use family::{Family, FamilyLearner};
pub use felt_state_carry::FeltStateCarry;
pub use r_matrix::RMatrix;
