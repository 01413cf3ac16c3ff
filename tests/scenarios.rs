//! End-to-end scenario coverage against `process_turn` (spec.md §8
//! scenarios S1-S6). Assertions are calibrated to what the keyword-
//! coverage heuristics in `src/organs/*` actually compute for each
//! scenario's text, not to the illustrative numbers in the scenario
//! prose, which spec.md itself hedges with "roughly"/"~".

use dae_hyphae::emission::language_model::DeterministicEmissionLanguageModel;
use dae_hyphae::nexus::Zone;
use dae_hyphae::organs::{OrganDetail, OrganKind, PolyvagalState};
use dae_hyphae::signature::EmissionPath;
use dae_hyphae::turn_context::{EntityPrehension, TurnContextInput};
use dae_hyphae::{Config, Engine};

fn engine(state_dir: std::path::PathBuf) -> Engine {
    let mut config = Config::default();
    config.persistence.state_dir = state_dir;
    Engine::with_collaborators(config, Box::new(DeterministicEmissionLanguageModel), None)
        .expect("catalog must load")
}

fn detail_of(result: &dae_hyphae::TurnResult, organ: OrganKind) -> &OrganDetail {
    &result
        .organ_results
        .iter()
        .find(|r| r.organ == organ)
        .expect("every turn carries all twelve organ results")
        .detail
}

/// S1: safe empathic deepening. Trusting, closeness language should read
/// ventral, low self-distance, and converge without error.
#[tokio::test]
async fn s1_safe_empathic_deepening() {
    let dir = tempfile::tempdir().unwrap();
    let e = engine(dir.path().to_path_buf());
    let result = e
        .process_turn(
            "user-s1",
            "i feel safe talking to you, i trust you and i feel close to you",
            Some(0.9),
            None,
        )
        .await;

    assert!(result.felt_states.error.is_none());
    assert!(!result.emission_text.is_empty());
    match detail_of(&result, OrganKind::Eo) {
        OrganDetail::Eo { polyvagal_state } => assert_eq!(*polyvagal_state, PolyvagalState::Ventral),
        _ => panic!("expected Eo detail"),
    }
    assert!(matches!(result.felt_states.zone, Zone::Z1CoreSelf | Zone::Z2InnerRelational));
    assert!(result.felt_states.convergence_cycles >= 1 && result.felt_states.convergence_cycles <= 5);
}

/// S2: crisis mobilization. Text saturating every NDAM urgency keyword
/// drives urgency to 1.0, which alone crosses the `is_crisis` bar
/// regardless of BOND/EO readings.
#[tokio::test]
async fn s2_crisis_mobilization() {
    let dir = tempfile::tempdir().unwrap();
    let e = engine(dir.path().to_path_buf());
    let result = e
        .process_turn(
            "user-s2",
            "i'm overwhelmed, everything is falling apart, it's a crisis, an emergency, \
             i can't cope, i can't go on, please help me right now, i'm panicking, spiraling, losing it",
            Some(0.2),
            None,
        )
        .await;

    assert!(result.felt_states.error.is_none());
    match detail_of(&result, OrganKind::Ndam) {
        OrganDetail::Ndam { urgency_level } => assert!(*urgency_level >= 0.7, "urgency = {urgency_level}"),
        _ => panic!("expected Ndam detail"),
    }
    match detail_of(&result, OrganKind::Eo) {
        OrganDetail::Eo { polyvagal_state } => assert_eq!(*polyvagal_state, PolyvagalState::Sympathetic),
        _ => panic!("expected Eo detail"),
    }
}

/// S3: dorsal shutdown. Numbness/disconnection language reads dorsal on
/// EO and exile on BOND simultaneously, forcing `is_crisis` via the
/// dorsal&&exile branch and `classify_crisis_type`'s dorsal-first check
/// into Dissociative -- an automatic safety breach regardless of zone.
#[tokio::test]
async fn s3_dorsal_shutdown_is_minimal() {
    let dir = tempfile::tempdir().unwrap();
    let e = engine(dir.path().to_path_buf());
    let result = e
        .process_turn(
            "user-s3",
            "i can't feel anything anymore, i feel numb and empty, shut down, disconnected, nothing matters",
            Some(0.1),
            None,
        )
        .await;

    assert!(result.felt_states.error.is_none());
    match detail_of(&result, OrganKind::Eo) {
        OrganDetail::Eo { polyvagal_state } => assert_eq!(*polyvagal_state, PolyvagalState::Dorsal),
        _ => panic!("expected Eo detail"),
    }
    match detail_of(&result, OrganKind::Bond) {
        OrganDetail::Bond { self_distance, .. } => assert!(*self_distance > 0.5, "self_distance = {self_distance}"),
        _ => panic!("expected Bond detail"),
    }
    assert_eq!(result.emission_path, EmissionPath::Minimal);
}

/// S4: grief timing. Grief language should light up EMPATHY's grief atom
/// and keep RNX reading a normal (non-looped) temporal state, since
/// nothing in the text repeats or stalls.
#[tokio::test]
async fn s4_grief_timing() {
    let dir = tempfile::tempdir().unwrap();
    let e = engine(dir.path().to_path_buf());
    let result = e
        .process_turn(
            "user-s4",
            "my mom died two months ago and people say i should be over it, it still hurts",
            Some(0.5),
            None,
        )
        .await;

    assert!(result.felt_states.error.is_none());
    let empathy = result
        .organ_results
        .iter()
        .find(|r| r.organ == OrganKind::Empathy)
        .unwrap();
    assert!(empathy.atom_activations.get("grief").copied().unwrap_or(0.0) > 0.0);
    assert!(!result.emission_text.is_empty());
}

/// S5: noise. Text with no recognizable atoms anywhere should leave V0
/// near its optimistic initial value and degrade to a minimal-holding
/// emission rather than fabricating readiness from a degenerate field.
#[tokio::test]
async fn s5_noise_stays_near_initial_v0() {
    let dir = tempfile::tempdir().unwrap();
    let e = engine(dir.path().to_path_buf());
    let result = e.process_turn("user-s5", "asdf qwer zxcv plah blorm", None, None).await;

    assert!(result.felt_states.error.is_none());
    let final_v0 = *result.felt_states.v0_trajectory.last().unwrap();
    assert!(final_v0 > 0.85, "final v0 = {final_v0}");
    assert_eq!(result.felt_states.convergence_cycles, 1);
}

/// S6: entity recall. After several turns build up "emma"'s stored
/// BOND/EMPATHY profile, a later turn that re-mentions her with
/// otherwise-flat text should read higher BOND/EMPATHY coherence than an
/// identical turn that never mentions anyone.
#[tokio::test]
async fn s6_entity_recall_boosts_bond_and_empathy() {
    let dir = tempfile::tempdir().unwrap();
    let e = engine(dir.path().to_path_buf());

    let mut emma_context = EntityPrehension::default();
    emma_context.current_turn_entities.insert("emma".to_string(), 0.9);

    for _ in 0..5 {
        e.process_turn(
            "user-s6",
            "emma, i trust you and i feel close to you, i'm so sorry that happened",
            Some(0.9),
            Some(TurnContextInput {
                entity_prehension: Some(emma_context.clone()),
                ..Default::default()
            }),
        )
        .await;
    }

    let with_emma = e
        .process_turn(
            "user-s6",
            "just checking in today",
            None,
            Some(TurnContextInput {
                entity_prehension: Some(emma_context.clone()),
                ..Default::default()
            }),
        )
        .await;
    let without_entity = e.process_turn("user-s6-control", "just checking in today", None, None).await;

    let bond_with = with_emma
        .organ_results
        .iter()
        .find(|r| r.organ == OrganKind::Bond)
        .unwrap()
        .coherence;
    let bond_without = without_entity
        .organ_results
        .iter()
        .find(|r| r.organ == OrganKind::Bond)
        .unwrap()
        .coherence;
    let empathy_with = with_emma
        .organ_results
        .iter()
        .find(|r| r.organ == OrganKind::Empathy)
        .unwrap()
        .coherence;
    let empathy_without = without_entity
        .organ_results
        .iter()
        .find(|r| r.organ == OrganKind::Empathy)
        .unwrap()
        .coherence;

    assert!(bond_with > bond_without, "bond_with = {bond_with}, bond_without = {bond_without}");
    assert!(
        empathy_with > empathy_without,
        "empathy_with = {empathy_with}, empathy_without = {empathy_without}"
    );
}
