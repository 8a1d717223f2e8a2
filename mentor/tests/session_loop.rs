//! End-to-end loop behavior with the real stage pipeline and scripted fakes.

use mentor::core::controller::IterationController;
use mentor::core::state::Role;
use mentor::session::{
    CancelToken, SessionErrorKind, SessionRequest, StopReason, run_session,
};
use mentor::stages::{Stage, default_stages};
use mentor::test_support::{NoopStage, ProbeStage, ScriptedGenerator};

fn request(limit: u32, retries: u32) -> SessionRequest {
    SessionRequest {
        subject_text: "def f(): return x".to_string(),
        iteration_limit: limit,
        max_stage_retries: retries,
    }
}

/// The full five-stage pipeline over a scripted generator: every pass
/// appends one message per stage plus a controller notice, in stage order.
#[test]
fn full_pipeline_runs_the_configured_number_of_cycles() {
    let generator = ScriptedGenerator::repeating("analysis");
    let stages = default_stages(&generator);

    let outcome = run_session(
        &stages,
        &IterationController,
        &request(2, 0),
        &CancelToken::new(),
        |_| {},
    )
    .expect("session");

    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.stop, StopReason::LimitReached);
    // 5 content messages + 1 controller notice per pass.
    assert_eq!(outcome.transcript.len(), 12);

    let expected_pass = [
        Role::Parser,
        Role::Detector,
        Role::Explainer,
        Role::Guide,
        Role::Refiner,
        Role::Controller,
    ];
    for (i, message) in outcome.transcript.iter().enumerate() {
        assert_eq!(message.role, expected_pass[i % 6], "message {i}");
    }
}

/// Subject text observed by the refiner slot in pass 3 equals the one the
/// parser slot saw in pass 1.
#[test]
fn subject_text_is_identical_across_passes_and_stages() {
    let first = ProbeStage::new(Role::Parser);
    let last = ProbeStage::new(Role::Refiner);
    let first_seen = first.observations();
    let last_seen = last.observations();

    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(first),
        Box::new(NoopStage::new(Role::Detector)),
        Box::new(NoopStage::new(Role::Explainer)),
        Box::new(NoopStage::new(Role::Guide)),
        Box::new(last),
    ];

    run_session(
        &stages,
        &IterationController,
        &request(3, 0),
        &CancelToken::new(),
        |_| {},
    )
    .expect("session");

    let first_seen = first_seen.lock().expect("lock");
    let last_seen = last_seen.lock().expect("lock");
    assert_eq!(first_seen.len(), 3);
    assert_eq!(last_seen.len(), 3);
    assert_eq!(first_seen[0], "def f(): return x");
    assert_eq!(last_seen[2], first_seen[0]);
}

/// An exhausted generator fails the detector: the parser's message from the
/// failing pass survives in the partial transcript, later stages never run.
#[test]
fn generator_exhaustion_halts_the_pass_with_partial_transcript() {
    let generator = ScriptedGenerator::with_responses(vec!["structure".to_string()]);
    let stages = default_stages(&generator);

    let err = run_session(
        &stages,
        &IterationController,
        &request(1, 1),
        &CancelToken::new(),
        |_| {},
    )
    .expect_err("detector should fail");

    match &err.kind {
        SessionErrorKind::StageUnavailable { role, attempts, .. } => {
            assert_eq!(*role, Role::Detector);
            assert_eq!(*attempts, 2, "one attempt plus one retry");
        }
        other => panic!("unexpected error kind: {other:?}"),
    }
    assert_eq!(err.iterations, 0);
    assert_eq!(err.transcript.len(), 1);
    assert_eq!(err.transcript[0].role, Role::Parser);
    assert_eq!(err.transcript[0].content, "structure");
}

/// Cancellation takes effect at the next stage boundary; the messages
/// produced before it are preserved.
#[test]
fn cancellation_mid_pass_preserves_produced_messages() {
    let generator = ScriptedGenerator::repeating("analysis");
    let stages = default_stages(&generator);
    let cancel = CancelToken::new();

    let trigger = cancel.clone();
    let outcome = run_session(
        &stages,
        &IterationController,
        &request(3, 0),
        &cancel,
        move |message| {
            if message.role == Role::Explainer {
                trigger.cancel();
            }
        },
    )
    .expect("session");

    assert_eq!(outcome.stop, StopReason::Cancelled);
    assert_eq!(outcome.iterations, 0);
    // Parser, detector, and explainer ran; guide never started.
    assert_eq!(outcome.transcript.len(), 3);
    assert_eq!(outcome.transcript.last().expect("message").role, Role::Explainer);
}
