//! Loop orchestration for one review session.
//!
//! The orchestrator owns the [`SessionState`], drives the fixed stage
//! sequence pass by pass, applies the controller's decision, and bounds the
//! run with its own pass ceiling regardless of what the controller returns.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument, warn};

use crate::core::controller::{Controller, Decision, decision_notice};
use crate::core::invariants::check_pass_boundary;
use crate::core::state::{Message, Role, SessionState, validate_inputs};
use crate::stages::{Stage, StageContext};

/// Cooperative cancellation flag, observed at every stage boundary.
///
/// An in-flight stage call runs to completion; once the flag is set no
/// further stage is invoked.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Inputs for one end-to-end session run.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    /// The code under review.
    pub subject_text: String,
    /// Maximum number of passes. The CLI boundary caps this at 5; the core
    /// only requires `>= 1`.
    pub iteration_limit: u32,
    /// Extra attempts per stage call after the first one fails.
    pub max_stage_retries: u32,
}

/// Why a successful run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The controller stopped the loop, or the pass ceiling was reached.
    LimitReached,
    /// Cancellation was observed at a stage boundary.
    Cancelled,
}

/// Final state of a session that terminated without error.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Completed passes.
    pub iterations: u32,
    pub stop: StopReason,
    /// The full ordered transcript, content messages and controller notices.
    pub transcript: Vec<Message>,
}

/// Classification of a terminal session failure.
#[derive(Debug)]
pub enum SessionErrorKind {
    /// Rejected before the loop started; never retried.
    InvalidConfiguration { problems: Vec<String> },
    /// A stage's backend call kept failing after bounded retries.
    StageUnavailable {
        role: Role,
        attempts: u32,
        last_error: String,
    },
    /// Defensive state check failed; indicates a programming defect.
    InvariantViolation { problems: Vec<String> },
}

/// Terminal session failure. The transcript accumulated before the failure
/// is preserved so the consumer can still render what was produced.
#[derive(Debug)]
pub struct SessionError {
    pub kind: SessionErrorKind,
    /// Passes completed before the failure.
    pub iterations: u32,
    pub transcript: Vec<Message>,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SessionErrorKind::InvalidConfiguration { problems } => {
                write!(f, "invalid configuration: {}", problems.join("; "))
            }
            SessionErrorKind::StageUnavailable {
                role,
                attempts,
                last_error,
            } => {
                write!(
                    f,
                    "{role} stage unavailable after {attempts} attempts: {last_error}"
                )
            }
            SessionErrorKind::InvariantViolation { problems } => {
                write!(f, "state invariant violated: {}", problems.join("; "))
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Run the review loop to completion.
///
/// One pass applies every stage in order, each stage seeing the transcript
/// its predecessors produced, then increments the iteration counter and asks
/// the controller whether to continue. `on_message` fires for every appended
/// message in order, so an external consumer can render incrementally.
#[instrument(skip_all, fields(iteration_limit = request.iteration_limit))]
pub fn run_session<C: Controller, F: FnMut(&Message)>(
    stages: &[Box<dyn Stage + '_>],
    controller: &C,
    request: &SessionRequest,
    cancel: &CancelToken,
    mut on_message: F,
) -> Result<SessionOutcome, SessionError> {
    let problems = validate_inputs(&request.subject_text, request.iteration_limit);
    if !problems.is_empty() {
        return Err(SessionError {
            kind: SessionErrorKind::InvalidConfiguration { problems },
            iterations: 0,
            transcript: Vec::new(),
        });
    }

    let mut state = SessionState::new(request.subject_text.clone(), request.iteration_limit);
    info!(iteration_limit = request.iteration_limit, "session started");

    loop {
        let transcript_len_before = state.transcript().len();

        for stage in stages {
            if cancel.is_cancelled() {
                info!(iteration = state.iteration(), "session cancelled");
                return Ok(SessionOutcome {
                    iterations: state.iteration(),
                    stop: StopReason::Cancelled,
                    transcript: state.into_transcript(),
                });
            }

            match apply_with_retries(stage.as_ref(), &state, request.max_stage_retries) {
                Ok(messages) => {
                    for message in &messages {
                        on_message(message);
                    }
                    state.append_all(messages);
                }
                Err((attempts, err)) => {
                    warn!(role = %stage.role(), attempts, "stage failed; halting session");
                    return Err(SessionError {
                        kind: SessionErrorKind::StageUnavailable {
                            role: stage.role(),
                            attempts,
                            last_error: format!("{err:#}"),
                        },
                        iterations: state.iteration(),
                        transcript: state.into_transcript(),
                    });
                }
            }
        }

        state.complete_pass();
        debug!(iteration = state.iteration(), "pass completed");

        let problems = check_pass_boundary(&state, transcript_len_before);
        if !problems.is_empty() {
            return Err(SessionError {
                kind: SessionErrorKind::InvariantViolation { problems },
                iterations: state.iteration(),
                transcript: state.into_transcript(),
            });
        }

        let decision = controller.decide(&state);
        let notice = decision_notice(decision);
        on_message(&notice);
        state.append(notice);

        match decision {
            Decision::Stop => break,
            Decision::Continue => {
                // Ceiling enforced independently of the controller: a
                // controller that always continues must not loop unbounded.
                if state.iteration() >= state.iteration_limit() {
                    warn!(
                        iteration = state.iteration(),
                        "controller asked to continue at the pass ceiling"
                    );
                    break;
                }
            }
        }
    }

    info!(iterations = state.iteration(), "session stopped");
    Ok(SessionOutcome {
        iterations: state.iteration(),
        stop: StopReason::LimitReached,
        transcript: state.into_transcript(),
    })
}

/// Apply one stage, retrying the same input state a bounded number of times.
///
/// Returns the messages to append, or the attempt count and last error once
/// retries are exhausted.
fn apply_with_retries(
    stage: &dyn Stage,
    state: &SessionState,
    max_retries: u32,
) -> Result<Vec<Message>, (u32, anyhow::Error)> {
    let ctx = StageContext {
        subject_text: state.subject_text(),
        transcript: state.transcript(),
    };

    let mut attempts = 0;
    loop {
        attempts += 1;
        match stage.apply(&ctx) {
            Ok(messages) => return Ok(messages),
            Err(err) => {
                if attempts > max_retries {
                    return Err((attempts, err));
                }
                warn!(role = %stage.role(), attempt = attempts, "stage attempt failed; retrying");
            }
        }
    }
}
