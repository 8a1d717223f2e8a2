//! Continue/stop decision after each completed pass.

use crate::core::state::{Message, Role, SessionState};

/// Binary continuation signal emitted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Stop,
}

/// Decides whether the orchestrator runs another pass.
///
/// Pluggable so tests can substitute a misbehaving controller; the
/// orchestrator enforces the pass ceiling independently.
pub trait Controller {
    fn decide(&self, state: &SessionState) -> Decision;
}

/// Default controller: continue while `iteration < iteration_limit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IterationController;

impl Controller for IterationController {
    fn decide(&self, state: &SessionState) -> Decision {
        if state.iteration() < state.iteration_limit() {
            Decision::Continue
        } else {
            Decision::Stop
        }
    }
}

/// Observability notice recorded in the transcript for each decision.
///
/// Instrumentation only; the [`Decision`] enum is the control signal.
pub fn decision_notice(decision: Decision) -> Message {
    let content = match decision {
        Decision::Continue => "planning next review cycle",
        Decision::Stop => "maximum review cycles reached; analysis complete",
    };
    Message::new(Role::Controller, content)
}
