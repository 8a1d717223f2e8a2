//! Defensive checks on the session state between passes.
//!
//! Violations indicate a programming defect in the orchestrator or a stage,
//! never an external failure, and are always fatal.

use crate::core::state::SessionState;

/// Check the state record at a pass boundary.
///
/// `transcript_len_before` is the transcript length observed before the pass
/// started. Returns human-readable violations; empty means the state is
/// consistent.
pub fn check_pass_boundary(state: &SessionState, transcript_len_before: usize) -> Vec<String> {
    let mut errors = Vec::new();

    if state.iteration() > state.iteration_limit() {
        errors.push(format!(
            "iteration {} exceeds iteration_limit {}",
            state.iteration(),
            state.iteration_limit()
        ));
    }
    if state.transcript().len() < transcript_len_before {
        errors.push(format!(
            "transcript shrank from {} to {} entries",
            transcript_len_before,
            state.transcript().len()
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{Message, Role};

    #[test]
    fn consistent_state_has_no_violations() {
        let mut state = SessionState::new("code", 2);
        state.append(Message::new(Role::Parser, "m"));
        state.complete_pass();
        assert!(check_pass_boundary(&state, 0).is_empty());
    }

    #[test]
    fn reports_iteration_over_limit() {
        let mut state = SessionState::new("code", 1);
        state.complete_pass();
        state.complete_pass();
        let errors = check_pass_boundary(&state, 0);
        assert!(errors.iter().any(|e| e.contains("exceeds iteration_limit")));
    }

    #[test]
    fn reports_transcript_shrink() {
        let state = SessionState::new("code", 1);
        let errors = check_pass_boundary(&state, 3);
        assert!(errors.iter().any(|e| e.contains("shrank")));
    }
}
