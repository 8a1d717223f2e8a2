//! Shared session state threaded through the review loop.
//!
//! The record is owned exclusively by the orchestrator. Stages only ever see
//! a read-only view ([`crate::stages::StageContext`]), so the immutability
//! rules for `subject_text` and the counters hold by construction.

use serde::{Deserialize, Serialize};

/// Author of a transcript message. One variant per pipeline stage plus the
/// controller, so the transcript is self-describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parser,
    Detector,
    Explainer,
    Guide,
    Refiner,
    Controller,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Parser => "parser",
            Role::Detector => "detector",
            Role::Explainer => "explainer",
            Role::Guide => "guide",
            Role::Refiner => "refiner",
            Role::Controller => "controller",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Validate session inputs before the loop starts.
///
/// Returns a list of problems; empty means the inputs are acceptable. The
/// boundary cap on the cycle count (`<= 5`) is CLI policy, not enforced here.
pub fn validate_inputs(subject_text: &str, iteration_limit: u32) -> Vec<String> {
    let mut problems = Vec::new();
    if subject_text.trim().is_empty() {
        problems.push("subject_text must not be empty".to_string());
    }
    if iteration_limit < 1 {
        problems.push("iteration_limit must be >= 1".to_string());
    }
    problems
}

/// The shared state record for one review session.
///
/// `subject_text` and `iteration_limit` are fixed at construction; the
/// transcript is append-only; `iteration` moves forward only through
/// [`SessionState::complete_pass`].
#[derive(Debug, Clone)]
pub struct SessionState {
    subject_text: String,
    iteration_limit: u32,
    iteration: u32,
    transcript: Vec<Message>,
}

impl SessionState {
    /// Create a fresh record. Callers must run [`validate_inputs`] first.
    pub fn new(subject_text: impl Into<String>, iteration_limit: u32) -> Self {
        Self {
            subject_text: subject_text.into(),
            iteration_limit,
            iteration: 0,
            transcript: Vec::new(),
        }
    }

    pub fn subject_text(&self) -> &str {
        &self.subject_text
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn iteration_limit(&self) -> u32 {
        self.iteration_limit
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Append one message to the end of the transcript.
    pub fn append(&mut self, message: Message) {
        self.transcript.push(message);
    }

    /// Append several messages, preserving their emission order.
    pub fn append_all(&mut self, messages: Vec<Message>) {
        self.transcript.extend(messages);
    }

    /// Record completion of one full pass through the content stages.
    ///
    /// Called exactly once per pass by the orchestrator, never by a stage or
    /// by the controller.
    pub fn complete_pass(&mut self) {
        self.iteration += 1;
    }

    /// Give up ownership of the transcript at session end.
    pub fn into_transcript(self) -> Vec<Message> {
        self.transcript
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_inputs_accepts_minimal_session() {
        assert!(validate_inputs("def f(): return x", 1).is_empty());
    }

    #[test]
    fn validate_inputs_rejects_empty_subject_and_zero_limit() {
        let problems = validate_inputs("   \n", 0);
        assert_eq!(problems.len(), 2);
        assert!(problems.iter().any(|p| p.contains("subject_text")));
        assert!(problems.iter().any(|p| p.contains("iteration_limit")));
    }

    #[test]
    fn append_preserves_order_and_prior_entries() {
        let mut state = SessionState::new("code", 3);
        state.append(Message::new(Role::Parser, "first"));
        state.append_all(vec![
            Message::new(Role::Detector, "second"),
            Message::new(Role::Explainer, "third"),
        ]);

        let contents: Vec<&str> = state
            .transcript()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn complete_pass_increments_iteration_only() {
        let mut state = SessionState::new("code", 2);
        state.append(Message::new(Role::Parser, "m"));
        state.complete_pass();
        assert_eq!(state.iteration(), 1);
        assert_eq!(state.iteration_limit(), 2);
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(state.subject_text(), "code");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Refiner).expect("serialize");
        assert_eq!(json, "\"refiner\"");
    }
}
