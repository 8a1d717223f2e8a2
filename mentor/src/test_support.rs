//! Test-only doubles for the generator, stages, and controller.

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use crate::core::controller::{Controller, Decision};
use crate::core::state::{Message, Role, SessionState};
use crate::io::generate::{GenerateRequest, Generator};
use crate::stages::{Stage, StageContext};

/// Generator that returns predetermined text without any backend.
pub struct ScriptedGenerator {
    responses: Mutex<Vec<String>>,
    repeating: Option<String>,
}

impl ScriptedGenerator {
    /// Return the same text for every request.
    pub fn repeating(text: &str) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            repeating: Some(text.to_string()),
        }
    }

    /// Return the given responses in order, failing once exhausted.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let mut queued = responses;
        queued.reverse();
        Self {
            responses: Mutex::new(queued),
            repeating: None,
        }
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, _request: &GenerateRequest) -> Result<String> {
        if let Some(text) = &self.repeating {
            return Ok(text.clone());
        }
        self.responses
            .lock()
            .expect("scripted generator lock")
            .pop()
            .ok_or_else(|| anyhow!("scripted generator exhausted"))
    }
}

/// Stage that appends one fixed message per application.
pub struct StaticStage {
    role: Role,
    content: String,
}

impl StaticStage {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

impl Stage for StaticStage {
    fn role(&self) -> Role {
        self.role
    }

    fn apply(&self, _ctx: &StageContext<'_>) -> Result<Vec<Message>> {
        Ok(vec![Message::new(self.role, self.content.clone())])
    }
}

/// Stage that appends nothing.
pub struct NoopStage {
    role: Role,
}

impl NoopStage {
    pub fn new(role: Role) -> Self {
        Self { role }
    }
}

impl Stage for NoopStage {
    fn role(&self) -> Role {
        self.role
    }

    fn apply(&self, _ctx: &StageContext<'_>) -> Result<Vec<Message>> {
        Ok(Vec::new())
    }
}

/// Stage that always fails with the given message.
pub struct FailingStage {
    role: Role,
    error: String,
}

impl FailingStage {
    pub fn new(role: Role, error: &str) -> Self {
        Self {
            role,
            error: error.to_string(),
        }
    }
}

impl Stage for FailingStage {
    fn role(&self) -> Role {
        self.role
    }

    fn apply(&self, _ctx: &StageContext<'_>) -> Result<Vec<Message>> {
        Err(anyhow!("{}", self.error))
    }
}

/// Stage that records the subject text it observed on each application.
///
/// Lets tests assert the subject is identical across passes; the shared
/// handle stays usable after the stage is boxed into a pipeline.
pub struct ProbeStage {
    role: Role,
    observed: Arc<Mutex<Vec<String>>>,
}

impl ProbeStage {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            observed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the recorded observations.
    pub fn observations(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.observed)
    }
}

impl Stage for ProbeStage {
    fn role(&self) -> Role {
        self.role
    }

    fn apply(&self, ctx: &StageContext<'_>) -> Result<Vec<Message>> {
        self.observed
            .lock()
            .expect("probe lock")
            .push(ctx.subject_text.to_string());
        Ok(Vec::new())
    }
}

/// Controller that ignores the state and always continues. Exists to prove
/// the orchestrator's pass ceiling holds on its own.
pub struct AlwaysContinueController;

impl Controller for AlwaysContinueController {
    fn decide(&self, _state: &SessionState) -> Decision {
        Decision::Continue
    }
}
