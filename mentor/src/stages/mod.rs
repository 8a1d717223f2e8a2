//! The five content stages of the review pipeline.
//!
//! Every stage implements the same contract: read the current state view,
//! return zero or more messages to append. Stages never see the iteration
//! counters and cannot touch the subject text or prior transcript entries.

use anyhow::{Context, Result};
use minijinja::Environment;

use crate::core::state::{Message, Role};
use crate::io::generate::Generator;

pub mod detector;
pub mod explainer;
pub mod guide;
pub mod parser;
pub mod refiner;

pub use detector::DetectorStage;
pub use explainer::ExplainerStage;
pub use guide::GuideStage;
pub use parser::ParserStage;
pub use refiner::RefinerStage;

/// Read-only view of the session state offered to a stage.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    /// The code under review. Fixed for the whole session.
    pub subject_text: &'a str,
    /// All messages appended so far, across every pass.
    pub transcript: &'a [Message],
}

impl<'a> StageContext<'a> {
    /// Content of the most recent message, regardless of role.
    pub fn last_content(&self) -> Option<&'a str> {
        self.transcript.last().map(|m| m.content.as_str())
    }

    /// Content of the most recent message from the given role.
    pub fn last_content_from(&self, role: Role) -> Option<&'a str> {
        self.transcript
            .iter()
            .rev()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }
}

/// One pluggable analysis/explanation unit in the pipeline.
pub trait Stage {
    /// Role the stage's output is attributed to.
    fn role(&self) -> Role;

    /// Produce the messages to append for the current state view.
    ///
    /// Failure means the stage could not produce output (backend unavailable
    /// or rejecting); the orchestrator owns the retry policy.
    fn apply(&self, ctx: &StageContext<'_>) -> Result<Vec<Message>>;
}

/// The fixed production pipeline, in execution order.
pub fn default_stages<'a, G: Generator>(generator: &'a G) -> Vec<Box<dyn Stage + 'a>> {
    vec![
        Box::new(ParserStage::new(generator)),
        Box::new(DetectorStage::new(generator)),
        Box::new(ExplainerStage::new(generator)),
        Box::new(GuideStage::new(generator)),
        Box::new(RefinerStage::new(generator)),
    ]
}

/// Render an embedded prompt template with the given context.
pub(crate) fn render_prompt(name: &str, source: &str, ctx: minijinja::Value) -> Result<String> {
    let mut env = Environment::new();
    env.add_template(name, source)
        .with_context(|| format!("register {name} template"))?;
    let rendered = env
        .get_template(name)
        .with_context(|| format!("load {name} template"))?
        .render(ctx)
        .with_context(|| format!("render {name} template"))?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_content_from_skips_other_roles() {
        let transcript = vec![
            Message::new(Role::Parser, "structure"),
            Message::new(Role::Detector, "bugs"),
            Message::new(Role::Controller, "notice"),
        ];
        let ctx = StageContext {
            subject_text: "code",
            transcript: &transcript,
        };

        assert_eq!(ctx.last_content(), Some("notice"));
        assert_eq!(ctx.last_content_from(Role::Detector), Some("bugs"));
        assert_eq!(ctx.last_content_from(Role::Refiner), None);
    }

    #[test]
    fn default_stages_are_in_pipeline_order() {
        let generator = crate::test_support::ScriptedGenerator::repeating("text");
        let stages = default_stages(&generator);
        let roles: Vec<Role> = stages.iter().map(|s| s.role()).collect();
        assert_eq!(
            roles,
            vec![
                Role::Parser,
                Role::Detector,
                Role::Explainer,
                Role::Guide,
                Role::Refiner,
            ]
        );
    }
}
