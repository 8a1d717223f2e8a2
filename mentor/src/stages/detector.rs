//! Defect-enumeration stage.

use anyhow::Result;
use minijinja::context;

use crate::core::state::{Message, Role};
use crate::io::generate::{GenerateRequest, Generator};
use crate::stages::{Stage, StageContext, render_prompt};

const TEMPLATE: &str = include_str!("prompts/detector.md");

/// Enumerates suspected defects in the subject text, seeded with the latest
/// analysis from the transcript. Defect categories (syntax, runtime, logic,
/// type, scope) are informative labels in the prompt, not code paths.
pub struct DetectorStage<'a, G> {
    generator: &'a G,
}

impl<'a, G: Generator> DetectorStage<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    fn build_prompt(&self, ctx: &StageContext<'_>) -> Result<String> {
        render_prompt(
            "detector",
            TEMPLATE,
            context! {
                code => ctx.subject_text,
                analysis => ctx.last_content(),
            },
        )
    }
}

impl<G: Generator> Stage for DetectorStage<'_, G> {
    fn role(&self) -> Role {
        Role::Detector
    }

    fn apply(&self, ctx: &StageContext<'_>) -> Result<Vec<Message>> {
        let prompt = self.build_prompt(ctx)?;
        let text = self.generator.generate(&GenerateRequest {
            role: Role::Detector,
            prompt,
        })?;
        Ok(vec![Message::new(Role::Detector, text)])
    }
}
