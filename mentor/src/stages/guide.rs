//! Socratic questioning stage.

use anyhow::Result;
use minijinja::context;

use crate::core::state::{Message, Role};
use crate::io::generate::{GenerateRequest, Generator};
use crate::stages::{Stage, StageContext, render_prompt};

const TEMPLATE: &str = include_str!("prompts/guide.md");

/// Turns the Explainer's output into open-ended questions, no direct answers.
pub struct GuideStage<'a, G> {
    generator: &'a G,
}

impl<'a, G: Generator> GuideStage<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    fn build_prompt(&self, ctx: &StageContext<'_>) -> Result<String> {
        let explanation = ctx.last_content_from(Role::Explainer).unwrap_or_default();
        render_prompt("guide", TEMPLATE, context! { explanation => explanation })
    }
}

impl<G: Generator> Stage for GuideStage<'_, G> {
    fn role(&self) -> Role {
        Role::Guide
    }

    fn apply(&self, ctx: &StageContext<'_>) -> Result<Vec<Message>> {
        let prompt = self.build_prompt(ctx)?;
        let text = self.generator.generate(&GenerateRequest {
            role: Role::Guide,
            prompt,
        })?;
        Ok(vec![Message::new(Role::Guide, text)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGenerator;

    #[test]
    fn prompt_builds_on_latest_explanation() {
        let generator = ScriptedGenerator::repeating("question");
        let stage = GuideStage::new(&generator);
        let transcript = vec![Message::new(Role::Explainer, "the loop variable leaks")];
        let ctx = StageContext {
            subject_text: "code",
            transcript: &transcript,
        };

        let prompt = stage.build_prompt(&ctx).expect("prompt");
        assert!(prompt.contains("the loop variable leaks"));
        assert!(prompt.contains("Socratic"));
    }
}
