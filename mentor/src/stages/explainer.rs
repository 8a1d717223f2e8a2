//! Cause/effect explanation stage.

use anyhow::Result;
use minijinja::context;

use crate::core::state::{Message, Role};
use crate::io::generate::{GenerateRequest, Generator};
use crate::stages::{Stage, StageContext, render_prompt};

const TEMPLATE: &str = include_str!("prompts/explainer.md");

/// Explains the Detector's findings in junior-developer terms.
pub struct ExplainerStage<'a, G> {
    generator: &'a G,
}

impl<'a, G: Generator> ExplainerStage<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    fn build_prompt(&self, ctx: &StageContext<'_>) -> Result<String> {
        let findings = ctx.last_content_from(Role::Detector).unwrap_or_default();
        render_prompt("explainer", TEMPLATE, context! { findings => findings })
    }
}

impl<G: Generator> Stage for ExplainerStage<'_, G> {
    fn role(&self) -> Role {
        Role::Explainer
    }

    fn apply(&self, ctx: &StageContext<'_>) -> Result<Vec<Message>> {
        let prompt = self.build_prompt(ctx)?;
        let text = self.generator.generate(&GenerateRequest {
            role: Role::Explainer,
            prompt,
        })?;
        Ok(vec![Message::new(Role::Explainer, text)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGenerator;

    #[test]
    fn prompt_uses_latest_detector_findings() {
        let generator = ScriptedGenerator::repeating("explanation");
        let stage = ExplainerStage::new(&generator);
        let transcript = vec![
            Message::new(Role::Detector, "old findings"),
            Message::new(Role::Parser, "structure"),
            Message::new(Role::Detector, "NameError: res is undefined"),
        ];
        let ctx = StageContext {
            subject_text: "code",
            transcript: &transcript,
        };

        let prompt = stage.build_prompt(&ctx).expect("prompt");
        assert!(prompt.contains("NameError: res is undefined"));
        assert!(!prompt.contains("old findings"));
    }
}
