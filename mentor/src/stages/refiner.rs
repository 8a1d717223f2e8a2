//! Partial-guidance stage, last content stage of a pass.

use anyhow::Result;
use minijinja::context;

use crate::core::state::{Message, Role};
use crate::io::generate::{GenerateRequest, Generator};
use crate::stages::{Stage, StageContext, render_prompt};

const TEMPLATE: &str = include_str!("prompts/refiner.md");

/// Produces hints and pseudo-code from the full review so far, explicitly
/// never the complete corrected subject text.
pub struct RefinerStage<'a, G> {
    generator: &'a G,
}

impl<'a, G: Generator> RefinerStage<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    fn build_prompt(&self, ctx: &StageContext<'_>) -> Result<String> {
        render_prompt("refiner", TEMPLATE, context! { history => ctx.transcript })
    }
}

impl<G: Generator> Stage for RefinerStage<'_, G> {
    fn role(&self) -> Role {
        Role::Refiner
    }

    fn apply(&self, ctx: &StageContext<'_>) -> Result<Vec<Message>> {
        let prompt = self.build_prompt(ctx)?;
        let text = self.generator.generate(&GenerateRequest {
            role: Role::Refiner,
            prompt,
        })?;
        Ok(vec![Message::new(Role::Refiner, text)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGenerator;

    #[test]
    fn prompt_includes_all_prior_messages_in_order() {
        let generator = ScriptedGenerator::repeating("hint");
        let stage = RefinerStage::new(&generator);
        let transcript = vec![
            Message::new(Role::Parser, "structure"),
            Message::new(Role::Detector, "division by zero"),
            Message::new(Role::Explainer, "crashes when b is 0"),
            Message::new(Role::Guide, "what happens when b is 0?"),
        ];
        let ctx = StageContext {
            subject_text: "code",
            transcript: &transcript,
        };

        let prompt = stage.build_prompt(&ctx).expect("prompt");
        let detector_pos = prompt.find("division by zero").expect("detector entry");
        let guide_pos = prompt.find("what happens when b is 0?").expect("guide entry");
        assert!(detector_pos < guide_pos);
        assert!(prompt.contains("[parser]"));
        assert!(prompt.contains("NOT the complete solution"));
    }
}
