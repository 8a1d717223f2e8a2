//! Structural analysis stage, first in every pass.

use anyhow::Result;
use minijinja::context;

use crate::core::state::{Message, Role};
use crate::io::generate::{GenerateRequest, Generator};
use crate::stages::{Stage, StageContext, render_prompt};

const TEMPLATE: &str = include_str!("prompts/parser.md");

/// Summarizes declarations, control constructs, and organization of the
/// subject text. Reads nothing from the transcript.
pub struct ParserStage<'a, G> {
    generator: &'a G,
}

impl<'a, G: Generator> ParserStage<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    fn build_prompt(&self, ctx: &StageContext<'_>) -> Result<String> {
        render_prompt("parser", TEMPLATE, context! { code => ctx.subject_text })
    }
}

impl<G: Generator> Stage for ParserStage<'_, G> {
    fn role(&self) -> Role {
        Role::Parser
    }

    fn apply(&self, ctx: &StageContext<'_>) -> Result<Vec<Message>> {
        let prompt = self.build_prompt(ctx)?;
        let text = self.generator.generate(&GenerateRequest {
            role: Role::Parser,
            prompt,
        })?;
        Ok(vec![Message::new(Role::Parser, text)])
    }
}
