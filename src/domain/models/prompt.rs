use serde::Serialize;

use super::role::SpecialistRole;

/// A specialist system prompt before rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedPrompt {
    /// Role the prompt was composed for
    pub role: SpecialistRole,
    /// Retrieved chunk texts joined with newlines; may be empty
    pub context_block: String,
    /// Static role instructions, placeholders left literal
    pub instructions: String,
}

impl ComposedPrompt {
    /// Prompt for `role` around an already retrieved context block.
    pub fn new(role: SpecialistRole, context_block: String) -> Self {
        Self {
            role,
            context_block,
            instructions: role.instructions().to_string(),
        }
    }

    /// Render as header, context block, then instructions.
    pub fn render(&self) -> String {
        format!(
            "{}\n{}\n\n{}\n",
            self.role.context_header(),
            self.context_block,
            self.instructions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_order() {
        let prompt = ComposedPrompt::new(SpecialistRole::Optimizer, "ctx line".into());
        let rendered = prompt.render();
        let header = rendered.find("Contexto Otimizador:").unwrap();
        let context = rendered.find("ctx line").unwrap();
        let instructions = rendered.find("navios graneleiros").unwrap();
        assert!(header < context && context < instructions);
    }

    #[test]
    fn test_render_with_empty_context() {
        let prompt = ComposedPrompt::new(SpecialistRole::Helper, String::new());
        assert!(prompt.render().starts_with("Contexto Helper:\n\n"));
    }
}
