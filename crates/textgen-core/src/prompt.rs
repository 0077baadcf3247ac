//! Prompt-template formatting.

use crate::error::{EngineError, Result};

/// Placeholder replaced by the caller's raw prompt.
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Wrapper template applied to raw prompts before tokenization, used to
/// enforce a conversational structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFormat {
    template: String,
}

impl PromptFormat {
    /// Build a format from `template`, which must contain
    /// [`PROMPT_PLACEHOLDER`].
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(PROMPT_PLACEHOLDER) {
            return Err(EngineError::InvalidPromptFormat);
        }
        Ok(Self { template })
    }

    /// Substitute the first placeholder occurrence with `prompt`.
    pub fn apply(&self, prompt: &str) -> String {
        self.template.replacen(PROMPT_PLACEHOLDER, prompt, 1)
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_the_prompt() {
        let format = PromptFormat::new("Human: {prompt}\nAssistant: ").unwrap();
        assert_eq!(
            format.apply("Hello"),
            "Human: Hello\nAssistant: "
        );
    }

    #[test]
    fn missing_placeholder_is_rejected() {
        assert!(matches!(
            PromptFormat::new("Human: \nAssistant: "),
            Err(EngineError::InvalidPromptFormat)
        ));
    }

    #[test]
    fn only_the_first_occurrence_is_substituted() {
        let format = PromptFormat::new("{prompt} | {prompt}").unwrap();
        assert_eq!(format.apply("x"), "x | {prompt}");
    }
}
