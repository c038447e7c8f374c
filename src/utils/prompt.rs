/// Interactive prompts
///
/// The dispatcher asks two questions during a run: whether to open stegsolve
/// and which header to write into a corrupt file. Both go through `Prompt` so
/// a run can be scripted.

use std::io;

use dialoguer::Input;

/// Source of answers to yes/no and free-text questions
pub trait Prompt {
    /// Ask a free-text question; an empty answer is allowed
    fn input(&self, question: &str) -> io::Result<String>;

    /// Ask a yes/no question; only `y` or `yes` (any case) count as yes
    fn confirm(&self, question: &str) -> io::Result<bool> {
        Ok(is_yes(&self.input(question)?))
    }
}

/// `y` or `yes`, ignoring case and surrounding whitespace
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Prompts on the controlling terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn input(&self, question: &str) -> io::Result<String> {
        Input::<String>::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()
    }
}
