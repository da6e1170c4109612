//! Operator interaction
//!
//! Resolution and confirmation ask questions through [`Prompter`]. The
//! interactive implementation talks to the terminal; the non-interactive one
//! answers every question with its default and approves every confirmation.

pub use crate::error::PromptError;
use inquire::{Confirm, Select, Text};

pub trait Prompter {
    fn is_interactive(&self) -> bool;

    /// Free text with a displayed default
    fn input(&self, message: &str, default: &str) -> Result<String, PromptError>;

    /// Pick one option, returning its index
    fn select(&self, message: &str, options: &[String], default: usize) -> Result<usize, PromptError>;

    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InteractivePrompter;

impl Prompter for InteractivePrompter {
    fn is_interactive(&self) -> bool {
        true
    }

    fn input(&self, message: &str, default: &str) -> Result<String, PromptError> {
        let answer = Text::new(message).with_default(default).prompt()?;
        let answer = answer.trim();
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer.to_string()
        })
    }

    fn select(&self, message: &str, options: &[String], default: usize) -> Result<usize, PromptError> {
        let choice = Select::new(message, options.to_vec())
            .with_starting_cursor(default)
            .without_help_message()
            .prompt()?;
        Ok(options.iter().position(|o| *o == choice).unwrap_or(default))
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError> {
        Ok(Confirm::new(message).with_default(default).prompt()?)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractivePrompter;

impl Prompter for NonInteractivePrompter {
    fn is_interactive(&self) -> bool {
        false
    }

    fn input(&self, _message: &str, default: &str) -> Result<String, PromptError> {
        Ok(default.to_string())
    }

    fn select(&self, _message: &str, _options: &[String], default: usize) -> Result<usize, PromptError> {
        Ok(default)
    }

    fn confirm(&self, _message: &str, _default: bool) -> Result<bool, PromptError> {
        Ok(true)
    }
}
