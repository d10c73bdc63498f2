//! Interactive questions.
//!
//! The orchestrator only asks two kinds of question: pick one of several
//! toolchains, and confirm overwriting an existing `.vscode`. Both go through
//! [`Prompter`] so non-interactive runs and tests can answer them.

use colored::*;
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, InquireError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("cancelled by user")]
    Cancelled,
    #[error("cannot prompt: {0}")]
    Unavailable(String),
}

impl From<InquireError> for PromptError {
    fn from(e: InquireError) -> Self {
        match e {
            InquireError::OperationCanceled | InquireError::OperationInterrupted => {
                PromptError::Cancelled
            }
            other => PromptError::Unavailable(other.to_string()),
        }
    }
}

pub trait Prompter {
    /// Returns a zero-based index into `options`.
    fn select_index(&mut self, message: &str, options: &[String]) -> Result<usize, PromptError>;

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError>;
}

/// Terminal prompts backed by `inquire`.
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn select_index(&mut self, message: &str, options: &[String]) -> Result<usize, PromptError> {
        for (i, option) in options.iter().enumerate() {
            println!("  {} {}", format!("[{}]", i).cyan(), option);
        }
        let len = options.len();
        let index = CustomType::<usize>::new(message)
            .with_help_message(&format!("Enter a number from 0 to {}", len.saturating_sub(1)))
            .with_error_message("Please type a number")
            .with_validator(move |i: &usize| {
                if *i < len {
                    Ok(Validation::Valid)
                } else {
                    Ok(Validation::Invalid("Index out of range".into()))
                }
            })
            .prompt()?;
        Ok(index)
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError> {
        Ok(Confirm::new(message).with_default(default).prompt()?)
    }
}
