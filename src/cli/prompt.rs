//! Interactive prompts backed by dialoguer

use console::Term;
use dialoguer::{theme::ColorfulTheme, Confirm as ConfirmPrompt, Input, Select};
use miette::{IntoDiagnostic, Result};

use crate::views::Confirm;

/// Asks on the terminal, or answers yes when `--yes` was given.
///
/// Without a terminal and without `--yes` every question is declined.
#[derive(Debug, Clone, Copy)]
pub struct TerminalConfirm {
    assume_yes: bool,
}

impl TerminalConfirm {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if !Term::stderr().is_term() {
            tracing::debug!(prompt, "no terminal, declining confirmation");
            return false;
        }
        ConfirmPrompt::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Prompt for a line of text, optionally pre-filled
pub fn text(prompt: &str, initial: &str, allow_empty: bool) -> Result<String> {
    let theme = ColorfulTheme::default();
    let mut input = Input::<String>::with_theme(&theme)
        .with_prompt(prompt)
        .allow_empty(allow_empty);
    if !initial.is_empty() {
        input = input.with_initial_text(initial);
    }
    input.interact_text().into_diagnostic()
}

/// Prompt for a number
pub fn number<T>(prompt: &str, initial: T) -> Result<T>
where
    T: Clone + ToString + std::str::FromStr,
    <T as std::str::FromStr>::Err: ToString,
{
    Input::<T>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .with_initial_text(initial.to_string())
        .interact_text()
        .into_diagnostic()
}

/// Pick one of `items`; returns its index
pub fn choose<S: ToString>(prompt: &str, items: &[S], default: usize) -> Result<usize> {
    Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(items)
        .default(default.min(items.len().saturating_sub(1)))
        .interact()
        .into_diagnostic()
}

/// Yes/no question asked during interactive entry
pub fn ask(prompt: &str, default: bool) -> Result<bool> {
    ConfirmPrompt::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()
        .into_diagnostic()
}
