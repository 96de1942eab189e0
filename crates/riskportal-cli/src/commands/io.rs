//! Terminal prompts for the interactive commands.

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

/// Prompt the user for confirmation with a yes/no question.
pub fn confirm_action(
    theme: &ColorfulTheme,
    prompt: &str,
    default: bool,
) -> Result<bool, dialoguer::Error> {
    Confirm::with_theme(theme)
        .with_prompt(prompt)
        .default(default)
        .interact()
}

/// Prompt for free-form text. An empty answer is returned as-is.
pub fn prompt_text(theme: &ColorfulTheme, prompt: &str) -> Result<String, dialoguer::Error> {
    Input::<String>::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
}

/// Pick one of `items`. `None` when the user backs out with Esc or q.
pub fn select(
    theme: &ColorfulTheme,
    prompt: &str,
    items: &[String],
    default: usize,
) -> Result<Option<usize>, dialoguer::Error> {
    Select::with_theme(theme)
        .with_prompt(prompt)
        .items(items)
        .default(default)
        .interact_opt()
}
