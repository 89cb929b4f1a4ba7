//! Terminal output and prompts for the wizard.

use crate::error::{Result, WizardError};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, Password, PasswordDisplayMode, Select, Text};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Extra entry offered after a question's suggested answers
const OWN_ANSWER: &str = "Type my own answer";

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress everything but errors
pub fn set_quiet_mode(quiet: bool) {
    QUIET.store(quiet, Ordering::SeqCst);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::SeqCst)
}

pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

/// Ask one wizard question.
///
/// With suggested answers (chips) the user picks one from a list that also
/// offers [`OWN_ANSWER`]; otherwise, or after picking that entry, free text is
/// read.
pub fn prompt_answer(heading: &str, chips: &[String]) -> Result<String> {
    if chips.is_empty() {
        return prompt_text(heading);
    }
    let picked = Select::new(heading, answer_options(chips))
        .with_page_size(chips.len() + 1)
        .prompt()
        .map_err(|_| WizardError::UserCancelled)?;
    if picked == OWN_ANSWER {
        prompt_text(heading)
    } else {
        Ok(picked)
    }
}

/// Chips in order, without duplicates, followed by [`OWN_ANSWER`]
fn answer_options(chips: &[String]) -> Vec<String> {
    let mut options: Vec<String> = Vec::with_capacity(chips.len() + 1);
    for chip in chips.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        if chip != OWN_ANSWER && !options.iter().any(|o| o == chip) {
            options.push(chip.to_string());
        }
    }
    options.push(OWN_ANSWER.to_string());
    options
}

pub fn prompt_text(message: &str) -> Result<String> {
    Text::new(message).prompt().map_err(|_| WizardError::UserCancelled)
}

/// Read a secret without echoing it
pub fn prompt_password(message: &str) -> Result<String> {
    Password::new(message)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .map_err(|_| WizardError::UserCancelled)
}

pub fn prompt_confirm(message: &str, default: bool) -> Result<bool> {
    Confirm::new(message)
        .with_default(default)
        .prompt()
        .map_err(|_| WizardError::UserCancelled)
}

/// Spinner shown while a request is running; hidden in quiet mode
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let bar = if is_quiet() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        let template = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(template.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Spinner { bar }
    }

    pub fn finish_with_error(&self, message: &str) {
        self.bar.finish_with_message(format!("{} {}", style("✗").red(), message));
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

#[derive(Clone, Copy)]
enum Status {
    Success,
    Info,
    Warning,
    Error,
}

fn emit(status: Status, message: &str) {
    match status {
        Status::Error => eprintln!("{} {}", style("✗").red(), message),
        _ if is_quiet() => {}
        Status::Warning => eprintln!("{} {}", style("!").yellow(), message),
        Status::Success => println!("{} {}", style("✓").green(), message),
        Status::Info => println!("{} {}", style("→").blue(), message),
    }
}

pub fn print_success(message: &str) {
    emit(Status::Success, message);
}

/// Shown even in quiet mode
pub fn print_error(message: &str) {
    emit(Status::Error, message);
}

pub fn print_warning(message: &str) {
    emit(Status::Warning, message);
}

pub fn print_info(message: &str) {
    emit(Status::Info, message);
}

pub fn print_blank() {
    if !is_quiet() {
        println!();
    }
}
