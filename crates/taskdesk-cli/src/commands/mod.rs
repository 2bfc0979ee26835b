//! Command implementations.

pub mod auth;
pub mod tasks;

use crate::app::AppState;
use std::io::{self, BufRead, Write};
use taskdesk_api::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Not logged in. Run `taskdesk login <username>` first.")]
    NotLoggedIn,

    #[error("{0}")]
    Input(String),

    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),
}

pub type CliResult<T> = Result<T, CliError>;

/// Fail unless a session was restored or established.
pub fn require_session(state: &AppState) -> CliResult<()> {
    if state.store.is_authenticated() {
        Ok(())
    } else {
        Err(CliError::NotLoggedIn)
    }
}

/// Prompt on stderr and read one line from stdin.
pub fn prompt_line(prompt: &str) -> CliResult<String> {
    eprint!("{prompt}");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        return Err(CliError::Input(format!(
            "{} cannot be empty",
            prompt.trim_end_matches(": ")
        )));
    }
    Ok(value)
}
