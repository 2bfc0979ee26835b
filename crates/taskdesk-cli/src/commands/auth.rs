//! Account commands.

use super::{prompt_line, require_session, CliResult};
use crate::app::AppState;
use crate::output::Printer;
use taskdesk_api::{LoginCredentials, RegisterPayload};

pub async fn login(
    state: &AppState,
    printer: &Printer,
    username: String,
    password: Option<String>,
) -> CliResult<()> {
    let password = match password {
        Some(password) => password,
        None => prompt_line("Password: ")?,
    };

    let profile = state
        .session
        .login(&LoginCredentials::new(username, password))
        .await?;
    printer.logged_in(&profile);
    Ok(())
}

pub async fn register(
    state: &AppState,
    printer: &Printer,
    full_name: String,
    email: String,
    password: Option<String>,
) -> CliResult<()> {
    let password = match password {
        Some(password) => password,
        None => prompt_line("Password: ")?,
    };

    let profile = state
        .session
        .register(&RegisterPayload {
            full_name,
            email,
            password,
        })
        .await?;
    printer.registered(&profile);
    Ok(())
}

pub fn logout(state: &AppState, printer: &Printer) -> CliResult<()> {
    state.session.logout()?;
    printer.message("Logged out.");
    Ok(())
}

pub async fn whoami(state: &AppState, printer: &Printer) -> CliResult<()> {
    require_session(state)?;
    let profile = state.session.refresh_profile().await?;
    printer.profile(&profile);
    Ok(())
}

pub fn status(state: &AppState, printer: &Printer) -> CliResult<()> {
    printer.status(state);
    Ok(())
}
