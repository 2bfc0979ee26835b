//! Terminal output.

use crate::app::AppState;
use crate::commands::CliError;
use serde_json::json;
use taskdesk_api::{ApiError, Page, Task, TaskId, UserProfile};

/// Renders command results as text or JSON.
pub struct Printer {
    json: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit(&self, value: serde_json::Value) {
        match serde_json::to_string_pretty(&value) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => eprintln!("Error: failed to render output: {e}"),
        }
    }

    pub fn message(&self, text: &str) {
        if self.json {
            self.emit(json!({ "message": text }));
        } else {
            println!("{text}");
        }
    }

    pub fn logged_in(&self, profile: &UserProfile) {
        if self.json {
            self.emit(json!({ "logged_in": true, "user": profile }));
        } else {
            println!("Logged in as {} <{}>", profile.full_name, profile.email);
        }
    }

    pub fn registered(&self, profile: &UserProfile) {
        if self.json {
            self.emit(json!({ "registered": true, "user": profile }));
        } else {
            println!(
                "Registered {} <{}>. Run `taskdesk login` to sign in.",
                profile.full_name, profile.email
            );
        }
    }

    pub fn profile(&self, profile: &UserProfile) {
        if self.json {
            self.emit(json!(profile));
        } else {
            println!("{} <{}> (id {})", profile.full_name, profile.email, profile.id);
        }
    }

    pub fn status(&self, state: &AppState) {
        let session = state.store.snapshot();
        let credentials_file = state.paths.credentials_file();
        if self.json {
            self.emit(json!({
                "authenticated": session.is_authenticated,
                "api_base_url": state.client().base_url().as_str(),
                "credentials_file": credentials_file.display().to_string(),
                "refresh_timeout_secs": state.config.refresh_timeout_secs,
            }));
            return;
        }

        if session.is_authenticated {
            println!("Session:      stored credentials found");
        } else {
            println!("Session:      not logged in");
        }
        println!("API:          {}", state.client().base_url());
        println!("Credentials:  {}", credentials_file.display());
        match state.config.refresh_timeout_secs {
            Some(secs) => println!("Refresh wait: {secs}s"),
            None => println!("Refresh wait: unbounded"),
        }
    }

    pub fn task_page(&self, page: &Page<Task>, number: u32) {
        if self.json {
            self.emit(json!(page));
            return;
        }

        if page.results.is_empty() {
            println!("No tasks found.");
            return;
        }
        for task in &page.results {
            println!("{}", task_line(task));
        }
        let mut footer = format!("Page {number}, {} task(s) in total", page.count);
        if page.has_next() {
            footer.push_str(&format!(". Next: --page {}", number + 1));
        }
        println!("{footer}");
    }

    pub fn task(&self, task: &Task) {
        if self.json {
            self.emit(json!(task));
            return;
        }

        println!("#{} {}", task.id, task.title);
        println!("Status:   {}", task.status);
        println!("Created:  {}", task.created_at.format("%Y-%m-%d %H:%M"));
        println!("Updated:  {}", task.updated_at.format("%Y-%m-%d %H:%M"));
        if !task.description.is_empty() {
            println!();
            println!("{}", task.description);
        }
    }

    pub fn deleted(&self, id: TaskId) {
        if self.json {
            self.emit(json!({ "deleted": id }));
        } else {
            println!("Deleted task #{id}");
        }
    }

    /// Report a failure on stderr.
    pub fn error(&self, err: &CliError) {
        let (kind, status) = classify(err);
        if self.json {
            eprintln!(
                "{}",
                json!({ "error": kind, "status": status, "message": err.to_string() })
            );
            return;
        }

        match status {
            Some(status) => eprintln!("Error ({kind}, HTTP {status}): {err}"),
            None => eprintln!("Error ({kind}): {err}"),
        }
        if matches!(err, CliError::Api(e) if e.is_session_expired()) {
            eprintln!("Your session has ended. Run `taskdesk login <username>` to sign in again.");
        }
    }
}

fn task_line(task: &Task) -> String {
    format!(
        "#{:<5} [{:<11}] {}  (updated {})",
        task.id,
        task.status.as_str(),
        task.title,
        task.updated_at.format("%Y-%m-%d %H:%M")
    )
}

/// Short category for an error plus the HTTP status behind it.
fn classify(err: &CliError) -> (&'static str, Option<u16>) {
    match err {
        CliError::Api(api) => {
            let kind = match api {
                ApiError::Validation(_) => "invalid input",
                ApiError::Refresh(_) => "session expired",
                ApiError::Unauthorized { .. } => "unauthorized",
                ApiError::Network(_) => "network error",
                _ => match api.status() {
                    Some(404) => "not found",
                    Some(status) if status >= 500 => "server error",
                    Some(_) => "request rejected",
                    None => "client error",
                },
            };
            (kind, api.status())
        }
        CliError::NotLoggedIn => ("not logged in", None),
        CliError::Input(_) | CliError::Io(_) => ("invalid input", None),
    }
}
