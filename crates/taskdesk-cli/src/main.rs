//! Taskdesk - command-line client for the task service.

mod app;
mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use taskdesk_api::{TaskId, TaskOrdering, TaskStatus};

/// Taskdesk command-line interface.
#[derive(Parser)]
#[command(name = "taskdesk")]
#[command(about = "Manage your tasks from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, env = "TASKDESK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Base directory for credentials, config and logs. Defaults to ~/.taskdesk
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// API base URL, e.g. http://127.0.0.1:8000/api/
    #[arg(long, global = true, env = "TASK_API_BASE_URL")]
    api_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show local session state without contacting the server
    Status,
    /// Work with tasks
    #[command(subcommand)]
    Tasks(TaskCommands),
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List tasks
    List {
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        search: Option<String>,
        /// One of title, -title, created_at, -created_at, status, -status, updated_at, -updated_at
        #[arg(long)]
        ordering: Option<TaskOrdering>,
        /// Page number, starting at 1
        #[arg(long)]
        page: Option<u32>,
    },
    /// Show one task
    Show { id: TaskId },
    /// Create a task
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = TaskStatus::Pending)]
        status: TaskStatus,
    },
    /// Change fields of a task
    Update {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Delete a task
    Delete { id: TaskId },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let options = app::BootstrapOptions {
        base_dir: cli.base_dir,
        log_level: cli.log_level,
        api_url: cli.api_url,
    };
    let state = match app::bootstrap(options) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let printer = output::Printer::new(cli.json);

    let result = match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&state, &printer, username, password).await
        }
        Commands::Register {
            full_name,
            email,
            password,
        } => commands::auth::register(&state, &printer, full_name, email, password).await,
        Commands::Logout => commands::auth::logout(&state, &printer),
        Commands::Whoami => commands::auth::whoami(&state, &printer).await,
        Commands::Status => commands::auth::status(&state, &printer),
        Commands::Tasks(command) => commands::tasks::run(&state, &printer, command).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            printer.error(&e);
            ExitCode::FAILURE
        }
    }
}
