//! Task commands.

use super::{require_session, CliResult};
use crate::app::AppState;
use crate::output::Printer;
use crate::TaskCommands;
use taskdesk_api::{CreateTaskPayload, TaskQuery, UpdateTaskPayload};

pub async fn run(state: &AppState, printer: &Printer, command: TaskCommands) -> CliResult<()> {
    require_session(state)?;
    let client = state.client();

    match command {
        TaskCommands::List {
            status,
            search,
            ordering,
            page,
        } => {
            let query = TaskQuery {
                status,
                search,
                ordering,
                page,
            };
            let tasks = client.list_tasks(&query).await?;
            printer.task_page(&tasks, query.page.unwrap_or(1));
        }
        TaskCommands::Show { id } => {
            let task = client.get_task(id).await?;
            printer.task(&task);
        }
        TaskCommands::Create {
            title,
            description,
            status,
        } => {
            let payload = CreateTaskPayload {
                title,
                description,
                status,
            };
            let task = client.create_task(&payload).await?;
            printer.task(&task);
        }
        TaskCommands::Update {
            id,
            title,
            description,
            status,
        } => {
            let payload = UpdateTaskPayload {
                title,
                description,
                status,
            };
            let task = client.update_task(id, &payload).await?;
            printer.task(&task);
        }
        TaskCommands::Delete { id } => {
            client.delete_task(id).await?;
            printer.deleted(id);
        }
    }

    Ok(())
}
