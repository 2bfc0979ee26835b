//! Task resource calls.

use crate::endpoints::{task_path, TASKS_PATH};
use crate::types::{CreateTaskPayload, Page, Task, TaskId, TaskQuery, UpdateTaskPayload};
use crate::{ApiClient, ApiError, ApiResult, RequestDescriptor};
use tracing::{debug, info};

fn require_task_id(id: TaskId, action: &str) -> ApiResult<()> {
    if id <= 0 {
        return Err(ApiError::Validation(format!(
            "Task ID is required to {action} (got {id})"
        )));
    }
    Ok(())
}

fn require_text(value: &str, field: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(())
}

impl ApiClient {
    /// `GET /tasks/` with the given filters.
    pub async fn list_tasks(&self, query: &TaskQuery) -> ApiResult<Page<Task>> {
        if query.page == Some(0) {
            return Err(ApiError::Validation("Page numbers start at 1".to_string()));
        }
        debug!(?query, "Fetching tasks");

        let descriptor = RequestDescriptor::get(TASKS_PATH).with_query(query.to_pairs());
        self.execute(descriptor).await?.json()
    }

    /// `GET /tasks/{id}/`
    pub async fn get_task(&self, id: TaskId) -> ApiResult<Task> {
        require_task_id(id, "fetch details")?;
        debug!(task_id = id, "Fetching task");
        self.get_json(&task_path(id)).await
    }

    /// `POST /tasks/`
    pub async fn create_task(&self, payload: &CreateTaskPayload) -> ApiResult<Task> {
        require_text(&payload.title, "Title")?;
        require_text(&payload.description, "Description")?;

        let task: Task = self.post_json(TASKS_PATH, payload).await?;
        info!(task_id = task.id, "Created task");
        Ok(task)
    }

    /// `PUT /tasks/{id}/` with only the fields present in `payload`.
    pub async fn update_task(&self, id: TaskId, payload: &UpdateTaskPayload) -> ApiResult<Task> {
        require_task_id(id, "update")?;
        if payload.is_empty() {
            return Err(ApiError::Validation(
                "Payload is required for update".to_string(),
            ));
        }

        let task: Task = self.put_json(&task_path(id), payload).await?;
        info!(task_id = id, "Updated task");
        Ok(task)
    }

    /// `DELETE /tasks/{id}/`
    pub async fn delete_task(&self, id: TaskId) -> ApiResult<()> {
        require_task_id(id, "delete")?;
        self.delete(&task_path(id)).await?;
        info!(task_id = id, "Deleted task");
        Ok(())
    }
}
