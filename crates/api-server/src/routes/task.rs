//! Task API endpoints
//!
//! RESTful API over the task collection, addressed by title.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use todo_core::task::{
    NewTask, Pagination, SortField, SortOrder, TaskFilter, TaskPage, TaskPatch, TaskPriority,
    TaskQuery, TaskRepository, TaskStatus,
};

use crate::config::CursorFallback;
use crate::response::{success, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTasksParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    #[serde(flatten)]
    pub page: TaskPage,
    #[serde(skip_serializing_if = "is_false")]
    pub cursor_reset: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn parse_status(raw: Option<String>) -> todo_core::Result<Option<TaskStatus>> {
    raw.map(|status| status.parse::<TaskStatus>()).transpose()
}

fn parse_priority(raw: Option<i64>) -> todo_core::Result<Option<TaskPriority>> {
    raw.map(TaskPriority::new).transpose()
}

impl CreateTaskRequest {
    fn into_new_task(self) -> todo_core::Result<NewTask> {
        let mut task = NewTask::new(self.title, self.description);
        if let Some(status) = parse_status(self.status)? {
            task = task.with_status(status);
        }
        if let Some(priority) = parse_priority(self.priority)? {
            task = task.with_priority(priority);
        }
        Ok(task)
    }
}

impl UpdateTaskRequest {
    fn into_patch(self) -> todo_core::Result<TaskPatch> {
        Ok(TaskPatch {
            description: self.description,
            status: parse_status(self.status)?,
            priority: parse_priority(self.priority)?,
        })
    }
}

impl ListTasksParams {
    fn into_query(self, default_limit: i64) -> todo_core::Result<TaskQuery> {
        let limit = self.limit.unwrap_or(default_limit);
        let page = match self.cursor {
            Some(_) if self.skip.is_some() => {
                return Err(todo_core::Error::validation(
                    "skip",
                    "cannot be combined with cursor",
                ))
            }
            Some(cursor) => Pagination::Cursor {
                cursor: Some(cursor),
                limit,
            },
            None => Pagination::offset(self.skip.unwrap_or(0), limit),
        };

        Ok(TaskQuery {
            filter: TaskFilter {
                status: parse_status(self.status)?,
                priority: parse_priority(self.priority)?,
            },
            search: self.search,
            sort_by: self.sort_by.map(|field| field.parse::<SortField>()).transpose()?,
            sort_order: self
                .sort_order
                .map(|order| order.parse::<SortOrder>())
                .transpose()?
                .unwrap_or_default(),
            page,
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /tasks - Filter, search, sort and paginate tasks
async fn list_tasks(
    State(state): State<AppState>,
    params: Result<Query<ListTasksParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let mut query = params.into_query(state.config().default_page_limit)?;

    let (page, cursor_reset) = match state.tasks().query(&query).await {
        Ok(page) => (page, false),
        Err(todo_core::Error::InvalidCursor(reason))
            if state.config().cursor_fallback == CursorFallback::Restart =>
        {
            warn!("Restarting pagination from the first page: {}", reason);
            query.page = Pagination::first_page(query.page.limit());
            (state.tasks().query(&query).await?, true)
        }
        Err(e) => return Err(e.into()),
    };

    Ok(success(
        StatusCode::OK,
        TaskListResponse { page, cursor_reset },
    ))
}

/// POST /tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let created = state.tasks().create(req.into_new_task()?).await?;
    debug!("Created task {:?}", created.title);
    Ok(success(StatusCode::CREATED, created))
}

/// GET /tasks/{title} - Get a single task
async fn get_task(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Response, ApiError> {
    let task = state.tasks().get(&title).await?;
    Ok(success(StatusCode::OK, task))
}

/// PATCH /tasks/{title} - Update some fields of a task
async fn update_task(
    State(state): State<AppState>,
    Path(title): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    if let Some(body_title) = req.title.as_deref() {
        if body_title != title {
            return Err(ApiError::title_mismatch(&title, body_title));
        }
    }

    let updated = state.tasks().update(&title, req.into_patch()?).await?;
    Ok(success(StatusCode::OK, updated))
}

/// PUT /tasks/{title} - Replace description, status and priority of a task
async fn replace_task(
    State(state): State<AppState>,
    Path(title): Path<String>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    if req.title != title {
        return Err(ApiError::title_mismatch(&title, &req.title));
    }

    let replacement = req.into_new_task()?;
    let patch = TaskPatch::new()
        .with_description(replacement.description)
        .with_status(replacement.status)
        .with_priority(replacement.priority);

    let updated = state.tasks().update(&title, patch).await?;
    Ok(success(StatusCode::OK, updated))
}

/// DELETE /tasks/{title} - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Response, ApiError> {
    let deleted = state.tasks().delete(&title).await?;
    debug!("Deleted task {:?}", deleted.title);
    Ok(success(StatusCode::OK, deleted))
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{title}",
            get(get_task)
                .patch(update_task)
                .put(replace_task)
                .delete(delete_task),
        )
}
