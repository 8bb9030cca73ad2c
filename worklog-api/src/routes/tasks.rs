/// Task submission and review endpoints
///
/// Developers log tasks against the open week; admin/HR review them. A task
/// is editable and deletable only by its owner and only while pending; a
/// review decision is terminal and a rejection always carries a comment.
///
/// # Endpoints
///
/// - `GET /v1/tasks` - Own tasks in the open week (developer)
/// - `POST /v1/tasks` - Submit a task (developer)
/// - `PUT /v1/tasks/:id` - Edit an own pending task (developer)
/// - `DELETE /v1/tasks/:id` - Delete an own pending task (developer)
/// - `PUT /v1/tasks/:id/review` - Approve/reject (admin, hr)
/// - `GET /v1/tasks/review` - Review listing for the open week (admin, hr)
/// - `GET /v1/summary` - Requester's totals for the open week

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use worklog_shared::{
    auth::{
        authorization::{require_capability, Capability},
        middleware::AuthContext,
    },
    models::{
        task::{CreateTask, Task, TaskStatus, TaskWithUser, WeekSummary},
        user::User,
        week::Week,
    },
};

/// Create task request
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub description: String,
    pub hours: Decimal,

    /// Optional external issue reference (e.g., "PROJ-142")
    pub issue_key: Option<String>,
}

/// Update task request
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub description: String,
    pub hours: Decimal,
}

/// Review decision; deserialization rejects anything but the two outcomes
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    fn as_status(self) -> TaskStatus {
        match self {
            ReviewDecision::Approved => TaskStatus::Approved,
            ReviewDecision::Rejected => TaskStatus::Rejected,
        }
    }
}

/// Review request
#[derive(Debug, Deserialize)]
pub struct ReviewTaskRequest {
    pub status: ReviewDecision,

    /// Reviewer comment; required when rejecting
    pub comment: Option<String>,
}

/// Status filter for the review listing
#[derive(Debug, Default, Deserialize)]
pub struct ReviewListParams {
    /// One of "all", "pending", "approved", "rejected"; default "all"
    pub status: Option<String>,
}

/// Review listing response
#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    /// The open week the listing covers; null when no week is open
    pub week: Option<Week>,

    pub tasks: Vec<TaskWithUser>,
}

fn validate_task_input(description: &str, hours: Decimal) -> Result<(), ApiError> {
    if description.trim().is_empty() {
        return Err(ApiError::invalid_field(
            "description",
            "Description must not be empty",
        ));
    }

    if hours <= Decimal::ZERO {
        return Err(ApiError::invalid_field("hours", "Hours must be positive"));
    }

    Ok(())
}

/// Submits a task against the open week
///
/// # Errors
///
/// - `403 Forbidden`: Non-developer session
/// - `409 Conflict`: No week is currently open
/// - `422 Unprocessable Entity`: Empty description or non-positive hours
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    require_capability(&auth, Capability::SubmitTasks)?;

    validate_task_input(&req.description, req.hours)?;

    let week = Week::find_open(&state.db)
        .await?
        .ok_or_else(|| ApiError::Conflict("No week is currently open".to_string()))?;

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id: auth.user_id,
            week_id: week.id,
            description: req.description,
            hours: req.hours,
            issue_key: req.issue_key,
        },
    )
    .await?;

    Ok(Json(task))
}

/// Edits an own pending task
///
/// # Errors
///
/// - `403 Forbidden`: Not the owner, or the task has been reviewed
/// - `404 Not Found`: Unknown task
/// - `422 Unprocessable Entity`: Empty description or non-positive hours
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    require_capability(&auth, Capability::SubmitTasks)?;

    validate_task_input(&req.description, req.hours)?;

    match Task::update_pending(&state.db, id, auth.user_id, req.description, req.hours).await? {
        Some(task) => Ok(Json(task)),
        None => Err(mutation_rejection(&state, id, auth.user_id).await?),
    }
}

/// Deletes an own pending task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_capability(&auth, Capability::SubmitTasks)?;

    if Task::delete_pending(&state.db, id, auth.user_id).await? {
        return Ok(Json(serde_json::json!({ "deleted": true })));
    }

    Err(mutation_rejection(&state, id, auth.user_id).await?)
}

/// Explains why a guarded task mutation matched no row
///
/// The conditional UPDATE/DELETE collapses "missing", "not yours" and
/// "already reviewed" into zero rows; one re-read separates them for the
/// client.
async fn mutation_rejection(
    state: &AppState,
    task_id: Uuid,
    user_id: Uuid,
) -> Result<ApiError, ApiError> {
    match Task::find_by_id(&state.db, task_id).await? {
        None => Ok(ApiError::NotFound("Task not found".to_string())),
        Some(task) if task.user_id != user_id => {
            Ok(ApiError::Forbidden("Not your task".to_string()))
        }
        Some(_) => Ok(ApiError::Forbidden(
            "Task has already been reviewed and can no longer be changed".to_string(),
        )),
    }
}

/// Approves or rejects a pending task
///
/// Records reviewer identity and timestamp. Both outcomes are terminal;
/// resubmission means creating a new task.
///
/// # Errors
///
/// - `403 Forbidden`: Developer session, or the task was already reviewed
/// - `404 Not Found`: Unknown task
/// - `422 Unprocessable Entity`: Rejection without a comment
pub async fn review_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewTaskRequest>,
) -> ApiResult<Json<Task>> {
    require_capability(&auth, Capability::ReviewTasks)?;

    let comment = req.comment.filter(|c| !c.trim().is_empty());

    if matches!(req.status, ReviewDecision::Rejected) && comment.is_none() {
        return Err(ApiError::invalid_field(
            "comment",
            "A comment is required when rejecting a task",
        ));
    }

    match Task::review(&state.db, id, req.status.as_status(), comment, auth.user_id).await? {
        Some(task) => Ok(Json(task)),
        None => match Task::find_by_id(&state.db, id).await? {
            None => Err(ApiError::NotFound("Task not found".to_string())),
            Some(_) => Err(ApiError::Forbidden(
                "Task has already been reviewed".to_string(),
            )),
        },
    }
}

/// Lists tasks in the open week for review
///
/// Returns an empty listing when no week is open.
pub async fn list_tasks_for_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ReviewListParams>,
) -> ApiResult<Json<ReviewListResponse>> {
    require_capability(&auth, Capability::ReviewTasks)?;

    let status = match params.status.as_deref() {
        None | Some("all") => None,
        Some("pending") => Some(TaskStatus::Pending),
        Some("approved") => Some(TaskStatus::Approved),
        Some("rejected") => Some(TaskStatus::Rejected),
        Some(other) => {
            return Err(ApiError::invalid_field(
                "status",
                &format!("Unknown status filter: {}", other),
            ))
        }
    };

    let Some(week) = Week::find_open(&state.db).await? else {
        return Ok(Json(ReviewListResponse {
            week: None,
            tasks: Vec::new(),
        }));
    };

    let tasks = Task::list_for_review(&state.db, week.id, status).await?;

    Ok(Json(ReviewListResponse {
        week: Some(week),
        tasks,
    }))
}

/// Lists the requester's own tasks in the open week
pub async fn list_my_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    let Some(week) = Week::find_open(&state.db).await? else {
        return Ok(Json(Vec::new()));
    };

    let tasks = Task::list_for_user_in_week(&state.db, auth.user_id, week.id).await?;

    Ok(Json(tasks))
}

/// Computes the requester's totals for the open week
///
/// `total_hours`/`approved_hours` over the user's tasks, and the payouts at
/// the user's hourly rate. All-zero when no week is open.
pub async fn week_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<WeekSummary>> {
    let Some(week) = Week::find_open(&state.db).await? else {
        return Ok(Json(WeekSummary::zero()));
    };

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let (total, approved) =
        Task::sum_hours_for_user_in_week(&state.db, auth.user_id, week.id).await?;

    Ok(Json(WeekSummary::from_hours(total, approved, user.hourly_rate)))
}
