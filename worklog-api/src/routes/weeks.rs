/// Week lifecycle endpoints
///
/// Weeks are created open and toggled by admins. At most one week is open at
/// a time; attempts to create or reopen a week while another is open fail
/// with a conflict. Closing is unconditional; pending tasks do not block it.
///
/// # Endpoints
///
/// - `GET /v1/weeks` - List weeks with task counts (admin, hr)
/// - `POST /v1/weeks` - Create a week, always open (admin)
/// - `GET /v1/weeks/open` - The currently open week, if any
/// - `PUT /v1/weeks/:id/open` - Open or close a week (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use worklog_shared::{
    auth::{
        authorization::{require_capability, Capability},
        middleware::AuthContext,
    },
    models::week::{OpenOutcome, Week, WeekWithCounts},
};

/// Create week request
#[derive(Debug, Deserialize)]
pub struct CreateWeekRequest {
    /// First day of the period
    pub start_date: Option<NaiveDate>,

    /// Last day of the period (inclusive)
    pub end_date: Option<NaiveDate>,
}

/// Open/close request
#[derive(Debug, Deserialize)]
pub struct SetWeekOpenRequest {
    pub is_open: bool,
}

/// Open week response; `week` is null when every week is closed
#[derive(Debug, Serialize)]
pub struct OpenWeekResponse {
    pub week: Option<Week>,
}

/// Creates a new week
///
/// The week is always created open, regardless of input. Malformed dates are
/// rejected by deserialization; missing dates and inverted ranges map to 422.
///
/// # Errors
///
/// - `403 Forbidden`: Non-admin session
/// - `409 Conflict`: Another week is currently open
/// - `422 Unprocessable Entity`: Missing or inverted dates
pub async fn create_week(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateWeekRequest>,
) -> ApiResult<Json<Week>> {
    require_capability(&auth, Capability::ManageWeeks)?;

    let start_date = req
        .start_date
        .ok_or_else(|| ApiError::invalid_field("start_date", "Start date is required"))?;
    let end_date = req
        .end_date
        .ok_or_else(|| ApiError::invalid_field("end_date", "End date is required"))?;

    if end_date < start_date {
        return Err(ApiError::invalid_field(
            "end_date",
            "End date must not precede start date",
        ));
    }

    let week = Week::create(&state.db, start_date, end_date)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("Another week is already open; close it first".to_string())
        })?;

    tracing::info!(week_id = %week.id, %start_date, %end_date, "Week created");

    Ok(Json(week))
}

/// Opens or closes a week
///
/// # Errors
///
/// - `403 Forbidden`: Non-admin session
/// - `404 Not Found`: Unknown week
/// - `409 Conflict`: Opening while another week is open
pub async fn set_week_open(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetWeekOpenRequest>,
) -> ApiResult<Json<Week>> {
    require_capability(&auth, Capability::ManageWeeks)?;

    if req.is_open {
        match Week::reopen(&state.db, id).await? {
            Some(OpenOutcome::Opened) => {}
            Some(OpenOutcome::AlreadyOpen) => {
                return Err(ApiError::Conflict(
                    "Another week is already open; close it first".to_string(),
                ));
            }
            None => return Err(ApiError::NotFound("Week not found".to_string())),
        }
    } else if !Week::close(&state.db, id).await? {
        return Err(ApiError::NotFound("Week not found".to_string()));
    }

    let week = Week::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Week not found".to_string()))?;

    tracing::info!(week_id = %week.id, is_open = week.is_open, "Week toggled");

    Ok(Json(week))
}

/// Lists all weeks with aggregate task counts, newest first
pub async fn list_weeks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<WeekWithCounts>>> {
    require_capability(&auth, Capability::ViewAllWeeks)?;

    let weeks = Week::list_with_counts(&state.db).await?;

    Ok(Json(weeks))
}

/// Returns the currently open week, if any
///
/// Available to every authenticated role: developers need it to know
/// whether task submission is possible.
pub async fn get_open_week(State(state): State<AppState>) -> ApiResult<Json<OpenWeekResponse>> {
    let week = Week::find_open(&state.db).await?;

    Ok(Json(OpenWeekResponse { week }))
}
