/// Developer work schedule endpoints
///
/// One schedule per developer, upserted by admins in a single
/// `ON CONFLICT` statement; concurrent upserts for the same new user leave
/// exactly one row. The read side folds in expected hours/earnings for
/// progress display.
///
/// # Endpoints
///
/// - `GET /v1/schedules/:user_id` - Schedule with expected totals (admin,
///   hr, or the developer themselves)
/// - `PUT /v1/schedules/:user_id` - Upsert (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use worklog_shared::{
    auth::{
        authorization::{require_capability, require_owner_or_capability, Capability},
        middleware::AuthContext,
    },
    models::{schedule::WorkSchedule, user::User},
};

/// Upsert request
#[derive(Debug, Deserialize)]
pub struct UpsertScheduleRequest {
    pub days_per_week: i32,
    pub hours_per_day: Decimal,
}

/// Schedule response with derived expectations
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    #[serde(flatten)]
    pub schedule: WorkSchedule,

    /// days_per_week × hours_per_day
    pub expected_weekly_hours: Decimal,

    /// expected_weekly_hours × the user's hourly rate
    pub expected_weekly_earnings: Decimal,
}

/// Upserts a developer's work schedule
///
/// # Errors
///
/// - `403 Forbidden`: Non-admin session
/// - `404 Not Found`: Unknown user
/// - `422 Unprocessable Entity`: Days outside 1..=7 or non-positive hours
pub async fn upsert_schedule(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpsertScheduleRequest>,
) -> ApiResult<Json<ScheduleResponse>> {
    require_capability(&auth, Capability::ManageSchedules)?;

    if !(1..=7).contains(&req.days_per_week) {
        return Err(ApiError::invalid_field(
            "days_per_week",
            "Days per week must be between 1 and 7",
        ));
    }

    if req.hours_per_day <= Decimal::ZERO {
        return Err(ApiError::invalid_field(
            "hours_per_day",
            "Hours per day must be positive",
        ));
    }

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let schedule =
        WorkSchedule::upsert(&state.db, user_id, req.days_per_week, req.hours_per_day).await?;

    Ok(Json(schedule_response(schedule, user.hourly_rate)))
}

/// Returns a developer's schedule with expected totals
///
/// # Errors
///
/// - `403 Forbidden`: Developer asking for someone else's schedule
/// - `404 Not Found`: Unknown user or no schedule recorded
pub async fn get_schedule(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ScheduleResponse>> {
    require_owner_or_capability(&auth, user_id, Capability::ViewUsers)?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let schedule = WorkSchedule::find_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No schedule recorded for this user".to_string()))?;

    Ok(Json(schedule_response(schedule, user.hourly_rate)))
}

fn schedule_response(schedule: WorkSchedule, hourly_rate: Decimal) -> ScheduleResponse {
    let expected_weekly_hours = schedule.expected_weekly_hours();
    let expected_weekly_earnings = schedule.expected_weekly_earnings(hourly_rate);

    ScheduleResponse {
        schedule,
        expected_weekly_hours,
        expected_weekly_earnings,
    }
}
