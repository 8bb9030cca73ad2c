/// User directory and role/rate management
///
/// # Endpoints
///
/// - `GET /v1/users` - List users (admin, hr)
/// - `PUT /v1/users/:id` - Update role and/or hourly rate (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use worklog_shared::{
    auth::{
        authorization::{require_capability, Capability},
        middleware::AuthContext,
    },
    models::user::{User, UserRole},
};

/// Role/rate update request; only provided fields change
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<UserRole>,
    pub hourly_rate: Option<Decimal>,
}

/// Lists all users
///
/// Admin and HR may read the directory; only admin may mutate it.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `403 Forbidden`: Developer session
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<User>>> {
    require_capability(&auth, Capability::ViewUsers)?;

    let users = User::list(&state.db).await?;

    Ok(Json(users))
}

/// Updates a user's role and/or hourly rate
///
/// # Errors
///
/// - `403 Forbidden`: Non-admin session
/// - `404 Not Found`: Unknown user
/// - `422 Unprocessable Entity`: Negative hourly rate
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    require_capability(&auth, Capability::ManageUsers)?;

    if let Some(rate) = req.hourly_rate {
        if rate < Decimal::ZERO {
            return Err(ApiError::invalid_field(
                "hourly_rate",
                "Hourly rate must be non-negative",
            ));
        }
    }

    let user = User::update_role_and_rate(&state.db, id, req.role, req.hourly_rate)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
