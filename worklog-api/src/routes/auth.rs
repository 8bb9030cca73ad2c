/// Authentication endpoints
///
/// Sign-in is delegated to the external OAuth provider: the frontend
/// completes the browser flow and posts the authorization code here. The
/// server exchanges it, finds or creates the account keyed by the provider
/// email, and issues its own access/refresh token pair.
///
/// # Endpoints
///
/// - `POST /v1/auth/login` - Exchange an authorization code for tokens
/// - `POST /v1/auth/refresh` - Refresh an access token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;
use worklog_shared::{
    auth::jwt::{create_token, refresh_access_token, Claims, TokenType},
    models::user::{NewUser, User},
};

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Authorization code from the provider redirect
    #[validate(length(min = 1, message = "Authorization code is required"))]
    pub code: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The signed-in user
    pub user: User,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Exchange an authorization code for a session
///
/// Creates the account on first sign-in (role `developer`, rate 0) and
/// stamps `last_login_at`. The issue-tracker linkage flag is refreshed
/// opportunistically; a tracker outage does not block sign-in.
///
/// # Errors
///
/// - `401 Unauthorized`: Provider rejected the code or shared no email
/// - `422 Unprocessable Entity`: Missing code
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let profile = state.oauth.exchange_code(&req.code).await?;

    let user = User::find_or_create(
        &state.db,
        NewUser {
            email: profile.email.clone(),
            name: profile.name,
            avatar_url: profile.avatar_url,
        },
    )
    .await?;

    User::update_last_login(&state.db, user.id).await?;

    match state.tracker.email_exists(&user.email).await {
        Ok(linked) if linked != user.tracker_linked => {
            User::set_tracker_linked(&state.db, user.id, linked).await?;
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Tracker linkage check failed during sign-in");
        }
    }

    let access_claims = Claims::new(user.id, user.email.clone(), user.role, TokenType::Access);
    let refresh_claims = Claims::new(user.id, user.email.clone(), user.role, TokenType::Refresh);

    let access_token = create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = create_token(&refresh_claims, state.jwt_secret())?;

    // Re-read so the response reflects last_login_at and the linkage flag
    let user = User::find_by_id(&state.db, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(LoginResponse {
        user,
        access_token,
        refresh_token,
    }))
}

/// Refresh an access token
///
/// # Errors
///
/// - `401 Unauthorized`: Refresh token invalid or expired
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}
