/// Issue-tracker lookup endpoints
///
/// Read-only pass-through to the external tracker, keyed by the session
/// email. Results are never cached; a tracker outage surfaces as a logged
/// dependency failure.
///
/// # Endpoints
///
/// - `GET /v1/tracker/issues?offset=&page_size=` - Open issues assigned to
///   the signed-in user
/// - `GET /v1/tracker/link-status` - Whether the session email exists in the
///   tracker

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use worklog_shared::{auth::middleware::AuthContext, tracker::IssuePage};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Pagination parameters
#[derive(Debug, Default, Deserialize)]
pub struct IssueListParams {
    pub offset: Option<i64>,
    pub page_size: Option<i64>,
}

/// Link-status response
#[derive(Debug, Serialize)]
pub struct LinkStatusResponse {
    /// Whether the session email resolves to a tracker user
    pub linked: bool,
}

/// Lists open tracker issues assigned to the signed-in user
pub async fn list_issues(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<IssueListParams>,
) -> ApiResult<Json<IssuePage>> {
    let offset = params.offset.unwrap_or(0).max(0);
    let page_size = params
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let page = state
        .tracker
        .list_open_issues(&auth.email, offset, page_size)
        .await?;

    Ok(Json(page))
}

/// Reports whether the session email exists as a tracker user
///
/// Also refreshes the persisted linkage flag when it drifted.
pub async fn link_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<LinkStatusResponse>> {
    let linked = state.tracker.email_exists(&auth.email).await?;

    worklog_shared::models::user::User::set_tracker_linked(&state.db, auth.user_id, linked)
        .await?;

    Ok(Json(LinkStatusResponse { linked }))
}
