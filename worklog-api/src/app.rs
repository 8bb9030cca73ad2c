/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the Axum router with all routes and middleware.
///
/// # Router layout
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// └── /v1/                           # API v1 (versioned)
///     ├── /auth/                     # Sign-in (public)
///     │   ├── POST /login
///     │   └── POST /refresh
///     ├── /profile                   # Own profile (authenticated)
///     ├── /users                     # Directory + role/rate (admin, hr)
///     ├── /weeks                     # Week lifecycle (admin; listing hr)
///     ├── /tasks                     # Submission + review
///     ├── /summary                   # Open-week totals for the requester
///     ├── /invoices                  # Invoice CRUD + documents
///     ├── /evidence                  # Payment evidence
///     ├── /schedules                 # Developer work schedules
///     └── /tracker                   # Issue-tracker lookups
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. JWT authentication (everything under /v1 except /v1/auth)

use crate::config::Config;
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use worklog_shared::{
    auth::{jwt, middleware::AuthContext, oauth::OauthClient},
    storage::DocumentStore,
    tracker::TrackerClient,
};

/// Largest accepted upload (invoice/evidence documents)
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Document store for invoices and payment evidence
    pub documents: Arc<dyn DocumentStore>,

    /// Identity provider client
    pub oauth: Arc<OauthClient>,

    /// Issue tracker client
    pub tracker: Arc<TrackerClient>,
}

impl AppState {
    /// Creates new application state
    pub fn new(
        db: PgPool,
        config: Config,
        documents: Arc<dyn DocumentStore>,
        oauth: OauthClient,
        tracker: TrackerClient,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            documents,
            oauth: Arc::new(oauth),
            tracker: Arc::new(tracker),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Everything else requires a valid access token
    let protected_routes = Router::new()
        .route("/profile", get(routes::profile::get_profile))
        .route("/profile", put(routes::profile::update_profile))
        .route("/users", get(routes::users::list_users))
        .route("/users/:id", put(routes::users::update_user))
        .route("/weeks", get(routes::weeks::list_weeks))
        .route("/weeks", post(routes::weeks::create_week))
        .route("/weeks/open", get(routes::weeks::get_open_week))
        .route("/weeks/:id/open", put(routes::weeks::set_week_open))
        .route("/tasks", get(routes::tasks::list_my_tasks))
        .route("/tasks", post(routes::tasks::create_task))
        .route("/tasks/review", get(routes::tasks::list_tasks_for_review))
        .route("/tasks/:id", put(routes::tasks::update_task))
        .route("/tasks/:id", delete(routes::tasks::delete_task))
        .route("/tasks/:id/review", put(routes::tasks::review_task))
        .route("/summary", get(routes::tasks::week_summary))
        .route("/invoices", get(routes::invoices::list_invoices))
        .route("/invoices", post(routes::invoices::create_invoice))
        .route("/invoices/:id", put(routes::invoices::update_invoice))
        .route("/invoices/:id", delete(routes::invoices::delete_invoice))
        .route("/invoices/file/:name", get(routes::invoices::get_invoice_file))
        .route(
            "/invoices/billable-weeks/:user_id",
            get(routes::invoices::list_billable_weeks),
        )
        .route("/evidence", get(routes::evidence::list_evidence))
        .route("/evidence", post(routes::evidence::upload_evidence))
        .route("/evidence/file/:name", get(routes::evidence::get_evidence_file))
        .route("/schedules/:user_id", get(routes::schedules::get_schedule))
        .route("/schedules/:user_id", put(routes::schedules::upsert_schedule))
        .route("/tracker/issues", get(routes::tracker::list_issues))
        .route("/tracker/link-status", get(routes::tracker::link_status))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the access token from the Authorization header,
/// then injects AuthContext into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::BadRequest("Expected Bearer token".to_string())
    })?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let auth_context = AuthContext::from_claims(&claims);

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
