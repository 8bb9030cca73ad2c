/// Common test utilities for integration tests
///
/// Shared infrastructure for the end-to-end tests:
/// - Test database setup (migrations + table truncation)
/// - One user per role with JWT tokens
/// - Request builders for JSON and multipart bodies
///
/// The single-open-week invariant is database-global, so tests serialize on
/// a process-wide lock held for the lifetime of each `TestContext`.

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use std::sync::{Arc, OnceLock};
use tower::Service as _;
use worklog_api::app::{build_router, AppState};
use worklog_api::config::Config;
use worklog_shared::auth::jwt::{create_token, Claims, TokenType};
use worklog_shared::auth::oauth::{OauthClient, OauthConfig};
use worklog_shared::models::user::{NewUser, User, UserRole};
use worklog_shared::storage::LocalDocumentStore;
use worklog_shared::tracker::{TrackerClient, TrackerConfig};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

static DB_LOCK: OnceLock<Arc<tokio::sync::Mutex<()>>> = OnceLock::new();

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub admin: User,
    pub hr: User,
    pub developer: User,
    _guard: tokio::sync::OwnedMutexGuard<()>,
}

impl TestContext {
    /// Creates a new test context with a clean database
    pub async fn new() -> anyhow::Result<Self> {
        let guard = DB_LOCK
            .get_or_init(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
            .lock_owned()
            .await;

        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        worklog_shared::db::migrations::run_migrations(&db).await?;

        // Start each test from an empty workflow state
        sqlx::query("TRUNCATE users, weeks, tasks, invoices, payment_evidence, work_schedules CASCADE")
            .execute(&db)
            .await?;

        let admin = create_role_user(&db, "admin", UserRole::Admin, Decimal::ZERO).await?;
        let hr = create_role_user(&db, "hr", UserRole::Hr, Decimal::ZERO).await?;
        let developer =
            create_role_user(&db, "dev", UserRole::Developer, Decimal::from(50)).await?;

        let documents = LocalDocumentStore::in_temp_dir().await?;
        let oauth = OauthClient::new(OauthConfig {
            token_url: String::new(),
            userinfo_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
        });
        let tracker = TrackerClient::new(TrackerConfig {
            base_url: String::new(),
            api_user: String::new(),
            api_token: String::new(),
        });

        let state = AppState::new(
            db.clone(),
            config.clone(),
            Arc::new(documents),
            oauth,
            tracker,
        );
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            admin,
            hr,
            developer,
            _guard: guard,
        })
    }

    /// Returns a bearer token for the given user
    pub fn token_for(&self, user: &User) -> String {
        let claims = Claims::new(user.id, user.email.clone(), user.role, TokenType::Access);
        create_token(&claims, &self.config.jwt.secret).expect("token creation")
    }

    /// Sends a JSON request as the given user
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: &User,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token_for(user)));

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("request build");
        self.app.clone().call(request).await.expect("request send")
    }

    /// Sends a multipart request as the given user
    pub async fn multipart_request(
        &self,
        uri: &str,
        user: &User,
        fields: &[(&str, String)],
        file: (&str, &[u8]),
    ) -> Response<Body> {
        let boundary = "----worklog-test-boundary";
        let mut body = Vec::new();

        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }

        let (file_name, contents) = file;
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token_for(user)))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request build");

        self.app.clone().call(request).await.expect("request send")
    }
}

/// Creates a user with a given role and rate
async fn create_role_user(
    db: &PgPool,
    prefix: &str,
    role: UserRole,
    rate: Decimal,
) -> anyhow::Result<User> {
    let user = User::find_or_create(
        db,
        NewUser {
            email: format!("{}-{}@example.com", prefix, Uuid::new_v4()),
            name: Some(format!("Test {}", prefix)),
            avatar_url: None,
        },
    )
    .await?;

    let user = User::update_role_and_rate(db, user.id, Some(role), Some(rate))
        .await?
        .expect("user just created");

    Ok(user)
}

/// Parses a decimal field out of a JSON body
///
/// NUMERIC columns come back with their stored scale ("8.00"), so tests
/// compare decimals numerically instead of as strings.
pub fn decimal(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .expect("decimal field serialized as string")
        .parse()
        .expect("decimal field parses")
}

/// Parses a response body as JSON, asserting the expected status first
pub async fn json_body(response: Response<Body>, expected: StatusCode) -> serde_json::Value {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body read");

    if status != expected {
        panic!(
            "Expected {}, got {}: {}",
            expected,
            status,
            String::from_utf8_lossy(&bytes)
        );
    }

    if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    }
}
