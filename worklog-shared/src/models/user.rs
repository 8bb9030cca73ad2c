/// User model and database operations
///
/// Users are created on first successful sign-in through the OAuth provider
/// and are never hard-deleted in the normal flow. Role and hourly rate are
/// managed by admins; profile fields by the user themselves.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'hr', 'developer');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     name VARCHAR(255),
///     role user_role NOT NULL DEFAULT 'developer',
///     hourly_rate NUMERIC(10, 2) NOT NULL DEFAULT 0 CHECK (hourly_rate >= 0),
///     tracker_linked BOOLEAN NOT NULL DEFAULT FALSE,
///     avatar_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use worklog_shared::models::user::{User, NewUser};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// // Find-or-create on first sign-in
/// let user = User::find_or_create(&pool, NewUser {
///     email: "dev@example.com".to_string(),
///     name: Some("Ada".to_string()),
///     avatar_url: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Application roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full control: weeks, users, schedules, invoices, review
    Admin,

    /// Review tasks, manage invoices and payment evidence
    Hr,

    /// Submit and manage own timesheet tasks
    Developer,
}

impl UserRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Hr => "hr",
            UserRole::Developer => "developer",
        }
    }
}

/// User model representing an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address (case-insensitive via CITEXT), unique across all users
    pub email: String,

    /// Optional display name (taken from the OAuth profile on first sign-in)
    pub name: Option<String>,

    /// Application role
    pub role: UserRole,

    /// Hourly rate used for payout calculations; non-negative
    pub hourly_rate: Decimal,

    /// Whether the user's email resolves to an issue-tracker account
    pub tracker_linked: bool,

    /// Optional avatar/profile picture URL
    pub avatar_url: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last signed in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a user on first sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Email address from the OAuth profile
    pub email: String,

    /// Display name from the OAuth profile
    pub name: Option<String>,

    /// Avatar URL from the OAuth profile
    pub avatar_url: Option<String>,
}

impl User {
    /// Finds a user by email, creating one on first sign-in
    ///
    /// New users start as `developer` with a zero hourly rate. The insert is
    /// a single `ON CONFLICT` statement so two concurrent first sign-ins for
    /// the same email cannot both insert.
    pub async fn find_or_create(pool: &PgPool, data: NewUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, avatar_url)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET updated_at = NOW()
            RETURNING id, email, name, role, hourly_rate, tracker_linked, avatar_url,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .bind(data.avatar_url)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, hourly_rate, tracker_linked, avatar_url,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, hourly_rate, tracker_linked, avatar_url,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates role and/or hourly rate (admin operation)
    ///
    /// Only non-None fields are changed. Returns None if the user does not
    /// exist.
    pub async fn update_role_and_rate(
        pool: &PgPool,
        id: Uuid,
        role: Option<UserRole>,
        hourly_rate: Option<Decimal>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = COALESCE($2, role),
                hourly_rate = COALESCE($3, hourly_rate),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, role, hourly_rate, tracker_linked, avatar_url,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(id)
        .bind(role)
        .bind(hourly_rate)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates profile fields (self-service operation)
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        name: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                avatar_url = COALESCE($3, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, role, hourly_rate, tracker_linked, avatar_url,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(avatar_url)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Records the issue-tracker linkage flag for a user
    pub async fn set_tracker_linked(
        pool: &PgPool,
        id: Uuid,
        linked: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET tracker_linked = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(linked)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Updates the last login timestamp after successful authentication
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all users, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, hourly_rate, tracker_linked, avatar_url,
                   created_at, updated_at, last_login_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::Hr.as_str(), "hr");
        assert_eq!(UserRole::Developer.as_str(), "developer");
    }

    #[test]
    fn test_new_user_struct() {
        let new_user = NewUser {
            email: "dev@example.com".to_string(),
            name: Some("Ada".to_string()),
            avatar_url: None,
        };

        assert_eq!(new_user.email, "dev@example.com");
        assert!(new_user.avatar_url.is_none());
    }

    // Integration tests for database operations are in worklog-api/tests/
}
