/// Week model and the weekly-period lifecycle
///
/// A Week is a contiguous period [start_date, end_date] that is either open
/// (developers may submit tasks against it) or closed (its approved hours
/// become eligible for invoicing). Dates are immutable after creation.
///
/// # State Machine
///
/// ```text
/// open ⇄ closed
/// ```
///
/// Transitions are admin-triggered and unordered: a closed week may be
/// reopened. There is no terminal state. At most one week is open at a time;
/// the invariant is enforced both by a partial unique index and by the
/// conditional SQL in `create` and `set_open`, so a violation surfaces as a
/// conflict rather than a second open row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE weeks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     start_date DATE NOT NULL,
///     end_date DATE NOT NULL,
///     is_open BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CHECK (end_date >= start_date)
/// );
///
/// CREATE UNIQUE INDEX weeks_single_open ON weeks (is_open) WHERE is_open;
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Week model representing a timesheet period
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Week {
    /// Unique week ID
    pub id: Uuid,

    /// First day of the period
    pub start_date: NaiveDate,

    /// Last day of the period (inclusive)
    pub end_date: NaiveDate,

    /// Whether developers may currently submit tasks against this week
    pub is_open: bool,

    /// When the week was created
    pub created_at: DateTime<Utc>,
}

/// Week row joined with aggregate task counts, for the review listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeekWithCounts {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,

    /// Total tasks submitted against this week
    pub task_count: i64,

    /// Tasks still awaiting review
    pub pending_count: i64,

    /// Approved tasks
    pub approved_count: i64,

    /// Rejected tasks
    pub rejected_count: i64,
}

/// Outcome of attempting to create or open a week
///
/// `AlreadyOpen` means another week currently holds the open slot; the caller
/// maps this to a conflict response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    AlreadyOpen,
}

impl Week {
    /// Creates a new week, always open
    ///
    /// Fails with `Ok(None)` when another week is already open: the insert is
    /// guarded by `WHERE NOT EXISTS` so two concurrent creates cannot both
    /// take the open slot, and the partial unique index backs the guard.
    pub async fn create(
        pool: &PgPool,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error> {
        let week = sqlx::query_as::<_, Week>(
            r#"
            INSERT INTO weeks (start_date, end_date, is_open)
            SELECT $1, $2, TRUE
            WHERE NOT EXISTS (SELECT 1 FROM weeks WHERE is_open)
            RETURNING id, start_date, end_date, is_open, created_at
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_optional(pool)
        .await?;

        Ok(week)
    }

    /// Finds a week by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let week = sqlx::query_as::<_, Week>(
            r#"
            SELECT id, start_date, end_date, is_open, created_at
            FROM weeks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(week)
    }

    /// Returns the currently open week, if any
    pub async fn find_open(pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        let week = sqlx::query_as::<_, Week>(
            r#"
            SELECT id, start_date, end_date, is_open, created_at
            FROM weeks
            WHERE is_open
            "#,
        )
        .fetch_optional(pool)
        .await?;

        Ok(week)
    }

    /// Closes a week
    ///
    /// Unconditional: pending tasks do not block closing. Returns false when
    /// the week does not exist.
    pub async fn close(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE weeks SET is_open = FALSE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reopens a closed week
    ///
    /// The update is conditional on no other week being open, so the
    /// single-open-week invariant holds under concurrency. Returns
    /// `Ok(None)` if the week does not exist, otherwise the outcome.
    pub async fn reopen(pool: &PgPool, id: Uuid) -> Result<Option<OpenOutcome>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE weeks
            SET is_open = TRUE
            WHERE id = $1
              AND NOT EXISTS (SELECT 1 FROM weeks WHERE is_open AND id <> $1)
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(Some(OpenOutcome::Opened));
        }

        // Distinguish "missing week" from "another week holds the slot".
        match Self::find_by_id(pool, id).await? {
            Some(week) if week.is_open => Ok(Some(OpenOutcome::Opened)),
            Some(_) => Ok(Some(OpenOutcome::AlreadyOpen)),
            None => Ok(None),
        }
    }

    /// Lists all weeks with aggregate task counts, newest first
    pub async fn list_with_counts(pool: &PgPool) -> Result<Vec<WeekWithCounts>, sqlx::Error> {
        let weeks = sqlx::query_as::<_, WeekWithCounts>(
            r#"
            SELECT w.id, w.start_date, w.end_date, w.is_open, w.created_at,
                   COUNT(t.id) AS task_count,
                   COUNT(t.id) FILTER (WHERE t.status = 'pending') AS pending_count,
                   COUNT(t.id) FILTER (WHERE t.status = 'approved') AS approved_count,
                   COUNT(t.id) FILTER (WHERE t.status = 'rejected') AS rejected_count
            FROM weeks w
            LEFT JOIN tasks t ON t.week_id = w.id
            GROUP BY w.id
            ORDER BY w.start_date DESC, w.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(weeks)
    }
}
