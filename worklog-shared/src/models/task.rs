/// Task model and the submission/approval workflow
///
/// Tasks are the work items developers log against the open week. Each task
/// belongs to exactly one user and one week and moves through a small status
/// machine driven by admin/HR review.
///
/// # State Machine
///
/// ```text
/// pending → approved
///         → rejected
/// ```
///
/// Both review outcomes are terminal; resubmitting rejected work means
/// creating a new task. A rejection always carries a reviewer comment.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'approved', 'rejected');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     week_id UUID NOT NULL REFERENCES weeks(id) ON DELETE CASCADE,
///     description TEXT NOT NULL,
///     hours NUMERIC(6, 2) NOT NULL CHECK (hours > 0),
///     status task_status NOT NULL DEFAULT 'pending',
///     admin_comment TEXT,
///     issue_key VARCHAR(64),
///     reviewed_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     reviewed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Awaiting review; the only state in which the owner may edit or delete
    Pending,

    /// Accepted by a reviewer; hours count toward payout
    Approved,

    /// Declined by a reviewer with a comment
    Rejected,
}

impl TaskStatus {
    /// Converts status to string for database filters and display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Approved => "approved",
            TaskStatus::Rejected => "rejected",
        }
    }

    /// Checks if status is terminal (task has been reviewed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Approved | TaskStatus::Rejected)
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        matches!(
            (self, target),
            (TaskStatus::Pending, TaskStatus::Approved)
                | (TaskStatus::Pending, TaskStatus::Rejected)
        )
    }
}

/// Task model representing a logged work item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning developer
    pub user_id: Uuid,

    /// Week this task was submitted against
    pub week_id: Uuid,

    /// What was worked on
    pub description: String,

    /// Hours spent; strictly positive
    pub hours: Decimal,

    /// Current review status
    pub status: TaskStatus,

    /// Reviewer comment; always present when rejected
    pub admin_comment: Option<String>,

    /// Optional external issue reference (e.g., "PROJ-142")
    pub issue_key: Option<String>,

    /// Who reviewed the task (nullable if reviewer deleted)
    pub reviewed_by: Option<Uuid>,

    /// When the review happened
    pub reviewed_at: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Task row joined with its submitter, for the review listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_id: Uuid,
    pub description: String,
    pub hours: Decimal,
    pub status: TaskStatus,
    pub admin_comment: Option<String>,
    pub issue_key: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Submitter email
    pub user_email: String,

    /// Submitter display name
    pub user_name: Option<String>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Owning developer
    pub user_id: Uuid,

    /// Week the task is submitted against (the open week)
    pub week_id: Uuid,

    /// Description of the work
    pub description: String,

    /// Hours spent
    pub hours: Decimal,

    /// Optional external issue reference
    pub issue_key: Option<String>,
}

/// Per-user totals for the open week
///
/// Derived quantities: `approved_hours <= total_hours` always holds, and the
/// payouts are the respective hours multiplied by the user's hourly rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekSummary {
    pub total_hours: Decimal,
    pub approved_hours: Decimal,
    pub total_payout: Decimal,
    pub approved_payout: Decimal,
}

impl WeekSummary {
    /// Computes the summary from raw totals and an hourly rate
    pub fn from_hours(total_hours: Decimal, approved_hours: Decimal, rate: Decimal) -> Self {
        Self {
            total_hours,
            approved_hours,
            total_payout: total_hours * rate,
            approved_payout: approved_hours * rate,
        }
    }

    /// An all-zero summary, used when no week is open
    pub fn zero() -> Self {
        Self::from_hours(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }
}

impl Task {
    /// Creates a new task in pending state
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, week_id, description, hours, issue_key)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, week_id, description, hours, status, admin_comment,
                      issue_key, reviewed_by, reviewed_at, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.week_id)
        .bind(data.description)
        .bind(data.hours)
        .bind(data.issue_key)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, week_id, description, hours, status, admin_comment,
                   issue_key, reviewed_by, reviewed_at, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Updates description and hours of an owned, still-pending task
    ///
    /// The update is conditional on both ownership and pending status, so a
    /// reviewed task can never be edited regardless of request interleaving.
    /// Returns None if nothing matched; the caller distinguishes "missing"
    /// from "not editable" by re-reading the row.
    pub async fn update_pending(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        description: String,
        hours: Decimal,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET description = $3,
                hours = $4,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = 'pending'
            RETURNING id, user_id, week_id, description, hours, status, admin_comment,
                      issue_key, reviewed_by, reviewed_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(description)
        .bind(hours)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes an owned, still-pending task
    pub async fn delete_pending(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM tasks WHERE id = $1 AND user_id = $2 AND status = 'pending'",
        )
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reviews a pending task, transitioning it to approved or rejected
    ///
    /// Records reviewer identity and timestamp. Conditional on pending
    /// status: a second review of the same task matches no row, keeping
    /// approved/rejected terminal.
    pub async fn review(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
        comment: Option<String>,
        reviewer_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = $2,
                admin_comment = $3,
                reviewed_by = $4,
                reviewed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, user_id, week_id, description, hours, status, admin_comment,
                      issue_key, reviewed_by, reviewed_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(comment)
        .bind(reviewer_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a user's tasks in a week, oldest first
    pub async fn list_for_user_in_week(
        pool: &PgPool,
        user_id: Uuid,
        week_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, week_id, description, hours, status, admin_comment,
                   issue_key, reviewed_by, reviewed_at, created_at, updated_at
            FROM tasks
            WHERE user_id = $1 AND week_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(week_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks in a week for review, optionally filtered by status
    ///
    /// Includes submitter identity so reviewers see who logged the hours.
    pub async fn list_for_review(
        pool: &PgPool,
        week_id: Uuid,
        status: Option<TaskStatus>,
    ) -> Result<Vec<TaskWithUser>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, TaskWithUser>(
            r#"
            SELECT t.id, t.user_id, t.week_id, t.description, t.hours, t.status,
                   t.admin_comment, t.issue_key, t.reviewed_by, t.reviewed_at,
                   t.created_at, t.updated_at,
                   u.email AS user_email, u.name AS user_name
            FROM tasks t
            JOIN users u ON u.id = t.user_id
            WHERE t.week_id = $1 AND ($2::task_status IS NULL OR t.status = $2)
            ORDER BY t.created_at ASC
            "#,
        )
        .bind(week_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Sums total and approved hours for a user's tasks in a week
    pub async fn sum_hours_for_user_in_week(
        pool: &PgPool,
        user_id: Uuid,
        week_id: Uuid,
    ) -> Result<(Decimal, Decimal), sqlx::Error> {
        let (total, approved): (Option<Decimal>, Option<Decimal>) = sqlx::query_as(
            r#"
            SELECT SUM(hours),
                   SUM(hours) FILTER (WHERE status = 'approved')
            FROM tasks
            WHERE user_id = $1 AND week_id = $2
            "#,
        )
        .bind(user_id)
        .bind(week_id)
        .fetch_one(pool)
        .await?;

        Ok((
            total.unwrap_or(Decimal::ZERO),
            approved.unwrap_or(Decimal::ZERO),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::Approved.as_str(), "approved");
        assert_eq!(TaskStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_task_status_is_terminal() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(TaskStatus::Approved.is_terminal());
        assert!(TaskStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_task_status_transitions() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Approved));
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Rejected));

        // Terminal states cannot transition
        assert!(!TaskStatus::Approved.can_transition_to(TaskStatus::Rejected));
        assert!(!TaskStatus::Rejected.can_transition_to(TaskStatus::Approved));
        assert!(!TaskStatus::Approved.can_transition_to(TaskStatus::Pending));
    }

    #[test]
    fn test_week_summary_from_hours() {
        let summary = WeekSummary::from_hours(dec!(10), dec!(6), dec!(50));

        assert_eq!(summary.total_hours, dec!(10));
        assert_eq!(summary.approved_hours, dec!(6));
        assert_eq!(summary.total_payout, dec!(500));
        assert_eq!(summary.approved_payout, dec!(300));
    }

    #[test]
    fn test_week_summary_invariants() {
        let summary = WeekSummary::from_hours(dec!(12.5), dec!(8.25), dec!(42));

        assert!(summary.approved_hours <= summary.total_hours);
        assert!(summary.approved_payout <= summary.total_payout);
    }

    #[test]
    fn test_week_summary_zero() {
        let summary = WeekSummary::zero();
        assert_eq!(summary.total_hours, Decimal::ZERO);
        assert_eq!(summary.approved_payout, Decimal::ZERO);
    }
}
