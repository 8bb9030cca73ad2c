/// Developer work schedule model
///
/// One row per developer recording the agreed working pattern, used to
/// compute expected hours and earnings for progress display. The write path
/// is a single `INSERT ... ON CONFLICT DO UPDATE`, so two concurrent upserts
/// for the same new user leave exactly one row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE work_schedules (
///     user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
///     days_per_week INTEGER NOT NULL CHECK (days_per_week BETWEEN 1 AND 7),
///     hours_per_day NUMERIC(4, 2) NOT NULL CHECK (hours_per_day > 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Work schedule for a developer
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkSchedule {
    /// Developer this schedule belongs to (one-to-one)
    pub user_id: Uuid,

    /// Working days per week, 1..=7
    pub days_per_week: i32,

    /// Working hours per day, strictly positive
    pub hours_per_day: Decimal,

    /// When the schedule was first recorded
    pub created_at: DateTime<Utc>,

    /// When the schedule was last changed
    pub updated_at: DateTime<Utc>,
}

impl WorkSchedule {
    /// Expected hours for a full week under this schedule
    pub fn expected_weekly_hours(&self) -> Decimal {
        Decimal::from(self.days_per_week) * self.hours_per_day
    }

    /// Expected weekly earnings at the given hourly rate
    pub fn expected_weekly_earnings(&self, hourly_rate: Decimal) -> Decimal {
        self.expected_weekly_hours() * hourly_rate
    }

    /// Inserts or updates the schedule for a user in one statement
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        days_per_week: i32,
        hours_per_day: Decimal,
    ) -> Result<Self, sqlx::Error> {
        let schedule = sqlx::query_as::<_, WorkSchedule>(
            r#"
            INSERT INTO work_schedules (user_id, days_per_week, hours_per_day)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET days_per_week = EXCLUDED.days_per_week,
                hours_per_day = EXCLUDED.hours_per_day,
                updated_at = NOW()
            RETURNING user_id, days_per_week, hours_per_day, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(days_per_week)
        .bind(hours_per_day)
        .fetch_one(pool)
        .await?;

        Ok(schedule)
    }

    /// Finds the schedule for a user
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let schedule = sqlx::query_as::<_, WorkSchedule>(
            r#"
            SELECT user_id, days_per_week, hours_per_day, created_at, updated_at
            FROM work_schedules
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn schedule(days: i32, hours: Decimal) -> WorkSchedule {
        WorkSchedule {
            user_id: Uuid::new_v4(),
            days_per_week: days,
            hours_per_day: hours,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_expected_weekly_hours() {
        assert_eq!(schedule(5, dec!(8)).expected_weekly_hours(), dec!(40));
        assert_eq!(schedule(3, dec!(7.5)).expected_weekly_hours(), dec!(22.5));
    }

    #[test]
    fn test_expected_weekly_earnings() {
        let s = schedule(5, dec!(8));
        assert_eq!(s.expected_weekly_earnings(dec!(50)), dec!(2000));
    }
}
