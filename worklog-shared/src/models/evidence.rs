/// Payment evidence model
///
/// Append-only records of proof-of-payment documents uploaded by admin/HR
/// for a developer and week. There is no status field and no update or
/// delete path; existence of a record is the signal.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE payment_evidence (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     week_id UUID NOT NULL REFERENCES weeks(id) ON DELETE CASCADE,
///     file_name VARCHAR(255) NOT NULL,
///     original_name VARCHAR(255) NOT NULL,
///     uploaded_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Payment evidence record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentEvidence {
    /// Unique record ID
    pub id: Uuid,

    /// Developer the payment concerns
    pub user_id: Uuid,

    /// Week the payment covers
    pub week_id: Uuid,

    /// Stored document reference
    pub file_name: String,

    /// Name of the file as uploaded
    pub original_name: String,

    /// Admin/HR user who uploaded the document
    pub uploaded_by: Option<Uuid>,

    /// When the record was created
    pub created_at: DateTime<Utc>,
}

/// Input for recording uploaded payment evidence
#[derive(Debug, Clone)]
pub struct CreatePaymentEvidence {
    pub user_id: Uuid,
    pub week_id: Uuid,
    pub file_name: String,
    pub original_name: String,
    pub uploaded_by: Uuid,
}

impl PaymentEvidence {
    /// Records a new evidence document
    pub async fn create(
        pool: &PgPool,
        data: CreatePaymentEvidence,
    ) -> Result<Self, sqlx::Error> {
        let evidence = sqlx::query_as::<_, PaymentEvidence>(
            r#"
            INSERT INTO payment_evidence (user_id, week_id, file_name, original_name, uploaded_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, week_id, file_name, original_name, uploaded_by, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.week_id)
        .bind(data.file_name)
        .bind(data.original_name)
        .bind(data.uploaded_by)
        .fetch_one(pool)
        .await?;

        Ok(evidence)
    }

    /// Finds a record by its stored document name
    pub async fn find_by_file_name(
        pool: &PgPool,
        file_name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let evidence = sqlx::query_as::<_, PaymentEvidence>(
            r#"
            SELECT id, user_id, week_id, file_name, original_name, uploaded_by, created_at
            FROM payment_evidence
            WHERE file_name = $1
            "#,
        )
        .bind(file_name)
        .fetch_optional(pool)
        .await?;

        Ok(evidence)
    }

    /// Lists evidence records, filterable by user and/or week, newest first
    pub async fn list(
        pool: &PgPool,
        user_id: Option<Uuid>,
        week_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let records = sqlx::query_as::<_, PaymentEvidence>(
            r#"
            SELECT id, user_id, week_id, file_name, original_name, uploaded_by, created_at
            FROM payment_evidence
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR week_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(week_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }
}
