/// Invoice model and numbering
///
/// Invoices are created by admin/HR for a developer, usually against a closed
/// week's approved hours, with a document attached. Status moves freely among
/// pending/paid/rejected with no enforced ordering.
///
/// # Invoice numbers
///
/// `INV-YYYYMMDD-NNNN`: the current UTC date plus a random 4-digit suffix.
/// The column carries a UNIQUE constraint; the caller generates a number,
/// attempts the insert, and regenerates on `is_number_conflict` a bounded
/// number of times, so a duplicate suffix on the same day cannot produce two
/// invoices with one number. Keeping the loop at the caller lets the stored
/// document name (which embeds the number) move together with it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invoice_status AS ENUM ('pending', 'paid', 'rejected');
///
/// CREATE TABLE invoices (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     week_id UUID REFERENCES weeks(id) ON DELETE SET NULL,
///     invoice_number VARCHAR(32) NOT NULL UNIQUE,
///     total_hours NUMERIC(8, 2) NOT NULL CHECK (total_hours > 0),
///     amount NUMERIC(12, 2) NOT NULL CHECK (amount >= 0),
///     status invoice_status NOT NULL DEFAULT 'pending',
///     file_name VARCHAR(255) NOT NULL,
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Invoice payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Issued, awaiting payment
    Pending,

    /// Payment received
    Paid,

    /// Declined
    Rejected,
}

impl InvoiceStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Rejected => "rejected",
        }
    }
}

/// Invoice model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    /// Unique invoice ID
    pub id: Uuid,

    /// Developer the invoice is issued for
    pub user_id: Uuid,

    /// Week the invoice covers, if tied to one
    pub week_id: Option<Uuid>,

    /// Generated number, `INV-YYYYMMDD-NNNN`
    pub invoice_number: String,

    /// Billed hours
    pub total_hours: Decimal,

    /// Billed amount
    pub amount: Decimal,

    /// Payment status
    pub status: InvoiceStatus,

    /// Stored document reference
    pub file_name: String,

    /// Admin/HR user who created the invoice
    pub created_by: Option<Uuid>,

    /// When the invoice was created
    pub created_at: DateTime<Utc>,

    /// When the invoice was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new invoice
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub user_id: Uuid,
    pub week_id: Option<Uuid>,
    pub invoice_number: String,
    pub total_hours: Decimal,
    pub amount: Decimal,
    pub file_name: String,
    pub created_by: Uuid,
}

/// Input for partially updating an invoice
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoice {
    pub amount: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
    pub file_name: Option<String>,
}

/// A closed week with the developer's approved hours, for invoice creation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BillableWeek {
    pub week_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Sum of the developer's approved task hours in this week
    pub approved_hours: Decimal,
}

/// Generates an invoice number for the given date
///
/// Format: `INV-YYYYMMDD-NNNN` with a random 4-digit suffix.
pub fn generate_invoice_number(date: NaiveDate) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("INV-{}-{:04}", date.format("%Y%m%d"), suffix)
}

/// Parses the date segment out of an invoice number
///
/// Returns None when the input does not match `INV-YYYYMMDD-NNNN`.
pub fn parse_invoice_date(invoice_number: &str) -> Option<NaiveDate> {
    let mut parts = invoice_number.splitn(3, '-');
    if parts.next() != Some("INV") {
        return None;
    }

    let date_segment = parts.next()?;
    let suffix = parts.next()?;
    if suffix.len() != 4 || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    NaiveDate::parse_from_str(date_segment, "%Y%m%d").ok()
}

/// Whether an insert failed on the invoice-number UNIQUE constraint
///
/// The caller regenerates the number and retries on this; any other error
/// propagates.
pub fn is_number_conflict(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.constraint().is_some_and(|c| c.contains("invoice_number"))
    )
}

impl Invoice {
    /// Creates a new invoice in pending state
    ///
    /// A duplicate invoice number surfaces as a database error the caller
    /// can recognize with [`is_number_conflict`].
    pub async fn create(pool: &PgPool, data: CreateInvoice) -> Result<Self, sqlx::Error> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (user_id, week_id, invoice_number, total_hours,
                                  amount, file_name, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, week_id, invoice_number, total_hours, amount,
                      status, file_name, created_by, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.week_id)
        .bind(&data.invoice_number)
        .bind(data.total_hours)
        .bind(data.amount)
        .bind(&data.file_name)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(invoice)
    }

    /// Finds an invoice by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, user_id, week_id, invoice_number, total_hours, amount,
                   status, file_name, created_by, created_at, updated_at
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(invoice)
    }

    /// Finds an invoice by its stored document name
    pub async fn find_by_file_name(
        pool: &PgPool,
        file_name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, user_id, week_id, invoice_number, total_hours, amount,
                   status, file_name, created_by, created_at, updated_at
            FROM invoices
            WHERE file_name = $1
            "#,
        )
        .bind(file_name)
        .fetch_optional(pool)
        .await?;

        Ok(invoice)
    }

    /// Partially updates amount, status, and/or document reference
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateInvoice,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET amount = COALESCE($2, amount),
                status = COALESCE($3, status),
                file_name = COALESCE($4, file_name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, week_id, invoice_number, total_hours, amount,
                      status, file_name, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.amount)
        .bind(data.status)
        .bind(data.file_name)
        .fetch_optional(pool)
        .await?;

        Ok(invoice)
    }

    /// Deletes an invoice
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists invoices, optionally filtered by user, newest first
    pub async fn list(pool: &PgPool, user_id: Option<Uuid>) -> Result<Vec<Self>, sqlx::Error> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, user_id, week_id, invoice_number, total_hours, amount,
                   status, file_name, created_by, created_at, updated_at
            FROM invoices
            WHERE $1::uuid IS NULL OR user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(invoices)
    }

    /// Lists a developer's closed weeks with approved hours
    ///
    /// Supports invoice creation: only closed weeks where the developer has
    /// at least one approved task appear, newest first.
    pub async fn billable_weeks(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<BillableWeek>, sqlx::Error> {
        let weeks = sqlx::query_as::<_, BillableWeek>(
            r#"
            SELECT w.id AS week_id, w.start_date, w.end_date,
                   SUM(t.hours) AS approved_hours
            FROM weeks w
            JOIN tasks t ON t.week_id = w.id
            WHERE NOT w.is_open
              AND t.user_id = $1
              AND t.status = 'approved'
            GROUP BY w.id
            ORDER BY w.start_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(weeks)
    }
}
