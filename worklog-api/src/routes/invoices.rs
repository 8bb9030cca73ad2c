/// Invoice endpoints
///
/// Admin/HR create invoices for developers, usually against a closed week's
/// approved hours, with a document attached as multipart form data. The
/// stored document lives in the ephemeral document store; a missing document
/// maps to a distinct, user-actionable 404.
///
/// # Endpoints
///
/// - `GET /v1/invoices` - Own invoices, or all/filtered (admin, hr)
/// - `POST /v1/invoices` - Create with document upload (admin, hr)
/// - `PUT /v1/invoices/:id` - Partial update (admin, hr)
/// - `DELETE /v1/invoices/:id` - Delete (admin, hr)
/// - `GET /v1/invoices/file/:name` - Fetch the stored document
/// - `GET /v1/invoices/billable-weeks/:user_id` - Closed weeks with approved
///   hours (admin, hr)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use bytes::Bytes;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;
use worklog_shared::{
    auth::{
        authorization::{require_capability, require_owner_or_capability, Capability},
        middleware::AuthContext,
    },
    models::invoice::{
        generate_invoice_number, is_number_conflict, BillableWeek, CreateInvoice, Invoice,
        InvoiceStatus, UpdateInvoice,
    },
    storage::invoice_file_name,
};

/// How many times creation retries on an invoice-number collision
const INVOICE_NUMBER_RETRIES: usize = 5;

/// Parsed multipart fields for invoice creation
#[derive(Debug, Default)]
struct InvoiceForm {
    user_id: Option<Uuid>,
    week_id: Option<Uuid>,
    total_hours: Option<Decimal>,
    amount: Option<Decimal>,
    file: Option<(String, Bytes)>,
}

/// Invoice update request; only provided fields change
#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceRequest {
    pub amount: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
}

/// List filter
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListParams {
    pub user_id: Option<Uuid>,
}

async fn read_invoice_form(mut multipart: Multipart) -> Result<InvoiceForm, ApiError> {
    let mut form = InvoiceForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                let original = field.file_name().unwrap_or("invoice.pdf").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Upload failed: {}", e)))?;
                form.file = Some((original, bytes));
            }
            other => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed field: {}", e)))?;

                match other {
                    "user_id" => form.user_id = Some(parse_field("user_id", &value)?),
                    "week_id" => form.week_id = Some(parse_field("week_id", &value)?),
                    "total_hours" => form.total_hours = Some(parse_field("total_hours", &value)?),
                    "amount" => form.amount = Some(parse_field("amount", &value)?),
                    _ => {} // Unknown fields are ignored
                }
            }
        }
    }

    Ok(form)
}

fn parse_field<T: FromStr>(field: &str, value: &str) -> Result<T, ApiError> {
    value
        .parse::<T>()
        .map_err(|_| ApiError::invalid_field(field, &format!("Invalid value: {}", value)))
}

fn require_field<T>(field: &str, value: Option<T>) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::invalid_field(field, &format!("{} is required", field)))
}

/// Creates an invoice with an attached document
///
/// The invoice number (`INV-YYYYMMDD-NNNN`) is generated server-side and the
/// document is stored under `invoice_<number>_<timestamp>.<ext>`.
///
/// # Errors
///
/// - `403 Forbidden`: Developer session
/// - `422 Unprocessable Entity`: Missing user/total_hours/amount/file, or
///   non-positive numbers
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> ApiResult<Json<Invoice>> {
    require_capability(&auth, Capability::ManageInvoices)?;

    let form = read_invoice_form(multipart).await?;

    let user_id = require_field("user_id", form.user_id)?;
    let total_hours = require_field("total_hours", form.total_hours)?;
    let amount = require_field("amount", form.amount)?;
    let (original_name, bytes) = require_field("file", form.file)?;

    if total_hours <= Decimal::ZERO {
        return Err(ApiError::invalid_field(
            "total_hours",
            "Total hours must be positive",
        ));
    }
    if amount < Decimal::ZERO {
        return Err(ApiError::invalid_field("amount", "Amount must be non-negative"));
    }

    // The stored file name embeds the invoice number, so number generation,
    // document write, and row insert move together: a number collision
    // removes the just-written document and retries the whole attempt.
    let mut attempts = INVOICE_NUMBER_RETRIES;
    let invoice = loop {
        let number = generate_invoice_number(chrono::Utc::now().date_naive());
        let file_name = invoice_file_name(&number, &original_name);

        state.documents.put(&file_name, bytes.clone()).await?;

        let result = Invoice::create(
            &state.db,
            CreateInvoice {
                user_id,
                week_id: form.week_id,
                invoice_number: number.clone(),
                total_hours,
                amount,
                file_name: file_name.clone(),
                created_by: auth.user_id,
            },
        )
        .await;

        match result {
            Ok(invoice) => break invoice,
            Err(e) => {
                if let Err(cleanup) = state.documents.delete(&file_name).await {
                    tracing::warn!(error = %cleanup, file = %file_name, "Orphaned invoice document");
                }

                attempts -= 1;
                if is_number_conflict(&e) && attempts > 0 {
                    tracing::debug!(%number, "Invoice number collision, regenerating");
                    continue;
                }

                return Err(e.into());
            }
        }
    };

    tracing::info!(
        invoice_id = %invoice.id,
        number = %invoice.invoice_number,
        user_id = %user_id,
        "Invoice created"
    );

    Ok(Json(invoice))
}

/// Partially updates an invoice's amount and/or status
///
/// Status moves freely among pending/paid/rejected; there is no enforced
/// ordering.
pub async fn update_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateInvoiceRequest>,
) -> ApiResult<Json<Invoice>> {
    require_capability(&auth, Capability::ManageInvoices)?;

    if let Some(amount) = req.amount {
        if amount < Decimal::ZERO {
            return Err(ApiError::invalid_field("amount", "Amount must be non-negative"));
        }
    }

    let invoice = Invoice::update(
        &state.db,
        id,
        UpdateInvoice {
            amount: req.amount,
            status: req.status,
            file_name: None,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

    Ok(Json(invoice))
}

/// Deletes an invoice and its stored document
pub async fn delete_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_capability(&auth, Capability::ManageInvoices)?;

    let invoice = Invoice::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

    Invoice::delete(&state.db, id).await?;

    if let Err(e) = state.documents.delete(&invoice.file_name).await {
        tracing::warn!(error = %e, file = %invoice.file_name, "Orphaned invoice document");
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Lists invoices
///
/// Developers see only their own regardless of the filter; admin/HR see all
/// or filter by user.
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<InvoiceListParams>,
) -> ApiResult<Json<Vec<Invoice>>> {
    let filter = if auth.role.allows(Capability::ManageInvoices) {
        params.user_id
    } else {
        Some(auth.user_id)
    };

    let invoices = Invoice::list(&state.db, filter).await?;

    Ok(Json(invoices))
}

/// Fetches a stored invoice document
///
/// Access is restricted to the invoice's developer and admin/HR. The store
/// is ephemeral: an evicted document maps to a distinct 404 telling the user
/// to contact support.
pub async fn get_invoice_file(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let invoice = Invoice::find_by_file_name(&state.db, &name)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

    require_owner_or_capability(&auth, invoice.user_id, Capability::ManageInvoices)?;

    let bytes = state
        .documents
        .get(&invoice.file_name)
        .await?
        .ok_or(ApiError::DocumentMissing)?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", invoice.file_name),
        ),
    ];

    Ok((headers, bytes))
}

/// Lists a developer's closed weeks with approved hours
///
/// Supports the invoice creation flow: each row is a closed week where the
/// developer has approved tasks, with the summed hours.
pub async fn list_billable_weeks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<BillableWeek>>> {
    require_capability(&auth, Capability::ManageInvoices)?;

    let weeks = Invoice::billable_weeks(&state.db, user_id).await?;

    Ok(Json(weeks))
}
