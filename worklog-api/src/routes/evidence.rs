/// Payment evidence endpoints
///
/// Admin/HR upload proof-of-payment documents for a developer and week.
/// Records are append-only: there is no update or delete path, and the
/// existence of a record is itself the signal that payment happened.
///
/// # Endpoints
///
/// - `GET /v1/evidence` - List records, filterable (admin, hr; developers
///   see their own)
/// - `POST /v1/evidence` - Upload a document (admin, hr)
/// - `GET /v1/evidence/file/:name` - Fetch the stored document

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
use serde::Deserialize;
use uuid::Uuid;
use worklog_shared::{
    auth::{
        authorization::{require_capability, require_owner_or_capability, Capability},
        middleware::AuthContext,
    },
    models::evidence::{CreatePaymentEvidence, PaymentEvidence},
    storage::evidence_file_name,
};

/// Parsed multipart fields for evidence upload
#[derive(Debug, Default)]
struct EvidenceForm {
    user_id: Option<Uuid>,
    week_id: Option<Uuid>,
    file: Option<(String, Bytes)>,
}

/// List filter
#[derive(Debug, Default, Deserialize)]
pub struct EvidenceListParams {
    pub user_id: Option<Uuid>,
    pub week_id: Option<Uuid>,
}

async fn read_evidence_form(mut multipart: Multipart) -> Result<EvidenceForm, ApiError> {
    let mut form = EvidenceForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                let original = field.file_name().unwrap_or("evidence.pdf").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Upload failed: {}", e)))?;
                form.file = Some((original, bytes));
            }
            "user_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed field: {}", e)))?;
                form.user_id = Some(value.parse().map_err(|_| {
                    ApiError::invalid_field("user_id", &format!("Invalid value: {}", value))
                })?);
            }
            "week_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed field: {}", e)))?;
                form.week_id = Some(value.parse().map_err(|_| {
                    ApiError::invalid_field("week_id", &format!("Invalid value: {}", value))
                })?);
            }
            _ => {} // Unknown fields are ignored
        }
    }

    Ok(form)
}

/// Uploads a payment evidence document
///
/// # Errors
///
/// - `403 Forbidden`: Developer session
/// - `422 Unprocessable Entity`: Missing user/week/file
pub async fn upload_evidence(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> ApiResult<Json<PaymentEvidence>> {
    require_capability(&auth, Capability::ManageEvidence)?;

    let form = read_evidence_form(multipart).await?;

    let user_id = form
        .user_id
        .ok_or_else(|| ApiError::invalid_field("user_id", "user_id is required"))?;
    let week_id = form
        .week_id
        .ok_or_else(|| ApiError::invalid_field("week_id", "week_id is required"))?;
    let (original_name, bytes) = form
        .file
        .ok_or_else(|| ApiError::invalid_field("file", "file is required"))?;

    let file_name = evidence_file_name(&original_name);
    state.documents.put(&file_name, bytes).await?;

    let evidence = PaymentEvidence::create(
        &state.db,
        CreatePaymentEvidence {
            user_id,
            week_id,
            file_name,
            original_name,
            uploaded_by: auth.user_id,
        },
    )
    .await?;

    tracing::info!(
        evidence_id = %evidence.id,
        user_id = %user_id,
        week_id = %week_id,
        "Payment evidence recorded"
    );

    Ok(Json(evidence))
}

/// Lists payment evidence records
///
/// Developers see only their own records regardless of the filter.
pub async fn list_evidence(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<EvidenceListParams>,
) -> ApiResult<Json<Vec<PaymentEvidence>>> {
    let user_filter = if auth.role.allows(Capability::ManageEvidence) {
        params.user_id
    } else {
        Some(auth.user_id)
    };

    let records = PaymentEvidence::list(&state.db, user_filter, params.week_id).await?;

    Ok(Json(records))
}

/// Fetches a stored evidence document
///
/// Access is restricted to the concerned developer and admin/HR. An evicted
/// document maps to the distinct "contact support" 404.
pub async fn get_evidence_file(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let evidence = PaymentEvidence::find_by_file_name(&state.db, &name)
        .await?
        .ok_or_else(|| ApiError::NotFound("Evidence record not found".to_string()))?;

    require_owner_or_capability(&auth, evidence.user_id, Capability::ManageEvidence)?;

    let bytes = state
        .documents
        .get(&evidence.file_name)
        .await?
        .ok_or(ApiError::DocumentMissing)?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", evidence.original_name),
        ),
    ];

    Ok((headers, bytes))
}
