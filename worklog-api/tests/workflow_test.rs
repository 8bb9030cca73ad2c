/// Integration tests for the timesheet and invoicing workflow
///
/// These tests drive the full router end-to-end:
/// - Week lifecycle and the single-open-week invariant
/// - Task submission, ownership guards, and review
/// - Week summary arithmetic
/// - Invoice creation with document upload and status changes
/// - Payment evidence upload/listing
/// - Concurrent work-schedule upserts
///
/// They require `DATABASE_URL` and `JWT_SECRET` in the environment.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, json_body, TestContext};
use rust_decimal_macros::dec;
use serde_json::json;
use tower::Service as _;
use worklog_shared::models::schedule::WorkSchedule;

/// Creating a week requires the admin role and always yields an open week
#[tokio::test]
async fn test_create_week_admin_only_and_open() {
    let ctx = TestContext::new().await.unwrap();

    // Developer may not create weeks
    let response = ctx
        .request(
            Method::POST,
            "/v1/weeks",
            &ctx.developer,
            Some(json!({ "start_date": "2024-01-01", "end_date": "2024-01-07" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin creates; the week is open regardless of input
    let response = ctx
        .request(
            Method::POST,
            "/v1/weeks",
            &ctx.admin,
            Some(json!({ "start_date": "2024-01-01", "end_date": "2024-01-07" })),
        )
        .await;
    let week = json_body(response, StatusCode::OK).await;
    assert_eq!(week["is_open"], true);

    // Missing dates fail validation
    let response = ctx
        .request(Method::POST, "/v1/weeks", &ctx.admin, Some(json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

/// A second open week is rejected with a conflict, and reopening a closed
/// week succeeds only when no other week is open
#[tokio::test]
async fn test_single_open_week_invariant() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .request(
            Method::POST,
            "/v1/weeks",
            &ctx.admin,
            Some(json!({ "start_date": "2024-01-01", "end_date": "2024-01-07" })),
        )
        .await;
    let first = json_body(response, StatusCode::OK).await;

    // Second create conflicts while the first is open
    let response = ctx
        .request(
            Method::POST,
            "/v1/weeks",
            &ctx.admin,
            Some(json!({ "start_date": "2024-01-08", "end_date": "2024-01-14" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Close the first, then the second create succeeds
    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/weeks/{}/open", first["id"].as_str().unwrap()),
            &ctx.admin,
            Some(json!({ "is_open": false })),
        )
        .await;
    let closed = json_body(response, StatusCode::OK).await;
    assert_eq!(closed["is_open"], false);

    let response = ctx
        .request(
            Method::POST,
            "/v1/weeks",
            &ctx.admin,
            Some(json!({ "start_date": "2024-01-08", "end_date": "2024-01-14" })),
        )
        .await;
    json_body(response, StatusCode::OK).await;

    // Reopening the first while the second is open conflicts
    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/weeks/{}/open", first["id"].as_str().unwrap()),
            &ctx.admin,
            Some(json!({ "is_open": true })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Scenario A: a developer logs 8 hours against the open week and the
/// summary reports 8 total / 0 approved
#[tokio::test]
async fn test_task_submission_and_summary() {
    let ctx = TestContext::new().await.unwrap();

    // No open week yet: submission conflicts
    let response = ctx
        .request(
            Method::POST,
            "/v1/tasks",
            &ctx.developer,
            Some(json!({ "description": "Implement export", "hours": "8" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .request(
            Method::POST,
            "/v1/weeks",
            &ctx.admin,
            Some(json!({ "start_date": "2024-01-01", "end_date": "2024-01-07" })),
        )
        .await;
    json_body(response, StatusCode::OK).await;

    // Validation: empty description, non-positive hours
    let response = ctx
        .request(
            Method::POST,
            "/v1/tasks",
            &ctx.developer,
            Some(json!({ "description": "  ", "hours": "8" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx
        .request(
            Method::POST,
            "/v1/tasks",
            &ctx.developer,
            Some(json!({ "description": "Implement export", "hours": "0" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx
        .request(
            Method::POST,
            "/v1/tasks",
            &ctx.developer,
            Some(json!({ "description": "Implement export", "hours": "8" })),
        )
        .await;
    let task = json_body(response, StatusCode::OK).await;
    assert_eq!(task["status"], "pending");

    // Summary: developer rate is 50/h
    let response = ctx
        .request(Method::GET, "/v1/summary", &ctx.developer, None)
        .await;
    let summary = json_body(response, StatusCode::OK).await;
    assert_eq!(decimal(&summary["total_hours"]), dec!(8));
    assert_eq!(decimal(&summary["approved_hours"]), dec!(0));
    assert_eq!(decimal(&summary["total_payout"]), dec!(400));
    assert_eq!(decimal(&summary["approved_payout"]), dec!(0));
}

/// Scenario B: rejection without a comment fails validation; with a comment
/// the task lands in rejected with the comment stored
#[tokio::test]
async fn test_review_rejection_requires_comment() {
    let ctx = TestContext::new().await.unwrap();

    ctx.request(
        Method::POST,
        "/v1/weeks",
        &ctx.admin,
        Some(json!({ "start_date": "2024-01-01", "end_date": "2024-01-07" })),
    )
    .await;

    let response = ctx
        .request(
            Method::POST,
            "/v1/tasks",
            &ctx.developer,
            Some(json!({ "description": "Fix login", "hours": "3" })),
        )
        .await;
    let task = json_body(response, StatusCode::OK).await;
    let task_id = task["id"].as_str().unwrap().to_string();

    // Reject without comment
    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/tasks/{}/review", task_id),
            &ctx.admin,
            Some(json!({ "status": "rejected" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Blank comment is treated as absent
    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/tasks/{}/review", task_id),
            &ctx.admin,
            Some(json!({ "status": "rejected", "comment": "   " })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Reject with comment
    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/tasks/{}/review", task_id),
            &ctx.admin,
            Some(json!({ "status": "rejected", "comment": "incomplete" })),
        )
        .await;
    let reviewed = json_body(response, StatusCode::OK).await;
    assert_eq!(reviewed["status"], "rejected");
    assert_eq!(reviewed["admin_comment"], "incomplete");
    assert_eq!(reviewed["reviewed_by"], ctx.admin.id.to_string());

    // Review outcomes are terminal
    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/tasks/{}/review", task_id),
            &ctx.admin,
            Some(json!({ "status": "approved" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Task mutation is limited to the owning developer while pending
#[tokio::test]
async fn test_task_mutation_guards() {
    let ctx = TestContext::new().await.unwrap();

    ctx.request(
        Method::POST,
        "/v1/weeks",
        &ctx.admin,
        Some(json!({ "start_date": "2024-01-01", "end_date": "2024-01-07" })),
    )
    .await;

    let response = ctx
        .request(
            Method::POST,
            "/v1/tasks",
            &ctx.developer,
            Some(json!({ "description": "Write docs", "hours": "2" })),
        )
        .await;
    let task = json_body(response, StatusCode::OK).await;
    let task_id = task["id"].as_str().unwrap().to_string();

    // Owner edits while pending
    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/tasks/{}", task_id),
            &ctx.developer,
            Some(json!({ "description": "Write docs and examples", "hours": "3.5" })),
        )
        .await;
    let updated = json_body(response, StatusCode::OK).await;
    assert_eq!(decimal(&updated["hours"]), dec!(3.5));

    // Approve, then edits and deletes are forbidden
    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/tasks/{}/review", task_id),
            &ctx.hr,
            Some(json!({ "status": "approved" })),
        )
        .await;
    let approved = json_body(response, StatusCode::OK).await;
    assert_eq!(approved["status"], "approved");

    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/tasks/{}", task_id),
            &ctx.developer,
            Some(json!({ "description": "Sneaky edit", "hours": "40" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .request(
            Method::DELETE,
            &format!("/v1/tasks/{}", task_id),
            &ctx.developer,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Unknown task is a 404
    let response = ctx
        .request(
            Method::DELETE,
            &format!("/v1/tasks/{}", uuid::Uuid::new_v4()),
            &ctx.developer,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Scenario C: close the week, invoice the developer with a document,
/// mark it paid, and the developer sees the paid invoice
#[tokio::test]
async fn test_invoice_lifecycle() {
    let ctx = TestContext::new().await.unwrap();

    // Week with an approved task, then closed
    let response = ctx
        .request(
            Method::POST,
            "/v1/weeks",
            &ctx.admin,
            Some(json!({ "start_date": "2024-01-01", "end_date": "2024-01-07" })),
        )
        .await;
    let week = json_body(response, StatusCode::OK).await;
    let week_id = week["id"].as_str().unwrap().to_string();

    let response = ctx
        .request(
            Method::POST,
            "/v1/tasks",
            &ctx.developer,
            Some(json!({ "description": "Sprint work", "hours": "40" })),
        )
        .await;
    let task = json_body(response, StatusCode::OK).await;

    ctx.request(
        Method::PUT,
        &format!("/v1/tasks/{}/review", task["id"].as_str().unwrap()),
        &ctx.admin,
        Some(json!({ "status": "approved" })),
    )
    .await;

    ctx.request(
        Method::PUT,
        &format!("/v1/weeks/{}/open", week_id),
        &ctx.admin,
        Some(json!({ "is_open": false })),
    )
    .await;

    // The closed week shows up as billable with 40 approved hours
    let response = ctx
        .request(
            Method::GET,
            &format!("/v1/invoices/billable-weeks/{}", ctx.developer.id),
            &ctx.hr,
            None,
        )
        .await;
    let billable = json_body(response, StatusCode::OK).await;
    assert_eq!(billable.as_array().unwrap().len(), 1);
    assert_eq!(decimal(&billable[0]["approved_hours"]), dec!(40));

    // Developer may not create invoices
    let response = ctx
        .multipart_request(
            "/v1/invoices",
            &ctx.developer,
            &[
                ("user_id", ctx.developer.id.to_string()),
                ("total_hours", "40".to_string()),
                ("amount", "2000".to_string()),
            ],
            ("invoice.pdf", b"%PDF-1.4 test"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Missing file fails validation
    let response = ctx
        .request(
            Method::POST,
            "/v1/invoices",
            &ctx.admin,
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Admin creates the invoice with a document
    let response = ctx
        .multipart_request(
            "/v1/invoices",
            &ctx.admin,
            &[
                ("user_id", ctx.developer.id.to_string()),
                ("week_id", week_id.clone()),
                ("total_hours", "40".to_string()),
                ("amount", "2000".to_string()),
            ],
            ("invoice.pdf", b"%PDF-1.4 test"),
        )
        .await;
    let invoice = json_body(response, StatusCode::OK).await;
    assert_eq!(invoice["status"], "pending");
    assert!(invoice["invoice_number"]
        .as_str()
        .unwrap()
        .starts_with("INV-"));

    let invoice_id = invoice["id"].as_str().unwrap().to_string();
    let file_name = invoice["file_name"].as_str().unwrap().to_string();

    // The developer can fetch their own document
    let response = ctx
        .request(
            Method::GET,
            &format!("/v1/invoices/file/{}", file_name),
            &ctx.developer,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Mark paid
    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/invoices/{}", invoice_id),
            &ctx.admin,
            Some(json!({ "status": "paid" })),
        )
        .await;
    let paid = json_body(response, StatusCode::OK).await;
    assert_eq!(paid["status"], "paid");

    // Developer's own listing shows the paid invoice
    let response = ctx
        .request(Method::GET, "/v1/invoices", &ctx.developer, None)
        .await;
    let invoices = json_body(response, StatusCode::OK).await;
    assert_eq!(invoices.as_array().unwrap().len(), 1);
    assert_eq!(invoices[0]["status"], "paid");
}

/// Payment evidence is admin/HR-only to upload, and developers see only
/// their own records
#[tokio::test]
async fn test_payment_evidence() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .request(
            Method::POST,
            "/v1/weeks",
            &ctx.admin,
            Some(json!({ "start_date": "2024-01-01", "end_date": "2024-01-07" })),
        )
        .await;
    let week = json_body(response, StatusCode::OK).await;
    let week_id = week["id"].as_str().unwrap().to_string();

    // Developer may not upload
    let response = ctx
        .multipart_request(
            "/v1/evidence",
            &ctx.developer,
            &[
                ("user_id", ctx.developer.id.to_string()),
                ("week_id", week_id.clone()),
            ],
            ("receipt.png", b"not-a-real-png"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // HR uploads for the developer
    let response = ctx
        .multipart_request(
            "/v1/evidence",
            &ctx.hr,
            &[
                ("user_id", ctx.developer.id.to_string()),
                ("week_id", week_id.clone()),
            ],
            ("receipt.png", b"not-a-real-png"),
        )
        .await;
    let evidence = json_body(response, StatusCode::OK).await;
    assert_eq!(evidence["uploaded_by"], ctx.hr.id.to_string());
    assert_eq!(evidence["original_name"], "receipt.png");

    // Developer lists own records
    let response = ctx
        .request(Method::GET, "/v1/evidence", &ctx.developer, None)
        .await;
    let records = json_body(response, StatusCode::OK).await;
    assert_eq!(records.as_array().unwrap().len(), 1);

    // And can fetch the document
    let response = ctx
        .request(
            Method::GET,
            &format!("/v1/evidence/file/{}", evidence["file_name"].as_str().unwrap()),
            &ctx.developer,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// Scenario D: two concurrent schedule upserts for the same new user leave
/// exactly one row
#[tokio::test]
async fn test_concurrent_schedule_upserts() {
    let ctx = TestContext::new().await.unwrap();

    let uri = format!("/v1/schedules/{}", ctx.developer.id);

    let first = ctx.request(
        Method::PUT,
        &uri,
        &ctx.admin,
        Some(json!({ "days_per_week": 5, "hours_per_day": "8" })),
    );
    let second = ctx.request(
        Method::PUT,
        &uri,
        &ctx.admin,
        Some(json!({ "days_per_week": 4, "hours_per_day": "6" })),
    );

    let (first, second) = tokio::join!(first, second);
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    // Exactly one row persists
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM work_schedules WHERE user_id = $1")
            .bind(ctx.developer.id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(count, 1);

    let schedule = WorkSchedule::find_by_user(&ctx.db, ctx.developer.id)
        .await
        .unwrap()
        .unwrap();
    assert!(schedule.days_per_week == 5 || schedule.days_per_week == 4);

    // Out-of-range values fail validation
    let response = ctx
        .request(
            Method::PUT,
            &uri,
            &ctx.admin,
            Some(json!({ "days_per_week": 9, "hours_per_day": "8" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Developer reads own schedule with expected totals (rate 50/h)
    let response = ctx
        .request(Method::GET, &uri, &ctx.developer, None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    let expected_hours = decimal(&body["expected_weekly_hours"]);
    assert!(expected_hours == dec!(40) || expected_hours == dec!(24));
}

/// Requests without a token are rejected, and role gates hold
#[tokio::test]
async fn test_authentication_and_roles() {
    let ctx = TestContext::new().await.unwrap();

    // No auth header
    let request = axum::http::Request::builder()
        .method(Method::GET)
        .uri("/v1/weeks")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Developer may not list weeks or users
    let response = ctx
        .request(Method::GET, "/v1/weeks", &ctx.developer, None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .request(Method::GET, "/v1/users", &ctx.developer, None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // HR reads the directory but may not mutate it
    let response = ctx.request(Method::GET, "/v1/users", &ctx.hr, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/users/{}", ctx.developer.id),
            &ctx.hr,
            Some(json!({ "hourly_rate": "75" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin updates the rate
    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/users/{}", ctx.developer.id),
            &ctx.admin,
            Some(json!({ "hourly_rate": "75" })),
        )
        .await;
    let updated = json_body(response, StatusCode::OK).await;
    assert_eq!(decimal(&updated["hourly_rate"]), dec!(75));

    // Negative rates fail validation
    let response = ctx
        .request(
            Method::PUT,
            &format!("/v1/users/{}", ctx.developer.id),
            &ctx.admin,
            Some(json!({ "hourly_rate": "-1" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

/// Profile endpoints operate on the session user only
#[tokio::test]
async fn test_profile_roundtrip() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .request(Method::GET, "/v1/profile", &ctx.developer, None)
        .await;
    let profile = json_body(response, StatusCode::OK).await;
    assert_eq!(profile["id"], ctx.developer.id.to_string());

    let response = ctx
        .request(
            Method::PUT,
            "/v1/profile",
            &ctx.developer,
            Some(json!({ "name": "Ada Lovelace" })),
        )
        .await;
    let updated = json_body(response, StatusCode::OK).await;
    assert_eq!(updated["name"], "Ada Lovelace");

    // Rejected: invalid avatar URL
    let response = ctx
        .request(
            Method::PUT,
            "/v1/profile",
            &ctx.developer,
            Some(json!({ "avatar_url": "not a url" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
