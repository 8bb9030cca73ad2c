/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Sign-in via the OAuth provider, token refresh
/// - `profile`: Own profile read/update
/// - `users`: User directory and role/rate management
/// - `weeks`: Week lifecycle (create, open/close, list)
/// - `tasks`: Task submission, review, and the week summary
/// - `invoices`: Invoice CRUD, documents, billable weeks
/// - `evidence`: Payment evidence upload and listing
/// - `schedules`: Developer work schedules
/// - `tracker`: Issue-tracker lookups

pub mod auth;
pub mod evidence;
pub mod health;
pub mod invoices;
pub mod profile;
pub mod schedules;
pub mod tasks;
pub mod tracker;
pub mod users;
pub mod weeks;
