/// Database models for Worklog
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts with role and hourly rate
/// - `week`: Weekly timesheet periods with the single-open-week invariant
/// - `task`: Submitted work items and their approval state machine
/// - `invoice`: Generated invoices with attached documents
/// - `evidence`: Append-only payment evidence records
/// - `schedule`: Per-developer expected work schedules

pub mod evidence;
pub mod invoice;
pub mod schedule;
pub mod task;
pub mod user;
pub mod week;
