/// Authorization: role capabilities and uniform permission checks
///
/// Every role-gated operation in the API maps to one `Capability`, and every
/// handler performs the same two-line check through `require_capability`
/// instead of comparing roles inline. The full matrix lives in
/// `UserRole::allows` so a permission change is a one-line diff with the
/// tests next to it.
///
/// # Example
///
/// ```no_run
/// use worklog_shared::auth::authorization::{require_capability, Capability};
/// use worklog_shared::auth::middleware::AuthContext;
///
/// fn review_guard(auth: &AuthContext) -> Result<(), Box<dyn std::error::Error>> {
///     require_capability(auth, Capability::ReviewTasks)?;
///     Ok(())
/// }
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Role lacks the required capability
    #[error("Role {role:?} may not {capability:?}")]
    MissingCapability {
        role: UserRole,
        capability: Capability,
    },

    /// User doesn't own the resource
    #[error("Not authorized to access this resource")]
    NotOwner,
}

/// Actions a role may be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create weeks and toggle their open state
    ManageWeeks,

    /// See the week listing with aggregate counts
    ViewAllWeeks,

    /// Approve or reject submitted tasks
    ReviewTasks,

    /// Submit, edit, and delete own timesheet tasks
    SubmitTasks,

    /// Create, update, and delete invoices
    ManageInvoices,

    /// Upload and list payment evidence
    ManageEvidence,

    /// List users and change roles/rates
    ManageUsers,

    /// View the user directory without mutation rights
    ViewUsers,

    /// Upsert developer work schedules
    ManageSchedules,
}

impl UserRole {
    /// Whether this role is granted the capability
    ///
    /// The single source of truth for the permission matrix:
    ///
    /// | capability       | admin | hr | developer |
    /// |------------------|-------|----|-----------|
    /// | ManageWeeks      | ✔     |    |           |
    /// | ViewAllWeeks     | ✔     | ✔  |           |
    /// | ReviewTasks      | ✔     | ✔  |           |
    /// | SubmitTasks      |       |    | ✔         |
    /// | ManageInvoices   | ✔     | ✔  |           |
    /// | ManageEvidence   | ✔     | ✔  |           |
    /// | ManageUsers      | ✔     |    |           |
    /// | ViewUsers        | ✔     | ✔  |           |
    /// | ManageSchedules  | ✔     |    |           |
    pub fn allows(&self, capability: Capability) -> bool {
        use Capability::*;

        match capability {
            ManageWeeks | ManageUsers | ManageSchedules => matches!(self, UserRole::Admin),
            ViewAllWeeks | ReviewTasks | ManageInvoices | ManageEvidence | ViewUsers => {
                matches!(self, UserRole::Admin | UserRole::Hr)
            }
            SubmitTasks => matches!(self, UserRole::Developer),
        }
    }
}

/// Checks that the session's role is granted a capability
pub fn require_capability(auth: &AuthContext, capability: Capability) -> Result<(), AuthzError> {
    if !auth.role.allows(capability) {
        return Err(AuthzError::MissingCapability {
            role: auth.role,
            capability,
        });
    }

    Ok(())
}

/// Checks that the session user owns a resource
pub fn require_ownership(auth: &AuthContext, resource_owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id != resource_owner_id {
        return Err(AuthzError::NotOwner);
    }

    Ok(())
}

/// Checks ownership OR a fallback capability
///
/// Developers reach their own resources; admin/HR reach everyone's through
/// the capability.
pub fn require_owner_or_capability(
    auth: &AuthContext,
    resource_owner_id: Uuid,
    capability: Capability,
) -> Result<(), AuthzError> {
    if auth.user_id == resource_owner_id {
        return Ok(());
    }

    require_capability(auth, capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: UserRole) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_admin_capabilities() {
        let admin = UserRole::Admin;
        assert!(admin.allows(Capability::ManageWeeks));
        assert!(admin.allows(Capability::ReviewTasks));
        assert!(admin.allows(Capability::ManageInvoices));
        assert!(admin.allows(Capability::ManageUsers));
        assert!(admin.allows(Capability::ManageSchedules));
        assert!(!admin.allows(Capability::SubmitTasks));
    }

    #[test]
    fn test_hr_capabilities() {
        let hr = UserRole::Hr;
        assert!(hr.allows(Capability::ReviewTasks));
        assert!(hr.allows(Capability::ManageInvoices));
        assert!(hr.allows(Capability::ManageEvidence));
        assert!(hr.allows(Capability::ViewAllWeeks));
        assert!(hr.allows(Capability::ViewUsers));
        assert!(!hr.allows(Capability::ManageWeeks));
        assert!(!hr.allows(Capability::ManageUsers));
        assert!(!hr.allows(Capability::ManageSchedules));
        assert!(!hr.allows(Capability::SubmitTasks));
    }

    #[test]
    fn test_developer_capabilities() {
        let dev = UserRole::Developer;
        assert!(dev.allows(Capability::SubmitTasks));
        assert!(!dev.allows(Capability::ReviewTasks));
        assert!(!dev.allows(Capability::ManageWeeks));
        assert!(!dev.allows(Capability::ManageInvoices));
        assert!(!dev.allows(Capability::ViewUsers));
    }

    #[test]
    fn test_require_capability() {
        assert!(require_capability(&ctx(UserRole::Admin), Capability::ManageWeeks).is_ok());

        let err = require_capability(&ctx(UserRole::Developer), Capability::ManageWeeks);
        assert!(matches!(
            err.unwrap_err(),
            AuthzError::MissingCapability { .. }
        ));
    }

    #[test]
    fn test_require_ownership() {
        let auth = ctx(UserRole::Developer);

        assert!(require_ownership(&auth, auth.user_id).is_ok());
        assert!(require_ownership(&auth, Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_require_owner_or_capability() {
        let dev = ctx(UserRole::Developer);
        let hr = ctx(UserRole::Hr);
        let other = Uuid::new_v4();

        // Owner passes without the capability
        assert!(require_owner_or_capability(&dev, dev.user_id, Capability::ManageInvoices).is_ok());

        // Non-owner developer fails
        assert!(require_owner_or_capability(&dev, other, Capability::ManageInvoices).is_err());

        // HR passes via the capability
        assert!(require_owner_or_capability(&hr, other, Capability::ManageInvoices).is_ok());
    }
}
