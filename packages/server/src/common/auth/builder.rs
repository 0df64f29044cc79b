use identity::Role;
use uuid::Uuid;

use super::{AdminCapability, AuthError};

/// Entry point for authorization checks on server-rendered paths
///
/// Usage:
/// ```rust,ignore
/// Actor::new(user_id, profile.role)
///     .can(AdminCapability::ManageUsers)
///     .check()?;
/// ```
pub struct Actor {
    user_id: Uuid,
    role: Role,
}

impl Actor {
    /// Create a new actor for authorization checks
    ///
    /// # Arguments
    /// * `user_id` - The provider-issued user id
    /// * `role` - Role from the profile record (already fetched by the caller)
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Specify what capability the actor needs
    pub fn can(self, capability: AdminCapability) -> CapabilityBuilder {
        CapabilityBuilder {
            user_id: self.user_id,
            role: self.role,
            capability,
        }
    }
}

/// Builder after specifying capability
pub struct CapabilityBuilder {
    user_id: Uuid,
    role: Role,
    capability: AdminCapability,
}

impl CapabilityBuilder {
    /// Perform the authorization check.
    ///
    /// The role comes from the profile record, which the gateway reads and
    /// never writes. The check is synchronous on purpose: by the time a
    /// handler gets here the profile has already been resolved, and a
    /// denial is expected control flow, not an exception.
    pub fn check(self) -> Result<(), AuthError> {
        if self.capability.requires_admin() && self.role != Role::Admin {
            tracing::debug!(user_id = %self.user_id, capability = ?self.capability, "admin capability denied");
            return Err(AuthError::AdminRequired);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_passes_check() {
        let result = Actor::new(Uuid::new_v4(), Role::Admin)
            .can(AdminCapability::ManageUsers)
            .check();

        assert!(result.is_ok());
    }

    #[test]
    fn employee_is_rejected() {
        for capability in [
            AdminCapability::ManageUsers,
            AdminCapability::ManageClients,
            AdminCapability::ManageProjects,
            AdminCapability::ReviewTimesheets,
            AdminCapability::ManageTimeOff,
        ] {
            let result = Actor::new(Uuid::new_v4(), Role::Employee)
                .can(capability)
                .check();

            assert!(matches!(result, Err(AuthError::AdminRequired)));
        }
    }
}
