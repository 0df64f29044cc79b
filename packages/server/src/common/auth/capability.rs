/// Capabilities in the HR portal
///
/// The portal is a two-role system (admin, employee); every capability
/// listed here is an admin operation. Employee self-service (own
/// timesheets, own time-off requests) never passes through this check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCapability {
    /// Create, archive and edit user accounts
    ManageUsers,

    /// Create and archive clients
    ManageClients,

    /// Create and archive projects
    ManageProjects,

    /// Review and approve submitted timesheets
    ReviewTimesheets,

    /// Approve or reject time-off requests
    ManageTimeOff,
}

impl AdminCapability {
    /// Check if this capability requires admin access
    pub fn requires_admin(&self) -> bool {
        // All capabilities in this system require admin access
        true
    }
}
