//! Role-to-permission mapping.

use std::fmt;

use road_core::enums::Role;

use crate::error::AuthError;

/// Coarse capabilities checked by the HTTP handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Read any record.
    View,
    /// GPS points, photos, incidents, construction progress, progress
    /// reports, and uploads.
    RecordFieldData,
    /// Projects, sections, contractors, milestones, funding, CSV import.
    ManageProjects,
    /// Users, provinces, settings, navigation, activity log, realtime status.
    Administer,
}

impl Permission {
    /// Least privileged role holding this permission.
    #[must_use]
    pub const fn min_role(self) -> Role {
        match self {
            Self::View => Role::Viewer,
            Self::RecordFieldData => Role::Engineer,
            Self::ManageProjects => Role::Manager,
            Self::Administer => Role::Admin,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::RecordFieldData => "record_field_data",
            Self::ManageProjects => "manage_projects",
            Self::Administer => "administer",
        }
    }

    #[must_use]
    pub const fn granted_to(self, role: Role) -> bool {
        role.at_least(self.min_role())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Errors
///
/// `Forbidden` when `role` does not hold `permission`.
pub fn authorize(role: Role, permission: Permission) -> Result<(), AuthError> {
    if permission.granted_to(role) {
        Ok(())
    } else {
        tracing::debug!(%role, %permission, "permission denied");
        Err(AuthError::Forbidden { role, permission })
    }
}
