//! Role-based access to platform operations
//!
//! The role mapping is fixed; see [`Operation::allowed_roles`].

use crate::error::{PlatformError, Result};
use idp_types::{Actor, Role};
use std::fmt;

const ADMINS: &[Role] = &[Role::PlatformAdmin, Role::TeamAdmin];
const EVERYONE: &[Role] = &[Role::PlatformAdmin, Role::TeamAdmin, Role::Developer];
const PLATFORM_ADMIN: &[Role] = &[Role::PlatformAdmin];

/// Operation an actor asks to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateTeam,
    DeleteTeam,
    RegisterService,
    UpdateService,
    AssignTeam,
    DeleteService,
    ProvisionEnvironment,
    TriggerDeployment,
    ManagePolicies,
    ReadAuditLog,
    /// Catalog, environment, deployment and job reads
    Read,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateTeam => "create_team",
            Operation::DeleteTeam => "delete_team",
            Operation::RegisterService => "register_service",
            Operation::UpdateService => "update_service",
            Operation::AssignTeam => "assign_team",
            Operation::DeleteService => "delete_service",
            Operation::ProvisionEnvironment => "provision_environment",
            Operation::TriggerDeployment => "trigger_deployment",
            Operation::ManagePolicies => "manage_policies",
            Operation::ReadAuditLog => "read_audit_log",
            Operation::Read => "read",
        }
    }

    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Operation::RegisterService | Operation::TriggerDeployment | Operation::Read => {
                EVERYONE
            }
            Operation::ManagePolicies => PLATFORM_ADMIN,
            Operation::CreateTeam
            | Operation::DeleteTeam
            | Operation::UpdateService
            | Operation::AssignTeam
            | Operation::DeleteService
            | Operation::ProvisionEnvironment
            | Operation::ReadAuditLog => ADMINS,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `actor` may perform `operation`
pub fn authorize(actor: &Actor, operation: Operation) -> Result<()> {
    if actor.has_role(operation.allowed_roles()) {
        Ok(())
    } else {
        Err(PlatformError::PermissionDenied(format!(
            "role {} may not {}",
            actor.role, operation
        )))
    }
}

/// Approvals a deployment trigger carries for `actor`
///
/// A platform admin approves their own deployments; nobody else supplies
/// approvals.
pub fn approvals_for(actor: &Actor) -> Vec<String> {
    if actor.role == Role::PlatformAdmin {
        vec![actor.identity.clone()]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor::new("alice", role)
    }

    #[test]
    fn test_everyone_may_register_and_deploy() {
        for role in [Role::PlatformAdmin, Role::TeamAdmin, Role::Developer] {
            assert!(authorize(&actor(role), Operation::RegisterService).is_ok());
            assert!(authorize(&actor(role), Operation::TriggerDeployment).is_ok());
            assert!(authorize(&actor(role), Operation::Read).is_ok());
        }
    }

    #[test]
    fn test_developer_cannot_administer() {
        let dev = actor(Role::Developer);
        for op in [
            Operation::CreateTeam,
            Operation::UpdateService,
            Operation::AssignTeam,
            Operation::ProvisionEnvironment,
            Operation::ReadAuditLog,
        ] {
            let err = authorize(&dev, op).unwrap_err();
            assert!(matches!(err, PlatformError::PermissionDenied(_)));
        }
    }

    #[test]
    fn test_policies_need_platform_admin() {
        assert!(authorize(&actor(Role::PlatformAdmin), Operation::ManagePolicies).is_ok());
        assert!(authorize(&actor(Role::TeamAdmin), Operation::ManagePolicies).is_err());
    }

    #[test]
    fn test_approvals() {
        assert_eq!(approvals_for(&actor(Role::PlatformAdmin)), vec!["alice"]);
        assert!(approvals_for(&actor(Role::TeamAdmin)).is_empty());
        assert!(approvals_for(&actor(Role::Developer)).is_empty());
    }
}
