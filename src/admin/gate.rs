/// Access gate every privileged operation passes through first
use crate::{
    account::ValidatedSession,
    admin::{
        permissions::{has_permission, Level, Module},
        roles::{AdminAccess, AdminAccessManager, AdminRole},
    },
    error::{AdminError, AdminResult},
    metrics,
};

/// What the caller must hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any ACTIVE admin
    Any,
    Permission(Module, Level),
    Role(AdminRole),
}

/// Access gate
#[derive(Clone)]
pub struct AccessGate {
    admins: AdminAccessManager,
}

impl AccessGate {
    pub fn new(admins: AdminAccessManager) -> Self {
        Self { admins }
    }

    /// Resolve the caller's AdminAccess and check it against `requirement`
    pub async fn check_access(
        &self,
        session: Option<&ValidatedSession>,
        requirement: Requirement,
    ) -> AdminResult<AdminAccess> {
        let Some(session) = session else {
            metrics::record_gate_decision(false);
            return Err(AdminError::AuthenticationRequired(
                "No session".to_string(),
            ));
        };

        let access = match self.admins.get_by_user_id(&session.user_id).await? {
            Some(access) => access,
            None => return Err(deny(&session.user_id, "no admin access")),
        };

        if !access.is_active() {
            return Err(deny(&session.user_id, "admin access is not active"));
        }

        let allowed = match requirement {
            Requirement::Any => true,
            Requirement::Permission(module, level) => {
                has_permission(&access.permissions, module, level)
            }
            Requirement::Role(role) => access.admin_role == role,
        };

        if !allowed {
            return Err(deny(&session.user_id, "requirement not met"));
        }

        metrics::record_gate_decision(true);
        Ok(access)
    }
}

fn deny(user_id: &str, reason: &str) -> AdminError {
    metrics::record_gate_decision(false);
    tracing::warn!(user_id, reason, "Admin access denied");
    AdminError::AuthorizationDenied(reason.to_string())
}
