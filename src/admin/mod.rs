/// Admin access control
///
/// Role and permission model, one-time access-code invitations, provisioning
/// of new administrators, the access gate and the append-only audit ledger.

pub mod access_code;
pub mod audit;
pub mod bootstrap;
pub mod console;
pub mod gate;
pub mod invites;
pub mod permissions;
pub mod provisioning;
pub mod roles;

pub use audit::{AuditAction, AuditLogEntry, AuditLogPage, AuditLogWriter, NewAuditEntry};
pub use console::{
    AdminConsole, CreateInvitationRequest, CurrentAdmin, UpdateAdminPermissionsRequest,
    UpdateAdminStatusRequest, VerifyAccessCodeRequest, VerifyAccessCodeResponse,
};
pub use gate::{AccessGate, Requirement};
pub use invites::{AdminInvitation, InvitationManager, InvitationStatus, NewInvitation};
pub use permissions::{has_permission, Level, Module, Permissions, RoleDefaults};
pub use provisioning::ProvisionedAdmin;
pub use roles::{AdminAccess, AdminAccessManager, AdminRole, AdminStatus, AdminWithUser};
