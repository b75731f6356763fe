/// First SUPER_ADMIN on an empty installation, and recovery when none is active
use crate::{
    admin::{
        audit::{AuditAction, AuditLogWriter, NewAuditEntry},
        invites::{AdminInvitation, InvitationManager, NewInvitation},
        permissions::Module,
        roles::{AdminAccess, AdminAccessManager, AdminRole},
    },
    error::AdminResult,
};
use serde_json::json;

/// What startup did about the bootstrap email
#[derive(Debug, Clone)]
pub enum BootstrapOutcome {
    /// An ACTIVE super admin exists
    NotNeeded,
    /// A bootstrap invitation is already waiting to be redeemed
    AlreadyPending(AdminInvitation),
    /// A new SUPER_ADMIN invitation was issued
    Issued(AdminInvitation),
    /// The email already held an AdminAccess; it was reactivated as SUPER_ADMIN
    Restored(AdminAccess),
}

/// Make sure an ACTIVE SUPER_ADMIN exists or can be created for `email`
///
/// An email without admin access gets a SUPER_ADMIN invitation with no
/// issuing actor and no audit entry. An email that already holds an
/// AdminAccess (suspended, inactive or demoted) cannot be provisioned through
/// an invitation, since provisioning reuses the existing record, so that
/// record is promoted and reactivated in place and the change is audited.
pub async fn ensure_super_admin(
    admins: &AdminAccessManager,
    invitations: &InvitationManager,
    audit: &AuditLogWriter,
    email: &str,
) -> AdminResult<BootstrapOutcome> {
    let email = email.trim().to_lowercase();

    if admins.has_active_super_admin().await? {
        tracing::debug!("Active super admin present, skipping bootstrap");
        return Ok(BootstrapOutcome::NotNeeded);
    }

    if let Some(existing) = admins.get_by_email(&email).await? {
        let (before, after) = admins.restore_super_admin(&existing.id).await?;

        tracing::warn!(
            email = %email,
            admin_id = %after.id,
            previous_role = before.admin_role.as_str(),
            previous_status = before.status.as_str(),
            "No active super admin; restored bootstrap admin as SUPER_ADMIN"
        );

        audit
            .record(
                NewAuditEntry::new(
                    &after.id,
                    AuditAction::Update,
                    Module::System,
                    "AdminAccess",
                    &after.id,
                    format!("Bootstrap restored {} as SUPER_ADMIN", email),
                )
                .with_changes(
                    json!({ "adminRole": before.admin_role, "status": before.status }),
                    json!({ "adminRole": after.admin_role, "status": after.status }),
                ),
            )
            .await;

        return Ok(BootstrapOutcome::Restored(after));
    }

    if let Some(pending) = invitations.find_pending_for_email(&email).await? {
        tracing::info!(
            invitation_id = %pending.id,
            email = %pending.email,
            expires_at = %pending.expires_at,
            "Bootstrap invitation already pending"
        );
        return Ok(BootstrapOutcome::AlreadyPending(pending));
    }

    let invitation = invitations
        .create(NewInvitation {
            email,
            name: None,
            admin_role: AdminRole::SuperAdmin,
            permissions: AdminRole::SuperAdmin.resolve_permissions(None),
            created_by: None,
        })
        .await?;

    tracing::warn!(
        email = %invitation.email,
        code = %invitation.code,
        expires_at = %invitation.expires_at,
        "No active super admin; issued bootstrap invitation"
    );

    Ok(BootstrapOutcome::Issued(invitation))
}
