/// Admin console operations
///
/// Each operation runs the access gate first, then the managers, then writes
/// its audit entry once the primary mutation has committed.
use crate::{
    account::{
        AccountManager, ChangePasswordRequest, LoginRequest, SessionResponse, User, UserSummary,
        ValidatedSession,
    },
    admin::{
        access_code::normalize_code,
        audit::{AuditAction, AuditLogPage, AuditLogWriter, NewAuditEntry},
        gate::{AccessGate, Requirement},
        invites::{self, AdminInvitation, InvitationManager, InvitationStatus, NewInvitation},
        permissions::{Module, Permissions},
        provisioning::{provision, ProvisionedAdmin},
        roles::{AdminAccess, AdminAccessManager, AdminRole, AdminStatus, AdminWithUser},
    },
    error::{AdminError, AdminResult},
    metrics,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

/// Create invitation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 100))]
    pub name: Option<String>,
    pub admin_role: AdminRole,
    /// Overrides the role's default grid
    pub permissions: Option<Permissions>,
}

/// Access code verification request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyAccessCodeRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 64))]
    pub code: String,
}

/// Result of a successful verification
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAccessCodeResponse {
    pub user: User,
    pub admin_access: AdminAccess,
    pub needs_password_setup: bool,
    pub access_jwt: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAdminStatusRequest {
    pub status: AdminStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAdminPermissionsRequest {
    pub permissions: Permissions,
}

/// The caller's own admin record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAdmin {
    #[serde(flatten)]
    pub access: AdminAccess,
    pub user: UserSummary,
}

fn validate<T: Validate>(req: &T) -> AdminResult<()> {
    req.validate()
        .map_err(|e| AdminError::Validation(e.to_string()))
}

/// Admin console
#[derive(Clone)]
pub struct AdminConsole {
    db: SqlitePool,
    gate: AccessGate,
    admins: AdminAccessManager,
    invitations: InvitationManager,
    accounts: AccountManager,
    audit: AuditLogWriter,
}

impl AdminConsole {
    pub fn new(
        db: SqlitePool,
        admins: AdminAccessManager,
        invitations: InvitationManager,
        accounts: AccountManager,
        audit: AuditLogWriter,
    ) -> Self {
        Self {
            db,
            gate: AccessGate::new(admins.clone()),
            admins,
            invitations,
            accounts,
            audit,
        }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Issue an invitation (SUPER_ADMIN only)
    pub async fn create_invitation(
        &self,
        session: Option<&ValidatedSession>,
        req: CreateInvitationRequest,
    ) -> AdminResult<AdminInvitation> {
        let actor = self
            .gate
            .check_access(session, Requirement::Role(AdminRole::SuperAdmin))
            .await?;
        validate(&req)?;

        let email = req.email.trim().to_lowercase();

        if self.admins.get_by_email(&email).await?.is_some() {
            return Err(AdminError::Conflict(format!("{} is already an admin", email)));
        }

        let invitation = self
            .invitations
            .create(NewInvitation {
                email,
                name: req.name.filter(|n| !n.trim().is_empty()),
                admin_role: req.admin_role,
                permissions: req.admin_role.resolve_permissions(req.permissions),
                created_by: Some(actor.id.clone()),
            })
            .await?;

        metrics::record_invitation_created(invitation.admin_role.as_str());
        tracing::info!(
            invitation_id = %invitation.id,
            email = %invitation.email,
            role = invitation.admin_role.as_str(),
            created_by = %actor.id,
            "Admin invitation created"
        );

        self.audit
            .record(NewAuditEntry::new(
                &actor.id,
                AuditAction::Create,
                Module::AdminManagement,
                "AdminInvitation",
                &invitation.id,
                format!(
                    "Created {} invitation for {}",
                    invitation.admin_role.as_str(),
                    invitation.email
                ),
            ))
            .await;

        Ok(invitation)
    }

    /// Redeem an access code: provision the admin and open a session
    pub async fn verify_access_code(
        &self,
        req: VerifyAccessCodeRequest,
    ) -> AdminResult<VerifyAccessCodeResponse> {
        validate(&req)?;

        let result = self.verify_and_provision(&req).await;
        metrics::record_verification(match &result {
            Ok(_) => "success",
            Err(AdminError::InvalidAccessCode) => "invalid",
            Err(AdminError::Expired) => "expired",
            Err(_) => "error",
        });
        let provisioned = result?;

        self.audit
            .record(NewAuditEntry::new(
                &provisioned.admin_access.id,
                AuditAction::Login,
                Module::AdminManagement,
                "AdminAccess",
                &provisioned.admin_access.id,
                format!("{} signed in with an access code", provisioned.user.email),
            ))
            .await;

        let session = self.accounts.create_session(&provisioned.user.id).await?;

        Ok(VerifyAccessCodeResponse {
            user: provisioned.user,
            admin_access: provisioned.admin_access,
            needs_password_setup: provisioned.needs_password_setup,
            access_jwt: session.access_token,
            expires_at: session.expires_at,
        })
    }

    async fn verify_and_provision(
        &self,
        req: &VerifyAccessCodeRequest,
    ) -> AdminResult<ProvisionedAdmin> {
        let code = normalize_code(&req.code);

        let invitation = self
            .invitations
            .find_for_verify(&req.email, &code)
            .await?
            .ok_or(AdminError::InvalidAccessCode)?;

        let now = Utc::now();
        if invitation.status == InvitationStatus::Expired || invitation.is_past_expiry(now) {
            self.invitations.mark_expired(&invitation.id).await?;
            tracing::info!(invitation_id = %invitation.id, "Access code presented after expiry");
            return Err(AdminError::Expired);
        }

        // Hashing stays outside the transaction
        let password_hash = self.accounts.hasher().hash(&code).await?;

        let mut tx = self.db.begin().await?;

        if !invites::claim(&mut *tx, &invitation.id, now).await? {
            return Err(AdminError::InvalidAccessCode);
        }

        let provisioned = provision(&mut *tx, &invitation, &password_hash).await?;
        invites::set_used_by(&mut *tx, &invitation.id, &provisioned.user.id).await?;

        tx.commit().await?;

        tracing::info!(
            invitation_id = %invitation.id,
            user_id = %provisioned.user.id,
            admin_id = %provisioned.admin_access.id,
            role = provisioned.admin_access.admin_role.as_str(),
            new_admin = provisioned.created,
            "Access code verified"
        );

        Ok(provisioned)
    }

    /// Revoke an invitation (SUPER_ADMIN only)
    pub async fn revoke_invitation(
        &self,
        session: Option<&ValidatedSession>,
        id: &str,
    ) -> AdminResult<AdminInvitation> {
        let actor = self
            .gate
            .check_access(session, Requirement::Role(AdminRole::SuperAdmin))
            .await?;

        let invitation = self.invitations.revoke(id).await?;

        tracing::info!(invitation_id = %id, revoked_by = %actor.id, "Admin invitation revoked");

        self.audit
            .record(NewAuditEntry::new(
                &actor.id,
                AuditAction::Delete,
                Module::AdminManagement,
                "AdminInvitation",
                id,
                format!("Revoked invitation for {}", invitation.email),
            ))
            .await;

        Ok(invitation)
    }

    /// All PENDING invitations, newest first
    ///
    /// Any ACTIVE admin may list them; only a SUPER_ADMIN sees the codes.
    pub async fn list_pending_invitations(
        &self,
        session: Option<&ValidatedSession>,
    ) -> AdminResult<Vec<AdminInvitation>> {
        let actor = self.gate.check_access(session, Requirement::Any).await?;
        let mut pending = self.invitations.list_pending().await?;

        if actor.admin_role != AdminRole::SuperAdmin {
            pending.iter_mut().for_each(AdminInvitation::redact_code);
        }

        Ok(pending)
    }

    /// Set an admin's status (SUPER_ADMIN only)
    pub async fn update_admin_status(
        &self,
        session: Option<&ValidatedSession>,
        admin_id: &str,
        req: UpdateAdminStatusRequest,
    ) -> AdminResult<AdminAccess> {
        let actor = self
            .gate
            .check_access(session, Requirement::Role(AdminRole::SuperAdmin))
            .await?;

        let (before, after) = self.admins.update_status(admin_id, req.status).await?;

        tracing::info!(
            admin_id,
            from = before.status.as_str(),
            to = after.status.as_str(),
            updated_by = %actor.id,
            "Admin status updated"
        );

        self.audit
            .record(
                NewAuditEntry::new(
                    &actor.id,
                    AuditAction::Update,
                    Module::AdminManagement,
                    "AdminAccess",
                    admin_id,
                    format!("Changed admin status to {}", after.status.as_str()),
                )
                .with_changes(
                    json!({ "status": before.status }),
                    json!({ "status": after.status }),
                ),
            )
            .await;

        Ok(after)
    }

    /// Replace an admin's permission grid (SUPER_ADMIN only)
    pub async fn update_admin_permissions(
        &self,
        session: Option<&ValidatedSession>,
        admin_id: &str,
        req: UpdateAdminPermissionsRequest,
    ) -> AdminResult<AdminAccess> {
        let actor = self
            .gate
            .check_access(session, Requirement::Role(AdminRole::SuperAdmin))
            .await?;

        let (before, after) = self
            .admins
            .update_permissions(admin_id, &req.permissions)
            .await?;

        tracing::info!(admin_id, updated_by = %actor.id, "Admin permissions updated");

        self.audit
            .record(
                NewAuditEntry::new(
                    &actor.id,
                    AuditAction::Update,
                    Module::AdminManagement,
                    "AdminAccess",
                    admin_id,
                    "Updated admin permissions",
                )
                .with_changes(
                    json!(before.permissions),
                    json!(after.permissions),
                ),
            )
            .await;

        Ok(after)
    }

    /// Change the caller's own password
    ///
    /// Right after verification the access code is the current password.
    pub async fn change_password(
        &self,
        session: Option<&ValidatedSession>,
        req: ChangePasswordRequest,
    ) -> AdminResult<()> {
        let actor = self.gate.check_access(session, Requirement::Any).await?;
        validate(&req)?;

        self.accounts
            .change_password(&actor.user_id, &req.current_password, &req.new_password)
            .await?;

        self.audit
            .record(NewAuditEntry::new(
                &actor.id,
                AuditAction::Update,
                Module::AdminManagement,
                "User",
                &actor.user_id,
                "Changed own password",
            ))
            .await;

        Ok(())
    }

    /// All admins with their users, newest first
    pub async fn list_admins(
        &self,
        session: Option<&ValidatedSession>,
    ) -> AdminResult<Vec<AdminWithUser>> {
        self.gate.check_access(session, Requirement::Any).await?;
        self.admins.list_with_users().await
    }

    /// The caller's AdminAccess and user
    pub async fn current_admin(
        &self,
        session: Option<&ValidatedSession>,
    ) -> AdminResult<CurrentAdmin> {
        let access = self.gate.check_access(session, Requirement::Any).await?;
        let user = self
            .accounts
            .get_user(&access.user_id)
            .await?
            .ok_or_else(|| AdminError::NotFound("User not found".to_string()))?;

        Ok(CurrentAdmin {
            access,
            user: UserSummary::from(&user),
        })
    }

    /// Page through the audit ledger
    pub async fn list_audit_logs(
        &self,
        session: Option<&ValidatedSession>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> AdminResult<AuditLogPage> {
        self.gate.check_access(session, Requirement::Any).await?;
        self.audit.list(page, limit).await
    }

    /// Password login
    pub async fn login(&self, req: LoginRequest) -> AdminResult<SessionResponse> {
        validate(&req)?;

        let (user, session) = self.accounts.login(&req.email, &req.password).await?;

        Ok(SessionResponse {
            user: UserSummary::from(&user),
            access_jwt: session.access_token,
            expires_at: session.expires_at,
        })
    }

    /// End the caller's session
    pub async fn logout(&self, session: Option<&ValidatedSession>) -> AdminResult<()> {
        let session = session.ok_or_else(|| {
            AdminError::AuthenticationRequired("No session".to_string())
        })?;

        self.accounts.delete_session(&session.session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Argon2Hasher, PasswordHasher};
    use crate::admin::permissions::Level;
    use crate::admin::roles::insert_if_absent;
    use crate::config::ServerConfig;
    use crate::db;
    use chrono::Duration;
    use std::sync::Arc;

    struct Harness {
        pool: SqlitePool,
        console: AdminConsole,
        root: ValidatedSession,
        root_access: AdminAccess,
    }

    async fn harness() -> Harness {
        let pool = db::in_memory_pool().await.unwrap();
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new(8, 1).unwrap());
        let accounts = AccountManager::new(pool.clone(), Arc::new(ServerConfig::default()), hasher);
        let console = AdminConsole::new(
            pool.clone(),
            AdminAccessManager::new(pool.clone()),
            InvitationManager::new(pool.clone(), 7),
            accounts,
            AuditLogWriter::new(pool.clone()),
        );

        sqlx::query(
            "INSERT INTO users (id, email, name, created_at, updated_at)
             VALUES ('root-user', 'root@example.com', 'Root', ?1, ?1)",
        )
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();
        let root_access = {
            let mut conn = pool.acquire().await.unwrap();
            let grid = AdminRole::SuperAdmin.resolve_permissions(None);
            insert_if_absent(&mut conn, "root-user", AdminRole::SuperAdmin, &grid, None)
                .await
                .unwrap()
                .0
        };

        Harness {
            pool,
            console,
            root: ValidatedSession {
                user_id: "root-user".to_string(),
                session_id: "root-session".to_string(),
            },
            root_access,
        }
    }

    fn invite_request(email: &str, role: AdminRole) -> CreateInvitationRequest {
        CreateInvitationRequest {
            email: email.to_string(),
            name: None,
            admin_role: role,
            permissions: None,
        }
    }

    async fn audit_count(pool: &SqlitePool, action: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM admin_audit_log WHERE action = ?1")
            .bind(action)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_invite_verify_and_gate() {
        let h = harness().await;

        let invitation = h
            .console
            .create_invitation(
                Some(&h.root),
                invite_request("New@X.com", AdminRole::ContentAdmin),
            )
            .await
            .unwrap();
        assert_eq!(invitation.email, "new@x.com");
        assert_eq!(invitation.created_by.as_deref(), Some(h.root_access.id.as_str()));
        assert_eq!(audit_count(&h.pool, "CREATE").await, 1);

        let verified = h
            .console
            .verify_access_code(VerifyAccessCodeRequest {
                email: "NEW@x.com".to_string(),
                code: format!(" {} ", invitation.code.to_lowercase()),
            })
            .await
            .unwrap();
        assert!(verified.needs_password_setup);
        assert_eq!(verified.admin_access.admin_role, AdminRole::ContentAdmin);
        assert_eq!(audit_count(&h.pool, "LOGIN").await, 1);

        let new_session = ValidatedSession {
            user_id: verified.user.id.clone(),
            session_id: "s".to_string(),
        };
        let access = h
            .console
            .gate()
            .check_access(
                Some(&new_session),
                Requirement::Permission(Module::Projects, Level::Delete),
            )
            .await
            .unwrap();
        assert_eq!(access.id, verified.admin_access.id);

        let denied = h
            .console
            .gate()
            .check_access(
                Some(&new_session),
                Requirement::Permission(Module::AdminManagement, Level::Read),
            )
            .await;
        assert!(matches!(denied, Err(AdminError::AuthorizationDenied(_))));

        // Code is single-use
        let again = h
            .console
            .verify_access_code(VerifyAccessCodeRequest {
                email: "new@x.com".to_string(),
                code: invitation.code.clone(),
            })
            .await;
        assert!(matches!(again, Err(AdminError::InvalidAccessCode)));
        assert_eq!(audit_count(&h.pool, "LOGIN").await, 1);
    }

    #[tokio::test]
    async fn test_only_super_admin_can_invite() {
        let h = harness().await;
        let invitation = h
            .console
            .create_invitation(Some(&h.root), invite_request("viewer@x.com", AdminRole::Viewer))
            .await
            .unwrap();
        let verified = h
            .console
            .verify_access_code(VerifyAccessCodeRequest {
                email: "viewer@x.com".to_string(),
                code: invitation.code,
            })
            .await
            .unwrap();

        let viewer = ValidatedSession {
            user_id: verified.user.id,
            session_id: "s".to_string(),
        };
        let result = h
            .console
            .create_invitation(Some(&viewer), invite_request("other@x.com", AdminRole::Viewer))
            .await;
        assert!(matches!(result, Err(AdminError::AuthorizationDenied(_))));

        let anonymous = h
            .console
            .create_invitation(None, invite_request("other@x.com", AdminRole::Viewer))
            .await;
        assert!(matches!(anonymous, Err(AdminError::AuthenticationRequired(_))));

        assert_eq!(h.console.list_pending_invitations(Some(&viewer)).await.unwrap().len(), 0);

        let pending = h
            .console
            .create_invitation(Some(&h.root), invite_request("next@x.com", AdminRole::Viewer))
            .await
            .unwrap();

        let seen_by_viewer = h.console.list_pending_invitations(Some(&viewer)).await.unwrap();
        assert_eq!(seen_by_viewer.len(), 1);
        assert_eq!(seen_by_viewer[0].id, pending.id);
        assert!(seen_by_viewer[0].code.is_empty());
        assert!(serde_json::to_value(&seen_by_viewer[0])
            .unwrap()
            .get("code")
            .is_none());

        let seen_by_root = h.console.list_pending_invitations(Some(&h.root)).await.unwrap();
        assert_eq!(seen_by_root[0].code, pending.code);
    }

    #[tokio::test]
    async fn test_invite_rejects_existing_admin_and_bad_email() {
        let h = harness().await;

        let existing = h
            .console
            .create_invitation(Some(&h.root), invite_request("ROOT@example.com", AdminRole::Viewer))
            .await;
        assert!(matches!(existing, Err(AdminError::Conflict(_))));

        let malformed = h
            .console
            .create_invitation(Some(&h.root), invite_request("not-an-email", AdminRole::Viewer))
            .await;
        assert!(matches!(malformed, Err(AdminError::Validation(_))));
    }

    #[tokio::test]
    async fn test_expired_code_is_reported_and_marked() {
        let h = harness().await;
        let invitation = h
            .console
            .create_invitation(Some(&h.root), invite_request("late@x.com", AdminRole::Viewer))
            .await
            .unwrap();

        sqlx::query("UPDATE admin_invitations SET expires_at = ?1 WHERE id = ?2")
            .bind(Utc::now() - Duration::minutes(1))
            .bind(&invitation.id)
            .execute(&h.pool)
            .await
            .unwrap();

        let request = VerifyAccessCodeRequest {
            email: "late@x.com".to_string(),
            code: invitation.code.clone(),
        };
        assert!(matches!(
            h.console.verify_access_code(request.clone()).await,
            Err(AdminError::Expired)
        ));

        let status: String = sqlx::query_scalar("SELECT status FROM admin_invitations WHERE id = ?1")
            .bind(&invitation.id)
            .fetch_one(&h.pool)
            .await
            .unwrap();
        assert_eq!(status, "EXPIRED");

        // Still "expired" on a second attempt, and nothing was provisioned
        assert!(matches!(
            h.console.verify_access_code(request).await,
            Err(AdminError::Expired)
        ));
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'late@x.com'")
            .fetch_one(&h.pool)
            .await
            .unwrap();
        assert_eq!(users, 0);
    }

    #[tokio::test]
    async fn test_wrong_code_and_revoked_code_are_invalid() {
        let h = harness().await;
        let invitation = h
            .console
            .create_invitation(Some(&h.root), invite_request("someone@x.com", AdminRole::Viewer))
            .await
            .unwrap();

        let wrong = h
            .console
            .verify_access_code(VerifyAccessCodeRequest {
                email: "someone@x.com".to_string(),
                code: "ADMIN-ZZZZZZZZ".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(AdminError::InvalidAccessCode)));

        h.console
            .revoke_invitation(Some(&h.root), &invitation.id)
            .await
            .unwrap();
        assert_eq!(audit_count(&h.pool, "DELETE").await, 1);

        let revoked = h
            .console
            .verify_access_code(VerifyAccessCodeRequest {
                email: "someone@x.com".to_string(),
                code: invitation.code,
            })
            .await;
        assert!(matches!(revoked, Err(AdminError::InvalidAccessCode)));

        assert!(matches!(
            h.console.revoke_invitation(Some(&h.root), "missing").await,
            Err(AdminError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_status_and_permission_updates_are_audited() {
        let h = harness().await;
        let invitation = h
            .console
            .create_invitation(Some(&h.root), invite_request("fin@x.com", AdminRole::FinanceAdmin))
            .await
            .unwrap();
        let verified = h
            .console
            .verify_access_code(VerifyAccessCodeRequest {
                email: "fin@x.com".to_string(),
                code: invitation.code,
            })
            .await
            .unwrap();
        let target = verified.admin_access.id.clone();

        let suspended = h
            .console
            .update_admin_status(
                Some(&h.root),
                &target,
                UpdateAdminStatusRequest {
                    status: AdminStatus::Suspended,
                },
            )
            .await
            .unwrap();
        assert_eq!(suspended.status, AdminStatus::Suspended);

        let narrowed = Permissions::new().with(Module::Credits, &[Level::Read]);
        h.console
            .update_admin_permissions(
                Some(&h.root),
                &target,
                UpdateAdminPermissionsRequest {
                    permissions: narrowed.clone(),
                },
            )
            .await
            .unwrap();

        let page = h.console.list_audit_logs(Some(&h.root), None, None).await.unwrap();
        let updates: Vec<_> = page
            .logs
            .iter()
            .filter(|l| l.action == AuditAction::Update)
            .collect();
        assert_eq!(updates.len(), 2);

        let permission_change = updates[0].changes.as_ref().unwrap();
        assert_eq!(permission_change["after"], json!({"credits": ["read"]}));
        assert!(permission_change["before"]["credits"]
            .as_array()
            .unwrap()
            .contains(&json!("full")));

        let status_change = updates[1].changes.as_ref().unwrap();
        assert_eq!(status_change["before"]["status"], "ACTIVE");
        assert_eq!(status_change["after"]["status"], "SUSPENDED");

        // Suspended admins no longer pass the gate
        let suspended_session = ValidatedSession {
            user_id: verified.user.id,
            session_id: "s".to_string(),
        };
        assert!(matches!(
            h.console.current_admin(Some(&suspended_session)).await,
            Err(AdminError::AuthorizationDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_access_code_works_as_password_until_changed() {
        let h = harness().await;
        let invitation = h
            .console
            .create_invitation(Some(&h.root), invite_request("pw@x.com", AdminRole::Viewer))
            .await
            .unwrap();
        let verified = h
            .console
            .verify_access_code(VerifyAccessCodeRequest {
                email: "pw@x.com".to_string(),
                code: invitation.code.clone(),
            })
            .await
            .unwrap();
        let session = ValidatedSession {
            user_id: verified.user.id.clone(),
            session_id: "s".to_string(),
        };

        let wrong = h
            .console
            .change_password(
                Some(&session),
                ChangePasswordRequest {
                    current_password: "nope".to_string(),
                    new_password: "a much better password".to_string(),
                },
            )
            .await;
        assert!(matches!(wrong, Err(AdminError::Validation(ref m)) if m.contains("incorrect")));

        h.console
            .change_password(
                Some(&session),
                ChangePasswordRequest {
                    current_password: invitation.code,
                    new_password: "a much better password".to_string(),
                },
            )
            .await
            .unwrap();

        let login = h
            .console
            .login(LoginRequest {
                email: "pw@x.com".to_string(),
                password: "a much better password".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(login.user.id, verified.user.id);

        let me = h.console.current_admin(Some(&session)).await.unwrap();
        assert_eq!(me.user.email, "pw@x.com");
        assert_eq!(h.console.list_admins(Some(&session)).await.unwrap().len(), 2);
    }
}
