/// Turning a claimed invitation into a persisted administrator
use crate::{
    account::{
        manager::{fetch_user_by_email, insert_admin_user, set_admin_credentials},
        User,
    },
    admin::{
        invites::AdminInvitation,
        roles::{insert_if_absent, AdminAccess},
    },
    error::AdminResult,
};
use serde::Serialize;
use sqlx::SqliteConnection;

/// Outcome of provisioning
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedAdmin {
    pub user: User,
    pub admin_access: AdminAccess,
    /// The access code is the password until the admin sets one
    pub needs_password_setup: bool,
    /// False when an existing AdminAccess was reused
    #[serde(skip)]
    pub created: bool,
}

/// Find or create the user and their AdminAccess on an open transaction
///
/// `password_hash` is the hash of the access code. An existing user has
/// their password overwritten with it and is promoted to ADMIN. An existing
/// AdminAccess is reused unchanged.
pub(crate) async fn provision(
    conn: &mut SqliteConnection,
    invitation: &AdminInvitation,
    password_hash: &str,
) -> AdminResult<ProvisionedAdmin> {
    let user = match fetch_user_by_email(conn, &invitation.email).await? {
        Some(mut user) => {
            set_admin_credentials(conn, &mut user, password_hash).await?;
            user
        }
        None => {
            let name = invitation
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| local_part(&invitation.email).to_string());
            insert_admin_user(conn, &invitation.email, &name, password_hash).await?
        }
    };

    let (admin_access, created) = insert_if_absent(
        conn,
        &user.id,
        invitation.admin_role,
        &invitation.permissions,
        Some(&invitation.code),
    )
    .await?;

    Ok(ProvisionedAdmin {
        user,
        admin_access,
        needs_password_setup: true,
        created,
    })
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
