/// Admin invitation lifecycle
///
/// An invitation is PENDING until it is claimed (USED), revoked (REVOKED) or
/// found past its expiry (EXPIRED). Terminal states never change again, except
/// that a revoke overwrites whatever status the row had.
use crate::{
    admin::{
        access_code::{generate_code, normalize_code},
        permissions::Permissions,
        roles::AdminRole,
    },
    config::MAX_INVITATION_TTL_DAYS,
    db::unique_violation,
    error::{AdminError, AdminResult},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, types::Json, Row, SqliteConnection, SqlitePool};

/// Fresh codes tried before giving up on a run of collisions
const CODE_ATTEMPTS: usize = 5;

/// Invitation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
    Used,
    Expired,
    Revoked,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "PENDING",
            InvitationStatus::Used => "USED",
            InvitationStatus::Expired => "EXPIRED",
            InvitationStatus::Revoked => "REVOKED",
        }
    }

    pub fn from_str(s: &str) -> AdminResult<Self> {
        match s {
            "PENDING" => Ok(InvitationStatus::Pending),
            "USED" => Ok(InvitationStatus::Used),
            "EXPIRED" => Ok(InvitationStatus::Expired),
            "REVOKED" => Ok(InvitationStatus::Revoked),
            _ => Err(AdminError::Validation(format!(
                "Invalid invitation status: {}",
                s
            ))),
        }
    }
}

/// Admin invitation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminInvitation {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    /// Empty when redacted for the caller
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    pub admin_role: AdminRole,
    pub permissions: Permissions,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub used_by: Option<String>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Computed when read; a PENDING row can be past its expiry until swept
    pub is_expired: bool,
}

impl AdminInvitation {
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Drop the live access code before showing the invitation to a non-issuer
    pub fn redact_code(&mut self) {
        self.code.clear();
    }
}

/// Parameters for a new invitation
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub email: String,
    pub name: Option<String>,
    pub admin_role: AdminRole,
    pub permissions: Permissions,
    /// AdminAccess id of the issuer; `None` for the bootstrap invitation
    pub created_by: Option<String>,
}

const INVITATION_COLUMNS: &str = "id, email, name, code, admin_role, permissions, status, \
     expires_at, created_by, used_by, used_at, created_at";

fn invitation_from_row(row: &SqliteRow) -> AdminResult<AdminInvitation> {
    let role: String = row.try_get("admin_role")?;
    let status: String = row.try_get("status")?;
    let Json(permissions): Json<Permissions> = row.try_get("permissions")?;
    let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
    let status = InvitationStatus::from_str(&status)?;

    Ok(AdminInvitation {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        code: row.try_get("code")?,
        admin_role: AdminRole::from_str(&role)?,
        permissions,
        is_expired: status == InvitationStatus::Expired || Utc::now() > expires_at,
        status,
        expires_at,
        created_by: row.try_get("created_by")?,
        used_by: row.try_get("used_by")?,
        used_at: row.try_get("used_at")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Conditionally move a PENDING invitation to USED
///
/// Returns false when another request already claimed it, or it left PENDING
/// in the meantime.
pub(crate) async fn claim(
    conn: &mut SqliteConnection,
    id: &str,
    now: DateTime<Utc>,
) -> AdminResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE admin_invitations
        SET status = ?1, used_at = ?2
        WHERE id = ?3 AND status = ?4
        "#,
    )
    .bind(InvitationStatus::Used.as_str())
    .bind(now)
    .bind(id)
    .bind(InvitationStatus::Pending.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Record which user a claimed invitation provisioned
pub(crate) async fn set_used_by(
    conn: &mut SqliteConnection,
    id: &str,
    user_id: &str,
) -> AdminResult<()> {
    sqlx::query("UPDATE admin_invitations SET used_by = ?1 WHERE id = ?2")
        .bind(user_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Invitation manager
#[derive(Clone)]
pub struct InvitationManager {
    db: SqlitePool,
    ttl: Duration,
}

impl InvitationManager {
    /// `ttl_days` is clamped to `1..=MAX_INVITATION_TTL_DAYS`
    pub fn new(db: SqlitePool, ttl_days: i64) -> Self {
        Self {
            db,
            ttl: Duration::days(ttl_days.clamp(1, MAX_INVITATION_TTL_DAYS)),
        }
    }

    /// Persist a new PENDING invitation with a fresh code
    pub async fn create(&self, new: NewInvitation) -> AdminResult<AdminInvitation> {
        let email = new.email.trim().to_lowercase();

        if self.find_pending_for_email(&email).await?.is_some() {
            return Err(AdminError::Conflict(format!(
                "A pending invitation already exists for {}",
                email
            )));
        }

        for attempt in 1..=CODE_ATTEMPTS {
            let now = Utc::now();
            let invitation = AdminInvitation {
                id: uuid::Uuid::new_v4().to_string(),
                email: email.clone(),
                name: new.name.clone(),
                code: generate_code(),
                admin_role: new.admin_role,
                permissions: new.permissions.clone(),
                status: InvitationStatus::Pending,
                expires_at: now + self.ttl,
                created_by: new.created_by.clone(),
                used_by: None,
                used_at: None,
                created_at: now,
                is_expired: false,
            };

            let inserted = sqlx::query(
                r#"
                INSERT INTO admin_invitations
                    (id, email, name, code, admin_role, permissions, status, expires_at, created_by, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&invitation.id)
            .bind(&invitation.email)
            .bind(&invitation.name)
            .bind(&invitation.code)
            .bind(invitation.admin_role.as_str())
            .bind(Json(&invitation.permissions))
            .bind(invitation.status.as_str())
            .bind(invitation.expires_at)
            .bind(&invitation.created_by)
            .bind(invitation.created_at)
            .execute(&self.db)
            .await;

            match inserted {
                Ok(_) => return Ok(invitation),
                Err(e) => match unique_violation(&e) {
                    Some(message) if message.contains("admin_invitations.email") => {
                        return Err(AdminError::Conflict(format!(
                            "A pending invitation already exists for {}",
                            email
                        )));
                    }
                    Some(message) if message.contains("admin_invitations.code") => {
                        tracing::warn!(attempt, "Access code collision, drawing a new code");
                    }
                    _ => return Err(e.into()),
                },
            }
        }

        Err(AdminError::Internal(format!(
            "Could not mint a unique access code after {} attempts",
            CODE_ATTEMPTS
        )))
    }

    /// Get invitation by id
    pub async fn get(&self, id: &str) -> AdminResult<Option<AdminInvitation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM admin_invitations WHERE id = ?1",
            INVITATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(invitation_from_row).transpose()
    }

    /// The PENDING invitation for an email, if any
    pub async fn find_pending_for_email(&self, email: &str) -> AdminResult<Option<AdminInvitation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM admin_invitations WHERE email = ?1 AND status = ?2",
            INVITATION_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .bind(InvitationStatus::Pending.as_str())
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(invitation_from_row).transpose()
    }

    /// Candidate for verification: a PENDING or EXPIRED invitation matching
    /// the normalized email and code
    ///
    /// EXPIRED rows are included so a swept invitation still answers
    /// "expired" rather than "invalid".
    pub async fn find_for_verify(
        &self,
        email: &str,
        code: &str,
    ) -> AdminResult<Option<AdminInvitation>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM admin_invitations
            WHERE email = ?1 AND code = ?2 AND status IN (?3, ?4)
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
            INVITATION_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .bind(normalize_code(code))
        .bind(InvitationStatus::Pending.as_str())
        .bind(InvitationStatus::Expired.as_str())
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(invitation_from_row).transpose()
    }

    /// Move a PENDING invitation to EXPIRED; no-op for any other status
    pub async fn mark_expired(&self, id: &str) -> AdminResult<bool> {
        let result = sqlx::query("UPDATE admin_invitations SET status = ?1 WHERE id = ?2 AND status = ?3")
            .bind(InvitationStatus::Expired.as_str())
            .bind(id)
            .bind(InvitationStatus::Pending.as_str())
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Set REVOKED regardless of the current status
    pub async fn revoke(&self, id: &str) -> AdminResult<AdminInvitation> {
        let result = sqlx::query("UPDATE admin_invitations SET status = ?1 WHERE id = ?2")
            .bind(InvitationStatus::Revoked.as_str())
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AdminError::NotFound(format!("Invitation {} not found", id)));
        }

        self.get(id)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("Invitation {} not found", id)))
    }

    /// All PENDING invitations, newest first
    ///
    /// Rows past their expiry are returned as-is with `is_expired` set.
    pub async fn list_pending(&self) -> AdminResult<Vec<AdminInvitation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM admin_invitations
            WHERE status = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
            INVITATION_COLUMNS
        ))
        .bind(InvitationStatus::Pending.as_str())
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(invitation_from_row).collect()
    }

    /// Move every PENDING invitation past its expiry to EXPIRED
    pub async fn sweep_expired(&self) -> AdminResult<u64> {
        let result = sqlx::query(
            "UPDATE admin_invitations SET status = ?1 WHERE status = ?2 AND expires_at < ?3",
        )
        .bind(InvitationStatus::Expired.as_str())
        .bind(InvitationStatus::Pending.as_str())
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }
}
