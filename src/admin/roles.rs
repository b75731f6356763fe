/// Admin roles, statuses and the AdminAccess store
use crate::{
    account::UserSummary,
    admin::permissions::{self, Permissions, RoleDefaults},
    error::{AdminError, AdminResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, types::Json, Row, SqliteConnection, SqlitePool};

/// Admin role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    /// Full access, issues and revokes invitations
    SuperAdmin,
    ContentAdmin,
    FinanceAdmin,
    CommunityAdmin,
    /// Permissions are chosen on the invitation
    ModuleManager,
    Viewer,
}

impl AdminRole {
    pub const ALL: [AdminRole; 6] = [
        AdminRole::SuperAdmin,
        AdminRole::ContentAdmin,
        AdminRole::FinanceAdmin,
        AdminRole::CommunityAdmin,
        AdminRole::ModuleManager,
        AdminRole::Viewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "SUPER_ADMIN",
            AdminRole::ContentAdmin => "CONTENT_ADMIN",
            AdminRole::FinanceAdmin => "FINANCE_ADMIN",
            AdminRole::CommunityAdmin => "COMMUNITY_ADMIN",
            AdminRole::ModuleManager => "MODULE_MANAGER",
            AdminRole::Viewer => "VIEWER",
        }
    }

    pub fn from_str(s: &str) -> AdminResult<Self> {
        let upper = s.trim().to_uppercase();
        AdminRole::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == upper)
            .ok_or_else(|| AdminError::Validation(format!("Invalid admin role: {}", s)))
    }

    /// Grid a newly provisioned admin of this role starts with
    pub fn default_permissions(&self) -> RoleDefaults {
        match self {
            AdminRole::SuperAdmin => RoleDefaults::Grid(permissions::super_admin_grid()),
            AdminRole::ContentAdmin => RoleDefaults::Grid(permissions::content_admin_grid()),
            AdminRole::FinanceAdmin => RoleDefaults::Grid(permissions::finance_admin_grid()),
            AdminRole::CommunityAdmin => RoleDefaults::Grid(permissions::community_admin_grid()),
            AdminRole::ModuleManager => RoleDefaults::AssignedPerInvitation,
            AdminRole::Viewer => RoleDefaults::Grid(permissions::viewer_grid()),
        }
    }

    /// Explicit permissions win, then the role grid, then nothing
    pub fn resolve_permissions(&self, explicit: Option<Permissions>) -> Permissions {
        match (explicit, self.default_permissions()) {
            (Some(explicit), _) => explicit,
            (None, RoleDefaults::Grid(grid)) => grid,
            (None, RoleDefaults::AssignedPerInvitation) => Permissions::new(),
        }
    }
}

/// Admin account status; only ACTIVE passes the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminStatus {
    Active,
    Inactive,
    Suspended,
}

impl AdminStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminStatus::Active => "ACTIVE",
            AdminStatus::Inactive => "INACTIVE",
            AdminStatus::Suspended => "SUSPENDED",
        }
    }

    pub fn from_str(s: &str) -> AdminResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => Ok(AdminStatus::Active),
            "INACTIVE" => Ok(AdminStatus::Inactive),
            "SUSPENDED" => Ok(AdminStatus::Suspended),
            _ => Err(AdminError::Validation(format!("Invalid admin status: {}", s))),
        }
    }
}

/// Admin access record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccess {
    pub id: String,
    pub user_id: String,
    pub admin_role: AdminRole,
    pub permissions: Permissions,
    pub status: AdminStatus,
    #[serde(skip_serializing)]
    pub invite_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminAccess {
    pub fn is_active(&self) -> bool {
        self.status == AdminStatus::Active
    }
}

/// Admin access joined with its user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminWithUser {
    #[serde(flatten)]
    pub access: AdminAccess,
    pub user: Option<UserSummary>,
}

const ACCESS_COLUMNS: &str =
    "id, user_id, admin_role, permissions, status, invite_code, created_at, updated_at";

pub(crate) fn access_from_row(row: &SqliteRow) -> AdminResult<AdminAccess> {
    let role: String = row.try_get("admin_role")?;
    let status: String = row.try_get("status")?;
    let Json(permissions): Json<Permissions> = row.try_get("permissions")?;

    Ok(AdminAccess {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        admin_role: AdminRole::from_str(&role)?,
        permissions,
        status: AdminStatus::from_str(&status)?,
        invite_code: row.try_get("invite_code")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) async fn fetch_by_user_id(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> AdminResult<Option<AdminAccess>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM admin_access WHERE user_id = ?1",
        ACCESS_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(access_from_row).transpose()
}

/// Insert an ACTIVE AdminAccess unless the user already has one, then return
/// whichever record is stored
pub(crate) async fn insert_if_absent(
    conn: &mut SqliteConnection,
    user_id: &str,
    role: AdminRole,
    permissions: &Permissions,
    invite_code: Option<&str>,
) -> AdminResult<(AdminAccess, bool)> {
    let now = Utc::now();
    let id = uuid::Uuid::new_v4().to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO admin_access (id, user_id, admin_role, permissions, status, invite_code, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(role.as_str())
    .bind(Json(permissions.clone()))
    .bind(AdminStatus::Active.as_str())
    .bind(invite_code)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let created = result.rows_affected() == 1;
    let access = fetch_by_user_id(conn, user_id).await?.ok_or_else(|| {
        AdminError::Internal(format!("Admin access for {} vanished after insert", user_id))
    })?;

    Ok((access, created))
}

/// Admin access manager
#[derive(Clone)]
pub struct AdminAccessManager {
    db: SqlitePool,
}

impl AdminAccessManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Get admin access by id
    pub async fn get(&self, id: &str) -> AdminResult<Option<AdminAccess>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM admin_access WHERE id = ?1",
            ACCESS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(access_from_row).transpose()
    }

    /// Get admin access owned by a user
    pub async fn get_by_user_id(&self, user_id: &str) -> AdminResult<Option<AdminAccess>> {
        let mut conn = self.db.acquire().await?;
        fetch_by_user_id(&mut conn, user_id).await
    }

    /// Admin access held by the user with this email, if any
    pub async fn get_by_email(&self, email: &str) -> AdminResult<Option<AdminAccess>> {
        let row = sqlx::query(
            r#"
            SELECT a.id, a.user_id, a.admin_role, a.permissions, a.status, a.invite_code,
                   a.created_at, a.updated_at
            FROM admin_access a
            JOIN users u ON u.id = a.user_id
            WHERE u.email = ?1
            "#,
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(access_from_row).transpose()
    }

    /// Whether any ACTIVE super admin exists
    pub async fn has_active_super_admin(&self) -> AdminResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM admin_access WHERE admin_role = ?1 AND status = ?2",
        )
        .bind(AdminRole::SuperAdmin.as_str())
        .bind(AdminStatus::Active.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(count > 0)
    }

    /// List all admins with their users, newest first
    pub async fn list_with_users(&self) -> AdminResult<Vec<AdminWithUser>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.user_id, a.admin_role, a.permissions, a.status, a.invite_code,
                   a.created_at, a.updated_at,
                   u.id AS u_id, u.name AS u_name, u.email AS u_email
            FROM admin_access a
            LEFT JOIN users u ON u.id = a.user_id
            ORDER BY a.created_at DESC, a.rowid DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut admins = Vec::with_capacity(rows.len());
        for row in rows {
            let access = access_from_row(&row)?;
            let user = match row.try_get::<Option<String>, _>("u_id")? {
                Some(id) => Some(UserSummary {
                    id,
                    name: row.try_get("u_name")?,
                    email: row.try_get("u_email")?,
                }),
                None => None,
            };
            admins.push(AdminWithUser { access, user });
        }

        Ok(admins)
    }

    /// Set status, returning the record as it was before
    pub async fn update_status(
        &self,
        id: &str,
        status: AdminStatus,
    ) -> AdminResult<(AdminAccess, AdminAccess)> {
        let before = self
            .get(id)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("Admin {} not found", id)))?;

        sqlx::query("UPDATE admin_access SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await?;

        let after = self
            .get(id)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("Admin {} not found", id)))?;

        Ok((before, after))
    }

    /// Make an existing record an ACTIVE SUPER_ADMIN with the full grid
    pub async fn restore_super_admin(&self, id: &str) -> AdminResult<(AdminAccess, AdminAccess)> {
        let before = self
            .get(id)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("Admin {} not found", id)))?;

        sqlx::query(
            "UPDATE admin_access SET admin_role = ?1, permissions = ?2, status = ?3, updated_at = ?4 WHERE id = ?5",
        )
        .bind(AdminRole::SuperAdmin.as_str())
        .bind(Json(AdminRole::SuperAdmin.resolve_permissions(None)))
        .bind(AdminStatus::Active.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await?;

        let after = self
            .get(id)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("Admin {} not found", id)))?;

        Ok((before, after))
    }

    /// Replace the permission grid, returning the record as it was before
    pub async fn update_permissions(
        &self,
        id: &str,
        permissions: &Permissions,
    ) -> AdminResult<(AdminAccess, AdminAccess)> {
        let before = self
            .get(id)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("Admin {} not found", id)))?;

        sqlx::query("UPDATE admin_access SET permissions = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(Json(permissions.clone()))
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await?;

        let after = self
            .get(id)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("Admin {} not found", id)))?;

        Ok((before, after))
    }
}
