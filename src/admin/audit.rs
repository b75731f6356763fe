/// Append-only audit ledger of privileged actions
use crate::{
    account::UserSummary,
    admin::permissions::Module,
    error::{AdminError, AdminResult},
    metrics,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, Row, SqlitePool};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Error,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Login => "LOGIN",
            AuditAction::Error => "ERROR",
        }
    }

    pub fn from_str(s: &str) -> AdminResult<Self> {
        match s {
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "DELETE" => Ok(AuditAction::Delete),
            "LOGIN" => Ok(AuditAction::Login),
            "ERROR" => Ok(AuditAction::Error),
            _ => Err(AdminError::Validation(format!("Invalid audit action: {}", s))),
        }
    }
}

/// Entry to append
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub admin_id: String,
    pub action: AuditAction,
    pub module: Module,
    pub resource_type: String,
    pub resource_id: String,
    pub description: String,
    /// `{ "before": ..., "after": ... }` for updates
    pub changes: Option<Value>,
}

impl NewAuditEntry {
    pub fn new(
        admin_id: impl Into<String>,
        action: AuditAction,
        module: Module,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            admin_id: admin_id.into(),
            action,
            module,
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            description: description.into(),
            changes: None,
        }
    }

    pub fn with_changes(mut self, before: Value, after: Value) -> Self {
        self.changes = Some(serde_json::json!({ "before": before, "after": after }));
        self
    }
}

/// Stored audit entry with the acting admin's user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub admin_id: String,
    pub action: AuditAction,
    pub module: Module,
    pub resource_type: String,
    pub resource_id: String,
    pub description: String,
    pub changes: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub admin_user: Option<UserSummary>,
}

/// One page of the ledger, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogPage {
    pub logs: Vec<AuditLogEntry>,
    pub total: i64,
    pub pages: i64,
    pub current_page: u32,
}

/// Audit log writer
#[derive(Clone)]
pub struct AuditLogWriter {
    db: SqlitePool,
}

impl AuditLogWriter {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Append an entry, propagating failures
    pub async fn append(&self, entry: &NewAuditEntry) -> AdminResult<String> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO admin_audit_log
                (id, admin_id, action, module, resource_type, resource_id, description, changes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&id)
        .bind(&entry.admin_id)
        .bind(entry.action.as_str())
        .bind(entry.module.as_str())
        .bind(&entry.resource_type)
        .bind(&entry.resource_id)
        .bind(&entry.description)
        .bind(entry.changes.as_ref().map(Json))
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        Ok(id)
    }

    /// Append an entry after the primary mutation has committed
    ///
    /// A failed write is logged and counted but never fails the caller.
    pub async fn record(&self, entry: NewAuditEntry) {
        match self.append(&entry).await {
            Ok(id) => {
                tracing::debug!(
                    audit_id = %id,
                    admin_id = %entry.admin_id,
                    action = entry.action.as_str(),
                    resource_type = %entry.resource_type,
                    resource_id = %entry.resource_id,
                    "Audit entry recorded"
                );
            }
            Err(e) => {
                metrics::record_audit_failure(entry.action.as_str());
                tracing::error!(
                    error = %e,
                    admin_id = %entry.admin_id,
                    action = entry.action.as_str(),
                    resource_type = %entry.resource_type,
                    resource_id = %entry.resource_id,
                    "Failed to write audit entry"
                );
            }
        }
    }

    /// Page through the ledger, newest first
    ///
    /// `page` is 1-based; `limit` is clamped to `1..=MAX_PAGE_SIZE`.
    pub async fn list(&self, page: Option<u32>, limit: Option<u32>) -> AdminResult<AuditLogPage> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = i64::from(page - 1) * i64::from(limit);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_audit_log")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT l.id, l.admin_id, l.action, l.module, l.resource_type, l.resource_id,
                   l.description, l.changes, l.created_at,
                   u.id AS u_id, u.name AS u_name, u.email AS u_email
            FROM admin_audit_log l
            LEFT JOIN admin_access a ON a.id = l.admin_id
            LEFT JOIN users u ON u.id = a.user_id
            ORDER BY l.created_at DESC, l.rowid DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let mut logs = Vec::with_capacity(rows.len());
        for row in rows {
            let action: String = row.try_get("action")?;
            let module: String = row.try_get("module")?;
            let changes: Option<Json<Value>> = row.try_get("changes")?;
            let admin_user = match row.try_get::<Option<String>, _>("u_id")? {
                Some(id) => Some(UserSummary {
                    id,
                    name: row.try_get("u_name")?,
                    email: row.try_get("u_email")?,
                }),
                None => None,
            };

            logs.push(AuditLogEntry {
                id: row.try_get("id")?,
                admin_id: row.try_get("admin_id")?,
                action: AuditAction::from_str(&action)?,
                module: Module::from_str(&module)?,
                resource_type: row.try_get("resource_type")?,
                resource_id: row.try_get("resource_id")?,
                description: row.try_get("description")?,
                changes: changes.map(|Json(v)| v),
                created_at: row.try_get("created_at")?,
                admin_user,
            });
        }

        let pages = (total + i64::from(limit) - 1) / i64::from(limit);

        Ok(AuditLogPage {
            logs,
            total,
            pages,
            current_page: page,
        })
    }
}
