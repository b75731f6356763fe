/// Application context and dependency injection
use crate::{
    account::{AccountManager, Argon2Hasher, PasswordHasher},
    admin::{AdminAccessManager, AdminConsole, AuditLogWriter, InvitationManager},
    config::ServerConfig,
    db,
    error::{AdminError, AdminResult},
    rate_limit::RateLimiter,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    // Admin access control
    pub admin_access_manager: Arc<AdminAccessManager>,
    pub invitation_manager: Arc<InvitationManager>,
    pub audit_log: Arc<AuditLogWriter>,
    pub console: Arc<AdminConsole>,
    // Rate limiter
    pub rate_limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> AdminResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        let db = db::create_pool(
            &config.storage.database,
            db::DatabaseOptions {
                max_connections: config.storage.max_connections,
                ..db::DatabaseOptions::default()
            },
        )
        .await?;

        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::from_config(&config.password)?);

        Ok(Self::with_pool(config, db, hasher))
    }

    /// Wire every service onto an existing pool
    pub fn with_pool(config: ServerConfig, db: SqlitePool, hasher: Arc<dyn PasswordHasher>) -> Self {
        let config = Arc::new(config);

        let account_manager = AccountManager::new(db.clone(), config.clone(), hasher);
        let admin_access_manager = AdminAccessManager::new(db.clone());
        let invitation_manager = InvitationManager::new(db.clone(), config.invitations.ttl_days);
        let audit_log = AuditLogWriter::new(db.clone());

        let console = AdminConsole::new(
            db.clone(),
            admin_access_manager.clone(),
            invitation_manager.clone(),
            account_manager.clone(),
            audit_log.clone(),
        );

        let rate_limiter = RateLimiter::new(&config.rate_limit);

        Self {
            config,
            db,
            account_manager: Arc::new(account_manager),
            admin_access_manager: Arc::new(admin_access_manager),
            invitation_manager: Arc::new(invitation_manager),
            audit_log: Arc::new(audit_log),
            console: Arc::new(console),
            rate_limiter: Arc::new(rate_limiter),
            started_at: Instant::now(),
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> AdminResult<()> {
        let dir = &config.storage.data_directory;

        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                AdminError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.storage.data_directory = dir.path().join("data");
        config.storage.database = config.storage.data_directory.join("admin.sqlite");
        config.authentication.jwt_secret = "a-test-secret-that-is-long-enough-for-hs256".to_string();
        config.password.memory_kib = 8;
        config.password.iterations = 1;

        let ctx = AppContext::new(config).await.unwrap();

        assert!(dir.path().join("data").join("admin.sqlite").exists());
        assert!(!ctx.admin_access_manager.has_active_super_admin().await.unwrap());
        assert_eq!(ctx.service_url(), "http://localhost:3100");
    }
}
