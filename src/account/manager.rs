/// Account manager implementation using runtime queries
use crate::{
    account::{AccountRole, PasswordHasher, Session, User, ValidatedSession},
    admin::access_code::as_access_code,
    config::ServerConfig,
    error::{AdminError, AdminResult},
};
use chrono::{DateTime, Duration, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, name, password_hash, email_verified, role, created_at, updated_at";

fn user_from_row(row: &SqliteRow) -> AdminResult<User> {
    let role: String = row.try_get("role")?;

    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
        email_verified: row.try_get("email_verified")?,
        role: AccountRole::from_str(&role)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Find a user by (already lower-cased) email on an open connection
pub(crate) async fn fetch_user_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> AdminResult<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS))
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Insert a verified ADMIN user on an open connection
pub(crate) async fn insert_admin_user(
    conn: &mut SqliteConnection,
    email: &str,
    name: &str,
    password_hash: &str,
) -> AdminResult<User> {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        name: Some(name.to_string()),
        password_hash: Some(password_hash.to_string()),
        email_verified: true,
        role: AccountRole::Admin,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, password_hash, email_verified, role, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.password_hash)
    .bind(user.email_verified)
    .bind(user.role.as_str())
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(user)
}

/// Overwrite an existing user's password and promote the account to ADMIN
pub(crate) async fn set_admin_credentials(
    conn: &mut SqliteConnection,
    user: &mut User,
    password_hash: &str,
) -> AdminResult<()> {
    let now = Utc::now();

    sqlx::query("UPDATE users SET password_hash = ?1, role = ?2, updated_at = ?3 WHERE id = ?4")
        .bind(password_hash)
        .bind(AccountRole::Admin.as_str())
        .bind(now)
        .bind(&user.id)
        .execute(&mut *conn)
        .await?;

    user.password_hash = Some(password_hash.to_string());
    user.role = AccountRole::Admin;
    user.updated_at = now;

    Ok(())
}

/// Account manager service
#[derive(Clone)]
pub struct AccountManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { db, config, hasher }
    }

    pub fn hasher(&self) -> &Arc<dyn PasswordHasher> {
        &self.hasher
    }

    /// Get user by id
    pub async fn get_user(&self, id: &str) -> AdminResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Get user by email (case-insensitive)
    pub async fn get_user_by_email(&self, email: &str) -> AdminResult<Option<User>> {
        let mut conn = self.db.acquire().await?;
        fetch_user_by_email(&mut conn, &email.trim().to_lowercase()).await
    }

    /// Authenticate with email and password and create a session
    pub async fn login(&self, email: &str, password: &str) -> AdminResult<(User, Session)> {
        let user = self
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AdminError::AuthenticationRequired("Invalid credentials".to_string()))?;

        let valid = self.verify_password(&user, password).await?;

        if !valid {
            return Err(AdminError::AuthenticationRequired(
                "Invalid credentials".to_string(),
            ));
        }

        let session = self.create_session(&user.id).await?;

        Ok((user, session))
    }

    /// Create a session for a user
    pub async fn create_session(&self, user_id: &str) -> AdminResult<Session> {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.authentication.session_ttl_hours);

        let access_token = self.generate_access_token(user_id, &session_id, now, expires_at)?;

        sqlx::query(
            "INSERT INTO sessions (id, user_id, access_token, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&session_id)
        .bind(user_id)
        .bind(&access_token)
        .bind(now)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(Session {
            id: session_id,
            user_id: user_id.to_string(),
            access_token,
            created_at: now,
            expires_at,
        })
    }

    /// Validate access token and return session info
    pub async fn validate_access_token(&self, token: &str) -> AdminResult<ValidatedSession> {
        let row = sqlx::query("SELECT id, user_id, expires_at FROM sessions WHERE access_token = ?1")
            .bind(token)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| {
                AdminError::AuthenticationRequired("Invalid or expired session".to_string())
            })?;

        let session_id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at")?;

        if Utc::now() > expires_at {
            return Err(AdminError::AuthenticationRequired(
                "Session expired".to_string(),
            ));
        }

        Ok(ValidatedSession {
            user_id,
            session_id,
        })
    }

    /// Delete a session (logout)
    pub async fn delete_session(&self, session_id: &str) -> AdminResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(session_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Remove expired sessions, returning how many were deleted
    pub async fn cleanup_expired_sessions(&self) -> AdminResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?1")
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        let sessions_deleted = result.rows_affected();

        if sessions_deleted > 0 {
            tracing::info!(sessions_deleted, "Cleaned up expired sessions");
        } else {
            tracing::debug!("Session cleanup: no expired sessions found");
        }

        Ok(sessions_deleted)
    }

    /// Replace the password after checking the current one
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> AdminResult<()> {
        let user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AdminError::NotFound("User not found".to_string()))?;

        let matches = self.verify_password(&user, current_password).await?;

        if !matches {
            return Err(AdminError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = self.hasher.hash(new_password).await?;

        sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(&new_hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.db)
            .await?;

        tracing::info!(user_id, "Password changed");

        Ok(())
    }

    /// Check `password` against the stored hash
    ///
    /// Access codes are stored in canonical form, so an input shaped like a
    /// code is retried upper-cased when the literal input does not match.
    async fn verify_password(&self, user: &User, password: &str) -> AdminResult<bool> {
        let Some(digest) = &user.password_hash else {
            return Ok(false);
        };

        if self.hasher.verify(password, digest).await? {
            return Ok(true);
        }

        match as_access_code(password) {
            Some(code) if code != password => self.hasher.verify(&code, digest).await,
            _ => Ok(false),
        }
    }

    /// Generate access JWT token
    fn generate_access_token(
        &self,
        user_id: &str,
        session_id: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AdminResult<String> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Serialize, Deserialize)]
        struct Claims {
            sub: String,
            sid: String,
            iat: i64,
            exp: i64,
        }

        let claims = Claims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.authentication.jwt_secret.as_bytes()),
        )
        .map_err(|e| AdminError::Internal(format!("Failed to generate token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Argon2Hasher;
    use crate::db;

    async fn create_test_manager() -> AccountManager {
        let pool = db::in_memory_pool().await.unwrap();
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new(8, 1).unwrap());

        AccountManager::new(pool, Arc::new(ServerConfig::default()), hasher)
    }

    async fn seed_user(manager: &AccountManager, email: &str, password: &str) -> User {
        let digest = manager.hasher.hash(password).await.unwrap();
        let mut conn = manager.db.acquire().await.unwrap();
        insert_admin_user(&mut conn, email, "Test", &digest).await.unwrap()
    }

    #[tokio::test]
    async fn test_login_and_validate_session() {
        let manager = create_test_manager().await;
        let user = seed_user(&manager, "admin@example.com", "correct horse").await;

        let (logged_in, session) = manager
            .login("Admin@Example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);

        let validated = manager
            .validate_access_token(&session.access_token)
            .await
            .unwrap();
        assert_eq!(validated.user_id, user.id);
        assert_eq!(validated.session_id, session.id);

        manager.delete_session(&session.id).await.unwrap();
        assert!(manager
            .validate_access_token(&session.access_token)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let manager = create_test_manager().await;
        seed_user(&manager, "admin@example.com", "correct horse").await;

        assert!(matches!(
            manager.login("admin@example.com", "wrong").await,
            Err(AdminError::AuthenticationRequired(_))
        ));
        assert!(matches!(
            manager.login("nobody@example.com", "correct horse").await,
            Err(AdminError::AuthenticationRequired(_))
        ));
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let manager = create_test_manager().await;
        let user = seed_user(&manager, "admin@example.com", "pw").await;
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO sessions (id, user_id, access_token, created_at, expires_at)
             VALUES ('expired-session-1', ?1, 'expired-token-1', ?2, ?3)",
        )
        .bind(&user.id)
        .bind(now - Duration::hours(2))
        .bind(now - Duration::hours(1))
        .execute(&manager.db)
        .await
        .unwrap();

        let live = manager.create_session(&user.id).await.unwrap();

        assert!(matches!(
            manager.validate_access_token("expired-token-1").await,
            Err(AdminError::AuthenticationRequired(_))
        ));

        let deleted = manager.cleanup_expired_sessions().await.unwrap();
        assert_eq!(deleted, 1, "Should delete 1 expired session");

        assert!(manager.validate_access_token(&live.access_token).await.is_ok());
        assert_eq!(manager.cleanup_expired_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_change_password() {
        let manager = create_test_manager().await;
        let user = seed_user(&manager, "admin@example.com", "ADMIN-AB3X9KPQ").await;

        let err = manager
            .change_password(&user.id, "not-it", "brand new password")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Current password is incorrect"));

        manager
            .change_password(&user.id, "ADMIN-AB3X9KPQ", "brand new password")
            .await
            .unwrap();

        assert!(manager
            .login("admin@example.com", "brand new password")
            .await
            .is_ok());
        assert!(manager
            .login("admin@example.com", "ADMIN-AB3X9KPQ")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_access_code_matches_in_any_case() {
        let manager = create_test_manager().await;
        let user = seed_user(&manager, "admin@example.com", "ADMIN-AB3X9KPQ").await;

        assert!(manager
            .login("admin@example.com", "admin-ab3x9kpq")
            .await
            .is_ok());

        manager
            .change_password(&user.id, " admin-ab3x9kpq ", "brand new password")
            .await
            .unwrap();
        assert!(manager
            .login("admin@example.com", "BRAND NEW PASSWORD")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_set_admin_credentials_overwrites_password() {
        let manager = create_test_manager().await;
        let mut user = seed_user(&manager, "admin@example.com", "old").await;
        let digest = manager.hasher.hash("new").await.unwrap();

        {
            let mut conn = manager.db.acquire().await.unwrap();
            set_admin_credentials(&mut conn, &mut user, &digest)
                .await
                .unwrap();
        }

        let stored = manager.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.role, AccountRole::Admin);
        assert_eq!(stored.password_hash.as_deref(), Some(digest.as_str()));
    }
}
