/// Configuration management for the admin gate
use crate::error::{AdminError, AdminResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Development-only signing secret, rejected outside of tests by `validate`
const DEV_JWT_SECRET: &str = "insecure-development-secret-change-me-now";

/// Longest an invitation may stay redeemable
pub const MAX_INVITATION_TTL_DAYS: i64 = 365;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub invitations: InvitationConfig,
    pub password: PasswordConfig,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    pub max_connections: u32,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    /// Email that receives a SUPER_ADMIN invitation when no super admin exists
    pub bootstrap_email: Option<String>,
}

/// Invitation lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    pub ttl_days: i64,
    pub sweep_enabled: bool,
    pub sweep_interval_secs: u64,
}

/// Argon2id work factor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Access-code verification attempts per email per minute
    pub verify_per_minute: u32,
    pub api_per_second: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let data_directory = PathBuf::from("./data");
        Self {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 3100,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            storage: StorageConfig {
                database: data_directory.join("admin.sqlite"),
                data_directory,
                max_connections: 10,
            },
            authentication: AuthConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                session_ttl_hours: 12,
                bootstrap_email: None,
            },
            invitations: InvitationConfig {
                ttl_days: 7,
                sweep_enabled: true,
                sweep_interval_secs: 900,
            },
            // ~50ms per hash on commodity hardware
            password: PasswordConfig {
                memory_kib: 19456,
                iterations: 2,
            },
            rate_limit: RateLimitSettings {
                enabled: true,
                verify_per_minute: 5,
                api_per_second: 100,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AdminResult<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let hostname = env::var("ADMIN_HOSTNAME").unwrap_or(defaults.service.hostname);
        let port = match env::var("ADMIN_PORT") {
            Ok(port) => port
                .parse()
                .map_err(|_| AdminError::Validation("Invalid port number".to_string()))?,
            Err(_) => defaults.service.port,
        };
        let version = env::var("ADMIN_VERSION").unwrap_or(defaults.service.version);

        let data_directory: PathBuf = env::var("ADMIN_DATA_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.data_directory);
        let database = env::var("ADMIN_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("admin.sqlite"));
        let max_connections = parse_or("ADMIN_DB_MAX_CONNECTIONS", defaults.storage.max_connections);

        let jwt_secret = env::var("ADMIN_JWT_SECRET")
            .map_err(|_| AdminError::Validation("JWT secret required".to_string()))?;
        let session_ttl_hours = parse_or(
            "ADMIN_SESSION_TTL_HOURS",
            defaults.authentication.session_ttl_hours,
        );
        let bootstrap_email = env::var("ADMIN_BOOTSTRAP_EMAIL")
            .ok()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let ttl_days = parse_or("ADMIN_INVITATION_TTL_DAYS", defaults.invitations.ttl_days);
        let sweep_enabled = parse_or(
            "ADMIN_INVITATION_SWEEP_ENABLED",
            defaults.invitations.sweep_enabled,
        );
        let sweep_interval_secs = parse_or(
            "ADMIN_INVITATION_SWEEP_INTERVAL_SECS",
            defaults.invitations.sweep_interval_secs,
        );

        let memory_kib = parse_or("ADMIN_PASSWORD_MEMORY_KIB", defaults.password.memory_kib);
        let iterations = parse_or("ADMIN_PASSWORD_ITERATIONS", defaults.password.iterations);

        let rate_limit_enabled = parse_or("ADMIN_RATE_LIMITS_ENABLED", defaults.rate_limit.enabled);
        let verify_per_minute = parse_or(
            "ADMIN_RATE_LIMIT_VERIFY_PER_MINUTE",
            defaults.rate_limit.verify_per_minute,
        );
        let api_per_second = parse_or(
            "ADMIN_RATE_LIMIT_API_PER_SECOND",
            defaults.rate_limit.api_per_second,
        );

        let log_level = env::var("RUST_LOG").unwrap_or(defaults.logging.level);
        let log_json = env::var("ADMIN_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(defaults.logging.json);

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig {
                data_directory,
                database,
                max_connections,
            },
            authentication: AuthConfig {
                jwt_secret,
                session_ttl_hours,
                bootstrap_email,
            },
            invitations: InvitationConfig {
                ttl_days,
                sweep_enabled,
                sweep_interval_secs,
            },
            password: PasswordConfig {
                memory_kib,
                iterations,
            },
            rate_limit: RateLimitSettings {
                enabled: rate_limit_enabled,
                verify_per_minute,
                api_per_second,
            },
            logging: LoggingConfig {
                level: log_level,
                json: log_json,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AdminResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AdminError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(AdminError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.jwt_secret == DEV_JWT_SECRET {
            tracing::warn!("Using the built-in development JWT secret; set ADMIN_JWT_SECRET");
        }

        if self.authentication.session_ttl_hours <= 0 {
            return Err(AdminError::Validation(
                "Session TTL must be positive".to_string(),
            ));
        }

        if !(1..=MAX_INVITATION_TTL_DAYS).contains(&self.invitations.ttl_days) {
            return Err(AdminError::Validation(format!(
                "Invitation TTL must be between 1 and {} days",
                MAX_INVITATION_TTL_DAYS
            )));
        }

        // argon2 rejects anything below 8 KiB
        if self.password.memory_kib < 8 || self.password.iterations == 0 {
            return Err(AdminError::Validation(
                "Password hashing parameters are too weak".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
