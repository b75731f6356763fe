/// Authentication extractors and utilities
use crate::{
    account::ValidatedSession, api::middleware::extract_bearer_token, context::AppContext,
    error::AdminError,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated context - extracts and validates session from request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session: ValidatedSession,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = AdminError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or_else(|| {
            AdminError::AuthenticationRequired("Missing authorization header".to_string())
        })?;

        let session = resolve_session(state, &token).await?;

        Ok(AuthContext { session })
    }
}

/// Optional authenticated context - does not fail if no auth provided
///
/// Admin handlers take this and let the access gate decide, so a missing
/// and an invalid token are rejected the same way.
#[derive(Debug, Clone)]
pub struct OptionalAuthContext {
    pub session: Option<ValidatedSession>,
}

#[async_trait]
impl FromRequestParts<AppContext> for OptionalAuthContext {
    type Rejection = AdminError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let session = match extract_bearer_token(&parts.headers) {
            Some(token) => match resolve_session(state, &token).await {
                Ok(session) => Some(session),
                Err(e) if e.is_dependency_failure() => return Err(e),
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring invalid bearer token");
                    None
                }
            },
            None => None,
        };

        Ok(OptionalAuthContext { session })
    }
}

/// Signature and expiry first, then the stored session
async fn resolve_session(state: &AppContext, token: &str) -> Result<ValidatedSession, AdminError> {
    verify_jwt_token(token, &state.config.authentication.jwt_secret)?;
    state.account_manager.validate_access_token(token).await
}

/// Verify a JWT token with full validation
///
/// This performs:
/// 1. JWT signature verification
/// 2. Expiration checking
/// 3. Claims validation
pub fn verify_jwt_token(
    token: &str,
    jwt_secret: &str,
) -> Result<jsonwebtoken::TokenData<serde_json::Value>, AdminError> {
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<serde_json::Value>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!("JWT verification failed: {}", e);
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AdminError::AuthenticationRequired("Token has expired".to_string())
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                AdminError::AuthenticationRequired("Invalid token signature".to_string())
            }
            _ => AdminError::AuthenticationRequired(format!("Invalid token: {}", e)),
        }
    })
}
