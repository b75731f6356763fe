/// Session endpoints: access-code verification, password login and logout
use crate::{
    account::{ChangePasswordRequest, LoginRequest, SessionResponse},
    admin::{VerifyAccessCodeRequest, VerifyAccessCodeResponse},
    auth::{AuthContext, OptionalAuthContext},
    error::AdminResult,
    AppContext,
};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

/// Build auth routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/auth/verify-code", post(verify_access_code))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/change-password", post(change_password))
}

/// Redeem a one-time access code
async fn verify_access_code(
    State(ctx): State<AppContext>,
    Json(req): Json<VerifyAccessCodeRequest>,
) -> AdminResult<Json<VerifyAccessCodeResponse>> {
    ctx.rate_limiter.check_verify(&req.email)?;

    Ok(Json(ctx.console.verify_access_code(req).await?))
}

async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> AdminResult<Json<SessionResponse>> {
    ctx.rate_limiter.check_verify(&req.email)?;

    Ok(Json(ctx.console.login(req).await?))
}

async fn logout(State(ctx): State<AppContext>, auth: AuthContext) -> AdminResult<StatusCode> {
    ctx.console.logout(Some(&auth.session)).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn change_password(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
    Json(req): Json<ChangePasswordRequest>,
) -> AdminResult<StatusCode> {
    ctx.console
        .change_password(auth.session.as_ref(), req)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
