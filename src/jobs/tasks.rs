/// Background task implementations
use crate::{context::AppContext, error::AdminResult, metrics};

/// Cleanup expired sessions
pub async fn cleanup_expired_sessions(ctx: &AppContext) -> AdminResult<u64> {
    ctx.account_manager.cleanup_expired_sessions().await
}

/// Move PENDING invitations past their expiry to EXPIRED
///
/// Verification still answers "expired" for swept rows.
pub async fn sweep_expired_invitations(ctx: &AppContext) -> AdminResult<u64> {
    let count = ctx.invitation_manager.sweep_expired().await?;
    metrics::record_invitations_swept(count);
    Ok(count)
}

/// Forget rate-limit state for keys that have fully replenished
pub async fn prune_rate_limits(ctx: &AppContext) -> AdminResult<usize> {
    ctx.rate_limiter.retain_recent();
    Ok(ctx.rate_limiter.tracked_keys())
}

/// Health check - verify all systems are operational
pub async fn health_check(ctx: &AppContext) -> AdminResult<()> {
    sqlx::query("SELECT 1").fetch_one(&ctx.db).await?;

    Ok(())
}
