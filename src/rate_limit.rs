/// Rate Limiting System
use crate::{
    config::RateLimitSettings,
    context::AppContext,
    error::{AdminError, AdminResult},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultDirectRateLimiter, DefaultKeyedRateLimiter, Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    /// Access-code attempts, keyed by normalized email
    verify: Arc<DefaultKeyedRateLimiter<String>>,
    /// Everything else
    api: Arc<DefaultDirectRateLimiter>,
    clock: DefaultClock,
}

impl RateLimiter {
    pub fn new(config: &RateLimitSettings) -> Self {
        let verify_quota =
            Quota::per_minute(NonZeroU32::new(config.verify_per_minute).unwrap_or(NonZeroU32::MIN));
        let api_quota =
            Quota::per_second(NonZeroU32::new(config.api_per_second).unwrap_or(NonZeroU32::MIN));

        Self {
            enabled: config.enabled,
            verify: Arc::new(GovernorLimiter::keyed(verify_quota)),
            api: Arc::new(GovernorLimiter::direct(api_quota)),
            clock: DefaultClock::default(),
        }
    }

    /// Check the per-email budget for access-code verification
    pub fn check_verify(&self, email: &str) -> AdminResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let key = email.trim().to_lowercase();
        self.verify.check_key(&key).map_err(|not_until| {
            tracing::warn!(email = %key, "Access-code verification rate limited");
            AdminError::RateLimitExceeded {
                retry_after: not_until.wait_time_from(self.clock.now()),
            }
        })
    }

    /// Check the global API budget
    pub fn check_api(&self) -> AdminResult<()> {
        if !self.enabled {
            return Ok(());
        }

        self.api
            .check()
            .map_err(|not_until| AdminError::RateLimitExceeded {
                retry_after: not_until.wait_time_from(self.clock.now()),
            })
    }

    /// Drop keyed state that has fully replenished
    pub fn retain_recent(&self) {
        self.verify.retain_recent();
    }

    pub fn tracked_keys(&self) -> usize {
        self.verify.len()
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, AdminError> {
    if let Err(e) = ctx.rate_limiter.check_api() {
        tracing::debug!(path = %request.uri().path(), "API rate limit exceeded");
        return Err(e);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(verify_per_minute: u32, api_per_second: u32) -> RateLimitSettings {
        RateLimitSettings {
            enabled: true,
            verify_per_minute,
            api_per_second,
        }
    }

    #[test]
    fn test_verify_limit_is_per_email() {
        let limiter = RateLimiter::new(&settings(3, 100));

        for _ in 0..3 {
            assert!(limiter.check_verify("target@example.com").is_ok());
        }

        // Case and whitespace do not buy extra attempts
        let err = limiter.check_verify(" TARGET@example.com ").unwrap_err();
        match err {
            AdminError::RateLimitExceeded { retry_after } => {
                assert!(retry_after > Duration::ZERO)
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(limiter.check_verify("someone-else@example.com").is_ok());
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_api_burst_limit() {
        let limiter = RateLimiter::new(&settings(5, 5));

        for _ in 0..5 {
            assert!(limiter.check_api().is_ok());
        }
        assert!(limiter.check_api().is_err());
    }

    #[test]
    fn test_disabled_limiter_allows_everything() {
        let mut config = settings(1, 1);
        config.enabled = false;
        let limiter = RateLimiter::new(&config);

        for _ in 0..10 {
            assert!(limiter.check_verify("a@example.com").is_ok());
            assert!(limiter.check_api().is_ok());
        }
    }
}
