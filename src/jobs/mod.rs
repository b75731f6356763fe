use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, Duration};
use tracing::{error, info};

use crate::metrics;

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        // Spawn cleanup tasks
        tokio::spawn(Self::expired_session_cleanup_job(Arc::clone(&self)));
        if self.context.config.invitations.sweep_enabled {
            tokio::spawn(Self::invitation_sweep_job(Arc::clone(&self)));
        } else {
            info!("Invitation sweep disabled");
        }
        tokio::spawn(Self::rate_limit_prune_job(Arc::clone(&self)));

        // Spawn monitoring tasks
        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Cleanup expired sessions (runs every hour)
    async fn expired_session_cleanup_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(3600)); // Every hour

        loop {
            interval.tick().await;
            let start = Instant::now();

            match tasks::cleanup_expired_sessions(&scheduler.context).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                    metrics::record_background_job(
                        "session_cleanup",
                        "success",
                        start.elapsed().as_secs_f64(),
                    );
                }
                Err(e) => {
                    error!("Failed to cleanup expired sessions: {}", e);
                    metrics::record_background_job(
                        "session_cleanup",
                        "error",
                        start.elapsed().as_secs_f64(),
                    );
                }
            }
        }
    }

    /// Expire stale invitations on the configured interval
    async fn invitation_sweep_job(scheduler: Arc<Self>) {
        let period = scheduler.context.config.invitations.sweep_interval_secs.max(1);
        let mut interval = interval(Duration::from_secs(period));

        loop {
            interval.tick().await;
            let start = Instant::now();

            match tasks::sweep_expired_invitations(&scheduler.context).await {
                Ok(count) => {
                    if count > 0 {
                        info!(count, "Expired stale admin invitations");
                    }
                    metrics::record_background_job(
                        "invitation_sweep",
                        "success",
                        start.elapsed().as_secs_f64(),
                    );
                }
                Err(e) => {
                    error!("Failed to sweep expired invitations: {}", e);
                    metrics::record_background_job(
                        "invitation_sweep",
                        "error",
                        start.elapsed().as_secs_f64(),
                    );
                }
            }
        }
    }

    /// Drop idle rate-limit keys (runs every 10 minutes)
    async fn rate_limit_prune_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(600));

        loop {
            interval.tick().await;
            let start = Instant::now();

            match tasks::prune_rate_limits(&scheduler.context).await {
                Ok(remaining) => {
                    tracing::debug!(remaining, "Pruned rate limiter state");
                    metrics::record_background_job(
                        "rate_limit_prune",
                        "success",
                        start.elapsed().as_secs_f64(),
                    );
                }
                Err(e) => error!("Failed to prune rate limiter: {}", e),
            }
        }
    }

    /// Health check job (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(300)); // Every 5 minutes

        loop {
            interval.tick().await;

            match tasks::health_check(&scheduler.context).await {
                Ok(_) => {
                    // Silent success - health is good
                }
                Err(e) => error!("Health check failed: {}", e),
            }
        }
    }
}
