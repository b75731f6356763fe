//! Admin Gate - admin console access control service
//!
//! Serves the invitation, verification and admin management API on top of a
//! SQLite store.

use admin_gate::{
    admin::bootstrap::ensure_super_admin, config::ServerConfig, jobs, server, AdminResult,
    AppContext,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AdminResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("admin_gate={},tower_http=info", config.logging.level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    print_banner();

    // Create application context
    let ctx = Arc::new(AppContext::new(config).await?);

    if let Some(email) = ctx.config.authentication.bootstrap_email.as_deref() {
        ensure_super_admin(
            &ctx.admin_access_manager,
            &ctx.invitation_manager,
            &ctx.audit_log,
            email,
        )
        .await?;
    }

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ___       __          _          ______      __
   /   | ____/ /___ ___  (_)___     / ____/___ _/ /____
  / /| |/ __  / __ `__ \/ / __ \   / / __/ __ `/ __/ _ \
 / ___ / /_/ / / / / / / / / / /  / /_/ / /_/ / /_/  __/
/_/  |_\__,_/_/ /_/ /_/_/_/ /_/   \____/\__,_/\__/\___/

        Admin access control v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
