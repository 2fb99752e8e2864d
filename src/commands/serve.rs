use std::sync::Arc;

use anyhow::{Context, Result};

use podium::api::{ApiServer, AppState, StaticTokenAuthorizer};
use podium::badges::BadgeExtractor;
use podium::config::Config;
use podium::scheduler::DailyTrigger;

use super::{build_scheduler, open_store};

/// Start the HTTP server
pub async fn serve(config: &Config) -> Result<()> {
    if let Err(e) = podium::metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed; /metrics will be empty");
    }

    let store = open_store(config)?;
    let scheduler = build_scheduler(config, store.clone(), &[])?;
    let badges = BadgeExtractor::new(store)
        .with_window_days(config.leaderboard.badge_window_days)
        .with_categories(config.leaderboard.active_categories());

    if config.server.admin_token.is_none() {
        tracing::warn!("No admin token configured; admin endpoints will reject every request");
    }
    let authorizer = Arc::new(StaticTokenAuthorizer::new(config.server.admin_token.clone()));

    let state = AppState::new(scheduler, badges, authorizer);
    let mut server = ApiServer::new(&config.server.bind, state)?;

    if config.server.trigger.enabled {
        let trigger = DailyTrigger::new(config.server.trigger.clone())
            .context("Invalid trigger configuration")?;
        server = server.with_trigger(trigger);
    }

    println!("{}", server.info().display());
    println!();
    println!("Press Ctrl+C to stop.\n");

    server
        .start_with_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    println!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => println!("\nShutdown signal received, stopping..."),
        Err(e) => tracing::error!("Failed to wait for Ctrl+C: {}", e),
    }
}
