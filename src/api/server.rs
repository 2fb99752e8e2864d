//! HTTP server
//!
//! Wires the router to its shared state and optionally runs the daily
//! snapshot trigger alongside it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::badges::BadgeExtractor;
use crate::scheduler::{DailyTrigger, SnapshotScheduler};

use super::auth::AdminAuthorizer;
use super::handlers::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Runs snapshots for the admin endpoint
    pub scheduler: SnapshotScheduler,

    /// Single-subject badge path
    pub badges: BadgeExtractor,

    /// Gate for admin endpoints
    pub authorizer: Arc<dyn AdminAuthorizer>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        scheduler: SnapshotScheduler,
        badges: BadgeExtractor,
        authorizer: Arc<dyn AdminAuthorizer>,
    ) -> Self {
        Self {
            scheduler,
            badges,
            authorizer,
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// API Server
// ============================================================================

/// Leaderboard API server
pub struct ApiServer {
    bind_address: SocketAddr,
    state: AppState,
    trigger: Option<DailyTrigger>,
    enable_cors: bool,
}

impl ApiServer {
    /// Create a new server
    pub fn new(bind: &str, state: AppState) -> Result<Self, ServerError> {
        let bind_address = bind
            .parse()
            .map_err(|e| ServerError::ConfigError(format!("Invalid bind address '{bind}': {e}")))?;

        Ok(Self {
            bind_address,
            state,
            trigger: None,
            enable_cors: true,
        })
    }

    /// Run the daily trigger while serving
    pub fn with_trigger(mut self, trigger: DailyTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.enable_cors = enabled;
        self
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown_signal` resolves
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.bind_address;

        tracing::info!("Starting podium server on {}", addr);

        let (stop_tx, stop_rx) = watch::channel(false);
        let trigger_task = self.trigger.clone().map(|trigger| {
            let scheduler = self.state.scheduler.clone();
            tokio::spawn(trigger.run(scheduler, stop_rx))
        });

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()));

        let _ = stop_tx.send(true);
        if let Some(task) = trigger_task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Trigger task ended abnormally");
            }
        }

        served?;
        tracing::info!("Podium server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.bind_address,
            cors_enabled: self.enable_cors,
            trigger_time: self.trigger.as_ref().map(|t| t.config().run_time.clone()),
            task_name: self.state.scheduler.task_name().to_string(),
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub cors_enabled: bool,
    pub trigger_time: Option<String>,
    pub task_name: String,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Podium Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Task: {}\n\
             Daily Run: {}\n\
             CORS: {}",
            "",
            self.bind_address,
            self.task_name,
            self.trigger_time
                .as_deref()
                .map(|t| format!("{t} UTC"))
                .unwrap_or_else(|| "disabled".to_string()),
            if self.cors_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone)]
pub enum ServerError {
    /// Configuration error
    ConfigError(String),

    /// Failed to bind to address
    BindError(String),

    /// Server error
    ServeError(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::BindError(msg) => write!(f, "Failed to bind: {}", msg),
            Self::ServeError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

// ============================================================================
// Tests
// ============================================================================
