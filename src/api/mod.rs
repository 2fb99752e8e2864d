//! HTTP surface for the leaderboard engine
//!
//! # Endpoints
//!
//! | Method | Path | Auth |
//! |---|---|---|
//! | POST | `/api/admin/leaderboards/snapshots` | admin |
//! | GET | `/api/admin/leaderboards/runlog` | admin |
//! | GET | `/api/subjects/{id}/badges` | none |
//! | GET | `/api/health` | none |
//! | GET | `/metrics` | none |
//!
//! # Example
//!
//! ```rust,ignore
//! use podium::api::{ApiServer, AppState, StaticTokenAuthorizer};
//!
//! let state = AppState::new(scheduler, badges, Arc::new(StaticTokenAuthorizer::new(token)));
//! ApiServer::new("127.0.0.1:8080", state)?
//!     .start_with_shutdown(shutdown_signal())
//!     .await?;
//! ```

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::{AdminAuthorizer, AdminIdentity, StaticTokenAuthorizer};
pub use handlers::{create_router, ApiError, ApiResponse, ErrorResponse, TriggerRunResponse};
pub use server::{ApiServer, AppState, ServerError, ServerInfo};
