//! REST API handlers
//!
//! Core operations are blocking storage calls, so every handler that touches
//! the store hops onto the blocking pool.

use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::badges::Badge;
use crate::error::{Error, ErrorCategory, PodiumErrorTrait};
use crate::models::{RunLogEntry, RunStatus, SubjectId};
use crate::scheduler::{CategoryFailure, RunReport};

use super::server::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Response to an admin-triggered run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRunResponse {
    pub success: bool,
    pub run_id: Uuid,
    pub status: RunStatus,
    pub snapshots_written: usize,
    pub failures: Vec<CategoryFailure>,
    pub timestamp: DateTime<Utc>,
}

impl From<&RunReport> for TriggerRunResponse {
    fn from(report: &RunReport) -> Self {
        Self {
            success: report.status != RunStatus::Failed,
            run_id: report.run_id,
            status: report.status,
            snapshots_written: report.snapshots_written(),
            failures: report.failures().into_iter().cloned().collect(),
            timestamp: report.finished_at,
        }
    }
}

/// Badges held by a subject
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgesResponse {
    pub subject_id: SubjectId,
    pub badges: Vec<Badge>,
}

/// Error wrapper mapping crate errors to HTTP responses
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.category() {
            ErrorCategory::Auth => StatusCode::UNAUTHORIZED,
            ErrorCategory::Storage if self.0.is_recoverable() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(error = %self.0, "Rejected admin request");
        } else {
            tracing::error!(error = %self.0, "Request failed");
        }

        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}

/// Run a blocking core operation on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError(Error::with_source("blocking task failed", e)))?
        .map_err(ApiError)
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/api/health", get(health_check))
        .route("/metrics", get(metrics))
        // Admin endpoints
        .route("/api/admin/leaderboards/snapshots", post(trigger_run))
        .route("/api/admin/leaderboards/runlog", get(get_run_log))
        // Subject endpoints
        .route("/api/subjects/{id}/badges", get(get_badges))
        .with_state(state)
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime,
    }))
}

/// Prometheus scrape endpoint
async fn metrics() -> Response {
    match crate::metrics::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response(),
    }
}

// ============================================================================
// Admin Handlers
// ============================================================================

/// Trigger a full snapshot run
async fn trigger_run(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let identity = state.authorizer.authorize(&headers).await?;
    let triggered_by = identity.run_label();

    tracing::info!(triggered_by = %triggered_by, "Admin-triggered snapshot run");

    let scheduler = state.scheduler.clone();
    let report = blocking(move || Ok(scheduler.run(&triggered_by))).await?;

    let status = match report.status {
        RunStatus::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        RunStatus::Success | RunStatus::Partial => StatusCode::OK,
    };
    crate::metrics::record_api_request("/api/admin/leaderboards/snapshots", status.as_u16());
    Ok((status, Json(TriggerRunResponse::from(&report))).into_response())
}

/// Last run log entry for the snapshot task
async fn get_run_log(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    state.authorizer.authorize(&headers).await?;

    let scheduler = state.scheduler.clone();
    let entry: Option<RunLogEntry> = blocking(move || scheduler.last_run()).await?;

    Ok(match entry {
        Some(entry) => (StatusCode::OK, Json(ApiResponse::success(entry))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("No run recorded yet")),
        )
            .into_response(),
    })
}

// ============================================================================
// Subject Handlers
// ============================================================================

/// Podium badges for one subject
async fn get_badges(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let Ok(id) = id.parse::<i64>() else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!("Invalid subject ID: {id}"))),
        )
            .into_response());
    };
    let subject = SubjectId(id);

    let extractor = state.badges.clone();
    let badges = blocking(move || extractor.badges_for(subject, Utc::now())).await?;
    crate::metrics::record_api_request("/api/subjects/{id}/badges", 200);

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(BadgesResponse {
            subject_id: subject,
            badges,
        })),
    )
        .into_response())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{CategoryOutcome, FailureStage};
    use crate::models::Category;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success("test data");
        assert!(response.success);
        assert!(response.data.is_some());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_trigger_response_shape() {
        let now = Utc::now();
        let report = RunReport::new(
            Uuid::new_v4(),
            "leaderboard_snapshots",
            "admin:ops",
            now,
            now,
            vec![
                CategoryOutcome::Persisted {
                    category: Category::MostLiked,
                    entries: 4,
                },
                CategoryOutcome::Failed(CategoryFailure::new(
                    Category::TopTeachers,
                    FailureStage::Scoring,
                    "timeout",
                    true,
                )),
            ],
        );

        let json = serde_json::to_value(TriggerRunResponse::from(&report)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["status"], "partial");
        assert_eq!(json["snapshotsWritten"], 1);
        assert_eq!(json["failures"][0]["category"], "top_teachers");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_unauthorized_maps_to_401() {
        let response = ApiError(Error::unauthorized("nope")).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_storage_error_maps_to_503() {
        let response = ApiError(Error::Storage(anyhow::anyhow!("disk full"))).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
