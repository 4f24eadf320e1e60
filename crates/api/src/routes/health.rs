//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub storage: StorageHealth,
}

/// Database health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Image storage health status.
#[derive(Debug, Serialize)]
pub struct StorageHealth {
    pub available: bool,
}

/// Simple status response for liveness/readiness checks.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl HealthResponse {
    fn new(database: DatabaseHealth, storage: StorageHealth) -> Self {
        let healthy = database.connected && storage.available;
        Self {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
            storage,
        }
    }

    fn is_healthy(&self) -> bool {
        self.database.connected && self.storage.available
    }
}

/// Full health check endpoint.
///
/// Reports database connectivity and whether image storage is writable.
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();
    let db_connected = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let latency_ms = start.elapsed().as_millis() as u64;

    persistence::metrics::record_pool_metrics(&state.pool);

    let response = HealthResponse::new(
        DatabaseHealth {
            connected: db_connected,
            latency_ms: db_connected.then_some(latency_ms),
        },
        StorageHealth {
            available: state.storage.health_check().await,
        },
    );

    let status = if response.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Liveness check endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness check endpoint.
///
/// Returns 200 OK if the service can accept traffic (database connected).
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(|_| ApiError::ServiceUnavailable("Database unavailable".to_string()))?;

    Ok(Json(StatusResponse {
        status: "ready".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_healthy() {
        let response = HealthResponse::new(
            DatabaseHealth {
                connected: true,
                latency_ms: Some(5),
            },
            StorageHealth { available: true },
        );
        assert_eq!(response.status, "healthy");
        assert!(response.is_healthy());
    }

    #[test]
    fn test_health_response_storage_down() {
        let response = HealthResponse::new(
            DatabaseHealth {
                connected: true,
                latency_ms: Some(5),
            },
            StorageHealth { available: false },
        );
        assert_eq!(response.status, "unhealthy");
        assert!(!response.is_healthy());
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse::new(
            DatabaseHealth {
                connected: false,
                latency_ms: None,
            },
            StorageHealth { available: true },
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["database"]["connected"], false);
        assert!(json["database"]["latency_ms"].is_null());
        assert_eq!(json["storage"]["available"], true);
    }
}
