//! Health probes for monitoring and load balancers.
//!
//! The store check talks to the connection pool directly when the
//! postgres backend is active; the in-memory backend is always reachable.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode};
use jiff::Timestamp;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::db::AsyncDbPool;
use crate::state::AppState;

pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(readiness_check))
        .routes(routes!(liveness_check))
}

/// Reports the version and the state of the store.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = check_store(state.db_pool.as_ref()).await;
    let status = store.status;

    let mut checks = BTreeMap::new();
    checks.insert("store".to_string(), store);

    let response = HealthResponse {
        status,
        version: crate::pkg_version().to_string(),
        timestamp: Timestamp::now().to_string(),
        checks,
    };

    (status_code(status), Json(response))
}

/// Ready once the store answers.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "Service is not ready")
    ),
    tag = HEALTH_TAG
)]
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    status_code(check_store(state.db_pool.as_ref()).await.status)
}

/// Alive as long as the process can answer.
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive")
    ),
    tag = HEALTH_TAG
)]
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

fn status_code(status: HealthStatus) -> StatusCode {
    match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn check_store(pool: Option<&AsyncDbPool>) -> ComponentHealth {
    let Some(pool) = pool else {
        return ComponentHealth {
            status: HealthStatus::Healthy,
            message: Some("in-memory store".to_string()),
            response_time_ms: Some(0),
        };
    };

    let start = Instant::now();
    let result = match pool.get().await {
        Ok(mut pooled) => {
            use diesel_async::{AsyncPgConnection, RunQueryDsl};

            let conn: &mut AsyncPgConnection = &mut pooled;
            diesel::sql_query("SELECT 1")
                .execute(conn)
                .await
                .map(|_| ())
                .map_err(|e| format!("Query failed: {e}"))
        }
        Err(e) => Err(format!("Connection failed: {e}")),
    };
    let elapsed = Some(start.elapsed().as_millis() as u64);

    match result {
        Ok(()) => ComponentHealth {
            status: HealthStatus::Healthy,
            message: Some("Connected".to_string()),
            response_time_ms: elapsed,
        },
        Err(message) => {
            tracing::warn!(%message, "Store health check failed");
            ComponentHealth {
                status: HealthStatus::Unhealthy,
                message: Some(message),
                response_time_ms: elapsed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness_check() {
        assert_eq!(liveness_check().await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_memory_store_is_healthy() {
        let health = check_store(None).await;
        assert_eq!(health.status, HealthStatus::Healthy);
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(status_code(HealthStatus::Healthy), StatusCode::OK);
        assert_eq!(
            status_code(HealthStatus::Unhealthy),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
