//! Health check DTOs for API responses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Health check response structure.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "status": "healthy",
    "version": "0.1.0",
    "timestamp": "2024-01-01T12:00:00Z",
    "checks": {
        "store": {
            "status": "healthy",
            "message": "postgres connection acquired",
            "responseTimeMs": 5
        }
    }
}))]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    /// Time of the check (RFC 3339)
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: String,
    pub checks: BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Individual component health information.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub response_time_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let json = serde_json::to_string(&HealthStatus::Unhealthy).unwrap();
        assert_eq!(json, "\"unhealthy\"");
    }

    #[test]
    fn test_component_health_field_names() {
        let health = ComponentHealth {
            status: HealthStatus::Healthy,
            message: Some("OK".to_string()),
            response_time_ms: Some(5),
        };
        let json = serde_json::to_value(health).unwrap();
        assert_eq!(json["responseTimeMs"], 5);
    }
}
