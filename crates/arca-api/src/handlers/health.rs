//! Liveness and readiness probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;

use crate::state::AppState;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: ComponentHealth,
    pub storage: ComponentHealth,
}

/// Process is up and serving requests.
pub async fn liveness() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}

async fn run_check<F, E>(name: &str, fut: F) -> ComponentHealth
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(CHECK_TIMEOUT, fut).await {
        Ok(Ok(())) => ComponentHealth {
            healthy: true,
            message: None,
        },
        Ok(Err(e)) => {
            tracing::warn!(component = name, error = %e, "health check failed");
            ComponentHealth {
                healthy: false,
                message: Some(e.to_string()),
            }
        }
        Err(_) => {
            tracing::warn!(component = name, "health check timed out");
            ComponentHealth {
                healthy: false,
                message: Some("timed out".to_string()),
            }
        }
    }
}

/// Dependencies are reachable. Returns 503 when any check fails.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.pool {
        Some(pool) => {
            run_check("database", async {
                sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
            })
            .await
        }
        None => ComponentHealth {
            healthy: true,
            message: Some("not configured".to_string()),
        },
    };

    let storage = run_check("storage", async {
        state.storage.list().await.map(|_| ())
    })
    .await;

    let healthy = database.healthy && storage.healthy;
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        database,
        storage,
    };
    (status_code, Json(response))
}
