/// Health endpoints for container probes
use actix_web::{web, HttpResponse};
use chrono::Utc;
use redis::aio::ConnectionManager;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Instant;

const REDIS_PING_TIMEOUT_MS: u64 = 1_000;

pub struct HealthState {
    db_pool: PgPool,
    redis_manager: ConnectionManager,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

impl HealthState {
    pub fn new(db_pool: PgPool, redis_manager: ConnectionManager) -> Self {
        Self {
            db_pool,
            redis_manager,
        }
    }

    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.db_pool)
            .await
            .map(|_| ())
    }

    async fn check_redis(&self) -> Result<(), redis::RedisError> {
        redis_utils::ping(&self.redis_manager, REDIS_PING_TIMEOUT_MS).await
    }
}

fn component_check<E: std::fmt::Display>(
    result: Result<(), E>,
    started: Instant,
    ok_message: &str,
    failure_prefix: &str,
) -> ComponentCheck {
    let latency_ms = Some(started.elapsed().as_millis() as u64);
    match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: ok_message.to_string(),
            latency_ms,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("{}: {}", failure_prefix, e),
            latency_ms,
        },
    }
}

/// `GET /api/v1/health`
pub async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "post-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "post-service"
        })),
    }
}

/// `GET /api/v1/health/ready`
pub async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let start = Instant::now();
    let postgres = component_check(
        state.check_postgres().await,
        start,
        "PostgreSQL connection successful",
        "PostgreSQL connection failed",
    );
    checks.insert("postgresql".to_string(), postgres);

    let start = Instant::now();
    let redis = component_check(
        state.check_redis().await,
        start,
        "Redis ping successful",
        "Redis ping failed",
    );
    checks.insert("redis".to_string(), redis);

    let ready = checks
        .values()
        .all(|check| matches!(check.status, ComponentStatus::Healthy));
    let status = if ready {
        ComponentStatus::Healthy
    } else {
        ComponentStatus::Unhealthy
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// `GET /api/v1/health/live`
pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "alive" }))
}
