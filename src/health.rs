//! # Health Checks
//!
//! [`HealthChecker`] answers the two probes [`crate::server`] exposes:
//! liveness (is the process up) and readiness (can it currently reach
//! Redis). Liveness never depends on Redis — a Redis outage degrades the
//! service, it does not make the process worth restarting.

use std::sync::LazyLock;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::rate_limiter::RateLimiter;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: DependencyStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub redis: ServiceStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    pub response_time_ms: u64,
    pub error: Option<String>,
}

static START_TIME: LazyLock<SystemTime> = LazyLock::new(SystemTime::now);

pub struct HealthChecker {
    rate_limiter: RateLimiter,
}

impl HealthChecker {
    pub fn new(rate_limiter: RateLimiter) -> Self {
        Self { rate_limiter }
    }

    pub async fn check_health(&self) -> HealthStatus {
        let now = SystemTime::now();
        let uptime = now.duration_since(*START_TIME).unwrap_or_default().as_secs();

        let redis_status = self.check_redis().await;

        let overall_status = if redis_status.status == "healthy" {
            "healthy"
        } else {
            "degraded" // not unhealthy, just running without Redis
        };

        HealthStatus {
            status: overall_status.to_string(),
            timestamp: now
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime,
            dependencies: DependencyStatus { redis: redis_status },
        }
    }

    async fn check_redis(&self) -> ServiceStatus {
        let start = SystemTime::now();
        match self.rate_limiter.ping().await {
            Ok(()) => ServiceStatus {
                status: "healthy".to_string(),
                response_time_ms: start.elapsed().unwrap_or_default().as_millis() as u64,
                error: None,
            },
            Err(e) => ServiceStatus {
                status: "unavailable".to_string(),
                response_time_ms: start.elapsed().unwrap_or_default().as_millis() as u64,
                error: Some(e.to_string()),
            },
        }
    }
}
