//! # HTTP Request Handlers
//!
//! ```text
//! GET  /buckets/:key           → get_bucket        (read level, no charge)
//! POST /buckets/:key/charge    → charge_bucket      (single-bucket charge)
//! POST /batch-charge           → batch_charge       (all-or-nothing, many buckets)
//! GET  /health                 → health_check       (liveness)
//! GET  /ready                  → readiness_check    (readiness)
//! ```
//!
//! Handlers resolve each key's `(rate, size)` from [`Config::limit_for_key`]
//! rather than accepting them from the request body — the bucket's refill
//! parameters are a server-side policy decision, not a client-supplied one.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::charge::ChargeRequest;
use crate::config::Config;
use crate::error::ThrottlerError;
use crate::health::HealthChecker;
use crate::rate_limiter::RateLimiter;

/// Shared application state handed to every handler via [`axum::extract::State`].
pub struct AppState {
    pub rate_limiter: RateLimiter,
    pub config: Config,
}

pub type SharedState = Arc<AppState>;

fn bucket_for_key(config: &Config, key: &str) -> Result<Bucket, ThrottlerError> {
    let limit = config.limit_for_key(key);
    Bucket::new(key, limit.rate, limit.size)
}

/// `POST /buckets/:key/charge` request body.
#[derive(Debug, Deserialize)]
pub struct ChargeBody {
    /// Tokens to charge. Defaults to 1.0.
    #[serde(default = "default_amount")]
    pub amount: f64,
    /// Minimum post-charge level still considered admissible. Defaults to 0
    /// (standard admission).
    #[serde(default)]
    pub limit: f64,
    /// Shrink the charge to fit instead of rejecting it outright.
    #[serde(default)]
    pub allow_charge_adjustment: bool,
}

fn default_amount() -> f64 {
    1.0
}

#[derive(Debug, Serialize)]
pub struct ChargeResponse {
    pub key: String,
    pub allowed: bool,
    pub level: f64,
}

/// One element of a [`BatchChargeBody`].
#[derive(Debug, Deserialize)]
pub struct BatchChargeItem {
    pub key: String,
    #[serde(default = "default_amount")]
    pub amount: f64,
    #[serde(default)]
    pub limit: f64,
    #[serde(default)]
    pub allow_charge_adjustment: bool,
}

#[derive(Debug, Deserialize)]
pub struct BatchChargeBody {
    pub requests: Vec<BatchChargeItem>,
}

#[derive(Debug, Serialize)]
pub struct BatchChargeResponse {
    pub allowed: bool,
    pub levels: std::collections::HashMap<String, f64>,
}

/// Reads a bucket's current level without charging it.
pub async fn get_bucket(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ThrottlerError> {
    let bucket = bucket_for_key(&state.config, &key)?;
    let level = state.rate_limiter.read_level(&bucket).await?;
    Ok(Json(serde_json::json!({ "key": key, "level": level })))
}

/// Charges a single bucket, returning whether it was admissible and the
/// resulting level.
///
/// `429 Too Many Requests` on rejection, `200 OK` on success.
pub async fn charge_bucket(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    Json(body): Json<ChargeBody>,
) -> Result<impl IntoResponse, ThrottlerError> {
    let bucket = bucket_for_key(&state.config, &key)?;
    let request = {
        let mut r = ChargeRequest::new(bucket, body.amount).with_limit(body.limit);
        if body.allow_charge_adjustment {
            r = r.allow_adjustment();
        }
        r
    };

    let (allowed, mut levels) = state
        .rate_limiter
        .batch_charge(std::slice::from_ref(&request))
        .await?;
    let level = levels
        .remove(&key)
        .ok_or_else(|| ThrottlerError::Internal("script returned no level for key".into()))?;

    let status = if allowed {
        StatusCode::OK
    } else {
        StatusCode::TOO_MANY_REQUESTS
    };

    Ok((status, Json(ChargeResponse { key, allowed, level })))
}

/// Charges several buckets atomically: all commit, or none do.
pub async fn batch_charge(
    State(state): State<SharedState>,
    Json(body): Json<BatchChargeBody>,
) -> Result<impl IntoResponse, ThrottlerError> {
    let requests = body
        .requests
        .into_iter()
        .map(|item| {
            let bucket = bucket_for_key(&state.config, &item.key)?;
            let mut request = ChargeRequest::new(bucket, item.amount).with_limit(item.limit);
            if item.allow_charge_adjustment {
                request = request.allow_adjustment();
            }
            Ok(request)
        })
        .collect::<Result<Vec<ChargeRequest>, ThrottlerError>>()?;

    let (allowed, levels) = state.rate_limiter.batch_charge(&requests).await?;

    let status = if allowed {
        StatusCode::OK
    } else {
        StatusCode::TOO_MANY_REQUESTS
    };

    Ok((status, Json(BatchChargeResponse { allowed, levels })))
}

/// Liveness probe. Always `200 OK` while the process is running.
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    let checker = HealthChecker::new(state.rate_limiter.clone());
    Json(checker.check_health().await)
}

/// Readiness probe. `200` with `"ready"` when Redis answers, `503` otherwise.
pub async fn readiness_check(State(state): State<SharedState>) -> impl IntoResponse {
    match state.rate_limiter.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready" })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "not_ready", "error": e.to_string() })),
        ),
    }
}
