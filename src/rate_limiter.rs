//! # Limiter Driver
//!
//! [`RateLimiter`] is the client-side orchestrator around the atomic charge
//! script in `src/scripts/charge.lua`. It serializes a batch of
//! [`ChargeRequest`]s into the script's keys/argv, invokes it by cached
//! digest (the `redis` crate itself handles the `EVALSHA` → `NOSCRIPT` →
//! reload-and-retry dance per invocation), and parses the returned
//! `[success, level_1, .., level_n]` tuple back into a keyed map.
//!
//! Every public operation funnels through [`RateLimiter::invoke_batch`] —
//! `read_level`/`read_levels` are zero-amount batches, not a separate code
//! path, so their "never persist a no-op" semantics come from the script
//! itself rather than being reimplemented here.

use std::collections::HashMap;
use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{Client, Value};

use crate::bucket::Bucket;
use crate::charge::{ChargeOptions, ChargeRequest};
use crate::clock::{Clock, ServerClock};
use crate::error::{ThrottlerError, ThrottlerResult};

const SERVER_TIME_SENTINEL: &str = "SERVER_TIME";

/// Client-side driver for the atomic multi-bucket charge protocol.
///
/// Cheap to clone: the underlying [`ConnectionManager`] multiplexes over a
/// single auto-reconnecting connection, and the compiled [`redis::Script`]
/// is immutable after construction.
#[derive(Clone)]
pub struct RateLimiter {
    manager: ConnectionManager,
    script: Arc<redis::Script>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Connects to Redis at `url`, using the data store's own clock.
    pub async fn connect(url: &str) -> ThrottlerResult<Self> {
        Self::connect_with_clock(url, Arc::new(ServerClock)).await
    }

    /// Connects to Redis at `url`, using a caller-supplied [`Clock`] instead
    /// of the server's. Primarily for tests that need to control elapsed
    /// time precisely.
    pub async fn connect_with_clock(url: &str, clock: Arc<dyn Clock>) -> ThrottlerResult<Self> {
        let client = Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self {
            manager,
            script: Arc::new(redis::Script::new(include_str!("scripts/charge.lua"))),
            clock,
        })
    }

    /// Checks that the Redis connection is alive by issuing a `PING`.
    pub async fn ping(&self) -> ThrottlerResult<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(ThrottlerError::from)?;
        Ok(())
    }

    /// Current level for one bucket. Equivalent to a zero-amount charge: it
    /// mutates no visible state.
    pub async fn read_level(&self, bucket: &Bucket) -> ThrottlerResult<f64> {
        let request = ChargeRequest::new(bucket.clone(), 0.0);
        let (_, levels) = self.invoke_batch(std::slice::from_ref(&request)).await?;
        levels
            .into_iter()
            .next()
            .ok_or_else(|| ThrottlerError::Internal("script returned no levels".into()))
    }

    /// Current levels for several buckets, batched into one round trip.
    pub async fn read_levels(&self, buckets: &[Bucket]) -> ThrottlerResult<HashMap<String, f64>> {
        let requests: Vec<ChargeRequest> = buckets
            .iter()
            .map(|bucket| ChargeRequest::new(bucket.clone(), 0.0))
            .collect();
        self.batch_charge(&requests).await
    }

    /// Convenience wrapper around a one-element batch.
    pub async fn charge(
        &self,
        bucket: &Bucket,
        amount: f64,
        opts: Option<ChargeOptions>,
    ) -> ThrottlerResult<(bool, f64)> {
        let opts = opts.unwrap_or_default();
        let mut request = ChargeRequest::new(bucket.clone(), amount).with_limit(opts.limit);
        if opts.allow_charge_adjustment {
            request = request.allow_adjustment();
        }
        let (success, levels) = self.invoke_batch(std::slice::from_ref(&request)).await?;
        let level = levels
            .into_iter()
            .next()
            .ok_or_else(|| ThrottlerError::Internal("script returned no levels".into()))?;
        Ok((success, level))
    }

    /// The primary operation: charges every request in `requests` atomically
    /// — all commit, or none do.
    pub async fn batch_charge(
        &self,
        requests: &[ChargeRequest],
    ) -> ThrottlerResult<(bool, HashMap<String, f64>)> {
        let (success, levels) = self.invoke_batch(requests).await?;
        let map = requests
            .iter()
            .zip(levels)
            .map(|(request, level)| (request.bucket().key().to_string(), level))
            .collect();
        Ok((success, map))
    }

    async fn invoke_batch(&self, requests: &[ChargeRequest]) -> ThrottlerResult<(bool, Vec<f64>)> {
        if requests.is_empty() {
            return Ok((true, Vec::new()));
        }

        tracing::trace!(batch_size = requests.len(), "invoking atomic charge script");

        let mut invocation = self.script.prepare_invoke();
        for request in requests {
            invocation.key(request.bucket().key());
        }

        match self.clock.now() {
            Some(now) => invocation.arg(now),
            None => invocation.arg(SERVER_TIME_SENTINEL),
        };
        invocation.arg(requests.len() as i64);

        for request in requests {
            invocation
                .arg(request.bucket().rate())
                .arg(request.bucket().size())
                .arg(request.amount())
                .arg(request.limit())
                .arg(if request.allow_charge_adjustment() { 1i64 } else { 0i64 });
        }

        let mut conn = self.manager.clone();
        let raw: Vec<Value> = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(ThrottlerError::from)?;

        parse_script_reply(&raw)
    }
}

fn parse_script_reply(raw: &[Value]) -> ThrottlerResult<(bool, Vec<f64>)> {
    let (head, tail) = raw
        .split_first()
        .ok_or_else(|| ThrottlerError::Serialization("empty script reply".into()))?;

    let success = match head {
        Value::Int(v) => *v == 1,
        other => {
            return Err(ThrottlerError::Serialization(format!(
                "expected integer success flag, got {other:?}"
            )))
        }
    };

    let levels = tail
        .iter()
        .map(value_to_f64)
        .collect::<ThrottlerResult<Vec<f64>>>()?;

    Ok((success, levels))
}

fn value_to_f64(value: &Value) -> ThrottlerResult<f64> {
    let text = match value {
        Value::Data(bytes) => std::str::from_utf8(bytes)
            .map_err(|e| ThrottlerError::Serialization(format!("non-utf8 level: {e}")))?,
        Value::Status(s) => s.as_str(),
        other => {
            return Err(ThrottlerError::Serialization(format!(
                "expected a level string, got {other:?}"
            )))
        }
    };
    text.parse::<f64>()
        .map_err(|e| ThrottlerError::Serialization(format!("invalid level {text:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_reply() {
        let raw = vec![
            Value::Int(1),
            Value::Data(b"7.5".to_vec()),
            Value::Data(b"86".to_vec()),
        ];
        let (success, levels) = parse_script_reply(&raw).unwrap();
        assert!(success);
        assert_eq!(levels, vec![7.5, 86.0]);
    }

    #[test]
    fn parses_failed_reply() {
        let raw = vec![Value::Int(0), Value::Data(b"3".to_vec())];
        let (success, levels) = parse_script_reply(&raw).unwrap();
        assert!(!success);
        assert_eq!(levels, vec![3.0]);
    }

    #[test]
    fn rejects_empty_reply() {
        assert!(parse_script_reply(&[]).is_err());
    }

    #[test]
    fn rejects_non_numeric_level() {
        let raw = vec![Value::Int(1), Value::Data(b"not-a-number".to_vec())];
        assert!(parse_script_reply(&raw).is_err());
    }
}
