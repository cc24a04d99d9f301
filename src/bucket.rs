//! # Bucket Descriptor
//!
//! A [`Bucket`] names one token bucket and the two parameters that govern its
//! continuous refill: `rate` (tokens added per second) and `size` (maximum
//! capacity). It carries no state of its own — the current token level lives
//! in Redis, keyed by [`Bucket::key`], and is only ever read or mutated
//! through the atomic script that [`crate::rate_limiter::RateLimiter`] drives.
//!
//! ```rust
//! use throttler::bucket::Bucket;
//!
//! let bucket = Bucket::new("user:42", 2.0, 10.0).unwrap();
//! assert_eq!(bucket.key(), "user:42");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ThrottlerError, ThrottlerResult};

/// Names one bucket and its refill parameters.
///
/// `key` is used verbatim as the Redis key — the library imposes no prefix.
/// `rate` and `size` are validated at construction time (§7 of the protocol:
/// malformed arguments are a caller contract violation, rejected at the
/// driver rather than left undefined inside the script).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    key: String,
    rate: f64,
    size: f64,
}

impl Bucket {
    /// Creates a bucket descriptor, rejecting negative rates and non-positive
    /// capacities.
    pub fn new(key: impl Into<String>, rate: f64, size: f64) -> ThrottlerResult<Self> {
        if !(rate >= 0.0) {
            return Err(ThrottlerError::Validation(format!(
                "bucket rate must be non-negative, got {rate}"
            )));
        }
        if !(size > 0.0) {
            return Err(ThrottlerError::Validation(format!(
                "bucket size must be positive, got {size}"
            )));
        }
        Ok(Self {
            key: key.into(),
            rate,
            size,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn size(&self) -> f64 {
        self.size
    }
}
