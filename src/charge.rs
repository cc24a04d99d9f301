//! # Charge Requests
//!
//! A [`ChargeRequest`] pairs a [`Bucket`] with an amount to charge and the
//! small closed set of per-request policy flags the protocol recognizes:
//! `limit` (reservation / debt threshold) and `allow_charge_adjustment`
//! (shrink-to-fit instead of failing). These are modeled as named fields
//! rather than a dynamic map, per the design notes in the protocol spec.

use crate::bucket::Bucket;

/// One element of a [`crate::rate_limiter::RateLimiter::batch_charge`] batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    pub(crate) bucket: Bucket,
    pub(crate) amount: f64,
    pub(crate) limit: f64,
    pub(crate) allow_charge_adjustment: bool,
}

impl ChargeRequest {
    /// A standard charge: admissible only if the post-charge level is `>= 0`.
    pub fn new(bucket: Bucket, amount: f64) -> Self {
        Self {
            bucket,
            amount,
            limit: 0.0,
            allow_charge_adjustment: false,
        }
    }

    /// Sets the minimum post-charge level still considered admissible.
    ///
    /// `limit > 0` reserves a floor above zero; `limit < 0` permits debt down
    /// to that floor; `limit == 0` (the default) is the standard behavior.
    pub fn with_limit(mut self, limit: f64) -> Self {
        self.limit = limit;
        self
    }

    /// When the full `amount` would not fit, charge whatever is available
    /// down to `limit` instead of failing the request outright.
    pub fn allow_adjustment(mut self) -> Self {
        self.allow_charge_adjustment = true;
        self
    }

    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    pub fn allow_charge_adjustment(&self) -> bool {
        self.allow_charge_adjustment
    }
}

/// Convenience options bundle for [`crate::rate_limiter::RateLimiter::charge`],
/// the single-bucket wrapper around a one-element batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChargeOptions {
    pub limit: f64,
    pub allow_charge_adjustment: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_charge() {
        let bucket = Bucket::new("k", 1.0, 10.0).unwrap();
        let req = ChargeRequest::new(bucket, 5.0);
        assert_eq!(req.limit(), 0.0);
        assert!(!req.allow_charge_adjustment());
    }

    #[test]
    fn builder_methods_compose() {
        let bucket = Bucket::new("k", 1.0, 10.0).unwrap();
        let req = ChargeRequest::new(bucket, 5.0)
            .with_limit(-5.0)
            .allow_adjustment();
        assert_eq!(req.limit(), -5.0);
        assert!(req.allow_charge_adjustment());
    }
}
