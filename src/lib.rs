//! # throttler
//!
//! A distributed, Redis-backed token bucket rate limiter. Independent
//! clients coordinate throughput limits on arbitrary resources by atomically
//! charging one or more buckets in a single Lua script invocation.
//!
//! ## Core components
//!
//! - [`bucket::Bucket`] — names one bucket and its refill parameters
//! - [`charge::ChargeRequest`] — a bucket, an amount, and optional policy flags
//! - [`rate_limiter::RateLimiter`] — the client-side driver around the atomic
//!   charge script (`src/scripts/charge.lua`)
//! - [`clock::Clock`] — pluggable time source, for injecting test clocks
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use throttler::bucket::Bucket;
//! use throttler::rate_limiter::RateLimiter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = RateLimiter::connect("redis://127.0.0.1:6379").await?;
//! let bucket = Bucket::new("user:42", 2.0, 10.0)?;
//!
//! let (allowed, remaining) = limiter.charge(&bucket, 1.0, None).await?;
//! if !allowed {
//!     println!("rate limited, {remaining} tokens left");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The HTTP front-end ([`server`], [`handlers`]) is an outer, optional
//! consumer of the library — the atomic protocol above is the part this
//! crate actually specifies.

pub mod bucket;
pub mod charge;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod rate_limiter;
pub mod server;

pub use bucket::Bucket;
pub use charge::{ChargeOptions, ChargeRequest};
pub use clock::{Clock, ManualClock, ServerClock};
pub use config::Config;
pub use error::ThrottlerError;
pub use rate_limiter::RateLimiter;

pub type Result<T> = std::result::Result<T, ThrottlerError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
