//! Token-bucket limiter for outbound scraping requests.

use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Shared requests-per-minute budget. Cloning shares the bucket.
#[derive(Clone)]
pub struct RequestLimiter {
    limiter: Arc<DirectLimiter>,
    per_minute: u32,
}

impl RequestLimiter {
    /// Sustained rate of `requests_per_minute`, burst of one. Zero is treated as one.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(rate).allow_burst(NonZeroU32::MIN))),
            per_minute: rate.get(),
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.per_minute
    }

    /// Wait until the next request is allowed
    pub async fn until_ready(&self) {
        self.limiter.until_ready().await;
    }

    /// Take a permit without waiting, if one is available
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}
