//! Per-client rate limiting for the subscription endpoint.
//!
//! Uses a token bucket per client address with configurable burst and
//! refill rates.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, FromRef, FromRequestParts};
use axum::http::request::Parts;
use tokio::sync::RwLock;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum burst size (bucket capacity)
    pub burst: u32,
    /// Tokens refilled per second
    pub refill_rate: f64,
    /// Whether rate limiting is enabled
    pub enabled: bool,
    /// Key clients by the first `X-Forwarded-For` hop instead of the peer
    /// address. Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: 5,
            refill_rate: 0.1,
            enabled: true,
            trust_forwarded_for: false,
        }
    }
}

/// A token bucket for a single client
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(capacity: u32) -> Self {
        Self {
            tokens: f64::from(capacity),
            last_refill: Instant::now(),
        }
    }

    /// Try to consume one token. Returns true if allowed.
    fn try_consume(&mut self, config: &RateLimitConfig) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * config.refill_rate).min(f64::from(config.burst));
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until next token is available
    fn time_until_available(&self, refill_rate: f64) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else if refill_rate <= 0.0 {
            // Never refills; report an hour so Retry-After stays meaningful
            Duration::from_secs(3600)
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / refill_rate)
        }
    }
}

/// Per-client rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<RwLock<HashMap<IpAddr, Bucket>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn trusts_forwarded_for(&self) -> bool {
        self.config.trust_forwarded_for
    }

    /// Check if a request from `client` is allowed.
    /// Returns Ok(()) if allowed, Err(retry_after) if rate limited.
    /// Requests with no known address share one bucket.
    pub async fn check(&self, client: Option<IpAddr>) -> Result<(), Duration> {
        if !self.config.enabled {
            return Ok(());
        }

        let key = client.unwrap_or(IpAddr::from([0, 0, 0, 0]));
        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .entry(key)
            .or_insert_with(|| Bucket::new(self.config.burst));

        if bucket.try_consume(&self.config) {
            Ok(())
        } else {
            Err(bucket.time_until_available(self.config.refill_rate))
        }
    }

    /// Drop buckets that have not been touched for `max_age`.
    pub async fn cleanup(&self, max_age: Duration) {
        let mut buckets = self.buckets.write().await;
        let now = Instant::now();
        buckets.retain(|_, bucket| now.duration_since(bucket.last_refill) < max_age);
    }

    /// Periodically run `cleanup` for as long as the process lives.
    pub fn spawn_cleanup(&self, every: Duration) {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                limiter.cleanup(every).await;
            }
        });
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Client address: the peer address of the connection, or the first
/// `X-Forwarded-For` hop when the limiter is configured to trust it.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub Option<IpAddr>);

impl ClientAddr {
    fn from_parts(parts: &Parts, trust_forwarded_for: bool) -> Self {
        let forwarded = trust_forwarded_for
            .then(|| parts.headers.get("x-forwarded-for"))
            .flatten()
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        ClientAddr(forwarded.or(peer))
    }
}

impl<S> FromRequestParts<S> for ClientAddr
where
    RateLimiter: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let trust = RateLimiter::from_ref(state).trusts_forwarded_for();
        Ok(ClientAddr::from_parts(parts, trust))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> Option<IpAddr> {
        Some(IpAddr::from([10, 0, 0, last]))
    }

    #[tokio::test]
    async fn test_rate_limiter_allows_burst() {
        let limiter = RateLimiter::new(RateLimitConfig {
            burst: 3,
            refill_rate: 1.0,
            enabled: true,
            trust_forwarded_for: false,
        });

        assert!(limiter.check(ip(1)).await.is_ok());
        assert!(limiter.check(ip(1)).await.is_ok());
        assert!(limiter.check(ip(1)).await.is_ok());

        let retry_after = limiter.check(ip(1)).await.unwrap_err();
        assert!(retry_after <= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_rate_limiter_separate_clients() {
        let limiter = RateLimiter::new(RateLimitConfig {
            burst: 1,
            refill_rate: 0.1,
            enabled: true,
            trust_forwarded_for: false,
        });

        assert!(limiter.check(ip(1)).await.is_ok());
        assert!(limiter.check(ip(2)).await.is_ok());
        assert!(limiter.check(ip(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_rate_limiter_without_refill() {
        let limiter = RateLimiter::new(RateLimitConfig {
            burst: 1,
            refill_rate: 0.0,
            enabled: true,
            trust_forwarded_for: false,
        });

        assert!(limiter.check(None).await.is_ok());
        assert_eq!(
            limiter.check(None).await,
            Err(Duration::from_secs(3600))
        );
    }

    #[tokio::test]
    async fn test_rate_limiter_disabled() {
        let limiter = RateLimiter::new(RateLimitConfig {
            burst: 1,
            refill_rate: 0.0,
            enabled: false,
            trust_forwarded_for: false,
        });

        for _ in 0..100 {
            assert!(limiter.check(ip(1)).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_cleanup_forgets_idle_clients() {
        let limiter = RateLimiter::new(RateLimitConfig {
            burst: 1,
            refill_rate: 0.0,
            enabled: true,
            trust_forwarded_for: false,
        });

        assert!(limiter.check(ip(1)).await.is_ok());
        assert!(limiter.check(ip(1)).await.is_err());

        limiter.cleanup(Duration::ZERO).await;
        assert!(limiter.check(ip(1)).await.is_ok());
    }

    fn request_parts(forwarded: &str, peer: [u8; 4]) -> Parts {
        let (mut parts, ()) = axum::http::Request::builder()
            .header("x-forwarded-for", forwarded)
            .body(())
            .unwrap()
            .into_parts();
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from((peer, 4000))));
        parts
    }

    #[test]
    fn test_client_addr_ignores_forwarded_for_by_default() {
        let parts = request_parts("203.0.113.7, 10.0.0.1", [192, 0, 2, 1]);

        let ClientAddr(client) = ClientAddr::from_parts(&parts, false);
        assert_eq!(client, Some(IpAddr::from([192, 0, 2, 1])));
    }

    #[test]
    fn test_client_addr_uses_first_hop_when_trusted() {
        let parts = request_parts("203.0.113.7, 10.0.0.1", [192, 0, 2, 1]);

        let ClientAddr(client) = ClientAddr::from_parts(&parts, true);
        assert_eq!(client, Some(IpAddr::from([203, 0, 113, 7])));

        // Garbage falls back to the peer
        let parts = request_parts("not-an-ip", [192, 0, 2, 1]);
        let ClientAddr(client) = ClientAddr::from_parts(&parts, true);
        assert_eq!(client, Some(IpAddr::from([192, 0, 2, 1])));
    }
}
