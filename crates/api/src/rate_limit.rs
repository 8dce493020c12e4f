//! Per-IP rate limiting for the unauthenticated entry points.
//!
//! Join and auth requests arrive before a caller has any identity, so the
//! client address is the only key available.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tokio::sync::Mutex;

/// A fixed-window limit.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl RateLimitConfig {
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }
}

/// Default limits per endpoint class.
pub mod limits {
    use super::RateLimitConfig;

    /// Joining a session by code. A classroom behind one NAT joins at once.
    pub const JOIN: RateLimitConfig = RateLimitConfig::new(120, 60);

    /// Signup and signin.
    pub const AUTH: RateLimitConfig = RateLimitConfig::new(10, 300);
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Outcome of a limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: u64 },
}

/// Fixed-window counter keyed by client address.
#[derive(Clone)]
pub struct ApiRateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl ApiRateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a request against `key`.
    pub async fn check(&self, key: &str) -> Decision {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(window.started) >= self.config.window {
            window.count = 0;
            window.started = now;
        }

        if window.count >= self.config.max_requests {
            let retry_after = self
                .config
                .window
                .saturating_sub(now.duration_since(window.started))
                .as_secs()
                .max(1);
            return Decision::Limited { retry_after };
        }

        window.count += 1;
        Decision::Allowed {
            remaining: self.config.max_requests - window.count,
        }
    }

    /// Drop windows that have fully elapsed.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let window = self.config.window;
        self.windows
            .lock()
            .await
            .retain(|_, state| now.duration_since(state.started) < window);
    }

    /// Number of tracked keys.
    pub async fn key_count(&self) -> usize {
        self.windows.lock().await.len()
    }
}

/// Limiters shared by the middleware.
#[derive(Clone)]
pub struct RateLimiterState {
    pub join: ApiRateLimiter,
    pub auth: ApiRateLimiter,
    /// Key clients by forwarding headers instead of the socket peer.
    /// Only safe behind a reverse proxy that overwrites them.
    pub trust_proxy: bool,
}

impl Default for RateLimiterState {
    fn default() -> Self {
        Self::new(limits::JOIN, limits::AUTH)
    }
}

impl RateLimiterState {
    #[must_use]
    pub fn new(join: RateLimitConfig, auth: RateLimitConfig) -> Self {
        Self {
            join: ApiRateLimiter::new(join),
            auth: ApiRateLimiter::new(auth),
            trust_proxy: false,
        }
    }

    /// Honour `X-Forwarded-For` / `X-Real-IP` when `trust` is set.
    #[must_use]
    pub const fn with_trusted_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy = trust;
        self
    }

    /// Spawn a task that periodically forgets idle clients.
    pub fn spawn_cleanup(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                state.join.cleanup().await;
                state.auth.cleanup().await;
            }
        })
    }
}

/// Rate limit error response.
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": "RATE_LIMITED",
                "message": "Too many requests",
            }
        });

        (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, self.retry_after.to_string())],
            axum::Json(body),
        )
            .into_response()
    }
}

/// Client address.
///
/// The socket peer, unless `trust_proxy` is set: then the hop appended last to
/// `X-Forwarded-For` (the proxy's view of the client), then `X-Real-IP`.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> Option<IpAddr> {
    if !trust_proxy {
        return peer.map(|addr| addr.ip());
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .and_then(|v| v.trim().parse().ok());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        })
        .or_else(|| peer.map(|addr| addr.ip()))
}

async fn limit_by_ip(
    limiter: &ApiRateLimiter,
    trust_proxy: bool,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let key = client_ip(req.headers(), peer, trust_proxy)
        .map_or_else(|| "unknown".to_string(), |ip| ip.to_string());

    match limiter.check(&key).await {
        Decision::Allowed { remaining } => {
            let mut response = next.run(req).await;
            response
                .headers_mut()
                .insert("X-RateLimit-Remaining", remaining.into());
            Ok(response)
        }
        Decision::Limited { retry_after } => {
            tracing::debug!(client = %key, retry_after, "Rate limited");
            Err(RateLimitError { retry_after })
        }
    }
}

/// Rate limiting middleware for session joins.
pub async fn rate_limit_join_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    limit_by_ip(&limiter.join, limiter.trust_proxy, req, next).await
}

/// Rate limiting middleware for auth operations.
pub async fn rate_limit_auth_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    limit_by_ip(&limiter.auth, limiter.trust_proxy, req, next).await
}
