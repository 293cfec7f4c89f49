//! Fixed-window rate limiting per client IP.
//!
//! Counters live in this process only; several API instances each enforce
//! their own limit.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use teatrade_infra::config::RateLimitSettings;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Try again later.";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// `capacity` requests per `window`, per IP.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    capacity: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(settings.capacity, settings.window())
    }

    /// Count one request from `ip`. Returns `false` once the window is full.
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let Ok(mut windows) = self.windows.lock() else {
            // Poisoned: fail open.
            return true;
        };
        let entry = windows.entry(ip).or_insert(Window { started: now, count: 0 });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window { started: now, count: 0 };
        }
        if entry.count >= self.capacity {
            return false;
        }
        entry.count += 1;
        true
    }

    /// Drop windows that have expired. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let Ok(mut windows) = self.windows.lock() else {
            return 0;
        };
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.started) < self.window);
        before - windows.len()
    }

    pub fn tracked(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }

    /// Sweep expired windows every `every` until [`Sweeper::stop`] is called.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> Sweeper {
        let limiter = Arc::clone(self);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, "swept expired rate-limit windows");
                        }
                    }
                    _ = &mut stop_rx => break,
                }
            }
        });
        Sweeper {
            stop: Some(stop_tx),
            handle,
        }
    }
}

/// Background task that drops expired rate-limit windows.
#[derive(Debug)]
pub struct Sweeper {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = (&mut self.handle).await {
            tracing::warn!(error = %e, "rate-limit sweeper ended abnormally");
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitState {
    pub limiter: Arc<FixedWindowLimiter>,
    pub trust_forwarded_for: bool,
}

pub async fn rate_limit_middleware(State(state): State<RateLimitState>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let ip = client_ip(req.headers(), peer, state.trust_forwarded_for);

    if !state.limiter.check(ip) {
        tracing::warn!(client_ip = %ip, path = %req.uri().path(), "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "message": RATE_LIMIT_MESSAGE })),
        )
            .into_response();
    }

    next.run(req).await
}

/// The first `X-Forwarded-For` hop when trusted, else the peer address.
fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_forwarded_for: bool) -> IpAddr {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|hop| hop.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip;
        }
    }
    peer.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
