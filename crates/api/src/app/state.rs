//! Shared application state.
//!
//! Built once at start-up from [`Settings`] and handed to the router. The
//! store and the rate limiter are owned here; `main` tears them down on
//! shutdown.

use std::sync::Arc;

use axum::extract::FromRef;

use teatrade_auth::{JwtAlgorithm, JwtValidator, JwtVerifier, VerifierConfig};
use teatrade_infra::config::{AuthSettings, UploadSettings};
use teatrade_infra::{Database, RetryPolicy, Settings};

use crate::middleware::{AuthState, FixedWindowLimiter, RateLimitState};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub retry: RetryPolicy,
    pub jwt: Arc<dyn JwtValidator>,
    pub limiter: Arc<FixedWindowLimiter>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, jwt: Arc<dyn JwtValidator>, settings: Settings) -> Self {
        Self {
            db,
            retry: settings.retry_policy(),
            jwt,
            limiter: Arc::new(FixedWindowLimiter::from_settings(&settings.rate_limit)),
            settings: Arc::new(settings),
        }
    }

    pub fn db(&self) -> &dyn Database {
        self.db.as_ref()
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState {
            jwt: Arc::clone(&self.jwt),
            admin_group: Arc::from(self.settings.auth.admin_group.as_str()),
        }
    }

    pub fn rate_limit_state(&self) -> RateLimitState {
        RateLimitState {
            limiter: Arc::clone(&self.limiter),
            trust_forwarded_for: self.settings.rate_limit.trust_forwarded_for,
        }
    }
}

impl FromRef<AppState> for UploadSettings {
    fn from_ref(state: &AppState) -> Self {
        state.settings.uploads.clone()
    }
}

/// Build the token verifier described by the `auth` settings.
pub fn build_verifier(auth: &AuthSettings) -> anyhow::Result<Arc<dyn JwtValidator>> {
    let algorithm: JwtAlgorithm = auth.algorithm.parse()?;
    let config = VerifierConfig {
        algorithm,
        secret: auth.secret.clone(),
        public_key_pem: auth.public_key_pem.clone(),
        issuer: auth.issuer.clone(),
        audience: auth.audience.clone(),
    };
    Ok(Arc::new(JwtVerifier::new(&config)?))
}
