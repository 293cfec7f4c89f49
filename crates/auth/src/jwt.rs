use core::str::FromStr;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::claims::{TokenClaims, TokenValidationError, validate_claims};

/// Verifies a bearer token and returns its claims.
///
/// `now` is injected so time checks stay deterministic in tests.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenValidationError>;
}

/// Supported signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtAlgorithm {
    /// Shared secret. Development and tests.
    Hs256,
    /// Provider public key (PEM).
    Rs256,
}

impl FromStr for JwtAlgorithm {
    type Err = TokenValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Ok(Self::Hs256),
            "RS256" => Ok(Self::Rs256),
            other => Err(TokenValidationError::InvalidKey(format!(
                "unsupported algorithm '{other}'"
            ))),
        }
    }
}

/// Key material and expectations for [`JwtVerifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    pub algorithm: JwtAlgorithm,
    /// HS256 shared secret.
    pub secret: Option<String>,
    /// RS256 public key in PEM form.
    pub public_key_pem: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl VerifierConfig {
    pub fn hs256(secret: impl Into<String>) -> Self {
        Self {
            algorithm: JwtAlgorithm::Hs256,
            secret: Some(secret.into()),
            public_key_pem: None,
            issuer: None,
            audience: None,
        }
    }

    pub fn rs256(public_key_pem: impl Into<String>) -> Self {
        Self {
            algorithm: JwtAlgorithm::Rs256,
            secret: None,
            public_key_pem: Some(public_key_pem.into()),
            issuer: None,
            audience: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

/// `jsonwebtoken`-backed validator.
///
/// Signature, issuer and audience are checked by `jsonwebtoken`; the time
/// window is checked by [`validate_claims`] against the injected clock.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &VerifierConfig) -> Result<Self, TokenValidationError> {
        let (key, algorithm) = match config.algorithm {
            JwtAlgorithm::Hs256 => {
                let secret = config
                    .secret
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| TokenValidationError::InvalidKey("HS256 requires a secret".into()))?;
                (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
            }
            JwtAlgorithm::Rs256 => {
                let pem = config
                    .public_key_pem
                    .as_deref()
                    .ok_or_else(|| TokenValidationError::InvalidKey("RS256 requires a public key".into()))?;
                let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| TokenValidationError::InvalidKey(e.to_string()))?;
                (key, Algorithm::RS256)
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();
        match &config.issuer {
            Some(iss) => validation.set_issuer(&[iss]),
            None => validation.iss = None,
        }
        match &config.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Ok(Self { key, validation })
    }
}

impl JwtValidator for JwtVerifier {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            match e.kind() {
                ErrorKind::InvalidSignature => TokenValidationError::InvalidSignature,
                ErrorKind::InvalidIssuer => TokenValidationError::InvalidIssuer,
                ErrorKind::InvalidAudience => TokenValidationError::InvalidAudience,
                ErrorKind::ExpiredSignature => TokenValidationError::Expired,
                ErrorKind::ImmatureSignature => TokenValidationError::NotYetValid,
                _ => TokenValidationError::Malformed(e.to_string()),
            }
        })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
