//! Service-account token provider
//!
//! Signs an RS256 assertion with the service-account key, exchanges it at the
//! key's token URI, and caches the access token until shortly before expiry.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::TokenSource;
use crate::credentials::ServiceAccountKey;
use crate::error::{AppError, Result};
use crate::retry::RetryPolicy;

/// OAuth scope granting Firestore access.
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Tokens are refreshed this many seconds before they expire.
pub const REFRESH_SKEW_SECS: i64 = 60;

/// Longest token lifetime honored, whatever the token endpoint reports.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

const ASSERTION_LIFETIME_SECS: i64 = 3600;
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn new(value: String, now: DateTime<Utc>, expires_in: i64) -> Self {
        Self {
            value,
            expires_at: now + Duration::seconds(expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS)),
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_SKEW_SECS) < self.expires_at
    }
}

// == Service Account Token Provider ==
/// OAuth2 access tokens for a service account.
pub struct ServiceAccountTokenProvider {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: Client,
    retry: RetryPolicy,
    scope: String,
    // Held across the refresh so concurrent callers wait for one exchange.
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenProvider {
    /// Builds a provider, failing early if the private key is not a usable RSA PEM.
    pub fn new(key: ServiceAccountKey, client: Client, retry: RetryPolicy) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AppError::Credentials(format!("invalid private key: {}", e)))?;

        Ok(Self {
            key,
            encoding_key,
            client,
            retry,
            scope: DATASTORE_SCOPE.to_string(),
            cached: Mutex::new(None),
        })
    }

    /// Builds the signed JWT assertion for `now`.
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            sub: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        if !self.key.private_key_id.is_empty() {
            header.kid = Some(self.key.private_key_id.clone());
        }

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AppError::Credentials(format!("cannot sign assertion: {}", e)))
    }

    async fn exchange(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Unavailable(format!("token endpoint: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("token endpoint returned {}: {}", status, body);
            return Err(if is_transient_status(status) {
                AppError::Unavailable(message)
            } else {
                AppError::Auth(message)
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("malformed token response: {}", e)))?;

        Ok(CachedToken::new(token.access_token, now, token.expires_in))
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenProvider {
    async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
            debug!("Access token near expiry, refreshing");
        }

        let fresh = self
            .retry
            .run("token exchange", move || self.exchange())
            .await?;
        info!(
            "Obtained access token for {} (expires {})",
            self.key.client_email,
            fresh.expires_at.to_rfc3339()
        );

        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

/// 429 and 5xx are worth retrying.
pub(crate) fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
