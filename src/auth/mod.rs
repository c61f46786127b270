//! Auth Module
//!
//! Bearer tokens for outbound Firestore requests.
//!
//! # Sources
//! - [`ServiceAccountTokenProvider`]: OAuth2 JWT-bearer grant with a service-account key
//! - [`StaticToken`]: fixed token, used against the Firestore emulator

mod service_account;

use async_trait::async_trait;

use crate::error::Result;

pub use service_account::{ServiceAccountTokenProvider, DATASTORE_SCOPE, REFRESH_SKEW_SECS};

/// Supplies bearer tokens for outbound requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns a token valid for at least the next request.
    async fn token(&self) -> Result<String>;

    /// Drops any cached token so the next call fetches a fresh one.
    async fn invalidate(&self);
}

// == Static Token ==
/// Always hands out the same token.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl StaticToken {
    /// Token the Firestore emulator accepts as an admin.
    pub fn emulator() -> Self {
        Self("owner".to_string())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    async fn invalidate(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let source = StaticToken::emulator();
        assert_eq!(source.token().await.unwrap(), "owner");
        source.invalidate().await;
        assert_eq!(source.token().await.unwrap(), "owner");
    }
}
