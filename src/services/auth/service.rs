use std::sync::Arc;
use std::time::Duration;

use crate::services::auth::principal::{Principal, PrincipalError, PrincipalLoader};
use crate::services::auth::token_codec::TokenCodec;

/// Token codec + principal lookup, shared by the auth filter and the login handler.
#[derive(Clone)]
pub struct AuthService {
    codec: TokenCodec,
    principals: Arc<dyn PrincipalLoader>,
    lookup_timeout: Duration,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("codec", &self.codec)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}

impl AuthService {
    pub fn new(
        codec: TokenCodec,
        principals: Arc<dyn PrincipalLoader>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            codec,
            principals,
            lookup_timeout,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Principal lookup bounded by `lookup_timeout`.
    ///
    /// Timeouts and store failures are logged and collapse into `NotFound`:
    /// callers fail closed to "unauthenticated".
    pub async fn load_principal(&self, username: &str) -> Result<Principal, PrincipalError> {
        match tokio::time::timeout(self.lookup_timeout, self.principals.load(username)).await {
            Ok(Ok(principal)) => Ok(principal),
            Ok(Err(PrincipalError::NotFound)) => Err(PrincipalError::NotFound),
            Ok(Err(err)) => {
                tracing::warn!(username, error = %err, "principal lookup failed");
                Err(PrincipalError::NotFound)
            }
            Err(_) => {
                tracing::warn!(
                    username,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "principal lookup timed out"
                );
                Err(PrincipalError::NotFound)
            }
        }
    }
}
