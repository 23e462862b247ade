use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Keeps `iat + ttl` far away from chrono's representable range.
const MAX_TTL_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

/// Why a token could not be turned back into a subject.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token expired")]
    Expired,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::BadSignature,
            _ => Self::Malformed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    iss: String,
    iat: i64,
    exp: i64,
}

/// A freshly signed token plus its absolute expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 token issuer/verifier bound to one server secret.
///
/// - Key material is intentionally not printable via Debug.
/// - `leeway_seconds` is the clock-skew tolerance on `exp` (0 = exact).
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], issuer: &str, ttl_seconds: u64, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = leeway_seconds;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: issuer.to_string(),
            ttl: Duration::seconds(
                i64::try_from(ttl_seconds)
                    .unwrap_or(MAX_TTL_SECONDS)
                    .min(MAX_TTL_SECONDS),
            ),
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.num_seconds().max(0) as u64
    }

    /// Issue a token for `username`, valid for the configured TTL from now.
    pub fn issue(&self, username: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(username, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, username: &str, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.ttl;
        let claims = TokenClaims {
            sub: username.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!(error = %e, "failed to sign token");
                TokenError::Signing(e)
            })?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature, issuer and expiry, then return the embedded username.
    pub fn parse_subject(&self, token: &str) -> Result<String, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;

        let sub = data.claims.sub;
        if sub.trim().is_empty() {
            return Err(TokenError::Malformed);
        }

        Ok(sub)
    }

    pub fn validate(&self, token: &str) -> bool {
        self.parse_subject(token).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-testing-only-0123";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, "qa-user-service", 3600, 0)
    }

    #[test]
    fn issued_token_round_trips_to_username() {
        let codec = codec();
        for name in ["alice", "bob.smith", "用户"] {
            let issued = codec.issue(name).unwrap();
            assert_eq!(codec.parse_subject(&issued.token).unwrap(), name);
            assert!(codec.validate(&issued.token));
            assert!(issued.expires_at > Utc::now());
        }
    }

    #[test]
    fn expired_token_fails_validation() {
        let codec = codec();
        let issued = codec
            .issue_at("alice", Utc::now() - Duration::hours(2))
            .unwrap();

        assert!(issued.expires_at < Utc::now());
        assert!(matches!(
            codec.parse_subject(&issued.token),
            Err(TokenError::Expired)
        ));
        assert!(!codec.validate(&issued.token));
    }

    #[test]
    fn leeway_tolerates_small_skew() {
        let lenient = TokenCodec::new(SECRET, "qa-user-service", 60, 120);
        let issued = lenient
            .issue_at("alice", Utc::now() - Duration::seconds(90))
            .unwrap();

        assert!(lenient.validate(&issued.token));
        assert!(!TokenCodec::new(SECRET, "qa-user-service", 60, 0).validate(&issued.token));
    }

    #[test]
    fn tampering_with_any_byte_invalidates_token() {
        let codec = codec();
        let token = codec.issue("alice").unwrap().token;

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(!codec.validate(&tampered), "byte {i} tampered but still valid");
        }
    }

    #[test]
    fn token_signed_with_other_secret_is_bad_signature() {
        let other = TokenCodec::new(b"another-secret-key-for-testing-9876", "qa-user-service", 3600, 0);
        let token = other.issue("alice").unwrap().token;

        assert!(matches!(
            codec().parse_subject(&token),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let other = TokenCodec::new(SECRET, "someone-else", 3600, 0);
        let token = other.issue("alice").unwrap().token;

        assert!(!codec().validate(&token));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        for junk in ["", "abc", "a.b.c", "Bearer x.y.z"] {
            assert!(matches!(
                codec.parse_subject(junk),
                Err(TokenError::Malformed)
            ));
            assert!(!codec.validate(junk));
        }
    }

    #[test]
    fn empty_subject_is_malformed() {
        let codec = codec();
        let token = codec.issue("  ").unwrap().token;
        assert!(matches!(
            codec.parse_subject(&token),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let out = format!("{:?}", codec());
        assert!(!out.contains("test-secret"));
    }
}
