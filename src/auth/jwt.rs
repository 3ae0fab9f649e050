use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

/// Sessions are bearer JWTs with a fixed lifetime. Nothing is persisted
/// server-side, so expiry is the only revocation.
pub const SESSION_TTL_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.jwt.secret)
    }
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs a session token for `user_id`.
    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + Duration::days(SESSION_TTL_DAYS);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "session token issued");
        Ok(token)
    }

    /// Decodes and validates a session token. Every failure mode, from a bad
    /// signature to plain garbage, comes back as `None`; callers treat it as
    /// "unauthenticated", never as a server error.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => {
                debug!(user_id = %data.claims.sub, "session token verified");
                Some(data.claims)
            }
            Err(e) => {
                debug!(error = %e, "session token rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> SessionKeys {
        SessionKeys::new("dev-secret")
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("issue");
        let claims = keys.verify(&token).expect("token should verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(
            claims.exp - claims.iat,
            Duration::days(SESSION_TTL_DAYS).whole_seconds() as usize
        );
    }

    #[test]
    fn verify_returns_none_for_garbage() {
        assert!(keys().verify("not-a-token").is_none());
        assert!(keys().verify("").is_none());
    }

    #[test]
    fn verify_returns_none_for_wrong_secret() {
        let token = keys().issue(Uuid::new_v4()).expect("issue");
        assert!(SessionKeys::new("other-secret").verify(&token).is_none());
    }

    #[test]
    fn verify_returns_none_after_expiry() {
        let keys = keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        // A day past expiry, well beyond jsonwebtoken's default leeway.
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (now - Duration::days(31).whole_seconds()) as usize,
            exp: (now - Duration::days(1).whole_seconds()) as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_none());
    }
}
