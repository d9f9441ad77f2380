use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

/// Purpose tag baked into every issued token. Anything else fails `verify`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Auth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,           // user ID
    pub iat: usize,          // issued at (unix timestamp)
    pub purpose: TokenPurpose,
}

/// Holds the process-wide signing and verification keys.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl FromRef<AppState> for AuthKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_secret(&state.config.auth.secret)
    }
}

impl AuthKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a signed token binding the user id and the `auth` purpose tag.
    /// Tokens carry no expiry; one stays valid until its session row is
    /// removed.
    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id,
            iat: OffsetDateTime::now_utc().unix_timestamp() as usize,
            purpose: TokenPurpose::Auth,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "token signed");
        Ok(token)
    }

    /// Stateless check: signature and purpose tag only. Membership in the
    /// live session set is the extractor's separate, stateful step.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = AuthKeys::from_secret("dev-secret");
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.purpose, TokenPurpose::Auth);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let keys = AuthKeys::from_secret("dev-secret");
        let other = AuthKeys::from_secret("other-secret");
        let token = keys.sign(Uuid::new_v4()).expect("sign");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_spliced_signature() {
        let keys = AuthKeys::from_secret("dev-secret");
        let a = keys.sign(Uuid::new_v4()).expect("sign");
        let b = keys.sign(Uuid::new_v4()).expect("sign");
        let a: Vec<&str> = a.split('.').collect();
        let b: Vec<&str> = b.split('.').collect();
        // payload of one token with the signature of another
        let forged = format!("{}.{}.{}", a[0], a[1], b[2]);
        assert!(keys.verify(&forged).is_err());
    }

    #[test]
    fn verify_rejects_foreign_purpose() {
        #[derive(Serialize)]
        struct ForeignClaims {
            sub: Uuid,
            iat: usize,
            purpose: String,
        }
        let secret = "dev-secret";
        let claims = ForeignClaims {
            sub: Uuid::new_v4(),
            iat: 0,
            purpose: "refresh".into(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode");
        let keys = AuthKeys::from_secret(secret);
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_malformed_token() {
        let keys = AuthKeys::from_secret("dev-secret");
        assert!(keys.verify("not-a-token").is_err());
        assert!(keys.verify("").is_err());
    }
}
