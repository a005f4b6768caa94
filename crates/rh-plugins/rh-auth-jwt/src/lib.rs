//! # rh-auth-jwt
//!
//! HS256 JWT implementation of `SessionProvider`.
//! The token is what the identity-provider sign-in flow hands to the browser;
//! it carries the subject id and the public profile fields.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rh_core::models::Identity;
use rh_core::traits::SessionProvider;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Claims of a session token. Field names follow the identity providers'
/// conventions (`picture` rather than `image`).
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    picture: Option<String>,
    iat: i64,
    exp: i64,
}

// Ten years; keeps `now + ttl` far from chrono's range limits.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

pub struct JwtSessionProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtSessionProvider {
    /// `ttl_secs` bounds how long an issued token stays valid.
    pub fn new(secret: &SecretString, ttl_secs: u64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            validation: Validation::new(Algorithm::HS256),
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
        }
    }

    fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> anyhow::Result<String> {
        let claims = SessionClaims {
            sub: identity.id.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            picture: identity.image.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }
}

impl SessionProvider for JwtSessionProvider {
    fn resolve(&self, token: &str) -> Option<Identity> {
        match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => Some(Identity {
                id: data.claims.sub,
                name: data.claims.name,
                email: data.claims.email,
                image: data.claims.picture,
            }),
            Ok(_) => None,
            Err(e) => {
                // Expired or forged tokens are an ordinary anonymous request.
                debug!(error = %e, "session token rejected");
                None
            }
        }
    }

    fn issue(&self, identity: &Identity) -> anyhow::Result<String> {
        self.issue_at(identity, Utc::now())
    }
}
