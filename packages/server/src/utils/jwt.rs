use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Claims of a signed OAuth `state` parameter.
#[derive(Debug, Serialize, Deserialize)]
pub struct StateClaims {
    pub nonce: String, // Also stored in the oauth_state cookie
    pub exp: usize,    // Expiration timestamp
}

/// How long a login attempt may take at the provider.
const STATE_TTL_MINUTES: i64 = 10;

/// Sign a new OAuth state token for `nonce`.
pub fn sign_state(nonce: &str, secret: &str) -> Result<String> {
    let expiration = (Utc::now() + Duration::minutes(STATE_TTL_MINUTES)).timestamp();

    let claims = StateClaims {
        nonce: nonce.to_owned(),
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode an OAuth state token.
pub fn verify_state(token: &str, secret: &str) -> Result<StateClaims> {
    let token_data = decode::<StateClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
