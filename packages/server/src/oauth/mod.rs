//! Client side of the OAuth authorization-code flow.

mod github;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub use github::GithubProvider;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid provider URL: {0}")]
    Url(String),

    #[error("Provider rejected the request with status {status}")]
    Rejected { status: u16 },

    #[error("Provider denied authorization: {0}")]
    Denied(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Identity returned by the provider's profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderProfile {
    /// Stable account identifier. Providers send it as a number or a string.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub login: String,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// An OAuth identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL of the provider's authorization page for the given `state`.
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError>;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError>;

    /// Fetch the profile of the account that owns `access_token`.
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, OAuthError>;
}
