use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{IdentityProvider, OAuthError, ProviderProfile};
use crate::config::OAuthConfig;

/// GitHub-compatible OAuth provider.
///
/// Endpoints come from configuration, so any provider following GitHub's
/// token and `/user` response shapes works.
pub struct GithubProvider {
    client: Client,
    config: OAuthConfig,
}

/// Token endpoint reply. Errors arrive with status 200 and an `error` field.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl GithubProvider {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl IdentityProvider for GithubProvider {
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("scope", self.config.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| OAuthError::Url(e.to_string()))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let res = self
            .client
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.config.user_agent)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            warn!(status = res.status().as_u16(), "Token exchange rejected");
            return Err(OAuthError::Rejected {
                status: res.status().as_u16(),
            });
        }

        let body: TokenResponse = res
            .json()
            .await
            .map_err(|e| OAuthError::InvalidResponse(e.to_string()))?;

        if let Some(error) = body.error {
            let detail = body.error_description.unwrap_or_default();
            return Err(OAuthError::Denied(format!("{error}: {detail}")));
        }

        body.access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OAuthError::InvalidResponse("missing access_token".into()))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, OAuthError> {
        let res = self
            .client
            .get(&self.config.profile_url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await?;

        if !res.status().is_success() {
            warn!(status = res.status().as_u16(), "Profile request rejected");
            return Err(OAuthError::Rejected {
                status: res.status().as_u16(),
            });
        }

        let profile: ProviderProfile = res
            .json()
            .await
            .map_err(|e| OAuthError::InvalidResponse(e.to_string()))?;
        debug!(provider_id = %profile.id, login = %profile.login, "Fetched provider profile");

        Ok(profile)
    }
}
