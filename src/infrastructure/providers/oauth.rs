use async_trait::async_trait;
use serde::Deserialize;

use super::http;
use crate::config::settings::{OAuthClient, ProviderConfig};
use crate::modules::generation::error::ProviderError;
use crate::modules::generation::model::Provider;
use crate::modules::integration::refresh::{RefreshedToken, TokenRefresher};

/// Refreshes YouTube and TikTok tokens with the app's OAuth client
/// credentials. Facebook page tokens are long-lived and cannot be refreshed.
pub struct OAuthRefresher {
    client: reqwest::Client,
    google_token_url: String,
    youtube: Option<OAuthClient>,
    tiktok_token_url: String,
    tiktok: Option<OAuthClient>,
}

impl OAuthRefresher {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            google_token_url: config.google_token_url.clone(),
            youtube: config.youtube_oauth.clone(),
            tiktok_token_url: format!(
                "{}/v2/oauth/token/",
                config.tiktok_api_url.trim_end_matches('/')
            ),
            tiktok: config.tiktok_oauth.clone(),
        }
    }

    async fn exchange(&self, url: &str, form: &[(&str, &str)]) -> Result<RefreshedToken, ProviderError> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(http::transport)?;
        let body: TokenResponse = http::decode(response).await?;
        body.into_token()
    }
}

fn configured(platform: Provider, client: Option<&OAuthClient>) -> Result<&OAuthClient, ProviderError> {
    client.ok_or_else(|| ProviderError::Rejected(format!("no OAuth client configured for {}", platform)))
}

/// Google and TikTok both answer with this shape. TikTok reports a refused
/// grant with a 200 and an `error` field.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    fn into_token(self) -> Result<RefreshedToken, ProviderError> {
        match (self.access_token, self.error) {
            (Some(access_token), None) => Ok(RefreshedToken {
                access_token,
                refresh_token: self.refresh_token,
                expires_in: self.expires_in,
            }),
            (_, error) => Err(ProviderError::Rejected(format!(
                "{}: {}",
                error.unwrap_or_else(|| "no_access_token".to_string()),
                self.error_description.unwrap_or_default()
            ))),
        }
    }
}

#[async_trait]
impl TokenRefresher for OAuthRefresher {
    async fn refresh(&self, platform: Provider, refresh_token: &str) -> Result<RefreshedToken, ProviderError> {
        match platform {
            Provider::YouTube => {
                let app = configured(platform, self.youtube.as_ref())?;
                self.exchange(
                    &self.google_token_url,
                    &[
                        ("client_id", app.client_id.as_str()),
                        ("client_secret", app.client_secret.as_str()),
                        ("grant_type", "refresh_token"),
                        ("refresh_token", refresh_token),
                    ],
                )
                .await
            }
            Provider::TikTok => {
                let app = configured(platform, self.tiktok.as_ref())?;
                self.exchange(
                    &self.tiktok_token_url,
                    &[
                        ("client_key", app.client_id.as_str()),
                        ("client_secret", app.client_secret.as_str()),
                        ("grant_type", "refresh_token"),
                        ("refresh_token", refresh_token),
                    ],
                )
                .await
            }
            other => Err(ProviderError::Rejected(format!("{} tokens cannot be refreshed", other))),
        }
    }
}
