use serde::Deserialize;
use std::time::Duration;
use crate::config::env::{self, EnvKey};

/// Base URL plus API key for a vendor that authenticates with a server-side key.
#[derive(Clone, Debug, Deserialize)]
pub struct VendorConfig {
    pub base_url: String,
    pub api_key: String,
}

/// App credentials used to refresh users' platform tokens.
#[derive(Clone, Debug, Deserialize)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
}

/// Outbound provider settings, built once at startup and handed to each adapter.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
    pub timeout_secs: u64,
    pub poll_attempts: u32,
    pub retry_base_ms: u64,
    pub suno: Option<VendorConfig>,
    pub musicgpt: Option<VendorConfig>,
    pub kling: Option<VendorConfig>,
    pub runway: Option<VendorConfig>,
    pub invideo: Option<VendorConfig>,
    pub youtube_api_url: String,
    pub youtube_upload_url: String,
    pub youtube_upload_timeout_secs: u64,
    pub youtube_max_video_bytes: u64,
    pub youtube_oauth: Option<OAuthClient>,
    pub google_token_url: String,
    pub tiktok_api_url: String,
    pub tiktok_oauth: Option<OAuthClient>,
    pub facebook_graph_url: String,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self {
            timeout_secs: env::get_parsed(EnvKey::ProviderTimeoutSecs, 30),
            poll_attempts: env::get_parsed(EnvKey::ProviderPollAttempts, 2),
            retry_base_ms: env::get_parsed(EnvKey::ProviderRetryBaseMs, 250),
            suno: vendor(EnvKey::SunoApiUrl, "https://api.goapi.ai/suno", EnvKey::SunoApiKey),
            musicgpt: vendor(EnvKey::MusicGptApiUrl, "https://api.musicgpt.com", EnvKey::MusicGptApiKey),
            kling: vendor(EnvKey::KlingApiUrl, "https://api.klingai.com", EnvKey::KlingApiKey),
            runway: vendor(EnvKey::RunwayApiUrl, "https://api.runwayml.com", EnvKey::RunwayApiKey),
            invideo: vendor(EnvKey::InVideoApiUrl, "https://api.invideo.io", EnvKey::InVideoApiKey),
            youtube_api_url: env::get_or(EnvKey::YouTubeApiUrl, "https://www.googleapis.com/youtube/v3"),
            youtube_upload_url: env::get_or(EnvKey::YouTubeUploadUrl, "https://www.googleapis.com/upload/youtube/v3"),
            youtube_upload_timeout_secs: env::get_parsed(EnvKey::YouTubeUploadTimeoutSecs, 900),
            youtube_max_video_bytes: env::get_parsed(EnvKey::YouTubeMaxVideoBytes, 2 * 1024 * 1024 * 1024),
            youtube_oauth: oauth_client(EnvKey::YouTubeClientId, EnvKey::YouTubeClientSecret),
            google_token_url: env::get_or(EnvKey::GoogleTokenUrl, "https://oauth2.googleapis.com/token"),
            tiktok_api_url: env::get_or(EnvKey::TikTokApiUrl, "https://open.tiktokapis.com"),
            tiktok_oauth: oauth_client(EnvKey::TikTokClientKey, EnvKey::TikTokClientSecret),
            facebook_graph_url: env::get_or(EnvKey::FacebookGraphUrl, "https://graph.facebook.com/v18.0"),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }

    /// Budget for downloading a source video and re-uploading it to YouTube.
    pub fn youtube_upload_timeout(&self) -> Duration {
        Duration::from_secs(self.youtube_upload_timeout_secs)
    }
}

// A vendor without an API key stays unconfigured and its adapter is not registered.
fn vendor(url_key: EnvKey, default_url: &str, key_key: EnvKey) -> Option<VendorConfig> {
    env::get_optional(key_key).map(|api_key| VendorConfig {
        base_url: env::get_or(url_key, default_url).trim_end_matches('/').to_string(),
        api_key,
    })
}

// Token refresh for a platform is off unless both halves are set.
fn oauth_client(id_key: EnvKey, secret_key: EnvKey) -> Option<OAuthClient> {
    Some(OAuthClient {
        client_id: env::get_optional(id_key)?,
        client_secret: env::get_optional(secret_key)?,
    })
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub providers: ProviderConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            database_url: env::get(EnvKey::DatabaseUrl)?,
            redis_url: env::get(EnvKey::RedisUrl)?,
            jwt_secret: env::get(EnvKey::JwtSecret)?,
            providers: ProviderConfig::from_env(),
        })
    }
}
