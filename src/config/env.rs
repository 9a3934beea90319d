use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    RedisUrl,
    JwtSecret,
    ProviderTimeoutSecs,
    ProviderPollAttempts,
    ProviderRetryBaseMs,
    SunoApiUrl,
    SunoApiKey,
    MusicGptApiUrl,
    MusicGptApiKey,
    KlingApiUrl,
    KlingApiKey,
    RunwayApiUrl,
    RunwayApiKey,
    InVideoApiUrl,
    InVideoApiKey,
    YouTubeApiUrl,
    YouTubeUploadUrl,
    YouTubeUploadTimeoutSecs,
    YouTubeMaxVideoBytes,
    YouTubeClientId,
    YouTubeClientSecret,
    GoogleTokenUrl,
    TikTokApiUrl,
    TikTokClientKey,
    TikTokClientSecret,
    FacebookGraphUrl,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::RedisUrl => "REDIS_URL",
            EnvKey::JwtSecret => "JWT_SECRET",
            EnvKey::ProviderTimeoutSecs => "PROVIDER_TIMEOUT_SECS",
            EnvKey::ProviderPollAttempts => "PROVIDER_POLL_ATTEMPTS",
            EnvKey::ProviderRetryBaseMs => "PROVIDER_RETRY_BASE_MS",
            EnvKey::SunoApiUrl => "SUNO_API_URL",
            EnvKey::SunoApiKey => "SUNO_API_KEY",
            EnvKey::MusicGptApiUrl => "MUSICGPT_API_URL",
            EnvKey::MusicGptApiKey => "MUSICGPT_API_KEY",
            EnvKey::KlingApiUrl => "KLING_API_URL",
            EnvKey::KlingApiKey => "KLING_API_KEY",
            EnvKey::RunwayApiUrl => "RUNWAY_API_URL",
            EnvKey::RunwayApiKey => "RUNWAY_API_KEY",
            EnvKey::InVideoApiUrl => "INVIDEO_API_URL",
            EnvKey::InVideoApiKey => "INVIDEO_API_KEY",
            EnvKey::YouTubeApiUrl => "YOUTUBE_API_URL",
            EnvKey::YouTubeUploadUrl => "YOUTUBE_UPLOAD_URL",
            EnvKey::YouTubeUploadTimeoutSecs => "YOUTUBE_UPLOAD_TIMEOUT_SECS",
            EnvKey::YouTubeMaxVideoBytes => "YOUTUBE_MAX_VIDEO_BYTES",
            EnvKey::YouTubeClientId => "YOUTUBE_CLIENT_ID",
            EnvKey::YouTubeClientSecret => "YOUTUBE_CLIENT_SECRET",
            EnvKey::GoogleTokenUrl => "GOOGLE_TOKEN_URL",
            EnvKey::TikTokApiUrl => "TIKTOK_API_URL",
            EnvKey::TikTokClientKey => "TIKTOK_CLIENT_KEY",
            EnvKey::TikTokClientSecret => "TIKTOK_CLIENT_SECRET",
            EnvKey::FacebookGraphUrl => "FACEBOOK_GRAPH_URL",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank values both count as missing.
pub fn get_optional(key: EnvKey) -> Option<String> {
    env::var(key.as_str())
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
