use std::sync::Arc;
use tracing::info;

use crate::config::settings::ProviderConfig;
use crate::modules::generation::model::Provider;
use crate::modules::generation::provider::AdapterRegistry;

pub mod http;
pub mod meta;
pub mod musicgpt;
pub mod oauth;
pub mod suno;
pub mod tiktok;
pub mod video;
pub mod youtube;

use meta::FacebookAdapter;
use musicgpt::MusicGptAdapter;
use suno::SunoAdapter;
use tiktok::TikTokAdapter;
use video::VideoTaskAdapter;
use oauth::OAuthRefresher;
use youtube::{UploadLimits, YouTubeAdapter};

/// Builds every adapter once at startup. Key-based vendors without a key are
/// left out; publishing platforms use per-user tokens and are always present.
pub fn build_registry(config: &ProviderConfig) -> anyhow::Result<AdapterRegistry> {
    let client = http::client(config.timeout())?;
    let mut registry = AdapterRegistry::new();

    if let Some(suno) = &config.suno {
        registry.register(Arc::new(SunoAdapter::new(client.clone(), suno)));
    }
    if let Some(musicgpt) = &config.musicgpt {
        registry.register(Arc::new(MusicGptAdapter::new(client.clone(), musicgpt)));
    }

    let video_vendors = [
        (Provider::Kling, &config.kling),
        (Provider::Runway, &config.runway),
        (Provider::InVideo, &config.invideo),
    ];
    for (provider, vendor) in video_vendors {
        if let Some(vendor) = vendor {
            registry.register(Arc::new(VideoTaskAdapter::new(provider, client.clone(), vendor)));
        }
    }

    // Uploads relay whole videos and get a client with their own budget.
    let youtube_client = http::client(config.youtube_upload_timeout())?;
    registry
        .register(Arc::new(YouTubeAdapter::new(
            youtube_client,
            &config.youtube_api_url,
            &config.youtube_upload_url,
            UploadLimits {
                max_video_bytes: config.youtube_max_video_bytes,
                timeout: config.youtube_upload_timeout(),
            },
        )))
        .register(Arc::new(TikTokAdapter::new(client.clone(), &config.tiktok_api_url)))
        .register(Arc::new(FacebookAdapter::new(client, &config.facebook_graph_url)));

    let enabled: Vec<&str> = registry.providers().iter().map(|p| p.as_str()).collect();
    info!(providers = ?enabled, "✅ Provider adapters ready");

    Ok(registry)
}

/// Token refresher for platforms whose OAuth client is configured.
pub fn build_refresher(config: &ProviderConfig) -> anyhow::Result<OAuthRefresher> {
    let client = http::client(config.timeout())?;
    info!(
        youtube = config.youtube_oauth.is_some(),
        tiktok = config.tiktok_oauth.is_some(),
        "token refresh configured"
    );
    Ok(OAuthRefresher::new(client, config))
}
