use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http;
use crate::config::settings::VendorConfig;
use crate::modules::generation::error::ProviderError;
use crate::modules::generation::model::{Provider, ResultPayload};
use crate::modules::generation::provider::{
    PollRequest, ProviderAdapter, ProviderStatus, SubmitOutcome, SubmitRequest,
};

pub struct SunoAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SunoAdapter {
    pub fn new(client: reqwest::Client, config: &VendorConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    async fn start(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        let params = http::music_params(request.params)?;
        let tags: Vec<&str> = [params.genre.as_deref(), params.mood.as_deref()]
            .into_iter()
            .flatten()
            .collect();

        let body = GenerateBody {
            prompt: &params.prompt,
            make_instrumental: params.instrumental,
            custom_mode: params.custom_lyrics.is_some(),
            lyrics: params.custom_lyrics.as_deref(),
            tags: (!tags.is_empty()).then(|| tags.join(", ")),
            wait_audio: false,
        };

        let response = self
            .client
            .post(format!("{}/v1/music/generate", self.base_url))
            .header("X-API-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(http::transport)?;
        let created: GenerateResponse = http::decode(response).await?;

        tracing::debug!(job_id = %request.job_id, external_id = ?created.id, "Suno accepted generation");
        Ok(SubmitOutcome {
            external_id: created.id,
            status: ProviderStatus::Processing,
        })
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    make_instrumental: bool,
    custom_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    lyrics: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<String>,
    wait_audio: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusResponse {
    status: String,
    audio_url: Option<String>,
    video_url: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    error_message: Option<String>,
}

fn map_status(data: StatusResponse) -> ProviderStatus {
    match data.status.as_str() {
        "complete" => ProviderStatus::Completed(ResultPayload {
            audio_url: data.audio_url,
            video_url: data.video_url,
            title: data.title,
            duration_seconds: data.duration,
            ..Default::default()
        }),
        "error" => ProviderStatus::Failed(
            data.error_message
                .unwrap_or_else(|| "Suno generation failed".to_string()),
        ),
        _ => ProviderStatus::Processing,
    }
}

#[async_trait]
impl ProviderAdapter for SunoAdapter {
    fn provider(&self) -> Provider {
        Provider::Suno
    }

    async fn submit(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        http::refusal_as_failure(self.start(request).await)
    }

    async fn poll(&self, request: &PollRequest<'_>) -> Result<ProviderStatus, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/music/{}", self.base_url, request.external_id))
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(http::transport)?;
        let data: StatusResponse = http::decode(response).await?;
        Ok(map_status(data))
    }
}
