use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http;
use crate::config::settings::VendorConfig;
use crate::modules::generation::error::ProviderError;
use crate::modules::generation::model::{JobParams, Provider, ResultPayload, StemParams};
use crate::modules::generation::provider::{
    PollRequest, ProviderAdapter, ProviderStatus, SubmitOutcome, SubmitRequest,
};

const DEFAULT_DURATION_SECS: i32 = 120;

pub struct MusicGptAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MusicGptAdapter {
    pub fn new(client: reqwest::Client, config: &VendorConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    async fn start(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        if let JobParams::Stems(stems) = request.params {
            return self.separate(stems).await;
        }
        let params = http::music_params(request.params)?;
        let body = GenerateBody {
            prompt: &params.prompt,
            genre: params.genre.as_deref(),
            mood: params.mood.as_deref(),
            duration: params.duration.unwrap_or(DEFAULT_DURATION_SECS),
            instrumental: params.instrumental,
            generate_stems: params.need_stems,
        };

        let response = self
            .client
            .post(format!("{}/v1/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(http::transport)?;
        let created: GenerateResponse = http::decode(response).await?;

        Ok(SubmitOutcome {
            external_id: created.id,
            status: ProviderStatus::Processing,
        })
    }

    // Separation usually answers with both tracks right away; a task id means
    // it is still running and gets polled like a generation.
    async fn separate(&self, params: &StemParams) -> Result<SubmitOutcome, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/stems/separate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SeparateBody {
                audio_url: &params.audio_url,
            })
            .send()
            .await
            .map_err(http::transport)?;
        let separated: SeparateResponse = http::decode(response).await?;
        Ok(separation_outcome(separated))
    }
}

#[derive(Serialize)]
struct SeparateBody<'a> {
    audio_url: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct SeparateResponse {
    id: Option<String>,
    vocals_url: Option<String>,
    instrumental_url: Option<String>,
}

fn separation_outcome(data: SeparateResponse) -> SubmitOutcome {
    match (data.vocals_url, data.instrumental_url, data.id) {
        (Some(vocals), Some(instrumental), id) => SubmitOutcome {
            external_id: id,
            status: ProviderStatus::Completed(ResultPayload {
                vocals_url: Some(vocals),
                instrumental_url: Some(instrumental),
                ..Default::default()
            }),
        },
        (_, _, Some(id)) => SubmitOutcome::accepted(id),
        _ => SubmitOutcome::rejected("MusicGPT returned neither stems nor a task id"),
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    genre: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mood: Option<&'a str>,
    duration: i32,
    instrumental: bool,
    generate_stems: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    audio_urls: Vec<String>,
    stems_url: Option<String>,
    vocals_url: Option<String>,
    instrumental_url: Option<String>,
    duration: Option<f64>,
    error_message: Option<String>,
}

// MusicGPT renders two takes per prompt; the first becomes the primary audio.
fn map_status(data: StatusResponse) -> ProviderStatus {
    match data.status.as_str() {
        "completed" => ProviderStatus::Completed(ResultPayload {
            audio_url: data.audio_urls.first().cloned(),
            audio_urls: data.audio_urls,
            stems_url: data.stems_url,
            vocals_url: data.vocals_url,
            instrumental_url: data.instrumental_url,
            duration_seconds: data.duration,
            ..Default::default()
        }),
        "failed" => ProviderStatus::Failed(
            data.error_message
                .unwrap_or_else(|| "MusicGPT generation failed".to_string()),
        ),
        _ => ProviderStatus::Processing,
    }
}

#[async_trait]
impl ProviderAdapter for MusicGptAdapter {
    fn provider(&self) -> Provider {
        Provider::MusicGpt
    }

    async fn submit(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        http::refusal_as_failure(self.start(request).await)
    }

    async fn poll(&self, request: &PollRequest<'_>) -> Result<ProviderStatus, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/status/{}", self.base_url, request.external_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(http::transport)?;
        let data: StatusResponse = http::decode(response).await?;
        Ok(map_status(data))
    }
}
