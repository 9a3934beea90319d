use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::http;
use crate::config::settings::VendorConfig;
use crate::modules::generation::error::ProviderError;
use crate::modules::generation::model::{Provider, ResultPayload};
use crate::modules::generation::provider::{
    PollRequest, ProviderAdapter, ProviderStatus, SubmitOutcome, SubmitRequest,
};

/// Task-style video generation API shared by Kling, Runway and InVideo.
/// Each vendor gets its own instance with its own base URL and key.
pub struct VideoTaskAdapter {
    provider: Provider,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl VideoTaskAdapter {
    pub fn new(provider: Provider, client: reqwest::Client, config: &VendorConfig) -> Self {
        Self {
            provider,
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}/v1/videos/generations", self.base_url)
    }

    async fn start(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        let params = http::video_params(request.params)?;
        let body = TaskBody {
            prompt: &params.prompt,
            audio_url: params.music_url.as_deref(),
            style: params.style.as_deref(),
            resolution: params.resolution.as_deref().unwrap_or("1080p"),
            client_reference_id: request.job_id,
        };

        let response = self
            .client
            .post(self.tasks_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(http::transport)?;
        let task: TaskResponse = http::decode(response).await?;

        tracing::debug!(provider = %self.provider, external_id = ?task.id, "video task created");
        // Some vendors answer synchronously for cached renders.
        let external_id = task.id.clone();
        let status = match task.status.clone() {
            Some(status) => map_status(&status, task),
            None => ProviderStatus::Processing,
        };
        Ok(SubmitOutcome { external_id, status })
    }
}

#[derive(Serialize)]
struct TaskBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
    resolution: &'a str,
    client_reference_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TaskResponse {
    #[serde(alias = "task_id")]
    id: Option<String>,
    status: Option<String>,
    video_url: Option<String>,
    thumbnail_url: Option<String>,
    duration: Option<f64>,
    #[serde(alias = "error")]
    error_message: Option<String>,
}

fn map_status(status: &str, task: TaskResponse) -> ProviderStatus {
    match status.to_ascii_lowercase().as_str() {
        "succeeded" | "completed" | "complete" => {
            let mut payload = ResultPayload {
                video_url: task.video_url,
                duration_seconds: task.duration,
                ..Default::default()
            };
            if let Some(thumbnail) = task.thumbnail_url {
                payload.extra.insert("thumbnailUrl".into(), thumbnail.into());
            }
            ProviderStatus::Completed(payload)
        }
        "failed" | "error" | "cancelled" => ProviderStatus::Failed(
            task.error_message
                .unwrap_or_else(|| "Video generation failed".to_string()),
        ),
        _ => ProviderStatus::Processing,
    }
}

#[async_trait]
impl ProviderAdapter for VideoTaskAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn submit(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        http::refusal_as_failure(self.start(request).await)
    }

    async fn poll(&self, request: &PollRequest<'_>) -> Result<ProviderStatus, ProviderError> {
        let response = self
            .client
            .get(format!("{}/{}", self.tasks_url(), request.external_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(http::transport)?;
        let task: TaskResponse = http::decode(response).await?;
        let status = task.status.clone().unwrap_or_default();
        Ok(map_status(&status, task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeded_task_carries_video_and_thumbnail() {
        let task = TaskResponse {
            video_url: Some("https://cdn/v.mp4".into()),
            thumbnail_url: Some("https://cdn/t.jpg".into()),
            ..Default::default()
        };
        let ProviderStatus::Completed(payload) = map_status("SUCCEEDED", task) else {
            panic!("expected completed");
        };
        assert_eq!(payload.video_url.as_deref(), Some("https://cdn/v.mp4"));
        assert_eq!(payload.extra["thumbnailUrl"], "https://cdn/t.jpg");
    }

    #[test]
    fn cancelled_task_is_failed() {
        let status = map_status("cancelled", TaskResponse::default());
        assert_eq!(status, ProviderStatus::Failed("Video generation failed".into()));
    }

    #[test]
    fn queued_and_running_are_processing() {
        assert_eq!(map_status("queued", TaskResponse::default()), ProviderStatus::Processing);
        assert_eq!(map_status("running", TaskResponse::default()), ProviderStatus::Processing);
    }

    #[test]
    fn task_id_alias_is_accepted() {
        let task: TaskResponse = serde_json::from_value(serde_json::json!({ "task_id": "t-1" })).unwrap();
        assert_eq!(task.id.as_deref(), Some("t-1"));
    }
}
