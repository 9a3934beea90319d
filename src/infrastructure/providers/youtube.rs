use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::http;
use crate::modules::generation::error::ProviderError;
use crate::modules::generation::model::{Provider, ResultPayload};
use crate::modules::generation::provider::{
    PollRequest, ProviderAdapter, ProviderStatus, SubmitOutcome, SubmitRequest,
};

// "Music" in the YouTube category list.
const MUSIC_CATEGORY_ID: &str = "10";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Size and time limits for relaying a video into YouTube.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_video_bytes: u64,
    pub timeout: Duration,
}

pub struct YouTubeAdapter {
    client: reqwest::Client,
    api_url: String,
    upload_url: String,
    limits: UploadLimits,
}

impl YouTubeAdapter {
    /// `client` must not carry a total timeout shorter than `limits.timeout`.
    pub fn new(client: reqwest::Client, api_url: &str, upload_url: &str, limits: UploadLimits) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            upload_url: upload_url.trim_end_matches('/').to_string(),
            limits,
        }
    }

    async fn start(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        let params = http::publication_params(request.params)?;
        let token = http::bearer(request.access_token.as_deref())?;

        // 1. Open the rendered video. Its body is relayed, never buffered.
        let source = self
            .client
            .get(&params.video_url)
            .send()
            .await
            .map_err(http::transport)?;
        let source = http::ensure_success(source).await?;
        let length = check_source_size(source.content_length(), self.limits.max_video_bytes)?;

        // 2. Open a resumable upload session carrying the metadata.
        let metadata = json!({
            "snippet": {
                "title": params.title,
                "description": params.description,
                "tags": params.tags,
                "categoryId": MUSIC_CATEGORY_ID,
            },
            "status": {
                "privacyStatus": params.privacy.as_deref().unwrap_or("public"),
            },
        });
        let session = self
            .client
            .post(format!(
                "{}/videos?uploadType=resumable&part=snippet,status",
                self.upload_url
            ))
            .bearer_auth(token)
            .header("X-Upload-Content-Type", "video/*")
            .header("X-Upload-Content-Length", length)
            .json(&metadata)
            .send()
            .await
            .map_err(http::transport)?;
        let session = http::ensure_success(session).await?;
        let location = session
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| ProviderError::Unavailable("upload session without location".to_string()))?;

        // 3. Stream the bytes.
        let body = reqwest::Body::wrap_stream(capped(source.bytes_stream(), length));
        let uploaded = self
            .client
            .put(location)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "video/*")
            .header(CONTENT_LENGTH, length)
            .body(body)
            .send()
            .await
            .map_err(http::transport)?;
        let resource: VideoResource = http::decode(uploaded).await?;

        tracing::info!(job_id = %request.job_id, video_id = %resource.id, "video uploaded to YouTube");
        Ok(SubmitOutcome::accepted(resource.id))
    }
}

/// The resumable protocol needs the length up front, so a source that does
/// not declare one is refused along with one over the limit.
fn check_source_size(declared: Option<u64>, max: u64) -> Result<u64, ProviderError> {
    match declared {
        None => Err(ProviderError::Rejected(
            "source video did not declare its size".to_string(),
        )),
        Some(0) => Err(ProviderError::Rejected("source video is empty".to_string())),
        Some(len) if len > max => Err(ProviderError::Rejected(format!(
            "source video is {} bytes, the limit is {}",
            len, max
        ))),
        Some(len) => Ok(len),
    }
}

/// Passes chunks through until more than `limit` bytes have been seen.
fn capped<S, E>(stream: S, limit: u64) -> impl Stream<Item = Result<Bytes, BoxError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<BoxError>,
{
    let mut seen: u64 = 0;
    stream.map(move |chunk| {
        let chunk = chunk.map_err(Into::<BoxError>::into)?;
        seen += chunk.len() as u64;
        if seen > limit {
            return Err(format!("source video exceeded its declared {} bytes", limit).into());
        }
        Ok(chunk)
    })
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    status: VideoStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatus {
    upload_status: String,
    failure_reason: Option<String>,
    rejection_reason: Option<String>,
}

fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

fn map_status(video_id: &str, status: VideoStatus) -> ProviderStatus {
    match status.upload_status.as_str() {
        "processed" => ProviderStatus::Completed(ResultPayload {
            platform_url: Some(watch_url(video_id)),
            ..Default::default()
        }),
        "failed" => ProviderStatus::Failed(format!(
            "YouTube processing failed: {}",
            status.failure_reason.as_deref().unwrap_or("unknown")
        )),
        "rejected" => ProviderStatus::Failed(format!(
            "YouTube rejected the video: {}",
            status.rejection_reason.as_deref().unwrap_or("unknown")
        )),
        "deleted" => ProviderStatus::Failed("Video was deleted on YouTube".to_string()),
        _ => ProviderStatus::Processing,
    }
}

#[async_trait]
impl ProviderAdapter for YouTubeAdapter {
    fn provider(&self) -> Provider {
        Provider::YouTube
    }

    fn submit_timeout(&self) -> Option<Duration> {
        Some(self.limits.timeout)
    }

    async fn submit(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        http::refusal_as_failure(self.start(request).await)
    }

    async fn poll(&self, request: &PollRequest<'_>) -> Result<ProviderStatus, ProviderError> {
        let token = http::bearer(request.access_token.as_deref())?;
        let response = self
            .client
            .get(format!("{}/videos", self.api_url))
            .query(&[("part", "status"), ("id", request.external_id)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(http::transport)?;
        let list: VideoListResponse = http::decode(response).await?;

        Ok(match list.items.into_iter().next() {
            Some(item) => map_status(&item.id, item.status),
            None => ProviderStatus::Failed("Video no longer exists on YouTube".to_string()),
        })
    }
}
