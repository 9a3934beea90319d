use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http;
use crate::modules::generation::error::ProviderError;
use crate::modules::generation::model::{Provider, ResultPayload};
use crate::modules::generation::provider::{
    PollRequest, ProviderAdapter, ProviderStatus, SubmitOutcome, SubmitRequest,
};

/// Facebook page video publishing through the Graph API.
pub struct FacebookAdapter {
    client: reqwest::Client,
    graph_url: String,
}

impl FacebookAdapter {
    pub fn new(client: reqwest::Client, graph_url: &str) -> Self {
        Self {
            client,
            graph_url: graph_url.trim_end_matches('/').to_string(),
        }
    }

    async fn start(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        let params = http::publication_params(request.params)?;
        let token = http::bearer(request.access_token.as_deref())?;
        let page_id = params
            .page_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ProviderError::Rejected("pageId is required for Facebook".to_string()))?;

        let response = self
            .client
            .post(format!("{}/{}/videos", self.graph_url, page_id))
            .bearer_auth(token)
            .json(&PublishBody {
                file_url: &params.video_url,
                title: &params.title,
                description: &params.description,
            })
            .send()
            .await
            .map_err(http::transport)?;
        let created: PublishResponse = http::decode(response).await?;

        Ok(SubmitOutcome::accepted(created.id))
    }
}

#[derive(Serialize)]
struct PublishBody<'a> {
    file_url: &'a str,
    title: &'a str,
    description: &'a str,
}

#[derive(Deserialize)]
struct PublishResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct VideoNode {
    id: String,
    status: VideoState,
}

#[derive(Debug, Default, Deserialize)]
struct VideoState {
    video_status: String,
}

fn map_status(video_id: &str, state: VideoState) -> ProviderStatus {
    match state.video_status.as_str() {
        "ready" => ProviderStatus::Completed(ResultPayload {
            platform_url: Some(format!("https://www.facebook.com/{}", video_id)),
            ..Default::default()
        }),
        "error" => ProviderStatus::Failed("Facebook could not process the video".to_string()),
        _ => ProviderStatus::Processing,
    }
}

#[async_trait]
impl ProviderAdapter for FacebookAdapter {
    fn provider(&self) -> Provider {
        Provider::Facebook
    }

    async fn submit(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        http::refusal_as_failure(self.start(request).await)
    }

    async fn poll(&self, request: &PollRequest<'_>) -> Result<ProviderStatus, ProviderError> {
        let token = http::bearer(request.access_token.as_deref())?;
        let response = self
            .client
            .get(format!("{}/{}", self.graph_url, request.external_id))
            .query(&[("fields", "status")])
            .bearer_auth(token)
            .send()
            .await
            .map_err(http::transport)?;
        let node: VideoNode = http::decode(response).await?;
        Ok(map_status(&node.id, node.status))
    }
}
