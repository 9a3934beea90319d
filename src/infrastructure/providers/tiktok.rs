use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http;
use crate::modules::generation::error::ProviderError;
use crate::modules::generation::model::{Provider, ResultPayload};
use crate::modules::generation::provider::{
    PollRequest, ProviderAdapter, ProviderStatus, SubmitOutcome, SubmitRequest,
};

pub struct TikTokAdapter {
    client: reqwest::Client,
    api_url: String,
}

impl TikTokAdapter {
    pub fn new(client: reqwest::Client, api_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn start(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        let params = http::publication_params(request.params)?;
        let token = http::bearer(request.access_token.as_deref())?;

        let body = InitBody {
            post_info: PostInfo {
                title: &params.title,
                privacy_level: privacy_level(params.privacy.as_deref()),
                disable_duet: false,
                disable_comment: false,
                disable_stitch: false,
            },
            source_info: SourceInfo {
                source: "PULL_FROM_URL",
                video_url: &params.video_url,
            },
        };

        let response = self
            .client
            .post(format!("{}/v2/post/publish/video/init/", self.api_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(http::transport)?;
        let envelope: Envelope<InitData> = http::decode(response).await?;
        let data = envelope.into_data()?;

        Ok(SubmitOutcome {
            external_id: data.publish_id,
            status: ProviderStatus::Processing,
        })
    }
}

/// TikTok has no "unlisted"; anything but public stays private to the creator.
fn privacy_level(privacy: Option<&str>) -> &'static str {
    match privacy {
        Some("public") => "PUBLIC_TO_EVERYONE",
        _ => "SELF_ONLY",
    }
}

#[derive(Serialize)]
struct InitBody<'a> {
    post_info: PostInfo<'a>,
    source_info: SourceInfo<'a>,
}

#[derive(Serialize)]
struct PostInfo<'a> {
    title: &'a str,
    privacy_level: &'static str,
    disable_duet: bool,
    disable_comment: bool,
    disable_stitch: bool,
}

#[derive(Serialize)]
struct SourceInfo<'a> {
    source: &'static str,
    video_url: &'a str,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    publish_id: &'a str,
}

/// Every TikTok response wraps its payload next to an `error` object
/// whose code is `"ok"` on success.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, ProviderError> {
        if let Some(error) = self.error.filter(|e| e.code != "ok") {
            return Err(ProviderError::Rejected(format!("{}: {}", error.code, error.message)));
        }
        self.data
            .ok_or_else(|| ProviderError::Unavailable("TikTok response without data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct InitData {
    publish_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusData {
    status: String,
    fail_reason: Option<String>,
    #[serde(default, rename = "publicaly_available_post_id")]
    post_ids: Vec<serde_json::Value>,
}

fn map_status(data: StatusData) -> ProviderStatus {
    match data.status.as_str() {
        "PUBLISH_COMPLETE" => {
            let platform_url = data
                .post_ids
                .first()
                .map(|id| match id {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .map(|id| format!("https://www.tiktok.com/video/{}", id));
            ProviderStatus::Completed(ResultPayload {
                platform_url,
                ..Default::default()
            })
        }
        "FAILED" => ProviderStatus::Failed(
            data.fail_reason
                .unwrap_or_else(|| "TikTok publishing failed".to_string()),
        ),
        _ => ProviderStatus::Processing,
    }
}

#[async_trait]
impl ProviderAdapter for TikTokAdapter {
    fn provider(&self) -> Provider {
        Provider::TikTok
    }

    async fn submit(&self, request: &SubmitRequest<'_>) -> Result<SubmitOutcome, ProviderError> {
        http::refusal_as_failure(self.start(request).await)
    }

    async fn poll(&self, request: &PollRequest<'_>) -> Result<ProviderStatus, ProviderError> {
        let token = http::bearer(request.access_token.as_deref())?;
        let response = self
            .client
            .post(format!("{}/v2/post/publish/status/fetch/", self.api_url))
            .bearer_auth(token)
            .json(&StatusBody {
                publish_id: request.external_id,
            })
            .send()
            .await
            .map_err(http::transport)?;
        let envelope: Envelope<StatusData> = http::decode(response).await?;
        Ok(map_status(envelope.into_data()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_complete_links_to_post() {
        let data = StatusData {
            status: "PUBLISH_COMPLETE".into(),
            post_ids: vec![serde_json::json!(7301234567890u64)],
            ..Default::default()
        };
        let ProviderStatus::Completed(payload) = map_status(data) else {
            panic!("expected completed");
        };
        assert_eq!(
            payload.platform_url.as_deref(),
            Some("https://www.tiktok.com/video/7301234567890")
        );
    }

    #[test]
    fn failed_reports_fail_reason() {
        let data = StatusData {
            status: "FAILED".into(),
            fail_reason: Some("file_format_check_failed".into()),
            ..Default::default()
        };
        assert_eq!(
            map_status(data),
            ProviderStatus::Failed("file_format_check_failed".into())
        );
    }

    #[test]
    fn download_and_upload_stages_are_processing() {
        for s in ["PROCESSING_DOWNLOAD", "PROCESSING_UPLOAD", "SEND_TO_USER_INBOX"] {
            let data = StatusData {
                status: s.into(),
                ..Default::default()
            };
            assert_eq!(map_status(data), ProviderStatus::Processing);
        }
    }

    #[test]
    fn error_envelope_is_a_rejection() {
        let envelope: Envelope<InitData> = serde_json::from_value(serde_json::json!({
            "error": { "code": "spam_risk_too_many_posts", "message": "slow down" }
        }))
        .unwrap();
        assert!(matches!(envelope.into_data(), Err(ProviderError::Rejected(_))));
    }

    #[test]
    fn ok_envelope_yields_data() {
        let envelope: Envelope<InitData> = serde_json::from_value(serde_json::json!({
            "data": { "publish_id": "p-1" },
            "error": { "code": "ok", "message": "" }
        }))
        .unwrap();
        assert_eq!(envelope.into_data().unwrap().publish_id.as_deref(), Some("p-1"));
    }

    #[test]
    fn only_public_is_public() {
        assert_eq!(privacy_level(Some("public")), "PUBLIC_TO_EVERYONE");
        assert_eq!(privacy_level(Some("unlisted")), "SELF_ONLY");
        assert_eq!(privacy_level(None), "SELF_ONLY");
    }
}
