use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::model::{JobKind, JobParams, MusicParams, Provider, PublicationParams, StemParams, VideoParams};
use super::service::SubmitJob;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobRequest {
    pub provider: Provider,
    pub params: JobParams,
    pub idempotency_key: Option<String>,
}

impl From<SubmitJobRequest> for SubmitJob {
    fn from(req: SubmitJobRequest) -> Self {
        Self {
            provider: req.provider,
            params: req.params,
            idempotency_key: req.idempotency_key,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMusicRequest {
    pub provider: Provider,
    #[serde(flatten)]
    pub params: MusicParams,
    pub idempotency_key: Option<String>,
}

impl From<GenerateMusicRequest> for SubmitJob {
    fn from(req: GenerateMusicRequest) -> Self {
        Self {
            provider: req.provider,
            params: JobParams::Music(req.params),
            idempotency_key: req.idempotency_key,
        }
    }
}

/// Stem separation always runs on MusicGPT.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeparateStemsRequest {
    #[serde(flatten)]
    pub params: StemParams,
    pub idempotency_key: Option<String>,
}

impl From<SeparateStemsRequest> for SubmitJob {
    fn from(req: SeparateStemsRequest) -> Self {
        Self {
            provider: Provider::MusicGpt,
            params: JobParams::Stems(req.params),
            idempotency_key: req.idempotency_key,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoRequest {
    pub provider: Provider,
    #[serde(flatten)]
    pub params: VideoParams,
    pub idempotency_key: Option<String>,
}

impl From<GenerateVideoRequest> for SubmitJob {
    fn from(req: GenerateVideoRequest) -> Self {
        Self {
            provider: req.provider,
            params: JobParams::Video(req.params),
            idempotency_key: req.idempotency_key,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub platform: Provider,
    #[serde(flatten)]
    pub params: PublicationParams,
    pub idempotency_key: Option<String>,
}

impl From<PublishRequest> for SubmitJob {
    fn from(req: PublishRequest) -> Self {
        Self {
            provider: req.platform,
            params: JobParams::Publication(req.params),
            idempotency_key: req.idempotency_key,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListJobsQuery {
    pub kind: Option<JobKind>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub provider: Provider,
    pub kind: JobKind,
    pub cost_cents: i32,
}

impl From<Provider> for ProviderInfo {
    fn from(provider: Provider) -> Self {
        Self {
            provider,
            kind: provider.kind(),
            cost_cents: provider.cost_cents(),
        }
    }
}
