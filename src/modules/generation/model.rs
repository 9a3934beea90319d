use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "job_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Music,
    Video,
    Publication,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Music => write!(f, "music"),
            JobKind::Video => write!(f, "video"),
            JobKind::Publication => write!(f, "publication"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "job_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Suno,
    MusicGpt,
    Kling,
    Runway,
    InVideo,
    YouTube,
    TikTok,
    Facebook,
}

impl Provider {
    pub const ALL: [Provider; 8] = [
        Provider::Suno,
        Provider::MusicGpt,
        Provider::Kling,
        Provider::Runway,
        Provider::InVideo,
        Provider::YouTube,
        Provider::TikTok,
        Provider::Facebook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Suno => "suno",
            Provider::MusicGpt => "musicgpt",
            Provider::Kling => "kling",
            Provider::Runway => "runway",
            Provider::InVideo => "invideo",
            Provider::YouTube => "youtube",
            Provider::TikTok => "tiktok",
            Provider::Facebook => "facebook",
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Provider::Suno | Provider::MusicGpt => JobKind::Music,
            Provider::Kling | Provider::Runway | Provider::InVideo => JobKind::Video,
            Provider::YouTube | Provider::TikTok | Provider::Facebook => JobKind::Publication,
        }
    }

    /// Static price per submission in cents. Never recomputed after submission.
    pub fn cost_cents(&self) -> i32 {
        match self {
            Provider::Suno => 2,
            Provider::MusicGpt => 3,
            Provider::Kling | Provider::Runway | Provider::InVideo => 1500,
            Provider::YouTube | Provider::TikTok | Provider::Facebook => 0,
        }
    }

    /// Publishing targets act on the user's own account and need their stored token.
    pub fn requires_user_token(&self) -> bool {
        self.kind() == JobKind::Publication
    }

    /// Whether this provider can run a job with these parameters. Stem
    /// separation is a music job only MusicGPT offers.
    pub fn accepts(&self, params: &JobParams) -> bool {
        match params {
            JobParams::Stems(_) => *self == Provider::MusicGpt,
            other => other.kind() == self.kind(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s.to_ascii_lowercase())
            .ok_or_else(|| format!("Unknown provider: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    /// Statuses only move forward, and nothing leaves a terminal state.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MusicParams {
    #[validate(length(min = 10, max = 3000, message = "Prompt must be between 10 and 3000 characters"))]
    pub prompt: String,
    pub genre: Option<String>,
    pub mood: Option<String>,
    #[validate(range(min = 5, max = 600, message = "Duration must be between 5 and 600 seconds"))]
    pub duration: Option<i32>,
    #[serde(default)]
    pub instrumental: bool,
    pub custom_lyrics: Option<String>,
    #[serde(default)]
    pub need_stems: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoParams {
    #[validate(length(min = 1, max = 3000, message = "Prompt is required"))]
    pub prompt: String,
    #[validate(url(message = "Music URL must be a valid URL"))]
    pub music_url: Option<String>,
    pub style: Option<String>,
    #[validate(custom(function = "validate_resolution"))]
    pub resolution: Option<String>,
}

fn validate_resolution(resolution: &str) -> Result<(), validator::ValidationError> {
    match resolution {
        "1080p" | "4k" => Ok(()),
        _ => Err(validator::ValidationError::new("resolution")
            .with_message("Resolution must be 1080p or 4k".into())),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicationParams {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(url(message = "Video URL must be a valid URL"))]
    pub video_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// public, private or unlisted; platforms without the notion ignore it.
    pub privacy: Option<String>,
    /// Facebook page to post on.
    pub page_id: Option<String>,
}

/// Splits an existing track into vocals and instrumental.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StemParams {
    #[validate(url(message = "Audio URL must be a valid URL"))]
    pub audio_url: String,
}

/// Immutable snapshot of the request a job was submitted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobParams {
    Music(MusicParams),
    Video(VideoParams),
    Publication(PublicationParams),
    Stems(StemParams),
}

impl JobParams {
    pub fn kind(&self) -> JobKind {
        match self {
            JobParams::Music(_) | JobParams::Stems(_) => JobKind::Music,
            JobParams::Video(_) => JobKind::Video,
            JobParams::Publication(_) => JobKind::Publication,
        }
    }

    pub fn validate(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            JobParams::Music(p) => p.validate(),
            JobParams::Video(p) => p.validate(),
            JobParams::Publication(p) => p.validate(),
            JobParams::Stems(p) => p.validate(),
        }
    }
}

/// Normalized result of a completed job. Fields a provider does not report stay empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stems_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocals_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrumental_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    #[schema(value_type = Object)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Terminal outcome applied by `JobStore::update_terminal`.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalState {
    Completed(ResultPayload),
    Failed(String),
}

impl TerminalState {
    pub fn status(&self) -> JobStatus {
        match self {
            TerminalState::Completed(_) => JobStatus::Completed,
            TerminalState::Failed(_) => JobStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub project_id: Uuid,
    pub kind: JobKind,
    pub provider: Provider,
    #[schema(value_type = JobParams)]
    pub input_params: sqlx::types::Json<JobParams>,
    pub idempotency_key: Option<String>,
    pub external_id: Option<String>,
    pub status: JobStatus,
    #[schema(value_type = Option<ResultPayload>)]
    pub result_payload: Option<sqlx::types::Json<ResultPayload>>,
    pub error_info: Option<String>,
    pub cost_cents: i32,
    #[serde(with = "time::serde::iso8601")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::iso8601")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::iso8601::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub completed_at: Option<OffsetDateTime>,
}

impl Job {
    pub fn params(&self) -> &JobParams {
        &self.input_params.0
    }

    pub fn result(&self) -> Option<&ResultPayload> {
        self.result_payload.as_ref().map(|p| &p.0)
    }
}

/// Everything the store needs to persist a fresh `pending` job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub project_id: Uuid,
    pub provider: Provider,
    pub params: JobParams,
    pub idempotency_key: Option<String>,
    pub cost_cents: i32,
}
