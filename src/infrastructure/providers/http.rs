use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::modules::generation::error::ProviderError;
use crate::modules::generation::model::{JobParams, MusicParams, PublicationParams, StemParams, VideoParams};
use crate::modules::generation::provider::SubmitOutcome;

const MAX_DETAIL_LEN: usize = 300;

/// One shared client per process; the timeout also bounds body downloads.
pub fn client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("studio-backend/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Classifies a non-success HTTP status.
pub fn error_for_status(status: StatusCode, body: &str) -> ProviderError {
    let detail = format!("status {}: {}", status, truncate(body));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => ProviderError::Unavailable(detail),
        s if s.is_server_error() => ProviderError::Unavailable(detail),
        _ => ProviderError::Rejected(detail),
    }
}

pub fn transport(e: reqwest::Error) -> ProviderError {
    ProviderError::Unavailable(format!("request failed: {}", e))
}

/// Fails on a non-success status, otherwise decodes the JSON body.
pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Unavailable(format!("undecodable response: {}", e)))
}

pub async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_for_status(status, &body))
}

/// A business refusal at submission is a failed job, not an error.
pub fn refusal_as_failure(result: Result<SubmitOutcome, ProviderError>) -> Result<SubmitOutcome, ProviderError> {
    match result {
        Err(ProviderError::Rejected(reason)) => Ok(SubmitOutcome::rejected(reason)),
        other => other,
    }
}

pub fn bearer(token: Option<&str>) -> Result<&str, ProviderError> {
    token.ok_or_else(|| ProviderError::Auth("no access token for this platform".to_string()))
}

pub fn music_params(params: &JobParams) -> Result<&MusicParams, ProviderError> {
    match params {
        JobParams::Music(p) => Ok(p),
        other => Err(wrong_kind(other)),
    }
}

pub fn stem_params(params: &JobParams) -> Result<&StemParams, ProviderError> {
    match params {
        JobParams::Stems(p) => Ok(p),
        other => Err(wrong_kind(other)),
    }
}

pub fn video_params(params: &JobParams) -> Result<&VideoParams, ProviderError> {
    match params {
        JobParams::Video(p) => Ok(p),
        other => Err(wrong_kind(other)),
    }
}

pub fn publication_params(params: &JobParams) -> Result<&PublicationParams, ProviderError> {
    match params {
        JobParams::Publication(p) => Ok(p),
        other => Err(wrong_kind(other)),
    }
}

fn wrong_kind(params: &JobParams) -> ProviderError {
    ProviderError::Rejected(format!("unsupported {} parameters", params.kind()))
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_DETAIL_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
