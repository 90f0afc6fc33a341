use crate::config::Config;
use log::debug;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Stable error shape printed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub retriable: bool,
}

/// Status and body of a completed upstream call, whatever the status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// A failed exchange. `status` is kept when headers arrived before the failure.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct SendError {
    pub status: Option<StatusCode>,
    #[source]
    pub source: reqwest::Error,
}

pub fn build_client(cfg: &Config) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(cfg.user_agent.as_str())
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()
}

pub fn build_url(base: &str, params: &[(String, String)]) -> Result<Url, url::ParseError> {
    Url::parse_with_params(base, params)
}

pub fn map_status_to_error(status: StatusCode, message: String) -> ErrorInfo {
    let (code, retriable) = match status {
        StatusCode::BAD_REQUEST => ("bad_request", false),
        StatusCode::UNAUTHORIZED => ("unauthorized", false),
        StatusCode::FORBIDDEN => ("forbidden", false),
        StatusCode::NOT_FOUND => ("not_found", false),
        StatusCode::CONFLICT => ("conflict", false),
        StatusCode::TOO_MANY_REQUESTS => ("rate_limited", true),
        s if s.is_server_error() => ("upstream_error", true),
        _ => ("server_error", false),
    };
    ErrorInfo {
        code: code.to_string(),
        message,
        retriable,
    }
}

/// Single GET with `Accept: application/json`. No retries: every attempt
/// counts against the local quota.
pub async fn get_json_text(client: &Client, url: Url) -> Result<RawResponse, SendError> {
    debug!("GET {}", url);
    let res = client
        .get(url)
        .header(ACCEPT, HeaderValue::from_static("application/json"))
        .send()
        .await
        .map_err(|source| SendError {
            status: source.status(),
            source,
        })?;
    let status = res.status();
    let body = res.text().await.map_err(|source| SendError {
        status: Some(status),
        source,
    })?;
    debug!("upstream status {} ({} bytes)", status, body.len());
    Ok(RawResponse { status, body })
}
