//! Quote client: rate-limit check, request, accounting, normalization.

use crate::config::Config;
use crate::http::{self, map_status_to_error, ErrorInfo};
use crate::normalize::normalize_json;
use crate::rate_limit::{CallStore, FileStore, RateLimiter, StoreHealth};
use crate::request::{build_params, QuoteKind, RequestError};
use crate::types::{QuoteRequest, QuoteResult, RateLimitStatus};
use log::{info, warn};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid request: {source}")]
    InvalidRequest {
        #[source]
        source: RequestError,
        rate_limit: RateLimitStatus,
    },
    #[error(
        "Rate limit exceeded: {} calls per hour. Resets at {}.",
        .status.limit,
        .status.resets_at.as_deref().unwrap_or("unknown")
    )]
    QuotaExceeded { status: RateLimitStatus },
    #[error(
        "upstream request failed{}: {}",
        .status.map(|s| format!(" with HTTP {}", s)).unwrap_or_default(),
        .body
    )]
    Transport {
        status: Option<u16>,
        body: String,
        rate_limit: RateLimitStatus,
    },
    #[error("{}", .messages.join("; "))]
    Upstream {
        messages: Vec<String>,
        rate_limit: RateLimitStatus,
    },
    #[error("unexpected upstream response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        rate_limit: RateLimitStatus,
    },
    #[error("client setup failed: {message}")]
    Client {
        message: String,
        rate_limit: RateLimitStatus,
    },
    #[error("configuration error: {message}")]
    Config {
        message: String,
        rate_limit: RateLimitStatus,
    },
}

impl ClientError {
    /// Rate-limit status at the time of failure.
    pub fn rate_limit(&self) -> &RateLimitStatus {
        match self {
            ClientError::QuotaExceeded { status } => status,
            ClientError::InvalidRequest { rate_limit, .. }
            | ClientError::Transport { rate_limit, .. }
            | ClientError::Upstream { rate_limit, .. }
            | ClientError::Decode { rate_limit, .. }
            | ClientError::Client { rate_limit, .. }
            | ClientError::Config { rate_limit, .. } => rate_limit,
        }
    }

    /// Individual messages; joined by `Display`.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ClientError::Upstream { messages, .. } => messages.clone(),
            other => vec![other.to_string()],
        }
    }

    pub fn info(&self) -> ErrorInfo {
        let message = self.to_string();
        let (code, retriable) = match self {
            ClientError::InvalidRequest { .. } => ("invalid_request", false),
            ClientError::QuotaExceeded { .. } => ("quota_exceeded", true),
            ClientError::Transport {
                status: Some(code), ..
            } => {
                let status =
                    StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                return map_status_to_error(status, message);
            }
            ClientError::Transport { status: None, .. } => ("network_error", true),
            ClientError::Upstream { .. } => ("upstream_error", false),
            ClientError::Decode { .. } => ("decode_error", false),
            ClientError::Client { .. } => ("client_error", false),
            ClientError::Config { .. } => ("config_error", false),
        };
        ErrorInfo {
            code: code.to_string(),
            message,
            retriable,
        }
    }
}

pub struct QuoteClient<S: CallStore = FileStore> {
    cfg: Config,
    http: reqwest::Client,
    limiter: RateLimiter<S>,
}

impl QuoteClient<FileStore> {
    /// Client persisting its call history at `cfg.rate_limit_file`.
    pub fn from_config(cfg: Config) -> Result<Self, ClientError> {
        let store = FileStore::new(cfg.rate_limit_file.clone());
        Self::new(cfg, RateLimiter::new(store))
    }
}

impl<S: CallStore> QuoteClient<S> {
    pub fn new(cfg: Config, limiter: RateLimiter<S>) -> Result<Self, ClientError> {
        let http = http::build_client(&cfg).map_err(|e| ClientError::Client {
            message: e.to_string(),
            rate_limit: limiter.current_status(),
        })?;
        Ok(Self { cfg, http, limiter })
    }

    pub fn limiter(&self) -> &RateLimiter<S> {
        &self.limiter
    }

    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.limiter.current_status()
    }

    pub async fn quote(&mut self, req: &QuoteRequest) -> Result<QuoteResult, ClientError> {
        self.execute(req, QuoteKind::Quote).await
    }

    pub async fn estimate(&mut self, req: &QuoteRequest) -> Result<QuoteResult, ClientError> {
        self.execute(req, QuoteKind::Estimate).await
    }

    /// Rates for every available mode; any `mode` on the request is ignored.
    pub async fn compare(&mut self, req: &QuoteRequest) -> Result<QuoteResult, ClientError> {
        self.execute(req, QuoteKind::Compare).await
    }

    async fn execute(
        &mut self,
        req: &QuoteRequest,
        kind: QuoteKind,
    ) -> Result<QuoteResult, ClientError> {
        req.validate().map_err(|source| ClientError::InvalidRequest {
            source,
            rate_limit: self.limiter.current_status(),
        })?;

        let acquire = self.limiter.try_acquire();
        if !acquire.allowed {
            warn!("local rate limit exhausted; skipping upstream call");
            return Err(ClientError::QuotaExceeded {
                status: acquire.status,
            });
        }

        let params = build_params(req, kind);
        let url = http::build_url(&self.cfg.api_url, &params).map_err(|e| ClientError::Client {
            message: format!("invalid api_url {}: {}", self.cfg.api_url, e),
            rate_limit: self.limiter.current_status(),
        })?;

        let sent = http::get_json_text(&self.http, url).await;
        // The attempt counts against the quota whatever the outcome.
        if let StoreHealth::Degraded { reason } = self.limiter.record_call() {
            info!("continuing with in-memory rate limit history: {}", reason);
        }
        let rate_limit = self.limiter.current_status();
        if let Some(w) = &rate_limit.warning {
            warn!("{}", w);
        }

        let raw = sent.map_err(|e| ClientError::Transport {
            status: e.status.map(|s| s.as_u16()),
            body: e.source.to_string(),
            rate_limit: rate_limit.clone(),
        })?;
        if !raw.status.is_success() {
            return Err(ClientError::Transport {
                status: Some(raw.status.as_u16()),
                body: raw.body,
                rate_limit,
            });
        }

        let outcome = normalize_json(&raw.body).map_err(|source| ClientError::Decode {
            source,
            rate_limit: rate_limit.clone(),
        })?;
        if let Some(errors) = outcome.errors() {
            warn!("upstream rejected request: {}", errors.join("; "));
            return Err(ClientError::Upstream {
                messages: errors.to_vec(),
                rate_limit,
            });
        }
        Ok(QuoteResult {
            outcome,
            rate_limit,
        })
    }
}
