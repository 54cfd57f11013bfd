//! Posting ad and campaign creation requests to the downstream webhook.
//!
//! One POST per submission, no retry. Only HTTP 200 counts as accepted.

use std::{fmt, str::FromStr, time::Duration};

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid webhook URL '{0}'")]
    InvalidUrl(String),

    #[error("Refusing to submit a request with no items")]
    EmptyPayload,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Webhook request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Webhook answered HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    CriarAnuncio,
    CriarCampanha,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::CriarAnuncio => "criar_anuncio",
            RequestKind::CriarCampanha => "criar_campanha",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "criar_anuncio" | "anuncio" | "ad" => Ok(RequestKind::CriarAnuncio),
            "criar_campanha" | "campanha" | "campaign" => Ok(RequestKind::CriarCampanha),
            other => Err(format!("unknown request kind '{other}'")),
        }
    }
}

/// Body posted to the webhook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub tipo_requisicao: RequestKind,
    pub dados: Vec<Value>,
    pub timestamp: DateTime<Utc>,
}

impl WebhookPayload {
    pub fn new(kind: RequestKind, dados: Vec<Value>) -> Self {
        Self::at(kind, dados, Utc::now())
    }

    pub fn at(kind: RequestKind, dados: Vec<Value>, timestamp: DateTime<Utc>) -> Self {
        Self {
            tipo_requisicao: kind,
            dados,
            timestamp,
        }
    }
}

pub struct WebhookClient {
    client: Client,
    url: Url,
}

impl WebhookClient {
    pub fn new(url: &str) -> Result<Self, WebhookError> {
        let url = Url::parse(url).map_err(|_| WebhookError::InvalidUrl(url.to_string()))?;
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(WebhookError::ClientBuild)?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn submit(&self, payload: &WebhookPayload) -> Result<(), WebhookError> {
        if payload.dados.is_empty() {
            return Err(WebhookError::EmptyPayload);
        }

        let response = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(WebhookError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %self.url, status = status.as_u16(), "webhook rejected submission");
            return Err(WebhookError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            kind = %payload.tipo_requisicao,
            items = payload.dados.len(),
            "webhook submission accepted"
        );
        Ok(())
    }
}
