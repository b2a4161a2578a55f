//! Client for the downstream archiving API
//!
//! The dispatcher only depends on the [`Archiver`] capability; [`HttpArchiver`] is the
//! production implementation that uploads a conversation as a multipart form.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Url,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::Config;

const DOCUMENT_FIELD: &str = "htmlDoc";
const DOCUMENT_FILE_NAME: &str = "conversation.html";
const DOCUMENT_MIME: &str = "text/plain; charset=utf-8";

/// Outcome of a successful archive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReceipt {
    pub url: String,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to build archive HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to archive API failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API request failed: {status} {body}")]
    Status { status: u16, body: String },
    #[error("archive API response did not include a shareable url")]
    MissingUrl,
}

#[async_trait]
pub trait Archiver: Send + Sync {
    async fn archive(&self, document: &str, model: &str) -> Result<ArchiveReceipt, ArchiveError>;
}

#[derive(Debug, Clone)]
pub struct HttpArchiver {
    client: Client,
    endpoint: Url,
}

impl HttpArchiver {
    pub fn new(endpoint: Url) -> Result<Self, ArchiveError> {
        let client = Client::builder().build().map_err(ArchiveError::Client)?;
        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &Config) -> Result<Self, ArchiveError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.archive_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ArchiveError::Client)?;

        Ok(Self {
            client,
            endpoint: config.archive_api_url.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Archiver for HttpArchiver {
    async fn archive(&self, document: &str, model: &str) -> Result<ArchiveReceipt, ArchiveError> {
        info!(
            endpoint = %self.endpoint,
            model = %model,
            document_bytes = document.len(),
            "saving conversation to archive API"
        );

        let document_part = Part::text(document.to_owned())
            .file_name(DOCUMENT_FILE_NAME)
            .mime_str(DOCUMENT_MIME)?;
        let form = Form::new()
            .part(DOCUMENT_FIELD, document_part)
            .text("model", model.to_owned())
            .text("skipScraping", "true");

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, "archive API request could not be sent");
                ArchiveError::Transport(err)
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = status.as_u16(),
                reason = status.canonical_reason().unwrap_or_default(),
                body = %body,
                "archive API request failed"
            );
            return Err(ArchiveError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let receipt = parse_receipt(&body)?;
        debug!(url = %receipt.url, "archive API returned shareable url");
        Ok(receipt)
    }
}

#[derive(Debug, Deserialize)]
struct ReceiptBody {
    url: String,
}

/// Accepts either a JSON object with a string `url` or a bare http(s) URL as text.
pub fn parse_receipt(body: &str) -> Result<ArchiveReceipt, ArchiveError> {
    if let Ok(parsed) = serde_json::from_str::<ReceiptBody>(body) {
        let url = parsed.url.trim();
        if !url.is_empty() {
            return Ok(ArchiveReceipt {
                url: url.to_string(),
            });
        }
        return Err(ArchiveError::MissingUrl);
    }

    let text = body.trim();
    match Url::parse(text) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(ArchiveReceipt {
            url: text.to_string(),
        }),
        _ => Err(ArchiveError::MissingUrl),
    }
}
