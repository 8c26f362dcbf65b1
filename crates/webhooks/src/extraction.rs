use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use lightquote_core::config::{AppConfig, WebhookConfig};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::info;

use crate::error::WebhookError;
use crate::retry::{deliver, Delivery, DeliveryFailure, RetryPolicy};

const WEBHOOK: &str = "extraction";

/// A document as it is posted to the extraction webhook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    /// Content type is guessed from the file name's extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type =
            mime_guess::from_path(&file_name).first_or_octet_stream().essence_str().to_string();
        Self { file_name, content_type, bytes }
    }

    pub async fn from_path(path: &Path) -> Result<Self, WebhookError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| WebhookError::ReadDocument { path: path.to_path_buf(), source })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn form(&self) -> Result<Form, WebhookError> {
        let part = Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)
            .map_err(|source| WebhookError::Transport { webhook: WEBHOOK, source })?;

        Ok(Form::new()
            .part("file", part)
            .text("fileName", self.file_name.clone())
            .text("fileSize", self.size().to_string())
            .text("fileType", self.content_type.clone()))
    }
}

#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Posts the document and returns the raw JSON the webhook answered with.
    async fn extract(&self, upload: &DocumentUpload) -> Result<Delivery<Value>, DeliveryFailure>;
}

#[derive(Clone, Debug)]
pub struct ExtractionClient {
    http: Client,
    url: Option<SecretString>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ExtractionClient {
    pub fn new(http: Client, webhook: &WebhookConfig, retry: RetryPolicy) -> Self {
        Self {
            http,
            url: webhook.url.clone(),
            timeout: Duration::from_secs(webhook.timeout_secs),
            retry,
        }
    }

    pub fn from_config(http: Client, config: &AppConfig) -> Self {
        Self::new(http, &config.extraction, RetryPolicy::from_config(&config.retry))
    }

    async fn post_once(&self, url: &str, upload: &DocumentUpload) -> Result<Value, WebhookError> {
        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .multipart(upload.form()?)
            .send()
            .await
            .map_err(|source| WebhookError::Transport { webhook: WEBHOOK, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Status { webhook: WEBHOOK, status: status.as_u16() });
        }

        response.json::<Value>().await.map_err(|source| WebhookError::InvalidBody {
            webhook: WEBHOOK,
            source,
        })
    }
}

#[async_trait]
impl ExtractionService for ExtractionClient {
    async fn extract(&self, upload: &DocumentUpload) -> Result<Delivery<Value>, DeliveryFailure> {
        let Some(url) = self.url.as_ref() else {
            return Err(DeliveryFailure::before_sending(WebhookError::NotConfigured {
                webhook: WEBHOOK,
            }));
        };
        let url = url.expose_secret();

        info!(
            event_name = "webhook.extraction.started",
            file_name = %upload.file_name,
            file_size = upload.size(),
            file_type = %upload.content_type,
            "uploading document for extraction"
        );
        deliver(self.retry, WEBHOOK, move || self.post_once(url, upload)).await
    }
}

#[cfg(test)]
mod tests {
    use super::DocumentUpload;

    #[test]
    fn content_type_follows_file_extension() {
        assert_eq!(DocumentUpload::new("schedule.pdf", Vec::new()).content_type, "application/pdf");
        assert_eq!(DocumentUpload::new("fixtures.csv", Vec::new()).content_type, "text/csv");
        assert_eq!(
            DocumentUpload::new("no-extension", vec![1, 2, 3]).content_type,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn reading_a_missing_document_is_reported_with_its_path() {
        let error = DocumentUpload::from_path(std::path::Path::new("/nonexistent/lights.pdf"))
            .await
            .expect_err("missing file");

        assert!(error.to_string().contains("/nonexistent/lights.pdf"));
        assert!(!error.is_retryable());
    }
}
