use std::time::Duration;

use async_trait::async_trait;
use lightquote_core::config::{AppConfig, WebhookConfig};
use lightquote_core::QuoteSubmission;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::WebhookError;
use crate::retry::{deliver, Delivery, DeliveryFailure, RetryPolicy};

const WEBHOOK: &str = "submission";

#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, submission: &QuoteSubmission) -> Result<Delivery<()>, DeliveryFailure>;
}

#[derive(Clone, Debug)]
pub struct SubmissionClient {
    http: Client,
    url: Option<SecretString>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl SubmissionClient {
    pub fn new(http: Client, webhook: &WebhookConfig, retry: RetryPolicy) -> Self {
        Self {
            http,
            url: webhook.url.clone(),
            timeout: Duration::from_secs(webhook.timeout_secs),
            retry,
        }
    }

    pub fn from_config(http: Client, config: &AppConfig) -> Self {
        Self::new(http, &config.submission, RetryPolicy::from_config(&config.retry))
    }

    async fn post_once(&self, url: &str, submission: &QuoteSubmission) -> Result<(), WebhookError> {
        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .json(submission)
            .send()
            .await
            .map_err(|source| WebhookError::Transport { webhook: WEBHOOK, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Status { webhook: WEBHOOK, status: status.as_u16() });
        }
        Ok(())
    }
}

#[async_trait]
impl SubmissionSink for SubmissionClient {
    async fn submit(&self, submission: &QuoteSubmission) -> Result<Delivery<()>, DeliveryFailure> {
        let Some(url) = self.url.as_ref() else {
            return Err(DeliveryFailure::before_sending(WebhookError::NotConfigured {
                webhook: WEBHOOK,
            }));
        };
        let url = url.expose_secret();

        info!(
            event_name = "webhook.submission.started",
            products = submission.products.len(),
            deadline = %submission.deadline,
            "submitting quote request"
        );
        deliver(self.retry, WEBHOOK, move || self.post_once(url, submission)).await
    }
}

/// Keeps submissions in memory instead of posting them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    submissions: Mutex<Vec<QuoteSubmission>>,
}

impl RecordingSink {
    pub async fn recorded(&self) -> Vec<QuoteSubmission> {
        self.submissions.lock().await.clone()
    }
}

#[async_trait]
impl SubmissionSink for RecordingSink {
    async fn submit(&self, submission: &QuoteSubmission) -> Result<Delivery<()>, DeliveryFailure> {
        self.submissions.lock().await.push(submission.clone());
        Ok(Delivery { value: (), attempts: 1 })
    }
}
