use crate::{
    error::DeliveryError,
    remote::client::{CollectorClient, body_excerpt},
};
use engine_core::retry::{RetryDisposition, RetryError, RetryPolicy};
use model::records::batch::Batch;
use std::sync::Arc;
use tracing::{debug, info};

/// Posts batches to the collector as `{"data": [...]}`.
pub struct Forwarder {
    client: Arc<CollectorClient>,
    url: String,
    retry: RetryPolicy,
}

impl Forwarder {
    pub fn new(client: Arc<CollectorClient>, url: impl Into<String>, retry: RetryPolicy) -> Self {
        Forwarder {
            client,
            url: url.into(),
            retry,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Delivers one batch. Transport failures and non-2xx answers are
    /// retried alike; a batch that cannot be encoded is not.
    pub async fn forward(&self, batch: &Batch) -> Result<(), RetryError<DeliveryError>> {
        let body = batch
            .to_envelope_json()
            .map_err(|e| RetryError::Fatal(DeliveryError::Encode(e)))?;

        self.retry
            .run(|| self.post(&body), classify_delivery)
            .await?;

        info!(records = batch.len(), "Batch delivered");
        Ok(())
    }

    async fn post(&self, body: &[u8]) -> Result<(), DeliveryError> {
        debug!(url = %self.url, bytes = body.len(), "Posting batch");

        let response = self.client.post(&self.url).body(body.to_vec()).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.bytes().await.unwrap_or_default();
        Err(DeliveryError::Status {
            status,
            body: body_excerpt(&body),
        })
    }
}

fn classify_delivery(err: &DeliveryError) -> RetryDisposition {
    match err {
        DeliveryError::Encode(_) => RetryDisposition::Stop,
        DeliveryError::Transport(_) | DeliveryError::Status { .. } => RetryDisposition::Retry,
    }
}
