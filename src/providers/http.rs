//! Shared HTTP client that reports failures through a [`Notifier`].

use super::util::{RetryPolicy, with_retry};
use crate::core::notice::{Notifier, dispatch, outcome_for_status, outcome_for_transport};
use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

pub struct ApiClient {
    client: reqwest::Client,
    retry: RetryPolicy,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    pub fn new(timeout: Duration, retry: RetryPolicy, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fxswap/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            retry,
            notifier,
        })
    }

    /// GETs `url` and returns the body of a successful response.
    ///
    /// Any failure is reported to the notifier before being returned.
    #[instrument(name = "HttpGet", skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = match with_retry(|| self.client.get(url).send(), &self.retry).await {
            Ok(response) => response,
            Err(e) => {
                dispatch(
                    self.notifier.as_ref(),
                    outcome_for_transport(&e, !e.is_builder()),
                );
                return Err(anyhow!("Request error: {} for URL: {}", e, url));
            }
        };

        let status = response.status();
        debug!(%status, "Received response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            dispatch(
                self.notifier.as_ref(),
                outcome_for_status(status.as_u16(), &body),
            );
            return Err(anyhow!("HTTP error: {} for URL: {}", status, url));
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))
    }
}
