use crate::core::currency::PopularCurrencyProvider;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Stand-in for a trending-currencies service: answers with a fixed list
/// after a fixed delay.
pub struct SimulatedPopularProvider {
    currencies: Vec<String>,
    latency: Duration,
}

impl SimulatedPopularProvider {
    pub fn new(currencies: Vec<String>, latency: Duration) -> Self {
        Self {
            currencies,
            latency,
        }
    }
}

#[async_trait]
impl PopularCurrencyProvider for SimulatedPopularProvider {
    async fn popular_currencies(&self) -> Result<Vec<String>> {
        debug!(latency = ?self.latency, "Fetching popular currencies");
        tokio::time::sleep(self.latency).await;
        Ok(self.currencies.clone())
    }
}
