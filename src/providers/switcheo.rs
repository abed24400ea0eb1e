use super::http::ApiClient;
use crate::core::rate::{RateCatalog, RateProvider, parse_feed};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const PRICES_PATH: &str = "/prices.json";

/// Reads the public token price feed, one observation per currency and date.
pub struct SwitcheoRateProvider {
    base_url: String,
    client: Arc<ApiClient>,
}

impl SwitcheoRateProvider {
    pub fn new(base_url: &str, client: Arc<ApiClient>) -> Self {
        SwitcheoRateProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl RateProvider for SwitcheoRateProvider {
    #[instrument(name = "SwitcheoRatesFetch", skip(self), fields(base_url = %self.base_url))]
    async fn fetch_catalog(&self) -> Result<RateCatalog> {
        let url = format!("{}{}", self.base_url, PRICES_PATH);
        debug!("Requesting prices from {}", url);

        let body = self.client.get_text(&url).await?;
        let observations =
            parse_feed(&body).with_context(|| format!("Failed to parse prices from {url}"))?;

        let catalog = RateCatalog::from_observations(observations);
        debug!(currencies = catalog.len(), "Built rate catalog");
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notice::TracingNotifier;
    use crate::providers::util::RetryPolicy;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(status: u16, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(PRICES_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider(base_url: &str) -> SwitcheoRateProvider {
        let client = ApiClient::new(
            Duration::from_secs(5),
            RetryPolicy::default(),
            Arc::new(TracingNotifier),
        )
        .unwrap();
        SwitcheoRateProvider::new(base_url, Arc::new(client))
    }

    const MOCK_JSON: &str = r#"[
        {"currency": "BLUR", "date": "2023-08-29T07:10:40.000Z", "price": 0.20811525423728813},
        {"currency": "bNEO", "date": "2023-08-29T07:10:50.000Z", "price": 7.1282679},
        {"currency": "USD", "date": "2023-08-29T07:10:30.000Z", "price": 1},
        {"currency": "USD", "date": "2023-08-29T07:10:40.000Z", "price": 0.989832},
        {"currency": "ETH", "date": "2023-08-29T07:10:52.000Z"},
        {"currency": "ETH", "date": "2023-08-29T07:10:52.000Z", "price": 1645.9337373737374}
    ]"#;

    #[tokio::test]
    async fn test_successful_catalog_fetch() {
        let mock_server = create_mock_server(200, MOCK_JSON).await;

        let catalog = provider(&mock_server.uri()).fetch_catalog().await.unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.rate("USD"), Some(0.989832));
        assert_eq!(catalog.rate("ETH"), Some(1645.9337373737374));
        let codes: Vec<&str> = catalog.codes().collect();
        assert_eq!(codes, vec!["BLUR", "bNEO", "USD", "ETH"]);
    }

    #[tokio::test]
    async fn test_trailing_slash_in_base_url() {
        let mock_server = create_mock_server(200, MOCK_JSON).await;

        let catalog = provider(&format!("{}/", mock_server.uri()))
            .fetch_catalog()
            .await
            .unwrap();
        assert_eq!(catalog.len(), 4);
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = create_mock_server(500, "").await;

        let result = provider(&mock_server.uri()).fetch_catalog().await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            format!(
                "HTTP error: 500 Internal Server Error for URL: {}/prices.json",
                mock_server.uri()
            )
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server(200, r#"{"prices": []}"#).await;

        let result = provider(&mock_server.uri()).fetch_catalog().await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse prices from")
        );
    }
}
