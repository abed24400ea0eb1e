//! Price feed observations and the latest-price-per-currency catalog

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A single entry of the raw price feed. Every field is optional because the
/// feed is untyped; incomplete entries are dropped when building a catalog.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RateObservation {
    pub currency: Option<String>,
    pub date: Option<String>,
    pub price: Option<f64>,
}

impl RateObservation {
    pub fn new(currency: &str, date: &str, price: Option<f64>) -> Self {
        Self {
            currency: Some(currency.to_string()),
            date: Some(date.to_string()),
            price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyRate {
    pub code: String,
    pub rate: f64,
    pub observed_at: DateTime<Utc>,
}

/// Parses the raw feed document. Only a non-array document is an error;
/// individual entries that do not match the expected shape are skipped.
pub fn parse_feed(body: &str) -> Result<Vec<RateObservation>> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(body).context("Price feed is not a JSON array")?;
    let total = entries.len();

    let observations: Vec<RateObservation> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();

    if observations.len() < total {
        debug!(
            dropped = total - observations.len(),
            "Skipped malformed price feed entries"
        );
    }
    Ok(observations)
}

fn parse_observed_at(date: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Latest known rate for each currency, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateCatalog {
    rates: Vec<CurrencyRate>,
    index: HashMap<String, usize>,
}

impl RateCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Keeps, per currency code, the observation with the strictly latest
    /// timestamp among those carrying a usable price. Ties keep the first seen.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = RateObservation>,
    {
        let mut catalog = Self::empty();

        for observation in observations {
            let (Some(code), Some(price), Some(date)) =
                (observation.currency, observation.price, observation.date)
            else {
                continue;
            };
            if code.is_empty() || !price.is_finite() || price <= 0.0 {
                continue;
            }
            let Some(observed_at) = parse_observed_at(&date) else {
                debug!(currency = %code, date = %date, "Dropping observation with bad date");
                continue;
            };

            match catalog.index.get(&code) {
                Some(&pos) => {
                    let existing = &mut catalog.rates[pos];
                    if observed_at > existing.observed_at {
                        existing.rate = price;
                        existing.observed_at = observed_at;
                    }
                }
                None => {
                    catalog.index.insert(code.clone(), catalog.rates.len());
                    catalog.rates.push(CurrencyRate {
                        code,
                        rate: price,
                        observed_at,
                    });
                }
            }
        }

        catalog
    }

    pub fn get(&self, code: &str) -> Option<&CurrencyRate> {
        self.index.get(code).map(|&pos| &self.rates[pos])
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.get(code).map(|r| r.rate)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rates.iter().map(|r| r.code.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurrencyRate> {
        self.rates.iter()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_catalog(&self) -> Result<RateCatalog>;
}
