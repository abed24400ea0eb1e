//! Currency display helpers and the trending-currencies abstraction

use crate::core::rate::{CurrencyRate, RateCatalog};
use anyhow::Result;
use async_trait::async_trait;

pub const DEFAULT_ICON_BASE_URL: &str =
    "https://raw.githubusercontent.com/Switcheo/token-icons/refs/heads/main/tokens";

const DISPLAY_LIMIT: usize = 10;

/// Builds the icon location for a currency. The resource is not checked.
pub fn icon_url(base_url: &str, code: &str) -> String {
    format!("{}/{code}.svg", base_url.trim_end_matches('/'))
}

/// Shortens long values for narrow read-only fields.
pub fn truncate_display(value: &str) -> String {
    if value.chars().count() > DISPLAY_LIMIT {
        let head: String = value.chars().take(DISPLAY_LIMIT).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}

/// Catalog entries that are also listed as popular, in catalog order. Popular
/// codes without a known rate are left out.
pub fn popular_options<'a>(catalog: &'a RateCatalog, popular: &[String]) -> Vec<&'a CurrencyRate> {
    catalog
        .iter()
        .filter(|rate| popular.contains(&rate.code))
        .collect()
}

/// Currency preselected in an empty selector: the first popular option.
pub fn default_currency<'a>(catalog: &'a RateCatalog, popular: &[String]) -> Option<&'a str> {
    popular_options(catalog, popular)
        .first()
        .map(|rate| rate.code.as_str())
}

/// Case-insensitive substring match on the currency code, in catalog order.
pub fn search<'a>(catalog: &'a RateCatalog, query: &str) -> Vec<&'a CurrencyRate> {
    let query = query.to_lowercase();
    catalog
        .iter()
        .filter(|rate| rate.code.to_lowercase().contains(&query))
        .collect()
}

#[async_trait]
pub trait PopularCurrencyProvider: Send + Sync {
    async fn popular_currencies(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate::RateObservation;

    fn catalog() -> RateCatalog {
        let observations = ["BLUR", "ETH", "USDC", "OSMO", "stATOM"]
            .map(|code| RateObservation::new(code, "2023-08-29T07:10:40.000Z", Some(1.0)));
        RateCatalog::from_observations(observations)
    }

    fn codes(rates: &[&CurrencyRate]) -> Vec<String> {
        rates.iter().map(|r| r.code.clone()).collect()
    }

    #[test]
    fn test_popular_options_follow_catalog_order() {
        let popular = vec![
            "USDC".to_string(),
            "WBTC".to_string(),
            "ETH".to_string(),
        ];

        let catalog = catalog();
        let options = popular_options(&catalog, &popular);
        assert_eq!(codes(&options), vec!["ETH", "USDC"]);
    }

    #[test]
    fn test_default_currency_is_first_popular_option() {
        let catalog = catalog();
        let popular = vec!["OSMO".to_string(), "USDC".to_string()];
        assert_eq!(default_currency(&catalog, &popular), Some("USDC"));

        let unknown = vec!["WBTC".to_string()];
        assert_eq!(default_currency(&catalog, &unknown), None);
        assert_eq!(default_currency(&RateCatalog::empty(), &popular), None);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let catalog = catalog();
        assert_eq!(codes(&search(&catalog, "atom")), vec!["stATOM"]);
        assert_eq!(
            codes(&search(&catalog, "S")),
            vec!["USDC", "OSMO", "stATOM"]
        );
        assert_eq!(search(&catalog, "").len(), 5);
        assert!(search(&catalog, "doge").is_empty());
    }

    #[test]
    fn test_icon_url() {
        assert_eq!(
            icon_url(DEFAULT_ICON_BASE_URL, "ETH"),
            "https://raw.githubusercontent.com/Switcheo/token-icons/refs/heads/main/tokens/ETH.svg"
        );
        assert_eq!(
            icon_url("http://icons.local/", "USDC"),
            "http://icons.local/USDC.svg"
        );
    }

    #[test]
    fn test_truncate_display() {
        assert_eq!(truncate_display("1234.56"), "1234.56");
        assert_eq!(truncate_display("1234567890"), "1234567890");
        assert_eq!(truncate_display("12345678901.5"), "1234567890...");
    }
}
