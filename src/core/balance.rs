//! Wallet balances ranked by the priority of the chain they live on

use crate::core::rate::RateCatalog;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Priority assigned to any chain not listed in [`chain_priority`].
pub const UNKNOWN_PRIORITY: i32 = -99;

/// Fixed priority table. Lookups are exact and case sensitive.
pub fn chain_priority(blockchain: &str) -> i32 {
    match blockchain {
        "Osmosis" => 100,
        "Ethereum" => 50,
        "Arbitrum" => 30,
        "Zilliqa" => 20,
        "Neo" => 20,
        _ => UNKNOWN_PRIORITY,
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WalletBalance {
    pub id: String,
    pub currency: String,
    pub amount: f64,
    pub blockchain: String,
}

impl WalletBalance {
    pub fn priority(&self) -> i32 {
        chain_priority(&self.blockchain)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceRow {
    pub id: String,
    pub currency: String,
    pub blockchain: String,
    pub priority: i32,
    pub amount: f64,
    pub formatted_amount: String,
    pub usd_value: f64,
}

/// Which balances survive the validity check. Both variants require a known
/// chain; they differ only in the amount condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceFilter {
    /// Keep balances holding a positive amount.
    #[default]
    PositiveAmount,
    /// Keep balances whose amount is zero or negative. Matches the legacy
    /// wallet page, which inverted the amount check.
    Literal,
}

impl BalanceFilter {
    pub fn keeps(&self, balance: &WalletBalance) -> bool {
        if balance.priority() <= UNKNOWN_PRIORITY {
            return false;
        }
        match self {
            BalanceFilter::PositiveAmount => balance.amount > 0.0,
            BalanceFilter::Literal => balance.amount <= 0.0,
        }
    }
}

/// Source of USD prices keyed by currency code.
pub trait PriceLookup {
    fn usd_price(&self, currency: &str) -> Option<f64>;
}

impl PriceLookup for HashMap<String, f64> {
    fn usd_price(&self, currency: &str) -> Option<f64> {
        self.get(currency).copied()
    }
}

impl PriceLookup for RateCatalog {
    fn usd_price(&self, currency: &str) -> Option<f64> {
        self.rate(currency)
    }
}

/// Formats with zero decimal places, rounding half away from zero.
pub fn format_amount(amount: f64) -> String {
    format!("{:.0}", amount.round())
}

/// Filters, sorts by descending chain priority and maps balances to rows.
/// The input slice is left untouched.
pub fn balance_rows(
    balances: &[WalletBalance],
    prices: &dyn PriceLookup,
    filter: BalanceFilter,
) -> Vec<BalanceRow> {
    let mut kept: Vec<&WalletBalance> = balances.iter().filter(|b| filter.keeps(b)).collect();
    kept.sort_by_key(|b| std::cmp::Reverse(b.priority()));

    kept.into_iter()
        .map(|balance| {
            let usd_value = prices
                .usd_price(&balance.currency)
                .filter(|p| p.is_finite() && *p != 0.0)
                .map_or(0.0, |p| p * balance.amount);
            BalanceRow {
                id: balance.id.clone(),
                currency: balance.currency.clone(),
                blockchain: balance.blockchain.clone(),
                priority: balance.priority(),
                amount: balance.amount,
                formatted_amount: format_amount(balance.amount),
                usd_value,
            }
        })
        .collect()
}
