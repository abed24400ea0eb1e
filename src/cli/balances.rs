use super::ui;
use crate::core::balance::{BalanceFilter, BalanceRow, PriceLookup, balance_rows};
use crate::core::config::WalletConfig;
use crate::core::rate::RateCatalog;
use comfy_table::Cell;

/// Configured prices first, then the fetched rates.
struct WalletPrices<'a> {
    overrides: &'a std::collections::HashMap<String, f64>,
    catalog: &'a RateCatalog,
}

impl PriceLookup for WalletPrices<'_> {
    fn usd_price(&self, currency: &str) -> Option<f64> {
        self.overrides
            .usd_price(currency)
            .or_else(|| self.catalog.usd_price(currency))
    }
}

pub fn rows_for_wallet(
    wallet: &WalletConfig,
    catalog: &RateCatalog,
    filter: BalanceFilter,
) -> Vec<BalanceRow> {
    let prices = WalletPrices {
        overrides: &wallet.prices,
        catalog,
    };
    balance_rows(&wallet.balances, &prices, filter)
}

pub fn display_rows(rows: &[BalanceRow]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Blockchain"),
        ui::header_cell("Currency"),
        ui::header_cell("Amount"),
        ui::header_cell("Value (USD)"),
    ]);

    for row in rows {
        table.add_row(vec![
            Cell::new(&row.id),
            Cell::new(format!("{} ({})", row.blockchain, row.priority)),
            Cell::new(&row.currency),
            ui::number_cell(row.formatted_amount.clone()),
            ui::usd_cell(row.usd_value),
        ]);
    }

    let total: f64 = rows.iter().map(|r| r.usd_value).sum();
    format!(
        "{}\n\n{}\n\n{}: {}",
        ui::style_text("Wallet balances", ui::StyleType::Title),
        table,
        ui::style_text("Total Value (USD)", ui::StyleType::TotalLabel),
        ui::style_text(&format!("{total:.2}"), ui::StyleType::TotalValue)
    )
}

pub fn run(wallet: &WalletConfig, catalog: &RateCatalog, filter: BalanceFilter) {
    if filter == BalanceFilter::Literal {
        eprintln!(
            "{}",
            ui::style_text(
                "Using the literal filter: only empty or negative balances are listed.",
                ui::StyleType::Subtle
            )
        );
    }

    let rows = rows_for_wallet(wallet, catalog, filter);
    if rows.is_empty() {
        println!("No balances to display.");
        return;
    }
    println!("{}", display_rows(&rows));
}
