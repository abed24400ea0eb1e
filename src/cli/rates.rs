use super::ui;
use crate::core::currency::{icon_url, search};
use crate::core::rate::{CurrencyRate, RateCatalog};
use comfy_table::Cell;

const DATE_FORMAT: &str = "%d %B %Y";

pub fn display_rates(title: &str, rates: &[&CurrencyRate], icon_base_url: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Price (USD)"),
        ui::header_cell("Last updated"),
        ui::header_cell("Icon"),
    ]);

    for rate in rates {
        table.add_row(vec![
            Cell::new(&rate.code),
            ui::number_cell(format!("{}", rate.rate)),
            Cell::new(rate.observed_at.format(DATE_FORMAT).to_string()),
            Cell::new(ui::style_text(
                &icon_url(icon_base_url, &rate.code),
                ui::StyleType::Subtle,
            )),
        ]);
    }

    format!(
        "{}\n\n{}\n\n{}: {}",
        ui::style_text(title, ui::StyleType::Title),
        table,
        ui::style_text("Currencies", ui::StyleType::TotalLabel),
        ui::style_text(&rates.len().to_string(), ui::StyleType::TotalValue)
    )
}

impl RateCatalog {
    pub fn display_as_table(&self, icon_base_url: &str) -> String {
        let rates: Vec<&CurrencyRate> = self.iter().collect();
        display_rates("Latest rates", &rates, icon_base_url)
    }
}

/// Prints the catalog, or only the currencies matching `query`.
pub fn run(catalog: &RateCatalog, icon_base_url: &str, query: Option<&str>) {
    if catalog.is_empty() {
        println!(
            "{}",
            ui::style_text("No rates available.", ui::StyleType::Error)
        );
        return;
    }

    match query {
        Some(query) => {
            let matches = search(catalog, query);
            if matches.is_empty() {
                println!("No currency matches \"{query}\".");
                return;
            }
            let title = format!("Rates matching \"{query}\"");
            println!("{}", display_rates(&title, &matches, icon_base_url));
        }
        None => println!("{}", catalog.display_as_table(icon_base_url)),
    }
}
