use super::ui;
use crate::core::currency::{PopularCurrencyProvider, icon_url, popular_options};
use crate::core::rate::{CurrencyRate, RateCatalog};
use anyhow::Result;
use comfy_table::Cell;

pub fn display_popular(options: &[&CurrencyRate], icon_base_url: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Currency"),
        ui::header_cell("Price (USD)"),
        ui::header_cell("Icon"),
    ]);

    for (rank, rate) in options.iter().enumerate() {
        table.add_row(vec![
            ui::number_cell((rank + 1).to_string()),
            Cell::new(&rate.code),
            ui::number_cell(rate.rate.to_string()),
            Cell::new(ui::style_text(
                &icon_url(icon_base_url, &rate.code),
                ui::StyleType::Subtle,
            )),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Popular currencies", ui::StyleType::Title),
        table
    )
}

pub async fn run(
    provider: &dyn PopularCurrencyProvider,
    catalog: &RateCatalog,
    icon_base_url: &str,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching popular currencies...");
    let codes = provider.popular_currencies().await;
    pb.finish_and_clear();

    let codes = codes?;
    let options = popular_options(catalog, &codes);
    if options.is_empty() {
        println!("No popular currency has a known rate.");
        return Ok(());
    }
    println!("{}", display_popular(&options, icon_base_url));
    Ok(())
}
