pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::convert::ConvertArgs;
use crate::core::balance::BalanceFilter;
use crate::core::PopularCurrencyProvider;
use crate::core::config::AppConfig;
use crate::core::notice::Notifier;
use crate::providers::caching::{RateCache, RateService};
use crate::providers::http::ApiClient;
use crate::providers::popular::SimulatedPopularProvider;
use crate::providers::switcheo::SwitcheoRateProvider;
use crate::providers::util::RetryPolicy;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Rates {
        search: Option<String>,
    },
    Convert {
        from: Option<String>,
        to: Option<String>,
        amount: f64,
        swap: bool,
    },
    Popular,
    Balances {
        literal_filter: bool,
    },
}

fn build_rate_service(
    config: &AppConfig,
    notifier: Arc<dyn Notifier>,
) -> Result<Arc<RateService<SwitcheoRateProvider>>> {
    let prices = &config.providers.prices;
    let retry = RetryPolicy {
        retries: prices.retries,
        ..RetryPolicy::default()
    };
    let client = ApiClient::new(Duration::from_millis(prices.timeout_ms), retry, notifier)?;

    let rate_cache = Arc::new(RateCache::with_stale_after(
        config.conversion.rates_stale_after(),
    ));
    let provider = SwitcheoRateProvider::new(&prices.base_url, Arc::new(client));
    Ok(Arc::new(RateService::new(provider, rate_cache)))
}

fn build_popular_provider(config: &AppConfig) -> SimulatedPopularProvider {
    SimulatedPopularProvider::new(
        config.popular.currencies.clone(),
        Duration::from_millis(config.popular.latency_ms),
    )
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxswap starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let rates = build_rate_service(&config, Arc::new(cli::ui::ConsoleNotifier))?;
    let icon_base_url = &config.providers.icons.base_url;

    match command {
        AppCommand::Rates { search } => {
            let catalog = rates.latest().await;
            cli::rates::run(&catalog, icon_base_url, search.as_deref());
            Ok(())
        }
        AppCommand::Convert {
            from,
            to,
            amount,
            swap,
        } => {
            // The popular list only matters when a currency is left unset
            let popular = if from.is_none() || to.is_none() {
                build_popular_provider(&config).popular_currencies().await?
            } else {
                Vec::new()
            };
            let args = ConvertArgs {
                from,
                to,
                amount,
                swap,
            };
            cli::convert::run(rates, &config.conversion, &args, &popular).await
        }
        AppCommand::Popular => {
            let provider = build_popular_provider(&config);
            let catalog = rates.latest().await;
            cli::popular::run(&provider, &catalog, icon_base_url).await
        }
        AppCommand::Balances { literal_filter } => {
            let filter = if literal_filter {
                BalanceFilter::Literal
            } else {
                config.wallet.filter
            };
            let catalog = rates.latest().await;
            cli::balances::run(&config.wallet, &catalog, filter);
            Ok(())
        }
    }
}
