use super::ui;
use crate::core::controller::{ConversionController, ConversionState, DelayedQuoter, Phase};
use crate::core::config::ConversionConfig;
use crate::core::currency::{default_currency, truncate_display};
use crate::core::rate::{RateCatalog, RateProvider};
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::debug;

pub struct ConvertArgs {
    /// Unset means the first popular currency with a known rate.
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: f64,
    pub swap: bool,
}

/// Fills unset currencies the way an empty selector is preselected: with the
/// first popular option.
pub fn resolve_pair(
    args: &ConvertArgs,
    catalog: &RateCatalog,
    popular: &[String],
) -> Result<(String, String)> {
    let fallback = || {
        default_currency(catalog, popular)
            .map(str::to_string)
            .context("No popular currency has a known rate, pass --from and --to")
    };
    let from = match &args.from {
        Some(code) => code.clone(),
        None => fallback()?,
    };
    let to = match &args.to {
        Some(code) => code.clone(),
        None => fallback()?,
    };
    Ok((from, to))
}

pub fn display_state(state: &ConversionState) -> String {
    let source = state.source.as_deref().unwrap_or("?");
    let target = state.target.as_deref().unwrap_or("?");
    let paid = state
        .source_amount
        .map_or("0".to_string(), |a| a.to_string());
    let received = format!("{:.2}", state.target_amount);

    let mut output = format!(
        "{}\n\n{} {} {}\n{} {} {}",
        ui::style_text("Conversion", ui::StyleType::Title),
        ui::style_text("You pay:", ui::StyleType::TotalLabel),
        paid,
        source,
        ui::style_text("You receive:", ui::StyleType::TotalLabel),
        ui::style_text(&truncate_display(&received), ui::StyleType::TotalValue),
        target,
    );

    let has_amount = state.source_amount.is_some_and(|a| a > 0.0);
    if state.phase == Phase::Idle && has_amount {
        let reason = if state.known_rates == 0 {
            "Rates are unavailable right now."
        } else {
            "No rate is known for one of the selected currencies."
        };
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(reason, ui::StyleType::Subtle)
        ));
    }
    output
}

/// Fills the form the way a user would and waits for the quote to settle.
///
/// `popular` is only consulted when a currency is left unset.
pub async fn convert(
    rates: Arc<dyn RateProvider>,
    config: &ConversionConfig,
    args: &ConvertArgs,
    popular: &[String],
) -> Result<ConversionState> {
    if !args.amount.is_finite() || args.amount < 0.0 {
        bail!("Amount must be a non-negative number, got {}", args.amount);
    }

    let (from, to) = match (&args.from, &args.to) {
        (Some(from), Some(to)) => (from.clone(), to.clone()),
        _ => {
            let catalog = rates.fetch_catalog().await?;
            resolve_pair(args, &catalog, popular)?
        }
    };
    debug!(%from, %to, "Currencies selected");

    let quoter = Arc::new(DelayedQuoter::new(config.quote_latency()));
    let handle = ConversionController::new(rates, quoter)
        .with_debounce(config.debounce())
        .spawn();

    handle.set_source(&from)?;
    handle.set_target(&to)?;
    if args.swap {
        handle.swap()?;
    }
    handle.set_amount(Some(args.amount));

    let (source, target) = if args.swap {
        (&to, &from)
    } else {
        (&from, &to)
    };
    let state = handle
        .wait_until(|s| {
            s.is_settled()
                && s.source_amount == Some(args.amount)
                && s.source.as_ref() == Some(source)
                && s.target.as_ref() == Some(target)
        })
        .await?;
    debug!(?state, "Conversion settled");

    handle.shutdown().await;
    Ok(state)
}

pub async fn run(
    rates: Arc<dyn RateProvider>,
    config: &ConversionConfig,
    args: &ConvertArgs,
    popular: &[String],
) -> Result<()> {
    let pb = ui::new_spinner("Converting...");
    let state = convert(rates, config, args, popular).await;
    pb.finish_and_clear();

    println!("{}", display_state(&state?));
    Ok(())
}
