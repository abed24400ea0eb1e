//! Drives a conversion form: load rates once, debounce the typed amount, quote
//! the conversion and expose the loading state.
//!
//! All form state lives in one task. Inputs reach it as commands, the amount
//! through a [`Debouncer`]. Starting a new quote drops the previous in-flight
//! one, so only the most recent request can ever publish a result.

use crate::core::convert::{ConversionRequest, ConversionResult, convert};
use crate::core::debounce::{DEFAULT_DEBOUNCE, Debouncer};
use crate::core::rate::{RateCatalog, RateProvider};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_QUOTE_LATENCY: Duration = Duration::from_millis(3000);

/// Produces the converted amount for a request once both rates are known.
#[async_trait]
pub trait Quoter: Send + Sync {
    async fn quote(
        &self,
        request: &ConversionRequest,
        source_rate: f64,
        target_rate: f64,
    ) -> ConversionResult;
}

/// Computes locally after a fixed delay standing in for a remote quote.
#[derive(Debug, Clone)]
pub struct DelayedQuoter {
    latency: Duration,
}

impl DelayedQuoter {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for DelayedQuoter {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTE_LATENCY)
    }
}

#[async_trait]
impl Quoter for DelayedQuoter {
    async fn quote(
        &self,
        request: &ConversionRequest,
        source_rate: f64,
        target_rate: f64,
    ) -> ConversionResult {
        tokio::time::sleep(self.latency).await;
        convert(
            Some(source_rate),
            Some(target_rate),
            Some(request.source_amount),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    LoadingRates,
    Idle,
    Fetching,
    Settled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionState {
    pub phase: Phase,
    pub loading: bool,
    pub source: Option<String>,
    pub target: Option<String>,
    /// Last settled (debounced) amount.
    pub source_amount: Option<f64>,
    pub target_amount: f64,
    /// Request currently being quoted, or the one that produced `target_amount`.
    pub request: Option<ConversionRequest>,
    /// Number of rates available, zero when the rate fetch failed.
    pub known_rates: usize,
}

impl ConversionState {
    fn initial() -> Self {
        Self {
            phase: Phase::LoadingRates,
            loading: false,
            source: None,
            target: None,
            source_amount: None,
            target_amount: 0.0,
            request: None,
            known_rates: 0,
        }
    }

    /// True once the rates are loaded and no quote is outstanding.
    pub fn is_settled(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::Settled)
    }
}

#[derive(Debug)]
enum Command {
    SetSource(String),
    SetTarget(String),
    Swap,
}

type PendingQuote = BoxFuture<'static, (ConversionRequest, ConversionResult)>;

pub struct ConversionController {
    rates: Arc<dyn RateProvider>,
    quoter: Arc<dyn Quoter>,
    debounce: Duration,
}

impl ConversionController {
    pub fn new(rates: Arc<dyn RateProvider>, quoter: Arc<dyn Quoter>) -> Self {
        Self {
            rates,
            quoter,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Starts the controller task. It stops when the handle is dropped.
    pub fn spawn(self) -> ConversionHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (amounts, settled_amounts) = Debouncer::new(self.debounce);
        let (state_tx, state_rx) = watch::channel(ConversionState::initial());

        let task = tokio::spawn(run(
            self.rates,
            self.quoter,
            command_rx,
            settled_amounts,
            state_tx,
        ));

        ConversionHandle {
            commands: command_tx,
            amounts,
            state: state_rx,
            task,
        }
    }
}

pub struct ConversionHandle {
    commands: mpsc::UnboundedSender<Command>,
    amounts: Debouncer<Option<f64>>,
    state: watch::Receiver<ConversionState>,
    task: JoinHandle<()>,
}

impl ConversionHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("Conversion controller has stopped"))
    }

    pub fn set_source(&self, code: &str) -> Result<()> {
        self.send(Command::SetSource(code.to_string()))
    }

    pub fn set_target(&self, code: &str) -> Result<()> {
        self.send(Command::SetTarget(code.to_string()))
    }

    /// Exchanges source and target in a single update.
    pub fn swap(&self) -> Result<()> {
        self.send(Command::Swap)
    }

    /// Feeds a raw amount edit; it only takes effect once it settles.
    pub fn set_amount(&self, amount: Option<f64>) {
        self.amounts.push(amount);
    }

    pub fn state(&self) -> ConversionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversionState> {
        self.state.clone()
    }

    /// Waits until the published state satisfies `predicate`.
    pub async fn wait_until<P>(&self, mut predicate: P) -> Result<ConversionState>
    where
        P: FnMut(&ConversionState) -> bool,
    {
        let mut state = self.state.clone();
        let current = state
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| anyhow!("Conversion controller has stopped"))?;
        Ok(current.clone())
    }

    pub async fn shutdown(self) {
        let ConversionHandle {
            commands,
            amounts,
            task,
            ..
        } = self;
        drop(amounts);
        drop(commands);
        let _ = task.await;
    }
}

#[derive(Debug, Default)]
struct Form {
    source: Option<String>,
    target: Option<String>,
    amount: Option<f64>,
}

impl Form {
    fn apply(&mut self, command: Command) {
        match command {
            Command::SetSource(code) => self.source = Some(code),
            Command::SetTarget(code) => self.target = Some(code),
            Command::Swap => std::mem::swap(&mut self.source, &mut self.target),
        }
    }
}

async fn load_rates(rates: &dyn RateProvider) -> RateCatalog {
    match rates.fetch_catalog().await {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(error = %e, "Rate fetch failed, continuing without rates");
            RateCatalog::empty()
        }
    }
}

/// Publishes the form and, when it is complete, starts a quote for it.
fn restart(
    form: &Form,
    catalog: &RateCatalog,
    quoter: &Arc<dyn Quoter>,
    state: &watch::Sender<ConversionState>,
) -> Option<PendingQuote> {
    let source_rate = form.source.as_deref().and_then(|c| catalog.rate(c));
    let target_rate = form.target.as_deref().and_then(|c| catalog.rate(c));
    let amount = form.amount.filter(|a| a.is_finite() && *a > 0.0);

    let pending = match (&form.source, &form.target, source_rate, target_rate, amount) {
        (Some(source), Some(target), Some(source_rate), Some(target_rate), Some(amount)) => {
            let request = ConversionRequest {
                source: source.clone(),
                target: target.clone(),
                source_amount: amount,
            };
            debug!(?request, "Starting quote");
            let quoter = Arc::clone(quoter);
            let quoted = request.clone();
            Some((
                request,
                async move {
                    let result = quoter.quote(&quoted, source_rate, target_rate).await;
                    (quoted, result)
                }
                .boxed(),
            ))
        }
        _ => None,
    };

    state.send_modify(|s| {
        s.source = form.source.clone();
        s.target = form.target.clone();
        s.source_amount = form.amount;
        match &pending {
            Some((request, _)) => {
                s.phase = Phase::Fetching;
                s.loading = true;
                s.request = Some(request.clone());
            }
            None => {
                s.phase = Phase::Idle;
                s.loading = false;
                s.target_amount = 0.0;
                s.request = None;
            }
        }
    });

    pending.map(|(_, quote)| quote)
}

async fn next_quote(pending: &mut Option<PendingQuote>) -> (ConversionRequest, ConversionResult) {
    match pending {
        Some(quote) => quote.await,
        None => std::future::pending().await,
    }
}

async fn run(
    rates: Arc<dyn RateProvider>,
    quoter: Arc<dyn Quoter>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut amounts: mpsc::UnboundedReceiver<Option<f64>>,
    state: watch::Sender<ConversionState>,
) {
    let catalog = load_rates(rates.as_ref()).await;
    debug!(rates = catalog.len(), "Rates loaded");
    state.send_modify(|s| s.known_rates = catalog.len());

    let mut form = Form::default();
    let mut pending = restart(&form, &catalog, &quoter, &state);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                form.apply(command);
                pending = restart(&form, &catalog, &quoter, &state);
            }
            Some(amount) = amounts.recv() => {
                form.amount = amount;
                pending = restart(&form, &catalog, &quoter, &state);
            }
            (request, result) = next_quote(&mut pending), if pending.is_some() => {
                pending = None;
                debug!(?request, ?result, "Quote settled");
                state.send_modify(|s| {
                    s.phase = Phase::Settled;
                    s.loading = false;
                    s.target_amount = result.target_amount;
                    s.request = Some(request);
                });
            }
        }
    }
    debug!("Conversion controller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate::RateObservation;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    struct StaticRates(RateCatalog);

    #[async_trait]
    impl RateProvider for StaticRates {
        async fn fetch_catalog(&self) -> Result<RateCatalog> {
            Ok(self.0.clone())
        }
    }

    struct FailingRates;

    #[async_trait]
    impl RateProvider for FailingRates {
        async fn fetch_catalog(&self) -> Result<RateCatalog> {
            Err(anyhow!("connection refused"))
        }
    }

    struct CountingQuoter {
        inner: DelayedQuoter,
        completed: AtomicUsize,
    }

    #[async_trait]
    impl Quoter for CountingQuoter {
        async fn quote(
            &self,
            request: &ConversionRequest,
            source_rate: f64,
            target_rate: f64,
        ) -> ConversionResult {
            let result = self.inner.quote(request, source_rate, target_rate).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            result
        }
    }

    fn catalog() -> RateCatalog {
        RateCatalog::from_observations(vec![
            RateObservation::new("AAA", "2023-08-29T07:10:40.000Z", Some(2.0)),
            RateObservation::new("BBB", "2023-08-29T07:10:40.000Z", Some(0.5)),
        ])
    }

    fn counting_quoter() -> Arc<CountingQuoter> {
        Arc::new(CountingQuoter {
            inner: DelayedQuoter::default(),
            completed: AtomicUsize::new(0),
        })
    }

    fn spawn(rates: Arc<dyn RateProvider>, quoter: Arc<dyn Quoter>) -> ConversionHandle {
        ConversionController::new(rates, quoter)
            .with_debounce(Duration::from_millis(500))
            .spawn()
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_settles_after_debounce_and_latency() {
        let quoter = counting_quoter();
        let handle = spawn(Arc::new(StaticRates(catalog())), quoter.clone());

        handle.set_source("AAA").unwrap();
        handle.set_target("BBB").unwrap();
        handle.set_amount(Some(100.0));

        sleep(Duration::from_millis(600)).await;
        let state = handle.state();
        assert_eq!(state.phase, Phase::Fetching);
        assert!(state.loading);
        assert_eq!(state.known_rates, 2);

        sleep(Duration::from_millis(3000)).await;
        let state = handle.state();
        assert_eq!(state.phase, Phase::Settled);
        assert!(!state.loading);
        assert_eq!(state.target_amount, 25.0);
        assert_eq!(quoter.completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_request_supersedes_in_flight_quote() {
        let quoter = counting_quoter();
        let handle = spawn(Arc::new(StaticRates(catalog())), quoter.clone());

        handle.set_source("AAA").unwrap();
        handle.set_target("BBB").unwrap();
        handle.set_amount(Some(100.0));

        // First request starts at 500ms and would finish at 3500ms
        sleep(Duration::from_millis(1500)).await;
        handle.set_amount(Some(200.0));

        // Second request starts at 2000ms
        sleep(Duration::from_millis(2100)).await;
        let state = handle.state();
        assert_eq!(state.phase, Phase::Fetching);
        assert_eq!(state.target_amount, 0.0);
        assert_eq!(state.request.as_ref().unwrap().source_amount, 200.0);
        assert_eq!(quoter.completed.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(1500)).await;
        let state = handle.state();
        assert_eq!(state.phase, Phase::Settled);
        assert_eq!(state.target_amount, 50.0);
        assert_eq!(quoter.completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_amount_cancels_quote() {
        let quoter = counting_quoter();
        let handle = spawn(Arc::new(StaticRates(catalog())), quoter.clone());

        handle.set_source("AAA").unwrap();
        handle.set_target("BBB").unwrap();
        handle.set_amount(Some(100.0));
        sleep(Duration::from_millis(1000)).await;
        assert!(handle.state().loading);

        handle.set_amount(None);
        sleep(Duration::from_secs(10)).await;

        let state = handle.state();
        assert_eq!(state.phase, Phase::Idle);
        assert!(!state.loading);
        assert_eq!(state.target_amount, 0.0);
        assert_eq!(quoter.completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_swap_twice_round_trips() {
        let handle = spawn(
            Arc::new(StaticRates(catalog())),
            Arc::new(DelayedQuoter::default()),
        );

        handle.set_source("AAA").unwrap();
        handle.set_target("BBB").unwrap();
        handle.set_amount(Some(100.0));
        let first = handle
            .wait_until(|s| s.phase == Phase::Settled)
            .await
            .unwrap();
        assert_eq!(first.target_amount, 25.0);

        handle.swap().unwrap();
        let swapped = handle
            .wait_until(|s| s.phase == Phase::Settled && s.source.as_deref() == Some("BBB"))
            .await
            .unwrap();
        assert_eq!(swapped.target.as_deref(), Some("AAA"));
        assert_eq!(swapped.target_amount, 400.0);

        handle.swap().unwrap();
        let back = handle
            .wait_until(|s| s.phase == Phase::Settled && s.source.as_deref() == Some("AAA"))
            .await
            .unwrap();
        assert_eq!(back.target.as_deref(), Some("BBB"));
        assert_eq!(back.target_amount, first.target_amount);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_currency_yields_zero() {
        let handle = spawn(
            Arc::new(StaticRates(catalog())),
            Arc::new(DelayedQuoter::default()),
        );

        handle.set_source("AAA").unwrap();
        handle.set_target("ZZZ").unwrap();
        handle.set_amount(Some(100.0));

        let state = handle
            .wait_until(|s| s.source_amount == Some(100.0))
            .await
            .unwrap();
        assert_eq!(state.phase, Phase::Idle);
        assert!(!state.loading);
        assert_eq!(state.target_amount, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_fetch_failure_degrades_to_zero() {
        let handle = spawn(Arc::new(FailingRates), Arc::new(DelayedQuoter::default()));

        handle.set_source("AAA").unwrap();
        handle.set_target("BBB").unwrap();
        handle.set_amount(Some(100.0));

        let state = handle
            .wait_until(|s| s.source_amount == Some(100.0))
            .await
            .unwrap();
        assert_eq!(state.known_rates, 0);
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.target_amount, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_task() {
        let handle = spawn(
            Arc::new(StaticRates(catalog())),
            Arc::new(DelayedQuoter::default()),
        );
        let mut state = handle.subscribe();
        handle.shutdown().await;
        state.borrow_and_update();

        // Sender is gone once the task has exited
        assert!(state.changed().await.is_err());
    }
}
