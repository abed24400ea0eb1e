//! Debouncing of rapidly changing input values.
//!
//! A [`Debouncer`] forwards a value only after no newer value has arrived for
//! the configured delay. Every push restarts the timer. A value still pending
//! when the debouncer is cancelled or dropped is discarded, never emitted.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

enum Input<T> {
    Value(T),
    Cancel,
}

pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<Input<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawns the timer task. Settled values arrive on the returned receiver.
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(delay, input_rx, output_tx));
        (
            Self {
                input: input_tx,
                task,
            },
            output_rx,
        )
    }

    /// Replaces any pending value and restarts the delay.
    pub fn push(&self, value: T) {
        if self.input.send(Input::Value(value)).is_err() {
            debug!("Debouncer stopped, dropping value");
        }
    }

    /// Discards the pending value, if any, without emitting it.
    pub fn cancel(&self) {
        let _ = self.input.send(Input::Cancel);
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T>(
    delay: Duration,
    mut input: mpsc::UnboundedReceiver<Input<T>>,
    output: mpsc::UnboundedSender<T>,
) {
    let mut pending: Option<T> = None;

    loop {
        let Some(value) = pending.take() else {
            match input.recv().await {
                Some(Input::Value(value)) => pending = Some(value),
                Some(Input::Cancel) => {}
                None => break,
            }
            continue;
        };

        tokio::select! {
            next = input.recv() => match next {
                Some(Input::Value(newer)) => pending = Some(newer),
                Some(Input::Cancel) => debug!("Pending debounced value cancelled"),
                None => break,
            },
            _ = tokio::time::sleep(delay) => {
                if output.send(value).is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Instant, advance, sleep};

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_last_value_once() {
        let (debouncer, mut settled) = Debouncer::new(Duration::from_millis(500));
        let start = Instant::now();

        debouncer.push(1);
        sleep(Duration::from_millis(100)).await;
        debouncer.push(2);
        sleep(Duration::from_millis(100)).await;
        debouncer.push(3);

        let value = settled.recv().await.unwrap();
        assert_eq!(value, 3);
        assert_eq!(start.elapsed(), Duration::from_millis(700));

        // Nothing else is queued
        sleep(Duration::from_secs(5)).await;
        assert!(settled.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_values_emit_separately() {
        let (debouncer, mut settled) = Debouncer::new(Duration::from_millis(500));

        debouncer.push("a");
        assert_eq!(settled.recv().await, Some("a"));
        debouncer.push("b");
        assert_eq!(settled.recv().await, Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending_value() {
        let (debouncer, mut settled) = Debouncer::new(Duration::from_millis(500));

        debouncer.push(10);
        sleep(Duration::from_millis(400)).await;
        debouncer.cancel();
        sleep(Duration::from_secs(2)).await;
        assert!(settled.try_recv().is_err());

        debouncer.push(11);
        assert_eq!(settled.recv().await, Some(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_never_emits_stale_value() {
        let (debouncer, mut settled) = Debouncer::new(Duration::from_millis(500));

        debouncer.push(1);
        advance(Duration::from_millis(200)).await;
        drop(debouncer);

        // Sender side is gone with the task, so the channel closes empty
        assert_eq!(settled.recv().await, None);
    }
}
