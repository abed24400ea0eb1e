//! User-facing notifications raised by failed HTTP calls.
//!
//! Error responses are turned into short messages the way a toast layer would
//! show them. A 401 response triggers the session-expired hook instead.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{error, warn};

pub const FALLBACK_MESSAGE: &str = "Something went wrong";
pub const NO_RESPONSE_MESSAGE: &str = "No response received from server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    /// Called on 401 responses in place of any notice.
    fn session_expired(&self);
}

/// Sends notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        let Notice::Error(message) = notice;
        error!(%message, "Request failed");
    }

    fn session_expired(&self) {
        warn!("Session expired");
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    errors: Option<BTreeMap<String, String>>,
}

/// What a failed response should surface to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    SessionExpired,
    Notify(Vec<Notice>),
}

/// Maps a non-success status and its body to notices.
pub fn outcome_for_status(status: u16, body: &str) -> FailureOutcome {
    if status == 401 {
        return FailureOutcome::SessionExpired;
    }

    let body: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let notices = match body.errors {
        Some(errors) if !errors.is_empty() => errors.into_values().map(Notice::Error).collect(),
        _ => vec![Notice::Error(
            body.message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        )],
    };
    FailureOutcome::Notify(notices)
}

/// Maps a failure that produced no HTTP response.
pub fn outcome_for_transport(error: &dyn std::fmt::Display, request_sent: bool) -> FailureOutcome {
    let message = if request_sent {
        NO_RESPONSE_MESSAGE.to_string()
    } else {
        format!("An error occurred: {error}")
    };
    FailureOutcome::Notify(vec![Notice::Error(message)])
}

/// Delivers an outcome to a notifier.
pub fn dispatch(notifier: &dyn Notifier, outcome: FailureOutcome) {
    match outcome {
        FailureOutcome::SessionExpired => notifier.session_expired(),
        FailureOutcome::Notify(notices) => notices.into_iter().for_each(|n| notifier.notify(n)),
    }
}
