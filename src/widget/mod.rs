//! Order lookup widget.
//!
//! Reads an order identifier from its host page, asks the order service for
//! the record and renders either the pretty-printed JSON or a one-line error
//! into the page's result area. The host page (a browser page, a terminal,
//! a test double) is abstracted by [`Page`]; the network by [`OrderSource`].
//!
//! Lookups are never cancelled. Every trigger takes a generation ticket, and
//! a response that resolves after a newer trigger is dropped, so the result
//! area always belongs to the most recent trigger.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

pub mod http;

pub use http::HttpOrderSource;

/// Shown when the identifier field is empty after trimming.
pub const EMPTY_IDENTIFIER_MESSAGE: &str = "Please enter an Order UID";

/// Shown when the service reports failure without an `error` field.
pub const NOT_FOUND_FALLBACK: &str = "Order not found";

/// Content of the result area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultArea {
    Empty,
    /// A single error line.
    Error(String),
    /// Pretty-printed JSON, shown as preformatted text.
    Json(String),
}

/// The surface the widget is bound to.
pub trait Page: Send + Sync {
    /// Current value of the identifier input.
    fn identifier(&self) -> String;

    /// Replace the whole result area with `content`.
    fn render(&self, content: ResultArea);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other(String),
}

/// Input events delivered by the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The lookup control was activated (clicked).
    Activate,
    /// A key was pressed while the identifier input had focus.
    KeyPress(Key),
}

/// Raw reply to `GET /order/{identifier}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupReply {
    pub status: u16,
    pub body: String,
}

impl LookupReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("invalid service URL: {0}")]
    InvalidBaseUrl(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Parse(#[from] serde_json::Error),
}

/// Where order records come from.
#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn fetch(&self, identifier: &str) -> Result<LookupReply, LookupError>;
}

/// What a handled event did to the result area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStatus {
    /// The event does not trigger a lookup.
    Ignored,
    /// Empty identifier; no request was made.
    Rejected,
    /// The outcome was rendered.
    Rendered(ResultArea),
    /// A newer trigger started while this lookup was in flight.
    Superseded,
}

/// Bind a widget to its page. Call once when the page is ready; the returned
/// widget owns every piece of state the lookups need.
pub fn init<P: Page>(page: P, source: Arc<dyn OrderSource>) -> LookupWidget<P> {
    tracing::debug!("Order lookup widget initialized");
    LookupWidget {
        page,
        source,
        generation: Mutex::new(0),
    }
}

pub struct LookupWidget<P> {
    page: P,
    source: Arc<dyn OrderSource>,
    generation: Mutex<u64>,
}

impl<P: Page> LookupWidget<P> {
    pub fn page(&self) -> &P {
        &self.page
    }

    /// Dispatch a host event. Activation and Enter trigger a lookup.
    pub async fn handle(&self, event: UiEvent) -> LookupStatus {
        match event {
            UiEvent::Activate | UiEvent::KeyPress(Key::Enter) => self.lookup().await,
            UiEvent::KeyPress(Key::Other(_)) => LookupStatus::Ignored,
        }
    }

    /// Run one lookup for the identifier currently in the page.
    pub async fn lookup(&self) -> LookupStatus {
        let raw = self.page.identifier();
        let identifier = raw.trim();

        let ticket = {
            let mut generation = self.lock_generation();
            *generation += 1;
            self.page.render(ResultArea::Empty);
            *generation
        };

        if identifier.is_empty() {
            let content = ResultArea::Error(EMPTY_IDENTIFIER_MESSAGE.to_string());
            self.page.render(content);
            return LookupStatus::Rejected;
        }

        let content = match self.source.fetch(identifier).await {
            Ok(reply) => outcome_of(reply),
            Err(e) => {
                tracing::debug!(identifier, error = %e, "Order lookup failed");
                ResultArea::Error(e.to_string())
            }
        };

        let generation = self.lock_generation();
        if *generation != ticket {
            tracing::debug!(identifier, "Discarding superseded lookup result");
            return LookupStatus::Superseded;
        }
        self.page.render(content.clone());
        LookupStatus::Rendered(content)
    }

    fn lock_generation(&self) -> std::sync::MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Turn a service reply into result-area content.
pub fn outcome_of(reply: LookupReply) -> ResultArea {
    let body: Value = match serde_json::from_str(&reply.body) {
        Ok(body) => body,
        Err(e) => return ResultArea::Error(LookupError::Parse(e).to_string()),
    };

    if !reply.is_success() {
        return ResultArea::Error(failure_message(&body));
    }

    match serde_json::to_string_pretty(&body) {
        Ok(text) => ResultArea::Json(text),
        Err(e) => ResultArea::Error(e.to_string()),
    }
}

/// The `error` field of a failure body as one line of text.
///
/// Non-empty strings, non-zero numbers and `true` are shown as written;
/// anything else (absent, null, empty, zero, false, arrays, objects) gets
/// the fallback.
fn failure_message(body: &Value) -> String {
    match body.get("error") {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => NOT_FOUND_FALLBACK.to_string(),
    }
}
