//! Form and selection controller.
//!
//! This is the playground's UI-facing state: the example selector, the
//! source field, the result field, and the notices surfaced as alerts. The
//! rendering layer is an external collaborator; this module owns the
//! transitions.
//!
//! # Ordering
//!
//! Backend calls are asynchronous, and the user may issue a new submission
//! or selection while an earlier one is still pending. Each field carries a
//! monotonic sequence counter; an operation takes a ticket when it starts
//! and commits its response only if no later operation has taken a ticket
//! since. Stale, slower responses never overwrite a field after a later
//! request completed (last writer wins).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::backend::ExecutionBackend;

/// Placeholder shown while a backend call is pending.
pub const WAITING_PLACEHOLDER: &str = "Waiting...";

/// State of the result field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultField {
    /// Nothing has been submitted yet.
    Idle,
    /// A submission is pending; the placeholder is shown.
    Waiting,
    /// An outcome is displayed: default styling on success, attention
    /// styling (red) on failure.
    Shown {
        /// The backend's output text.
        text: String,
        /// Whether to render with success styling.
        succeeded: bool,
    },
}

/// State of the source field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceField {
    /// An example fetch is pending; the placeholder is shown.
    Waiting,
    /// Source text, either fetched or typed.
    Text(String),
}

impl SourceField {
    /// The text the field currently displays.
    ///
    /// Submitting while the placeholder is shown submits the placeholder
    /// text, exactly as a real form would.
    pub fn text(&self) -> &str {
        match self {
            Self::Waiting => WAITING_PLACEHOLDER,
            Self::Text(text) => text,
        }
    }
}

struct UiState {
    catalog: Vec<String>,
    selected: Option<String>,
    source: SourceField,
    result: ResultField,
    notices: Vec<String>,
}

/// The form/selection state machine over one execution backend.
///
/// All operations catch backend errors and turn them into UI state; nothing
/// propagates and nothing is retried automatically.
pub struct PlaygroundController {
    backend: Arc<dyn ExecutionBackend>,
    state: Mutex<UiState>,
    source_seq: AtomicU64,
    result_seq: AtomicU64,
}

impl PlaygroundController {
    /// Create a controller over the composed backend.
    pub fn new(backend: Arc<dyn ExecutionBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(UiState {
                catalog: Vec::new(),
                selected: None,
                source: SourceField::Text(String::new()),
                result: ResultField::Idle,
                notices: Vec::new(),
            }),
            source_seq: AtomicU64::new(0),
            result_seq: AtomicU64::new(0),
        }
    }

    /// Populate the selector and dispatch the synthetic first selection.
    ///
    /// Identifiers are displayed in ascending lexicographic order regardless
    /// of the order the backend returned them in. Fetch failure raises a
    /// notice and leaves the selector empty.
    pub async fn init(&self) {
        match self.backend.list_examples().await {
            Ok(mut ids) => {
                ids.sort();
                let first = ids.first().cloned();
                self.state.lock().catalog = ids;

                // Selecting the first entry mirrors a selector's initial
                // change event
                if let Some(id) = first {
                    self.select(&id).await;
                }
            }
            Err(e) => {
                warn!(error = %e, "Example list fetch failed");
                self.notice(e.to_string());
            }
        }
    }

    /// Handle a selector change: load the chosen example into the source
    /// field.
    pub async fn select(&self, id: &str) {
        let ticket = self.take_ticket(&self.source_seq);
        {
            let mut state = self.state.lock();
            state.selected = Some(id.to_string());
            state.source = SourceField::Waiting;
        }

        debug!(id = %id, ticket, "Selection changed");

        match self.backend.fetch_example(id).await {
            Ok(text) => {
                if self.is_current(&self.source_seq, ticket) {
                    self.state.lock().source = SourceField::Text(text);
                }
            }
            Err(e) => {
                // The field keeps its placeholder; only the notice surfaces
                if self.is_current(&self.source_seq, ticket) {
                    self.notice(e.to_string());
                }
            }
        }
    }

    /// Handle a direct edit of the source field.
    ///
    /// A manual edit counts as a writer: any pending example fetch becomes
    /// stale and will not clobber the typed text.
    pub fn set_source(&self, text: impl Into<String>) {
        self.take_ticket(&self.source_seq);
        self.state.lock().source = SourceField::Text(text.into());
    }

    /// Handle a submit: run the current source through the backend.
    ///
    /// If the backend is not ready the call is not attempted: a notice is
    /// raised and the result field is left untouched.
    pub async fn submit(&self) {
        if !self.backend.is_ready() {
            warn!("Submit rejected: runtime not ready");
            self.notice("The runtime has not finished loading yet.");
            return;
        }

        let source = self.state.lock().source.text().to_string();
        let ticket = self.take_ticket(&self.result_seq);
        self.state.lock().result = ResultField::Waiting;

        debug!(ticket, source_len = source.len(), "Submitting source");

        match self.backend.run(&source).await {
            Ok(outcome) => {
                if self.is_current(&self.result_seq, ticket) {
                    self.state.lock().result = ResultField::Shown {
                        text: outcome.output,
                        succeeded: outcome.succeeded,
                    };
                }
            }
            Err(e) => {
                // Transport-class failure: notice only, no outcome committed
                if self.is_current(&self.result_seq, ticket) {
                    self.notice(e.to_string());
                }
            }
        }
    }

    /// The selector's entries, in display order.
    pub fn catalog(&self) -> Vec<String> {
        self.state.lock().catalog.clone()
    }

    /// The currently selected example identifier.
    pub fn selected(&self) -> Option<String> {
        self.state.lock().selected.clone()
    }

    /// The source field contents.
    pub fn source(&self) -> SourceField {
        self.state.lock().source.clone()
    }

    /// The result field state.
    pub fn result(&self) -> ResultField {
        self.state.lock().result.clone()
    }

    /// Drain the oldest pending notice, if any.
    pub fn take_notice(&self) -> Option<String> {
        let mut state = self.state.lock();
        if state.notices.is_empty() {
            None
        } else {
            Some(state.notices.remove(0))
        }
    }

    fn notice(&self, message: impl Into<String>) {
        self.state.lock().notices.push(message.into());
    }

    fn take_ticket(&self, seq: &AtomicU64) -> u64 {
        seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, seq: &AtomicU64, ticket: u64) -> bool {
        seq.load(Ordering::SeqCst) == ticket
    }
}

impl std::fmt::Debug for PlaygroundController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PlaygroundController")
            .field("catalog", &state.catalog.len())
            .field("selected", &state.selected)
            .field("result", &state.result)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_field_placeholder_text() {
        assert_eq!(SourceField::Waiting.text(), WAITING_PLACEHOLDER);
        assert_eq!(SourceField::Text("print 1".into()).text(), "print 1");
    }
}
