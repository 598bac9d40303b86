//! Debounced incremental search
//!
//! Keystrokes update the shared search field immediately; the fetch for the
//! field's value is issued only after the input has been quiet for the
//! debounce window. Each keystroke restarts the window.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::remote::SearchTerm;

/// Default quiescence window before a search is sent
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// The text currently typed in a search box.
///
/// Shared between the search controller and the mutation coordinator, which
/// reloads with whatever the operator last typed.
#[derive(Debug, Clone, Default)]
pub struct SearchField(Arc<RwLock<String>>);

impl SearchField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, text: impl Into<String>) {
        *self.0.write() = text.into();
    }

    pub fn get(&self) -> String {
        self.0.read().clone()
    }

    pub fn term(&self) -> SearchTerm {
        SearchTerm::new(self.0.read().as_str())
    }
}

/// Converts keystrokes into at most one fetch per quiet period.
#[derive(Debug)]
pub struct DebouncedSearch {
    window: Duration,
    field: SearchField,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedSearch {
    pub fn new(window: Duration) -> Self {
        Self::with_field(window, SearchField::new())
    }

    pub fn with_field(window: Duration, field: SearchField) -> Self {
        Self {
            window,
            field,
            timer: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn field(&self) -> &SearchField {
        &self.field
    }

    /// Record new search text and restart the debounce window.
    ///
    /// When the window elapses, `fetch` is called with the field's value at
    /// that moment and the resulting future runs as its own task, so later
    /// keystrokes or `cancel` never abort a request already sent. An empty
    /// field fetches the unfiltered list.
    ///
    /// Must be called from within a tokio runtime.
    pub fn input<F, Fut>(&self, text: impl Into<String>, fetch: F)
    where
        F: FnOnce(SearchTerm) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.field.set(text);

        let field = self.field.clone();
        let window = self.window;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let term = field.term();
            tracing::debug!("search window elapsed, fetching {term}");
            tokio::spawn(fetch(term));
        });

        if let Some(previous) = self.timer.lock().replace(timer) {
            previous.abort();
        }
    }

    /// Cancel the pending timer, if any. In-flight fetches are unaffected.
    pub fn cancel(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
    }

    pub fn current_term(&self) -> SearchTerm {
        self.field.term()
    }

    /// Whether a timer is waiting to fire.
    pub fn is_armed(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for DebouncedSearch {
    fn drop(&mut self) {
        self.cancel();
    }
}
