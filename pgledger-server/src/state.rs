//! Application state shared across handlers

use std::sync::Arc;

use pgledger_core::Ledger;

/// Shared application state
///
/// Cloning is cheap and does not require `C: Clone`.
pub struct AppState<C> {
    inner: Arc<AppStateInner<C>>,
}

struct AppStateInner<C> {
    ledger: Ledger<C>,
}

impl<C> AppState<C> {
    pub fn new(ledger: Ledger<C>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { ledger }),
        }
    }

    pub fn ledger(&self) -> &Ledger<C> {
        &self.inner.ledger
    }
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
