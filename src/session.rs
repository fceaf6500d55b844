use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::User;

/// Read-only view state handed to loaders and renderers.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    pub current_user: Option<User>,
}

impl ViewContext {
    pub fn new(current_user: Option<User>) -> Self {
        Self { current_user }
    }

    pub fn user_name(&self) -> Option<&str> {
        self.current_user.as_ref().map(|user| user.name.as_str())
    }
}

/// Hands out generation tickets so a refresh overtaken by a newer one can
/// be dropped instead of published.
///
/// Owned by embedders that re-run refreshes against a long-lived view. The
/// one-shot CLI fetches once and never needs it.
#[derive(Debug, Clone, Default)]
pub struct RefreshGuard {
    generation: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a refresh; every earlier ticket becomes stale.
    pub fn begin(&self) -> RefreshTicket {
        RefreshTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Returns `value` only if no newer refresh has started since `ticket`.
    pub fn accept<T>(&self, ticket: RefreshTicket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }
}
