// DataSource contract and the observer registry behind it
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::sample::{ConnectionState, TelemetrySample};

/// Callback receiving each emitted sample batch.
pub type DataCallback = Arc<dyn Fn(&[TelemetrySample]) + Send + Sync>;

/// Callback receiving connection-state transitions.
pub type StateCallback = Arc<dyn Fn(ConnectionState) + Send + Sync>;

#[derive(Debug, Error)]
pub enum SourceError {
    /// A connect raced with an in-flight connect toward a different target.
    /// The simulated source never returns this; it exists for hardware
    /// transports sharing the contract.
    #[error("already connecting to {0}")]
    AlreadyConnecting(String),
}

/// Contract between the host application and a telemetry transport. The host
/// picks one implementation at startup (simulated or hardware) and is unaware
/// of which one is live.
///
/// Precondition, not enforced here: callers keep at most one source active
/// per process.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Establish the connection and start polling. Idempotent while already
    /// connecting or connected.
    async fn connect(&self, device_hint: Option<&str>) -> Result<(), SourceError>;

    /// Stop polling and transition to `Disconnected`. No further batches are
    /// emitted after this returns. Always succeeds; a no-op when already
    /// disconnected.
    async fn disconnect(&self);

    fn connection_state(&self) -> ConnectionState;

    /// Restrict polling to the given channel ids. An empty slice means all
    /// channels configured by the active profile. Takes effect on the next
    /// poll tick.
    fn request_channels(&self, ids: &[String]);

    fn on_data(&self, callback: DataCallback) -> Subscription;

    fn on_connection_change(&self, callback: StateCallback) -> Subscription;

    /// Stop polling and drop every registered callback. Idempotent.
    fn dispose(&self);
}

/// Unsubscribe token returned by the `on_*` registrations. Dropping the token
/// does nothing; callers unsubscribe explicitly on teardown.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Ordered callback list with token-based removal. Invocation order is
/// registration order.
pub struct CallbackRegistry<C> {
    next_id: u64,
    entries: Vec<(u64, C)>,
}

impl<C: Clone> CallbackRegistry<C> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, callback: C) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    pub fn remove(&mut self, id: u64) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the callbacks, so invocation can happen outside any lock
    /// guarding the registry.
    pub fn snapshot(&self) -> Vec<C> {
        self.entries.iter().map(|(_, c)| c.clone()).collect()
    }
}

impl<C: Clone> Default for CallbackRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one consumer callback, isolating a panic so it cannot take down the
/// poll loop or starve the remaining consumers.
pub fn invoke_isolated(what: &str, f: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::error!("{what} callback panicked; continuing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_registry_invokes_in_registration_order() {
        let mut registry: CallbackRegistry<Arc<dyn Fn(&mut Vec<u32>) + Send + Sync>> =
            CallbackRegistry::new();
        registry.insert(Arc::new(|v| v.push(1)));
        registry.insert(Arc::new(|v| v.push(2)));
        registry.insert(Arc::new(|v| v.push(3)));

        let mut seen = Vec::new();
        for cb in registry.snapshot() {
            cb(&mut seen);
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_registry_remove_and_clear() {
        let mut registry: CallbackRegistry<Arc<dyn Fn() + Send + Sync>> = CallbackRegistry::new();
        let a = registry.insert(Arc::new(|| {}));
        let _b = registry.insert(Arc::new(|| {}));
        registry.remove(a);
        assert_eq!(registry.len(), 1);
        // Removing twice is harmless
        registry.remove(a);
        assert_eq!(registry.len(), 1);
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invoke_isolated_swallows_panic() {
        let calls = AtomicUsize::new(0);
        invoke_isolated("test", || panic!("boom"));
        invoke_isolated("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_unsubscribes_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let sub = Subscription::new(move || {
            count2.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
