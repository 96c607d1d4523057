// Distribution fan-out - routes sample batches to per-channel buffers and
// display subscribers
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::application::data_source::{
    invoke_isolated, CallbackRegistry, DataCallback, DataSource, Subscription,
};
use crate::domain::buffer::SampleBuffer;
use crate::domain::sample::TelemetrySample;

struct HubInner {
    buffer_capacity: usize,
    buffers: HashMap<String, SampleBuffer>,
    subscribers: CallbackRegistry<DataCallback>,
}

/// Fans each emitted batch out to per-channel sample buffers and to
/// registered display subscribers. Buffers are created lazily on first
/// reference and live for the process lifetime.
#[derive(Clone)]
pub struct TelemetryHub {
    inner: Arc<Mutex<HubInner>>,
}

fn lock(inner: &Arc<Mutex<HubInner>>) -> MutexGuard<'_, HubInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TelemetryHub {
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                buffer_capacity,
                buffers: HashMap::new(),
                subscribers: CallbackRegistry::new(),
            })),
        }
    }

    /// Register this hub as a data subscriber of `source`. The returned token
    /// detaches it again.
    pub fn attach(&self, source: &dyn DataSource) -> Subscription {
        let hub = self.clone();
        source.on_data(Arc::new(move |batch| hub.ingest(batch)))
    }

    /// Route one batch: every sample into its channel's buffer, then the whole
    /// batch to every display subscriber. The two side effects are
    /// independent; a panicking subscriber cannot block the buffer pushes or
    /// the other subscribers.
    pub fn ingest(&self, batch: &[TelemetrySample]) {
        let listeners = {
            let mut inner = lock(&self.inner);
            let capacity = inner.buffer_capacity;
            for sample in batch {
                inner
                    .buffers
                    .entry(sample.channel_id.clone())
                    .or_insert_with(|| SampleBuffer::new(capacity))
                    .push(sample.clone());
            }
            inner.subscribers.snapshot()
        };
        for cb in listeners {
            invoke_isolated("display", || cb(batch));
        }
    }

    /// Register a display subscriber invoked with every batch.
    pub fn subscribe(&self, callback: DataCallback) -> Subscription {
        let id = lock(&self.inner).subscribers.insert(callback);
        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner).subscribers.remove(id);
            }
        })
    }

    /// Recent history for one channel: samples within `window_ms` of now, in
    /// insertion order. Empty when the channel has no buffer yet.
    pub fn window(&self, channel_id: &str, window_ms: i64) -> Vec<TelemetrySample> {
        lock(&self.inner)
            .buffers
            .get(channel_id)
            .map(|b| b.window(window_ms))
            .unwrap_or_default()
    }

    /// Most recent sample for one channel.
    pub fn latest(&self, channel_id: &str) -> Option<TelemetrySample> {
        lock(&self.inner)
            .buffers
            .get(channel_id)
            .and_then(|b| b.latest().cloned())
    }

    /// Channels that have received at least one sample.
    pub fn buffered_channels(&self) -> Vec<String> {
        let inner = lock(&self.inner);
        let mut ids: Vec<String> = inner.buffers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of live display subscriptions.
    pub fn live_subscriptions(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }

    /// Drop all buffered history, keeping subscribers.
    pub fn clear(&self) {
        for buffer in lock(&self.inner).buffers.values_mut() {
            buffer.clear();
        }
    }
}
