// Simulated OBD-II telemetry source - state machine and poll loop
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::application::data_source::{
    invoke_isolated, CallbackRegistry, DataCallback, DataSource, SourceError, StateCallback,
    Subscription,
};
use crate::domain::channel;
use crate::domain::pattern::{self, Pattern, PatternConfig, WalkState};
use crate::domain::profile;
use crate::domain::sample::{ConnectionState, TelemetrySample};

/// Tunables for the simulated source.
#[derive(Debug, Clone)]
pub struct StubSettings {
    /// Cadence of the poll loop while connected.
    pub poll_interval: Duration,
    /// Simulated handshake latency. Nonzero so the host UI can show a
    /// "connecting" affordance.
    pub connect_delay: Duration,
    /// Seed for the random-walk perturbations; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for StubSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            connect_delay: Duration::from_millis(300),
            seed: None,
        }
    }
}

/// Defensive copy of the source's active configuration, for the host's
/// tuning UI. Mutating it has no effect on the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StubConfigSnapshot {
    pub profile_name: String,
    pub poll_interval_ms: u64,
    pub channels: BTreeMap<String, PatternConfig>,
}

struct Inner {
    state: ConnectionState,
    profile_name: String,
    configs: BTreeMap<String, PatternConfig>,
    walk: HashMap<String, WalkState>,
    requested: Vec<String>,
    rng: StdRng,
    connect_start: Option<Instant>,
    data_subs: CallbackRegistry<DataCallback>,
    state_subs: CallbackRegistry<StateCallback>,
}

impl Inner {
    fn reset_walks(&mut self) {
        self.walk.clear();
        for (id, cfg) in &self.configs {
            if cfg.pattern == Pattern::RandomWalk {
                self.walk.insert(id.clone(), WalkState::reset(cfg));
            }
        }
    }
}

/// Simulated [`DataSource`]: generates per-channel waveforms on a fixed poll
/// cadence instead of talking to an ELM327 adapter. Starts on the "idle"
/// profile.
pub struct StubSource {
    settings: StubSettings,
    inner: Arc<Mutex<Inner>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StubSource {
    pub fn new(settings: StubSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let initial = profile::profile("idle")
            .map(|p| p.channels.clone())
            .unwrap_or_default();
        Self {
            settings,
            inner: Arc::new(Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                profile_name: "idle".to_string(),
                configs: initial,
                walk: HashMap::new(),
                requested: Vec::new(),
                rng,
                connect_start: None,
                data_subs: CallbackRegistry::new(),
                state_subs: CallbackRegistry::new(),
            })),
            poll_task: Mutex::new(None),
        }
    }

    /// Built-in profile names.
    pub fn profile_names(&self) -> Vec<&'static str> {
        profile::profile_names()
    }

    /// Replace the whole active config set with a built-in profile. Resets
    /// random-walk memory for every channel in the new set; connection state
    /// is untouched, and a connected source uses the new configs on its next
    /// tick. Unknown names are ignored.
    pub fn set_profile(&self, name: &str) {
        let Some(p) = profile::profile(name) else {
            warn!(profile = name, "ignoring unknown profile");
            return;
        };
        let mut inner = lock_inner(&self.inner);
        inner.profile_name = p.name.to_string();
        inner.configs = p.channels.clone();
        inner.reset_walks();
        debug!(profile = name, "profile selected");
    }

    /// Override a single channel's config within the active set (live
    /// tuning). Resets that channel's walk memory when the new pattern is a
    /// random walk.
    pub fn set_channel_config(&self, id: &str, cfg: PatternConfig) {
        let mut inner = lock_inner(&self.inner);
        if cfg.pattern == Pattern::RandomWalk {
            inner.walk.insert(id.to_string(), WalkState::reset(&cfg));
        }
        inner.configs.insert(id.to_string(), cfg);
    }

    /// Snapshot of the active configuration.
    pub fn config(&self) -> StubConfigSnapshot {
        let inner = lock_inner(&self.inner);
        StubConfigSnapshot {
            profile_name: inner.profile_name.clone(),
            poll_interval_ms: self.settings.poll_interval.as_millis() as u64,
            channels: inner.configs.clone(),
        }
    }

    /// Number of live data + connection subscriptions.
    pub fn live_subscriptions(&self) -> usize {
        let inner = lock_inner(&self.inner);
        inner.data_subs.len() + inner.state_subs.len()
    }

    /// Set the state to `to` if currently in one of `from`, broadcasting the
    /// transition to listeners. The check and the write are atomic; listener
    /// invocation happens outside the lock so callbacks may re-enter the
    /// source.
    fn advance(&self, from: &[ConnectionState], to: ConnectionState) -> bool {
        let listeners = {
            let mut inner = lock_inner(&self.inner);
            if !from.contains(&inner.state) {
                return false;
            }
            inner.state = to;
            inner.state_subs.snapshot()
        };
        debug!(state = %to, "connection state changed");
        for cb in listeners {
            invoke_isolated("connection", || cb(to));
        }
        true
    }

    fn start_polling(&self) {
        let inner = Arc::clone(&self.inner);
        let interval = self.settings.poll_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; skip it so the
            // first sample batch lands one full interval after connect.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !poll_tick(&inner) {
                    break;
                }
            }
        });
        let mut slot = self
            .poll_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    fn abort_polling(&self) -> Option<JoinHandle<()>> {
        let handle = self
            .poll_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(h) = &handle {
            h.abort();
        }
        handle
    }
}

/// One poll evaluation. Returns `false` once the source is no longer
/// connected, which ends the loop.
fn poll_tick(inner: &Mutex<Inner>) -> bool {
    let (batch, listeners) = {
        let mut guard = lock_inner(inner);
        if guard.state != ConnectionState::Connected {
            return false;
        }
        let elapsed_ms = guard
            .connect_start
            .map(|t| t.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        let now_ms = Utc::now().timestamp_millis();

        let Inner {
            configs,
            walk,
            rng,
            requested,
            ..
        } = &mut *guard;

        let ids: Vec<String> = if requested.is_empty() {
            configs.keys().cloned().collect()
        } else {
            requested.clone()
        };

        let mut batch = Vec::with_capacity(ids.len());
        for id in &ids {
            // A channel with no config or no catalog entry is skipped, not an
            // error: hosts may request ids the active profile does not cover.
            let Some(cfg) = configs.get(id) else { continue };
            let Some(def) = channel::channel(id) else { continue };
            let walk_state = walk
                .entry(id.clone())
                .or_insert_with(|| WalkState::reset(cfg));
            let raw = pattern::generate(cfg, elapsed_ms, walk_state, rng);
            batch.push(TelemetrySample::new(id.clone(), def.clamp(raw), now_ms));
        }

        if batch.is_empty() {
            return true;
        }
        (batch, guard.data_subs.snapshot())
    };

    for cb in listeners {
        invoke_isolated("data", || cb(&batch));
    }
    true
}

#[async_trait]
impl DataSource for StubSource {
    async fn connect(&self, _device_hint: Option<&str>) -> Result<(), SourceError> {
        // Guard and transition under one lock so racing connects see exactly
        // one Connecting broadcast.
        let listeners = {
            let mut inner = lock_inner(&self.inner);
            if matches!(
                inner.state,
                ConnectionState::Connecting | ConnectionState::Connected
            ) {
                return Ok(());
            }
            inner.state = ConnectionState::Connecting;
            inner.connect_start = Some(Instant::now());
            inner.reset_walks();
            inner.state_subs.snapshot()
        };
        debug!(state = %ConnectionState::Connecting, "connection state changed");
        for cb in listeners {
            invoke_isolated("connection", || cb(ConnectionState::Connecting));
        }
        // Simulated handshake latency
        time::sleep(self.settings.connect_delay).await;
        // A disconnect during the handshake wins; stay down in that case.
        if self.advance(&[ConnectionState::Connecting], ConnectionState::Connected) {
            self.start_polling();
        }
        Ok(())
    }

    async fn disconnect(&self) {
        if self.connection_state() == ConnectionState::Disconnected {
            return;
        }
        // Await the aborted poll task so no tick can fire after this returns.
        if let Some(handle) = self.abort_polling() {
            let _ = handle.await;
        }
        self.advance(
            &[
                ConnectionState::Connecting,
                ConnectionState::Connected,
                ConnectionState::Error,
            ],
            ConnectionState::Disconnected,
        );
    }

    fn connection_state(&self) -> ConnectionState {
        lock_inner(&self.inner).state
    }

    fn request_channels(&self, ids: &[String]) {
        for id in ids {
            if channel::channel(id).is_none() {
                debug!(channel = %id, "requested channel not in catalog; it will be skipped");
            }
        }
        lock_inner(&self.inner).requested = ids.to_vec();
    }

    fn on_data(&self, callback: DataCallback) -> Subscription {
        let id = lock_inner(&self.inner).data_subs.insert(callback);
        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock_inner(&inner).data_subs.remove(id);
            }
        })
    }

    fn on_connection_change(&self, callback: StateCallback) -> Subscription {
        let id = lock_inner(&self.inner).state_subs.insert(callback);
        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock_inner(&inner).state_subs.remove(id);
            }
        })
    }

    fn dispose(&self) {
        self.abort_polling();
        let mut inner = lock_inner(&self.inner);
        inner.data_subs.clear();
        inner.state_subs.clear();
    }
}

impl Drop for StubSource {
    fn drop(&mut self) {
        self.abort_polling();
    }
}
