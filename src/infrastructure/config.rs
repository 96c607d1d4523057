use serde::Deserialize;
use std::time::Duration;

use crate::application::stub_source::StubSettings;
use crate::domain::buffer;

/// Runtime settings for the demo runner. The channel catalog and profiles are
/// compiled in; this only tunes cadence, history depth, and the startup
/// selection.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_connect_delay_ms")]
    pub connect_delay_ms: u64,
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Channels to poll; empty means every channel the profile configures.
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_connect_delay_ms() -> u64 {
    300
}

fn default_profile() -> String {
    "idle".to_string()
}

fn default_buffer_capacity() -> usize {
    buffer::DEFAULT_CAPACITY
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            connect_delay_ms: default_connect_delay_ms(),
            profile: default_profile(),
            channels: Vec::new(),
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

impl Settings {
    pub fn stub_settings(&self) -> StubSettings {
        StubSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            connect_delay: Duration::from_millis(self.connect_delay_ms),
            seed: None,
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/simulator").required(false))
        .add_source(config::Environment::with_prefix("SIM"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.poll_interval_ms, 200);
        assert_eq!(settings.connect_delay_ms, 300);
        assert_eq!(settings.profile, "idle");
        assert!(settings.channels.is_empty());
        assert_eq!(settings.buffer_capacity, 300);
    }

    #[test]
    fn test_stub_settings_conversion() {
        let settings = Settings {
            poll_interval_ms: 100,
            connect_delay_ms: 50,
            ..Settings::default()
        };
        let stub = settings.stub_settings();
        assert_eq!(stub.poll_interval, Duration::from_millis(100));
        assert_eq!(stub.connect_delay, Duration::from_millis(50));
    }
}
