// Telemetry sample and connection-state domain models
use std::fmt;

/// One decoded reading for a single channel at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    pub channel_id: String,
    pub value: f64,
    pub timestamp_ms: i64,
}

impl TelemetrySample {
    pub fn new(channel_id: impl Into<String>, value: f64, timestamp_ms: i64) -> Self {
        Self {
            channel_id: channel_id.into(),
            value,
            timestamp_ms,
        }
    }
}

/// Connection state of a data source. Exactly one source is active at a time;
/// transitions are broadcast synchronously to registered listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
    }
}
