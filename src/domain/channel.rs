// Channel catalog - static table of OBD-II PID definitions

/// Definition of one telemetry channel (an OBD-II PID): identity, unit,
/// physical value range, and the formula decoding raw response bytes.
///
/// Constructed once at process start, never mutated.
#[derive(Debug, Clone)]
pub struct ChannelDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
    pub byte_width: usize,
    formula: fn(&[u8]) -> f64,
}

impl ChannelDefinition {
    /// Decode raw response bytes into a physical value. Returns `None` when
    /// fewer than `byte_width` bytes are supplied.
    pub fn decode(&self, bytes: &[u8]) -> Option<f64> {
        if bytes.len() < self.byte_width {
            return None;
        }
        Some((self.formula)(bytes))
    }

    /// Clamp a value into this channel's physical range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn info(&self) -> ChannelInfo {
        ChannelInfo {
            id: self.id,
            name: self.name,
            unit: self.unit,
            min: self.min,
            max: self.max,
        }
    }
}

/// Display-facing summary of a channel, without the decode machinery.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
}

fn two_byte(b: &[u8]) -> f64 {
    b[0] as f64 * 256.0 + b[1] as f64
}

static CHANNELS: &[ChannelDefinition] = &[
    ChannelDefinition {
        id: "010C",
        name: "Engine RPM",
        unit: "rpm",
        min: 0.0,
        max: 8000.0,
        byte_width: 2,
        formula: |b| two_byte(b) / 4.0,
    },
    ChannelDefinition {
        id: "010D",
        name: "Vehicle Speed",
        unit: "km/h",
        min: 0.0,
        max: 255.0,
        byte_width: 1,
        formula: |b| b[0] as f64,
    },
    ChannelDefinition {
        id: "0105",
        name: "Coolant Temp",
        unit: "°C",
        min: -40.0,
        max: 215.0,
        byte_width: 1,
        formula: |b| b[0] as f64 - 40.0,
    },
    ChannelDefinition {
        id: "0111",
        name: "Throttle Position",
        unit: "%",
        min: 0.0,
        max: 100.0,
        byte_width: 1,
        formula: |b| b[0] as f64 * 100.0 / 255.0,
    },
    ChannelDefinition {
        id: "010F",
        name: "Intake Air Temp",
        unit: "°C",
        min: -40.0,
        max: 215.0,
        byte_width: 1,
        formula: |b| b[0] as f64 - 40.0,
    },
    ChannelDefinition {
        id: "0104",
        name: "Engine Load",
        unit: "%",
        min: 0.0,
        max: 100.0,
        byte_width: 1,
        formula: |b| b[0] as f64 * 100.0 / 255.0,
    },
    ChannelDefinition {
        id: "0133",
        name: "Barometric Pressure",
        unit: "kPa",
        min: 0.0,
        max: 255.0,
        byte_width: 1,
        formula: |b| b[0] as f64,
    },
    ChannelDefinition {
        id: "010B",
        name: "Intake Manifold Pressure",
        unit: "kPa",
        min: 0.0,
        max: 255.0,
        byte_width: 1,
        formula: |b| b[0] as f64,
    },
    ChannelDefinition {
        id: "012F",
        name: "Fuel Level",
        unit: "%",
        min: 0.0,
        max: 100.0,
        byte_width: 1,
        formula: |b| b[0] as f64 * 100.0 / 255.0,
    },
    ChannelDefinition {
        id: "0142",
        name: "Control Module Voltage",
        unit: "V",
        min: 0.0,
        max: 65.535,
        byte_width: 2,
        formula: |b| two_byte(b) / 1000.0,
    },
];

/// Look up a channel by PID.
pub fn channel(id: &str) -> Option<&'static ChannelDefinition> {
    CHANNELS.iter().find(|c| c.id == id)
}

/// All channels in table order.
pub fn all_channels() -> &'static [ChannelDefinition] {
    CHANNELS
}

/// Display summaries of all channels, in table order.
pub fn all_channel_infos() -> Vec<ChannelInfo> {
    CHANNELS.iter().map(ChannelDefinition::info).collect()
}
