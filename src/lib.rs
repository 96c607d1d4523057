//! Simulated OBD-II telemetry source and live-value distribution pipeline.
//!
//! The [`application::stub_source::StubSource`] generates per-channel
//! waveforms on a fixed poll cadence behind the same
//! [`application::data_source::DataSource`] contract a real ELM327 transport
//! would satisfy. Emitted batches flow through the
//! [`application::fanout::TelemetryHub`] into bounded per-channel history
//! buffers and out to display subscribers.

pub mod application;
pub mod domain;
pub mod infrastructure;
