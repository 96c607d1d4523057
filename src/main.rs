// Main entry point - wires the simulated source to the distribution hub
use std::sync::Arc;

use dashboard_telemetry::application::data_source::DataSource;
use dashboard_telemetry::application::fanout::TelemetryHub;
use dashboard_telemetry::application::stub_source::StubSource;
use dashboard_telemetry::domain::channel;
use dashboard_telemetry::infrastructure::config::load_settings;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let settings = load_settings()?;
    info!(
        poll_interval_ms = settings.poll_interval_ms,
        profile = %settings.profile,
        "starting dashboard-telemetry simulator"
    );

    for info in channel::all_channel_infos() {
        debug!(id = info.id, name = info.name, unit = info.unit, "channel available");
    }

    // Create the simulated source and the distribution hub
    let source = Arc::new(StubSource::new(settings.stub_settings()));
    source.set_profile(&settings.profile);
    source.request_channels(&settings.channels);

    let hub = TelemetryHub::new(settings.buffer_capacity);
    let hub_subscription = hub.attach(source.as_ref());

    // Demo display subscriber: log every batch at debug level
    let display_subscription = hub.subscribe(Arc::new(|batch| {
        for sample in batch {
            debug!(channel = %sample.channel_id, value = sample.value, "sample");
        }
    }));

    let state_subscription = source.on_connection_change(Arc::new(|state| {
        info!(%state, "connection state changed");
    }));

    source.connect(None).await?;
    let active_config = serde_json::to_string(&source.config())?;
    info!(config = %active_config, "active stub config");

    // Run until power-off (ctrl-c here)
    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    source.disconnect().await;
    display_subscription.unsubscribe();
    state_subscription.unsubscribe();
    hub_subscription.unsubscribe();
    source.dispose();

    Ok(())
}
