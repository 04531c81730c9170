//! gcode-relay server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket relay, system endpoints
//! and the static browser client.

use tracing_subscriber::EnvFilter;

use gcode_relay::api;
use gcode_relay::app_state::AppState;
use gcode_relay::config::RelayConfig;
use gcode_relay::service::{NamespaceHandle, RelayNamespace};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RelayConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        static_dir = %config.static_dir.display(),
        "starting gcode-relay"
    );

    // One namespace for the root path, owned by its worker task
    let namespace = NamespaceHandle::spawn(RelayNamespace::with_defaults(config.svg_stroke_width));

    let app_state = AppState {
        namespace,
        outbox_capacity: config.outbox_capacity,
    };
    let app = api::build_app(app_state, &config);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
