//! Segments Gateway - HTTP API for users, segments and memberships
//!
//! This is the main entry point for the segments service. Configuration comes
//! from environment variables; see [`GatewayConfig::from_env`].

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use segments_control::{ControlConfig, SegmentService};
use segments_core::SystemClock;
use segments_gateway::{create_router, GatewayConfig, GatewayState, LogFormat};
use segments_store::{CascadePolicy, RocksStore, StoreOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,segments=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir.display(),
        cascade_on_delete = config.cascade_on_delete,
        seeded = config.rng_seed.is_some(),
        "Starting segments gateway"
    );

    // Initialize RocksDB store
    let clock = Arc::new(SystemClock);
    let cascade = if config.cascade_on_delete {
        CascadePolicy::Delete
    } else {
        CascadePolicy::Retain
    };
    let store = Arc::new(RocksStore::open_with(
        &config.data_dir,
        StoreOptions {
            cascade,
            clock: clock.clone(),
        },
    )?);

    // Initialize segment service
    let control_config = ControlConfig {
        rng_seed: config.rng_seed,
        ..ControlConfig::default()
    };
    let policy = control_config.policy.clone();
    let control = Arc::new(
        SegmentService::new(store, clock, control_config)
            .with_span(tracing::info_span!("segments")),
    );

    let listen_addr = config.listen_addr.clone();
    let state = GatewayState::new(control, policy, config);
    let app = create_router(state);

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
