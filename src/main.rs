//! hvac-gateway server entry point.
//!
//! Connects to the telemetry broker and starts the Axum HTTP server with
//! REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use hvac_gateway::api;
use hvac_gateway::app_state::AppState;
use hvac_gateway::broker::{ConnectionManager, InboundMessage, MqttTransport};
use hvac_gateway::config::{GatewayConfig, LogFormat};
use hvac_gateway::domain::{AlertAggregator, ConnectionState, EventBus, FeedEvent};
use hvac_gateway::service::{AlertFeedService, HttpPolicyBackend, PolicyService};

/// Upper bound for a single REST request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(
        addr = %config.listen_addr,
        broker = %config.broker,
        filters = config.topic_filters.len(),
        "starting hvac-gateway"
    );

    // Build domain + service layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let feed = Arc::new(AlertFeedService::new(
        AlertAggregator::with_limits(config.alert_capacity, config.alert_dedupe_window_ms),
        event_bus.clone(),
    ));
    let backend = HttpPolicyBackend::new(&config.policy_api_url, config.policy_api_timeout)?;
    let policies = PolicyService::new(Arc::new(backend), event_bus.clone());

    // Start the broker connection
    let transport = MqttTransport::new(
        config.broker.clone(),
        config.broker_client_id.clone(),
        config.broker_keep_alive,
    );
    let handler_feed = Arc::clone(&feed);
    let broker = ConnectionManager::spawn(
        transport,
        config.topic_filters.clone(),
        config.reconnect_interval,
        move |message: InboundMessage| {
            handler_feed.handle_message(&message);
        },
    );
    let watcher = tokio::spawn(forward_connection_changes(broker.watch(), event_bus.clone()));

    // Build application state
    let app_state = AppState {
        feed,
        policies,
        event_bus,
        connection: broker.watch(),
    };

    // Build router
    let app = api::build_app(app_state)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    watcher.abort();
    broker.disconnect().await;
    tracing::info!("hvac-gateway stopped");
    Ok(())
}

/// Publishes every broker connection transition on the event bus.
async fn forward_connection_changes(
    mut state: watch::Receiver<ConnectionState>,
    event_bus: EventBus,
) {
    while state.changed().await.is_ok() {
        let current = *state.borrow_and_update();
        tracing::info!(state = %current, "broker connection state changed");
        event_bus.publish(FeedEvent::connection(current));
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
