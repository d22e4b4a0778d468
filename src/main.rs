mod config;
mod http;
mod ingest;
mod mqtt;
mod snapshot;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting mqtt-to-rest bridge (mqtt={}, http={}, namespaces={}/# + {}/#)",
        config.mqtt.broker_addr(),
        config.http.bind_addr(),
        config.topics.structured_ns,
        config.topics.legacy_ns,
    );

    let store = snapshot::SnapshotStore::new();
    let health = Arc::new(snapshot::MqttHealth::new(config.mqtt.broker_addr()));

    // Channel from the MQTT event loop to the single ingestion loop below.
    let (msg_tx, mut msg_rx) = mpsc::channel::<mqtt::InboundMessage>(100);

    let mqtt_client = mqtt::client::MqttClient::new(&config, health.clone());
    let mqtt_handle = tokio::spawn(async move {
        mqtt_client.run(msg_tx).await;
    });

    let app = http::router(http::AppContext {
        store: store.clone(),
        health,
    });
    let bind_addr = config.http.bind_addr();
    let http_handle = tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP listener on {}: {}", bind_addr, e);
                std::process::exit(1);
            }
        };
        info!("HTTP API listening on {}", bind_addr);
        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    });

    let pipeline = ingest::Pipeline::new(&config.topics);

    // Main loop: merge inbound messages one at a time + handle shutdown.
    loop {
        tokio::select! {
            Some(msg) = msg_rx.recv() => {
                let mut reading = store.write().await;
                if pipeline.process(&mut reading, &msg.topic, &msg.payload, Utc::now()) {
                    debug!("Merged update from {}", msg.topic);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down");
                break;
            }
            _ = async {
                let mut sigterm = tokio::signal::unix::signal(
                    tokio::signal::unix::SignalKind::terminate()
                ).expect("Failed to register SIGTERM handler");
                sigterm.recv().await;
            } => {
                info!("Received SIGTERM, shutting down");
                break;
            }
        }
    }

    // Cleanup
    mqtt_handle.abort();
    http_handle.abort();
    info!("mqtt-to-rest bridge stopped");
}
