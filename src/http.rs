use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

use crate::snapshot::{LatestReading, MqttHealth, SnapshotStore};

/// Read-only handles shared with every route handler.
#[derive(Clone)]
pub struct AppContext {
    pub store: SnapshotStore,
    pub health: Arc<MqttHealth>,
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/air/latest", get(latest))
        .route("/api/air/temperature", get(temperature))
        .route("/api/air/humidity", get(humidity))
        .route("/api/air/co2", get(co2))
        .route("/api/air/mqtt-health", get(mqtt_health))
        .with_state(ctx)
}

async fn root() -> &'static str {
    "mqtt-to-rest bridge is running"
}

async fn latest(State(ctx): State<AppContext>) -> Json<LatestReading> {
    Json(ctx.store.read().await)
}

async fn temperature(State(ctx): State<AppContext>) -> Json<Value> {
    let reading = ctx.store.read().await;
    Json(json!({
        "temperature": reading.temperature,
        "timestamp": reading.timestamp,
    }))
}

async fn humidity(State(ctx): State<AppContext>) -> Json<Value> {
    let reading = ctx.store.read().await;
    Json(json!({
        "humidity": reading.humidity,
        "timestamp": reading.timestamp,
    }))
}

async fn co2(State(ctx): State<AppContext>) -> Json<Value> {
    let reading = ctx.store.read().await;
    Json(json!({
        "co2_eq_ppm": reading.co2_eq_ppm,
        "timestamp": reading.timestamp,
    }))
}

async fn mqtt_health(State(ctx): State<AppContext>) -> Json<Value> {
    Json(json!({
        "connected": ctx.health.connected(),
        "broker": ctx.health.broker(),
    }))
}
