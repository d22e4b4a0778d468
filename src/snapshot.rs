use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, RwLockWriteGuard};

/// The latest known reading across all sensor topics.
///
/// There is exactly one of these per process. Fields start out unknown and
/// are only ever overwritten by accepted updates; a field missing from an
/// incoming message keeps its previous value. Absent fields serialize as
/// JSON null.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatestReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub co2_eq_ppm: Option<f64>,
    /// Relay state, canonicalized to 0/1.
    pub relay_pin: Option<u8>,
    pub device_status: Option<String>,
    /// Time of the most recent accepted update to any field.
    pub timestamp: Option<DateTime<Utc>>,
    /// Topic that produced the most recent accepted update.
    pub last_topic: Option<String>,
    /// Numeric readings from topics outside the known schema, keyed by the
    /// raw topic string.
    pub extra: BTreeMap<String, f64>,
}

/// Shared handle to the latest-reading record.
///
/// Writes are serialized through the guard returned by [`write`]; the
/// ingestion loop is the only writer. Readers get a consistent clone and
/// never observe a half-applied merge.
///
/// [`write`]: SnapshotStore::write
#[derive(Clone)]
pub struct SnapshotStore {
    inner: Arc<RwLock<LatestReading>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(LatestReading::default())),
        }
    }

    /// Consistent copy of the current record.
    pub async fn read(&self) -> LatestReading {
        self.inner.read().await.clone()
    }

    /// Exclusive write access for the duration of one merge.
    pub async fn write(&self) -> RwLockWriteGuard<'_, LatestReading> {
        self.inner.write().await
    }
}

/// Connection state of the MQTT transport, read by the health route.
pub struct MqttHealth {
    broker: String,
    connected: AtomicBool,
}

impl MqttHealth {
    pub fn new(broker: String) -> Self {
        Self {
            broker,
            connected: AtomicBool::new(false),
        }
    }

    pub fn set_connected(&self, up: bool) {
        self.connected.store(up, Ordering::Relaxed);
    }

    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn broker(&self) -> &str {
        &self.broker
    }
}
