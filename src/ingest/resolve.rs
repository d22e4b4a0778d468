use serde_json::Value;

use super::decode::{DecodeResult, Metric, StructuredUpdate};

/// One canonical write against the latest-reading record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Temperature(f64),
    Humidity(f64),
    Co2EqPpm(f64),
    RelayPin(u8),
    DeviceStatus(String),
    Extra { topic: String, value: f64 },
}

/// Collapse a decode result into ordered canonical updates.
///
/// Rejected and unrecognized input resolves to an empty list; per-field
/// coercion failures drop just that field. Order matters: the merge applies
/// updates front to back, so a later entry for the same field wins.
pub fn resolve(result: DecodeResult) -> Vec<FieldUpdate> {
    match result {
        DecodeResult::Structured(update) => resolve_structured(update),
        DecodeResult::Metric { metric, value } => vec![metric_update(metric, value)],
        DecodeResult::UnknownNumeric { topic, value } => {
            vec![FieldUpdate::Extra { topic, value }]
        }
        DecodeResult::Unrecognized | DecodeResult::Rejected(_) => Vec::new(),
    }
}

fn resolve_structured(update: StructuredUpdate) -> Vec<FieldUpdate> {
    let mut updates = Vec::new();

    if let Some(v) = update.temperature.as_ref().and_then(numeric) {
        updates.push(FieldUpdate::Temperature(v));
    }
    if let Some(v) = update.humidity.as_ref().and_then(numeric) {
        updates.push(FieldUpdate::Humidity(v));
    }
    // Two historical key names for the same gas reading; the canonical one
    // wins when a payload carries both.
    if let Some(v) = update
        .co2_eq_ppm
        .as_ref()
        .and_then(numeric)
        .or_else(|| update.gas_mq135.as_ref().and_then(numeric))
    {
        updates.push(FieldUpdate::Co2EqPpm(v));
    }
    if let Some(v) = update.relay_pin.as_ref().and_then(relay_flag) {
        updates.push(FieldUpdate::RelayPin(v));
    }
    // Pushed after the pin flag: when both are present the named state is
    // applied last and wins.
    if let Some(v) = update.state.as_ref().and_then(named_state) {
        updates.push(FieldUpdate::RelayPin(v));
    }
    if let Some(s) = update.status.as_ref().and_then(Value::as_str) {
        updates.push(FieldUpdate::DeviceStatus(s.to_string()));
    }

    updates
}

fn metric_update(metric: Metric, value: f64) -> FieldUpdate {
    match metric {
        Metric::Temperature => FieldUpdate::Temperature(value),
        Metric::Humidity => FieldUpdate::Humidity(value),
        Metric::Co2 => FieldUpdate::Co2EqPpm(value),
    }
}

/// Numeric field value: a JSON number, or a string containing one.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Direct relay flag: bool, numeric 0/1, or "on"/"off"/"0"/"1" text in any
/// case. Anything else drops the field.
fn relay_flag(value: &Value) -> Option<u8> {
    match value {
        Value::Bool(b) => Some(u8::from(*b)),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 0.0 => Some(0),
            Some(x) if x == 1.0 => Some(1),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "on" => Some(1),
            "0" | "off" => Some(0),
            _ => None,
        },
        _ => None,
    }
}

/// Named relay state: "on" in any case means energized, any other text
/// means off. Non-strings drop the field.
fn named_state(value: &Value) -> Option<u8> {
    value
        .as_str()
        .map(|s| u8::from(s.trim().eq_ignore_ascii_case("on")))
}
