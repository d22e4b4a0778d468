use serde::Deserialize;
use serde_json::Value;

use crate::config::TopicsConfig;

/// Numeric quantities addressable by a dedicated per-metric topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Humidity,
    Co2,
}

/// Recognized keys of a structured JSON payload, captured as raw values.
///
/// Unknown keys are ignored; a key set to JSON null counts as absent. Type
/// checking and alias resolution happen later, in [`resolve`].
///
/// [`resolve`]: super::resolve::resolve
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StructuredUpdate {
    pub temperature: Option<Value>,
    pub humidity: Option<Value>,
    pub gas_mq135: Option<Value>,
    pub co2_eq_ppm: Option<Value>,
    pub relay_pin: Option<Value>,
    pub state: Option<Value>,
    pub status: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NonNumeric,
    NonNumericUnknownTopic,
}

/// Outcome of classifying one (topic, payload) pair. Malformed input is
/// data here, not an error: every branch of [`Decoder::decode`] lands on
/// one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeResult {
    /// JSON object from the structured namespace.
    Structured(StructuredUpdate),
    /// Single numeric payload on a known per-metric topic.
    Metric { metric: Metric, value: f64 },
    /// Numeric payload on a topic outside the known schema.
    UnknownNumeric { topic: String, value: f64 },
    /// Structured-namespace payload that is neither a JSON object nor a
    /// known numeric metric.
    Unrecognized,
    Rejected(RejectReason),
}

enum Route {
    Structured,
    LegacyMetric(Metric),
    Unknown,
}

const METRIC_SUFFIXES: [(&str, Metric); 3] = [
    ("temperature", Metric::Temperature),
    ("humidity", Metric::Humidity),
    ("co2", Metric::Co2),
];

/// Classifies topics and payloads into [`DecodeResult`]s.
///
/// Pure: no side effects, no I/O, same output for the same input.
pub struct Decoder {
    structured_ns: String,
    /// Exact-match per-metric topics inside the structured namespace,
    /// e.g. `esp32/temperature`. Used as the fallback for non-JSON payloads.
    structured_metrics: Vec<(String, Metric)>,
    /// Exact-match legacy flat topics, e.g. `sensors/co2`.
    legacy_metrics: Vec<(String, Metric)>,
}

fn metric_table(ns: &str) -> Vec<(String, Metric)> {
    METRIC_SUFFIXES
        .iter()
        .map(|(suffix, metric)| (format!("{ns}/{suffix}"), *metric))
        .collect()
}

/// Parse a structured payload, insisting on a JSON object. A bare JSON
/// scalar or array is not a structured update.
fn parse_object(text: &str) -> Option<StructuredUpdate> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
        .and_then(|v| serde_json::from_value(v).ok())
}

impl Decoder {
    pub fn new(topics: &TopicsConfig) -> Self {
        Self {
            structured_ns: topics.structured_ns.clone(),
            structured_metrics: metric_table(&topics.structured_ns),
            legacy_metrics: metric_table(&topics.legacy_ns),
        }
    }

    /// Topic classification, evaluated in fixed priority order: structured
    /// namespace prefix, then the legacy exact-match set, then catch-all.
    fn route(&self, topic: &str) -> Route {
        if topic == self.structured_ns
            || topic
                .strip_prefix(&self.structured_ns)
                .is_some_and(|rest| rest.starts_with('/'))
        {
            return Route::Structured;
        }
        if let Some((_, metric)) = self.legacy_metrics.iter().find(|(t, _)| t == topic) {
            return Route::LegacyMetric(*metric);
        }
        Route::Unknown
    }

    pub fn decode(&self, topic: &str, payload: &[u8]) -> DecodeResult {
        let text = String::from_utf8_lossy(payload);
        let text = text.trim();

        match self.route(topic) {
            Route::Structured => match parse_object(text) {
                Some(update) => DecodeResult::Structured(update),
                // Not a JSON object: legacy firmware publishes bare numbers
                // on per-metric topics inside this namespace.
                None => match text.parse::<f64>() {
                    Ok(value) => match self
                        .structured_metrics
                        .iter()
                        .find(|(t, _)| t == topic)
                    {
                        Some((_, metric)) => DecodeResult::Metric {
                            metric: *metric,
                            value,
                        },
                        None => DecodeResult::Unrecognized,
                    },
                    Err(_) => DecodeResult::Unrecognized,
                },
            },
            Route::LegacyMetric(metric) => match text.parse::<f64>() {
                Ok(value) => DecodeResult::Metric { metric, value },
                Err(_) => DecodeResult::Rejected(RejectReason::NonNumeric),
            },
            Route::Unknown => match text.parse::<f64>() {
                Ok(value) => DecodeResult::UnknownNumeric {
                    topic: topic.to_string(),
                    value,
                },
                Err(_) => DecodeResult::Rejected(RejectReason::NonNumericUnknownTopic),
            },
        }
    }
}
