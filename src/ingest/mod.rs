pub mod decode;
pub mod merge;
pub mod resolve;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::TopicsConfig;
use crate::snapshot::LatestReading;

use decode::{DecodeResult, Decoder};

/// The normalization pipeline for one inbound message: decode the payload,
/// resolve it to canonical field updates, merge them into the record.
pub struct Pipeline {
    decoder: Decoder,
}

impl Pipeline {
    pub fn new(topics: &TopicsConfig) -> Self {
        Self {
            decoder: Decoder::new(topics),
        }
    }

    /// Process one message against the record. Returns whether any field
    /// was written. Malformed input is logged and dropped, never an error.
    pub fn process(
        &self,
        reading: &mut LatestReading,
        topic: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> bool {
        let decoded = self.decoder.decode(topic, payload);
        match &decoded {
            DecodeResult::Rejected(reason) => {
                debug!(topic, ?reason, "Dropping undecodable payload");
            }
            DecodeResult::Unrecognized => {
                debug!(topic, "Dropping unrecognized payload");
            }
            _ => {}
        }
        let updates = resolve::resolve(decoded);
        merge::apply(reading, updates, topic, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::new(&TopicsConfig {
            structured_ns: "esp32".into(),
            legacy_ns: "sensors".into(),
        })
    }

    fn now() -> DateTime<Utc> {
        "2026-08-04T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn structured_telemetry_merges_present_fields_only() {
        let p = pipeline();
        let mut reading = LatestReading {
            co2_eq_ppm: Some(400.0),
            ..Default::default()
        };
        let written = p.process(
            &mut reading,
            "esp32/telemetry",
            br#"{"temperature": 23.5, "humidity": 60}"#,
            now(),
        );
        assert!(written);
        assert_eq!(reading.temperature, Some(23.5));
        assert_eq!(reading.humidity, Some(60.0));
        assert_eq!(reading.co2_eq_ppm, Some(400.0));
        assert_eq!(reading.last_topic.as_deref(), Some("esp32/telemetry"));
    }

    #[test]
    fn legacy_co2_topic_merges_numeric_payload() {
        let p = pipeline();
        let mut reading = LatestReading::default();
        assert!(p.process(&mut reading, "sensors/co2", b"412", now()));
        assert_eq!(reading.co2_eq_ppm, Some(412.0));
    }

    #[test]
    fn non_numeric_legacy_payload_changes_nothing() {
        let p = pipeline();
        let mut reading = LatestReading {
            temperature: Some(20.0),
            timestamp: Some(now()),
            ..Default::default()
        };
        let before = reading.clone();
        let written = p.process(&mut reading, "sensors/temperature", b"not-a-number", now());
        assert!(!written);
        assert_eq!(reading, before);
    }

    #[test]
    fn unknown_numeric_topic_lands_in_the_extension_mapping() {
        let p = pipeline();
        let mut reading = LatestReading {
            temperature: Some(20.0),
            ..Default::default()
        };
        assert!(p.process(&mut reading, "sensor/pressure", b"1013", now()));
        assert_eq!(reading.extra.get("sensor/pressure"), Some(&1013.0));
        assert_eq!(reading.temperature, Some(20.0));
        assert_eq!(reading.co2_eq_ppm, None);
    }

    #[test]
    fn undecodable_payload_never_advances_the_timestamp() {
        let p = pipeline();
        let mut reading = LatestReading::default();
        for (topic, payload) in [
            ("esp32/telemetry", b"%%%".as_slice()),
            ("sensors/humidity", b"wet".as_slice()),
            ("some/other/topic", b"n/a".as_slice()),
        ] {
            assert!(!p.process(&mut reading, topic, payload, now()));
        }
        assert_eq!(reading, LatestReading::default());
    }

    #[test]
    fn heartbeat_object_without_recognized_keys_is_invisible() {
        let p = pipeline();
        let mut reading = LatestReading::default();
        let written = p.process(
            &mut reading,
            "esp32/heartbeat",
            br#"{"uptime_ms": 123456}"#,
            now(),
        );
        assert!(!written);
        assert_eq!(reading.timestamp, None);
        assert_eq!(reading.last_topic, None);
    }

    #[test]
    fn same_update_twice_is_idempotent_in_field_values() {
        let p = pipeline();
        let mut reading = LatestReading::default();
        let payload = br#"{"co2_eq_ppm": 450, "state": "ON"}"#;
        p.process(&mut reading, "esp32/telemetry", payload, now());
        let first = reading.clone();
        p.process(
            &mut reading,
            "esp32/telemetry",
            payload,
            "2026-08-04T12:00:05Z".parse().unwrap(),
        );
        assert_eq!(reading.co2_eq_ppm, first.co2_eq_ppm);
        assert_eq!(reading.relay_pin, first.relay_pin);
        assert!(reading.timestamp > first.timestamp);
    }

    #[test]
    fn gas_alias_and_canonical_key_produce_the_same_reading() {
        let p = pipeline();
        let mut a = LatestReading::default();
        let mut b = LatestReading::default();
        p.process(&mut a, "esp32/telemetry", br#"{"gas_mq135": 450}"#, now());
        p.process(&mut b, "esp32/telemetry", br#"{"co2_eq_ppm": 450}"#, now());
        assert_eq!(a.co2_eq_ppm, b.co2_eq_ppm);
        assert_eq!(a.co2_eq_ppm, Some(450.0));
    }

    #[test]
    fn disagreeing_relay_representations_settle_on_the_named_state() {
        let p = pipeline();
        let mut reading = LatestReading::default();
        p.process(
            &mut reading,
            "esp32/telemetry",
            br#"{"relay_pin": 1, "state": "off"}"#,
            now(),
        );
        assert_eq!(reading.relay_pin, Some(0));
    }
}
