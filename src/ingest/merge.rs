use chrono::{DateTime, Utc};

use crate::snapshot::LatestReading;

use super::resolve::FieldUpdate;

/// Apply resolved updates to the record, front to back.
///
/// Fields not present in `updates` keep their previous value. `timestamp`
/// and `last_topic` advance only when at least one field was written, so a
/// message that resolved to nothing leaves the record byte-for-byte
/// untouched. Returns whether anything was written.
pub fn apply(
    reading: &mut LatestReading,
    updates: Vec<FieldUpdate>,
    source_topic: &str,
    now: DateTime<Utc>,
) -> bool {
    if updates.is_empty() {
        return false;
    }

    for update in updates {
        match update {
            FieldUpdate::Temperature(v) => reading.temperature = Some(v),
            FieldUpdate::Humidity(v) => reading.humidity = Some(v),
            FieldUpdate::Co2EqPpm(v) => reading.co2_eq_ppm = Some(v),
            FieldUpdate::RelayPin(v) => reading.relay_pin = Some(v),
            FieldUpdate::DeviceStatus(s) => reading.device_status = Some(s),
            FieldUpdate::Extra { topic, value } => {
                reading.extra.insert(topic, value);
            }
        }
    }

    reading.timestamp = Some(now);
    reading.last_topic = Some(source_topic.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn updates_touch_only_their_fields() {
        let mut reading = LatestReading {
            co2_eq_ppm: Some(400.0),
            ..Default::default()
        };
        let written = apply(
            &mut reading,
            vec![FieldUpdate::Temperature(23.5), FieldUpdate::Humidity(60.0)],
            "esp32/telemetry",
            t("2026-08-04T12:00:00Z"),
        );
        assert!(written);
        assert_eq!(reading.temperature, Some(23.5));
        assert_eq!(reading.humidity, Some(60.0));
        assert_eq!(reading.co2_eq_ppm, Some(400.0));
        assert_eq!(reading.timestamp, Some(t("2026-08-04T12:00:00Z")));
        assert_eq!(reading.last_topic.as_deref(), Some("esp32/telemetry"));
    }

    #[test]
    fn empty_update_list_leaves_the_record_untouched() {
        let mut reading = LatestReading {
            temperature: Some(20.0),
            timestamp: Some(t("2026-08-04T11:00:00Z")),
            last_topic: Some("sensors/temperature".into()),
            ..Default::default()
        };
        let before = reading.clone();
        let written = apply(&mut reading, Vec::new(), "esp32/noise", t("2026-08-04T12:00:00Z"));
        assert!(!written);
        assert_eq!(reading, before);
    }

    #[test]
    fn later_update_for_the_same_field_wins() {
        let mut reading = LatestReading::default();
        apply(
            &mut reading,
            vec![FieldUpdate::RelayPin(1), FieldUpdate::RelayPin(0)],
            "esp32/telemetry",
            t("2026-08-04T12:00:00Z"),
        );
        assert_eq!(reading.relay_pin, Some(0));
    }

    #[test]
    fn reapplying_the_same_update_keeps_field_values() {
        let mut reading = LatestReading::default();
        let updates = vec![FieldUpdate::Temperature(23.5)];
        apply(&mut reading, updates.clone(), "esp32/telemetry", t("2026-08-04T12:00:00Z"));
        let first = reading.clone();
        apply(&mut reading, updates, "esp32/telemetry", t("2026-08-04T12:00:05Z"));
        assert_eq!(reading.temperature, first.temperature);
        // The clock still advances on the second application.
        assert_eq!(reading.timestamp, Some(t("2026-08-04T12:00:05Z")));
    }

    #[test]
    fn extension_entries_accumulate_by_topic() {
        let mut reading = LatestReading::default();
        apply(
            &mut reading,
            vec![FieldUpdate::Extra {
                topic: "sensor/pressure".into(),
                value: 1013.0,
            }],
            "sensor/pressure",
            t("2026-08-04T12:00:00Z"),
        );
        apply(
            &mut reading,
            vec![FieldUpdate::Extra {
                topic: "sensor/pressure".into(),
                value: 1014.0,
            }],
            "sensor/pressure",
            t("2026-08-04T12:01:00Z"),
        );
        assert_eq!(reading.extra.get("sensor/pressure"), Some(&1014.0));
        assert_eq!(reading.extra.len(), 1);
    }
}
