use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub http: HttpConfig,
    pub topics: TopicsConfig,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub listen_addr: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct TopicsConfig {
    /// Prefix of the namespace whose payloads are JSON objects.
    pub structured_ns: String,
    /// Prefix of the flat namespace carrying one raw number per topic.
    pub legacy_ns: String,
}

fn env_required(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("{key} environment variable is required"))
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let config = Self {
            mqtt: MqttConfig {
                broker_host: env_required("MQTT_BROKER_HOST")?,
                broker_port: env_or_default("MQTT_BROKER_PORT", 1883),
                username: env_optional("MQTT_USERNAME"),
                password: env_optional("MQTT_PASSWORD"),
                client_id: env_or_default("MQTT_CLIENT_ID", "mqtt-to-rest".to_string()),
            },
            http: HttpConfig {
                listen_addr: env_or_default("HTTP_LISTEN_ADDR", "0.0.0.0".to_string()),
                port: env_or_default("HTTP_PORT", 8080),
            },
            topics: TopicsConfig {
                structured_ns: env_or_default("STRUCTURED_TOPIC_NS", "esp32".to_string()),
                legacy_ns: env_or_default("LEGACY_TOPIC_NS", "sensors".to_string()),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.mqtt.broker_host.is_empty() {
            return Err("MQTT_BROKER_HOST must not be empty".into());
        }
        if self.topics.structured_ns.is_empty() || self.topics.legacy_ns.is_empty() {
            return Err("Topic namespace prefixes must not be empty".into());
        }
        if self.topics.structured_ns == self.topics.legacy_ns {
            return Err("STRUCTURED_TOPIC_NS and LEGACY_TOPIC_NS must differ".into());
        }
        for ns in [&self.topics.structured_ns, &self.topics.legacy_ns] {
            if ns.contains(['#', '+']) {
                return Err(format!("Namespace prefix '{ns}' must not contain wildcards"));
            }
        }
        Ok(())
    }
}

impl MqttConfig {
    pub fn broker_addr(&self) -> String {
        format!("{}:{}", self.broker_host, self.broker_port)
    }
}

impl HttpConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.port)
    }
}

impl TopicsConfig {
    /// Subscription filter covering the structured (JSON) namespace.
    pub fn structured_filter(&self) -> String {
        format!("{}/#", self.structured_ns)
    }

    /// Subscription filter covering the legacy flat numeric topics.
    pub fn legacy_filter(&self) -> String {
        format!("{}/#", self.legacy_ns)
    }
}
