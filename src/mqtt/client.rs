use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::snapshot::MqttHealth;

use super::InboundMessage;

pub struct MqttClient {
    client: AsyncClient,
    eventloop: EventLoop,
    subscribe_filters: Vec<String>,
    health: Arc<MqttHealth>,
}

impl MqttClient {
    pub fn new(config: &Config, health: Arc<MqttHealth>) -> Self {
        let mut mqttopts = MqttOptions::new(
            &config.mqtt.client_id,
            &config.mqtt.broker_host,
            config.mqtt.broker_port,
        );
        mqttopts.set_keep_alive(Duration::from_secs(30));

        if let (Some(user), Some(pass)) = (&config.mqtt.username, &config.mqtt.password) {
            mqttopts.set_credentials(user, pass);
        }

        let (client, eventloop) = AsyncClient::new(mqttopts, 100);

        Self {
            client,
            eventloop,
            subscribe_filters: vec![
                config.topics.structured_filter(),
                config.topics.legacy_filter(),
            ],
            health,
        }
    }

    /// Run the MQTT event loop. Subscribes to both namespace filters on
    /// connect and forwards every incoming publish through msg_tx. rumqttc
    /// re-establishes the connection on its own; this loop just keeps
    /// polling and refreshes the subscriptions on each ConnAck.
    pub async fn run(mut self, msg_tx: mpsc::Sender<InboundMessage>) {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(incoming)) => match incoming {
                    Incoming::ConnAck(_) => {
                        info!("Connected to MQTT broker");
                        self.health.set_connected(true);

                        for topic in &self.subscribe_filters {
                            if let Err(e) = self.client.subscribe(topic, QoS::AtLeastOnce).await {
                                error!("Failed to subscribe to {}: {}", topic, e);
                            }
                        }
                    }
                    Incoming::Publish(publish) => {
                        let msg = InboundMessage {
                            topic: publish.topic.clone(),
                            payload: publish.payload.to_vec(),
                        };
                        if msg_tx.send(msg).await.is_err() {
                            warn!("Ingestion channel closed");
                        }
                    }
                    _ => {}
                },
                Ok(_) => {}
                Err(e) => {
                    self.health.set_connected(false);
                    error!("MQTT connection error: {}. Reconnecting...", e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }
}
