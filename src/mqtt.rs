//! MQTT client for receiving remote configuration updates
//!
//! Connects to an MQTT broker and subscribes to a topic. Messages are JSON
//! partial configs (see `ConfigUpdate`); absent fields keep their current
//! value. Updates are forwarded to the frame loop and applied lazily by the
//! next spawn/reset cycle.

use rumqttc::{Client, Event, MqttOptions, Packet, QoS};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::config::ConfigUpdate;

const DEFAULT_PORT: u16 = 1883;
const DEFAULT_TOPIC: &str = "pipesaver";

/// MQTT client that receives config updates in a background thread
pub struct MqttClient {
    receiver: Receiver<ConfigUpdate>,
    _thread: thread::JoinHandle<()>,
}

impl MqttClient {
    /// Create a new MQTT client and connect to the broker.
    /// Fails immediately if connection cannot be established.
    pub fn new(host: &str, topic: &str) -> Result<Self, String> {
        let topic = if topic.is_empty() { DEFAULT_TOPIC } else { topic };

        let mut options = MqttOptions::new("pipesaver", host, DEFAULT_PORT);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut connection) = Client::new(options, 10);

        // Subscribe to topic
        client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| format!("Failed to subscribe to topic '{}': {}", topic, e))?;

        // Test connection by polling once - fail fast if broker unreachable
        let first_event = connection.iter().next();
        match first_event {
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                return Err(format!(
                    "Failed to connect to MQTT broker at {}:{} - {}",
                    host, DEFAULT_PORT, e
                ));
            }
            None => {
                return Err(format!(
                    "Failed to connect to MQTT broker at {}:{} - connection closed",
                    host, DEFAULT_PORT
                ));
            }
        }

        let (sender, receiver) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::event_loop(connection, sender);
        });

        Ok(Self {
            receiver,
            _thread: handle,
        })
    }

    fn event_loop(mut connection: rumqttc::Connection, sender: Sender<ConfigUpdate>) {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    match serde_json::from_slice::<ConfigUpdate>(&publish.payload) {
                        Ok(update) => {
                            if sender.send(update).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            eprintln!("Ignoring malformed config message: {}", e);
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("MQTT connection error: {}", e);
                    thread::sleep(Duration::from_secs(5));
                }
            }
        }
    }

    /// Get any pending config updates (non-blocking)
    pub fn poll(&self) -> Vec<ConfigUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = self.receiver.try_recv() {
            updates.push(update);
        }
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, JointMode};

    #[test]
    fn test_payload_parses_partial_config() {
        let payload = br#"{"joints": "mixed", "interval": [8.0, 12.0]}"#;
        let update: ConfigUpdate = serde_json::from_slice(payload).unwrap();
        let next = update.apply(&Config::default()).unwrap();
        assert_eq!(next.joints, JointMode::Mixed);
        assert_eq!(next.interval, [8.0, 12.0]);
        // Untouched fields keep defaults
        assert!(next.multiple);
    }

    #[test]
    fn test_malformed_payload_is_error() {
        assert!(serde_json::from_slice::<ConfigUpdate>(b"not json").is_err());
        assert!(serde_json::from_slice::<ConfigUpdate>(br#"{"joints": "nope"}"#).is_err());
    }
}
