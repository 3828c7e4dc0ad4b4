use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use super::Publisher;
use crate::types::OutboundMessage;

const SUBSCRIBER_BUFFER: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedMessage {
    pub topic: String,
    pub published_at: DateTime<Utc>,
    pub message: OutboundMessage,
}

/// Keeps the most recent messages per topic and forwards every message to
/// live subscribers. Slow subscribers lose messages, publishers never wait.
#[derive(Clone)]
pub struct InMemoryBus {
    history: Arc<RwLock<HashMap<String, VecDeque<PublishedMessage>>>>,
    capacity: usize,
    sender: broadcast::Sender<PublishedMessage>,
}

impl InMemoryBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        Self {
            history: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
            sender,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedMessage> {
        self.sender.subscribe()
    }

    pub fn latest(&self, topic: &str) -> Result<Option<PublishedMessage>> {
        let history = self.read()?;
        Ok(history.get(topic).and_then(|messages| messages.back().cloned()))
    }

    /// Oldest first.
    pub fn history(&self, topic: &str) -> Result<Vec<PublishedMessage>> {
        let history = self.read()?;
        Ok(history
            .get(topic)
            .map(|messages| messages.iter().cloned().collect())
            .unwrap_or_default())
    }

    pub fn topics(&self) -> Result<Vec<String>> {
        let history = self.read()?;
        let mut topics: Vec<String> = history.keys().cloned().collect();
        topics.sort();
        Ok(topics)
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, VecDeque<PublishedMessage>>>> {
        self.history
            .read()
            .map_err(|_| anyhow!("message history lock poisoned"))
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new(50)
    }
}

impl Publisher for InMemoryBus {
    fn publish(&self, topic: &str, message: &OutboundMessage) -> Result<()> {
        let published = PublishedMessage {
            topic: topic.to_string(),
            published_at: Utc::now(),
            message: message.clone(),
        };

        {
            let mut history = self
                .history
                .write()
                .map_err(|_| anyhow!("message history lock poisoned"))?;
            let messages = history.entry(topic.to_string()).or_default();
            messages.push_back(published.clone());
            if messages.len() > self.capacity {
                messages.pop_front();
            }
        }

        // No receivers is not an error.
        let _ = self.sender.send(published);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_and_history() {
        let bus = InMemoryBus::new(10);
        bus.publish("/karis1/karis_battery_status", &OutboundMessage::battery(1000.0))
            .unwrap();
        bus.publish("/karis1/karis_battery_status", &OutboundMessage::battery(999.0))
            .unwrap();

        let latest = bus.latest("/karis1/karis_battery_status").unwrap().unwrap();
        assert_eq!(latest.message, OutboundMessage::BatteryStatus { charge: 999 });
        assert_eq!(bus.history("/karis1/karis_battery_status").unwrap().len(), 2);
        assert!(bus.latest("/unknown").unwrap().is_none());
        assert!(bus.history("/unknown").unwrap().is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let bus = InMemoryBus::new(3);
        for charge in 0..5 {
            bus.publish("/t", &OutboundMessage::battery(charge as f64)).unwrap();
        }

        let history = bus.history("/t").unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].message, OutboundMessage::BatteryStatus { charge: 2 });
        assert_eq!(history[2].message, OutboundMessage::BatteryStatus { charge: 4 });
    }

    #[test]
    fn test_topics_sorted() {
        let bus = InMemoryBus::default();
        bus.publish("/b", &OutboundMessage::fine_position_done()).unwrap();
        bus.publish("/a", &OutboundMessage::fine_position_done()).unwrap();

        assert_eq!(bus.topics().unwrap(), vec!["/a".to_string(), "/b".to_string()]);
    }

    #[tokio::test]
    async fn test_subscribers_receive_messages() {
        let bus = InMemoryBus::default();
        let mut receiver = bus.subscribe();

        bus.publish("/karis1/karis_lift_status", &OutboundMessage::LiftStatus { deployed: true })
            .unwrap();

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.topic, "/karis1/karis_lift_status");
        assert_eq!(received.message, OutboundMessage::LiftStatus { deployed: true });
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = InMemoryBus::default();
        assert!(bus.publish("/t", &OutboundMessage::fine_position_done()).is_ok());
    }
}
