use serde::Serialize;
use tokio::sync::watch;

use crate::types::Message;

pub const SENSOR_NAME: &str = "Latest Pushover Message";
pub const NO_MESSAGES: &str = "No messages received yet";
const NO_TITLE: &str = "No title";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorAttributes {
    pub title: String,
    pub date: i64,
    pub priority: Option<i32>,
    pub app: Option<String>,
    pub id: String,
    pub umid: Option<String>,
}

impl From<&Message> for SensorAttributes {
    fn from(message: &Message) -> Self {
        Self {
            title: message.title.clone().unwrap_or_else(|| NO_TITLE.to_string()),
            date: message.date,
            priority: message.priority,
            app: message.app.clone(),
            id: message.id.clone(),
            umid: message.umid.clone(),
        }
    }
}

/// Read-only view over a poller's latest message, for whatever renders it.
#[derive(Debug, Clone)]
pub struct LatestMessageSensor {
    unique_id: String,
    latest: watch::Receiver<Option<Message>>,
}

impl LatestMessageSensor {
    pub fn new(device_id: &str, latest: watch::Receiver<Option<Message>>) -> Self {
        Self {
            unique_id: format!("pushover_{}", device_id),
            latest,
        }
    }

    pub fn name(&self) -> &'static str {
        SENSOR_NAME
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Text of the latest message, or a placeholder before the first one.
    pub fn state(&self) -> String {
        self.latest
            .borrow()
            .as_ref()
            .map(|m| m.message.clone())
            .unwrap_or_else(|| NO_MESSAGES.to_string())
    }

    pub fn attributes(&self) -> Option<SensorAttributes> {
        self.latest.borrow().as_ref().map(SensorAttributes::from)
    }

    /// Wait until the displayed message changes. Returns false once the
    /// owning poller is gone.
    pub async fn changed(&mut self) -> bool {
        self.latest.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> Message {
        Message {
            id: "77".to_string(),
            date: 1_700_000_000,
            message: "Door opened".to_string(),
            title: None,
            priority: Some(1),
            app: Some("Alarm".to_string()),
            umid: Some("5".to_string()),
        }
    }

    #[test]
    fn placeholder_before_first_message() {
        let (_tx, rx) = watch::channel(None);
        let sensor = LatestMessageSensor::new("dev1", rx);

        assert_eq!(sensor.state(), NO_MESSAGES);
        assert!(sensor.attributes().is_none());
        assert_eq!(sensor.unique_id(), "pushover_dev1");
        assert_eq!(sensor.name(), "Latest Pushover Message");
    }

    #[test]
    fn exposes_message_and_attributes() {
        let (_tx, rx) = watch::channel(Some(message()));
        let sensor = LatestMessageSensor::new("dev1", rx);

        assert_eq!(sensor.state(), "Door opened");
        let attributes = sensor.attributes().unwrap();
        assert_eq!(attributes.title, "No title");
        assert_eq!(attributes.id, "77");
        assert_eq!(attributes.app.as_deref(), Some("Alarm"));
        assert_eq!(
            serde_json::to_value(&attributes).unwrap()["date"],
            serde_json::json!(1_700_000_000)
        );
    }

    #[tokio::test]
    async fn changed_follows_the_sender() {
        let (tx, rx) = watch::channel(None);
        let mut sensor = LatestMessageSensor::new("dev1", rx);

        tx.send_replace(Some(message()));
        assert!(sensor.changed().await);
        assert_eq!(sensor.state(), "Door opened");

        drop(tx);
        assert!(!sensor.changed().await);
    }
}
