use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::error::{PushoverError, Result};

pub const DEFAULT_API_URL: &str = "https://api.pushover.net/1";
pub const DEFAULT_DEVICE_NAME: &str = "home_assistant";

/// Secret + device id pair returned by a successful setup.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub secret: String,
    pub device_id: String,
}

impl Credential {
    pub fn new(secret: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            device_id: device_id.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.secret.is_empty() || self.device_id.is_empty() {
            return Err(PushoverError::Config(
                "Missing secret or device ID".to_string(),
            ));
        }
        Ok(())
    }
}

// Keep the secret out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &"<redacted>")
            .field("device_id", &self.device_id)
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub device_name: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            poll_interval_secs: 25,
            request_timeout_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(PushoverError::Config("api_url must not be empty".to_string()));
        }
        if self.device_name.trim().is_empty() {
            return Err(PushoverError::Config(
                "device_name must not be empty".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(PushoverError::Config(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(PushoverError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub secret: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeviceRegisterResponse {
    pub id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StatusResponse {
    pub status: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "id_from_wire")]
    pub id: String,
    #[serde(default)]
    pub date: i64,
    pub message: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default, deserialize_with = "optional_id_from_wire")]
    pub umid: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}

// The live API sends numeric ids, older fixtures send strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

fn id_from_wire<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    WireId::deserialize(deserializer).map(String::from)
}

fn optional_id_from_wire<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<WireId>::deserialize(deserializer)?.map(String::from))
}
