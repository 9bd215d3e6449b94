use thiserror::Error;

/// Everything that can go wrong talking to Pushover or managing entries.
#[derive(Debug, Error)]
pub enum PushoverError {
    #[error("Error connecting to Pushover: {0}")]
    Connection(String),

    #[error("Pushover authentication failed with status {status}: {body}")]
    Auth { status: u16, body: String },

    #[error("Failed to register device with status {status}: {body}")]
    Registration { status: u16, body: String },

    #[error("Error fetching messages with status {status}: {body}")]
    Fetch { status: u16, body: String },

    #[error("Failed to delete messages with status {status}: {body}")]
    Acknowledge { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PushoverError {
    /// Key shown to the user when setup fails.
    pub fn kind(&self) -> &'static str {
        match self {
            PushoverError::Connection(_) => "connection_error",
            PushoverError::Auth { .. } => "auth_failed",
            PushoverError::Registration { .. } => "device_registration_failed",
            PushoverError::Fetch { .. } => "fetch_failed",
            PushoverError::Acknowledge { .. } => "acknowledge_failed",
            PushoverError::Config(_) => "invalid_config",
            PushoverError::Io(_) | PushoverError::Json(_) => "storage_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, PushoverError>;
