//! One poll cycle: fetch pending messages, keep the newest, delete up to it.

use log::{debug, error, info};
use tokio::sync::{Mutex, watch};

use crate::client::PushoverClient;
use crate::error::Result;
use crate::messages::select_latest;
use crate::types::{Credential, Message};

/// Last message seen. Starts empty and is only ever replaced by a newer
/// message, so a failed or empty fetch never takes the value back to empty.
#[derive(Debug)]
pub struct LatestState {
    tx: watch::Sender<Option<Message>>,
}

impl LatestState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<Message> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Message>> {
        self.tx.subscribe()
    }

    /// Subscribers are only woken when the stored message actually changes.
    fn record(&self, message: Message) {
        self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&message) {
                return false;
            }
            *current = Some(message);
            true
        });
    }
}

impl Default for LatestState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A message was selected; `acknowledged` reports whether deletion succeeded.
    Updated { message: Message, acknowledged: bool },
    /// Nothing new, or the fetch failed.
    Unchanged,
}

#[derive(Debug)]
pub struct Poller {
    client: PushoverClient,
    credential: Credential,
    state: LatestState,
    in_flight: Mutex<()>,
}

impl Poller {
    /// Refuses credentials with an empty secret or device id.
    pub fn new(client: PushoverClient, credential: Credential) -> Result<Self> {
        credential.validate()?;
        Ok(Self {
            client,
            credential,
            state: LatestState::new(),
            in_flight: Mutex::new(()),
        })
    }

    pub fn device_id(&self) -> &str {
        &self.credential.device_id
    }

    pub fn state(&self) -> &LatestState {
        &self.state
    }

    /// Run one cycle. Concurrent callers queue behind the cycle in progress.
    /// Failures are logged and never returned.
    pub async fn poll(&self) -> PollOutcome {
        let _cycle = self.in_flight.lock().await;

        let messages = match self.client.download_messages(&self.credential).await {
            Ok(messages) => messages,
            Err(e) => {
                error!("Error fetching messages: {}", e);
                return PollOutcome::Unchanged;
            }
        };

        let Some(latest) = select_latest(&messages).cloned() else {
            debug!("No new messages found from Pushover");
            return PollOutcome::Unchanged;
        };

        info!("Latest Pushover message received: {}", latest.message);
        self.state.record(latest.clone());

        let acknowledged = match self
            .client
            .delete_messages(&self.credential, &latest.id)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to delete messages: {}", e);
                false
            }
        };

        PollOutcome::Updated {
            message: latest,
            acknowledged,
        }
    }
}
