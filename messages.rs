use log::{debug, info};

use crate::client::PushoverClient;
use crate::error::{PushoverError, Result};
use crate::types::{Credential, Message, MessagesResponse, StatusResponse};

impl PushoverClient {
    /// Download every message not yet deleted for this device.
    pub async fn download_messages(&self, credential: &Credential) -> Result<Vec<Message>> {
        let query = [
            ("secret", credential.secret.as_str()),
            ("device_id", credential.device_id.as_str()),
        ];
        let res = self
            .http()
            .get(&self.url("messages.json"), &query)
            .await?;

        if res.status != 200 {
            return Err(PushoverError::Fetch {
                status: res.status,
                body: res.body,
            });
        }

        debug!("Full Pushover response: {}", res.body);

        let messages: MessagesResponse =
            serde_json::from_str(&res.body).map_err(|e| PushoverError::Fetch {
                status: res.status,
                body: format!("malformed body ({}): {}", e, res.body),
            })?;

        Ok(messages.messages)
    }

    /// Delete every message up to and including `highest_message_id`.
    pub async fn delete_messages(
        &self,
        credential: &Credential,
        highest_message_id: &str,
    ) -> Result<()> {
        let url = self.url(&format!(
            "devices/{}/update_highest_message.json",
            credential.device_id
        ));
        let form = [
            ("secret", credential.secret.as_str()),
            ("message", highest_message_id),
        ];
        let res = self.http().post_form(&url, &form).await?;

        if res.status != 200 {
            return Err(PushoverError::Acknowledge {
                status: res.status,
                body: res.body,
            });
        }

        match serde_json::from_str::<StatusResponse>(&res.body) {
            Ok(StatusResponse { status: 1 }) => {
                info!("Successfully deleted messages up to ID {}", highest_message_id);
                Ok(())
            }
            _ => Err(PushoverError::Acknowledge {
                status: res.status,
                body: res.body,
            }),
        }
    }
}

/// Newest message by `date`. On equal dates the one appearing last wins.
pub fn select_latest(messages: &[Message]) -> Option<&Message> {
    messages.iter().max_by_key(|m| m.date)
}
