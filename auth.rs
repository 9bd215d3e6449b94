use log::{error, info};

use crate::client::PushoverClient;
use crate::error::{PushoverError, Result};
use crate::types::{Credential, DeviceRegisterResponse, LoginResponse};

const DEVICE_OS: &str = "O";

impl PushoverClient {
    /// Exchange account credentials for an API secret.
    pub async fn login(&self, email: &str, password: &str, twofa: &str) -> Result<String> {
        if email.is_empty() || password.is_empty() || twofa.is_empty() {
            return Err(PushoverError::Auth {
                status: 0,
                body: "email, password and two-factor code are required".to_string(),
            });
        }

        let form = [("email", email), ("password", password), ("twofa", twofa)];
        let res = self
            .http()
            .post_form(&self.url("users/login.json"), &form)
            .await?;

        if res.status != 200 {
            return Err(PushoverError::Auth {
                status: res.status,
                body: res.body,
            });
        }

        let secret = serde_json::from_str::<LoginResponse>(&res.body)
            .ok()
            .and_then(|r| r.secret)
            .filter(|s| !s.is_empty());

        match secret {
            Some(secret) => {
                info!("Successfully authenticated with Pushover.");
                Ok(secret)
            }
            None => Err(PushoverError::Auth {
                status: res.status,
                body: res.body,
            }),
        }
    }

    /// Register this client as a Pushover device, returning its id.
    pub async fn register_device(&self, secret: &str) -> Result<String> {
        let form = [
            ("secret", secret),
            ("name", self.device_name()),
            ("os", DEVICE_OS),
        ];
        let res = self
            .http()
            .post_form(&self.url("devices.json"), &form)
            .await?;

        if res.status != 200 {
            return Err(PushoverError::Registration {
                status: res.status,
                body: res.body,
            });
        }

        let device_id = serde_json::from_str::<DeviceRegisterResponse>(&res.body)
            .ok()
            .and_then(|r| r.id)
            .filter(|id| !id.is_empty());

        match device_id {
            Some(device_id) => {
                info!("Successfully registered device with ID: {}", device_id);
                Ok(device_id)
            }
            None => Err(PushoverError::Registration {
                status: res.status,
                body: res.body,
            }),
        }
    }

    /// Login followed by device registration. Nothing is returned unless both succeed.
    pub async fn set_up(&self, email: &str, password: &str, twofa: &str) -> Result<Credential> {
        let secret = self.login(email, password, twofa).await.inspect_err(|e| {
            error!("Pushover authentication failed: {}", e);
        })?;

        let device_id = self.register_device(&secret).await.inspect_err(|e| {
            error!("Failed to register device with Pushover: {}", e);
        })?;

        Ok(Credential { secret, device_id })
    }
}
