//! Entry lifecycle: create from account credentials, load, refresh, unload, remove.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::client::PushoverClient;
use crate::error::{PushoverError, Result};
use crate::poller::{PollOutcome, Poller};
use crate::scheduler::Scheduler;
use crate::sensor::LatestMessageSensor;
use crate::store::CredentialStore;
use crate::types::Credential;

pub struct Integration {
    client: PushoverClient,
    store: Arc<dyn CredentialStore>,
    poll_interval: Duration,
    loaded: Mutex<HashMap<String, Arc<Scheduler>>>,
}

impl std::fmt::Debug for Integration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Integration")
            .field("client", &self.client)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Integration {
    pub fn new(
        client: PushoverClient,
        store: Arc<dyn CredentialStore>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            store,
            poll_interval,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Log in, register the device and persist the result under a new entry id.
    pub async fn create_entry(
        &self,
        email: &str,
        password: &str,
        twofa: &str,
    ) -> Result<(String, Credential)> {
        let credential = self.client.set_up(email, password, twofa).await?;
        let entry_id = Uuid::new_v4().to_string();
        self.store.set(&entry_id, &credential)?;
        info!(
            "Created entry {} for device {}",
            entry_id, credential.device_id
        );
        Ok((entry_id, credential))
    }

    /// Load a stored entry: refresh once, then keep polling on the interval.
    pub async fn setup_entry(&self, entry_id: &str) -> Result<LatestMessageSensor> {
        if self.loaded.lock().await.contains_key(entry_id) {
            return Err(already_set_up(entry_id));
        }

        let credential = self
            .store
            .get(entry_id)?
            .filter(|c| c.validate().is_ok())
            .ok_or_else(|| {
                error!("Missing secret or device ID. Entry {} not set up correctly.", entry_id);
                PushoverError::Config(format!("Missing secret or device ID for entry {}", entry_id))
            })?;

        let poller = Arc::new(Poller::new(self.client.clone(), credential)?);
        let scheduler = Arc::new(Scheduler::new(Arc::clone(&poller), self.poll_interval));

        // first refresh runs unlocked so other entries stay reachable
        scheduler.trigger_now().await;

        {
            let mut loaded = self.loaded.lock().await;
            if loaded.contains_key(entry_id) {
                return Err(already_set_up(entry_id));
            }
            scheduler.start_after(self.poll_interval);
            loaded.insert(entry_id.to_string(), Arc::clone(&scheduler));
        }

        let sensor = LatestMessageSensor::new(poller.device_id(), poller.state().subscribe());
        info!("Set up entry {} ({})", entry_id, sensor.unique_id());
        Ok(sensor)
    }

    /// Manual refresh of a loaded entry.
    pub async fn refresh(&self, entry_id: &str) -> Result<PollOutcome> {
        let scheduler = self.scheduler(entry_id).await?;
        let outcome = scheduler.trigger_now().await;
        info!("Pushover sensor manually updated.");
        Ok(outcome)
    }

    pub async fn sensor(&self, entry_id: &str) -> Result<LatestMessageSensor> {
        let scheduler = self.scheduler(entry_id).await?;
        let poller = scheduler.poller();
        Ok(LatestMessageSensor::new(
            poller.device_id(),
            poller.state().subscribe(),
        ))
    }

    /// Stop polling an entry. Returns false if it was not loaded.
    pub async fn unload_entry(&self, entry_id: &str) -> bool {
        let scheduler = self.loaded.lock().await.remove(entry_id);
        match scheduler {
            Some(scheduler) => {
                scheduler.stop().await;
                info!("Unloaded entry {}", entry_id);
                true
            }
            None => false,
        }
    }

    pub async fn unload_all(&self) {
        let drained: Vec<(String, Arc<Scheduler>)> = self.loaded.lock().await.drain().collect();
        for (entry_id, scheduler) in drained {
            scheduler.stop().await;
            info!("Unloaded entry {}", entry_id);
        }
    }

    /// Unload the entry and forget its credential.
    pub async fn remove_entry(&self, entry_id: &str) -> Result<bool> {
        self.unload_entry(entry_id).await;
        let removed = self.store.delete(entry_id)?;
        if removed {
            info!("Removed entry {}", entry_id);
        }
        Ok(removed)
    }

    pub fn stored_entries(&self) -> Result<Vec<(String, Credential)>> {
        self.store.entries()
    }

    async fn scheduler(&self, entry_id: &str) -> Result<Arc<Scheduler>> {
        self.loaded
            .lock()
            .await
            .get(entry_id)
            .cloned()
            .ok_or_else(|| PushoverError::Config(format!("Entry {} is not set up", entry_id)))
    }
}

fn already_set_up(entry_id: &str) -> PushoverError {
    PushoverError::Config(format!("Entry {} is already set up", entry_id))
}
