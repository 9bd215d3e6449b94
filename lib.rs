/*!
 * pushover-sensor - exposes the latest Pushover message as a sensor value
 * - One-time login + device registration
 * - Polls for undelivered messages and keeps the newest one
 * - Deletes fetched messages on the server
 */

pub mod auth;
pub mod client;
pub mod creds;
pub mod error;
pub mod http;
pub mod integration;
pub mod messages;
pub mod poller;
pub mod scheduler;
pub mod sensor;
pub mod store;
pub mod types;
pub mod utils;

pub use client::PushoverClient;
pub use error::{PushoverError, Result};
pub use integration::Integration;
pub use poller::{LatestState, PollOutcome, Poller};
pub use scheduler::Scheduler;
pub use sensor::{LatestMessageSensor, SensorAttributes};
pub use store::{CredentialStore, JsonFileStore, MemoryStore};
pub use types::{Config, Credential, Message};
