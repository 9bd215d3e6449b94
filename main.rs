/*!
 * pushover-sensor - the latest Pushover message as a sensor
 * - `setup` logs in and registers a device
 * - `run` polls every stored entry until Ctrl-C
 */

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use ftail::Ftail;
use log::{LevelFilter, debug, error, info};
use std::path::PathBuf;
use std::sync::Arc;

use pushover_sensor::creds::get_credentials;
use pushover_sensor::utils::{get_app_config_dir, get_log_dir, load_config};
use pushover_sensor::{Integration, JsonFileStore, LatestMessageSensor, PushoverClient};

#[derive(Parser)]
#[command(name = "pushover-sensor")]
#[command(about = "Expose the latest Pushover message as a sensor")]
#[command(version)]
struct Args {
    /// Directory holding config.json and credentials.json
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug or trace (overrides config file)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in to Pushover and register this sensor as a device
    Setup,
    /// Poll stored entries until interrupted
    Run {
        /// Only run this entry
        #[arg(long)]
        entry: Option<String>,
    },
    /// Load one entry, refresh it manually and print the sensor
    Refresh { entry: String },
    /// List stored entries
    List,
    /// Forget a stored entry
    Remove { entry: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_app_config_dir(args.config_dir.as_deref());
    let config = load_config(&config_dir)
        .with_context(|| format!("Failed to load config from {:?}", config_dir))?;

    let level_name = args.log_level.as_deref().unwrap_or(&config.log_level);
    let level: LevelFilter = level_name
        .parse()
        .map_err(|_| anyhow!("Invalid log level '{}'", level_name))?;

    let log_dir = get_log_dir();
    Ftail::new()
        .console(level)
        .daily_file(&log_dir, level)
        .max_file_size(1024 * 1024 * 10) // 10MB
        .retention_days(2)
        .init()?;

    info!("pushover-sensor starting up");
    info!("Config directory: {:?}", config_dir);
    info!("Log directory: {:?}", log_dir);
    debug!("Config: {:?}", config);

    let client = PushoverClient::from_config(&config)?;
    let store = Arc::new(JsonFileStore::new(&config_dir));
    let integration = Integration::new(client, store, config.poll_interval());

    match args.command {
        Command::Setup => setup(&integration).await,
        Command::Run { entry } => run(&integration, entry).await,
        Command::Refresh { entry } => {
            let sensor = integration.setup_entry(&entry).await?;
            let outcome = integration.refresh(&entry).await?;
            debug!("Manual refresh of {}: {:?}", entry, outcome);
            println!("{}", serde_json::to_string_pretty(&render(&sensor))?);
            integration.unload_entry(&entry).await;
            Ok(())
        }
        Command::List => {
            for (entry_id, credential) in integration.stored_entries()? {
                println!("{}  device={}", entry_id, credential.device_id);
            }
            Ok(())
        }
        Command::Remove { entry } => {
            if !integration.remove_entry(&entry).await? {
                return Err(anyhow!("No entry named {}", entry));
            }
            println!("Removed {}", entry);
            Ok(())
        }
    }
}

async fn setup(integration: &Integration) -> Result<()> {
    let Some(login) = get_credentials().await else {
        return Err(anyhow!("Login cancelled"));
    };

    match integration
        .create_entry(&login.email, &login.password, &login.twofa)
        .await
    {
        Ok((entry_id, credential)) => {
            println!("Setup complete: entry {} (device {})", entry_id, credential.device_id);
            Ok(())
        }
        Err(e) => {
            error!("Setup failed: {}", e);
            eprintln!("Setup failed [{}]: {}", e.kind(), e);
            Err(e.into())
        }
    }
}

async fn run(integration: &Integration, only: Option<String>) -> Result<()> {
    let entry_ids: Vec<String> = match only {
        Some(entry_id) => vec![entry_id],
        None => integration
            .stored_entries()?
            .into_iter()
            .map(|(entry_id, _)| entry_id)
            .collect(),
    };

    if entry_ids.is_empty() {
        return Err(anyhow!("No entries configured, run `pushover-sensor setup` first"));
    }

    let mut watchers = Vec::new();
    for entry_id in &entry_ids {
        match integration.setup_entry(entry_id).await {
            Ok(sensor) => {
                info!("{}: {}", sensor.unique_id(), render(&sensor));
                watchers.push(tokio::spawn(report_changes(sensor)));
            }
            Err(e) => error!("Entry {} not loaded: {}", entry_id, e),
        }
    }

    if watchers.is_empty() {
        return Err(anyhow!("No entry could be loaded"));
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    integration.unload_all().await;
    for watcher in watchers {
        let _ = watcher.await;
    }

    Ok(())
}

async fn report_changes(mut sensor: LatestMessageSensor) {
    while sensor.changed().await {
        info!("{}: {}", sensor.unique_id(), render(&sensor));
    }
}

fn render(sensor: &LatestMessageSensor) -> serde_json::Value {
    serde_json::json!({
        "name": sensor.name(),
        "unique_id": sensor.unique_id(),
        "state": sensor.state(),
        "attributes": sensor.attributes(),
    })
}
