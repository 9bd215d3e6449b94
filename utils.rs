use log::{info, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::Config;

pub const APP_NAME: &str = "pushover-sensor";
const CONFIG_FILENAME: &str = "config.json";

pub fn get_app_config_dir(override_dir: Option<&Path>) -> PathBuf {
    let path = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME),
    };
    fs::create_dir_all(&path).ok();
    path
}

pub fn get_log_dir() -> PathBuf {
    let mut log_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    log_dir.push(APP_NAME);
    log_dir.push("logs");
    fs::create_dir_all(&log_dir).ok();
    log_dir
}

pub fn save_config(config: &Config, config_dir: &Path) -> Result<()> {
    let config_path = config_dir.join(CONFIG_FILENAME);
    let config_json = serde_json::to_string_pretty(config)?;

    let mut file = fs::File::create(config_path)?;
    file.write_all(config_json.as_bytes())?;

    Ok(())
}

/// Missing file means defaults. The result is validated either way.
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let config_path = config_dir.join(CONFIG_FILENAME);

    let config = if config_path.exists() {
        let config_data = fs::read_to_string(config_path)?;
        serde_json::from_str(&config_data)?
    } else {
        info!("No config file found, using default");
        Config::default()
    };

    config.validate()?;
    if config.request_timeout() >= config.poll_interval() {
        warn!(
            "Request timeout ({}s) is not shorter than the poll interval ({}s); slow requests will delay cycles",
            config.request_timeout_secs, config.poll_interval_secs
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.poll_interval_secs, 25);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn saved_config_is_loaded_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            poll_interval_secs: 40,
            device_name: "kitchen".to_string(),
            ..Config::default()
        };
        save_config(&config, dir.path()).unwrap();

        let loaded = load_config(dir.path()).unwrap();
        assert_eq!(loaded.poll_interval_secs, 40);
        assert_eq!(loaded.device_name, "kitchen");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{"request_timeout_secs": 0}"#,
        )
        .unwrap();

        let err = load_config(dir.path()).unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
    }

    #[test]
    fn override_dir_is_used_and_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        assert_eq!(get_app_config_dir(Some(nested.as_path())), nested);
        assert!(nested.is_dir());
    }
}
