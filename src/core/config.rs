//! core/config.rs
//! Runtime settings.
//!
//! Lookup order:
//! 1. process environment
//! 2. `.env` in the data directory (loaded into the environment first)
//! 3. defaults below
//!
//! Data directory: `dirs::data_local_dir()/nimbus`, or `NIMBUS_DATA_DIR`.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://pan.baidu.com/rest/2.0";

/// Position polling period of the playback engine.
pub const DEFAULT_POLL_MS: u64 = 100;

/// Revalidation sweep period, also the validity cache TTL.
pub const DEFAULT_URL_CHECK_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub api_url: String,
    pub access_token: Option<String>,
    pub poll_interval: Duration,
    pub url_check_interval: Duration,
}

impl Settings {
    /// Load `.env` from the data dir (if present), then read the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let data_dir = data_dir();

        let env_file = data_dir.join(".env");
        match dotenv::from_path(&env_file) {
            Ok(()) => tracing::debug!("loaded {}", env_file.display()),
            Err(e) => tracing::debug!("no env file at {}: {e}", env_file.display()),
        }

        Self::from_env(data_dir)
    }

    fn from_env(data_dir: PathBuf) -> Result<Self, ConfigError> {
        let api_url = env::var("NIMBUS_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let access_token = env::var("NIMBUS_ACCESS_TOKEN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let poll_ms = read_u64("NIMBUS_POLL_MS", DEFAULT_POLL_MS)?;
        let check_secs = read_u64("NIMBUS_URL_CHECK_SECS", DEFAULT_URL_CHECK_SECS)?;

        Ok(Self {
            data_dir,
            api_url,
            access_token,
            poll_interval: Duration::from_millis(poll_ms),
            url_check_interval: Duration::from_secs(check_secs),
        })
    }

    /// Directory holding `playlists.json` and `recent.json`.
    pub fn playlist_dir(&self) -> PathBuf {
        self.data_dir.join("playlists")
    }
}

fn data_dir() -> PathBuf {
    if let Some(dir) = env::var_os("NIMBUS_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("nimbus");
    path
}

fn read_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(value) => parse_positive(key, &value),
        Err(_) => Ok(default),
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_numbers_parse() {
        assert_eq!(parse_positive("K", " 250 ").unwrap(), 250);
    }

    #[test]
    fn zero_and_garbage_are_rejected() {
        assert!(matches!(
            parse_positive("K", "0"),
            Err(ConfigError::InvalidNumber { key: "K", .. })
        ));
        assert!(parse_positive("K", "soon").is_err());
        assert!(parse_positive("K", "-5").is_err());
    }

    #[test]
    fn playlist_dir_lives_under_data_dir() {
        let settings = Settings {
            data_dir: PathBuf::from("/tmp/nimbus-test"),
            api_url: DEFAULT_API_URL.into(),
            access_token: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_MS),
            url_check_interval: Duration::from_secs(DEFAULT_URL_CHECK_SECS),
        };
        assert_eq!(
            settings.playlist_dir(),
            PathBuf::from("/tmp/nimbus-test/playlists")
        );
    }
}
