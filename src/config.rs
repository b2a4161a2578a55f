use std::{env, net::SocketAddr, time::Duration};

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_ARCHIVE_API_URL: &str = "http://localhost:3000/api/conversation";
pub const DEFAULT_MODEL_LABEL: &str = "Claude";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub archive_api_url: Url,
    pub model_label: String,
    pub archive_timeout: Option<Duration>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("AIARCHIVES_API_URL must be an absolute http(s) URL")]
    InvalidArchiveUrl,
    #[error("ARCHIVE_TIMEOUT_SECS must be a positive integer")]
    InvalidTimeout,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
        let bind_port = env::var("BIND_PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8000);

        let archive_api_url = env::var("AIARCHIVES_API_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_ARCHIVE_API_URL.to_string());
        let archive_api_url = Url::parse(&archive_api_url)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or(ConfigError::InvalidArchiveUrl)?;

        let model_label = env::var("ARCHIVE_MODEL_LABEL")
            .ok()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL_LABEL.to_string());

        let archive_timeout = env::var("ARCHIVE_TIMEOUT_SECS")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .ok_or(ConfigError::InvalidTimeout)
            })
            .transpose()?;

        let config = Self {
            bind_addr,
            bind_port,
            archive_api_url,
            model_label,
            archive_timeout,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // Tests mutate process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "BIND_ADDR",
            "BIND_PORT",
            "AIARCHIVES_API_URL",
            "ARCHIVE_MODEL_LABEL",
            "ARCHIVE_TIMEOUT_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn parse_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_env();

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.bind_port, 8000);
        assert_eq!(config.archive_api_url.as_str(), DEFAULT_ARCHIVE_API_URL);
        assert_eq!(config.model_label, "Claude");
        assert_eq!(config.archive_timeout, None);
    }

    #[test]
    fn overrides_are_applied() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_env();
        env::set_var("BIND_ADDR", "127.0.0.1");
        env::set_var("BIND_PORT", "9100");
        env::set_var("AIARCHIVES_API_URL", "https://archive.example.org/api/conversation");
        env::set_var("ARCHIVE_MODEL_LABEL", "  ChatGPT ");
        env::set_var("ARCHIVE_TIMEOUT_SECS", "30");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(
            config.bind_socket().expect("socket"),
            "127.0.0.1:9100".parse().expect("valid socket")
        );
        assert_eq!(
            config.archive_api_url.as_str(),
            "https://archive.example.org/api/conversation"
        );
        assert_eq!(config.model_label, "ChatGPT");
        assert_eq!(config.archive_timeout, Some(Duration::from_secs(30)));
        clear_env();
    }

    #[test]
    fn blank_model_label_falls_back_to_default() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_env();
        env::set_var("ARCHIVE_MODEL_LABEL", "   ");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.model_label, DEFAULT_MODEL_LABEL);
        clear_env();
    }

    #[test]
    fn invalid_port_fails() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_env();
        env::set_var("BIND_PORT", "eighty");

        let err = Config::from_env().expect_err("expected invalid port error");
        assert!(matches!(err, ConfigError::InvalidPort));
        clear_env();
    }

    #[test]
    fn non_http_archive_url_fails() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_env();
        env::set_var("AIARCHIVES_API_URL", "ftp://archive.example.org/upload");

        let err = Config::from_env().expect_err("expected invalid url error");
        assert!(matches!(err, ConfigError::InvalidArchiveUrl));
        clear_env();
    }

    #[test]
    fn zero_timeout_fails() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clear_env();
        env::set_var("ARCHIVE_TIMEOUT_SECS", "0");

        let err = Config::from_env().expect_err("expected invalid timeout error");
        assert!(matches!(err, ConfigError::InvalidTimeout));
        clear_env();
    }
}
