//! Extension pour intégrer le client DJ radio dans pmoconfig
//!
//! Ce module fournit le trait `DjRadioConfigExt` qui ajoute à
//! `pmoconfig::Config` les réglages du client : URL des pages, délai
//! d'attente, User-Agent et niveau de log.
//!
//! # Exemple
//!
//! ```no_run
//! use pmoconfig::get_config;
//! use pmodjradio::{DjRadioClient, DjRadioConfigExt};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = get_config();
//! let client = DjRadioClient::builder()
//!     .settings(config.djradio_fetch_settings())
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::client::{FetchSettings, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::Value;
use std::time::Duration;

/// Default log filter for the command line tool
pub const DEFAULT_LOG_LEVEL: &str = "warn";

const BASE_URL_PATH: &[&str] = &["djradio", "base_url"];
const TIMEOUT_PATH: &[&str] = &["djradio", "timeout_secs"];
const USER_AGENT_PATH: &[&str] = &["djradio", "user_agent"];
const LOG_LEVEL_PATH: &[&str] = &["djradio", "log_level"];

/// Trait d'extension pour gérer la configuration DJ radio dans pmoconfig
///
/// Les getters ne persistent rien : une valeur absente ou invalide est
/// remplacée par la valeur par défaut. Les setters écrivent `config.yaml`.
pub trait DjRadioConfigExt {
    /// URL de la page de listing (défaut : `https://music.163.com/djradio`)
    fn get_djradio_base_url(&self) -> String;

    /// Définit l'URL de la page de listing
    fn set_djradio_base_url(&self, url: &str) -> Result<()>;

    /// Délai d'attente par requête, en secondes (défaut : 8)
    fn get_djradio_timeout_secs(&self) -> u64;

    /// Définit le délai d'attente par requête
    fn set_djradio_timeout_secs(&self, secs: u64) -> Result<()>;

    /// User-Agent envoyé avec chaque requête
    fn get_djradio_user_agent(&self) -> String;

    /// Définit le User-Agent
    fn set_djradio_user_agent(&self, user_agent: &str) -> Result<()>;

    /// Filtre de log utilisé quand `RUST_LOG` n'est pas défini (défaut : `warn`)
    fn get_djradio_log_level(&self) -> String;

    /// Définit le filtre de log
    fn set_djradio_log_level(&self, level: &str) -> Result<()>;

    /// Regroupe les réglages réseau en une valeur immuable
    fn djradio_fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            base_url: self.get_djradio_base_url(),
            user_agent: self.get_djradio_user_agent(),
            timeout: Duration::from_secs(self.get_djradio_timeout_secs()),
        }
    }
}

impl DjRadioConfigExt for Config {
    fn get_djradio_base_url(&self) -> String {
        self.get_string(BASE_URL_PATH, DEFAULT_BASE_URL)
    }

    fn set_djradio_base_url(&self, url: &str) -> Result<()> {
        self.set_value(BASE_URL_PATH, Value::String(url.to_string()))
    }

    fn get_djradio_timeout_secs(&self) -> u64 {
        match self.get_u64(TIMEOUT_PATH, DEFAULT_REQUEST_TIMEOUT_SECS) {
            0 => {
                tracing::warn!(
                    "Timeout of 0s is not usable, using default {}s",
                    DEFAULT_REQUEST_TIMEOUT_SECS
                );
                DEFAULT_REQUEST_TIMEOUT_SECS
            }
            secs => secs,
        }
    }

    fn set_djradio_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(TIMEOUT_PATH, Value::from(secs))
    }

    fn get_djradio_user_agent(&self) -> String {
        self.get_string(USER_AGENT_PATH, DEFAULT_USER_AGENT)
    }

    fn set_djradio_user_agent(&self, user_agent: &str) -> Result<()> {
        self.set_value(USER_AGENT_PATH, Value::String(user_agent.to_string()))
    }

    fn get_djradio_log_level(&self) -> String {
        self.get_string(LOG_LEVEL_PATH, DEFAULT_LOG_LEVEL)
    }

    fn set_djradio_log_level(&self, level: &str) -> Result<()> {
        self.set_value(LOG_LEVEL_PATH, Value::String(level.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config::load_config(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::defaults();
        assert_eq!(config.djradio_fetch_settings(), FetchSettings::default());
        assert_eq!(config.get_djradio_log_level(), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_setters_persist() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        config.set_djradio_timeout_secs(15).unwrap();
        config.set_djradio_base_url("http://localhost:8080/djradio").unwrap();
        config.set_djradio_user_agent("pmodjradio-test").unwrap();
        config.set_djradio_log_level("debug").unwrap();

        let settings = config_in(&dir).djradio_fetch_settings();
        assert_eq!(settings.timeout, Duration::from_secs(15));
        assert_eq!(settings.base_url, "http://localhost:8080/djradio");
        assert_eq!(settings.user_agent, "pmodjradio-test");
        assert_eq!(config_in(&dir).get_djradio_log_level(), "debug");
    }

    #[test]
    fn test_zero_timeout_falls_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "djradio:\n  timeout_secs: 0\n").unwrap();
        assert_eq!(
            config_in(&dir).get_djradio_timeout_secs(),
            DEFAULT_REQUEST_TIMEOUT_SECS
        );
    }
}
