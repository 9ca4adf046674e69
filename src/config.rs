//! Dashboard configuration.
//!
//! A small TOML file under `~/.finboard/` covering:
//! - where the exchange rate comes from and how often to refresh it
//! - which cards exist and which screens they navigate to
//! - whether a first-run PIN should be enrolled

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Route from a dashboard card to its screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRoute {
    pub id: String,
    pub screen: crate::events::Screen,

    /// Navigation to this screen goes through the PIN dialog.
    #[serde(default)]
    pub requires_pin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Exchange rate source (SUNAT-style JSON: compra/venta/fecha).
    #[serde(default = "default_rate_url")]
    pub rate_url: String,

    /// Seconds between scheduled rate refreshes.
    #[serde(default = "default_rate_refresh_secs")]
    pub rate_refresh_secs: u64,

    /// PIN enrolled on first run if none is stored yet.
    #[serde(default)]
    pub initial_pin: Option<String>,

    /// Dashboard cards and their navigation targets.
    #[serde(default = "default_cards")]
    pub cards: Vec<CardRoute>,

    /// Local data directory (set at load time, not serialized).
    #[serde(skip)]
    pub data_dir: Option<PathBuf>,
}

fn default_rate_url() -> String {
    "https://api.apis.net.pe/v1/tipo-cambio-sunat".to_string()
}

fn default_rate_refresh_secs() -> u64 {
    3600
}

fn default_cards() -> Vec<CardRoute> {
    use crate::events::Screen;
    vec![
        CardRoute {
            id: "goals".to_string(),
            screen: Screen::Goals,
            requires_pin: false,
        },
        CardRoute {
            id: "loans".to_string(),
            screen: Screen::Loans,
            requires_pin: true,
        },
        CardRoute {
            id: "mortgage".to_string(),
            screen: Screen::Mortgage,
            requires_pin: true,
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rate_url: default_rate_url(),
            rate_refresh_secs: default_rate_refresh_secs(),
            initial_pin: None,
            cards: default_cards(),
            data_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from disk, creating the default file if missing.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            log::info!("📁 Loading config from: {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&contents)?;
            config.data_dir = Some(Self::default_data_dir()?);
            Ok(config)
        } else {
            log::info!("📝 Creating default config");
            let config = Config {
                data_dir: Some(Self::default_data_dir()?),
                ..Config::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::default_data_dir()?.join("config.toml"))
    }

    fn default_data_dir() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".finboard"))
    }

    /// Where the sled keyspace lives.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".finboard"))
            .join("dashboard_db")
    }

    pub fn rate_refresh(&self) -> Duration {
        Duration::from_secs(self.rate_refresh_secs.max(1))
    }

    /// Look up the route for a card, if it has one.
    pub fn route(&self, card_id: &str) -> Option<&CardRoute> {
        self.cards.iter().find(|c| c.id == card_id)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine home directory")]
    NoHomeDir,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Screen;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rate_refresh_secs, 3600);
        assert!(config.rate_url.contains("tipo-cambio"));
        assert_eq!(config.cards.len(), 3);
        assert!(config.initial_pin.is_none());
    }

    #[test]
    fn test_route_lookup() {
        let config = Config::default();
        let route = config.route("mortgage").unwrap();
        assert_eq!(route.screen, Screen::Mortgage);
        assert!(route.requires_pin);
        assert!(config.route("unknown").is_none());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.rate_url, config.rate_url);
        assert_eq!(parsed.cards.len(), config.cards.len());
    }

    #[test]
    fn test_partial_config_gets_defaults() {
        let parsed: Config = toml::from_str(r#"initial_pin = "4721""#).unwrap();
        assert_eq!(parsed.initial_pin.as_deref(), Some("4721"));
        assert_eq!(parsed.rate_refresh_secs, 3600);
        assert_eq!(parsed.cards.len(), 3);
    }

    #[test]
    fn test_refresh_interval_floor() {
        let config = Config {
            rate_refresh_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.rate_refresh(), Duration::from_secs(1));
    }
}
