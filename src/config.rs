//! Relay board configuration.
//!
//! ```json
//! {
//!   "title": "Garage",
//!   "gpio": { "mode": "BCM", "warnings": false },
//!   "relays": [
//!     { "id": "door", "name": "Door", "gpio_channel": 17, "impulse_time": 0.5 }
//!   ]
//! }
//! ```

use crate::gpio::GpioOptions;
use crate::relay::Behavior;
use crate::relay::DEFAULT_IMPULSE_TIME;
use crate::relay::InvalidRelay;
use crate::relay::Relay;
use crate::relay_board::RelayBoard;
use crate::relay_types::Level;

use log::debug;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "pi-relays.json";

pub const IMPULSE_BEHAVIOR: &str = "impulse";

#[derive(Debug, Error)]
#[error("Invalid configuration of relay '{relay}': {message}")]
pub struct RelayConfigError {
    relay: String,
    message: String,
    #[source]
    source: Option<InvalidRelay>,
}

impl RelayConfigError {
    pub fn new<S1: Into<String>, S2: Into<String>>(relay: S1, message: S2) -> Self {
        Self {
            relay: relay.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn from_invalid_relay<S: Into<String>>(relay: S, source: InvalidRelay) -> Self {
        Self {
            relay: relay.into(),
            message: format!("{}", source),
            source: Some(source),
        }
    }

    pub fn relay(&self) -> &str {
        &self.relay
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{}': {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No configuration file found, tried {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Relay(#[from] RelayConfigError),
}

/// Numbers may be given as JSON numbers or as text.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(t) => t.trim().parse().ok(),
        }
    }

    fn as_u32(&self) -> Option<u32> {
        match self {
            NumberOrText::Number(n) => {
                match n.fract() == 0.0 && *n >= 0.0 && *n <= u32::MAX as f64 {
                    true => Some(*n as u32),
                    false => None,
                }
            }
            NumberOrText::Text(t) => t.trim().parse().ok(),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            NumberOrText::Number(_) => false,
            NumberOrText::Text(t) => t.trim().is_empty(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub id: String,
    pub name: Option<String>,
    pub gpio_channel: Option<NumberOrText>,
    pub gpio_default_state: Option<Level>,
    pub behavior: Option<String>,
    pub impulse_time: Option<NumberOrText>,
}

impl RelayConfig {
    /// Builds the relay, or `None` when the declaration is incomplete and
    /// must be skipped.
    pub fn to_relay(&self) -> Result<Option<Relay>, RelayConfigError> {
        let id = self.id.trim();
        let name = self.name.as_deref().map(str::trim).unwrap_or_default();
        let channel = self.gpio_channel.as_ref().filter(|c| !c.is_blank());

        let channel = match (id.is_empty(), name.is_empty(), channel) {
            (false, false, Some(channel)) => channel,
            _ => {
                debug!("Skipping incomplete relay declaration '{}'", id);
                return Ok(None);
            }
        };

        let pin = channel.as_u32().ok_or_else(|| {
            RelayConfigError::new(id, format!("Invalid gpio_channel {:?}", channel))
        })?;

        let behavior = match self.behavior.as_deref().map(str::trim) {
            None | Some(IMPULSE_BEHAVIOR) => {
                let secs = match &self.impulse_time {
                    Some(time) => time.as_f64().ok_or_else(|| {
                        RelayConfigError::new(id, format!("Invalid impulse_time {:?}", time))
                    })?,
                    None => DEFAULT_IMPULSE_TIME.as_secs_f64(),
                };
                Behavior::impulse_secs(secs)
                    .map_err(|e| RelayConfigError::from_invalid_relay(id, e))?
            }
            Some(unknown) => {
                return Err(RelayConfigError::new(
                    id,
                    format!("Unmanaged relay behavior '{}'", unknown),
                ))
            }
        };

        let relay = Relay::new(id, name, pin)
            .and_then(|relay| {
                relay
                    .with_resting_level(self.gpio_default_state.unwrap_or_default())
                    .with_behavior(behavior)
            })
            .map_err(|e| RelayConfigError::from_invalid_relay(id, e))?;

        Ok(Some(relay))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: Option<String>,
    pub gpio: GpioOptions,
    pub relays: Vec<RelayConfig>,
}

impl Config {
    pub fn parse(text: &str) -> Result<Config, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded configuration from {}", path.display());
        Config::parse(&text)
    }

    pub fn search_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from(CONFIG_FILE_NAME),
            Path::new("/etc").join(CONFIG_FILE_NAME),
            Path::new("/etc/pi-relays").join(CONFIG_FILE_NAME),
        ]
    }

    /// Loads the first readable file of [`Config::search_paths`].
    pub fn locate() -> Result<Config, ConfigError> {
        Config::locate_in(&Config::search_paths())
    }

    pub fn locate_in(paths: &[PathBuf]) -> Result<Config, ConfigError> {
        for path in paths {
            match Config::load(path) {
                Err(ConfigError::Read { source, .. }) => {
                    debug!("Skipping {}: {}", path.display(), source);
                }
                result => return result,
            }
        }
        let tried: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        Err(ConfigError::NotFound(tried.join(", ")))
    }

    /// Declared relays in order, without the incomplete ones.
    pub fn relays(&self) -> Result<Vec<Relay>, ConfigError> {
        let mut relays = Vec::new();
        for relay in &self.relays {
            if let Some(relay) = relay.to_relay()? {
                relays.push(relay);
            }
        }
        Ok(relays)
    }

    /// Creates a board holding every declared relay. The board is not initialized yet.
    pub fn build_board(&self) -> Result<RelayBoard, ConfigError> {
        let mut board = RelayBoard::with_options(self.gpio);
        for relay in self.relays()? {
            board.add_relay(relay);
        }
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay_types::NumberingMode;
    use std::time::Duration;

    #[test]
    fn parses_full_declaration() {
        let config = Config::parse(
            r#"{
                "title": "Garage",
                "gpio": { "mode": "BOARD", "warnings": true },
                "relays": [
                    {
                        "id": "door",
                        "name": "Door",
                        "gpio_channel": 17,
                        "gpio_default_state": "LOW",
                        "behavior": "impulse",
                        "impulse_time": 0.5
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.title.as_deref(), Some("Garage"));
        assert_eq!(config.gpio.mode, NumberingMode::Board);
        assert!(config.gpio.warnings);

        let relays = config.relays().unwrap();
        assert_eq!(relays.len(), 1);
        let door = &relays[0];
        assert_eq!(door.id(), "door");
        assert_eq!(door.pin(), 17);
        assert_eq!(door.resting_level(), Level::Low);
        assert_eq!(
            door.behavior(),
            Behavior::Impulse {
                duration: Duration::from_millis(500)
            }
        );
    }

    #[test]
    fn applies_defaults() {
        let config =
            Config::parse(r#"{ "relays": [ { "id": "a", "name": "A", "gpio_channel": "5" } ] }"#)
                .unwrap();
        assert_eq!(config.gpio, GpioOptions::default());

        let relays = config.relays().unwrap();
        assert_eq!(relays[0].pin(), 5);
        assert_eq!(relays[0].resting_level(), Level::High);
        assert_eq!(relays[0].behavior(), Behavior::default());
    }

    #[test]
    fn skips_incomplete_relays() {
        let config = Config::parse(
            r#"{ "relays": [
                { "id": "a", "gpio_channel": 5 },
                { "id": "b", "name": "", "gpio_channel": 6 },
                { "id": "c", "name": "C" },
                { "id": "", "name": "D", "gpio_channel": 8 },
                { "id": "e", "name": "E", "gpio_channel": 9 }
            ] }"#,
        )
        .unwrap();

        let ids: Vec<String> = config
            .relays()
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["e"]);
    }

    #[test]
    fn rejects_unknown_behavior() {
        let config = Config::parse(
            r#"{ "relays": [ { "id": "a", "name": "A", "gpio_channel": 5, "behavior": "toggle" } ] }"#,
        )
        .unwrap();

        match config.relays() {
            Err(ConfigError::Relay(e)) => {
                assert_eq!(e.relay(), "a");
                assert!(e.to_string().contains("toggle"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_numbers() {
        for relay in [
            r#"{ "id": "a", "name": "A", "gpio_channel": 5, "impulse_time": 0 }"#,
            r#"{ "id": "a", "name": "A", "gpio_channel": 5, "impulse_time": "soon" }"#,
            r#"{ "id": "a", "name": "A", "gpio_channel": 5.5 }"#,
            r#"{ "id": "a", "name": "A", "gpio_channel": -1 }"#,
        ] {
            let config = Config::parse(&format!(r#"{{ "relays": [ {} ] }}"#, relay)).unwrap();
            assert!(config.relays().is_err(), "accepted {}", relay);
        }
    }

    #[test]
    fn rejects_unknown_level() {
        let result = Config::parse(
            r#"{ "relays": [ { "id": "a", "name": "A", "gpio_channel": 5, "gpio_default_state": "MAYBE" } ] }"#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn build_board_keeps_declaration_order() {
        let config = Config::parse(
            r#"{ "relays": [
                { "id": "b", "name": "B", "gpio_channel": 6 },
                { "id": "a", "name": "A", "gpio_channel": 5 }
            ] }"#,
        )
        .unwrap();
        let board = config.build_board().unwrap();
        let ids: Vec<&str> = board.relays().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn build_board_carries_gpio_options() {
        let config = Config::parse(
            r#"{
                "gpio": { "mode": "BOARD", "warnings": true },
                "relays": [ { "id": "a", "name": "A", "gpio_channel": 11 } ]
            }"#,
        )
        .unwrap();
        let board = config.build_board().unwrap();
        assert_eq!(
            board.options(),
            GpioOptions {
                warnings: true,
                mode: NumberingMode::Board
            }
        );

        let board = Config::parse("{}").unwrap().build_board().unwrap();
        assert_eq!(board.options(), GpioOptions::default());
        assert!(board.is_empty());
    }

    #[test]
    fn locate_reports_every_tried_path() {
        let paths = vec![
            PathBuf::from("/nonexistent/pi-relays.json"),
            PathBuf::from("/nonexistent/other.json"),
        ];
        match Config::locate_in(&paths) {
            Err(ConfigError::NotFound(tried)) => {
                assert!(tried.contains("/nonexistent/pi-relays.json"));
                assert!(tried.contains("/nonexistent/other.json"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
