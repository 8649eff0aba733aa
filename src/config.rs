//! Application-level configuration loading: match format and the seed
//! roster served by the in-memory player directory.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::PlayerEntity;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "DARTS_LIVE_BACK_CONFIG_PATH";
/// Score both players count down from in 501.
const DEFAULT_STARTING_SCORE: u16 = 501;
/// Legs needed to win a best-of-5 match.
const DEFAULT_LEGS_TO_WIN: u8 = 3;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Score both players count down from each leg.
    pub starting_score: u16,
    /// Legs needed to win the match.
    pub legs_to_win: u8,
    /// Players seeded into the in-memory directory at startup.
    pub seed_players: Vec<PlayerEntity>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// built-in 501 / first-to-3 format and a demo roster.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        starting_score = config.starting_score,
                        legs_to_win = config.legs_to_win,
                        players = config.seed_players.len(),
                        "loaded match format from config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            starting_score: DEFAULT_STARTING_SCORE,
            legs_to_win: DEFAULT_LEGS_TO_WIN,
            seed_players: default_players(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    starting_score: Option<u16>,
    legs_to_win: Option<u8>,
    #[serde(default)]
    players: Vec<RawPlayer>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let starting_score = match value.starting_score {
            Some(score) if score >= 2 => score,
            Some(score) => {
                warn!(score, "starting score below 2 is unplayable; using 501");
                DEFAULT_STARTING_SCORE
            }
            None => DEFAULT_STARTING_SCORE,
        };
        let legs_to_win = match value.legs_to_win {
            Some(legs) if legs >= 1 => legs,
            Some(_) => {
                warn!("legs to win must be at least 1; using 3");
                DEFAULT_LEGS_TO_WIN
            }
            None => DEFAULT_LEGS_TO_WIN,
        };
        let seed_players = if value.players.is_empty() {
            default_players()
        } else {
            value.players.into_iter().map(Into::into).collect()
        };
        Self {
            starting_score,
            legs_to_win,
            seed_players,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a seed player inside the configuration file.
struct RawPlayer {
    id: i64,
    name: String,
}

impl From<RawPlayer> for PlayerEntity {
    fn from(value: RawPlayer) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in demo roster shipped with the binary.
fn default_players() -> Vec<PlayerEntity> {
    vec![
        PlayerEntity {
            id: 1,
            name: "Home Player".into(),
        },
        PlayerEntity {
            id: 2,
            name: "Away Player".into(),
        },
    ]
}
