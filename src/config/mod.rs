//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS (`None` = any origin)
    pub client_origin: Option<String>,
    /// Max inbound client messages per second per connection
    pub input_rate_limit: u32,
    /// Lobby and match tunables
    pub game: GameConfig,
}

/// Lobby and simulation tunables
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Lobby size that starts a match immediately
    pub lobby_capacity: usize,
    /// Minimum ready participants to arm the countdown
    pub min_players: usize,
    /// Grace period before a non-full lobby starts
    pub countdown: Duration,
    /// Fixed simulation cadence
    pub tick_interval: Duration,
    /// Player hit radius against obstacle rectangles (px)
    pub collision_radius: f32,
    /// How long a collision disables movement (ms)
    pub stun_duration_ms: u64,
    /// Distance a collision pushes the player away from the obstacle (px)
    pub knockback_distance: f32,
    /// Tokens spawned per roster member
    pub tokens_per_player: usize,
    /// Server-side match length; `None` keeps matches running until the roster empties
    pub match_duration: Option<Duration>,
    /// Fixed seed for match generation (random when unset)
    pub match_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            lobby_capacity: 3,
            min_players: 2,
            countdown: Duration::from_millis(5000),
            tick_interval: Duration::from_millis(50),
            collision_radius: 20.0,
            stun_duration_ms: 2000,
            knockback_distance: 40.0,
            tokens_per_player: 5,
            match_duration: None,
            match_seed: None,
        }
    }
}

impl GameConfig {
    /// Load tunables from the environment, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let match_duration_ms: u64 = parse_or("MATCH_DURATION_MS", 0)?;

        let config = Self {
            lobby_capacity: parse_or("LOBBY_CAPACITY", defaults.lobby_capacity)?,
            min_players: parse_or("MIN_PLAYERS", defaults.min_players)?,
            countdown: Duration::from_millis(parse_or("COUNTDOWN_MS", 5000)?),
            tick_interval: Duration::from_millis(parse_or("TICK_INTERVAL_MS", 50)?),
            collision_radius: parse_or("COLLISION_RADIUS", defaults.collision_radius)?,
            stun_duration_ms: parse_or("STUN_DURATION_MS", defaults.stun_duration_ms)?,
            knockback_distance: parse_or("KNOCKBACK_DISTANCE", defaults.knockback_distance)?,
            tokens_per_player: parse_or("TOKENS_PER_PLAYER", defaults.tokens_per_player)?,
            match_duration: (match_duration_ms > 0).then(|| Duration::from_millis(match_duration_ms)),
            match_seed: parse_opt("MATCH_SEED")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the lobby rules cannot satisfy
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players == 0 {
            return Err(ConfigError::Inconsistent(
                "MIN_PLAYERS must be at least 1".to_string(),
            ));
        }
        if self.min_players > self.lobby_capacity {
            return Err(ConfigError::Inconsistent(format!(
                "MIN_PLAYERS ({}) exceeds LOBBY_CAPACITY ({})",
                self.min_players, self.lobby_capacity
            )));
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Inconsistent(
                "TICK_INTERVAL_MS must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string())
        };

        let client_origin = env::var("CLIENT_ORIGIN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && s != "*");

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            client_origin,

            input_rate_limit: parse_or("INPUT_RATE_LIMIT", 120)?,

            game: GameConfig::from_env()?,
        })
    }
}

/// Parse an optional variable, using `default` when it is unset
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    Ok(parse_opt(name)?.unwrap_or(default))
}

fn parse_opt<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}
