use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_TIME_LIMIT_SECS: u32 = 300;
pub const DEFAULT_TICK_MILLIS: u64 = 1000;

/// Construction-time settings for a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Starting time on each side's clock, in seconds.
    pub time_limit_secs: u32,
    /// Wall-clock period of one clock tick. Each tick removes one second
    /// from the side to move regardless of this value.
    pub tick_millis: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            tick_millis: DEFAULT_TICK_MILLIS,
        }
    }
}

impl GameConfig {
    pub fn with_time_limit(time_limit_secs: u32) -> Self {
        GameConfig { time_limit_secs, ..Self::default() }
    }

    /// Parse and validate a config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_limit_secs == 0 {
            return Err(ConfigError::ZeroTimeLimit);
        }
        if self.tick_millis == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        Ok(())
    }
}
