use crate::error::{ErrorSeverity, GameError};

/// Rejected configuration values.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("min_players ({min}) must be between 1 and max_players ({max})")]
    PlayerLimits { min: usize, max: usize },

    #[error("max_players ({0}) exceeds the {colors} available colors", colors = GameConfig::MAX_COLORS)]
    TooManyPlayers(usize),

    #[error("tick_interval_ms must be positive")]
    ZeroTickInterval,

    #[error("max_lag_ticks must be positive")]
    ZeroLagAllowance,
}

impl GameError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::PlayerLimits { .. } => "CONFIG_PLAYER_LIMITS",
            ConfigError::TooManyPlayers(_) => "CONFIG_TOO_MANY_PLAYERS",
            ConfigError::ZeroTickInterval => "CONFIG_ZERO_TICK_INTERVAL",
            ConfigError::ZeroLagAllowance => "CONFIG_ZERO_LAG_ALLOWANCE",
        }
    }
}

/// Game configuration constants and tunable parameters.
///
/// Growth cadence and room limits are configuration, not rules: golden
/// scenario tests pin the defaults below.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// Tick period at speed 1, in milliseconds.
    pub tick_interval_ms: u64,
    /// Owned generals gain one army every this many ticks.
    pub general_growth_interval: u32,
    /// Owned cities gain one army every this many ticks.
    pub city_growth_interval: u32,
    /// Owned plain land gains one army every this many ticks.
    pub land_growth_interval: u32,
    /// Every owned cell receives [`GameConfig::round_bonus`] every this many ticks.
    pub round_interval: u32,
    pub round_bonus: u32,
    /// Members required before a room may start.
    pub min_players: usize,
    pub max_players: usize,
    /// Ticks a room may fall behind schedule before it is force-ended.
    pub max_lag_ticks: u32,
}

impl GameConfig {
    // ===== compile-time constants =====
    /// Maximum number of orders a player may have queued.
    pub const MAX_QUEUED_ORDERS: usize = 256;
    /// Maximum chat message length in UTF-16 code units.
    pub const MAX_MESSAGE_LEN: usize = 616;
    /// Number of distinct player colors (1..=MAX_COLORS).
    pub const MAX_COLORS: usize = 16;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TICK_INTERVAL_MS: u64 = 500;
    pub const DEFAULT_GENERAL_GROWTH_INTERVAL: u32 = 2;
    pub const DEFAULT_CITY_GROWTH_INTERVAL: u32 = 4;
    pub const DEFAULT_LAND_GROWTH_INTERVAL: u32 = 50;
    pub const DEFAULT_ROUND_INTERVAL: u32 = 100;
    pub const DEFAULT_ROUND_BONUS: u32 = 2;
    pub const DEFAULT_MIN_PLAYERS: usize = 2;
    pub const DEFAULT_MAX_PLAYERS: usize = 8;
    pub const DEFAULT_MAX_LAG_TICKS: u32 = 10;

    pub fn new() -> Self {
        Self {
            tick_interval_ms: Self::DEFAULT_TICK_INTERVAL_MS,
            general_growth_interval: Self::DEFAULT_GENERAL_GROWTH_INTERVAL,
            city_growth_interval: Self::DEFAULT_CITY_GROWTH_INTERVAL,
            land_growth_interval: Self::DEFAULT_LAND_GROWTH_INTERVAL,
            round_interval: Self::DEFAULT_ROUND_INTERVAL,
            round_bonus: Self::DEFAULT_ROUND_BONUS,
            min_players: Self::DEFAULT_MIN_PLAYERS,
            max_players: Self::DEFAULT_MAX_PLAYERS,
            max_lag_ticks: Self::DEFAULT_MAX_LAG_TICKS,
        }
    }

    /// Checks the values a room depends on to run at all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players == 0 || self.min_players > self.max_players {
            return Err(ConfigError::PlayerLimits {
                min: self.min_players,
                max: self.max_players,
            });
        }
        if self.max_players > Self::MAX_COLORS {
            return Err(ConfigError::TooManyPlayers(self.max_players));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.max_lag_ticks == 0 {
            return Err(ConfigError::ZeroLagAllowance);
        }
        Ok(())
    }

    /// Growth bonus an owned cell of `kind` receives on `tick`.
    pub fn growth_for(&self, kind: crate::LandType, tick: u64) -> u32 {
        let every = |interval: u32| interval > 0 && tick % u64::from(interval) == 0;

        let base = match kind {
            crate::LandType::General => every(self.general_growth_interval),
            crate::LandType::City => every(self.city_growth_interval),
            crate::LandType::Land => every(self.land_growth_interval),
            _ => false,
        };
        let round = if every(self.round_interval) {
            self.round_bonus
        } else {
            0
        };

        u32::from(base) + round
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
