//! Runtime configuration shared by the manager and its room workers.

use game_content::MapCatalog;
use game_core::GameConfig;

use crate::api::{Result, RuntimeError};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Rules and timing applied to every new room.
    pub game_config: GameConfig,
    /// Map sources offered to the `map` vote.
    pub maps: MapCatalog,
    /// Capacity of each event bus topic.
    pub event_buffer_size: usize,
    /// Mailbox capacity of each room worker.
    pub command_buffer_size: usize,
    /// Fixed base seed for map generation; room `n` uses `seed + n`.
    /// Random per room when unset.
    pub seed: Option<u64>,
}

impl RuntimeConfig {
    pub fn new(game_config: GameConfig) -> Self {
        Self {
            game_config,
            ..Self::default()
        }
    }

    pub fn with_maps(mut self, maps: MapCatalog) -> Self {
        self.maps = maps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rejects values that would stall or panic a room: a zero tick period
    /// or lag allowance, and zero-capacity channels.
    pub fn validate(&self) -> Result<()> {
        self.game_config.validate()?;
        if self.event_buffer_size == 0 {
            return Err(RuntimeError::ZeroCapacity("event_buffer_size"));
        }
        if self.command_buffer_size == 0 {
            return Err(RuntimeError::ZeroCapacity("command_buffer_size"));
        }
        Ok(())
    }

    pub(crate) fn seed_for(&self, room: u32) -> u64 {
        match self.seed {
            Some(seed) => seed.wrapping_add(u64::from(room)),
            None => rand::random(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game_config: GameConfig::default(),
            maps: MapCatalog::with_defaults(),
            event_buffer_size: 100,
            command_buffer_size: 32,
            seed: None,
        }
    }
}
