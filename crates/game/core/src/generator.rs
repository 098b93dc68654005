//! Map source abstraction.
//!
//! Rooms ask a [`MapGenerator`] for a board when a match starts. Concrete
//! generators (random, open field, authored files) live in `game-content`.

use crate::error::{ErrorSeverity, GameError};
use crate::map::{Map, MapError};
use crate::topology::GridMode;

/// Parameters of a map request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapRequest {
    pub mode: GridMode,
    /// Number of players; colors `1..=players` each receive one general.
    pub players: u8,
    pub seed: u64,
}

impl MapRequest {
    pub const fn new(mode: GridMode, players: u8, seed: u64) -> Self {
        Self {
            mode,
            players,
            seed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error("a map needs at least one player")]
    NoPlayers,

    #[error("{players} players do not fit on a {width}x{height} map")]
    TooManyPlayers { players: u8, width: u32, height: u32 },

    #[error("no connected layout found after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error(transparent)]
    Map(#[from] MapError),
}

impl GameError for GenerateError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            GenerateError::NoPlayers | GenerateError::TooManyPlayers { .. } => {
                ErrorSeverity::Validation
            }
            GenerateError::Exhausted { .. } => ErrorSeverity::Internal,
            GenerateError::Map(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            GenerateError::NoPlayers => "GENERATE_NO_PLAYERS",
            GenerateError::TooManyPlayers { .. } => "GENERATE_TOO_MANY_PLAYERS",
            GenerateError::Exhausted { .. } => "GENERATE_EXHAUSTED",
            GenerateError::Map(err) => err.error_code(),
        }
    }
}

/// Produces a finished board with one general per requested player.
pub trait MapGenerator: Send + Sync {
    fn generate(&self, request: &MapRequest) -> Result<Map, GenerateError>;
}
