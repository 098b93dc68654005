//! Errors raised when a command cannot be accepted by the engine.
//!
//! Orders that turn out invalid while a tick resolves are not errors; they
//! are reported as [`super::OrderRejection`]s in the tick outcome.

use crate::error::{ErrorSeverity, GameError};
use crate::land::PlayerColor;
use crate::map::MapError;
use crate::movement::OrderError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineError {
    #[error("color {0} is not part of this match")]
    UnknownPlayer(PlayerColor),

    #[error("color {0} has already been defeated")]
    PlayerDefeated(PlayerColor),

    #[error("color {0} appears more than once")]
    DuplicateColor(PlayerColor),

    #[error("color {0} has no general on the map")]
    MissingGeneral(PlayerColor),

    #[error("the match is over")]
    GameOver,

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Order(#[from] OrderError),
}

impl GameError for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            EngineError::PlayerDefeated(_) | EngineError::GameOver => ErrorSeverity::State,
            EngineError::UnknownPlayer(_)
            | EngineError::DuplicateColor(_)
            | EngineError::MissingGeneral(_) => ErrorSeverity::Internal,
            EngineError::Map(err) => err.severity(),
            EngineError::Order(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            EngineError::UnknownPlayer(_) => "ENGINE_UNKNOWN_PLAYER",
            EngineError::PlayerDefeated(_) => "ENGINE_PLAYER_DEFEATED",
            EngineError::DuplicateColor(_) => "ENGINE_DUPLICATE_COLOR",
            EngineError::MissingGeneral(_) => "ENGINE_MISSING_GENERAL",
            EngineError::GameOver => "ENGINE_GAME_OVER",
            EngineError::Map(err) => err.error_code(),
            EngineError::Order(err) => err.error_code(),
        }
    }
}
