//! Unified error types surfaced by the runtime API.
//!
//! Every failure carries an [`ErrorKind`] so transports can report a stable
//! category to clients without exposing internal details.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use game_core::{ConfigError, EngineError, ErrorSeverity, GameError, GenerateError};

use crate::room::VoteItem;
use crate::types::{RoomId, RoomStatus};

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Coarse classification of a [`RuntimeError`], safe to show to clients.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// Well-formed input the room's current state does not allow.
    State,
    /// The room or membership does not exist.
    NotFound,
    /// Runtime fault; details stay in the logs.
    Internal,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("malformed command: {0}")]
    InvalidCommand(String),

    #[error("message must be 1 to {max} UTF-16 units, got {len}")]
    MessageLength { len: usize, max: usize },

    #[error("invalid value {value:?} for vote {item}")]
    InvalidVote { item: VoteItem, value: String },

    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("player is not in a room")]
    NotInRoom,

    #[error("room {room_id} is full ({capacity} players)")]
    RoomFull { room_id: RoomId, capacity: usize },

    #[error("room {0} is already playing")]
    AlreadyPlaying(RoomId),

    #[error("cannot {action} while the room is {status}")]
    InvalidState {
        action: &'static str,
        status: RoomStatus,
    },

    #[error("player has no team")]
    NoTeam,

    #[error("player is not part of the match")]
    NotPlaying,

    #[error("map {0:?} is not available")]
    UnknownMap(String),

    #[error("{0} members cannot be seated as player colors")]
    SeatOverflow(usize),

    #[error("map generation failed")]
    MapGeneration(#[source] GenerateError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("invalid game configuration")]
    Config(#[from] ConfigError),

    #[error("{0} must be positive")]
    ZeroCapacity(&'static str),

    #[error("room worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::InvalidCommand(_)
            | RuntimeError::MessageLength { .. }
            | RuntimeError::InvalidVote { .. } => ErrorKind::Validation,
            RuntimeError::RoomFull { .. }
            | RuntimeError::AlreadyPlaying(_)
            | RuntimeError::InvalidState { .. }
            | RuntimeError::NoTeam
            | RuntimeError::NotPlaying => ErrorKind::State,
            RuntimeError::RoomNotFound(_) | RuntimeError::NotInRoom => ErrorKind::NotFound,
            RuntimeError::Engine(err) => match err.severity() {
                ErrorSeverity::Validation => ErrorKind::Validation,
                ErrorSeverity::State => ErrorKind::State,
                ErrorSeverity::Internal => ErrorKind::Internal,
            },
            RuntimeError::UnknownMap(_)
            | RuntimeError::SeatOverflow(_)
            | RuntimeError::MapGeneration(_)
            | RuntimeError::Config(_)
            | RuntimeError::ZeroCapacity(_)
            | RuntimeError::WorkerJoin(_) => ErrorKind::Internal,
        }
    }

    /// Code of the underlying rules error, for logs.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            RuntimeError::Engine(err) => Some(err.error_code()),
            RuntimeError::MapGeneration(err) => Some(err.error_code()),
            RuntimeError::Config(err) => Some(err.error_code()),
            _ => None,
        }
    }
}
