//! Chat scopes and message bounds.

use serde::{Deserialize, Serialize};

use game_core::GameConfig;

use crate::api::{Result, RuntimeError};

/// Where a chat message is delivered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChatScope {
    /// Everyone connected to the server.
    World,
    /// Members of the sender's room.
    Room,
    /// Members of the sender's team.
    Team,
}

/// Accepts messages with visible content of at most
/// [`GameConfig::MAX_MESSAGE_LEN`] UTF-16 code units, the length browser
/// clients measure.
pub fn validate_message(content: &str) -> Result<()> {
    let len = content.encode_utf16().count();
    if content.trim().is_empty() || len > GameConfig::MAX_MESSAGE_LEN {
        return Err(RuntimeError::MessageLength {
            len,
            max: GameConfig::MAX_MESSAGE_LEN,
        });
    }
    Ok(())
}
