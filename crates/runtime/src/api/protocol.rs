//! Inbound wire commands.
//!
//! Transports decode one [`ClientCommand`] per message and hand it to
//! [`crate::RoomManager::dispatch`]. Outbound traffic is
//! [`crate::events::ServerEvent`].
use serde::{Deserialize, Serialize};

use game_core::{GridMode, MoveOrder, Pos};

use crate::room::{ChatScope, PlayerAction, VoteItem};
use crate::types::{Identity, RoomId, TeamId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    /// First line of a connection; names the player.
    Identify {
        identity: Identity,
    },
    CreateRoom {
        #[serde(default)]
        mode: GridMode,
    },
    ListRooms,
    JoinRoom {
        room_id: RoomId,
    },
    LeaveRoom,
    Ready,
    Move {
        from: Pos,
        to: Pos,
        #[serde(default)]
        split_army: bool,
    },
    ClearMovements,
    UndoMovement,
    Surrender,
    Vote {
        item: VoteItem,
        value: String,
    },
    JoinTeam {
        #[serde(default)]
        team: Option<TeamId>,
    },
    Message {
        scope: ChatScope,
        content: String,
    },
}

impl ClientCommand {
    /// The in-room action this command maps to, if any.
    pub fn into_action(self) -> Option<PlayerAction> {
        let action = match self {
            ClientCommand::Ready => PlayerAction::Ready,
            ClientCommand::Move {
                from,
                to,
                split_army,
            } => PlayerAction::Move(MoveOrder {
                from,
                to,
                split_army,
            }),
            ClientCommand::ClearMovements => PlayerAction::ClearMovements,
            ClientCommand::UndoMovement => PlayerAction::UndoMovement,
            ClientCommand::Surrender => PlayerAction::Surrender,
            ClientCommand::Vote { item, value } => PlayerAction::Vote { item, value },
            ClientCommand::JoinTeam { team } => PlayerAction::JoinTeam(team),
            ClientCommand::Message { scope, content } => PlayerAction::Message { scope, content },
            ClientCommand::Identify { .. }
            | ClientCommand::CreateRoom { .. }
            | ClientCommand::ListRooms
            | ClientCommand::JoinRoom { .. }
            | ClientCommand::LeaveRoom => return None,
        };
        Some(action)
    }
}
