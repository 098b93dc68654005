//! Events pushed to clients.

use serde::{Deserialize, Serialize};

use game_core::{CellPatch, GridMode, LandCell, MoveOrder, PlayerColor, Pos};

use crate::api::ErrorKind;
use crate::room::{ChatScope, VoteItem};
use crate::types::{Identity, RoomId, RoomStatus, TeamId};

/// A member as shown in the room roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub identity: Identity,
    pub color: Option<PlayerColor>,
    pub team: Option<TeamId>,
    pub ready: bool,
    pub connected: bool,
    /// False once the member was defeated or surrendered.
    pub alive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub item: VoteItem,
    pub value: String,
    pub count: usize,
}

/// Effective match settings after voting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    pub mode: GridMode,
    pub map: String,
    pub speed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub status: RoomStatus,
    pub members: Vec<MemberInfo>,
    pub votes: Vec<VoteTally>,
    pub settings: RoomSettings,
}

/// One line of the lobby room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub mode: GridMode,
    pub members: usize,
    pub capacity: usize,
    pub status: RoomStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub identity: Identity,
    pub color: PlayerColor,
    pub team: Option<TeamId>,
}

/// Everything the server tells a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Reply to a successful create or join.
    Joined { room_id: RoomId },
    RoomSnapshot(RoomSnapshot),
    RoomList { rooms: Vec<RoomSummary> },
    RoomUpdated(RoomSummary),
    RoomClosed { room_id: RoomId },
    /// Sent to each player with their own color and initial view.
    GameStarted {
        room_id: RoomId,
        color: PlayerColor,
        width: u32,
        height: u32,
        mode: GridMode,
        roster: Vec<RosterEntry>,
        cells: Vec<LandCell>,
    },
    /// Full view of a running match for one player, sent instead of the
    /// deltas they missed. Later deltas apply on top of it.
    GameSync {
        room_id: RoomId,
        color: PlayerColor,
        tick: u64,
        width: u32,
        height: u32,
        mode: GridMode,
        roster: Vec<RosterEntry>,
        cells: Vec<LandCell>,
    },
    MapDelta { tick: u64, patches: Vec<CellPatch> },
    /// The recipient's pending orders; `selected` is the cell to reselect
    /// after an undo.
    Movements {
        orders: Vec<MoveOrder>,
        selected: Option<Pos>,
    },
    PlayerDefeated {
        identity: Identity,
        color: PlayerColor,
        by: Option<Identity>,
    },
    GameEnded {
        winners: Vec<Identity>,
        aborted: bool,
        cells: Vec<LandCell>,
    },
    Message {
        scope: ChatScope,
        sender: Identity,
        content: String,
    },
    Error { kind: ErrorKind },
}
