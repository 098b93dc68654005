//! What a single tick did to the board.

use crate::land::{LandCell, PlayerColor};
use crate::movement::MoveOrder;
use crate::state::GameResult;
use crate::topology::Pos;

/// Why a queued order was dropped when it reached the head of its queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum OrderRejection {
    /// The source cell no longer belongs to the player.
    NotOwned,
    OutOfBounds,
    /// The target is a mountain.
    Inaccessible,
    /// The source holds one army or less.
    InsufficientArmy,
    /// The player was eliminated earlier in the same tick.
    Eliminated,
}

/// How an applied move resolved on its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Clash {
    /// Target was friendly; armies merged.
    Reinforced,
    /// Target changed hands.
    Captured { previous: PlayerColor },
    /// Defender held the target.
    Repelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppliedMove {
    pub color: PlayerColor,
    pub order: MoveOrder,
    pub moved: u32,
    pub clash: Clash,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscardedOrder {
    pub color: PlayerColor,
    pub order: MoveOrder,
    pub reason: OrderRejection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Elimination {
    pub color: PlayerColor,
    pub by: PlayerColor,
    /// Position of the captured general.
    pub at: Pos,
}

/// One changed cell in a player's view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellPatch {
    pub pos: Pos,
    pub cell: LandCell,
}

/// Cells of one player's view that changed since the last tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewDelta {
    pub color: PlayerColor,
    pub patches: Vec<CellPatch>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Tick number after this tick completed.
    pub tick: u64,
    pub applied: Vec<AppliedMove>,
    pub discarded: Vec<DiscardedOrder>,
    pub eliminations: Vec<Elimination>,
    pub views: Vec<ViewDelta>,
    /// Set on the tick that ended the match.
    pub result: Option<GameResult>,
}

impl TickOutcome {
    pub(crate) fn new(tick: u64) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    pub fn captures(&self) -> impl Iterator<Item = &AppliedMove> {
        self.applied
            .iter()
            .filter(|m| matches!(m.clash, Clash::Captured { .. }))
    }

    pub fn view_of(&self, color: PlayerColor) -> Option<&ViewDelta> {
        self.views.iter().find(|v| v.color == color)
    }
}
