//! Authoritative match state.
//!
//! [`GameState`] owns the map, the contestants and their order queues, and
//! the last view sent to each contestant. Runtime layers read it freely but
//! mutate it exclusively through [`crate::engine::GameEngine`].

use std::collections::BTreeMap;

use crate::config::GameConfig;
use crate::engine::EngineError;
use crate::land::{LandCell, NEUTRAL, PlayerColor};
use crate::map::Map;
use crate::movement::MovementQueue;

/// Team identifier chosen in the waiting room.
pub type TeamId = u8;

/// A player as the rules see it: a color, an optional team, and whether it
/// is still in the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contestant {
    pub color: PlayerColor,
    pub team: Option<TeamId>,
    pub alive: bool,
}

impl Contestant {
    pub const fn new(color: PlayerColor, team: Option<TeamId>) -> Self {
        Self {
            color,
            team,
            alive: true,
        }
    }

    /// Whether two contestants fight on the same side.
    pub fn allied_with(&self, other: &Contestant) -> bool {
        self.color == other.color || (self.team.is_some() && self.team == other.team)
    }
}

/// Final outcome of a match. An empty winner list is a draw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameResult {
    pub winners: Vec<PlayerColor>,
    /// The match was stopped from outside instead of being decided on the board.
    pub aborted: bool,
}

/// Canonical state of one running match.
#[derive(Clone, Debug)]
pub struct GameState {
    pub map: Map,
    pub config: GameConfig,
    /// Number of completed ticks.
    pub(crate) tick: u64,
    /// Sorted by color.
    pub(crate) contestants: Vec<Contestant>,
    pub(crate) queues: BTreeMap<PlayerColor, MovementQueue>,
    /// Last view reported to each color, row-major.
    pub(crate) views: BTreeMap<PlayerColor, Vec<LandCell>>,
    pub(crate) result: Option<GameResult>,
}

impl GameState {
    /// Creates the state for a match on `map`.
    ///
    /// Every contestant must own exactly one general on the map and colors
    /// must be unique and non-neutral.
    pub fn new(
        map: Map,
        mut contestants: Vec<Contestant>,
        config: GameConfig,
    ) -> Result<Self, EngineError> {
        map.validate()?;
        contestants.sort_by_key(|c| c.color);

        for pair in contestants.windows(2) {
            if pair[0].color == pair[1].color {
                return Err(EngineError::DuplicateColor(pair[0].color));
            }
        }
        for contestant in &contestants {
            if contestant.color == NEUTRAL {
                return Err(EngineError::UnknownPlayer(NEUTRAL));
            }
            if map.general_of(contestant.color).is_none() {
                return Err(EngineError::MissingGeneral(contestant.color));
            }
        }

        let queues = contestants
            .iter()
            .map(|c| (c.color, MovementQueue::new()))
            .collect();

        Ok(Self {
            map,
            config,
            tick: 0,
            contestants,
            queues,
            views: BTreeMap::new(),
            result: None,
        })
    }

    pub const fn tick(&self) -> u64 {
        self.tick
    }

    pub fn contestants(&self) -> &[Contestant] {
        &self.contestants
    }

    pub fn contestant(&self, color: PlayerColor) -> Option<&Contestant> {
        self.contestants.iter().find(|c| c.color == color)
    }

    pub(crate) fn contestant_mut(&mut self, color: PlayerColor) -> Option<&mut Contestant> {
        self.contestants.iter_mut().find(|c| c.color == color)
    }

    pub fn alive(&self) -> impl Iterator<Item = &Contestant> {
        self.contestants.iter().filter(|c| c.alive)
    }

    pub fn queue(&self, color: PlayerColor) -> Option<&MovementQueue> {
        self.queues.get(&color)
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// Whether cells of `a` and `b` belong to the same side.
    ///
    /// Neutral land is nobody's ally.
    pub fn allied(&self, a: PlayerColor, b: PlayerColor) -> bool {
        if a == NEUTRAL || b == NEUTRAL {
            return false;
        }
        match (self.contestant(a), self.contestant(b)) {
            (Some(a), Some(b)) => a.allied_with(b),
            _ => a == b,
        }
    }
}
