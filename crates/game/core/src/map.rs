//! The board: a rectangular container of [`LandCell`]s addressed by [`Pos`].
//!
//! `Map` answers geometric and terrain queries only. Growth, combat and
//! visibility rules live in [`crate::engine`] so the same representation can
//! back both live matches and offline tools such as map loaders.

use std::collections::{BTreeSet, VecDeque};

use crate::error::{ErrorSeverity, GameError};
use crate::land::{LandCell, LandType, PlayerColor};
use crate::topology::{GridMode, Neighbors, Pos, Topology};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MapError {
    #[error("position {pos} is out of bounds")]
    OutOfBounds { pos: Pos },

    #[error("map dimensions {width}x{height} are invalid")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("expected {expected} cells, found {found}")]
    CellCount { expected: usize, found: usize },

    #[error("color {color} has more than one general")]
    DuplicateGeneral { color: PlayerColor },

    #[error("general at {pos} has no owner")]
    NeutralGeneral { pos: Pos },

    #[error("fog-only terrain at {pos} in an authoritative map")]
    FogTerrain { pos: Pos },
}

impl GameError for MapError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            MapError::OutOfBounds { .. } | MapError::InvalidDimensions { .. } => {
                ErrorSeverity::Validation
            }
            MapError::CellCount { .. }
            | MapError::DuplicateGeneral { .. }
            | MapError::NeutralGeneral { .. }
            | MapError::FogTerrain { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            MapError::OutOfBounds { .. } => "MAP_OUT_OF_BOUNDS",
            MapError::InvalidDimensions { .. } => "MAP_INVALID_DIMENSIONS",
            MapError::CellCount { .. } => "MAP_CELL_COUNT",
            MapError::DuplicateGeneral { .. } => "MAP_DUPLICATE_GENERAL",
            MapError::NeutralGeneral { .. } => "MAP_NEUTRAL_GENERAL",
            MapError::FogTerrain { .. } => "MAP_FOG_TERRAIN",
        }
    }
}

/// Plain-data form of a map, used on the wire and by loaders.
///
/// `cells` are row-major: the cell at `(row, col)` is at index
/// `(row - 1) * width + (col - 1)`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapView {
    pub width: u32,
    pub height: u32,
    pub mode: GridMode,
    pub cells: Vec<LandCell>,
}

/// Authoritative board state for one match.
#[derive(Clone, Debug)]
pub struct Map {
    width: u32,
    height: u32,
    topology: &'static dyn Topology,
    cells: Vec<LandCell>,
}

impl Map {
    /// Largest accepted width or height.
    pub const MAX_DIMENSION: u32 = 1024;

    /// Creates a map filled with neutral land.
    pub fn new(width: u32, height: u32, mode: GridMode) -> Result<Self, MapError> {
        let len = Self::cell_count(width, height)?;
        Ok(Self {
            width,
            height,
            topology: mode.topology(),
            cells: vec![LandCell::land(); len],
        })
    }

    /// Rebuilds a map from its plain-data form, checking board invariants.
    pub fn from_view(view: MapView) -> Result<Self, MapError> {
        let expected = Self::cell_count(view.width, view.height)?;
        if view.cells.len() != expected {
            return Err(MapError::CellCount {
                expected,
                found: view.cells.len(),
            });
        }

        let map = Self {
            width: view.width,
            height: view.height,
            topology: view.mode.topology(),
            cells: view.cells,
        };
        map.validate()?;
        Ok(map)
    }

    fn cell_count(width: u32, height: u32) -> Result<usize, MapError> {
        let valid = |side: u32| (1..=Self::MAX_DIMENSION).contains(&side);
        if !valid(width) || !valid(height) {
            return Err(MapError::InvalidDimensions { width, height });
        }
        Ok(width as usize * height as usize)
    }

    /// Checks that the map holds no fog terrain and at most one owned
    /// general per color.
    pub fn validate(&self) -> Result<(), MapError> {
        let mut seen = BTreeSet::new();
        for (pos, cell) in self.iter() {
            match cell.kind {
                LandType::UnknownCity | LandType::UnknownMountain => {
                    return Err(MapError::FogTerrain { pos });
                }
                LandType::General if !cell.is_owned() => {
                    return Err(MapError::NeutralGeneral { pos });
                }
                LandType::General if !seen.insert(cell.color) => {
                    return Err(MapError::DuplicateGeneral { color: cell.color });
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn to_view(&self) -> MapView {
        MapView {
            width: self.width,
            height: self.height,
            mode: self.mode(),
            cells: self.cells.clone(),
        }
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub fn mode(&self) -> GridMode {
        self.topology.mode()
    }

    pub fn topology(&self) -> &'static dyn Topology {
        self.topology
    }

    /// Raw cells in row-major order.
    pub fn cells(&self) -> &[LandCell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [LandCell] {
        &mut self.cells
    }

    /// Whether `pos` lies on the board.
    pub fn check(&self, pos: Pos) -> bool {
        self.topology.in_bounds(pos, self.width, self.height)
    }

    /// Row-major index of `pos`, if it lies on the board.
    pub fn index_of(&self, pos: Pos) -> Option<usize> {
        self.check(pos).then(|| {
            (pos.row as usize - 1) * self.width as usize + (pos.col as usize - 1)
        })
    }

    /// Position of the cell at row-major `index`.
    pub fn pos_of(&self, index: usize) -> Pos {
        let width = self.width as usize;
        Pos::new((index / width) as i32 + 1, (index % width) as i32 + 1)
    }

    pub fn get(&self, pos: Pos) -> Result<&LandCell, MapError> {
        self.index_of(pos)
            .map(|idx| &self.cells[idx])
            .ok_or(MapError::OutOfBounds { pos })
    }

    pub fn get_mut(&mut self, pos: Pos) -> Result<&mut LandCell, MapError> {
        match self.index_of(pos) {
            Some(idx) => Ok(&mut self.cells[idx]),
            None => Err(MapError::OutOfBounds { pos }),
        }
    }

    pub fn set(&mut self, pos: Pos, cell: LandCell) -> Result<(), MapError> {
        *self.get_mut(pos)? = cell;
        Ok(())
    }

    /// Whether armies may enter `pos`. Out-of-bounds positions are not
    /// accessible.
    pub fn accessible(&self, pos: Pos) -> bool {
        self.get(pos).is_ok_and(LandCell::is_accessible)
    }

    /// All neighbor positions of `pos` in direction order, including those
    /// off the board.
    pub fn dir(&self, pos: Pos) -> Neighbors {
        self.topology.neighbors(pos)
    }

    /// Neighbor positions of `pos` that lie on the board.
    pub fn neighbors_in_bounds(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        self.dir(pos).into_iter().filter(|p| self.check(*p))
    }

    /// Iterate over all positions and cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Pos, &LandCell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| (self.pos_of(idx), cell))
    }

    /// Iterate over all positions and mutable cells in row-major order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Pos, &mut LandCell)> {
        let width = self.width as usize;
        self.cells.iter_mut().enumerate().map(move |(idx, cell)| {
            (
                Pos::new((idx / width) as i32 + 1, (idx % width) as i32 + 1),
                cell,
            )
        })
    }

    /// Cells owned by `color`.
    pub fn cells_of(&self, color: PlayerColor) -> impl Iterator<Item = (Pos, &LandCell)> {
        self.iter().filter(move |(_, cell)| cell.color == color)
    }

    /// Position of the general owned by `color`.
    pub fn general_of(&self, color: PlayerColor) -> Option<Pos> {
        self.cells_of(color)
            .find(|(_, cell)| cell.kind == LandType::General)
            .map(|(pos, _)| pos)
    }

    /// Sum of all armies on the board, neutral garrisons included.
    pub fn total_army(&self) -> u64 {
        self.cells.iter().map(|cell| u64::from(cell.amount)).sum()
    }

    /// Sum of armies owned by `color`.
    pub fn army_of(&self, color: PlayerColor) -> u64 {
        self.cells_of(color)
            .map(|(_, cell)| u64::from(cell.amount))
            .sum()
    }

    /// Step distances from `start` over accessible cells, indexed row-major.
    ///
    /// Unreachable and inaccessible cells are `None`.
    pub fn distances_from(&self, start: Pos) -> Vec<Option<u32>> {
        let mut distances = vec![None; self.cells.len()];
        let Some(start_idx) = self.index_of(start) else {
            return distances;
        };
        if !self.cells[start_idx].is_accessible() {
            return distances;
        }

        distances[start_idx] = Some(0);
        let mut frontier = VecDeque::from([(start, 0u32)]);
        while let Some((pos, dist)) = frontier.pop_front() {
            for next in self.neighbors_in_bounds(pos) {
                let Some(idx) = self.index_of(next) else {
                    continue;
                };
                if distances[idx].is_none() && self.cells[idx].is_accessible() {
                    distances[idx] = Some(dist + 1);
                    frontier.push_back((next, dist + 1));
                }
            }
        }
        distances
    }
}
