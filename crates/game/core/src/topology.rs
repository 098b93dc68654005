//! Grid geometry for the three supported board shapes.
//!
//! A [`GridMode`] is selected once per room and resolved to a `&'static`
//! [`Topology`] strategy object, so resolution code never branches on the
//! mode again. The order of [`Topology::neighbors`] is the canonical
//! direction index used by client key bindings and must stay stable.

use arrayvec::ArrayVec;

/// Maximum neighbor count across all modes (hexagon).
pub const MAX_NEIGHBORS: usize = 6;

/// Fixed-capacity neighbor list returned by [`Topology::neighbors`].
pub type Neighbors = ArrayVec<Pos, MAX_NEIGHBORS>;

/// A cell coordinate. Rows and columns are 1-based: `row` in `1..=height`,
/// `col` in `1..=width`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pos {
    pub row: i32,
    pub col: i32,
}

impl Pos {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Returns the position shifted by `(d_row, d_col)`.
    pub const fn offset(self, d_row: i32, d_col: i32) -> Self {
        Self::new(self.row + d_row, self.col + d_col)
    }
}

impl core::fmt::Display for Pos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Board shape of a room.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GridMode {
    #[default]
    Square,
    #[strum(to_string = "hexagon", serialize = "hex")]
    #[cfg_attr(feature = "serde", serde(alias = "hex"))]
    Hexagon,
    Triangle,
}

impl GridMode {
    /// Resolves the strategy object for this mode.
    pub fn topology(self) -> &'static dyn Topology {
        match self {
            GridMode::Square => &SquareGrid,
            GridMode::Hexagon => &HexGrid,
            GridMode::Triangle => &TriangleGrid,
        }
    }
}

/// Neighbor geometry of one grid mode.
///
/// Implementations are stateless and shared by every room of that mode.
pub trait Topology: core::fmt::Debug + Send + Sync {
    /// The mode this topology implements.
    fn mode(&self) -> GridMode;

    /// Number of neighbors every cell has (ignoring the board edge).
    fn degree(&self) -> usize;

    /// Adjacent positions in canonical direction order.
    ///
    /// The result always has [`Topology::degree`] entries; positions may lie
    /// outside the board and must be filtered with [`Topology::in_bounds`].
    fn neighbors(&self, pos: Pos) -> Neighbors;

    /// Whether `pos` lies on a `width` x `height` board.
    fn in_bounds(&self, pos: Pos, width: u32, height: u32) -> bool {
        pos.row >= 1
            && pos.col >= 1
            && i64::from(pos.row) <= i64::from(height)
            && i64::from(pos.col) <= i64::from(width)
    }

    /// Whether `b` is one of `a`'s neighbors.
    fn is_adjacent(&self, a: Pos, b: Pos) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Index of `to` in `from`'s neighbor list, i.e. the direction key.
    fn direction_of(&self, from: Pos, to: Pos) -> Option<usize> {
        self.neighbors(from).iter().position(|p| *p == to)
    }
}

fn collect(pos: Pos, offsets: &[(i32, i32)]) -> Neighbors {
    offsets.iter().map(|&(dr, dc)| pos.offset(dr, dc)).collect()
}

/// Four-neighbor square grid: up, right, down, left.
#[derive(Clone, Copy, Debug, Default)]
pub struct SquareGrid;

impl SquareGrid {
    const OFFSETS: [(i32, i32); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];
}

impl Topology for SquareGrid {
    fn mode(&self) -> GridMode {
        GridMode::Square
    }

    fn degree(&self) -> usize {
        4
    }

    fn neighbors(&self, pos: Pos) -> Neighbors {
        collect(pos, &Self::OFFSETS)
    }
}

/// Flat-top hexagons laid out in columns; even columns sit half a cell lower.
///
/// Direction order: N, NE, SE, S, SW, NW.
#[derive(Clone, Copy, Debug, Default)]
pub struct HexGrid;

impl HexGrid {
    const ODD_COLUMN: [(i32, i32); 6] = [(-1, 0), (-1, 1), (0, 1), (1, 0), (0, -1), (-1, -1)];
    const EVEN_COLUMN: [(i32, i32); 6] = [(-1, 0), (0, 1), (1, 1), (1, 0), (1, -1), (0, -1)];
}

impl Topology for HexGrid {
    fn mode(&self) -> GridMode {
        GridMode::Hexagon
    }

    fn degree(&self) -> usize {
        6
    }

    fn neighbors(&self, pos: Pos) -> Neighbors {
        if pos.col.rem_euclid(2) == 0 {
            collect(pos, &Self::EVEN_COLUMN)
        } else {
            collect(pos, &Self::ODD_COLUMN)
        }
    }
}

/// Alternating triangles: a cell points up when `row + col` is even.
///
/// Direction order: across the horizontal edge (down for up-pointing cells,
/// up for down-pointing cells), right, left.
#[derive(Clone, Copy, Debug, Default)]
pub struct TriangleGrid;

impl TriangleGrid {
    pub fn points_up(pos: Pos) -> bool {
        (pos.row + pos.col).rem_euclid(2) == 0
    }
}

impl Topology for TriangleGrid {
    fn mode(&self) -> GridMode {
        GridMode::Triangle
    }

    fn degree(&self) -> usize {
        3
    }

    fn neighbors(&self, pos: Pos) -> Neighbors {
        let vertical = if Self::points_up(pos) { 1 } else { -1 };
        collect(pos, &[(vertical, 0), (0, 1), (0, -1)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn board() -> impl Iterator<Item = Pos> {
        (1..=9).flat_map(|row| (1..=9).map(move |col| Pos::new(row, col)))
    }

    #[test]
    fn degree_matches_mode() {
        assert_eq!(GridMode::Square.topology().degree(), 4);
        assert_eq!(GridMode::Hexagon.topology().degree(), 6);
        assert_eq!(GridMode::Triangle.topology().degree(), 3);

        for mode in GridMode::iter() {
            let topology = mode.topology();
            assert_eq!(topology.mode(), mode);
            for pos in board() {
                assert_eq!(topology.neighbors(pos).len(), topology.degree());
            }
        }
    }

    #[test]
    fn neighbors_are_symmetric() {
        for mode in GridMode::iter() {
            let topology = mode.topology();
            for pos in board() {
                for n in topology.neighbors(pos) {
                    assert!(
                        topology.neighbors(n).contains(&pos),
                        "{mode}: {n} does not list {pos} as neighbor"
                    );
                }
            }
        }
    }

    #[test]
    fn neighbors_are_distinct() {
        for mode in GridMode::iter() {
            let topology = mode.topology();
            let n = topology.neighbors(Pos::new(4, 4));
            for (i, a) in n.iter().enumerate() {
                assert!(!n[i + 1..].contains(a));
                assert_ne!(*a, Pos::new(4, 4));
            }
        }
    }

    #[test]
    fn square_direction_order() {
        let n = SquareGrid.neighbors(Pos::new(5, 5));
        assert_eq!(
            n.as_slice(),
            &[Pos::new(4, 5), Pos::new(5, 6), Pos::new(6, 5), Pos::new(5, 4)]
        );
    }

    #[test]
    fn hex_direction_order_depends_on_column_parity() {
        let odd = HexGrid.neighbors(Pos::new(5, 3));
        assert_eq!(
            odd.as_slice(),
            &[
                Pos::new(4, 3),
                Pos::new(4, 4),
                Pos::new(5, 4),
                Pos::new(6, 3),
                Pos::new(5, 2),
                Pos::new(4, 2),
            ]
        );

        let even = HexGrid.neighbors(Pos::new(5, 4));
        assert_eq!(
            even.as_slice(),
            &[
                Pos::new(4, 4),
                Pos::new(5, 5),
                Pos::new(6, 5),
                Pos::new(6, 4),
                Pos::new(6, 3),
                Pos::new(5, 3),
            ]
        );
    }

    #[test]
    fn triangle_vertical_neighbor_follows_orientation() {
        assert!(TriangleGrid::points_up(Pos::new(1, 1)));
        assert_eq!(TriangleGrid.neighbors(Pos::new(1, 1))[0], Pos::new(2, 1));
        assert_eq!(TriangleGrid.neighbors(Pos::new(2, 1))[0], Pos::new(1, 1));
        assert_eq!(TriangleGrid.neighbors(Pos::new(1, 2))[0], Pos::new(0, 2));
    }

    #[test]
    fn in_bounds_is_one_based() {
        let t = SquareGrid;
        assert!(t.in_bounds(Pos::new(1, 1), 3, 2));
        assert!(t.in_bounds(Pos::new(2, 3), 3, 2));
        assert!(!t.in_bounds(Pos::new(0, 1), 3, 2));
        assert!(!t.in_bounds(Pos::new(3, 1), 3, 2));
        assert!(!t.in_bounds(Pos::new(1, 4), 3, 2));
    }

    #[test]
    fn direction_index_round_trips() {
        let from = Pos::new(3, 3);
        for (index, to) in HexGrid.neighbors(from).into_iter().enumerate() {
            assert_eq!(HexGrid.direction_of(from, to), Some(index));
        }
        assert_eq!(HexGrid.direction_of(from, Pos::new(9, 9)), None);
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Hexagon".parse::<GridMode>().ok(), Some(GridMode::Hexagon));
        assert_eq!("hex".parse::<GridMode>().ok(), Some(GridMode::Hexagon));
        assert_eq!(GridMode::Hexagon.to_string(), "hexagon");
        assert_eq!(GridMode::Triangle.to_string(), "triangle");
    }
}
