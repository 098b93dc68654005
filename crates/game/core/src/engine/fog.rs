//! Fog of war.
//!
//! A player sees every cell they own plus the in-bounds neighbors of those
//! cells. Everything else keeps its terrain shape but loses owner and army.

use crate::land::{LandCell, PlayerColor};
use crate::map::Map;

impl Map {
    /// Row-major mask of the cells `color` can currently see.
    pub fn visibility_of(&self, color: PlayerColor) -> Vec<bool> {
        let mut visible = vec![false; self.cells().len()];
        for (pos, _) in self.cells_of(color) {
            if let Some(idx) = self.index_of(pos) {
                visible[idx] = true;
            }
            for next in self.neighbors_in_bounds(pos) {
                if let Some(idx) = self.index_of(next) {
                    visible[idx] = true;
                }
            }
        }
        visible
    }

    /// The board as `color` is allowed to see it, row-major.
    pub fn fogged_for(&self, color: PlayerColor) -> Vec<LandCell> {
        self.visibility_of(color)
            .into_iter()
            .zip(self.cells())
            .map(|(seen, cell)| if seen { *cell } else { cell.fogged() })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::land::{LandCell, LandType, NEUTRAL};
    use crate::map::Map;
    use crate::topology::{GridMode, Pos};

    #[test]
    fn cells_two_steps_away_are_masked() {
        let mut map = Map::new(5, 1, GridMode::Square).unwrap();
        map.set(Pos::new(1, 1), LandCell::general(1, 3)).unwrap();
        map.set(Pos::new(1, 3), LandCell::new(LandType::City, 2, 9)).unwrap();
        map.set(Pos::new(1, 4), LandCell::mountain()).unwrap();
        map.set(Pos::new(1, 5), LandCell::general(2, 4)).unwrap();

        let view = map.fogged_for(1);
        assert_eq!(view[0], LandCell::general(1, 3));
        assert_eq!(view[1], LandCell::land());
        assert_eq!(view[2], LandCell::new(LandType::UnknownCity, NEUTRAL, 0));
        assert_eq!(view[3].kind, LandType::UnknownMountain);
        assert_eq!(view[4], LandCell::land());
    }

    #[test]
    fn neighbors_of_owned_cells_are_visible() {
        let mut map = Map::new(3, 3, GridMode::Hexagon).unwrap();
        map.set(Pos::new(2, 2), LandCell::general(1, 1)).unwrap();
        map.set(Pos::new(1, 1), LandCell::general(2, 6)).unwrap();

        let visible = map.visibility_of(1);
        // Even column: the top corners are not neighbors of (2, 2).
        let seen = visible.iter().filter(|v| **v).count();
        assert_eq!(seen, 7);
        assert!(!visible[0] && !visible[2]);
        assert_eq!(map.fogged_for(1)[0], LandCell::land());
    }

    #[test]
    fn unowned_color_sees_only_fog() {
        let mut map = Map::new(2, 2, GridMode::Triangle).unwrap();
        map.set(Pos::new(1, 1), LandCell::general(1, 5)).unwrap();
        assert!(map.visibility_of(4).iter().all(|v| !v));
    }
}
