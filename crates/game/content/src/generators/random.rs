//! Procedural boards.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use game_core::{
    GameConfig, GenerateError, LandCell, LandType, Map, MapGenerator, MapRequest, PlayerColor, Pos,
};

/// Square board of scattered mountains and neutral cities with generals
/// spread apart and mutually reachable.
///
/// The same request (mode, players, seed) always yields the same board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomMap {
    /// Share of cells turned into mountains, in percent.
    pub mountain_percent: u32,
    /// Share of cells turned into neutral cities, in percent.
    pub city_percent: u32,
    /// Inclusive garrison range of neutral cities.
    pub city_garrison: (u32, u32),
    /// Layouts tried before giving up.
    pub attempts: u32,
}

impl RandomMap {
    /// Board area reserved per player.
    pub const CELLS_PER_PLAYER: u32 = 40;
    pub const MIN_SIDE: u32 = 6;
    /// Army on each general when the match starts.
    pub const GENERAL_START_ARMY: u32 = 1;

    pub const DEFAULT: Self = Self {
        mountain_percent: 18,
        city_percent: 4,
        city_garrison: (40, 50),
        attempts: 64,
    };

    /// A board of plain land only.
    pub const fn open() -> Self {
        Self {
            mountain_percent: 0,
            city_percent: 0,
            ..Self::DEFAULT
        }
    }

    /// Side length of the square board for `players`.
    pub fn side_for(players: u8) -> u32 {
        let area = f64::from(u32::from(players) * Self::CELLS_PER_PLAYER);
        (area.sqrt() as u32).max(Self::MIN_SIDE)
    }

    fn terrain(&self, rng: &mut StdRng) -> LandCell {
        let roll = rng.gen_range(0..100);
        if roll < self.mountain_percent {
            LandCell::mountain()
        } else if roll < self.mountain_percent + self.city_percent {
            let (low, high) = self.city_garrison;
            LandCell::city(rng.gen_range(low..=high.max(low)))
        } else {
            LandCell::land()
        }
    }

    /// One layout attempt; `None` when generals could not be placed apart or
    /// ended up cut off from each other.
    fn try_layout(
        &self,
        rng: &mut StdRng,
        request: &MapRequest,
        side: u32,
    ) -> Result<Option<Map>, GenerateError> {
        let mut map = Map::new(side, side, request.mode)?;
        for (_, cell) in map.iter_mut() {
            *cell = self.terrain(rng);
        }

        let players = usize::from(request.players);
        let gap = (2 * side / (u32::from(request.players) + 1)).max(2) as i32;
        let mut candidates: Vec<Pos> = map
            .iter()
            .filter(|(_, cell)| cell.kind == LandType::Land)
            .map(|(pos, _)| pos)
            .collect();
        candidates.shuffle(rng);

        let mut generals: Vec<Pos> = Vec::with_capacity(players);
        for pos in candidates {
            if generals.len() == players {
                break;
            }
            if generals.iter().all(|g| spacing(*g, pos) >= gap) {
                generals.push(pos);
            }
        }
        if generals.len() < players {
            return Ok(None);
        }

        for (seat, pos) in generals.iter().enumerate() {
            let color = (seat + 1) as PlayerColor;
            map.set(*pos, LandCell::general(color, Self::GENERAL_START_ARMY))?;
        }

        let distances = map.distances_from(generals[0]);
        let connected = generals
            .iter()
            .all(|g| map.index_of(*g).and_then(|idx| distances[idx]).is_some());
        Ok(connected.then_some(map))
    }
}

impl Default for RandomMap {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl MapGenerator for RandomMap {
    fn generate(&self, request: &MapRequest) -> Result<Map, GenerateError> {
        if request.players == 0 {
            return Err(GenerateError::NoPlayers);
        }
        let side = Self::side_for(request.players);
        if usize::from(request.players) > GameConfig::MAX_COLORS {
            return Err(GenerateError::TooManyPlayers {
                players: request.players,
                width: side,
                height: side,
            });
        }

        let mut rng = StdRng::seed_from_u64(request.seed);
        for _ in 0..self.attempts {
            if let Some(map) = self.try_layout(&mut rng, request, side)? {
                return Ok(map);
            }
        }
        Err(GenerateError::Exhausted {
            attempts: self.attempts,
        })
    }
}

/// Grid distance ignoring terrain.
fn spacing(a: Pos, b: Pos) -> i32 {
    (a.row - b.row).abs() + (a.col - b.col).abs()
}

#[cfg(test)]
mod tests {
    use game_core::GridMode;

    use super::*;

    const MODES: [GridMode; 3] = [GridMode::Square, GridMode::Hexagon, GridMode::Triangle];

    #[test]
    fn every_player_gets_one_reachable_general() {
        for mode in MODES {
            for players in [2u8, 3, 8] {
                let request = MapRequest::new(mode, players, 7);
                let map = RandomMap::default().generate(&request).unwrap();
                map.validate().unwrap();

                let generals: Vec<Pos> = (1..=players)
                    .map(|color| map.general_of(color).unwrap())
                    .collect();
                let distances = map.distances_from(generals[0]);
                for pos in &generals {
                    let idx = map.index_of(*pos).unwrap();
                    assert!(distances[idx].is_some(), "{mode} general {pos} cut off");
                }
                assert!(map.general_of(players + 1).is_none());
            }
        }
    }

    #[test]
    fn same_seed_same_board() {
        let request = MapRequest::new(GridMode::Hexagon, 4, 42);
        let a = RandomMap::default().generate(&request).unwrap();
        let b = RandomMap::default().generate(&request).unwrap();
        assert_eq!(a.cells(), b.cells());
    }

    #[test]
    fn open_boards_are_plain_land() {
        let request = MapRequest::new(GridMode::Square, 2, 1);
        let map = RandomMap::open().generate(&request).unwrap();
        assert_eq!(map.width(), RandomMap::side_for(2));
        assert!(
            map.iter()
                .all(|(_, cell)| matches!(cell.kind, LandType::Land | LandType::General))
        );
    }

    #[test]
    fn player_count_is_checked() {
        let generator = RandomMap::default();
        let none = generator.generate(&MapRequest::new(GridMode::Square, 0, 0));
        assert!(matches!(none, Err(GenerateError::NoPlayers)));

        let crowd = generator.generate(&MapRequest::new(GridMode::Square, 17, 0));
        assert!(matches!(crowd, Err(GenerateError::TooManyPlayers { players: 17, .. })));
    }
}
