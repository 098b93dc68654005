//! Hand-made boards.

use game_core::{
    GenerateError, LandCell, LandType, Map, MapError, MapGenerator, MapRequest, MapView, NEUTRAL,
};

/// A fixed board whose generals are seats `1..=n`.
///
/// The board's own grid mode wins over the requested one. Seats nobody
/// takes are neutralised: their generals become cities and their land
/// becomes neutral.
#[derive(Clone, Debug)]
pub struct AuthoredMap {
    view: MapView,
    seats: u8,
}

impl AuthoredMap {
    pub fn new(view: MapView) -> Result<Self, MapError> {
        let map = Map::from_view(view.clone())?;
        let seats = (1..=u8::MAX)
            .take_while(|color| map.general_of(*color).is_some())
            .count() as u8;
        Ok(Self { view, seats })
    }

    /// Number of consecutive seats starting at color 1.
    pub const fn seats(&self) -> u8 {
        self.seats
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }
}

impl MapGenerator for AuthoredMap {
    fn generate(&self, request: &MapRequest) -> Result<Map, GenerateError> {
        if request.players == 0 {
            return Err(GenerateError::NoPlayers);
        }
        if request.players > self.seats {
            return Err(GenerateError::TooManyPlayers {
                players: request.players,
                width: self.view.width,
                height: self.view.height,
            });
        }

        let mut map = Map::from_view(self.view.clone())?;
        for (_, cell) in map.iter_mut() {
            if cell.color <= request.players {
                continue;
            }
            if cell.kind == LandType::General {
                *cell = LandCell::city(cell.amount);
            } else {
                cell.color = NEUTRAL;
            }
        }
        Ok(map)
    }
}
