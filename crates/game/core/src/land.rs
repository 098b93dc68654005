//! Land cells and their terrain kinds.

/// Color of a player within a match. `0` is the neutral color.
pub type PlayerColor = u8;

/// The neutral (unowned) color.
pub const NEUTRAL: PlayerColor = 0;

/// Terrain kind of a cell.
///
/// `UnknownCity` and `UnknownMountain` only appear in fogged views; the
/// authoritative map never contains them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum LandType {
    #[default]
    Land = 0,
    General = 1,
    City = 2,
    Mountain = 3,
    UnknownCity = 4,
    UnknownMountain = 5,
}

impl LandType {
    /// Armies may stand on or move into this terrain.
    pub const fn is_accessible(self) -> bool {
        !matches!(self, LandType::Mountain | LandType::UnknownMountain)
    }

    /// Terrain as seen through fog: shape is kept, identity is not.
    pub const fn fogged(self) -> LandType {
        match self {
            LandType::Land | LandType::General => LandType::Land,
            LandType::City | LandType::UnknownCity => LandType::UnknownCity,
            LandType::Mountain | LandType::UnknownMountain => LandType::UnknownMountain,
        }
    }
}

/// One cell of the board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LandCell {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: LandType,
    pub color: PlayerColor,
    pub amount: u32,
}

impl LandCell {
    pub const fn new(kind: LandType, color: PlayerColor, amount: u32) -> Self {
        Self {
            kind,
            color,
            amount,
        }
    }

    /// Empty neutral land.
    pub const fn land() -> Self {
        Self::new(LandType::Land, NEUTRAL, 0)
    }

    pub const fn mountain() -> Self {
        Self::new(LandType::Mountain, NEUTRAL, 0)
    }

    /// Neutral city garrisoned by `amount`.
    pub const fn city(amount: u32) -> Self {
        Self::new(LandType::City, NEUTRAL, amount)
    }

    pub const fn general(color: PlayerColor, amount: u32) -> Self {
        Self::new(LandType::General, color, amount)
    }

    pub const fn is_owned(&self) -> bool {
        self.color != NEUTRAL
    }

    pub const fn is_accessible(&self) -> bool {
        self.kind.is_accessible()
    }

    /// The cell as reported to a player who cannot see it.
    pub const fn fogged(&self) -> Self {
        Self::new(self.kind.fogged(), NEUTRAL, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mountains_are_not_accessible() {
        assert!(LandType::Land.is_accessible());
        assert!(LandType::City.is_accessible());
        assert!(LandType::General.is_accessible());
        assert!(LandType::UnknownCity.is_accessible());
        assert!(!LandType::Mountain.is_accessible());
        assert!(!LandType::UnknownMountain.is_accessible());
    }

    #[test]
    fn fog_hides_owner_and_amount() {
        let general = LandCell::general(3, 17);
        assert_eq!(general.fogged(), LandCell::land());

        let city = LandCell::new(LandType::City, 2, 40);
        assert_eq!(city.fogged(), LandCell::new(LandType::UnknownCity, NEUTRAL, 0));

        assert_eq!(
            LandCell::mountain().fogged().kind,
            LandType::UnknownMountain
        );
    }

    #[test]
    fn discriminants_follow_wire_order() {
        assert_eq!(LandType::Land as u8, 0);
        assert_eq!(LandType::General as u8, 1);
        assert_eq!(LandType::UnknownMountain as u8, 5);
    }
}
