//! Map sources implementing [`game_core::MapGenerator`].

pub mod authored;
pub mod catalog;
pub mod random;

pub use authored::AuthoredMap;
pub use catalog::MapCatalog;
pub use random::RandomMap;
