//! Deterministic territory rules shared by the runtime and offline tools.
//!
//! `game-core` defines the canonical data model (grid topologies, land
//! cells, maps, order queues) and the tick engine that resolves movement,
//! combat, growth and fog of war. It performs no I/O. All state mutation
//! flows through [`engine::GameEngine`], and supporting crates depend on the
//! types re-exported here.
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod land;
pub mod map;
pub mod movement;
pub mod state;
pub mod topology;

pub use config::{ConfigError, GameConfig};
pub use engine::{
    AppliedMove, CellPatch, Clash, DiscardedOrder, Elimination, EngineError, GameEngine,
    OrderRejection, TickOutcome, ViewDelta,
};
pub use error::{ErrorSeverity, GameError};
pub use generator::{GenerateError, MapGenerator, MapRequest};
pub use land::{LandCell, LandType, NEUTRAL, PlayerColor};
pub use map::{Map, MapError, MapView};
pub use movement::{MoveOrder, MovementQueue, OrderError};
pub use state::{Contestant, GameResult, GameState, TeamId};
pub use topology::{
    GridMode, HexGrid, MAX_NEIGHBORS, Neighbors, Pos, SquareGrid, Topology, TriangleGrid,
};
