//! Room orchestration for the authoritative game server.
//!
//! This crate wires rooms, their worker tasks and the event bus into one
//! [`RoomManager`] that transports drive with decoded [`ClientCommand`]s.
//!
//! Modules are organized by responsibility:
//! - [`manager`] hosts the room registry and command dispatch
//! - [`room`] is the synchronous room state machine
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod config;
pub mod events;
pub mod manager;
pub mod room;
pub mod types;

mod workers;

pub use api::{ClientCommand, ErrorKind, Result, RoomHandle, RuntimeError};
pub use config::RuntimeConfig;
pub use events::{
    Audience, Envelope, EventBus, MemberInfo, RoomSettings, RoomSnapshot, RoomSummary,
    RosterEntry, ServerEvent, Topic, VoteTally,
};
pub use manager::RoomManager;
pub use room::{ChatScope, MAX_SPEED, Member, PlayerAction, Room, VoteItem};
pub use types::{Identity, RoomId, RoomStatus, TeamId};
