//! Topic-based event bus for runtime events.
//!
//! Rooms and the manager publish [`Envelope`]s to topics; transports
//! subscribe to the topics they relay and filter by audience.

mod bus;
mod types;

pub use bus::{Audience, Envelope, EventBus, Topic};
pub use types::{
    MemberInfo, RoomSettings, RoomSnapshot, RoomSummary, RosterEntry, ServerEvent, VoteTally,
};
