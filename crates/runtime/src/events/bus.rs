//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::ServerEvent;
use crate::types::Identity;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Room list changes
    Lobby,
    /// Membership, readiness, teams and votes
    Room,
    /// Match progress
    Game,
    /// Chat in every scope
    Chat,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Lobby, Topic::Room, Topic::Game, Topic::Chat];

    const fn index(self) -> usize {
        self as usize
    }
}

/// Who should receive an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Audience {
    Everyone,
    Only(Vec<Identity>),
}

/// Event wrapper that carries its audience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub audience: Audience,
    pub event: ServerEvent,
}

impl Envelope {
    pub fn everyone(event: ServerEvent) -> Self {
        Self {
            audience: Audience::Everyone,
            event,
        }
    }

    pub fn to(identities: impl IntoIterator<Item = Identity>, event: ServerEvent) -> Self {
        Self {
            audience: Audience::Only(identities.into_iter().collect()),
            event,
        }
    }

    pub fn to_one(identity: &Identity, event: ServerEvent) -> Self {
        Self::to([identity.clone()], event)
    }

    pub fn topic(&self) -> Topic {
        match self.event {
            ServerEvent::RoomList { .. }
            | ServerEvent::RoomUpdated(_)
            | ServerEvent::RoomClosed { .. } => Topic::Lobby,
            ServerEvent::Joined { .. } | ServerEvent::RoomSnapshot(_) | ServerEvent::Error { .. } => {
                Topic::Room
            }
            ServerEvent::GameStarted { .. }
            | ServerEvent::GameSync { .. }
            | ServerEvent::MapDelta { .. }
            | ServerEvent::Movements { .. }
            | ServerEvent::PlayerDefeated { .. }
            | ServerEvent::GameEnded { .. } => Topic::Game,
            ServerEvent::Message { .. } => Topic::Chat,
        }
    }

    pub fn is_for(&self, identity: &Identity) -> bool {
        match &self.audience {
            Audience::Everyone => true,
            Audience::Only(identities) => identities.contains(identity),
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Channels for every topic exist from the start,
/// so publishing never blocks and subscribing never fails.
#[derive(Clone)]
pub struct EventBus {
    channels: [broadcast::Sender<Envelope>; 4],
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Topic::ALL.map(|_| broadcast::channel(capacity).0),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, envelope: Envelope) {
        let topic = envelope.topic();
        if self.channels[topic.index()].send(envelope).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Envelope> {
        self.channels[topic.index()].subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> Vec<(Topic, broadcast::Receiver<Envelope>)> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
