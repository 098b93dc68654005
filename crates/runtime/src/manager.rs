//! Registry of live rooms and the player-to-room index.
//!
//! [`RoomManager`] is the single entry point for transports. The registry
//! lock only guards map lookups and updates: every call into a room worker,
//! and every worker teardown, happens after the lock is released, so a slow
//! room never stalls the others.
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use game_core::{GridMode, MoveOrder};

use crate::api::{ClientCommand, Result, RoomHandle, RuntimeError};
use crate::config::RuntimeConfig;
use crate::events::{Envelope, EventBus, RoomSnapshot, RoomSummary, ServerEvent, Topic};
use crate::room::{ChatScope, PlayerAction, Room, VoteItem, validate_message};
use crate::types::{Identity, RoomId, RoomStatus, TeamId};
use crate::workers::RoomWorker;

struct RoomEntry {
    handle: RoomHandle,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Registry {
    rooms: HashMap<RoomId, RoomEntry>,
    /// A player is in at most one room.
    players: HashMap<Identity, RoomId>,
    next_id: u32,
}

impl Registry {
    fn allocate(&mut self) -> RoomId {
        let room_id = RoomId(self.next_id);
        self.next_id += 1;
        room_id
    }

    fn handle(&self, room_id: RoomId) -> Result<RoomHandle> {
        self.rooms
            .get(&room_id)
            .map(|entry| entry.handle.clone())
            .ok_or(RuntimeError::RoomNotFound(room_id))
    }

    /// Drops a room and every membership pointing at it.
    fn remove(&mut self, room_id: RoomId) -> Option<RoomEntry> {
        self.players.retain(|_, id| *id != room_id);
        self.rooms.remove(&room_id)
    }
}

/// Cloneable owner of every room on the server.
#[derive(Clone)]
pub struct RoomManager {
    registry: Arc<Mutex<Registry>>,
    config: Arc<RuntimeConfig>,
    event_bus: EventBus,
}

impl RoomManager {
    /// Builds a manager, rejecting configurations a room could not run
    /// with.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        let event_bus = EventBus::with_capacity(config.event_buffer_size);
        Ok(Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 1,
                ..Registry::default()
            })),
            config: Arc::new(config),
            event_bus,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Envelope> {
        self.event_bus.subscribe(topic)
    }

    /// Opens a new waiting room and starts its worker.
    pub async fn create(&self, mode: GridMode) -> RoomId {
        let mut registry = self.registry.lock().await;
        let room_id = registry.allocate();
        let room = self.new_room(room_id, mode);
        self.spawn(&mut registry, room);
        info!(target: "runtime::manager", room = %room_id, mode = %mode, "room created");
        room_id
    }

    /// Opens a new room with `identity` already seated, leaving any other
    /// room first. The room is never registered without its creator.
    pub async fn create_and_join(&self, identity: &Identity, mode: GridMode) -> Result<RoomId> {
        match self.leave(identity).await {
            Ok(()) | Err(RuntimeError::NotInRoom) => {}
            Err(err) => return Err(err),
        }

        let mut registry = self.registry.lock().await;
        let room_id = registry.allocate();
        let mut room = self.new_room(room_id, mode);
        room.join(identity)?;
        self.spawn(&mut registry, room);
        registry.players.insert(identity.clone(), room_id);
        info!(target: "runtime::manager", room = %room_id, mode = %mode, player = %identity, "room created");
        Ok(room_id)
    }

    /// Moves `identity` into `room_id`, leaving any other room first.
    pub async fn join(&self, identity: &Identity, room_id: RoomId) -> Result<()> {
        let (current, handle) = {
            let registry = self.registry.lock().await;
            let current = registry.players.get(identity).copied();
            if current == Some(room_id) {
                return Ok(());
            }
            (current, registry.handle(room_id)?)
        };
        if current.is_some() {
            self.leave(identity).await?;
        }

        match handle.join(identity.clone()).await {
            Ok(()) => {}
            Err(err @ RuntimeError::RoomNotFound(_)) => {
                self.evict(room_id).await;
                return Err(err);
            }
            Err(err) => return Err(err),
        }

        let mut registry = self.registry.lock().await;
        // The room may have been torn down while the worker answered.
        if !registry.rooms.contains_key(&room_id) {
            return Err(RuntimeError::RoomNotFound(room_id));
        }
        registry.players.insert(identity.clone(), room_id);
        debug!(target: "runtime::manager", room = %room_id, player = %identity, "joined");
        Ok(())
    }

    /// Leaves the current room, destroying it once nobody is connected.
    pub async fn leave(&self, identity: &Identity) -> Result<()> {
        let (room_id, handle) = {
            let mut registry = self.registry.lock().await;
            let room_id = registry
                .players
                .remove(identity)
                .ok_or(RuntimeError::NotInRoom)?;
            let Ok(handle) = registry.handle(room_id) else {
                return Ok(());
            };
            (room_id, handle)
        };

        match handle.leave(identity.clone()).await {
            Ok(0) => {
                debug!(target: "runtime::manager", room = %room_id, "last member left");
                self.destroy_if_empty(room_id).await
            }
            Ok(_) => Ok(()),
            Err(RuntimeError::RoomNotFound(_)) => {
                self.evict(room_id).await;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Forces a room down, aborting any match in progress.
    pub async fn destroy(&self, room_id: RoomId) -> Result<()> {
        let entry = self
            .registry
            .lock()
            .await
            .remove(room_id)
            .ok_or(RuntimeError::RoomNotFound(room_id))?;
        Self::teardown(room_id, entry).await
    }

    /// Stops every room.
    pub async fn shutdown(&self) {
        let entries: Vec<(RoomId, RoomEntry)> = {
            let mut registry = self.registry.lock().await;
            registry.players.clear();
            registry.rooms.drain().collect()
        };
        for (room_id, entry) in entries {
            if let Err(err) = Self::teardown(room_id, entry).await {
                warn!(target: "runtime::manager", room = %room_id, error = %err, "room teardown failed");
            }
        }
    }

    /// Rooms open to join or in play, by id.
    pub async fn list(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = {
            let registry = self.registry.lock().await;
            registry.rooms.values().map(|e| e.handle.clone()).collect()
        };

        let mut rooms = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.summary().await {
                Ok(summary) if summary.status != RoomStatus::Ended => rooms.push(summary),
                Ok(_) => {}
                Err(_) => self.evict(handle.room_id()).await,
            }
        }
        rooms.sort_by_key(|summary| summary.room_id);
        rooms
    }

    pub async fn room_of(&self, identity: &Identity) -> Option<RoomId> {
        self.registry.lock().await.players.get(identity).copied()
    }

    pub async fn handle(&self, room_id: RoomId) -> Option<RoomHandle> {
        self.registry.lock().await.handle(room_id).ok()
    }

    pub async fn snapshot(&self, room_id: RoomId) -> Result<RoomSnapshot> {
        let handle = self.registry.lock().await.handle(room_id)?;
        self.forward(handle, |h| async move { h.snapshot().await })
            .await
    }

    /// Runs `action` in the room of `identity`.
    pub async fn act(&self, identity: &Identity, action: PlayerAction) -> Result<()> {
        let handle = self.handle_of(identity).await?;
        let identity = identity.clone();
        self.forward(handle, |h| async move { h.act(identity, action).await })
            .await
    }

    /// Republishes the room and match state of `identity`, for a
    /// subscriber that fell behind the event bus.
    pub async fn resync(&self, identity: &Identity) -> Result<()> {
        let handle = self.handle_of(identity).await?;
        let identity = identity.clone();
        self.forward(handle, |h| async move { h.resync(identity).await })
            .await
    }

    pub async fn ready(&self, identity: &Identity) -> Result<()> {
        self.act(identity, PlayerAction::Ready).await
    }

    pub async fn vote(&self, identity: &Identity, item: VoteItem, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.act(identity, PlayerAction::Vote { item, value }).await
    }

    pub async fn join_team(&self, identity: &Identity, team: Option<TeamId>) -> Result<()> {
        self.act(identity, PlayerAction::JoinTeam(team)).await
    }

    pub async fn queue_move(&self, identity: &Identity, order: MoveOrder) -> Result<()> {
        self.act(identity, PlayerAction::Move(order)).await
    }

    pub async fn clear_movements(&self, identity: &Identity) -> Result<()> {
        self.act(identity, PlayerAction::ClearMovements).await
    }

    pub async fn undo_movement(&self, identity: &Identity) -> Result<()> {
        self.act(identity, PlayerAction::UndoMovement).await
    }

    pub async fn surrender(&self, identity: &Identity) -> Result<()> {
        self.act(identity, PlayerAction::Surrender).await
    }

    /// Sends a chat message. World messages bypass rooms entirely.
    pub async fn message(&self, identity: &Identity, scope: ChatScope, content: String) -> Result<()> {
        if scope != ChatScope::World {
            return self
                .act(identity, PlayerAction::Message { scope, content })
                .await;
        }

        validate_message(&content)?;
        self.event_bus.publish(Envelope::everyone(ServerEvent::Message {
            scope,
            sender: identity.clone(),
            content,
        }));
        Ok(())
    }

    /// Executes a decoded wire command on behalf of `identity`, returning
    /// the direct reply if the command has one.
    pub async fn dispatch(
        &self,
        identity: &Identity,
        command: ClientCommand,
    ) -> Result<Option<ServerEvent>> {
        match command {
            ClientCommand::Identify { .. } => Err(RuntimeError::InvalidCommand(
                "connection is already identified".to_owned(),
            )),
            ClientCommand::CreateRoom { mode } => {
                let room_id = self.create_and_join(identity, mode).await?;
                Ok(Some(ServerEvent::Joined { room_id }))
            }
            ClientCommand::ListRooms => Ok(Some(ServerEvent::RoomList {
                rooms: self.list().await,
            })),
            ClientCommand::JoinRoom { room_id } => {
                self.join(identity, room_id).await?;
                Ok(Some(ServerEvent::Joined { room_id }))
            }
            ClientCommand::LeaveRoom => {
                self.leave(identity).await?;
                Ok(None)
            }
            ClientCommand::Message { scope, content } => {
                self.message(identity, scope, content).await?;
                Ok(None)
            }
            command => {
                let action = command.into_action().ok_or_else(|| {
                    RuntimeError::InvalidCommand("command has no room action".to_owned())
                })?;
                self.act(identity, action).await?;
                Ok(None)
            }
        }
    }

    fn new_room(&self, room_id: RoomId, mode: GridMode) -> Room {
        Room::new(
            room_id,
            mode,
            self.config.game_config.clone(),
            self.config.maps.clone(),
            self.config.seed_for(room_id.0),
        )
    }

    fn spawn(&self, registry: &mut Registry, room: Room) {
        let room_id = room.id();
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);
        let worker = RoomWorker::new(room, command_rx, self.event_bus.clone());
        let task = tokio::spawn(worker.run());
        registry.rooms.insert(
            room_id,
            RoomEntry {
                handle: RoomHandle::new(room_id, command_tx),
                task,
            },
        );
    }

    /// Destroys a room its last member left, unless someone joined since.
    async fn destroy_if_empty(&self, room_id: RoomId) -> Result<()> {
        let entry = {
            let mut registry = self.registry.lock().await;
            if registry.players.values().any(|id| *id == room_id) {
                return Ok(());
            }
            registry.remove(room_id)
        };
        match entry {
            Some(entry) => Self::teardown(room_id, entry).await,
            None => Ok(()),
        }
    }

    /// Stops a room already removed from the registry.
    async fn teardown(room_id: RoomId, entry: RoomEntry) -> Result<()> {
        // The worker may already be gone; joining still reaps it.
        let _ = entry.handle.shutdown().await;
        entry.task.await.map_err(RuntimeError::WorkerJoin)?;
        info!(target: "runtime::manager", room = %room_id, "room destroyed");
        Ok(())
    }

    /// Calls into a room, evicting it if its worker has stopped.
    async fn forward<T, F, Fut>(&self, handle: RoomHandle, call: F) -> Result<T>
    where
        F: FnOnce(RoomHandle) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let room_id = handle.room_id();
        let result = call(handle).await;
        if let Err(RuntimeError::RoomNotFound(_)) = &result {
            self.evict(room_id).await;
        }
        result
    }

    async fn handle_of(&self, identity: &Identity) -> Result<RoomHandle> {
        let registry = self.registry.lock().await;
        let room_id = registry
            .players
            .get(identity)
            .copied()
            .ok_or(RuntimeError::NotInRoom)?;
        registry.handle(room_id)
    }

    async fn evict(&self, room_id: RoomId) {
        let mut registry = self.registry.lock().await;
        if registry
            .rooms
            .get(&room_id)
            .is_some_and(|entry| entry.handle.is_closed())
        {
            registry.remove(room_id);
            warn!(target: "runtime::manager", room = %room_id, "evicted stopped room");
        }
    }
}
