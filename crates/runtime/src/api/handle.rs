//! Cloneable façade for issuing commands to a room worker.
//!
//! [`RoomHandle`] hides channel plumbing. A handle outliving its worker
//! reports [`RuntimeError::RoomNotFound`] for every call.
use tokio::sync::{mpsc, oneshot};

use super::errors::{Result, RuntimeError};
use crate::events::{RoomSnapshot, RoomSummary};
use crate::room::PlayerAction;
use crate::types::{Identity, RoomId};
use crate::workers::Command;

/// Client-facing handle to a single room.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    room_id: RoomId,
    command_tx: mpsc::Sender<Command>,
}

impl RoomHandle {
    pub(crate) fn new(room_id: RoomId, command_tx: mpsc::Sender<Command>) -> Self {
        Self {
            room_id,
            command_tx,
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Whether the worker behind this handle has stopped.
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    pub async fn join(&self, identity: Identity) -> Result<()> {
        self.request(|reply| Command::Join { identity, reply }).await?
    }

    /// Leaves the room, returning how many members remain connected.
    pub async fn leave(&self, identity: Identity) -> Result<usize> {
        self.request(|reply| Command::Leave { identity, reply }).await?
    }

    pub async fn act(&self, identity: Identity, action: PlayerAction) -> Result<()> {
        self.request(|reply| Command::Act {
            identity,
            action,
            reply,
        })
        .await?
    }

    /// Republishes the member's full room and match state on the bus.
    pub async fn resync(&self, identity: Identity) -> Result<()> {
        self.request(|reply| Command::Resync { identity, reply }).await?
    }

    pub async fn summary(&self) -> Result<RoomSummary> {
        self.request(|reply| Command::Summary { reply }).await
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Asks the worker to stop. Commands already queued are dropped.
    pub async fn shutdown(&self) -> Result<()> {
        self.command_tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| RuntimeError::RoomNotFound(self.room_id))
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| RuntimeError::RoomNotFound(self.room_id))?;

        reply_rx
            .await
            .map_err(|_| RuntimeError::RoomNotFound(self.room_id))
    }
}
