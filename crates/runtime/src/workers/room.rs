//! Room worker that owns one [`Room`] exclusively.
//!
//! Commands from [`crate::RoomHandle`] and ticks from the room's interval are
//! polled in one `select!` loop, so every command lands strictly between two
//! ticks. Whatever the room queues while handling either is published on the
//! [`EventBus`] before the next iteration.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::api::{ErrorKind, Result};
use crate::events::{Envelope, EventBus, RoomSnapshot, RoomSummary, ServerEvent};
use crate::room::{PlayerAction, Room};
use crate::types::{Identity, RoomStatus};

/// Commands that can be sent to a room worker
pub enum Command {
    Join {
        identity: Identity,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Replies with the number of members still connected.
    Leave {
        identity: Identity,
        reply: oneshot::Sender<Result<usize>>,
    },
    Act {
        identity: Identity,
        action: PlayerAction,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Republishes what a member needs after missing events.
    Resync {
        identity: Identity,
        reply: oneshot::Sender<Result<()>>,
    },
    Summary {
        reply: oneshot::Sender<RoomSummary>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    /// Stops the worker; a running match is aborted.
    Shutdown,
}

/// Background task that drives one room.
pub struct RoomWorker {
    room: Room,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    ticker: Option<Interval>,
}

impl RoomWorker {
    pub fn new(room: Room, command_rx: mpsc::Receiver<Command>, event_bus: EventBus) -> Self {
        Self {
            room,
            command_rx,
            event_bus,
            ticker: None,
        }
    }

    /// Main worker loop. Returns once shut down or every handle is dropped.
    pub async fn run(mut self) {
        let room_id = self.room.id();
        debug!(target: "runtime::room", room = %room_id, "worker started");
        // A room may be created with its first member already seated.
        self.flush();

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                scheduled = next_tick(&mut self.ticker) => self.on_tick(scheduled),
            }

            self.flush();
            self.sync_ticker();
        }

        if self.room.force_end().is_some() {
            info!(target: "runtime::room", room = %room_id, "match aborted on shutdown");
        }
        self.flush();
        self.event_bus
            .publish(Envelope::everyone(ServerEvent::RoomClosed { room_id }));
        debug!(target: "runtime::room", room = %room_id, "worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Join { identity, reply } => {
                let result = self.room.join(&identity);
                let _ = reply.send(result);
            }
            Command::Leave { identity, reply } => {
                let result = self.room.leave(&identity);
                let _ = reply.send(result);
            }
            Command::Act {
                identity,
                action,
                reply,
            } => {
                let name = action.name();
                let result = self.room.apply(&identity, action);
                match &result {
                    Err(err) if err.kind() == ErrorKind::Internal => error!(
                        target: "runtime::room",
                        room = %self.room.id(),
                        player = %identity,
                        action = name,
                        code = ?err.code(),
                        error = %err,
                        "command failed"
                    ),
                    Err(err) => debug!(
                        target: "runtime::room",
                        room = %self.room.id(),
                        player = %identity,
                        action = name,
                        code = ?err.code(),
                        error = %err,
                        "command rejected"
                    ),
                    Ok(()) => {}
                }
                let _ = reply.send(result);
            }
            Command::Resync { identity, reply } => {
                debug!(target: "runtime::room", room = %self.room.id(), player = %identity, "resync requested");
                let result = self.room.resync(&identity);
                let _ = reply.send(result);
            }
            Command::Summary { reply } => {
                let _ = reply.send(self.room.summary());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.room.snapshot());
            }
            Command::Shutdown => {}
        }
    }

    fn on_tick(&mut self, scheduled: Instant) {
        let period = self.room.period();
        let limit = period * self.room.config().max_lag_ticks;
        let lag = Instant::now().saturating_duration_since(scheduled);

        if lag > limit {
            warn!(
                target: "runtime::room",
                room = %self.room.id(),
                lag_ms = lag.as_millis() as u64,
                limit_ms = limit.as_millis() as u64,
                "room fell behind schedule, ending match"
            );
            self.room.force_end();
            return;
        }

        let Some(outcome) = self.room.tick() else {
            return;
        };
        for discarded in &outcome.discarded {
            debug!(
                target: "runtime::room",
                room = %self.room.id(),
                tick = outcome.tick,
                color = discarded.color,
                from = %discarded.order.from,
                to = %discarded.order.to,
                reason = %discarded.reason,
                "order discarded"
            );
        }
        for elimination in &outcome.eliminations {
            info!(
                target: "runtime::room",
                room = %self.room.id(),
                tick = outcome.tick,
                color = elimination.color,
                by = elimination.by,
                "player eliminated"
            );
        }
        if let Some(result) = &outcome.result {
            info!(
                target: "runtime::room",
                room = %self.room.id(),
                tick = outcome.tick,
                winners = ?result.winners,
                "match ended"
            );
        }
    }

    fn flush(&mut self) {
        for envelope in self.room.drain_events() {
            self.event_bus.publish(envelope);
        }
    }

    /// Runs the interval only while a match is in progress.
    fn sync_ticker(&mut self) {
        match (self.room.status(), &self.ticker) {
            (RoomStatus::Playing, None) => {
                self.ticker = Some(start_interval(self.room.period()));
            }
            (RoomStatus::Playing, Some(_)) => {}
            (_, Some(_)) => self.ticker = None,
            (_, None) => {}
        }
    }
}

fn start_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
    interval
}

/// Next scheduled tick, or never when the room is not playing.
async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(interval) => interval.tick().await,
        None => std::future::pending().await,
    }
}
