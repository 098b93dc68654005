//! Room state machine.
//!
//! A [`Room`] is plain synchronous state: membership, readiness, teams,
//! votes and, once playing, the match itself. It never blocks and never
//! spawns; the room worker drives it and publishes whatever it queues in its
//! outbox. Keeping it synchronous lets the whole lifecycle be tested without
//! a runtime.
mod chat;
mod votes;

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{debug, warn};

use game_content::MapCatalog;
use game_core::{
    Contestant, GameConfig, GameEngine, GameResult, GameState, GridMode, MapRequest, MoveOrder,
    PlayerColor, Pos, TickOutcome,
};

pub use chat::{ChatScope, validate_message};
pub use votes::{VoteBox, VoteItem};

use crate::api::{Result, RuntimeError};
use crate::events::{
    Envelope, MemberInfo, RoomSettings, RoomSnapshot, RoomSummary, RosterEntry, ServerEvent,
};
use crate::types::{Identity, RoomId, RoomStatus, TeamId};

/// Fastest selectable tick speed multiplier.
pub const MAX_SPEED: u32 = 4;

/// A command a member issues inside their room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    Ready,
    JoinTeam(Option<TeamId>),
    Vote { item: VoteItem, value: String },
    Move(MoveOrder),
    ClearMovements,
    UndoMovement,
    Surrender,
    Message { scope: ChatScope, content: String },
}

impl PlayerAction {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerAction::Ready => "ready",
            PlayerAction::JoinTeam(_) => "join a team",
            PlayerAction::Vote { .. } => "vote",
            PlayerAction::Move(_) => "move",
            PlayerAction::ClearMovements => "clear movements",
            PlayerAction::UndoMovement => "undo a movement",
            PlayerAction::Surrender => "surrender",
            PlayerAction::Message { .. } => "send a message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub identity: Identity,
    /// Assigned when the match starts, in join order.
    pub color: Option<PlayerColor>,
    pub team: Option<TeamId>,
    pub ready: bool,
    pub connected: bool,
}

impl Member {
    fn new(identity: Identity) -> Self {
        Self {
            identity,
            color: None,
            team: None,
            ready: false,
            connected: true,
        }
    }
}

/// Side of a member before the match: their team, or themselves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Side<'a> {
    Team(TeamId),
    Solo(&'a Identity),
}

pub struct Room {
    id: RoomId,
    mode: GridMode,
    config: GameConfig,
    maps: MapCatalog,
    seed: u64,
    status: RoomStatus,
    /// In join order.
    members: Vec<Member>,
    votes: VoteBox,
    game: Option<GameState>,
    outbox: Vec<Envelope>,
}

impl Room {
    pub fn new(id: RoomId, mode: GridMode, config: GameConfig, maps: MapCatalog, seed: u64) -> Self {
        Self {
            id,
            mode,
            config,
            maps,
            seed,
            status: RoomStatus::Waiting,
            members: Vec::new(),
            votes: VoteBox::new(),
            game: None,
            outbox: Vec::new(),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, identity: &Identity) -> Option<&Member> {
        self.members.iter().find(|m| m.identity == *identity)
    }

    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Members still connected.
    pub fn connected(&self) -> usize {
        self.members.iter().filter(|m| m.connected).count()
    }

    /// Effective settings: vote winners, or the room defaults.
    pub fn settings(&self) -> RoomSettings {
        let mode = self
            .votes
            .winner(VoteItem::Mode)
            .and_then(|value| value.parse().ok())
            .unwrap_or(self.mode);
        let map = self
            .votes
            .winner(VoteItem::Map)
            .unwrap_or_else(|| MapCatalog::RANDOM.to_owned());
        let speed = self
            .votes
            .winner(VoteItem::Speed)
            .and_then(|value| value.parse().ok())
            .unwrap_or(1);

        RoomSettings { mode, map, speed }
    }

    /// Tick period at the effective speed.
    pub fn period(&self) -> Duration {
        let speed = self.settings().speed.clamp(1, MAX_SPEED);
        Duration::from_millis(self.config.tick_interval_ms) / speed
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.id,
            mode: self.settings().mode,
            members: self.connected(),
            capacity: self.config.max_players,
            status: self.status,
        }
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        let members = self
            .members
            .iter()
            .map(|m| MemberInfo {
                identity: m.identity.clone(),
                color: m.color,
                team: m.team,
                ready: m.ready,
                connected: m.connected,
                alive: self.is_alive(m),
            })
            .collect();

        RoomSnapshot {
            room_id: self.id,
            status: self.status,
            members,
            votes: self.votes.tallies(),
            settings: self.settings(),
        }
    }

    /// Takes the events queued since the last call.
    pub fn drain_events(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.outbox)
    }

    pub fn join(&mut self, identity: &Identity) -> Result<()> {
        if self.status != RoomStatus::Waiting {
            return Err(RuntimeError::AlreadyPlaying(self.id));
        }
        if self.member(identity).is_some() {
            return Ok(());
        }
        if self.members.len() >= self.config.max_players {
            return Err(RuntimeError::RoomFull {
                room_id: self.id,
                capacity: self.config.max_players,
            });
        }

        self.members.push(Member::new(identity.clone()));
        self.announce();
        Ok(())
    }

    /// Removes `identity`, returning how many members remain connected.
    ///
    /// During a match the member stays on the roster, disconnected and
    /// surrendered, so their land remains on the board.
    pub fn leave(&mut self, identity: &Identity) -> Result<usize> {
        let idx = self.member_index(identity)?;

        match self.status {
            RoomStatus::Waiting => {
                self.members.remove(idx);
                self.votes.retract(identity);
                self.announce();
                if let Err(err) = self.maybe_start() {
                    warn!(target: "runtime::room", room = %self.id, error = %err, "start after leave failed");
                }
            }
            RoomStatus::Playing => {
                let member = &mut self.members[idx];
                member.connected = false;
                member.ready = false;
                if let Some(color) = member.color {
                    self.defeat(color, None);
                }
                self.announce();
            }
            RoomStatus::Ended => {
                self.members.remove(idx);
                self.announce();
            }
        }

        Ok(self.connected())
    }

    /// Applies a member command.
    pub fn apply(&mut self, identity: &Identity, action: PlayerAction) -> Result<()> {
        let idx = self.member_index(identity)?;
        let name = action.name();

        match action {
            PlayerAction::Ready => {
                self.require(RoomStatus::Waiting, name)?;
                let member = &mut self.members[idx];
                member.ready = !member.ready;
                self.announce();
                self.maybe_start()
            }
            PlayerAction::JoinTeam(team) => {
                self.require(RoomStatus::Waiting, name)?;
                self.members[idx].team = team;
                self.announce();
                Ok(())
            }
            PlayerAction::Vote { item, value } => {
                self.require(RoomStatus::Waiting, name)?;
                let value = self.check_vote(item, &value)?;
                self.votes.cast(identity, item, value);
                self.announce();
                Ok(())
            }
            PlayerAction::Move(order) => {
                let color = self.playing_color(idx, name)?;
                self.engine(name)?.enqueue(color, order)?;
                self.send_movements(idx, None);
                Ok(())
            }
            PlayerAction::ClearMovements => {
                let color = self.playing_color(idx, name)?;
                self.engine(name)?.clear(color)?;
                self.send_movements(idx, None);
                Ok(())
            }
            PlayerAction::UndoMovement => {
                let color = self.playing_color(idx, name)?;
                let undone = self.engine(name)?.undo(color)?;
                self.send_movements(idx, undone.map(|order| order.from));
                Ok(())
            }
            PlayerAction::Surrender => {
                let color = self.playing_color(idx, name)?;
                self.engine(name)?.surrender(color)?;
                self.push_defeat(color, None);
                self.announce();
                Ok(())
            }
            PlayerAction::Message { scope, content } => self.chat(idx, scope, content),
        }
    }

    /// Advances the match by one tick. Returns `None` unless playing.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if self.status != RoomStatus::Playing {
            return None;
        }
        let outcome = GameEngine::new(self.game.as_mut()?).tick();
        self.publish_outcome(&outcome);
        Some(outcome)
    }

    /// Queues what `identity` needs to rebuild its state after missing
    /// events: the roster, plus the full view of a running match or the
    /// final board of an ended one.
    ///
    /// The view becomes the new baseline for that player's deltas.
    pub fn resync(&mut self, identity: &Identity) -> Result<()> {
        let idx = self.member_index(identity)?;
        let snapshot = ServerEvent::RoomSnapshot(self.snapshot());
        self.outbox.push(Envelope::to_one(identity, snapshot));

        let Some(color) = self.members[idx].color else {
            return Ok(());
        };
        match self.status {
            RoomStatus::Playing => {
                let roster = self.roster();
                let Some(game) = self.game.as_mut() else {
                    return Ok(());
                };
                let (width, height, mode, tick) =
                    (game.map.width(), game.map.height(), game.map.mode(), game.tick());
                let cells = GameEngine::new(game).sync_view(color)?;
                let event = ServerEvent::GameSync {
                    room_id: self.id,
                    color,
                    tick,
                    width,
                    height,
                    mode,
                    roster,
                    cells,
                };
                self.outbox.push(Envelope::to_one(identity, event));
                self.send_movements(idx, None);
            }
            RoomStatus::Ended => {
                if let Some(result) = self.game.as_ref().and_then(|g| g.result()).cloned() {
                    let event = self.ended_event(&result);
                    self.outbox.push(Envelope::to_one(identity, event));
                }
            }
            RoomStatus::Waiting => {}
        }
        Ok(())
    }

    /// Stops a running match without a winner.
    pub fn force_end(&mut self) -> Option<GameResult> {
        if self.status != RoomStatus::Playing {
            return None;
        }
        let result = GameEngine::new(self.game.as_mut()?).abort();
        self.finish(&result);
        Some(result)
    }

    fn member_index(&self, identity: &Identity) -> Result<usize> {
        self.members
            .iter()
            .position(|m| m.identity == *identity)
            .ok_or(RuntimeError::NotInRoom)
    }

    fn identity_of(&self, color: PlayerColor) -> Option<&Identity> {
        self.members
            .iter()
            .find(|m| m.color == Some(color))
            .map(|m| &m.identity)
    }

    fn is_alive(&self, member: &Member) -> bool {
        match (&self.game, member.color) {
            (Some(game), Some(color)) => game.contestant(color).is_some_and(|c| c.alive),
            _ => true,
        }
    }

    /// Connected members, the default audience of room events.
    fn audience(&self) -> Vec<Identity> {
        self.members
            .iter()
            .filter(|m| m.connected)
            .map(|m| m.identity.clone())
            .collect()
    }

    fn require(&self, status: RoomStatus, action: &'static str) -> Result<()> {
        if self.status == status {
            Ok(())
        } else {
            Err(RuntimeError::InvalidState {
                action,
                status: self.status,
            })
        }
    }

    fn playing_color(&self, idx: usize, action: &'static str) -> Result<PlayerColor> {
        self.require(RoomStatus::Playing, action)?;
        self.members[idx].color.ok_or(RuntimeError::NotPlaying)
    }

    fn engine(&mut self, action: &'static str) -> Result<GameEngine<'_>> {
        let status = self.status;
        self.game
            .as_mut()
            .map(GameEngine::new)
            .ok_or(RuntimeError::InvalidState { action, status })
    }

    fn check_vote(&self, item: VoteItem, value: &str) -> Result<String> {
        let value = value.trim();
        let normalized = match item {
            VoteItem::Mode => value.parse::<GridMode>().ok().map(|mode| mode.to_string()),
            VoteItem::Map => self.maps.contains(value).then(|| value.to_owned()),
            VoteItem::Speed => value
                .parse::<u32>()
                .ok()
                .filter(|speed| (1..=MAX_SPEED).contains(speed))
                .map(|speed| speed.to_string()),
        };
        normalized.ok_or_else(|| RuntimeError::InvalidVote {
            item,
            value: value.to_owned(),
        })
    }

    /// Queues the roster for members and the summary for the lobby.
    fn announce(&mut self) {
        let snapshot = ServerEvent::RoomSnapshot(self.snapshot());
        let summary = ServerEvent::RoomUpdated(self.summary());
        self.outbox.push(Envelope::to(self.audience(), snapshot));
        self.outbox.push(Envelope::everyone(summary));
    }

    fn send_movements(&mut self, idx: usize, selected: Option<Pos>) {
        let member = &self.members[idx];
        let orders = member
            .color
            .and_then(|color| self.game.as_ref()?.queue(color))
            .map(|queue| queue.to_vec())
            .unwrap_or_default();
        let envelope = Envelope::to_one(
            &member.identity,
            ServerEvent::Movements { orders, selected },
        );
        self.outbox.push(envelope);
    }

    /// Members seated in the current or last match.
    fn roster(&self) -> Vec<RosterEntry> {
        self.members
            .iter()
            .filter_map(|m| {
                Some(RosterEntry {
                    identity: m.identity.clone(),
                    color: m.color?,
                    team: m.team,
                })
            })
            .collect()
    }

    fn sides(&self) -> usize {
        self.members
            .iter()
            .map(|m| m.team.map_or(Side::Solo(&m.identity), Side::Team))
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Starts the match once every member is ready, enough members are
    /// present, and they form at least two sides.
    fn maybe_start(&mut self) -> Result<()> {
        let all_ready = self.members.iter().all(|m| m.ready);
        if self.status != RoomStatus::Waiting
            || !all_ready
            || self.members.len() < self.config.min_players.max(1)
            || self.sides() < 2
        {
            return Ok(());
        }
        self.start()
    }

    fn start(&mut self) -> Result<()> {
        let settings = self.settings();
        let generator = self
            .maps
            .get(&settings.map)
            .ok_or_else(|| RuntimeError::UnknownMap(settings.map.clone()))?;

        let players = u8::try_from(self.members.len())
            .map_err(|_| RuntimeError::SeatOverflow(self.members.len()))?;
        let request = MapRequest::new(settings.mode, players, self.seed);
        let map = generator
            .generate(&request)
            .map_err(RuntimeError::MapGeneration)?;
        let (width, height, mode) = (map.width(), map.height(), map.mode());

        let roster = self
            .members
            .iter()
            .enumerate()
            .map(|(seat, m)| {
                let color = PlayerColor::try_from(seat + 1)
                    .map_err(|_| RuntimeError::SeatOverflow(self.members.len()))?;
                Ok(RosterEntry {
                    identity: m.identity.clone(),
                    color,
                    team: m.team,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let contestants = roster
            .iter()
            .map(|entry| Contestant::new(entry.color, entry.team))
            .collect();
        let mut state = GameState::new(map, contestants, self.config.clone())?;

        let mut started = Vec::with_capacity(roster.len());
        {
            let mut engine = GameEngine::new(&mut state);
            for entry in &roster {
                let cells = engine.sync_view(entry.color)?;
                started.push(Envelope::to_one(
                    &entry.identity,
                    ServerEvent::GameStarted {
                        room_id: self.id,
                        color: entry.color,
                        width,
                        height,
                        mode,
                        roster: roster.clone(),
                        cells,
                    },
                ));
            }
        }

        for (member, entry) in self.members.iter_mut().zip(&roster) {
            member.color = Some(entry.color);
        }
        self.game = Some(state);
        self.status = RoomStatus::Playing;
        self.outbox.extend(started);
        self.announce();

        debug!(
            target: "runtime::room",
            room = %self.id,
            players,
            mode = %mode,
            map = %settings.map,
            "match started"
        );
        Ok(())
    }

    /// Surrenders `color` if it is still in the match.
    fn defeat(&mut self, color: PlayerColor, by: Option<PlayerColor>) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        if GameEngine::new(game).surrender(color).is_ok() {
            self.push_defeat(color, by);
        }
    }

    fn push_defeat(&mut self, color: PlayerColor, by: Option<PlayerColor>) {
        let Some(identity) = self.identity_of(color).cloned() else {
            return;
        };
        let by = by.and_then(|c| self.identity_of(c).cloned());
        let envelope = Envelope::to(
            self.audience(),
            ServerEvent::PlayerDefeated {
                identity,
                color,
                by,
            },
        );
        self.outbox.push(envelope);
    }

    fn publish_outcome(&mut self, outcome: &TickOutcome) {
        for delta in &outcome.views {
            let Some(member) = self
                .members
                .iter()
                .find(|m| m.color == Some(delta.color) && m.connected)
            else {
                continue;
            };
            let envelope = Envelope::to_one(
                &member.identity,
                ServerEvent::MapDelta {
                    tick: outcome.tick,
                    patches: delta.patches.clone(),
                },
            );
            self.outbox.push(envelope);
        }

        // Every consumed order shortens its owner's queue.
        let touched: BTreeSet<PlayerColor> = outcome
            .applied
            .iter()
            .map(|m| m.color)
            .chain(outcome.discarded.iter().map(|d| d.color))
            .chain(outcome.eliminations.iter().map(|e| e.color))
            .collect();
        for color in touched {
            if let Some(idx) = self.members.iter().position(|m| m.color == Some(color)) {
                self.send_movements(idx, None);
            }
        }

        for elimination in &outcome.eliminations {
            self.push_defeat(elimination.color, Some(elimination.by));
        }

        if let Some(result) = &outcome.result {
            self.finish(result);
        }
    }

    fn finish(&mut self, result: &GameResult) {
        self.status = RoomStatus::Ended;
        let envelope = Envelope::to(self.audience(), self.ended_event(result));
        self.outbox.push(envelope);
        self.announce();
    }

    fn ended_event(&self, result: &GameResult) -> ServerEvent {
        let winners = result
            .winners
            .iter()
            .filter_map(|color| self.identity_of(*color).cloned())
            .collect();
        let cells = self
            .game
            .as_ref()
            .map(|game| game.map.cells().to_vec())
            .unwrap_or_default();

        ServerEvent::GameEnded {
            winners,
            aborted: result.aborted,
            cells,
        }
    }

    fn chat(&mut self, idx: usize, scope: ChatScope, content: String) -> Result<()> {
        validate_message(&content)?;
        let sender = &self.members[idx];

        let recipients: Vec<Identity> = match scope {
            ChatScope::Room => self.audience(),
            ChatScope::Team => {
                let team = sender.team.ok_or(RuntimeError::NoTeam)?;
                self.members
                    .iter()
                    .filter(|m| m.connected && m.team == Some(team))
                    .map(|m| m.identity.clone())
                    .collect()
            }
            ChatScope::World => {
                return Err(RuntimeError::InvalidCommand(
                    "world messages are not routed through rooms".to_owned(),
                ));
            }
        };

        let envelope = Envelope::to(
            recipients,
            ServerEvent::Message {
                scope,
                sender: sender.identity.clone(),
                content,
            },
        );
        self.outbox.push(envelope);
        Ok(())
    }
}
