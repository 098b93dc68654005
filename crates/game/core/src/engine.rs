//! Tick resolution.
//!
//! The [`GameEngine`] is the authoritative reducer for [`GameState`]. Player
//! commands (queueing, undo, surrender) and the periodic [`GameEngine::tick`]
//! all go through it; the runtime never writes to the board directly.
mod errors;
mod fog;
mod outcome;

use std::collections::BTreeSet;

pub use errors::EngineError;
pub use outcome::{
    AppliedMove, CellPatch, Clash, DiscardedOrder, Elimination, OrderRejection, TickOutcome,
    ViewDelta,
};

use crate::land::{LandCell, LandType, PlayerColor};
use crate::map::MapError;
use crate::movement::{MoveOrder, MovementQueue};
use crate::state::{Contestant, GameResult, GameState, TeamId};
use crate::topology::Pos;

/// Side of the board for termination purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Side {
    Team(TeamId),
    Solo(PlayerColor),
}

impl Side {
    fn of(contestant: &Contestant) -> Self {
        contestant
            .team
            .map_or(Side::Solo(contestant.color), Side::Team)
    }
}

/// An order that passed validation, addressed by row-major cell index.
struct Validated {
    from: usize,
    to: usize,
    moved: u32,
}

pub struct GameEngine<'a> {
    state: &'a mut GameState,
}

impl<'a> GameEngine<'a> {
    pub fn new(state: &'a mut GameState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &GameState {
        self.state
    }

    /// Queues `order` for `color`, returning the new queue length.
    pub fn enqueue(&mut self, color: PlayerColor, order: MoveOrder) -> Result<usize, EngineError> {
        self.ensure_playing(color)?;
        for pos in [order.from, order.to] {
            if !self.state.map.check(pos) {
                return Err(MapError::OutOfBounds { pos }.into());
            }
        }

        let topology = self.state.map.topology();
        let queue = self.queue_mut(color)?;
        queue.push(order, topology)?;
        Ok(queue.len())
    }

    /// Drops the most recently queued order of `color`.
    pub fn undo(&mut self, color: PlayerColor) -> Result<Option<MoveOrder>, EngineError> {
        self.ensure_playing(color)?;
        Ok(self.queue_mut(color)?.undo())
    }

    pub fn clear(&mut self, color: PlayerColor) -> Result<(), EngineError> {
        self.queue_mut(color)?.clear();
        Ok(())
    }

    /// Takes `color` out of the match. Its land stays on the board and stops
    /// growing.
    pub fn surrender(&mut self, color: PlayerColor) -> Result<(), EngineError> {
        self.ensure_playing(color)?;
        self.queue_mut(color)?.clear();
        if let Some(contestant) = self.state.contestant_mut(color) {
            contestant.alive = false;
        }
        Ok(())
    }

    /// Ends the match without a winner. Has no effect on a finished match.
    pub fn abort(&mut self) -> GameResult {
        self.state
            .result
            .get_or_insert_with(|| GameResult {
                winners: Vec::new(),
                aborted: true,
            })
            .clone()
    }

    /// What `color` may currently see. Defeated players see everything.
    pub fn view_for(&self, color: PlayerColor) -> Vec<LandCell> {
        match self.state.contestant(color) {
            Some(contestant) if !contestant.alive => self.state.map.cells().to_vec(),
            _ => self.state.map.fogged_for(color),
        }
    }

    /// Returns the full current view of `color` and records it as sent, so
    /// the next tick only reports cells that change afterwards.
    pub fn sync_view(&mut self, color: PlayerColor) -> Result<Vec<LandCell>, EngineError> {
        if self.state.contestant(color).is_none() {
            return Err(EngineError::UnknownPlayer(color));
        }
        let view = self.view_for(color);
        self.state.views.insert(color, view.clone());
        Ok(view)
    }

    /// Advances the match by one tick.
    ///
    /// Invalid orders are dropped and reported; they never abort the tick.
    /// Ticking a finished match does nothing.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state.is_over() {
            return TickOutcome::new(self.state.tick);
        }

        self.state.tick += 1;
        let mut outcome = TickOutcome::new(self.state.tick);

        for (color, order) in self.take_orders() {
            match self.validate(color, &order) {
                Ok(valid) => {
                    let clash = self.apply(color, &valid, &mut outcome);
                    outcome.applied.push(AppliedMove {
                        color,
                        order,
                        moved: valid.moved,
                        clash,
                    });
                }
                Err(reason) => outcome.discarded.push(DiscardedOrder {
                    color,
                    order,
                    reason,
                }),
            }
        }

        self.grow();
        self.refresh_views(&mut outcome);
        outcome.result = self.check_termination();
        outcome
    }

    fn ensure_playing(&self, color: PlayerColor) -> Result<(), EngineError> {
        if self.state.is_over() {
            return Err(EngineError::GameOver);
        }
        match self.state.contestant(color) {
            None => Err(EngineError::UnknownPlayer(color)),
            Some(contestant) if !contestant.alive => Err(EngineError::PlayerDefeated(color)),
            Some(_) => Ok(()),
        }
    }

    fn queue_mut(&mut self, color: PlayerColor) -> Result<&mut MovementQueue, EngineError> {
        self.state
            .queues
            .get_mut(&color)
            .ok_or(EngineError::UnknownPlayer(color))
    }

    /// Pops one head order per living contestant, ascending color.
    fn take_orders(&mut self) -> Vec<(PlayerColor, MoveOrder)> {
        let queues = &mut self.state.queues;
        self.state
            .contestants
            .iter()
            .filter(|c| c.alive)
            .filter_map(|c| {
                let order = queues.get_mut(&c.color)?.pop_front()?;
                Some((c.color, order))
            })
            .collect()
    }

    fn validate(&self, color: PlayerColor, order: &MoveOrder) -> Result<Validated, OrderRejection> {
        if !self.state.contestant(color).is_some_and(|c| c.alive) {
            return Err(OrderRejection::Eliminated);
        }

        let map = &self.state.map;
        let (Some(from), Some(to)) = (map.index_of(order.from), map.index_of(order.to)) else {
            return Err(OrderRejection::OutOfBounds);
        };
        let source = &map.cells()[from];
        if source.color != color {
            return Err(OrderRejection::NotOwned);
        }
        if !map.cells()[to].is_accessible() {
            return Err(OrderRejection::Inaccessible);
        }
        let moved = order
            .moving_amount(source.amount)
            .ok_or(OrderRejection::InsufficientArmy)?;

        Ok(Validated { from, to, moved })
    }

    fn apply(&mut self, color: PlayerColor, valid: &Validated, outcome: &mut TickOutcome) -> Clash {
        let defender = self.state.map.cells()[valid.to].color;
        let friendly = defender == color || self.state.allied(color, defender);

        let cells = self.state.map.cells_mut();
        cells[valid.from].amount -= valid.moved;
        let target = &mut cells[valid.to];

        if friendly {
            target.amount = target.amount.saturating_add(valid.moved);
            return Clash::Reinforced;
        }
        if valid.moved <= target.amount {
            target.amount -= valid.moved;
            return Clash::Repelled;
        }

        let was_general = target.kind == LandType::General;
        target.amount = valid.moved - target.amount;
        target.color = color;
        if was_general {
            target.kind = LandType::City;
            let at = self.state.map.pos_of(valid.to);
            self.eliminate(defender, color, at, outcome);
        }
        Clash::Captured { previous: defender }
    }

    /// Hands every cell of `victim` to `by` and removes `victim` from play.
    fn eliminate(
        &mut self,
        victim: PlayerColor,
        by: PlayerColor,
        at: Pos,
        outcome: &mut TickOutcome,
    ) {
        for cell in self.state.map.cells_mut() {
            if cell.color == victim {
                cell.color = by;
            }
        }
        if let Some(contestant) = self.state.contestant_mut(victim) {
            contestant.alive = false;
        }
        if let Some(queue) = self.state.queues.get_mut(&victim) {
            queue.clear();
        }
        outcome.eliminations.push(Elimination {
            color: victim,
            by,
            at,
        });
    }

    fn grow(&mut self) {
        let tick = self.state.tick;
        let mut growing = [false; 256];
        for contestant in self.state.alive() {
            growing[usize::from(contestant.color)] = true;
        }

        let config = &self.state.config;
        for cell in self.state.map.cells_mut() {
            if cell.is_owned() && growing[usize::from(cell.color)] {
                let bonus = config.growth_for(cell.kind, tick);
                cell.amount = cell.amount.saturating_add(bonus);
            }
        }
    }

    fn refresh_views(&mut self, outcome: &mut TickOutcome) {
        let colors: Vec<PlayerColor> = self.state.contestants.iter().map(|c| c.color).collect();
        for color in colors {
            let view = self.view_for(color);
            let patches: Vec<CellPatch> = match self.state.views.get(&color) {
                Some(last) => view
                    .iter()
                    .zip(last)
                    .enumerate()
                    .filter(|(_, (now, before))| now != before)
                    .map(|(idx, (now, _))| CellPatch {
                        pos: self.state.map.pos_of(idx),
                        cell: *now,
                    })
                    .collect(),
                None => view
                    .iter()
                    .enumerate()
                    .map(|(idx, cell)| CellPatch {
                        pos: self.state.map.pos_of(idx),
                        cell: *cell,
                    })
                    .collect(),
            };
            self.state.views.insert(color, view);
            if !patches.is_empty() {
                outcome.views.push(ViewDelta { color, patches });
            }
        }
    }

    /// Ends the match once at most one side still holds a general.
    fn check_termination(&mut self) -> Option<GameResult> {
        let map = &self.state.map;
        let standing: BTreeSet<Side> = self
            .state
            .alive()
            .filter(|c| map.general_of(c.color).is_some())
            .map(Side::of)
            .collect();
        if standing.len() > 1 {
            return None;
        }

        let winners = match standing.first() {
            Some(side) => self
                .state
                .alive()
                .filter(|c| Side::of(c) == *side)
                .map(|c| c.color)
                .collect(),
            None => Vec::new(),
        };
        let result = GameResult {
            winners,
            aborted: false,
        };
        self.state.result = Some(result.clone());
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::map::Map;
    use crate::topology::{GridMode, Pos};

    /// No growth at all, so army totals only change through combat.
    fn static_config() -> GameConfig {
        GameConfig {
            general_growth_interval: 0,
            city_growth_interval: 0,
            land_growth_interval: 0,
            round_interval: 0,
            ..GameConfig::default()
        }
    }

    fn row(cells: &[LandCell]) -> Map {
        let mut map = Map::new(cells.len() as u32, 1, GridMode::Square).unwrap();
        for (idx, cell) in cells.iter().enumerate() {
            map.set(Pos::new(1, idx as i32 + 1), *cell).unwrap();
        }
        map
    }

    fn owned(color: PlayerColor, amount: u32) -> LandCell {
        LandCell::new(LandType::Land, color, amount)
    }

    fn duel(map: Map, config: GameConfig) -> GameState {
        let contestants = vec![Contestant::new(1, None), Contestant::new(2, None)];
        GameState::new(map, contestants, config).unwrap()
    }

    fn cell(state: &GameState, col: i32) -> LandCell {
        *state.map.get(Pos::new(1, col)).unwrap()
    }

    fn step(from: i32, to: i32) -> MoveOrder {
        MoveOrder::new(Pos::new(1, from), Pos::new(1, to))
    }

    #[test]
    fn capturing_a_general_eliminates_its_owner() {
        let map = row(&[
            LandCell::general(1, 1),
            owned(1, 6),
            LandCell::general(2, 3),
            owned(2, 1),
            owned(2, 1),
        ]);
        let mut state = duel(map, GameConfig::default());
        let mut engine = GameEngine::new(&mut state);

        // Five armies leave (1, 2) and hit a general holding three.
        engine.enqueue(1, step(2, 3)).unwrap();
        engine.enqueue(2, MoveOrder::split(Pos::new(1, 4), Pos::new(1, 5))).unwrap();
        engine.enqueue(2, step(5, 4)).unwrap();
        let outcome = engine.tick();

        assert_eq!(outcome.tick, 1);
        assert_eq!(
            outcome.eliminations,
            vec![Elimination {
                color: 2,
                by: 1,
                at: Pos::new(1, 3)
            }]
        );
        assert_eq!(
            outcome.discarded,
            vec![DiscardedOrder {
                color: 2,
                order: MoveOrder::split(Pos::new(1, 4), Pos::new(1, 5)),
                reason: OrderRejection::Eliminated,
            }]
        );
        assert_eq!(
            outcome.result,
            Some(GameResult {
                winners: vec![1],
                aborted: false
            })
        );

        assert_eq!(cell(&state, 3), LandCell::new(LandType::City, 1, 2));
        assert_eq!(cell(&state, 4), owned(1, 1));
        assert_eq!(cell(&state, 5), owned(1, 1));
        assert!(state.queue(2).unwrap().is_empty());
        assert!(!state.contestant(2).unwrap().alive);
    }

    #[test]
    fn earlier_move_can_invalidate_a_later_one() {
        let map = row(&[
            LandCell::general(1, 1),
            owned(1, 10),
            owned(2, 2),
            owned(2, 4),
            LandCell::general(2, 1),
        ]);
        let mut state = duel(map, static_config());
        let mut engine = GameEngine::new(&mut state);

        engine.enqueue(1, step(2, 3)).unwrap();
        engine.enqueue(2, step(3, 4)).unwrap();
        let outcome = engine.tick();

        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.applied[0].clash, Clash::Captured { previous: 2 });
        assert_eq!(outcome.discarded[0].reason, OrderRejection::NotOwned);
        assert_eq!(cell(&state, 3), owned(1, 7));
        assert_eq!(cell(&state, 4), owned(2, 4));
    }

    #[test]
    fn weak_or_blocked_orders_are_discarded() {
        let map = row(&[
            LandCell::general(1, 1),
            owned(1, 5),
            LandCell::mountain(),
            LandCell::general(2, 1),
        ]);
        let mut state = duel(map, static_config());
        let mut engine = GameEngine::new(&mut state);

        engine.enqueue(1, step(1, 2)).unwrap();
        engine.enqueue(1, step(2, 3)).unwrap();
        let first = engine.tick();
        let second = engine.tick();

        assert_eq!(first.discarded[0].reason, OrderRejection::InsufficientArmy);
        assert_eq!(second.discarded[0].reason, OrderRejection::Inaccessible);
        assert_eq!(cell(&state, 2), owned(1, 5));
    }

    #[test]
    fn split_moves_half_and_merges_with_own_land() {
        let map = row(&[
            LandCell::general(1, 1),
            owned(1, 9),
            owned(1, 2),
            LandCell::general(2, 1),
        ]);
        let mut state = duel(map, static_config());
        let mut engine = GameEngine::new(&mut state);

        engine
            .enqueue(1, MoveOrder::split(Pos::new(1, 2), Pos::new(1, 3)))
            .unwrap();
        let outcome = engine.tick();

        assert_eq!(outcome.applied[0].moved, 4);
        assert_eq!(outcome.applied[0].clash, Clash::Reinforced);
        assert_eq!(cell(&state, 2), owned(1, 5));
        assert_eq!(cell(&state, 3), owned(1, 6));
    }

    #[test]
    fn combat_loses_exactly_the_smaller_army_twice() {
        let map = row(&[
            LandCell::general(1, 1),
            owned(1, 8),
            LandCell::city(40),
            owned(1, 4),
            LandCell::city(2),
            LandCell::general(2, 1),
        ]);
        let mut state = duel(map, static_config());
        let before = state.map.total_army();
        let mut engine = GameEngine::new(&mut state);

        engine.enqueue(1, step(2, 3)).unwrap();
        engine.tick();
        engine.enqueue(1, step(4, 5)).unwrap();
        let outcome = engine.tick();

        assert_eq!(outcome.applied[0].clash, Clash::Captured { previous: 0 });
        // 7 vs 40 repelled, then 3 vs 2 captured.
        assert_eq!(state.map.total_army(), before - 2 * 7 - 2 * 2);
        assert_eq!(cell(&state, 3), LandCell::city(33));
        assert_eq!(cell(&state, 5), LandCell::new(LandType::City, 1, 1));
    }

    #[test]
    fn defender_may_be_left_with_nothing() {
        let map = row(&[
            LandCell::general(1, 1),
            owned(1, 4),
            owned(2, 3),
            LandCell::general(2, 1),
        ]);
        let mut state = duel(map, static_config());
        let mut engine = GameEngine::new(&mut state);

        engine.enqueue(1, step(2, 3)).unwrap();
        let outcome = engine.tick();

        assert_eq!(outcome.applied[0].clash, Clash::Repelled);
        assert_eq!(cell(&state, 3), owned(2, 0));
    }

    #[test]
    fn teammates_reinforce_without_changing_owner() {
        let map = row(&[
            LandCell::general(1, 1),
            owned(1, 5),
            LandCell::general(2, 2),
            LandCell::general(3, 1),
        ]);
        let contestants = vec![
            Contestant::new(1, Some(1)),
            Contestant::new(2, Some(1)),
            Contestant::new(3, None),
        ];
        let mut state = GameState::new(map, contestants, static_config()).unwrap();
        let mut engine = GameEngine::new(&mut state);

        engine.enqueue(1, step(2, 3)).unwrap();
        let outcome = engine.tick();

        assert_eq!(outcome.applied[0].clash, Clash::Reinforced);
        assert_eq!(cell(&state, 3), LandCell::general(2, 6));
        assert!(outcome.result.is_none());
    }

    #[test]
    fn last_team_standing_wins_together() {
        let map = row(&[
            LandCell::general(1, 1),
            owned(1, 9),
            LandCell::general(3, 1),
            LandCell::general(2, 1),
        ]);
        let contestants = vec![
            Contestant::new(1, Some(4)),
            Contestant::new(2, Some(4)),
            Contestant::new(3, None),
        ];
        let mut state = GameState::new(map, contestants, static_config()).unwrap();
        let mut engine = GameEngine::new(&mut state);

        engine.enqueue(1, step(2, 3)).unwrap();
        let outcome = engine.tick();

        let result = outcome.result.unwrap();
        assert_eq!(result.winners, vec![1, 2]);
        assert!(state.is_over());
    }

    #[test]
    fn growth_follows_tick_cadence() {
        let map = row(&[
            LandCell::general(1, 1),
            LandCell::new(LandType::City, 1, 0),
            owned(1, 1),
            LandCell::general(2, 1),
        ]);
        let mut state = duel(map, GameConfig::default());
        let mut engine = GameEngine::new(&mut state);

        for _ in 0..4 {
            engine.tick();
        }
        assert_eq!(cell(&state, 1).amount, 3);
        assert_eq!(cell(&state, 2).amount, 1);
        assert_eq!(cell(&state, 3).amount, 1);
        assert_eq!(state.tick(), 4);
    }

    #[test]
    fn surrendered_land_stops_growing_and_opponent_wins() {
        let map = row(&[LandCell::general(1, 1), LandCell::general(2, 1)]);
        let mut state = duel(map, GameConfig::default());
        let mut engine = GameEngine::new(&mut state);

        engine.surrender(2).unwrap();
        assert_eq!(
            engine.enqueue(2, step(2, 1)),
            Err(EngineError::PlayerDefeated(2))
        );
        let outcome = engine.tick();
        assert_eq!(outcome.result.unwrap().winners, vec![1]);

        assert_eq!(engine.tick(), TickOutcome::new(1));
        assert_eq!(engine.enqueue(1, step(1, 2)), Err(EngineError::GameOver));
        assert_eq!(cell(&state, 2), LandCell::general(2, 1));
    }

    #[test]
    fn enqueue_rejects_bad_orders() {
        let map = row(&[LandCell::general(1, 1), LandCell::general(2, 1)]);
        let mut state = duel(map, GameConfig::default());
        let mut engine = GameEngine::new(&mut state);

        assert_eq!(
            engine.enqueue(1, step(2, 3)),
            Err(EngineError::Map(MapError::OutOfBounds {
                pos: Pos::new(1, 3)
            }))
        );
        assert!(matches!(
            engine.enqueue(1, MoveOrder::new(Pos::new(1, 1), Pos::new(1, 1))),
            Err(EngineError::Order(_))
        ));
        assert_eq!(engine.enqueue(9, step(1, 2)), Err(EngineError::UnknownPlayer(9)));

        assert_eq!(engine.enqueue(1, step(1, 2)), Ok(1));
        assert_eq!(engine.undo(1), Ok(Some(step(1, 2))));
        assert_eq!(engine.undo(1), Ok(None));
    }

    #[test]
    fn views_are_sent_as_deltas() {
        let mut map = Map::new(6, 1, GridMode::Square).unwrap();
        map.set(Pos::new(1, 1), LandCell::general(1, 2)).unwrap();
        map.set(Pos::new(1, 6), LandCell::general(2, 2)).unwrap();
        let mut state = duel(map, GameConfig::default());
        let mut engine = GameEngine::new(&mut state);

        let initial = engine.sync_view(1).unwrap();
        assert_eq!(initial[0], LandCell::general(1, 2));
        assert_eq!(initial[5], LandCell::land());

        let first = engine.tick();
        // Color 1 was synced already; color 2 receives its whole board.
        assert!(first.view_of(1).is_none());
        assert_eq!(first.view_of(2).unwrap().patches.len(), 6);

        let second = engine.tick();
        let patches = &second.view_of(1).unwrap().patches;
        assert_eq!(
            patches,
            &vec![CellPatch {
                pos: Pos::new(1, 1),
                cell: LandCell::general(1, 3)
            }]
        );
    }

    #[test]
    fn defeated_players_see_the_whole_board() {
        let map = row(&[
            LandCell::general(1, 1),
            LandCell::land(),
            LandCell::land(),
            LandCell::general(2, 4),
            LandCell::general(3, 1),
        ]);
        let contestants = vec![
            Contestant::new(1, None),
            Contestant::new(2, None),
            Contestant::new(3, None),
        ];
        let mut state = GameState::new(map, contestants, static_config()).unwrap();
        let mut engine = GameEngine::new(&mut state);

        assert_eq!(engine.view_for(1)[3], LandCell::land());
        engine.surrender(1).unwrap();
        assert_eq!(engine.view_for(1)[3], LandCell::general(2, 4));
    }

    #[test]
    fn abort_ends_without_winners() {
        let map = row(&[LandCell::general(1, 1), LandCell::general(2, 1)]);
        let mut state = duel(map, GameConfig::default());
        let mut engine = GameEngine::new(&mut state);

        let result = engine.abort();
        assert!(result.aborted && result.winners.is_empty());
        assert_eq!(engine.tick().result, None);
        assert!(state.is_over());
    }
}
