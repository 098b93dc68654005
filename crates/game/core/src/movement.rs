//! Per-player order queues.
//!
//! Orders are checked for adjacency when queued; everything that can change
//! while an order waits (ownership, army size) is re-checked by the engine
//! when the order reaches the head of the queue.

use std::collections::VecDeque;

use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError};
use crate::topology::{Pos, Topology};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderError {
    #[error("{to} is not adjacent to {from}")]
    NotAdjacent { from: Pos, to: Pos },

    #[error("order queue is full ({capacity} orders)")]
    QueueFull { capacity: usize },
}

impl GameError for OrderError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            OrderError::NotAdjacent { .. } => "ORDER_NOT_ADJACENT",
            OrderError::QueueFull { .. } => "ORDER_QUEUE_FULL",
        }
    }
}

/// A queued army movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MoveOrder {
    pub from: Pos,
    pub to: Pos,
    /// Send half of the army instead of all but one.
    #[cfg_attr(feature = "serde", serde(default, alias = "split"))]
    pub split_army: bool,
}

impl MoveOrder {
    pub const fn new(from: Pos, to: Pos) -> Self {
        Self {
            from,
            to,
            split_army: false,
        }
    }

    pub const fn split(from: Pos, to: Pos) -> Self {
        Self {
            from,
            to,
            split_army: true,
        }
    }

    /// Army that leaves a source cell holding `available`, or `None` when
    /// the cell cannot spare anything. At least one army always stays behind.
    pub const fn moving_amount(&self, available: u32) -> Option<u32> {
        if available <= 1 {
            return None;
        }
        if self.split_army {
            Some(available / 2)
        } else {
            Some(available - 1)
        }
    }
}

/// FIFO queue of a single player's pending orders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovementQueue {
    orders: VecDeque<MoveOrder>,
}

impl MovementQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `order` if its target is a neighbor of its source.
    pub fn push(&mut self, order: MoveOrder, topology: &dyn Topology) -> Result<(), OrderError> {
        if !topology.is_adjacent(order.from, order.to) {
            return Err(OrderError::NotAdjacent {
                from: order.from,
                to: order.to,
            });
        }
        if self.orders.len() >= GameConfig::MAX_QUEUED_ORDERS {
            return Err(OrderError::QueueFull {
                capacity: GameConfig::MAX_QUEUED_ORDERS,
            });
        }
        self.orders.push_back(order);
        Ok(())
    }

    /// Removes the next order to execute.
    pub fn pop_front(&mut self) -> Option<MoveOrder> {
        self.orders.pop_front()
    }

    /// Removes the most recently queued order.
    pub fn undo(&mut self) -> Option<MoveOrder> {
        self.orders.pop_back()
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoveOrder> {
        self.orders.iter()
    }

    pub fn to_vec(&self) -> Vec<MoveOrder> {
        self.orders.iter().copied().collect()
    }
}
