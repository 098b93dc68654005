//! Pre-match voting.

use serde::{Deserialize, Serialize};

use crate::events::VoteTally;
use crate::types::Identity;

/// Setting a room votes on before the match.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum VoteItem {
    /// Grid mode (`square`, `hexagon`, `triangle`).
    Mode,
    /// Map catalog entry.
    Map,
    /// Tick speed multiplier.
    Speed,
}

#[derive(Debug, Clone)]
struct Ballot {
    voter: Identity,
    item: VoteItem,
    value: String,
    /// Monotonic cast order, used to break ties.
    cast: u64,
}

/// Ballots of one room. Each voter holds at most one ballot per item.
#[derive(Debug, Clone, Default)]
pub struct VoteBox {
    ballots: Vec<Ballot>,
    clock: u64,
}

impl VoteBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `voter`'s choice for `item`, replacing their earlier ballot.
    pub fn cast(&mut self, voter: &Identity, item: VoteItem, value: impl Into<String>) {
        self.ballots
            .retain(|b| !(b.item == item && b.voter == *voter));
        self.clock += 1;
        self.ballots.push(Ballot {
            voter: voter.clone(),
            item,
            value: value.into(),
            cast: self.clock,
        });
    }

    /// Drops every ballot of `voter`.
    pub fn retract(&mut self, voter: &Identity) {
        self.ballots.retain(|b| b.voter != *voter);
    }

    /// Vote counts for `item`, strongest first.
    pub fn tally(&self, item: VoteItem) -> Vec<VoteTally> {
        let mut counts: Vec<(String, usize, u64)> = Vec::new();
        for ballot in self.ballots.iter().filter(|b| b.item == item) {
            match counts.iter_mut().find(|(value, _, _)| *value == ballot.value) {
                Some(entry) => {
                    entry.1 += 1;
                    entry.2 = entry.2.max(ballot.cast);
                }
                None => counts.push((ballot.value.clone(), 1, ballot.cast)),
            }
        }
        counts.sort_by(|a, b| (b.1, b.2).cmp(&(a.1, a.2)));

        counts
            .into_iter()
            .map(|(value, count, _)| VoteTally { item, value, count })
            .collect()
    }

    /// Plurality winner for `item`. Ties go to the value cast most recently.
    pub fn winner(&self, item: VoteItem) -> Option<String> {
        self.tally(item).into_iter().next().map(|t| t.value)
    }

    /// Tallies of every item.
    pub fn tallies(&self) -> Vec<VoteTally> {
        use strum::IntoEnumIterator;

        VoteItem::iter().flat_map(|item| self.tally(item)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voters() -> [Identity; 3] {
        ["a", "b", "c"].map(Identity::from)
    }

    #[test]
    fn plurality_wins() {
        let [a, b, c] = voters();
        let mut votes = VoteBox::new();
        votes.cast(&a, VoteItem::Mode, "square");
        votes.cast(&b, VoteItem::Mode, "square");
        votes.cast(&c, VoteItem::Mode, "hexagon");

        assert_eq!(votes.winner(VoteItem::Mode).as_deref(), Some("square"));
        assert_eq!(votes.tally(VoteItem::Mode)[0].count, 2);
    }

    #[test]
    fn ties_go_to_latest_cast() {
        let [a, b, c] = voters();
        let mut votes = VoteBox::new();
        votes.cast(&a, VoteItem::Mode, "square");
        votes.cast(&b, VoteItem::Mode, "hexagon");
        assert_eq!(votes.winner(VoteItem::Mode).as_deref(), Some("hexagon"));

        votes.cast(&c, VoteItem::Mode, "triangle");
        assert_eq!(votes.winner(VoteItem::Mode).as_deref(), Some("triangle"));

        // Re-casting refreshes the value's recency.
        votes.cast(&a, VoteItem::Mode, "square");
        assert_eq!(votes.winner(VoteItem::Mode).as_deref(), Some("square"));
    }

    #[test]
    fn changing_a_vote_replaces_it() {
        let [a, b, _] = voters();
        let mut votes = VoteBox::new();
        votes.cast(&a, VoteItem::Speed, "2");
        votes.cast(&b, VoteItem::Speed, "2");
        votes.cast(&a, VoteItem::Speed, "3");

        let tally = votes.tally(VoteItem::Speed);
        assert_eq!(tally.len(), 2);
        assert_eq!(tally.iter().map(|t| t.count).sum::<usize>(), 2);
    }

    #[test]
    fn no_votes_means_no_winner() {
        let [a, ..] = voters();
        let mut votes = VoteBox::new();
        assert_eq!(votes.winner(VoteItem::Map), None);

        votes.cast(&a, VoteItem::Map, "open");
        votes.retract(&a);
        assert_eq!(votes.winner(VoteItem::Map), None);
        assert!(votes.tallies().is_empty());
    }
}
