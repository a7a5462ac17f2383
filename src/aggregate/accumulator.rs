use std::collections::HashMap;

use ndarray::Array2;

use crate::simulation::{Exit, SimulationOutcome};

/// Meetings between a player and one opponent in one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Meeting {
    pub met: u64,
    pub won: u64,
}

/// Per-player counters over a batch of trials.
///
/// Batches are combined with [`TrialAccumulator::merge`]; every counter is a
/// plain sum, so merge order never changes the totals.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialAccumulator {
    pub(crate) trials: u64,
    /// `[player, round]`: trials in which the player entered the round.
    /// The extra last column counts titles.
    pub(crate) reach: Array2<u64>,
    /// `[player, round]`: trials whose furthest round was this one.
    pub(crate) furthest: Array2<u64>,
    /// `[player, round]`: trials in which the player lost in this round.
    pub(crate) eliminated: Array2<u64>,
    pub(crate) unresolved: Vec<u64>,
    /// Per player: `(round, opponent)` -> losses to that opponent.
    pub(crate) eliminators: Vec<HashMap<(usize, usize), u64>>,
    /// Per player: `(round, opponent)` -> meetings.
    pub(crate) meetings: Vec<HashMap<(usize, usize), Meeting>>,
}

impl TrialAccumulator {
    pub fn new(players: usize, rounds: usize) -> Self {
        Self {
            trials: 0,
            reach: Array2::zeros((players, rounds + 1)),
            furthest: Array2::zeros((players, rounds + 1)),
            eliminated: Array2::zeros((players, rounds)),
            unresolved: vec![0; players],
            eliminators: vec![HashMap::new(); players],
            meetings: vec![HashMap::new(); players],
        }
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn players(&self) -> usize {
        self.unresolved.len()
    }

    /// Number of played rounds (excluding the virtual title column).
    pub fn rounds(&self) -> usize {
        self.eliminated.ncols()
    }

    pub fn reach_count(&self, player: usize, round: usize) -> u64 {
        self.reach[[player, round]]
    }

    pub fn record(&mut self, outcome: &SimulationOutcome) {
        self.trials += 1;

        for (player, &furthest) in outcome.furthest.iter().enumerate() {
            for round in 0..=furthest {
                self.reach[[player, round]] += 1;
            }
            self.furthest[[player, furthest]] += 1;

            match outcome.exits[player] {
                Exit::Eliminated { round, by } => {
                    self.eliminated[[player, round]] += 1;
                    *self.eliminators[player].entry((round, by)).or_insert(0) += 1;
                }
                Exit::Unresolved => self.unresolved[player] += 1,
                Exit::Champion => {}
            }
        }

        for node in &outcome.nodes {
            if let Some((winner, loser)) = node.played() {
                self.note_meeting(winner, loser, node.round, true);
                self.note_meeting(loser, winner, node.round, false);
            }
        }
    }

    fn note_meeting(&mut self, player: usize, opponent: usize, round: usize, won: bool) {
        let entry = self.meetings[player].entry((round, opponent)).or_default();
        entry.met += 1;
        if won {
            entry.won += 1;
        }
    }

    /// Sums two batches over the same draw.
    pub fn merge(mut self, other: Self) -> Self {
        self.trials += other.trials;
        self.reach += &other.reach;
        self.furthest += &other.furthest;
        self.eliminated += &other.eliminated;

        for (mine, theirs) in self.unresolved.iter_mut().zip(&other.unresolved) {
            *mine += theirs;
        }
        for (mine, theirs) in self.eliminators.iter_mut().zip(other.eliminators) {
            for (key, count) in theirs {
                *mine.entry(key).or_insert(0) += count;
            }
        }
        for (mine, theirs) in self.meetings.iter_mut().zip(other.meetings) {
            for (key, meeting) in theirs {
                let entry = mine.entry(key).or_default();
                entry.met += meeting.met;
                entry.won += meeting.won;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{Slot, build_bracket};
    use crate::config::settings::EngineSettings;
    use crate::rating::{MatchModel, PlayerRating, Tier};
    use crate::simulation::{Field, simulate_once};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn setup() -> (crate::bracket::DrawTree, Field) {
        let tree = build_bracket(&(1..=8).map(Slot::Player).collect::<Vec<_>>()).unwrap();
        let players: Vec<PlayerRating> = (1..=8)
            .map(|id| PlayerRating::new(id, format!("P{id}"), Tier::C).with_overall(1400.0 + 40.0 * id as f64))
            .collect();
        let field = Field::new(&tree, &players, &MatchModel::default(), &EngineSettings::default());
        (tree, field)
    }

    fn batch(tree: &crate::bracket::DrawTree, field: &Field, seeds: std::ops::Range<u64>) -> TrialAccumulator {
        let mut acc = TrialAccumulator::new(field.len(), tree.rounds());
        for seed in seeds {
            let mut rng = SmallRng::seed_from_u64(seed);
            acc.record(&simulate_once(tree, field, &mut rng));
        }
        acc
    }

    #[test]
    fn test_merge_is_order_independent() {
        let (tree, field) = setup();
        let a = batch(&tree, &field, 0..40);
        let b = batch(&tree, &field, 40..70);
        let whole = batch(&tree, &field, 0..70);

        assert_eq!(a.clone().merge(b.clone()), whole);
        assert_eq!(b.merge(a), whole);
    }

    #[test]
    fn test_reach_counts_match_live_slots() {
        let (tree, field) = setup();
        let acc = batch(&tree, &field, 0..100);
        let slots = [8u64, 4, 2, 1];
        for (round, &live) in slots.iter().enumerate() {
            let total: u64 = (0..acc.players()).map(|p| acc.reach_count(p, round)).sum();
            assert_eq!(total, live * acc.trials());
        }
    }

    #[test]
    fn test_counters_are_consistent() {
        let (tree, field) = setup();
        let acc = batch(&tree, &field, 0..50);
        for player in 0..acc.players() {
            let furthest_total: u64 = acc.furthest.row(player).sum();
            assert_eq!(furthest_total, acc.trials());

            let eliminations: u64 = acc.eliminated.row(player).sum();
            let titles = acc.reach[[player, acc.rounds()]];
            assert_eq!(eliminations + titles + acc.unresolved[player], acc.trials());

            let by_opponent: u64 = acc.eliminators[player].values().sum();
            assert_eq!(by_opponent, eliminations);
        }
    }
}
