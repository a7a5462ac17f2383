use rand::Rng;

use super::field::{Field, Occupant};
use super::sampler;
use crate::bracket::{DrawTree, Feed, NodeId};

/// How a player's run ended in one simulated tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Eliminated { round: usize, by: usize },
    Champion,
    /// Still alive when the bracket ran into an undecided slot.
    Unresolved,
}

/// Resolution of a single node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeResult {
    pub node: NodeId,
    pub round: usize,
    pub occupants: [Occupant; 2],
    /// Probability that the first occupant wins, when two players met.
    pub first_win_probability: Option<f64>,
    pub winner: Occupant,
}

impl NodeResult {
    /// `(winner, loser)` when a match was actually played.
    pub fn played(&self) -> Option<(usize, usize)> {
        let [a, b] = self.occupants;
        match (a.player(), b.player(), self.winner.player()) {
            (Some(a), Some(b), Some(w)) => Some(if w == a { (a, b) } else { (b, a) }),
            _ => None,
        }
    }
}

/// One full resolution of a draw. Indexed by node id and dense player index.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub nodes: Vec<NodeResult>,
    /// Furthest round each player entered; `rounds()` marks the champion.
    pub furthest: Vec<usize>,
    pub exits: Vec<Exit>,
}

impl SimulationOutcome {
    pub fn champion(&self) -> Option<usize> {
        self.nodes.last().and_then(|n| n.winner.player())
    }
}

/// Plays every match of the draw once with random outcomes.
pub fn simulate_once<R: Rng + ?Sized>(tree: &DrawTree, field: &Field, rng: &mut R) -> SimulationOutcome {
    resolve(tree, field, |p| sampler::sample(p, rng))
}

/// Resolves the draw by always advancing the favourite.
pub fn simulate_most_likely(tree: &DrawTree, field: &Field) -> SimulationOutcome {
    resolve(tree, field, sampler::most_likely)
}

fn resolve<F>(tree: &DrawTree, field: &Field, mut first_wins: F) -> SimulationOutcome
where
    F: FnMut(f64) -> bool,
{
    let player_count = tree.players().len();
    let mut furthest = vec![0usize; player_count];
    let mut exits = vec![Exit::Unresolved; player_count];
    let mut nodes: Vec<NodeResult> = Vec::with_capacity(tree.nodes().len());

    for node in tree.nodes() {
        let occupants = match node.feed {
            Feed::Entrants(slots) => slots.map(|slot| field.seat(tree, slot)),
            Feed::Winners([a, b]) => [nodes[a].winner, nodes[b].winner],
        };

        for idx in occupants.iter().filter_map(Occupant::player) {
            furthest[idx] = furthest[idx].max(node.round);
        }

        let (winner, first_win_probability) = match occupants {
            [Occupant::Player(a), Occupant::Player(b)] => {
                let p = field.probability(a, b);
                let (winner, loser) = if first_wins(p) { (a, b) } else { (b, a) };
                exits[loser] = Exit::Eliminated {
                    round: node.round,
                    by: winner,
                };
                (Occupant::Player(winner), Some(p))
            }
            [Occupant::Player(a), Occupant::Bye] | [Occupant::Bye, Occupant::Player(a)] => {
                (Occupant::Player(a), None)
            }
            [Occupant::Bye, Occupant::Bye] => (Occupant::Bye, None),
            _ => (Occupant::Open, None),
        };

        nodes.push(NodeResult {
            node: node.id,
            round: node.round,
            occupants,
            first_win_probability,
            winner,
        });
    }

    let outcome_champion = nodes.last().and_then(|n| n.winner.player());
    if let Some(champion) = outcome_champion {
        furthest[champion] = tree.rounds();
        exits[champion] = Exit::Champion;
    }

    SimulationOutcome {
        nodes,
        furthest,
        exits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{Slot, build_bracket};
    use crate::config::settings::EngineSettings;
    use crate::rating::{MatchModel, PlayerRating, Tier};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn field_for(tree: &DrawTree, ratings: &[(i64, f64)]) -> Field {
        let players: Vec<PlayerRating> = ratings
            .iter()
            .map(|&(id, r)| PlayerRating::new(id, format!("P{id}"), Tier::B).with_overall(r))
            .collect();
        Field::new(tree, &players, &MatchModel::default(), &EngineSettings::default())
    }

    #[test]
    fn test_bye_advances_without_a_match() {
        let tree = build_bracket(&[Slot::Player(1), Slot::Bye, Slot::Player(2), Slot::Player(3)]).unwrap();
        let field = field_for(&tree, &[(1, 1500.0), (2, 1500.0), (3, 1500.0)]);
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..50 {
            let outcome = simulate_once(&tree, &field, &mut rng);
            assert_eq!(outcome.nodes[0].winner, Occupant::Player(0));
            assert_eq!(outcome.nodes[0].first_win_probability, None);
            assert!(outcome.furthest[0] >= 1);
        }
    }

    #[test]
    fn test_loser_is_eliminated_in_node_round() {
        let tree = build_bracket(&[Slot::Player(1), Slot::Player(2)]).unwrap();
        let field = field_for(&tree, &[(1, 1600.0), (2, 1400.0)]);
        let outcome = simulate_once(&tree, &field, &mut SmallRng::seed_from_u64(11));
        let champion = outcome.champion().unwrap();
        let loser = 1 - champion;
        assert_eq!(outcome.exits[champion], Exit::Champion);
        assert_eq!(outcome.exits[loser], Exit::Eliminated { round: 0, by: champion });
        assert_eq!(outcome.furthest[champion], 1);
        assert_eq!(outcome.furthest[loser], 0);
        assert_eq!(outcome.nodes[0].played(), Some((champion, loser)));
    }

    #[test]
    fn test_tbd_leaves_run_unresolved() {
        let tree = build_bracket(&[Slot::Player(1), Slot::Player(2), Slot::Tbd, Slot::Player(3)]).unwrap();
        let field = field_for(&tree, &[(1, 1500.0), (2, 1500.0), (3, 1500.0)]);
        let outcome = simulate_once(&tree, &field, &mut SmallRng::seed_from_u64(5));

        assert_eq!(outcome.nodes[1].winner, Occupant::Open);
        assert_eq!(outcome.nodes[2].winner, Occupant::Open);
        assert_eq!(outcome.champion(), None);
        assert_eq!(outcome.exits[2], Exit::Unresolved);
        let survivor = outcome.nodes[0].winner.player().unwrap();
        assert_eq!(outcome.exits[survivor], Exit::Unresolved);
        assert_eq!(outcome.furthest[survivor], 1);
    }

    #[test]
    fn test_most_likely_advances_favourites() {
        let tree = build_bracket(&[Slot::Player(1), Slot::Player(2), Slot::Player(3), Slot::Player(4)]).unwrap();
        let field = field_for(&tree, &[(1, 1500.0), (2, 1700.0), (3, 1900.0), (4, 1600.0)]);
        let outcome = simulate_most_likely(&tree, &field);
        assert_eq!(outcome.nodes[0].winner, Occupant::Player(1));
        assert_eq!(outcome.nodes[1].winner, Occupant::Player(2));
        assert_eq!(outcome.champion(), Some(2));
        assert_eq!(simulate_most_likely(&tree, &field), outcome);
    }

    #[test]
    fn test_live_slots_match_reach_counts() {
        let entries = vec![
            Slot::Player(1),
            Slot::Bye,
            Slot::Player(2),
            Slot::Player(3),
            Slot::Bye,
            Slot::Bye,
            Slot::Player(4),
            Slot::Player(5),
        ];
        let tree = build_bracket(&entries).unwrap();
        let field = field_for(&tree, &[(1, 1500.0), (2, 1550.0), (3, 1450.0), (4, 1500.0), (5, 1600.0)]);
        let mut rng = SmallRng::seed_from_u64(99);
        // QF: 5 players, SF: 3 (one half is a bye), F: 2, W: 1
        let live = [5usize, 3, 2, 1];
        for _ in 0..200 {
            let outcome = simulate_once(&tree, &field, &mut rng);
            for (round, &expected) in live.iter().enumerate() {
                let reached = outcome.furthest.iter().filter(|&&f| f >= round).count();
                assert_eq!(reached, expected, "round {round}");
            }
        }
    }
}
