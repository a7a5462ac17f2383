use serde::{Deserialize, Serialize};

use crate::bracket::{DrawTree, NodeId, RoundLabel};
use crate::rating::{PlayerId, RatingValue};
use crate::simulation::{Field, Occupant, SimulationOutcome, simulate_most_likely};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entrant {
    Player {
        id: PlayerId,
        name: String,
        rating: RatingValue,
    },
    Bye,
    Tbd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedSlot {
    pub entrant: Entrant,
    /// Chance this occupant wins the match, when both sides are players.
    pub win_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedNode {
    pub id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<i64>,
    pub round: RoundLabel,
    pub index: usize,
    pub slots: [AnnotatedSlot; 2],
    pub winner: Entrant,
}

/// The bracket as it plays out if the favourite wins every match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDraw {
    pub rounds: Vec<RoundLabel>,
    pub nodes: Vec<AnnotatedNode>,
    pub champion: Option<PlayerId>,
}

/// One match on a player's most likely route to the title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    pub round: RoundLabel,
    pub opponent: PlayerId,
    pub opponent_name: String,
    pub opponent_rating: RatingValue,
    pub win_probability: f64,
}

/// Deterministic bracket, independent of any trial count.
pub fn most_likely_path(tree: &DrawTree, field: &Field) -> AnnotatedDraw {
    annotate(tree, field, &simulate_most_likely(tree, field))
}

pub(crate) fn annotate(tree: &DrawTree, field: &Field, outcome: &SimulationOutcome) -> AnnotatedDraw {
    let nodes = tree
        .nodes()
        .iter()
        .zip(&outcome.nodes)
        .map(|(node, result)| {
            let [a, b] = result.occupants;
            let p = result.first_win_probability;
            AnnotatedNode {
                id: node.id,
                external_id: node.external_id,
                round: node.label,
                index: node.index,
                slots: [
                    AnnotatedSlot {
                        entrant: entrant(field, a),
                        win_probability: p,
                    },
                    AnnotatedSlot {
                        entrant: entrant(field, b),
                        win_probability: p.map(|p| 1.0 - p),
                    },
                ],
                winner: entrant(field, result.winner),
            }
        })
        .collect();

    AnnotatedDraw {
        rounds: tree.labels().to_vec(),
        nodes,
        champion: outcome.champion().map(|idx| field.entrant(idx).id),
    }
}

fn entrant(field: &Field, occupant: Occupant) -> Entrant {
    match occupant {
        Occupant::Player(idx) => {
            let player = field.entrant(idx);
            Entrant::Player {
                id: player.id,
                name: player.name.clone(),
                rating: field.rating(idx),
            }
        }
        Occupant::Bye => Entrant::Bye,
        Occupant::Open => Entrant::Tbd,
    }
}

/// Opponents a player would face round by round if they kept winning while
/// the rest of the draw follows the favourites.
pub(crate) fn player_path(
    tree: &DrawTree,
    field: &Field,
    favourites: &SimulationOutcome,
    player: usize,
) -> Vec<PathStep> {
    let mut steps = Vec::new();
    let leaf = tree.leaf_of(player);

    let first_opponent = favourites.nodes[leaf]
        .occupants
        .iter()
        .filter_map(Occupant::player)
        .find(|&idx| idx != player);
    if let Some(opponent) = first_opponent {
        steps.push(step(field, tree.node(leaf).label, player, opponent));
    }

    let mut current = leaf;
    while let (Some(parent), Some(sibling)) = (tree.node(current).parent, tree.sibling(current)) {
        if let Some(opponent) = favourites.nodes[sibling].winner.player() {
            steps.push(step(field, tree.node(parent).label, player, opponent));
        }
        current = parent;
    }
    steps
}

fn step(field: &Field, round: RoundLabel, player: usize, opponent: usize) -> PathStep {
    let rival = field.entrant(opponent);
    PathStep {
        round,
        opponent: rival.id,
        opponent_name: rival.name.clone(),
        opponent_rating: field.rating(opponent),
        win_probability: field.probability(player, opponent),
    }
}
