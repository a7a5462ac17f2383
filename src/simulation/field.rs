use std::collections::HashMap;

use log::warn;
use ndarray::Array2;

use crate::bracket::{DrawTree, Slot};
use crate::config::settings::EngineSettings;
use crate::rating::{MatchModel, PlayerId, PlayerRating, RatingValue};

/// Who currently holds a bracket position, by dense player index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occupant {
    Player(usize),
    Bye,
    /// Undecided: a TBD entry or the winner of an unresolved match.
    Open,
}

impl Occupant {
    pub fn player(&self) -> Option<usize> {
        match self {
            Occupant::Player(idx) => Some(*idx),
            _ => None,
        }
    }
}

/// The draw's entrants with ratings and pairwise probabilities precomputed,
/// so trials only ever read immutable data.
#[derive(Debug, Clone)]
pub struct Field {
    entrants: Vec<PlayerRating>,
    ratings: Vec<RatingValue>,
    probabilities: Array2<f64>,
}

impl Field {
    /// Entrants missing from `players` are simulated with a default record.
    pub fn new(
        tree: &DrawTree,
        players: &[PlayerRating],
        model: &MatchModel,
        settings: &EngineSettings,
    ) -> Self {
        let by_id: HashMap<PlayerId, &PlayerRating> = players.iter().map(|p| (p.id, p)).collect();

        let entrants: Vec<PlayerRating> = tree
            .players()
            .iter()
            .map(|&id| match by_id.get(&id) {
                Some(player) => (*player).clone(),
                None => {
                    warn!("No rating record for player {}, using defaults", id);
                    PlayerRating::new(id, format!("Player {id}"), settings.default_tier)
                        .with_overall(settings.default_rating)
                }
            })
            .collect();

        let ratings: Vec<RatingValue> = entrants.iter().map(|p| model.rating(p)).collect();
        let n = ratings.len();
        let probabilities = Array2::from_shape_fn((n, n), |(i, j)| {
            model.probability_from_ratings(ratings[i], ratings[j])
        });

        Self {
            entrants,
            ratings,
            probabilities,
        }
    }

    pub fn len(&self) -> usize {
        self.entrants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entrants.is_empty()
    }

    pub fn entrant(&self, idx: usize) -> &PlayerRating {
        &self.entrants[idx]
    }

    pub fn entrants(&self) -> &[PlayerRating] {
        &self.entrants
    }

    pub fn rating(&self, idx: usize) -> RatingValue {
        self.ratings[idx]
    }

    /// Probability that entrant `a` beats entrant `b`.
    pub fn probability(&self, a: usize, b: usize) -> f64 {
        self.probabilities[[a, b]]
    }

    pub fn seat(&self, tree: &DrawTree, slot: Slot) -> Occupant {
        match slot {
            Slot::Player(id) => tree.player_index(id).map_or(Occupant::Open, Occupant::Player),
            Slot::Bye => Occupant::Bye,
            Slot::Tbd => Occupant::Open,
        }
    }
}
