use rand::Rng;
use serde::{Deserialize, Serialize};

use super::model::{MatchModel, effective_weights, form_adjustment};
use super::types::{Component, PlayerRating, PlayerId};
use crate::simulation::sampler;

const ELO_SCALE: f64 = 400.0;

/// One term of the log10-odds sum behind a matchup probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub name: String,
    pub player_a_value: Option<f64>,
    pub player_b_value: Option<f64>,
    pub player_a_weight: f64,
    pub player_b_weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPrediction {
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub rating_a: f64,
    pub rating_b: f64,
    pub player_a_win_probability: f64,
    pub player_b_win_probability: f64,
    pub factors: Vec<Factor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedMatch {
    pub winner: PlayerId,
    pub loser: PlayerId,
    pub prediction: MatchPrediction,
}

/// Breaks a matchup down into per-component contributions.
///
/// Contributions add up to `(rating_a - rating_b) / 400`.
pub fn explain(a: &PlayerRating, b: &PlayerRating, model: &MatchModel) -> Vec<Factor> {
    let weights_a = effective_weights(a, &model.weights);
    let weights_b = effective_weights(b, &model.weights);
    let blank_a = a.components.is_empty();
    let blank_b = b.components.is_empty();

    let mut factors: Vec<Factor> = Component::ALL
        .iter()
        .enumerate()
        .map(|(idx, &component)| {
            let value_a = a.components.get(component);
            let value_b = b.components.get(component);
            let term_a = component_term(value_a, weights_a[idx].1, blank_a, component);
            let term_b = component_term(value_b, weights_b[idx].1, blank_b, component);
            Factor {
                name: component.label().to_string(),
                player_a_value: value_a,
                player_b_value: value_b,
                player_a_weight: weights_a[idx].1,
                player_b_weight: weights_b[idx].1,
                contribution: (term_a - term_b) / ELO_SCALE,
            }
        })
        .collect();

    let adj_a = form_adjustment(a, &model.weights);
    let adj_b = form_adjustment(b, &model.weights);
    factors.push(Factor {
        name: "Form Adjustment".to_string(),
        player_a_value: a.form,
        player_b_value: b.form,
        player_a_weight: 1.0,
        player_b_weight: 1.0,
        contribution: (adj_a - adj_b) / ELO_SCALE,
    });

    factors
}

// A player with no components at all sits on the default rating, which is
// booked against the overall component.
fn component_term(value: Option<f64>, weight: f64, blank: bool, component: Component) -> f64 {
    match value {
        Some(v) => weight * v,
        None if blank && component == Component::Overall => super::model::DEFAULT_RATING,
        None => 0.0,
    }
}

pub fn predict(a: &PlayerRating, b: &PlayerRating, model: &MatchModel) -> MatchPrediction {
    let rating_a = model.rating(a);
    let rating_b = model.rating(b);
    let p = model.probability_from_ratings(rating_a, rating_b);
    MatchPrediction {
        player_a: a.id,
        player_b: b.id,
        rating_a,
        rating_b,
        player_a_win_probability: p,
        player_b_win_probability: 1.0 - p,
        factors: explain(a, b, model),
    }
}

/// Plays a single match; the factor breakdown never influences the draw.
pub fn simulate_match<R: Rng + ?Sized>(
    a: &PlayerRating,
    b: &PlayerRating,
    model: &MatchModel,
    rng: &mut R,
) -> SimulatedMatch {
    let prediction = predict(a, b, model);
    let a_wins = sampler::sample(prediction.player_a_win_probability, rng);
    let (winner, loser) = if a_wins { (a.id, b.id) } else { (b.id, a.id) };
    SimulatedMatch {
        winner,
        loser,
        prediction,
    }
}
