use serde::{Deserialize, Serialize};

use super::types::{Component, PlayerRating, RatingValue};
use super::weighting::WeightConfig;

/// Rating assumed for a player with no known component at all.
pub const DEFAULT_RATING: RatingValue = 1500.0;

const ELO_SCALE: f64 = 400.0;
const BISECTION_STEPS: usize = 60;

/// Number of sets needed to decide a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFormat {
    #[default]
    BestOf3,
    BestOf5,
}

/// Weights actually applied to each component for this player, after the
/// weight of missing components has been spread over the present ones.
pub fn effective_weights(player: &PlayerRating, weights: &WeightConfig) -> [(Component, f64); 4] {
    let present: Vec<Component> = Component::ALL
        .iter()
        .copied()
        .filter(|&c| player.components.get(c).is_some())
        .collect();
    let present_weight: f64 = present.iter().map(|&c| weights.weight(c)).sum();

    Component::ALL.map(|c| {
        let weight = if !present.contains(&c) {
            0.0
        } else if present_weight > 0.0 {
            weights.weight(c) / present_weight
        } else {
            1.0 / present.len() as f64
        };
        (c, weight)
    })
}

/// Convex combination of the player's known surface components.
pub fn surface_rating(player: &PlayerRating, weights: &WeightConfig) -> RatingValue {
    if player.components.is_empty() {
        return DEFAULT_RATING;
    }
    effective_weights(player, weights)
        .iter()
        .filter_map(|&(c, w)| player.components.get(c).map(|v| w * v))
        .sum()
}

/// `clamp(form * form_scale, -form_cap, form_cap)`, zero when unknown.
pub fn form_adjustment(player: &PlayerRating, weights: &WeightConfig) -> RatingValue {
    let form = player.form.filter(|f| f.is_finite()).unwrap_or(0.0);
    if !weights.uses_form() {
        return 0.0;
    }
    let cap = weights.form_cap();
    (form * weights.form_scale()).clamp(-cap, cap)
}

/// Surface blend plus the capped form adjustment.
pub fn weighted_rating(player: &PlayerRating, weights: &WeightConfig) -> RatingValue {
    surface_rating(player, weights) + form_adjustment(player, weights)
}

/// Logistic Elo expectation that `rating_a` beats `rating_b`.
///
/// The favourite's side is computed directly and the underdog's as its
/// complement, so swapping the arguments always sums to one.
pub fn win_probability(rating_a: RatingValue, rating_b: RatingValue) -> f64 {
    if rating_a >= rating_b {
        logistic(rating_a - rating_b)
    } else {
        1.0 - logistic(rating_b - rating_a)
    }
}

fn logistic(diff: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(-diff / ELO_SCALE))
}

/// Converts a best-of-three match probability into a best-of-five one.
pub fn best_of_five(p3: f64) -> f64 {
    if p3 >= 0.5 {
        best_of_five_favourite(p3)
    } else {
        1.0 - best_of_five_favourite(1.0 - p3)
    }
}

fn best_of_five_favourite(p3: f64) -> f64 {
    let s = set_probability(p3);
    let q = 1.0 - s;
    (s.powi(3) * (4.0 - 3.0 * s + 6.0 * q * q)).clamp(0.0, 1.0)
}

/// Solves `3s² - 2s³ = p3` on [0, 1]; the left side is monotone there.
fn set_probability(p3: f64) -> f64 {
    let target = p3.clamp(0.0, 1.0);
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if best_of_three(mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

fn best_of_three(s: f64) -> f64 {
    s * s * (3.0 - 2.0 * s)
}

/// Weights plus match format: everything needed to price a matchup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchModel {
    pub weights: WeightConfig,
    #[serde(default)]
    pub format: MatchFormat,
}

impl MatchModel {
    pub fn new(weights: WeightConfig, format: MatchFormat) -> Self {
        Self { weights, format }
    }

    pub fn rating(&self, player: &PlayerRating) -> RatingValue {
        weighted_rating(player, &self.weights)
    }

    pub fn probability_from_ratings(&self, rating_a: RatingValue, rating_b: RatingValue) -> f64 {
        let p = win_probability(rating_a, rating_b);
        match self.format {
            MatchFormat::BestOf3 => p,
            MatchFormat::BestOf5 => best_of_five(p),
        }
    }

    /// Probability that `a` beats `b`.
    pub fn probability(&self, a: &PlayerRating, b: &PlayerRating) -> f64 {
        self.probability_from_ratings(self.rating(a), self.rating(b))
    }
}
