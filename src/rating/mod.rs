pub mod factors;
pub mod model;
pub mod types;
pub mod weighting;

pub use factors::{Factor, MatchPrediction, SimulatedMatch, explain, predict, simulate_match};
pub use model::{
    DEFAULT_RATING, MatchFormat, MatchModel, best_of_five, form_adjustment, surface_rating,
    weighted_rating, win_probability,
};
pub use types::{Component, PlayerId, PlayerRating, RatingComponents, RatingValue, Tier};
pub use weighting::{RawWeights, WeightConfig};
