pub mod dropoff;
pub mod optimizer;
pub mod scoring;

pub use dropoff::{SortDirection, drop_off_boundaries, interquartile_range};
pub use optimizer::{RankMetric, ScoritoMetrics, expected_points, optimize_scorito, rank_by};
pub use scoring::ScoringTable;
