pub mod accumulator;
pub mod most_likely;
pub mod stats;

pub use accumulator::{Meeting, TrialAccumulator};
pub use most_likely::{AnnotatedDraw, AnnotatedNode, AnnotatedSlot, Entrant, PathStep, most_likely_path};
pub use stats::{AggregateReport, AggregateStats, Eliminator, OpponentStats, aggregate, finish, run_trials};
