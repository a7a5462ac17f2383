use thiserror::Error;

use crate::rating::PlayerId;

/// Configuration failures rejected before any simulation work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("surface weights must sum to 1.0 (±{epsilon}), got {sum}")]
    WeightSum { sum: f64, epsilon: f64 },

    #[error("`{name}` must be a finite non-negative number, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("draw needs a power-of-two number of entries (at least 2), got {0}")]
    EntryCount(usize),

    #[error("draw has {rounds} rounds, at most {max} labelled rounds are supported")]
    DrawTooDeep { rounds: usize, max: usize },

    #[error("player {0} appears more than once in the draw")]
    DuplicatePlayer(PlayerId),

    #[error("malformed draw: {0}")]
    MalformedDraw(String),

    #[error("trial count must be at least 1")]
    NoTrials,

    #[error("scoring row for tier {tier} has {len} entries, expected {expected}")]
    ScoringRowLength {
        tier: String,
        len: usize,
        expected: usize,
    },

    #[error("invalid scoring table: {0}")]
    ScoringTable(String),

    #[error("unknown {what} `{value}`")]
    InvalidChoice { what: &'static str, value: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Add context to input file errors
pub fn read_context(path: &str) -> String {
    format!("Failed to read input from: {}", path)
}

/// Add context to parse errors
pub fn parse_context(data_type: &str) -> String {
    format!("Failed to parse {}", data_type)
}

/// Add context to cache errors
pub fn cache_context(operation: &str, key: &str) -> String {
    format!("Failed to {} cache for key: {}", operation, key)
}
