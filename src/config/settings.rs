use std::env;
use std::path::PathBuf;

use crate::rating::{DEFAULT_RATING, RatingValue, Tier};

pub const CACHE_DIR_ENV: &str = "SCORITO_CACHE_DIR";

pub struct EngineSettings {
    pub default_trials: usize,
    /// Below this many trials a report is flagged as noisy.
    pub min_stable_trials: u64,
    pub default_rating: RatingValue,
    pub default_tier: Tier,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_trials: 1000,
            min_stable_trials: 100,
            default_rating: DEFAULT_RATING,
            default_tier: Tier::D,
        }
    }
}

pub struct ScoritoSettings {
    /// Opponents met less often than this are left out of path metrics.
    pub opponent_meet_threshold: f64,
    pub value_score_divisor: f64,
}

impl Default for ScoritoSettings {
    fn default() -> Self {
        Self {
            opponent_meet_threshold: 0.10,
            value_score_divisor: 100.0,
        }
    }
}

pub struct CacheSettings {
    pub dir: PathBuf,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache"),
        }
    }
}

impl CacheSettings {
    pub fn from_env() -> Self {
        match env::var(CACHE_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self {
                dir: PathBuf::from(dir),
            },
            _ => Self::default(),
        }
    }
}

pub struct AppConfig {
    pub engine: EngineSettings,
    pub scorito: ScoritoSettings,
    pub cache: CacheSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            engine: EngineSettings::default(),
            scorito: ScoritoSettings::default(),
            cache: CacheSettings::from_env(),
        }
    }
}
