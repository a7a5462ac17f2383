use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::rating::WeightConfig;

/// Named weightings offered to callers, plus a free-form custom one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightPreset {
    #[default]
    Overall,
    Hard,
    Clay,
    Grass,
    EloOnly,
    Custom(WeightConfig),
}

impl WeightPreset {
    pub const NAMED: [WeightPreset; 5] = [
        WeightPreset::Overall,
        WeightPreset::Hard,
        WeightPreset::Clay,
        WeightPreset::Grass,
        WeightPreset::EloOnly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WeightPreset::Overall => "overall",
            WeightPreset::Hard => "hard",
            WeightPreset::Clay => "clay",
            WeightPreset::Grass => "grass",
            WeightPreset::EloOnly => "elo-only",
            WeightPreset::Custom(_) => "custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            WeightPreset::Overall => "Balanced blend of overall and surface Elo",
            WeightPreset::Hard => "Hard court emphasis",
            WeightPreset::Clay => "Clay court emphasis",
            WeightPreset::Grass => "Grass court emphasis",
            WeightPreset::EloOnly => "Overall Elo only, form ignored",
            WeightPreset::Custom(_) => "Caller-supplied weights",
        }
    }

    pub fn resolve(&self) -> EngineResult<WeightConfig> {
        match self {
            WeightPreset::Overall => WeightConfig::new(0.45, 0.25, 0.20, 0.10, 1.0, 80.0),
            WeightPreset::Hard => WeightConfig::new(0.25, 0.50, 0.15, 0.10, 1.0, 80.0),
            WeightPreset::Clay => WeightConfig::new(0.25, 0.15, 0.50, 0.10, 1.0, 80.0),
            WeightPreset::Grass => WeightConfig::new(0.25, 0.15, 0.10, 0.50, 1.0, 80.0),
            WeightPreset::EloOnly => WeightConfig::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            WeightPreset::Custom(weights) => Ok(*weights),
        }
    }
}

impl fmt::Display for WeightPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeightPreset {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::NAMED
            .into_iter()
            .find(|preset| preset.name() == name)
            .ok_or_else(|| EngineError::InvalidChoice {
                what: "weight preset",
                value: s.to_string(),
            })
    }
}
