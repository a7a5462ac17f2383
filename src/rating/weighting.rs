use serde::{Deserialize, Serialize};

use super::types::Component;
use crate::errors::{EngineError, EngineResult};

pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Unvalidated weight fields as they appear in requests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawWeights {
    pub overall_weight: f64,
    pub hard_weight: f64,
    pub clay_weight: f64,
    pub grass_weight: f64,
    #[serde(default = "default_form_scale")]
    pub form_scale: f64,
    #[serde(default = "default_form_cap")]
    pub form_cap: f64,
}

fn default_form_scale() -> f64 {
    1.0
}

fn default_form_cap() -> f64 {
    80.0
}

/// Surface weights (summing to 1) plus the form scale/cap pair.
///
/// Only constructible through validation, so every value in circulation
/// satisfies the weight-sum invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeights", into = "RawWeights")]
pub struct WeightConfig {
    overall_weight: f64,
    hard_weight: f64,
    clay_weight: f64,
    grass_weight: f64,
    form_scale: f64,
    form_cap: f64,
}

impl WeightConfig {
    pub fn new(
        overall_weight: f64,
        hard_weight: f64,
        clay_weight: f64,
        grass_weight: f64,
        form_scale: f64,
        form_cap: f64,
    ) -> EngineResult<Self> {
        Self::try_from(RawWeights {
            overall_weight,
            hard_weight,
            clay_weight,
            grass_weight,
            form_scale,
            form_cap,
        })
    }

    pub fn weight(&self, component: Component) -> f64 {
        match component {
            Component::Overall => self.overall_weight,
            Component::Hard => self.hard_weight,
            Component::Clay => self.clay_weight,
            Component::Grass => self.grass_weight,
        }
    }

    pub fn form_scale(&self) -> f64 {
        self.form_scale
    }

    pub fn form_cap(&self) -> f64 {
        self.form_cap
    }

    /// True when the preset lets recent form move the rating at all.
    pub fn uses_form(&self) -> bool {
        self.form_scale > 0.0 && self.form_cap > 0.0
    }
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            overall_weight: 0.45,
            hard_weight: 0.25,
            clay_weight: 0.20,
            grass_weight: 0.10,
            form_scale: default_form_scale(),
            form_cap: default_form_cap(),
        }
    }
}

impl TryFrom<RawWeights> for WeightConfig {
    type Error = EngineError;

    fn try_from(raw: RawWeights) -> Result<Self, Self::Error> {
        let named = [
            ("overall_weight", raw.overall_weight),
            ("hard_weight", raw.hard_weight),
            ("clay_weight", raw.clay_weight),
            ("grass_weight", raw.grass_weight),
            ("form_scale", raw.form_scale),
            ("form_cap", raw.form_cap),
        ];
        for (name, value) in named {
            check_non_negative(name, value)?;
        }

        let sum = raw.overall_weight + raw.hard_weight + raw.clay_weight + raw.grass_weight;
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(EngineError::WeightSum {
                sum,
                epsilon: WEIGHT_SUM_EPSILON,
            });
        }

        Ok(Self {
            overall_weight: raw.overall_weight,
            hard_weight: raw.hard_weight,
            clay_weight: raw.clay_weight,
            grass_weight: raw.grass_weight,
            form_scale: raw.form_scale,
            form_cap: raw.form_cap,
        })
    }
}

impl From<WeightConfig> for RawWeights {
    fn from(config: WeightConfig) -> Self {
        Self {
            overall_weight: config.overall_weight,
            hard_weight: config.hard_weight,
            clay_weight: config.clay_weight,
            grass_weight: config.grass_weight,
            form_scale: config.form_scale,
            form_cap: config.form_cap,
        }
    }
}

fn check_non_negative(name: &'static str, value: f64) -> EngineResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidParameter { name, value })
    }
}
