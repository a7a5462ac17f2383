use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

pub type PlayerId = i64;
pub type RatingValue = f64;

/// Coarse skill bucket used to pick a fantasy scoring row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
    D,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::A, Tier::B, Tier::C, Tier::D];

    pub fn as_str(&self) -> &str {
        match self {
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Tier::A),
            "B" => Ok(Tier::B),
            "C" => Ok(Tier::C),
            "D" => Ok(Tier::D),
            other => Err(EngineError::ScoringTable(format!("unknown tier `{other}`"))),
        }
    }
}

/// The surface-specific rating components a player may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Overall,
    Hard,
    Clay,
    Grass,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Overall,
        Component::Hard,
        Component::Clay,
        Component::Grass,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Component::Overall => "Overall Elo",
            Component::Hard => "Hard Court Elo",
            Component::Clay => "Clay Court Elo",
            Component::Grass => "Grass Court Elo",
        }
    }
}

/// Elo / hElo / cElo / gElo. Any of them may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingComponents {
    #[serde(default)]
    pub overall: Option<RatingValue>,
    #[serde(default)]
    pub hard: Option<RatingValue>,
    #[serde(default)]
    pub clay: Option<RatingValue>,
    #[serde(default)]
    pub grass: Option<RatingValue>,
}

impl RatingComponents {
    pub fn get(&self, component: Component) -> Option<RatingValue> {
        match component {
            Component::Overall => self.overall,
            Component::Hard => self.hard,
            Component::Clay => self.clay,
            Component::Grass => self.grass,
        }
        .filter(|v| v.is_finite())
    }

    pub fn is_empty(&self) -> bool {
        Component::ALL.iter().all(|&c| self.get(c).is_none())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRating {
    pub id: PlayerId,
    pub name: String,
    pub tier: Tier,
    #[serde(flatten)]
    pub components: RatingComponents,
    /// Recent-form rating delta.
    #[serde(default)]
    pub form: Option<RatingValue>,
}

impl PlayerRating {
    pub fn new(id: PlayerId, name: impl Into<String>, tier: Tier) -> Self {
        Self {
            id,
            name: name.into(),
            tier,
            components: RatingComponents::default(),
            form: None,
        }
    }

    pub fn with_overall(mut self, value: RatingValue) -> Self {
        self.components.overall = Some(value);
        self
    }

    pub fn with_surfaces(mut self, hard: RatingValue, clay: RatingValue, grass: RatingValue) -> Self {
        self.components.hard = Some(hard);
        self.components.clay = Some(clay);
        self.components.grass = Some(grass);
        self
    }

    pub fn with_form(mut self, form: RatingValue) -> Self {
        self.form = Some(form);
        self
    }
}
