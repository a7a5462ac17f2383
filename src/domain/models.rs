use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateReport, AnnotatedDraw};
use crate::bracket::{DrawTree, NodeSpec, Slot, build_bracket};
use crate::config::WeightPreset;
use crate::errors::EngineResult;
use crate::rating::{MatchFormat, MatchModel, PlayerRating};
use crate::scorito::{RankMetric, ScoringTable, ScoritoMetrics, SortDirection};

// --- Request Structures ---

/// A draw as seeded first-round entries or as an explicit node list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawInput {
    Entries(Vec<Slot>),
    Nodes(Vec<NodeSpec>),
}

impl DrawInput {
    pub fn build(&self) -> EngineResult<DrawTree> {
        match self {
            DrawInput::Entries(entries) => build_bracket(entries),
            DrawInput::Nodes(nodes) => DrawTree::from_nodes(nodes),
        }
    }
}

/// Everything needed to simulate one draw and score it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub players: Vec<PlayerRating>,
    #[serde(flatten)]
    pub draw: DrawInput,
    #[serde(default)]
    pub weights: WeightPreset,
    #[serde(default)]
    pub format: MatchFormat,
    /// Falls back to the standard Scorito table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trials: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub sort_by: RankMetric,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

impl SimulationRequest {
    pub fn model(&self) -> EngineResult<MatchModel> {
        Ok(MatchModel::new(self.weights.resolve()?, self.format))
    }

    pub fn scoring_table(&self) -> ScoringTable {
        self.scoring.clone().unwrap_or_default()
    }
}

/// Head-to-head probability request for two players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupRequest {
    pub player_a: PlayerRating,
    pub player_b: PlayerRating,
    #[serde(default)]
    pub weights: WeightPreset,
    #[serde(default)]
    pub format: MatchFormat,
}

impl MatchupRequest {
    pub fn model(&self) -> EngineResult<MatchModel> {
        Ok(MatchModel::new(self.weights.resolve()?, self.format))
    }
}

// --- Response Structures ---

/// Deterministic outcome of one simulation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub aggregate: AggregateReport,
    pub most_likely: AnnotatedDraw,
    pub sort_by: RankMetric,
    pub sort_direction: SortDirection,
    pub ranking: Vec<ScoritoMetrics>,
    /// Ranking positions followed by a drop-off in the sorted metric
    pub drop_offs: Vec<usize>,
}

/// Report plus run metadata that is not part of the deterministic result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEnvelope {
    pub generated_at: DateTime<Utc>,
    pub cache_key: Option<String>,
    pub report: RunReport,
}

/// One row of the `presets` listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
    pub weights: crate::rating::WeightConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::Tier;

    #[test]
    fn test_minimal_request_uses_defaults() {
        let json = r#"{
            "players": [{"id": 1, "name": "A", "tier": "A", "overall": 1800.0}],
            "entries": [{"player": 1}, "bye"]
        }"#;
        let request: SimulationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.weights, WeightPreset::Overall);
        assert_eq!(request.format, MatchFormat::BestOf3);
        assert_eq!(request.players[0].tier, Tier::A);
        assert_eq!(request.scoring_table(), ScoringTable::default());
        assert_eq!(request.draw.build().unwrap().rounds(), 1);
    }

    #[test]
    fn test_node_draw_request() {
        let json = r#"{
            "players": [],
            "nodes": [
                {"id": 1, "round": "SF", "slots": [{"player": 1}, {"player": 2}], "children": []},
                {"id": 2, "round": "SF", "slots": [{"player": 3}, "tbd"], "children": []},
                {"id": 3, "round": "F", "slots": [], "children": [1, 2]}
            ],
            "weights": "clay",
            "seed": 7
        }"#;
        let request: SimulationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.weights, WeightPreset::Clay);
        assert_eq!(request.seed, Some(7));
        let tree = request.draw.build().unwrap();
        assert_eq!(tree.rounds(), 2);
    }

    #[test]
    fn test_invalid_custom_weights_rejected_at_parse() {
        let json = r#"{
            "players": [],
            "entries": [{"player": 1}, {"player": 2}],
            "weights": {"custom": {"overall_weight": 1.0, "hard_weight": 1.0, "clay_weight": 0.0, "grass_weight": 0.0}}
        }"#;
        assert!(serde_json::from_str::<SimulationRequest>(json).is_err());
    }
}
