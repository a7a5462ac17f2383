use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use super::dropoff::{SortDirection, drop_off_boundaries};
use super::scoring::ScoringTable;
use crate::aggregate::{AggregateReport, AggregateStats, Eliminator, OpponentStats};
use crate::bracket::RoundLabel;
use crate::config::settings::ScoritoSettings;
use crate::errors::EngineError;
use crate::rating::{PlayerId, RatingValue, Tier};

/// Fantasy value of one player for one simulated draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoritoMetrics {
    pub player_id: PlayerId,
    pub name: String,
    pub tier: Tier,
    pub expected_points: f64,
    pub value_score: f64,
    pub points_std: f64,
    pub points_p10: f64,
    pub points_p50: f64,
    pub points_p90: f64,
    pub risk_adj_value: f64,
    pub robustness: f64,
    pub win_probability: f64,
    pub unresolved_rate: f64,
    /// The player's effective rating under the run's weights.
    pub simulation_strength: RatingValue,
    pub average_exit_round: f64,
    pub median_exit_round: Option<RoundLabel>,
    pub mode_exit_round: Option<RoundLabel>,
    pub exit_distribution: BTreeMap<RoundLabel, f64>,
    pub eliminator: Option<Eliminator>,
    /// Meet-probability weighted rating of frequently met opponents.
    pub path_strength: Option<f64>,
    /// Mean opponent rating along the most likely path.
    pub path_average: Option<f64>,
    /// Strongest opponent rating along the most likely path.
    pub path_peak: Option<f64>,
    pub path_rounds: BTreeMap<RoundLabel, RatingValue>,
    pub frequent_opponents: BTreeMap<RoundLabel, Vec<OpponentStats>>,
}

/// Converts simulated round reach into fantasy points, ranked by expected
/// points (highest first).
pub fn optimize_scorito(
    report: &AggregateReport,
    table: &ScoringTable,
    settings: &ScoritoSettings,
) -> Vec<ScoritoMetrics> {
    let ratings: BTreeMap<PlayerId, RatingValue> = report
        .players
        .iter()
        .map(|(id, stats)| (*id, stats.rating))
        .collect();

    let mut metrics: Vec<ScoritoMetrics> = report
        .players
        .values()
        .map(|stats| player_metrics(report, stats, table, &ratings, settings))
        .collect();
    rank_by(&mut metrics, RankMetric::ExpectedPoints, SortDirection::Descending);
    debug!("Scored {} players over {} trials", metrics.len(), report.trials);
    metrics
}

/// `Σ_r (C[r] − C[r−1]) · P(reach r)` over the draw's rounds, with `C` the
/// cumulative scoring row and nothing before the first round.
pub fn expected_points(report: &AggregateReport, stats: &AggregateStats, table: &ScoringTable) -> f64 {
    let mut previous = 0.0;
    let mut total = 0.0;
    for label in &report.rounds {
        let cumulative = table.cumulative(stats.tier, *label);
        let reach = stats.reach_probability.get(label).copied().unwrap_or(0.0);
        total += (cumulative - previous) * reach;
        previous = cumulative;
    }
    total
}

fn player_metrics(
    report: &AggregateReport,
    stats: &AggregateStats,
    table: &ScoringTable,
    ratings: &BTreeMap<PlayerId, RatingValue>,
    settings: &ScoritoSettings,
) -> ScoritoMetrics {
    let expected = expected_points(report, stats, table);
    let distribution = PointsDistribution::new(stats, table);
    let std = distribution.std();
    let divisor = (std + 1.0).max(1.0);

    let frequent_opponents: BTreeMap<RoundLabel, Vec<OpponentStats>> = stats
        .opponents
        .iter()
        .filter_map(|(round, list)| {
            let frequent: Vec<OpponentStats> = list
                .iter()
                .filter(|o| o.meet_probability >= settings.opponent_meet_threshold)
                .cloned()
                .collect();
            (!frequent.is_empty()).then(|| (*round, frequent))
        })
        .collect();

    let path_ratings: Vec<f64> = stats.likely_path.iter().map(|s| s.opponent_rating).collect();

    ScoritoMetrics {
        player_id: stats.player_id,
        name: stats.name.clone(),
        tier: stats.tier,
        expected_points: expected,
        value_score: expected / settings.value_score_divisor,
        points_std: std,
        points_p10: distribution.percentile(0.10),
        points_p50: distribution.percentile(0.50),
        points_p90: distribution.percentile(0.90),
        risk_adj_value: expected / divisor,
        robustness: 100.0 / divisor,
        win_probability: stats.win_probability,
        unresolved_rate: stats.unresolved_rate,
        simulation_strength: stats.rating,
        average_exit_round: stats.average_exit_round,
        median_exit_round: stats.median_exit_round,
        mode_exit_round: stats.mode_exit_round,
        exit_distribution: stats.exit_distribution.clone(),
        eliminator: stats.eliminator.clone(),
        path_strength: path_strength(&frequent_opponents, ratings),
        path_average: mean(&path_ratings),
        path_peak: path_ratings.iter().copied().reduce(f64::max),
        path_rounds: stats
            .likely_path
            .iter()
            .map(|step| (step.round, step.opponent_rating))
            .collect(),
        frequent_opponents,
    }
}

fn path_strength(
    opponents: &BTreeMap<RoundLabel, Vec<OpponentStats>>,
    ratings: &BTreeMap<PlayerId, RatingValue>,
) -> Option<f64> {
    let (weighted, weight) = opponents
        .values()
        .flatten()
        .filter_map(|o| ratings.get(&o.opponent).map(|r| (r * o.meet_probability, o.meet_probability)))
        .fold((0.0, 0.0), |(sum, total), (w, p)| (sum + w, total + p));
    (weight > 0.0).then(|| weighted / weight)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Per-trial point totals, held as a histogram over the furthest round.
struct PointsDistribution {
    /// `(points, trials)` sorted by points.
    buckets: Vec<(f64, u64)>,
    trials: u64,
}

impl PointsDistribution {
    fn new(stats: &AggregateStats, table: &ScoringTable) -> Self {
        let mut buckets: Vec<(f64, u64)> = stats
            .furthest_counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(label, count)| (table.cumulative(stats.tier, *label), *count))
            .collect();
        buckets.sort_by(|a, b| a.0.total_cmp(&b.0));
        let trials = buckets.iter().map(|(_, count)| count).sum();
        Self { buckets, trials }
    }

    fn mean(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        let total: f64 = self.buckets.iter().map(|(p, c)| p * *c as f64).sum();
        total / self.trials as f64
    }

    /// Population standard deviation.
    fn std(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let squares: f64 = self
            .buckets
            .iter()
            .map(|(p, c)| (p - mean).powi(2) * *c as f64)
            .sum();
        (squares / self.trials as f64).sqrt()
    }

    /// Trial total at sorted position `round((n − 1) · pct)`.
    fn percentile(&self, pct: f64) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        let target = ((self.trials - 1) as f64 * pct).round() as u64;
        let mut seen = 0;
        for (points, count) in &self.buckets {
            seen += count;
            if seen > target {
                return *points;
            }
        }
        self.buckets.last().map_or(0.0, |(p, _)| *p)
    }
}

/// Numeric columns a ranking can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    #[default]
    ExpectedPoints,
    ValueScore,
    RiskAdjValue,
    Robustness,
    WinProbability,
    PathStrength,
    SimulationStrength,
    AverageExitRound,
}

impl RankMetric {
    pub fn value(&self, metrics: &ScoritoMetrics) -> Option<f64> {
        match self {
            RankMetric::ExpectedPoints => Some(metrics.expected_points),
            RankMetric::ValueScore => Some(metrics.value_score),
            RankMetric::RiskAdjValue => Some(metrics.risk_adj_value),
            RankMetric::Robustness => Some(metrics.robustness),
            RankMetric::WinProbability => Some(metrics.win_probability),
            RankMetric::PathStrength => metrics.path_strength,
            RankMetric::SimulationStrength => Some(metrics.simulation_strength),
            RankMetric::AverageExitRound => Some(metrics.average_exit_round),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankMetric::ExpectedPoints => "expected_points",
            RankMetric::ValueScore => "value_score",
            RankMetric::RiskAdjValue => "risk_adj_value",
            RankMetric::Robustness => "robustness",
            RankMetric::WinProbability => "win_probability",
            RankMetric::PathStrength => "path_strength",
            RankMetric::SimulationStrength => "simulation_strength",
            RankMetric::AverageExitRound => "average_exit_round",
        }
    }
}

impl fmt::Display for RankMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankMetric {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalised.as_str() {
            "expected_points" | "expected" => Ok(RankMetric::ExpectedPoints),
            "value_score" | "value" => Ok(RankMetric::ValueScore),
            "risk_adj_value" | "risk" => Ok(RankMetric::RiskAdjValue),
            "robustness" => Ok(RankMetric::Robustness),
            "win_probability" | "win" => Ok(RankMetric::WinProbability),
            "path_strength" | "path" => Ok(RankMetric::PathStrength),
            "simulation_strength" | "strength" => Ok(RankMetric::SimulationStrength),
            "average_exit_round" | "exit" => Ok(RankMetric::AverageExitRound),
            _ => Err(EngineError::InvalidChoice {
                what: "ranking metric",
                value: s.to_string(),
            }),
        }
    }
}

/// Sorts in place by `metric` and returns the drop-off boundaries of the
/// ranked values. Players without a value go last; ties keep player id order.
pub fn rank_by(metrics: &mut [ScoritoMetrics], metric: RankMetric, direction: SortDirection) -> Vec<usize> {
    metrics.sort_by(|a, b| {
        let ordering = match (metric.value(a), metric.value(b)) {
            (Some(x), Some(y)) => match direction {
                SortDirection::Ascending => x.total_cmp(&y),
                SortDirection::Descending => y.total_cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        ordering.then(a.player_id.cmp(&b.player_id))
    });

    let values: Vec<f64> = metrics.iter().map_while(|m| metric.value(m)).collect();
    drop_off_boundaries(&values, direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::PathStep;

    fn stats(id: PlayerId, tier: Tier, furthest: [u64; 4]) -> AggregateStats {
        let labels = [RoundLabel::QF, RoundLabel::SF, RoundLabel::F, RoundLabel::W];
        let trials: u64 = furthest.iter().sum();
        let reach = (0..3)
            .map(|r| (labels[r], furthest[r..].iter().sum::<u64>() as f64 / trials as f64))
            .collect();
        AggregateStats {
            player_id: id,
            name: format!("P{id}"),
            tier,
            rating: 1500.0 + id as f64,
            reach_probability: reach,
            win_probability: furthest[3] as f64 / trials as f64,
            exit_distribution: BTreeMap::new(),
            furthest_counts: labels.iter().copied().zip(furthest).collect(),
            unresolved_rate: 0.0,
            average_exit_round: 0.0,
            median_exit_round: None,
            mode_exit_round: None,
            eliminator: None,
            opponents: BTreeMap::new(),
            likely_path: Vec::new(),
        }
    }

    fn report(players: Vec<AggregateStats>) -> AggregateReport {
        let trials = players[0].furthest_counts.values().sum();
        AggregateReport {
            trials,
            seed: 0,
            rounds: vec![RoundLabel::QF, RoundLabel::SF, RoundLabel::F],
            low_trial_count: false,
            players: players.into_iter().map(|s| (s.player_id, s)).collect(),
        }
    }

    #[test]
    fn test_expected_points_matches_histogram_mean() {
        let report = report(vec![stats(1, Tier::A, [40, 30, 20, 10]), stats(2, Tier::D, [10, 20, 30, 40])]);
        let table = ScoringTable::default();
        for stats in report.players.values() {
            let expected = expected_points(&report, stats, &table);
            let mean = PointsDistribution::new(stats, &table).mean();
            assert!((expected - mean).abs() < 1e-9, "{expected} vs {mean}");
        }
    }

    #[test]
    fn test_small_draw_folds_skipped_columns() {
        // Tier A in an 8-draw: a QF loss is worth R1..QF = 160.
        let report = report(vec![stats(1, Tier::A, [1, 0, 0, 0])]);
        let metrics = optimize_scorito(&report, &ScoringTable::default(), &ScoritoSettings::default());
        assert_eq!(metrics[0].expected_points, 160.0);
        assert_eq!(metrics[0].points_std, 0.0);
        assert_eq!(metrics[0].risk_adj_value, 160.0);
        assert_eq!(metrics[0].robustness, 100.0);
        assert_eq!(metrics[0].value_score, 1.6);
    }

    #[test]
    fn test_percentiles() {
        // Tier A totals: QF 160, SF 240, F/W 340.
        let report = report(vec![stats(1, Tier::A, [5, 3, 1, 1])]);
        let metrics = optimize_scorito(&report, &ScoringTable::default(), &ScoritoSettings::default());
        let m = &metrics[0];
        assert_eq!(m.points_p10, 160.0);
        assert_eq!(m.points_p50, 240.0);
        assert_eq!(m.points_p90, 340.0);
    }

    #[test]
    fn test_scaling_is_linear_for_expectation_only() {
        let report = report(vec![stats(1, Tier::B, [25, 25, 25, 25]), stats(2, Tier::C, [70, 20, 5, 5])]);
        let table = ScoringTable::default();
        let settings = ScoritoSettings::default();
        let base = optimize_scorito(&report, &table, &settings);
        let doubled = optimize_scorito(&report, &table.scaled(2.0), &settings);

        for (a, b) in base.iter().zip(&doubled) {
            assert_eq!(a.player_id, b.player_id);
            assert!((b.expected_points - 2.0 * a.expected_points).abs() < 1e-9);
            assert!((b.points_std - 2.0 * a.points_std).abs() < 1e-9);
            let scaled_risk = b.expected_points / (b.points_std + 1.0);
            assert!((b.risk_adj_value - scaled_risk).abs() < 1e-9);
            assert!((b.risk_adj_value - 2.0 * a.risk_adj_value).abs() > 1e-6);
            assert!(b.robustness < a.robustness);
        }
    }

    #[test]
    fn test_output_ranked_by_expected_points() {
        let report = report(vec![
            stats(1, Tier::A, [10, 0, 0, 0]),
            stats(2, Tier::D, [10, 0, 0, 0]),
            stats(3, Tier::B, [10, 0, 0, 0]),
        ]);
        let metrics = optimize_scorito(&report, &ScoringTable::default(), &ScoritoSettings::default());
        let order: Vec<PlayerId> = metrics.iter().map(|m| m.player_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_rank_by_puts_missing_values_last() {
        let mut report = report(vec![
            stats(1, Tier::A, [10, 0, 0, 0]),
            stats(2, Tier::A, [10, 0, 0, 0]),
            stats(3, Tier::A, [10, 0, 0, 0]),
        ]);
        let opponent = |id: PlayerId, p: f64| OpponentStats {
            opponent: id,
            name: format!("P{id}"),
            meet_probability: p,
            win_probability: 0.5,
        };
        if let Some(s) = report.players.get_mut(&1) {
            s.opponents.insert(RoundLabel::QF, vec![opponent(2, 0.5), opponent(3, 0.05)]);
        }
        if let Some(s) = report.players.get_mut(&3) {
            s.opponents.insert(RoundLabel::QF, vec![opponent(1, 0.5), opponent(2, 0.5)]);
        }

        let mut metrics = optimize_scorito(&report, &ScoringTable::default(), &ScoritoSettings::default());
        rank_by(&mut metrics, RankMetric::PathStrength, SortDirection::Ascending);

        assert_eq!(metrics[0].player_id, 3);
        assert_eq!(metrics[0].path_strength, Some(1501.5));
        assert_eq!(metrics[1].player_id, 1);
        // The rare opponent is filtered out.
        assert_eq!(metrics[1].path_strength, Some(1502.0));
        assert_eq!(metrics[1].frequent_opponents[&RoundLabel::QF].len(), 1);
        assert_eq!(metrics[2].path_strength, None);
    }

    #[test]
    fn test_path_difficulty_from_likely_path() {
        let mut report = report(vec![stats(1, Tier::A, [0, 0, 0, 10])]);
        let step = |round, rating| PathStep {
            round,
            opponent: 9,
            opponent_name: "P9".into(),
            opponent_rating: rating,
            win_probability: 0.6,
        };
        if let Some(s) = report.players.get_mut(&1) {
            s.likely_path = vec![step(RoundLabel::QF, 1600.0), step(RoundLabel::SF, 1800.0)];
        }
        let metrics = optimize_scorito(&report, &ScoringTable::default(), &ScoritoSettings::default());
        assert_eq!(metrics[0].path_average, Some(1700.0));
        assert_eq!(metrics[0].path_peak, Some(1800.0));
        assert_eq!(metrics[0].path_rounds[&RoundLabel::SF], 1800.0);
    }

    #[test]
    fn test_rank_metric_parse() {
        assert_eq!("risk-adj-value".parse::<RankMetric>().unwrap(), RankMetric::RiskAdjValue);
        assert_eq!("expected".parse::<RankMetric>().unwrap(), RankMetric::ExpectedPoints);
        assert!("luck".parse::<RankMetric>().is_err());
    }
}
