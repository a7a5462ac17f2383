use anyhow::{Context, Result};
use chrono::Utc;
use log::info;

use crate::aggregate::{AnnotatedDraw, aggregate, most_likely_path};
use crate::bracket::DrawTree;
use crate::cache::Cache;
use crate::config::settings::AppConfig;
use crate::domain::{MatchupRequest, RunEnvelope, RunReport, SimulationRequest};
use crate::errors::parse_context;
use crate::rating::{MatchModel, MatchPrediction, predict};
use crate::scorito::{optimize_scorito, rank_by};
use crate::simulation::Field;

pub struct SimulationService {
    config: AppConfig,
    cache: Option<Cache>,
}

impl SimulationService {
    pub fn new(config: AppConfig, use_cache: bool) -> Result<Self> {
        let cache = if use_cache {
            Some(Cache::new(&config.cache.dir)?)
        } else {
            None
        };
        Ok(Self { config, cache })
    }

    /// Simulates the draw and scores every entrant.
    ///
    /// Seeded requests are served from the cache when an identical request
    /// has already been run.
    pub fn run(&self, request: &SimulationRequest) -> Result<RunEnvelope> {
        info!("=== Starting Simulation ===");

        let mut request = request.clone();
        request.trials = Some(request.trials.unwrap_or(self.config.engine.default_trials));
        let cache_key = self.cache_key(&request)?;

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(envelope) = cache.load::<RunEnvelope>(key)? {
                info!("  → Reusing cached run {}", key);
                return Ok(envelope);
            }
        }

        let report = self.simulate(&request)?;
        let envelope = RunEnvelope {
            generated_at: Utc::now(),
            cache_key: cache_key.clone(),
            report,
        };

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            cache.save(key, &envelope)?;
        }

        info!("=== Simulation Complete ===");
        Ok(envelope)
    }

    /// The favourite-always-wins bracket, no trials involved.
    pub fn bracket(&self, request: &SimulationRequest) -> Result<AnnotatedDraw> {
        let (tree, model) = self.prepare(request)?;
        let field = Field::new(&tree, &request.players, &model, &self.config.engine);
        Ok(most_likely_path(&tree, &field))
    }

    pub fn matchup(&self, request: &MatchupRequest) -> Result<MatchPrediction> {
        let model = request.model().context(parse_context("weights"))?;
        Ok(predict(&request.player_a, &request.player_b, &model))
    }

    fn simulate(&self, request: &SimulationRequest) -> Result<RunReport> {
        info!("Step 1: Building draw...");
        let (tree, model) = self.prepare(request)?;
        let field = Field::new(&tree, &request.players, &model, &self.config.engine);
        info!("  → {} entrants over {} rounds", field.len(), tree.rounds());

        info!("Step 2: Running trials...");
        let trials = request.trials.unwrap_or(self.config.engine.default_trials);
        let report = aggregate(&tree, &field, trials, request.seed, &self.config.engine)?;
        info!("  → {} trials with seed {}", report.trials, report.seed);

        info!("Step 3: Scoring...");
        let most_likely = most_likely_path(&tree, &field);
        let mut ranking = optimize_scorito(&report, &request.scoring_table(), &self.config.scorito);
        let drop_offs = rank_by(&mut ranking, request.sort_by, request.sort_direction);
        info!("  → Ranked {} players by {}, {} drop-offs", ranking.len(), request.sort_by, drop_offs.len());

        Ok(RunReport {
            aggregate: report,
            most_likely,
            sort_by: request.sort_by,
            sort_direction: request.sort_direction,
            ranking,
            drop_offs,
        })
    }

    fn prepare(&self, request: &SimulationRequest) -> Result<(DrawTree, MatchModel)> {
        let model = request.model().context(parse_context("weights"))?;
        let tree = request.draw.build().context(parse_context("draw"))?;
        Ok((tree, model))
    }

    /// Only seeded runs are reproducible, so only they get a key.
    fn cache_key(&self, request: &SimulationRequest) -> Result<Option<String>> {
        if self.cache.is_none() || request.seed.is_none() {
            return Ok(None);
        }
        Cache::key_for(request).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::Slot;
    use crate::config::settings::CacheSettings;
    use crate::domain::DrawInput;
    use crate::rating::{PlayerRating, Tier};

    fn request(seed: Option<u64>) -> SimulationRequest {
        SimulationRequest {
            players: (1..=4)
                .map(|id| PlayerRating::new(id, format!("P{id}"), Tier::B).with_overall(1500.0 + 50.0 * id as f64))
                .collect(),
            draw: DrawInput::Entries((1..=4).map(Slot::Player).collect()),
            weights: Default::default(),
            format: Default::default(),
            scoring: None,
            trials: Some(200),
            seed,
            sort_by: Default::default(),
            sort_direction: Default::default(),
        }
    }

    fn service(dir: &std::path::Path, use_cache: bool) -> SimulationService {
        let config = AppConfig {
            cache: CacheSettings {
                dir: dir.to_path_buf(),
            },
            ..AppConfig::default()
        };
        SimulationService::new(config, use_cache).unwrap()
    }

    #[test]
    fn test_seeded_run_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), true);

        let first = service.run(&request(Some(11))).unwrap();
        let key = first.cache_key.clone().unwrap();
        assert!(Cache::new(dir.path()).unwrap().exists(&key));

        let second = service.run(&request(Some(11))).unwrap();
        assert_eq!(second.generated_at, first.generated_at);
        assert_eq!(second.report.aggregate.seed, 11);
        let order = |e: &RunEnvelope| e.report.ranking.iter().map(|m| m.player_id).collect::<Vec<_>>();
        assert_eq!(order(&second), order(&first));
    }

    #[test]
    fn test_unseeded_run_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), true);
        let envelope = service.run(&request(None)).unwrap();
        assert!(envelope.cache_key.is_none());
        assert_eq!(envelope.report.aggregate.trials, 200);
    }

    #[test]
    fn test_report_is_ranked() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), false);
        let report = service.run(&request(Some(3))).unwrap().report;
        let expected: Vec<f64> = report.ranking.iter().map(|m| m.expected_points).collect();
        assert!(expected.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(report.most_likely.champion, Some(4));
    }
}
