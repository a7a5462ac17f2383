use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::accumulator::TrialAccumulator;
use super::most_likely::{PathStep, player_path};
use crate::bracket::{DrawTree, RoundLabel};
use crate::config::settings::EngineSettings;
use crate::errors::{EngineError, EngineResult};
use crate::rating::{PlayerId, RatingValue, Tier};
use crate::simulation::{Field, simulate_most_likely, simulate_once};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentStats {
    pub opponent: PlayerId,
    pub name: String,
    /// Share of all trials in which the two met.
    pub meet_probability: f64,
    /// Share of those meetings the player won.
    pub win_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eliminator {
    pub opponent: PlayerId,
    pub name: String,
    /// Share of all trials ending in a loss to this opponent.
    pub elimination_rate: f64,
    pub meet_probability: f64,
    pub win_probability: f64,
    /// Round in which the loss happens most often.
    pub usual_round: RoundLabel,
}

/// Monte-Carlo summary for one entrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub player_id: PlayerId,
    pub name: String,
    pub tier: Tier,
    pub rating: RatingValue,
    /// P(still alive entering the round).
    pub reach_probability: BTreeMap<RoundLabel, f64>,
    pub win_probability: f64,
    /// P(run ends in the round); `W` is the title.
    pub exit_distribution: BTreeMap<RoundLabel, f64>,
    /// Trials whose furthest round was this one; `W` is the title.
    pub furthest_counts: BTreeMap<RoundLabel, u64>,
    /// Share of trials cut short by an undecided slot.
    pub unresolved_rate: f64,
    /// Mean exit round, counted from 1 (R1 exit = 1, title = rounds + 1).
    pub average_exit_round: f64,
    pub median_exit_round: Option<RoundLabel>,
    pub mode_exit_round: Option<RoundLabel>,
    pub eliminator: Option<Eliminator>,
    /// Every opponent met, per round, most frequent first.
    pub opponents: BTreeMap<RoundLabel, Vec<OpponentStats>>,
    pub likely_path: Vec<PathStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub trials: u64,
    pub seed: u64,
    pub rounds: Vec<RoundLabel>,
    /// Set when `trials` is below the configured stable minimum.
    pub low_trial_count: bool,
    pub players: BTreeMap<PlayerId, AggregateStats>,
}

impl AggregateReport {
    pub fn player(&self, id: PlayerId) -> Option<&AggregateStats> {
        self.players.get(&id)
    }
}

/// Runs `trials` simulations in parallel and summarises them per player.
///
/// Trial `i` draws from its own generator seeded with `seed + i`, so a fixed
/// seed reproduces the same report however the work is scheduled. Without a
/// seed one is drawn at random and recorded in the report. Low trial counts
/// are allowed but flagged, since their estimates are noisy.
pub fn aggregate(
    tree: &DrawTree,
    field: &Field,
    trials: usize,
    seed: Option<u64>,
    settings: &EngineSettings,
) -> EngineResult<AggregateReport> {
    if trials == 0 {
        return Err(EngineError::NoTrials);
    }
    let seed = seed.unwrap_or_else(rand::random);
    info!(
        "Simulating {}-player draw {} times (seed {})",
        field.len(),
        trials,
        seed
    );

    let empty = || TrialAccumulator::new(field.len(), tree.rounds());
    let accumulator = (0..trials)
        .into_par_iter()
        .fold(empty, |mut acc, trial| {
            let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(trial as u64));
            acc.record(&simulate_once(tree, field, &mut rng));
            acc
        })
        .reduce(empty, TrialAccumulator::merge);

    Ok(finish(tree, field, &accumulator, seed, settings))
}

/// Sequential trials drawing from a caller-supplied random source.
pub fn run_trials<R: Rng + ?Sized>(
    tree: &DrawTree,
    field: &Field,
    trials: usize,
    rng: &mut R,
) -> EngineResult<TrialAccumulator> {
    if trials == 0 {
        return Err(EngineError::NoTrials);
    }
    let mut accumulator = TrialAccumulator::new(field.len(), tree.rounds());
    for _ in 0..trials {
        accumulator.record(&simulate_once(tree, field, rng));
    }
    Ok(accumulator)
}

/// Turns raw counters into per-player statistics.
pub fn finish(
    tree: &DrawTree,
    field: &Field,
    accumulator: &TrialAccumulator,
    seed: u64,
    settings: &EngineSettings,
) -> AggregateReport {
    let low_trial_count = accumulator.trials() < settings.min_stable_trials;
    if low_trial_count {
        warn!(
            "Only {} trials requested (stable estimates need about {}), results will be noisy",
            accumulator.trials(),
            settings.min_stable_trials
        );
    }

    let favourites = simulate_most_likely(tree, field);
    let players = (0..field.len())
        .map(|idx| {
            let stats = player_stats(tree, field, accumulator, idx, player_path(tree, field, &favourites, idx));
            (stats.player_id, stats)
        })
        .collect();
    debug!("Aggregated statistics for {} players", field.len());

    AggregateReport {
        trials: accumulator.trials(),
        seed,
        rounds: tree.labels().to_vec(),
        low_trial_count,
        players,
    }
}

fn player_stats(
    tree: &DrawTree,
    field: &Field,
    acc: &TrialAccumulator,
    idx: usize,
    likely_path: Vec<PathStep>,
) -> AggregateStats {
    let trials = acc.trials() as f64;
    let rounds = tree.rounds();
    let player = field.entrant(idx);

    let reach_probability = (0..rounds)
        .map(|r| (tree.label(r), acc.reach[[idx, r]] as f64 / trials))
        .collect();
    let furthest_counts = (0..=rounds)
        .map(|r| (tree.label(r), acc.furthest[[idx, r]]))
        .collect();

    // Exit histogram over resolved runs: losses per round, then titles.
    let exits: Vec<u64> = (0..rounds)
        .map(|r| acc.eliminated[[idx, r]])
        .chain(std::iter::once(acc.reach[[idx, rounds]]))
        .collect();
    let exit_distribution = exits
        .iter()
        .enumerate()
        .map(|(r, &count)| (tree.label(r), count as f64 / trials))
        .collect();
    let (average_exit_round, median_exit_round, mode_exit_round) = exit_summary(tree, &exits);

    AggregateStats {
        player_id: player.id,
        name: player.name.clone(),
        tier: player.tier,
        rating: field.rating(idx),
        reach_probability,
        win_probability: acc.reach[[idx, rounds]] as f64 / trials,
        exit_distribution,
        furthest_counts,
        unresolved_rate: acc.unresolved[idx] as f64 / trials,
        average_exit_round,
        median_exit_round,
        mode_exit_round,
        eliminator: eliminator(tree, field, acc, idx),
        opponents: opponents_by_round(tree, field, acc, idx),
        likely_path,
    }
}

fn exit_summary(tree: &DrawTree, exits: &[u64]) -> (f64, Option<RoundLabel>, Option<RoundLabel>) {
    let resolved: u64 = exits.iter().sum();
    if resolved == 0 {
        return (0.0, None, None);
    }

    let weighted: f64 = exits
        .iter()
        .enumerate()
        .map(|(r, &count)| (r + 1) as f64 * count as f64)
        .sum();
    let average = weighted / resolved as f64;

    // Element at sorted position resolved / 2.
    let target = resolved / 2;
    let mut seen = 0;
    let mut median = None;
    for (r, &count) in exits.iter().enumerate() {
        seen += count;
        if seen > target {
            median = Some(tree.label(r));
            break;
        }
    }

    // Ties go to the earlier round.
    let mode = exits
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .max_by(|(ra, ca), (rb, cb)| ca.cmp(cb).then(rb.cmp(ra)))
        .map(|(r, _)| tree.label(r));

    (average, median, mode)
}

fn eliminator(tree: &DrawTree, field: &Field, acc: &TrialAccumulator, idx: usize) -> Option<Eliminator> {
    let mut by_opponent: HashMap<usize, u64> = HashMap::new();
    for (&(_, opponent), &count) in &acc.eliminators[idx] {
        *by_opponent.entry(opponent).or_insert(0) += count;
    }
    let (&opponent, &losses) = by_opponent
        .iter()
        .max_by(|(oa, ca), (ob, cb)| ca.cmp(cb).then(ob.cmp(oa)))?;

    let usual_round = acc.eliminators[idx]
        .iter()
        .filter(|((_, o), _)| *o == opponent)
        .max_by(|((ra, _), ca), ((rb, _), cb)| ca.cmp(cb).then(rb.cmp(ra)))
        .map(|((round, _), _)| *round)
        .unwrap_or(0);

    let (met, won) = acc.meetings[idx]
        .iter()
        .filter(|((_, o), _)| *o == opponent)
        .fold((0, 0), |(met, won), (_, m)| (met + m.met, won + m.won));

    let trials = acc.trials() as f64;
    let rival = field.entrant(opponent);
    Some(Eliminator {
        opponent: rival.id,
        name: rival.name.clone(),
        elimination_rate: losses as f64 / trials,
        meet_probability: met as f64 / trials,
        win_probability: won as f64 / met.max(1) as f64,
        usual_round: tree.label(usual_round),
    })
}

fn opponents_by_round(
    tree: &DrawTree,
    field: &Field,
    acc: &TrialAccumulator,
    idx: usize,
) -> BTreeMap<RoundLabel, Vec<OpponentStats>> {
    let trials = acc.trials() as f64;
    let mut grouped: BTreeMap<usize, Vec<(usize, u64, u64)>> = BTreeMap::new();
    for (&(round, opponent), meeting) in &acc.meetings[idx] {
        grouped
            .entry(round)
            .or_default()
            .push((opponent, meeting.met, meeting.won));
    }

    grouped
        .into_iter()
        .map(|(round, mut met)| {
            met.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            let list = met
                .into_iter()
                .map(|(opponent, met, won)| {
                    let rival = field.entrant(opponent);
                    OpponentStats {
                        opponent: rival.id,
                        name: rival.name.clone(),
                        meet_probability: met as f64 / trials,
                        win_probability: won as f64 / met.max(1) as f64,
                    }
                })
                .collect();
            (tree.label(round), list)
        })
        .collect()
}
