pub mod aggregate;
pub mod bracket;
pub mod cache;
pub mod cli;
pub mod config;
pub mod display;
pub mod domain;
pub mod errors;
pub mod rating;
pub mod scorito;
pub mod services;
pub mod simulation;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use log::info;
use serde::de::DeserializeOwned;

use crate::cli::Command;
use crate::config::WeightPreset;
use crate::config::settings::AppConfig;
use crate::domain::{MatchupRequest, PresetInfo, SimulationRequest};
use crate::errors::{parse_context, read_context};
use crate::services::SimulationService;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_simulate(
    input: &Path,
    trials: Option<usize>,
    seed: Option<u64>,
    output: Option<&Path>,
    no_cache: bool,
    table: bool,
) -> Result<()> {
    let mut request: SimulationRequest = read_request(input, "simulation request")?;
    if trials.is_some() {
        request.trials = trials;
    }
    if seed.is_some() {
        request.seed = seed;
    }

    let service = SimulationService::new(AppConfig::new(), !no_cache)?;
    let envelope = service.run(&request)?;

    if table {
        println!("{}", display::ranking_table(&envelope.report));
        return Ok(());
    }

    let json = serde_json::to_string_pretty(&envelope)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write report to: {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn handle_bracket(input: &Path, json: bool) -> Result<()> {
    let request: SimulationRequest = read_request(input, "simulation request")?;
    let service = SimulationService::new(AppConfig::new(), false)?;
    let draw = service.bracket(&request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&draw)?);
    } else {
        println!("{}", display::bracket_text(&draw));
    }
    Ok(())
}

pub fn handle_matchup(input: &Path, json: bool) -> Result<()> {
    let request: MatchupRequest = read_request(input, "matchup request")?;
    let service = SimulationService::new(AppConfig::new(), false)?;
    let prediction = service.matchup(&request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        println!(
            "{}",
            display::matchup_text(&request.player_a, &request.player_b, &prediction)
        );
    }
    Ok(())
}

pub fn handle_presets() -> Result<()> {
    let presets = preset_listing()?;
    println!("{}", display::presets_text(&presets));
    Ok(())
}

pub fn preset_listing() -> Result<Vec<PresetInfo>> {
    WeightPreset::NAMED
        .iter()
        .map(|preset| {
            Ok(PresetInfo {
                name: preset.name().to_string(),
                description: preset.description().to_string(),
                weights: preset.resolve()?,
            })
        })
        .collect()
}

fn read_request<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let path_str = path.display().to_string();
    let data = fs::read_to_string(path).with_context(|| read_context(&path_str))?;
    serde_json::from_str(&data).with_context(|| parse_context(what))
}
