use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "tennis draw simulator and Scorito value ranking")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Simulate a draw and rank players by fantasy value
    Simulate {
        /// JSON simulation request
        #[arg(short, long)]
        input: PathBuf,
        /// Number of trials (overrides the request)
        #[arg(short, long)]
        trials: Option<usize>,
        /// Random seed (overrides the request)
        #[arg(short, long)]
        seed: Option<u64>,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip the run cache
        #[arg(long)]
        no_cache: bool,
        /// Print a ranking table instead of JSON
        #[arg(long)]
        table: bool,
    },
    /// Show the most likely bracket
    Bracket {
        /// JSON simulation request
        #[arg(short, long)]
        input: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Win probability and factor breakdown for two players
    Matchup {
        /// JSON matchup request
        #[arg(short, long)]
        input: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List the built-in weight presets
    Presets,
}
