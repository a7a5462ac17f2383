use anyhow::Result;

use tennis_scorito::cli::Command;
use tennis_scorito::{handle_bracket, handle_matchup, handle_presets, handle_simulate, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Simulate {
            input,
            trials,
            seed,
            output,
            no_cache,
            table,
        } => handle_simulate(input, *trials, *seed, output.as_deref(), *no_cache, *table),
        Command::Bracket { input, json } => handle_bracket(input, *json),
        Command::Matchup { input, json } => handle_matchup(input, *json),
        Command::Presets => handle_presets(),
    }
}
