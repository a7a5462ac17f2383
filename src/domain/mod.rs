pub mod models;

pub use models::{
    DrawInput, MatchupRequest, PresetInfo, RunEnvelope, RunReport, SimulationRequest,
};
