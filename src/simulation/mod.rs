pub mod engine;
pub mod field;
pub mod sampler;

pub use engine::{Exit, NodeResult, SimulationOutcome, simulate_most_likely, simulate_once};
pub use field::{Field, Occupant};
pub use sampler::{most_likely, sample};
