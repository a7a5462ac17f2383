pub mod presets;
pub mod settings;

pub use presets::WeightPreset;
pub use settings::{AppConfig, CacheSettings, EngineSettings, ScoritoSettings};
