pub mod config;
pub mod params;
pub mod report;

// Re-export key types for easier use by dependent crates
pub use config::{AutomatonConfig, GridConfig, ModelConfig, OutputConfig, RunConfig, RunMode};
pub use params::{ModelVariant, Params};
pub use report::{CountRecord, PmfReport, SeriesReport};
