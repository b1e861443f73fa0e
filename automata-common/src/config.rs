use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::params::{ModelVariant, Params};
use std::path::Path;

// Configuration for the automaton lattice
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GridConfig {
    /// Side length N of the N x N grid.
    pub size: usize,
    /// Number of cancer cells placed at initialization.
    pub initial_cancer: usize,
}

// Transition rule settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ModelConfig {
    #[serde(default)]
    pub variant: ModelVariant,
    pub probs: [f64; 5],
    #[serde(default = "default_competition")]
    pub competition: bool,
    #[serde(default = "default_exponent")]
    pub alpha: f64,
    #[serde(default = "default_exponent")]
    pub beta: f64,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Histogram of cancer counts after `steps` steps over `runs` realizations.
    Pdf,
    /// Stationary-state histogram sampled every `sample_gap` steps after `init_steps`.
    Rolling,
    /// Per-step counts of a single realization.
    Series,
    /// Animate a single realization on the console.
    Display,
}

// What to run and how long for
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RunConfig {
    pub mode: RunMode,
    #[serde(default)]
    pub steps: u32,
    #[serde(default = "default_runs")]
    pub runs: usize,
    #[serde(default)]
    pub init_steps: u32,
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default)]
    pub sample_gap: u32,
    pub seed: u64,
    #[serde(default = "default_display_delay_ms")]
    pub display_delay_ms: u64,
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_report: bool,
    pub format: Option<String>, // Output format: "json", "csv"
}

// Main configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AutomatonConfig {
    pub grid: GridConfig,
    pub model: ModelConfig,
    pub run: RunConfig,
    pub output: OutputConfig,
}

impl AutomatonConfig {
    /// Loads the automaton configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: AutomatonConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;

        // --- Validation ---
        if config.grid.size == 0 {
            anyhow::bail!("grid.size must be at least 1.");
        }
        let cells = config.grid.size.checked_mul(config.grid.size)
            .ok_or_else(|| anyhow::anyhow!("grid.size {} is too large.", config.grid.size))?;
        if config.grid.initial_cancer > cells {
            anyhow::bail!(
                "grid.initial_cancer ({}) exceeds the number of cells ({}).",
                config.grid.initial_cancer, cells
            );
        }
        for (k, p) in config.model.probs.iter().enumerate() {
            if !(0.0..=1.0).contains(p) {
                anyhow::bail!("model.probs[{}] = {} is not a probability.", k, p);
            }
        }
        match config.run.mode {
            RunMode::Pdf | RunMode::Rolling if config.run.runs == 0 => {
                anyhow::bail!("run.runs must be greater than 0.");
            }
            RunMode::Rolling if config.run.samples == 0 => {
                anyhow::bail!("run.samples must be greater than 0.");
            }
            _ => {}
        }

        Ok(config)
    }

    /// Converts the configuration into model parameters used at runtime.
    pub fn params(&self) -> Params {
        Params {
            probs: self.model.probs,
            competition: self.model.competition,
            alpha: self.model.alpha,
            beta: self.model.beta,
        }
    }
}

fn default_competition() -> bool {
    true
}

fn default_exponent() -> f64 {
    1.0
}

fn default_runs() -> usize {
    1
}

fn default_samples() -> usize {
    1
}

fn default_display_delay_ms() -> u64 {
    400
}
