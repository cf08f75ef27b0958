use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::SimParams;
use std::path::Path;

// Lattice dimensions (axial parallelogram)
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Line,
    Tree,
}

// Initial particle configuration
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InitialConditions {
    pub shape: ShapeKind,
    pub num_particles: u32,
    #[serde(default = "default_num_classes")]
    pub num_classes: u16,
    pub placement_seed: u64,
}

// Move engine settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationSettings {
    pub bias: f64,
    pub iterations: u64,
    pub record_interval_iterations: u64,
    pub seed: u64,
    #[serde(default = "default_trials")]
    pub trials: u32,
    /// Empty means every class is eligible to move.
    #[serde(default)]
    pub classes_to_move: Vec<u16>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_stats: bool,
    #[serde(default)]
    pub save_probabilities: bool,
    #[serde(default)]
    pub save_positions: bool,
    #[serde(default)]
    pub save_positions_in_snapshot: bool,
    pub format: Option<String>, // "json", "bincode", "messagepack"
}

fn default_num_classes() -> u16 {
    1
}

fn default_trials() -> u32 {
    1
}

// Main configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub initial_conditions: InitialConditions,
    pub simulation: SimulationSettings,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.width == 0 || self.grid.height == 0 {
            anyhow::bail!("grid width and height must be greater than 0.");
        }
        if !self.simulation.bias.is_finite() || self.simulation.bias <= 0.0 {
            anyhow::bail!("bias must be a positive finite number, got {}.", self.simulation.bias);
        }
        if self.initial_conditions.num_particles == 0 {
            anyhow::bail!("num_particles must be greater than 0.");
        }
        if self.initial_conditions.num_particles as u64
            >= self.grid.width as u64 * self.grid.height as u64
        {
            anyhow::bail!("num_particles must leave at least one empty cell on the grid.");
        }
        if self.initial_conditions.num_classes == 0 {
            anyhow::bail!("num_classes must be greater than 0.");
        }
        if self.simulation.record_interval_iterations == 0 {
            anyhow::bail!("record_interval_iterations must be greater than 0.");
        }
        if self.simulation.trials == 0 {
            anyhow::bail!("trials must be greater than 0.");
        }
        Ok(())
    }

    /// Converts the configuration into the parameters a trial needs at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let mut classes_to_move = self.simulation.classes_to_move.clone();
        classes_to_move.sort_unstable();
        classes_to_move.dedup();

        SimParams {
            grid_width: self.grid.width,
            grid_height: self.grid.height,
            shape: self.initial_conditions.shape,
            num_particles: self.initial_conditions.num_particles,
            num_classes: self.initial_conditions.num_classes,
            placement_seed: self.initial_conditions.placement_seed,
            bias: self.simulation.bias,
            iterations: self.simulation.iterations,
            record_interval_iterations: self.simulation.record_interval_iterations,
            seed: self.simulation.seed,
            classes_to_move,
            save_positions_in_snapshot: self.output.save_positions_in_snapshot,
        }
    }
}
