use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::UInt;
use crate::error::Error;
use crate::learning::agent_state::RlSpaceKind;
use crate::learning::learning_agent::DEFAULT_GAMMA;
use crate::simulation::ExperimentId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub experiment: ExperimentId,
    pub seed: u64,
    pub rl_space: RlSpaceKind,
    /// Turns after which the run stops.
    pub max_steps: UInt,
    /// Turn at which the experiment's policy and learning switches apply.
    pub switch_step: UInt,
    /// Overrides the experiment's step size when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f32>,
    pub gamma: f32,
    /// Keep each agent's action sequence in the record.
    pub record_history: bool,
    /// Snapshot the moving agent's Q-table after every turn.
    pub dump_tables: bool,
    pub progress_interval: UInt,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            experiment: ExperimentId::default(),
            seed: 1,
            rl_space: RlSpaceKind::default(),
            max_steps: 10_000,
            switch_step: 500,
            alpha: None,
            gamma: DEFAULT_GAMMA,
            record_history: false,
            dump_tables: false,
            progress_interval: 250,
        }
    }
}

impl Config {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Step size for the run: the override if given, otherwise the experiment's.
    pub fn alpha(&self) -> f32 {
        self.alpha.unwrap_or_else(|| self.experiment.alpha())
    }
}
