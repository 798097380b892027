use itertools::iproduct;
use log::debug;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumString};

use crate::actions::Action;
use crate::agent::AgentId;
use crate::error::Error;
use crate::learning::agent_state::{RlSpace, RlSpaceType};
use crate::learning::history::History;
use crate::learning::policy::{Policy, PolicyType, applicable_actions, policy_rng};
use crate::learning::q_table::QTable;
use crate::learning::reward::Reward;
use crate::world::{GRID_SIZE, World};

pub const DEFAULT_ALPHA: f32 = 0.3;
pub const DEFAULT_GAMMA: f32 = 0.5;

/// Number of (carrying, cell) combinations in a [`TableSnapshot`].
pub const SNAPSHOT_LEN: usize = 2 * GRID_SIZE * GRID_SIZE * GRID_SIZE;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
pub enum LearningMode {
    #[default]
    #[strum(to_string = "ql", serialize = "q-learning")]
    #[serde(rename = "ql")]
    QLearning,
    #[strum(serialize = "sarsa")]
    #[serde(rename = "sarsa")]
    Sarsa,
}

/// Best action and its value for every cell, with and without a block.
///
/// Entry `x * 18 + y * 6 + z * 2 + carrying` describes the agent at `(x, y, z)`.
/// Cells where no action has a positive value are reported as `(0.0, None)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub strength: Vec<f32>,
    pub moves: Vec<Option<Action>>,
}

#[derive(Debug, Clone)]
pub struct LearningAgent {
    pub id: AgentId,
    rl_space: RlSpaceType,
    policy: PolicyType,
    learning: LearningMode,
    q_table: QTable,
    history: History,
    alpha: f32,
    gamma: f32,
    rng: StdRng,
}

impl LearningAgent {
    pub fn new(
        id: AgentId,
        rl_space: RlSpaceType,
        policy: PolicyType,
        init_world: &World,
        alpha: f32,
        gamma: f32,
        seed: u64,
    ) -> Self {
        LearningAgent {
            id,
            rl_space,
            policy,
            learning: LearningMode::default(),
            q_table: QTable::new(rl_space.shape()),
            history: History::new(rl_space.map_state(init_world, id)),
            alpha,
            gamma,
            rng: policy_rng(seed, id, 3),
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn learning(&self) -> LearningMode {
        self.learning
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    pub fn set_policy(&mut self, policy: PolicyType) {
        self.policy = policy;
    }

    pub fn set_learning(&mut self, learning: LearningMode) {
        self.learning = learning;
    }

    /// Asks the policy for the next action and records it against the current turn.
    pub fn choose_action(&mut self, world: &World) -> Result<Action, Error> {
        let state = self.rl_space.map_state(world, self.id);
        let action = self
            .policy
            .choose_action(world, &state, &self.q_table)
            .ok_or(Error::NoApplicableAction(self.id))?;
        self.history.set_action(action);
        Ok(action)
    }

    /// Records the outcome of the last action and learns from it.
    pub fn update(&mut self, world: &World, reward: Reward) {
        let next_state = self.rl_space.map_state(world, self.id);
        self.history.advance(next_state, reward);
        match self.learning {
            LearningMode::QLearning => self.update_q_learning(world),
            LearningMode::Sarsa if self.history.len() > 2 => self.update_sarsa(),
            LearningMode::Sarsa => {}
        }
        self.history.prune();
    }

    fn update_q_learning(&mut self, world: &World) {
        let (Some(prev), Some(current)) = (self.history.back(1), self.history.back(0)) else {
            return;
        };
        let Some(action) = prev.action else {
            debug!("{}: no action recorded for last turn, skipping update", self.id);
            return;
        };
        let next_actions = applicable_actions(self.id, world);
        self.q_table.q_learning_update(
            &prev.state,
            action,
            prev.reward,
            &current.state,
            &next_actions,
            self.alpha,
            self.gamma,
        );
    }

    fn update_sarsa(&mut self) {
        let (Some(prev), Some(current)) = (self.history.back(2), self.history.back(1)) else {
            return;
        };
        let (Some(action), Some(next_action)) = (prev.action, current.action) else {
            debug!("{}: incomplete turns in history, skipping update", self.id);
            return;
        };
        self.q_table.sarsa_update(
            &prev.state,
            action,
            prev.reward,
            &current.state,
            next_action,
            self.alpha,
            self.gamma,
        );
    }

    /// Summarises the Q-table for visualisation by placing the agent in every
    /// cell of a scratch copy of `world`, with and without a block.
    pub fn extract_table(&mut self, world: &World) -> TableSnapshot {
        let mut scratch = world.clone();
        let actions: Vec<Action> = Action::iter().collect();
        let mut strength = vec![0.0; SNAPSHOT_LEN];
        let mut moves = vec![None; SNAPSHOT_LEN];
        for has_block in [true, false] {
            scratch.update_agent_carrying(self.id, has_block);
            for (x, y, z) in iproduct!(0..GRID_SIZE, 0..GRID_SIZE, 0..GRID_SIZE) {
                let index = x * 18 + y * 6 + z * 2 + has_block as usize;
                scratch.update_agent_loc(self.id, [x, y, z]);
                let state = self.rl_space.map_state(&scratch, self.id);
                if let Some((action, value)) =
                    self.q_table
                        .sample_best_action(&actions, &state, &mut self.rng)
                {
                    if value > 0.0 {
                        strength[index] = value;
                        moves[index] = Some(action);
                    }
                }
            }
        }
        TableSnapshot { strength, moves }
    }
}
