//! Action selection: uniform random, greedy on the Q-table, and a mix of the two.

use enum_dispatch::enum_dispatch;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::actions::Action;
use crate::agent::AgentId;
use crate::learning::agent_state::RlState;
use crate::learning::q_table::QTable;
use crate::world::World;

/// Probability that [`ExploitPolicy`] acts greedily.
pub const EXPLOIT_PROB: f64 = 0.85;

/// Actions the agent may legally take in the world, in canonical order.
pub fn applicable_actions(agent: AgentId, world: &World) -> Vec<Action> {
    Action::iter()
        .filter(|a| a.is_applicable(agent, world))
        .collect()
}

/// Pickup or dropoff, whenever one is available.
fn forced_task(actions: &[Action]) -> Option<Action> {
    [Action::Pickup, Action::Dropoff]
        .into_iter()
        .find(|task| actions.contains(task))
}

/// Independent, reproducible random stream for one policy of one agent.
pub fn policy_rng(seed: u64, agent: AgentId, stream: u64) -> StdRng {
    StdRng::seed_from_u64(
        seed.wrapping_mul(1_000_003)
            .wrapping_add(stream * 2 + agent.index() as u64),
    )
}

#[enum_dispatch]
pub trait Policy {
    /// Chooses the owning agent's next action. `None` only if no action is legal.
    fn choose_action(&mut self, world: &World, state: &RlState, q_table: &QTable)
    -> Option<Action>;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct RandomPolicy {
    agent: AgentId,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(agent: AgentId, seed: u64) -> Self {
        RandomPolicy {
            agent,
            rng: policy_rng(seed, agent, 0),
        }
    }

    fn random(&mut self, world: &World) -> Option<Action> {
        let actions = applicable_actions(self.agent, world);
        forced_task(&actions).or_else(|| actions.choose(&mut self.rng).copied())
    }
}

impl Policy for RandomPolicy {
    fn choose_action(
        &mut self,
        world: &World,
        _state: &RlState,
        _q_table: &QTable,
    ) -> Option<Action> {
        self.random(world)
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[derive(Debug, Clone)]
pub struct GreedyPolicy {
    agent: AgentId,
    rng: StdRng,
}

impl GreedyPolicy {
    pub fn new(agent: AgentId, seed: u64) -> Self {
        GreedyPolicy {
            agent,
            rng: policy_rng(seed, agent, 1),
        }
    }

    fn greedy(&mut self, world: &World, state: &RlState, q_table: &QTable) -> Option<Action> {
        let actions = applicable_actions(self.agent, world);
        forced_task(&actions).or_else(|| {
            q_table
                .sample_best_action(&actions, state, &mut self.rng)
                .map(|(action, _)| action)
        })
    }
}

impl Policy for GreedyPolicy {
    fn choose_action(
        &mut self,
        world: &World,
        state: &RlState,
        q_table: &QTable,
    ) -> Option<Action> {
        self.greedy(world, state, q_table)
    }

    fn name(&self) -> &str {
        "greedy"
    }
}

/// Greedy with probability [`EXPLOIT_PROB`], random otherwise.
#[derive(Debug, Clone)]
pub struct ExploitPolicy {
    random: RandomPolicy,
    greedy: GreedyPolicy,
    rng: StdRng,
}

impl ExploitPolicy {
    pub fn new(agent: AgentId, seed: u64) -> Self {
        ExploitPolicy {
            random: RandomPolicy::new(agent, seed),
            greedy: GreedyPolicy::new(agent, seed),
            rng: policy_rng(seed, agent, 2),
        }
    }
}

impl Policy for ExploitPolicy {
    fn choose_action(
        &mut self,
        world: &World,
        state: &RlState,
        q_table: &QTable,
    ) -> Option<Action> {
        if self.rng.random::<f64>() < EXPLOIT_PROB {
            self.greedy.greedy(world, state, q_table)
        } else {
            self.random.random(world)
        }
    }

    fn name(&self) -> &str {
        "exploit"
    }
}

#[enum_dispatch(Policy)]
#[derive(Debug, Clone)]
pub enum PolicyType {
    Random(RandomPolicy),
    Greedy(GreedyPolicy),
    Exploit(ExploitPolicy),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Random,
    Greedy,
    Exploit,
}

impl PolicyKind {
    pub fn build(&self, agent: AgentId, seed: u64) -> PolicyType {
        match self {
            PolicyKind::Random => RandomPolicy::new(agent, seed).into(),
            PolicyKind::Greedy => GreedyPolicy::new(agent, seed).into(),
            PolicyKind::Exploit => ExploitPolicy::new(agent, seed).into(),
        }
    }
}
