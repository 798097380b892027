//! Turn scheduling and experiment phases.

use std::collections::VecDeque;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::actions::Action;
use crate::agent::AgentId;
use crate::config::Config;
use crate::error::Error;
use crate::learning::agent_state::RlSpaceType;
use crate::learning::learning_agent::{LearningAgent, LearningMode, TableSnapshot};
use crate::learning::policy::PolicyKind;
use crate::world::{Layout, World};
use crate::{Int, UInt};

/// The fixed experiment schedules.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
)]
pub enum ExperimentId {
    #[default]
    #[strum(serialize = "1a")]
    #[serde(rename = "1a")]
    Exp1a,
    #[strum(serialize = "1b")]
    #[serde(rename = "1b")]
    Exp1b,
    #[strum(serialize = "1c")]
    #[serde(rename = "1c")]
    Exp1c,
    #[strum(serialize = "2")]
    #[serde(rename = "2")]
    Exp2,
    #[strum(serialize = "3a")]
    #[serde(rename = "3a")]
    Exp3a,
    #[strum(serialize = "3b")]
    #[serde(rename = "3b")]
    Exp3b,
    #[strum(serialize = "4")]
    #[serde(rename = "4")]
    Exp4,
}

impl ExperimentId {
    pub fn alpha(&self) -> f32 {
        match self {
            ExperimentId::Exp3a => 0.1,
            ExperimentId::Exp3b => 0.5,
            _ => 0.3,
        }
    }

    /// Policy both agents move to at the switch step, if any.
    pub fn switch_policy(&self) -> Option<PolicyKind> {
        match self {
            ExperimentId::Exp1a => None,
            ExperimentId::Exp1b => Some(PolicyKind::Greedy),
            _ => Some(PolicyKind::Exploit),
        }
    }

    /// Learning mode both agents move to at the switch step, if any.
    pub fn switch_learning(&self) -> Option<LearningMode> {
        match self {
            ExperimentId::Exp2 => Some(LearningMode::Sarsa),
            _ => None,
        }
    }

    /// Number of terminal states after which the run ends, if bounded.
    pub fn terminal_limit(&self) -> Option<UInt> {
        match self {
            ExperimentId::Exp4 => Some(6),
            _ => None,
        }
    }

    /// Layout the world is rebuilt with after the `terminal_count`th terminal state.
    pub fn layout_after_terminal(&self, terminal_count: UInt) -> Layout {
        match self {
            ExperimentId::Exp4 if terminal_count >= 3 => Layout::Modified,
            _ => Layout::Original,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimState {
    Running,
    TerminalJustReached,
    Done,
}

/// Everything the run produces for analysis and replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub experiment: ExperimentId,
    pub seed: u64,
    /// Agent that moved on each turn.
    pub moving_agent: Vec<AgentId>,
    pub female_actions: Vec<Action>,
    pub male_actions: Vec<Action>,
    /// Reward earned on each turn.
    pub rewards: Vec<Int>,
    /// Manhattan distance between the agents after each turn.
    pub distances: Vec<usize>,
    /// Actions taken between consecutive terminal states.
    pub terminal_state_actions: Vec<UInt>,
    /// Turns worth a table snapshot: first full dropoff, terminal states, last turn.
    pub report_timings: Vec<UInt>,
    pub female_tables: Vec<TableSnapshot>,
    pub male_tables: Vec<TableSnapshot>,
}

pub struct Simulation {
    pub time: UInt,
    pub config: Config,
    pub world: World,
    agents: [LearningAgent; 2],
    queue: VecDeque<AgentId>,
    state: SimState,
    terminal_count: UInt,
    actions_since_terminal: UInt,
    first_dropoff_recorded: bool,
    pub record: SimulationRecord,
}

impl Simulation {
    pub fn new(config: Config) -> Self {
        let world = World::new(Layout::Original);
        let rl_space = RlSpaceType::from(config.rl_space);
        let agents = [AgentId::Female, AgentId::Male].map(|id| {
            LearningAgent::new(
                id,
                rl_space,
                PolicyKind::Random.build(id, config.seed),
                &world,
                config.alpha(),
                config.gamma,
                config.seed,
            )
        });
        let record = SimulationRecord {
            experiment: config.experiment,
            seed: config.seed,
            ..SimulationRecord::default()
        };
        Simulation {
            time: 0,
            config,
            world,
            agents,
            queue: VecDeque::from([AgentId::Female, AgentId::Male]),
            state: SimState::Running,
            terminal_count: 0,
            actions_since_terminal: 0,
            first_dropoff_recorded: false,
            record,
        }
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn terminal_count(&self) -> UInt {
        self.terminal_count
    }

    pub fn agent(&self, id: AgentId) -> &LearningAgent {
        &self.agents[id.index()]
    }

    /// Agents in the order they will move.
    pub fn turn_order(&self) -> Vec<AgentId> {
        self.queue.iter().copied().collect()
    }

    /// Runs a single turn: the agent at the head of the queue chooses, acts and learns.
    pub fn step_forward(&mut self) -> Result<SimState, Error> {
        if self.state == SimState::Done {
            return Ok(self.state);
        }
        let Some(id) = self.queue.pop_front() else {
            self.state = SimState::Done;
            return Ok(self.state);
        };
        self.state = SimState::Running;

        let agent = &mut self.agents[id.index()];
        let action = agent.choose_action(&self.world)?;
        let reward = self.world.perform_action(id, action);
        agent.update(&self.world, reward);
        self.time += 1;
        self.actions_since_terminal += 1;
        debug!(
            "Time: {:5} | Agent: {id} | Action: {action} | Reward: {}",
            self.time, reward.val
        );

        self.record.moving_agent.push(id);
        self.record.rewards.push(reward.val);
        if self.config.record_history {
            match id {
                AgentId::Female => self.record.female_actions.push(action),
                AgentId::Male => self.record.male_actions.push(action),
            }
        }
        if self.config.dump_tables {
            let snapshot = self.agents[id.index()].extract_table(&self.world);
            match id {
                AgentId::Female => self.record.female_tables.push(snapshot),
                AgentId::Male => self.record.male_tables.push(snapshot),
            }
        }
        if !self.first_dropoff_recorded && self.world.is_first_dropoff_filled() {
            info!("First dropoff filled at time {}", self.time);
            self.record.report_timings.push(self.time);
            self.first_dropoff_recorded = true;
        }
        self.record.distances.push(self.world.agent_distance());

        if self.world.is_complete() {
            self.on_terminal();
        } else {
            self.queue.push_back(id);
        }
        if self.state == SimState::Done {
            return Ok(self.state);
        }

        if self.time == self.config.switch_step {
            self.switch_phase();
        }
        if self.config.progress_interval > 0 && self.time % self.config.progress_interval == 0 {
            info!(
                "Time: {:5} | State: {:?}",
                self.time,
                self.world.get_state_representation()
            );
        }
        if self.time >= self.config.max_steps {
            self.record.report_timings.push(self.time);
            self.state = SimState::Done;
            info!(
                "Step budget reached. Total number of terminal states reached: {}",
                self.terminal_count
            );
        }
        Ok(self.state)
    }

    /// Runs turns until the experiment's stopping condition is met.
    pub fn run(&mut self) -> Result<&SimulationRecord, Error> {
        info!(
            "Experiment {} running with seed {}",
            self.config.experiment, self.config.seed
        );
        while self.step_forward()? != SimState::Done {}
        Ok(&self.record)
    }

    fn on_terminal(&mut self) {
        self.terminal_count += 1;
        self.state = SimState::TerminalJustReached;
        self.record.report_timings.push(self.time);
        self.record
            .terminal_state_actions
            .push(self.actions_since_terminal);
        info!(
            "Terminal state {} reached after {} actions",
            self.terminal_count, self.actions_since_terminal
        );
        self.actions_since_terminal = 0;

        if let Some(limit) = self.config.experiment.terminal_limit() {
            if self.terminal_count >= limit {
                self.state = SimState::Done;
                info!(
                    "Total number of terminal states reached: {}",
                    self.terminal_count
                );
                return;
            }
        }

        let layout = self
            .config
            .experiment
            .layout_after_terminal(self.terminal_count);
        if layout != self.world.layout() {
            info!("Pickup locations changed to {layout} layout");
        }
        self.world = World::new(layout);
        self.queue = VecDeque::from([AgentId::Female, AgentId::Male]);
    }

    fn switch_phase(&mut self) {
        let experiment = self.config.experiment;
        if let Some(kind) = experiment.switch_policy() {
            info!("Time {}: switching policy to {kind}", self.time);
            for agent in self.agents.iter_mut() {
                agent.set_policy(kind.build(agent.id, self.config.seed));
            }
        }
        if let Some(mode) = experiment.switch_learning() {
            info!("Time {}: switching learning to {mode}", self.time);
            for agent in self.agents.iter_mut() {
                agent.set_learning(mode);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::agent_state::RlSpaceKind;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn config(experiment: ExperimentId, seed: u64) -> Config {
        Config {
            experiment,
            seed,
            ..Config::default()
        }
    }

    fn fill_dropoffs(world: &mut World) {
        for loc in [[0, 0, 1], [0, 0, 2], [2, 0, 0], [2, 1, 2]] {
            for _ in 0..5 {
                world.cell_mut(loc).add_block();
            }
        }
    }

    #[test]
    fn test_experiment_names() {
        assert_eq!(ExperimentId::from_str("3b").unwrap(), ExperimentId::Exp3b);
        assert_eq!(ExperimentId::Exp4.to_string(), "4");
        assert!(ExperimentId::from_str("5").is_err());
        assert_eq!(ExperimentId::iter().count(), 7);
    }

    #[test]
    fn test_experiment_schedules() {
        assert_eq!(ExperimentId::Exp1a.switch_policy(), None);
        assert_eq!(ExperimentId::Exp1b.switch_policy(), Some(PolicyKind::Greedy));
        assert_eq!(ExperimentId::Exp3a.switch_policy(), Some(PolicyKind::Exploit));
        assert_eq!(ExperimentId::Exp2.switch_learning(), Some(LearningMode::Sarsa));
        assert_eq!(ExperimentId::Exp4.switch_learning(), None);
        assert_eq!(ExperimentId::Exp4.terminal_limit(), Some(6));
        assert_eq!(ExperimentId::Exp1c.terminal_limit(), None);
        assert_eq!(ExperimentId::Exp4.layout_after_terminal(2), Layout::Original);
        assert_eq!(ExperimentId::Exp4.layout_after_terminal(3), Layout::Modified);
        assert_eq!(ExperimentId::Exp2.layout_after_terminal(3), Layout::Original);
    }

    #[test]
    fn test_turns_rotate() {
        let mut sim = Simulation::new(config(ExperimentId::Exp1a, 1));
        assert_eq!(sim.turn_order(), vec![AgentId::Female, AgentId::Male]);
        sim.step_forward().unwrap();
        assert_eq!(sim.turn_order(), vec![AgentId::Male, AgentId::Female]);
        sim.step_forward().unwrap();
        assert_eq!(sim.turn_order(), vec![AgentId::Female, AgentId::Male]);
        assert_eq!(sim.record.moving_agent, vec![AgentId::Female, AgentId::Male]);
        assert_eq!(sim.time, 2);
    }

    #[test]
    fn test_terminal_resets_world_and_queue() {
        let mut sim = Simulation::new(config(ExperimentId::Exp1c, 1));
        sim.queue = VecDeque::from([AgentId::Male]);
        sim.actions_since_terminal = 37;
        fill_dropoffs(&mut sim.world);
        sim.on_terminal();

        assert_eq!(sim.state(), SimState::TerminalJustReached);
        assert_eq!(sim.terminal_count(), 1);
        assert_eq!(sim.turn_order(), vec![AgentId::Female, AgentId::Male]);
        assert_eq!(sim.world, World::new(Layout::Original));
        assert_eq!(sim.record.terminal_state_actions, vec![37]);
    }

    #[test]
    fn test_experiment_4_changes_layout_then_stops() {
        let mut sim = Simulation::new(config(ExperimentId::Exp4, 1));
        sim.terminal_count = 2;
        sim.on_terminal();
        assert_eq!(sim.world.layout(), Layout::Modified);
        assert_eq!(sim.state(), SimState::TerminalJustReached);

        sim.terminal_count = 5;
        sim.on_terminal();
        assert_eq!(sim.state(), SimState::Done);
        assert_eq!(sim.step_forward().unwrap(), SimState::Done);
        assert_eq!(sim.time, 0);
    }

    #[test]
    fn test_policy_switch_at_step() {
        let mut sim = Simulation::new(Config {
            switch_step: 10,
            ..config(ExperimentId::Exp2, 3)
        });
        for _ in 0..9 {
            sim.step_forward().unwrap();
        }
        assert_eq!(sim.agent(AgentId::Female).policy_name(), "random");
        sim.step_forward().unwrap();
        for id in AgentId::iter() {
            assert_eq!(sim.agent(id).policy_name(), "exploit");
            assert_eq!(sim.agent(id).learning(), LearningMode::Sarsa);
        }
    }

    #[test]
    fn test_experiment_1a_never_switches() {
        let mut sim = Simulation::new(Config {
            max_steps: 600,
            ..config(ExperimentId::Exp1a, 3)
        });
        sim.run().unwrap();
        assert_eq!(sim.agent(AgentId::Male).policy_name(), "random");
        assert_eq!(sim.agent(AgentId::Male).learning(), LearningMode::QLearning);
    }

    #[test]
    fn test_records_history_and_tables() {
        let mut sim = Simulation::new(Config {
            max_steps: 20,
            record_history: true,
            dump_tables: true,
            ..config(ExperimentId::Exp1a, 5)
        });
        let record = sim.run().unwrap();
        assert_eq!(record.rewards.len(), 20);
        assert_eq!(record.distances.len(), 20);
        assert_eq!(record.female_actions.len(), 10);
        assert_eq!(record.male_actions.len(), 10);
        assert_eq!(record.female_tables.len(), 10);
        assert_eq!(record.report_timings.last(), Some(&20));
    }

    #[test]
    fn test_random_run_is_reproducible() {
        let run = |seed| {
            let mut sim = Simulation::new(Config {
                max_steps: 10_000,
                ..config(ExperimentId::Exp1a, seed)
            });
            sim.run().unwrap();
            (sim.terminal_count(), sim.time, sim.record.clone())
        };
        let (terminals, steps, record) = run(7);
        assert_eq!(steps, 10_000);
        assert_eq!(record.rewards.len(), 10_000);
        assert_eq!(
            record.terminal_state_actions.len() as UInt,
            terminals
        );

        let (terminals_again, steps_again, record_again) = run(7);
        assert_eq!(terminals, terminals_again);
        assert_eq!(steps, steps_again);
        assert_eq!(record, record_again);
    }

    #[test]
    fn test_experiment_4_stops_after_six_terminal_states() {
        let mut sim = Simulation::new(Config {
            max_steps: 500_000,
            rl_space: RlSpaceKind::Minimal,
            ..config(ExperimentId::Exp4, 1)
        });
        sim.run().unwrap();
        assert_eq!(sim.state(), SimState::Done);
        assert_eq!(sim.terminal_count(), 6);
        assert!(sim.time < 500_000);
        assert_eq!(sim.record.terminal_state_actions.len(), 6);
        assert_eq!(
            sim.record.terminal_state_actions.iter().sum::<UInt>(),
            sim.time
        );
    }
}
