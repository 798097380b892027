use log::trace;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::actions::{Action, NUM_ACTIONS};
use crate::learning::agent_state::{RlState, StateShape};
use crate::learning::reward::Reward;

pub const INIT_Q_VALUE: f32 = 0.0;

/// Action-value estimates, one dense block of states per action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    shape: StateShape,
    tab: Vec<f32>,
}

impl QTable {
    pub fn new(shape: StateShape) -> Self {
        let tab = vec![INIT_Q_VALUE; NUM_ACTIONS * shape.size()];
        QTable { shape, tab }
    }

    pub fn shape(&self) -> &StateShape {
        &self.shape
    }

    fn offset(&self, action: Action, state: &RlState) -> usize {
        action.index() * self.shape.size() + self.shape.encode(state)
    }

    pub fn get(&self, action: Action, state: &RlState) -> f32 {
        self.tab[self.offset(action, state)]
    }

    pub fn set(&mut self, action: Action, state: &RlState, value: f32) {
        let idx = self.offset(action, state);
        self.tab[idx] = value;
    }

    /// Highest value among `actions` at `state`, or `None` if `actions` is empty.
    pub fn max_value(&self, actions: &[Action], state: &RlState) -> Option<f32> {
        actions
            .iter()
            .map(|a| self.get(*a, state))
            .reduce(f32::max)
    }

    /// All actions among `actions` that share the highest value at `state`.
    pub fn best_actions(&self, actions: &[Action], state: &RlState) -> Vec<Action> {
        match self.max_value(actions, state) {
            Some(best) => actions
                .iter()
                .copied()
                .filter(|a| self.get(*a, state) == best)
                .collect(),
            None => vec![],
        }
    }

    /// Picks uniformly among the highest-valued actions.
    pub fn sample_best_action<R: Rng + ?Sized>(
        &self,
        actions: &[Action],
        state: &RlState,
        rng: &mut R,
    ) -> Option<(Action, f32)> {
        let best = self.best_actions(actions, state);
        best.choose(rng).map(|a| (*a, self.get(*a, state)))
    }

    /// Q-learning: bootstraps from the best of the actions applicable at `next_state`.
    #[allow(clippy::too_many_arguments)]
    pub fn q_learning_update(
        &mut self,
        state: &RlState,
        action: Action,
        reward: Reward,
        next_state: &RlState,
        next_actions: &[Action],
        alpha: f32,
        gamma: f32,
    ) {
        let best_next = self.max_value(next_actions, next_state).unwrap_or(INIT_Q_VALUE);
        self.blend(state, action, reward, best_next, alpha, gamma);
    }

    /// SARSA: bootstraps from the action actually taken at `next_state`.
    #[allow(clippy::too_many_arguments)]
    pub fn sarsa_update(
        &mut self,
        state: &RlState,
        action: Action,
        reward: Reward,
        next_state: &RlState,
        next_action: Action,
        alpha: f32,
        gamma: f32,
    ) {
        let next_q = self.get(next_action, next_state);
        self.blend(state, action, reward, next_q, alpha, gamma);
    }

    fn blend(
        &mut self,
        state: &RlState,
        action: Action,
        reward: Reward,
        next_q: f32,
        alpha: f32,
        gamma: f32,
    ) {
        let old_q = self.get(action, state);
        let new_q = (1.0 - alpha) * old_q + alpha * (reward.val as f32 + gamma * next_q);
        trace!("Q[{action}][{:?}]: {old_q:.4} -> {new_q:.4}", state.0);
        self.set(action, state, new_q);
    }
}
