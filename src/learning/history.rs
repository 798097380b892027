use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::learning::agent_state::RlState;
use crate::learning::reward::Reward;

/// Length past which the history is cut back.
pub const MAX_HISTORY: usize = 10;
/// Entries kept after a cut: enough for the next SARSA update.
pub const KEEP_HISTORY: usize = 2;

/// One turn: the state the agent was in, what it did there and what it earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SAR {
    pub state: RlState,
    pub action: Option<Action>,
    pub reward: Reward,
}

impl SAR {
    pub fn open(state: RlState) -> Self {
        SAR {
            state,
            action: None,
            reward: Reward::default(),
        }
    }
}

/// Rolling window of an agent's turns. The last entry is the turn in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    entries: Vec<SAR>,
}

impl History {
    pub fn new(initial: RlState) -> Self {
        History {
            entries: vec![SAR::open(initial)],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `n`th entry counting back from the newest (`0` is the newest).
    pub fn back(&self, n: usize) -> Option<&SAR> {
        self.entries.iter().rev().nth(n)
    }

    pub fn set_action(&mut self, action: Action) {
        if let Some(last) = self.entries.last_mut() {
            last.action = Some(action);
        }
    }

    /// Closes the current turn with its reward and opens one at `state`.
    pub fn advance(&mut self, state: RlState, reward: Reward) {
        if let Some(last) = self.entries.last_mut() {
            last.reward = reward;
        }
        self.entries.push(SAR::open(state));
    }

    pub fn prune(&mut self) {
        if self.entries.len() > MAX_HISTORY {
            let cut = self.entries.len() - KEEP_HISTORY;
            self.entries.drain(..cut);
        }
    }
}
