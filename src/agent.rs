use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The two agents sharing the world. Identities are fixed for the whole run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, Display,
)]
pub enum AgentId {
    #[strum(serialize = "F")]
    Female,
    #[strum(serialize = "M")]
    Male,
}

impl AgentId {
    /// The agent this one shares the world with.
    pub fn other(&self) -> AgentId {
        match self {
            AgentId::Female => AgentId::Male,
            AgentId::Male => AgentId::Female,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            AgentId::Female => 0,
            AgentId::Male => 1,
        }
    }
}
