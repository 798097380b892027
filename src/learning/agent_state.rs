//! Projections of the full world onto the smaller discrete state an agent learns over.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::agent::AgentId;
use crate::world::World;
use crate::world::cell::DROPOFF_CAPACITY;

/// Discrete learning state: one coordinate per dimension of the active [`StateShape`].
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlState(pub Vec<usize>);

/// Number of values each dimension of an [`RlState`] can take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateShape(pub Vec<usize>);

impl StateShape {
    /// Total number of distinct states.
    pub fn size(&self) -> usize {
        self.0.iter().product()
    }

    /// Row-major offset of the state.
    pub fn encode(&self, state: &RlState) -> usize {
        debug_assert_eq!(state.0.len(), self.0.len());
        self.0
            .iter()
            .zip(state.0.iter())
            .fold(0, |acc, (dim, coord)| {
                debug_assert!(coord < dim);
                acc * dim + coord
            })
    }
}

#[enum_dispatch]
pub trait RlSpace {
    /// The learning state of `agent` in `world`.
    fn map_state(&self, world: &World, agent: AgentId) -> RlState;
    /// Shape of the states produced by [`RlSpace::map_state`].
    fn shape(&self) -> StateShape;
}

fn own_position(world: &World, agent: AgentId) -> Vec<usize> {
    let [x, y, z] = world.get_location(agent);
    vec![x, y, z, world.is_agent_carrying(agent) as usize]
}

/// Position and carrying flag only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minimal;

impl RlSpace for Minimal {
    fn map_state(&self, world: &World, agent: AgentId) -> RlState {
        RlState(own_position(world, agent))
    }

    fn shape(&self) -> StateShape {
        StateShape(vec![3, 3, 3, 2])
    }
}

/// Adds the offset to the other agent, shifted into 0..5 per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relational;

impl RlSpace for Relational {
    fn map_state(&self, world: &World, agent: AgentId) -> RlState {
        let mut state = own_position(world, agent);
        let own = world.get_location(agent);
        let other = world.get_location(agent.other());
        state.extend(own.iter().zip(other.iter()).map(|(a, b)| a + 2 - b));
        RlState(state)
    }

    fn shape(&self) -> StateShape {
        StateShape(vec![3, 3, 3, 2, 5, 5, 5])
    }
}

/// Adds one flag per dropoff that still has room and per pickup that still has blocks.
/// The other agent is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAware;

impl RlSpace for ResourceAware {
    fn map_state(&self, world: &World, agent: AgentId) -> RlState {
        let repr = world.get_state_representation();
        let mut state = own_position(world, agent);
        state.extend(repr[8..12].iter().map(|d| (*d < DROPOFF_CAPACITY) as usize));
        state.extend(repr[12..14].iter().map(|p| (*p > 0) as usize));
        RlState(state)
    }

    fn shape(&self) -> StateShape {
        StateShape(vec![3, 3, 3, 2, 2, 2, 2, 2, 2, 2])
    }
}

#[enum_dispatch(RlSpace)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RlSpaceType {
    Minimal(Minimal),
    Relational(Relational),
    ResourceAware(ResourceAware),
}

/// Name of a mapper variant, as chosen in configuration.
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
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RlSpaceKind {
    #[strum(to_string = "minimal", serialize = "vs")]
    #[serde(alias = "vs")]
    Minimal,
    #[default]
    #[strum(to_string = "relational", serialize = "ss")]
    #[serde(alias = "ss")]
    Relational,
    #[strum(to_string = "resource_aware", serialize = "ms")]
    #[serde(alias = "ms")]
    ResourceAware,
}

impl From<RlSpaceKind> for RlSpaceType {
    fn from(kind: RlSpaceKind) -> Self {
        match kind {
            RlSpaceKind::Minimal => Minimal.into(),
            RlSpaceKind::Relational => Relational.into(),
            RlSpaceKind::ResourceAware => ResourceAware.into(),
        }
    }
}
