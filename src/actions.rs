use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::agent::AgentId;
use crate::world::cell::DROPOFF_CAPACITY;
use crate::world::{Location, MAX_COORD, World};

pub const NUM_ACTIONS: usize = 8;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
)]
pub enum Action {
    Pickup,
    Dropoff,
    N,
    S,
    E,
    W,
    U,
    D,
}

impl Action {
    /// Position of the action in the canonical ordering, used to index Q-tables.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Axis and direction of a move. E/W move along x, N/S along y, U/D along z.
    fn step(&self) -> Option<(usize, isize)> {
        match self {
            Action::E => Some((0, 1)),
            Action::W => Some((0, -1)),
            Action::N => Some((1, 1)),
            Action::S => Some((1, -1)),
            Action::U => Some((2, 1)),
            Action::D => Some((2, -1)),
            Action::Pickup | Action::Dropoff => None,
        }
    }

    /// The cell a move from `from` leads to, if it stays inside the grid.
    pub fn destination(&self, from: Location) -> Option<Location> {
        let (axis, dir) = self.step()?;
        let coord = from[axis].checked_add_signed(dir)?;
        if coord > MAX_COORD {
            return None;
        }
        let mut to = from;
        to[axis] = coord;
        Some(to)
    }

    /// Returns true if the agent may take this action in the given world.
    pub fn is_applicable(&self, agent: AgentId, world: &World) -> bool {
        let loc = world.get_location(agent);
        match self {
            Action::Pickup => {
                world.is_pickup(loc)
                    && !world.is_agent_carrying(agent)
                    && world.cell(loc).num_blocks() > 0
            }
            Action::Dropoff => {
                world.is_dropoff(loc)
                    && world.is_agent_carrying(agent)
                    && world.cell(loc).num_blocks() < DROPOFF_CAPACITY
            }
            _ => match self.destination(loc) {
                Some(to) => !world.cell(to).is_occupied(),
                None => false,
            },
        }
    }

    /// Applies the action's effect to the world. Inapplicable actions are no-ops.
    pub fn apply(&self, agent: AgentId, world: &mut World) {
        if !self.is_applicable(agent, world) {
            return;
        }
        let loc = world.get_location(agent);
        match self {
            Action::Pickup => {
                world.cell_mut(loc).remove_block();
                world.update_agent_carrying(agent, true);
            }
            Action::Dropoff => {
                world.cell_mut(loc).add_block();
                world.update_agent_carrying(agent, false);
            }
            _ => {
                if let Some(to) = self.destination(loc) {
                    world.cell_mut(loc).remove_agent(agent);
                    world.cell_mut(to).add_agent(agent);
                    world.update_agent_loc(agent, to);
                }
            }
        }
    }
}
