//! The pickup/dropoff world: a 3x3x3 grid of cells shared by two agents.

use itertools::iproduct;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::actions::Action;
use crate::agent::AgentId;
use crate::learning::reward::Reward;
use crate::{Int, UInt};

pub mod cell;

use cell::{Cell, CellType, DROPOFF_CAPACITY};

pub const GRID_SIZE: usize = 3;
pub const MAX_COORD: usize = GRID_SIZE - 1;

/// Reward for a successful pickup or dropoff.
pub const TASK_REWARD: Int = 14;

/// (x, y, z) coordinates of a cell.
pub type Location = [usize; 3];

const FEMALE_START: Location = [0, 0, 0];
const MALE_START: Location = [2, 1, 2];
const DROPOFFS: [Location; 4] = [[0, 0, 1], [0, 0, 2], [2, 0, 0], [2, 1, 2]];
const RISKS: [Location; 2] = [[1, 1, 1], [2, 1, 0]];

/// Named placements of the pickup cells.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Original,
    Modified,
}

impl Layout {
    pub fn pickups(&self) -> [Location; 2] {
        match self {
            Layout::Original => [[1, 1, 0], [2, 2, 1]],
            Layout::Modified => [[0, 2, 0], [1, 2, 2]],
        }
    }
}

/// Flat snapshot `[xF, yF, zF, xM, yM, zM, carryF, carryM, d1..d4, p1, p2]`.
pub type StateRepresentation = [UInt; 14];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    layout: Layout,
    cells: [[[Cell; GRID_SIZE]; GRID_SIZE]; GRID_SIZE],
    locations: [Location; 2],
    carrying: [bool; 2],
    dropoffs: [Location; 4],
    pickups: [Location; 2],
}

impl World {
    pub fn new(layout: Layout) -> Self {
        let mut world = World {
            layout,
            cells: Default::default(),
            locations: [FEMALE_START, MALE_START],
            carrying: [false, false],
            dropoffs: DROPOFFS,
            pickups: layout.pickups(),
        };
        for loc in world.pickups {
            *world.cell_mut(loc) = Cell::new(CellType::Pickup);
        }
        for loc in world.dropoffs {
            *world.cell_mut(loc) = Cell::new(CellType::Dropoff);
        }
        for loc in RISKS {
            *world.cell_mut(loc) = Cell::new(CellType::Risk);
        }
        for agent in AgentId::iter() {
            let loc = world.get_location(agent);
            world.cell_mut(loc).add_agent(agent);
        }
        world
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn cell(&self, loc: Location) -> &Cell {
        &self.cells[loc[0]][loc[1]][loc[2]]
    }

    pub(crate) fn cell_mut(&mut self, loc: Location) -> &mut Cell {
        &mut self.cells[loc[0]][loc[1]][loc[2]]
    }

    pub fn get_location(&self, agent: AgentId) -> Location {
        self.locations[agent.index()]
    }

    /// Overwrites the agent's location register. Cell occupancy is left untouched.
    pub fn update_agent_loc(&mut self, agent: AgentId, loc: Location) {
        self.locations[agent.index()] = loc;
    }

    pub fn is_agent_carrying(&self, agent: AgentId) -> bool {
        self.carrying[agent.index()]
    }

    pub fn update_agent_carrying(&mut self, agent: AgentId, carrying: bool) {
        self.carrying[agent.index()] = carrying;
    }

    pub fn is_pickup(&self, loc: Location) -> bool {
        self.cell(loc).cell_type() == CellType::Pickup
    }

    pub fn is_dropoff(&self, loc: Location) -> bool {
        self.cell(loc).cell_type() == CellType::Dropoff
    }

    pub fn dropoff_blocks(&self) -> [UInt; 4] {
        self.dropoffs.map(|loc| self.cell(loc).num_blocks())
    }

    pub fn pickup_blocks(&self) -> [UInt; 2] {
        self.pickups.map(|loc| self.cell(loc).num_blocks())
    }

    /// Executes the action for the agent and returns its reward.
    ///
    /// Pickup and dropoff earn [`TASK_REWARD`]; anything else costs the cell
    /// the agent was standing on. An inapplicable action leaves the world
    /// untouched but is still rewarded as if taken.
    pub fn perform_action(&mut self, agent: AgentId, action: Action) -> Reward {
        let departed = self.get_location(agent);
        let cost = self.cell(departed).cost();
        action.apply(agent, self);
        match action {
            Action::Pickup | Action::Dropoff => Reward::new(TASK_REWARD),
            _ => Reward::new(cost),
        }
    }

    /// True once every dropoff cell is at capacity.
    pub fn is_complete(&self) -> bool {
        self.dropoff_blocks().iter().all(|n| *n == DROPOFF_CAPACITY)
    }

    /// True while exactly one dropoff cell is at capacity.
    pub fn is_first_dropoff_filled(&self) -> bool {
        self.dropoff_blocks()
            .iter()
            .filter(|n| **n >= DROPOFF_CAPACITY)
            .count()
            == 1
    }

    pub fn get_state_representation(&self) -> StateRepresentation {
        let [f, m] = self.locations;
        let [d1, d2, d3, d4] = self.dropoff_blocks();
        let [p1, p2] = self.pickup_blocks();
        [
            f[0] as UInt,
            f[1] as UInt,
            f[2] as UInt,
            m[0] as UInt,
            m[1] as UInt,
            m[2] as UInt,
            self.carrying[0] as UInt,
            self.carrying[1] as UInt,
            d1,
            d2,
            d3,
            d4,
            p1,
            p2,
        ]
    }

    /// Manhattan distance between the two agents.
    pub fn agent_distance(&self) -> usize {
        let [f, m] = self.locations;
        f.iter().zip(m.iter()).map(|(a, b)| a.abs_diff(*b)).sum()
    }

    /// Checks that the location registers agree with cell occupancy.
    pub fn is_consistent(&self) -> bool {
        iproduct!(0..GRID_SIZE, 0..GRID_SIZE, 0..GRID_SIZE).all(|(x, y, z)| {
            let loc = [x, y, z];
            match self.cell(loc).occupant() {
                Some(agent) => self.get_location(agent) == loc,
                None => AgentId::iter().all(|agent| self.get_location(agent) != loc),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_cells(world: &World, cell_type: CellType) -> usize {
        iproduct!(0..GRID_SIZE, 0..GRID_SIZE, 0..GRID_SIZE)
            .filter(|(x, y, z)| world.cell([*x, *y, *z]).cell_type() == cell_type)
            .count()
    }

    #[test]
    fn test_layouts() {
        for layout in Layout::iter() {
            let world = World::new(layout);
            assert_eq!(count_cells(&world, CellType::Pickup), 2);
            assert_eq!(count_cells(&world, CellType::Dropoff), 4);
            assert_eq!(count_cells(&world, CellType::Risk), 2);
            assert!(world.is_consistent());
        }
        let modified = World::new(Layout::Modified);
        assert!(modified.is_pickup([0, 2, 0]));
        assert!(modified.is_pickup([1, 2, 2]));
        assert!(!modified.is_pickup([1, 1, 0]));
        assert_eq!("modified".parse::<Layout>().unwrap(), Layout::Modified);
    }

    #[test]
    fn test_initial_state_representation() {
        let world = World::new(Layout::Original);
        assert_eq!(
            world.get_state_representation(),
            [0, 0, 0, 2, 1, 2, 0, 0, 0, 0, 0, 0, 10, 10]
        );
        assert_eq!(world.agent_distance(), 5);
    }

    #[test]
    fn test_male_scripted_pickup() {
        let mut world = World::new(Layout::Original);
        // Leaving a dropoff cell costs the normal amount.
        assert_eq!(world.perform_action(AgentId::Male, Action::N), Reward::new(-1));
        assert_eq!(world.perform_action(AgentId::Male, Action::D), Reward::new(-1));
        assert_eq!(world.get_location(AgentId::Male), [2, 2, 1]);

        let reward = world.perform_action(AgentId::Male, Action::Pickup);
        assert_eq!(reward, Reward::new(14));
        assert!(world.is_agent_carrying(AgentId::Male));
        assert_eq!(world.cell([2, 2, 1]).num_blocks(), 9);
        assert_eq!(world.pickup_blocks(), [10, 9]);
    }

    #[test]
    fn test_leaving_risk_cell_costs_more() {
        let mut world = World::new(Layout::Original);
        for action in [Action::E, Action::E, Action::N] {
            world.perform_action(AgentId::Female, action);
        }
        assert_eq!(world.get_location(AgentId::Female), [2, 1, 0]);
        assert_eq!(
            world.perform_action(AgentId::Female, Action::W),
            Reward::new(-2)
        );
    }

    #[test]
    fn test_illegal_action_is_noop_with_departure_cost() {
        let mut world = World::new(Layout::Original);
        let before = world.clone();
        assert_eq!(
            world.perform_action(AgentId::Female, Action::S),
            Reward::new(-1)
        );
        assert_eq!(world, before);
        // Failed pickups are still paid as pickups.
        assert_eq!(
            world.perform_action(AgentId::Female, Action::Pickup),
            Reward::new(14)
        );
        assert_eq!(world, before);
    }

    #[test]
    fn test_completion() {
        let mut world = World::new(Layout::Original);
        assert!(!world.is_complete());
        assert!(!world.is_first_dropoff_filled());

        for (i, loc) in DROPOFFS.iter().enumerate() {
            for _ in 0..5 {
                world.cell_mut(*loc).add_block();
            }
            assert_eq!(world.is_first_dropoff_filled(), i == 0);
            assert_eq!(world.is_complete(), i == 3);
        }
        assert_eq!(world.dropoff_blocks().iter().sum::<UInt>(), 20);
    }

    #[test]
    fn test_complete_needs_every_dropoff_full() {
        let mut world = World::new(Layout::Original);
        for loc in DROPOFFS {
            for _ in 0..4 {
                world.cell_mut(loc).add_block();
            }
        }
        assert!(!world.is_complete());
        assert!(!world.is_first_dropoff_filled());
    }
}
