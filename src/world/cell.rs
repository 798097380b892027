use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::Int;
use crate::UInt;
use crate::agent::AgentId;

/// Blocks a pickup cell starts with.
pub const PICKUP_SUPPLY: UInt = 10;
/// Blocks a dropoff cell can hold.
pub const DROPOFF_CAPACITY: UInt = 5;

pub const NORMAL_COST: Int = -1;
pub const RISK_COST: Int = -2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
pub enum CellType {
    #[default]
    Normal,
    Pickup,
    Dropoff,
    Risk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    cell_type: CellType,
    occupant: Option<AgentId>,
    num_blocks: UInt,
    cost: Int,
}

impl Default for Cell {
    fn default() -> Self {
        Cell::new(CellType::Normal)
    }
}

impl Cell {
    /// Pickup cells are stocked and risk cells are costlier to leave.
    pub fn new(cell_type: CellType) -> Self {
        Cell {
            cell_type,
            occupant: None,
            num_blocks: match cell_type {
                CellType::Pickup => PICKUP_SUPPLY,
                _ => 0,
            },
            cost: match cell_type {
                CellType::Risk => RISK_COST,
                _ => NORMAL_COST,
            },
        }
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn cost(&self) -> Int {
        self.cost
    }

    pub fn num_blocks(&self) -> UInt {
        self.num_blocks
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn occupant(&self) -> Option<AgentId> {
        self.occupant
    }

    /// Places the agent in the cell. Does nothing if the cell is already taken.
    pub fn add_agent(&mut self, agent: AgentId) {
        if self.occupant.is_none() {
            self.occupant = Some(agent);
        }
    }

    /// Removes the agent if it is the one in the cell.
    pub fn remove_agent(&mut self, agent: AgentId) {
        if self.occupant == Some(agent) {
            self.occupant = None;
        }
    }

    /// Adds a block to a dropoff cell with spare capacity.
    pub fn add_block(&mut self) {
        if self.cell_type == CellType::Dropoff && self.num_blocks < DROPOFF_CAPACITY {
            self.num_blocks += 1;
        }
    }

    /// Removes a block from a non-empty pickup cell.
    pub fn remove_block(&mut self) {
        if self.cell_type == CellType::Pickup && self.num_blocks > 0 {
            self.num_blocks -= 1;
        }
    }

    pub fn is_full(&self) -> bool {
        self.cell_type == CellType::Dropoff && self.num_blocks >= DROPOFF_CAPACITY
    }
}
