use serde::{Deserialize, Serialize};

use crate::Int;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub val: Int,
}

impl Reward {
    pub fn new(val: Int) -> Self {
        Reward { val }
    }
}
