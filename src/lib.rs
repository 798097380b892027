pub mod actions;
pub mod agent;
pub mod config;
pub mod error;
pub mod learning;
pub mod simulation;
pub mod world;

pub type Int = i32;
pub type UInt = u32;
