//! Domain models for the Barn Tracker

mod blanketing;
mod horse;
mod inventory;
mod journal;
mod task;
mod weather;

pub use blanketing::*;
pub use horse::*;
pub use inventory::*;
pub use journal::*;
pub use task::*;
pub use weather::*;
