//! Shared types, models and decision logic for the Barn Tracker
//!
//! This crate contains types shared between the backend, the mobile client
//! (via WASM), and other components of the system. Everything here is pure:
//! no I/O, no clocks, no global state.

pub mod error;
pub mod models;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
