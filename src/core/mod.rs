//! Shared types, errors, and the injectable roll source

pub mod error;
pub mod rng;
pub mod types;

pub use error::{EngineError, Result};
pub use rng::{RollSource, ScriptedRolls, SeededRolls};
pub use types::{GridPos, Round, Team, UnitId};
