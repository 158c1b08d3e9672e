//! Encounter layer: units, scheduling, statistics, AI, and the host bridge

pub mod ai;
pub mod bridge;
pub mod events;
pub mod scheduler;
pub mod stats;
pub mod unit;

pub use ai::{AiController, AiPersonality, CombatStyle, TargetPreference};
pub use bridge::{Command, Engine};
pub use events::{EngineEvent, EventKind};
pub use scheduler::{Action, EncounterState, Phase};
pub use stats::{CombatReport, CombatStats, KillRecord, UnitTally};
pub use unit::{CombatUnit, DamageMode, Facing, UnitStats};
