//! Grapple state machine, martial arts techniques, and escapes

pub mod escape;
pub mod state;
pub mod technique;

pub use escape::{attempt_escape, escape_chance, EscapeAttempt};
pub use state::{ChokeKind, GrappleInteraction, GrapplePosition, GrappleState};
pub use technique::{
    technique_table, usable_techniques, FightingStyle, GrappleRole, Technique, TechniqueKind,
};
