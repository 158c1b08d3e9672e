//! Grapple state machine
//!
//! Transitions come from a fixed table. An illegal transition is an error
//! and leaves the interaction untouched; there is no partial application.

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result, UnitId};

/// Grapple hold depth, roughly ordered by how trapped the defender is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrappleState {
    None,
    Standing,
    Ground,
    Pinned,
    Restrained,
    Carried,
    Submission,
}

/// Where the attacker is relative to the defender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrapplePosition {
    Top,
    Bottom,
    Back,
    Side,
}

/// Choke variety driving submission countdown speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChokeKind {
    /// Carotid restriction; fast
    Blood,
    /// Airway restriction; slower
    Air,
}

/// Turns of sustained pressure before a blood choke finishes
pub const BLOOD_CHOKE_TURNS: u32 = 3;
/// Turns of sustained pressure before an air choke finishes
pub const AIR_CHOKE_TURNS: u32 = 5;

impl ChokeKind {
    pub fn turns_to_finish(&self) -> u32 {
        match self {
            ChokeKind::Blood => BLOOD_CHOKE_TURNS,
            ChokeKind::Air => AIR_CHOKE_TURNS,
        }
    }
}

impl GrappleState {
    /// States reachable from this one
    pub fn allowed_transitions(&self) -> &'static [GrappleState] {
        use GrappleState::*;
        match self {
            None => &[Standing, Ground],
            Standing => &[None, Ground, Pinned],
            Ground => &[None, Standing, Pinned, Submission],
            Pinned => &[None, Ground, Restrained, Submission],
            Restrained => &[None, Pinned, Carried, Submission],
            Carried => &[None, Ground, Restrained],
            Submission => &[None, Ground, Pinned],
        }
    }

    pub fn can_transition_to(&self, to: GrappleState) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// The defender is on the ground in these states
    pub fn is_grounded(&self) -> bool {
        !matches!(self, GrappleState::None | GrappleState::Standing)
    }
}

/// One live grapple between two units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrappleInteraction {
    pub attacker: UnitId,
    pub defender: UnitId,
    pub state: GrappleState,
    pub attacker_position: GrapplePosition,
    /// Turns of sustained choke pressure so far
    pub submission_progress: u32,
    pub choke: Option<ChokeKind>,
    pub last_technique: Option<String>,
}

impl GrappleInteraction {
    /// A new grapple opens in the standing clinch.
    pub fn new(attacker: UnitId, defender: UnitId) -> Self {
        Self {
            attacker,
            defender,
            state: GrappleState::Standing,
            attacker_position: GrapplePosition::Side,
            submission_progress: 0,
            choke: None,
            last_technique: None,
        }
    }

    pub fn involves(&self, unit: UnitId) -> bool {
        self.attacker == unit || self.defender == unit
    }

    /// Apply a state transition, or fail without mutating anything.
    pub fn transition(&mut self, to: GrappleState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(EngineError::IllegalGrappleTransition {
                from: self.state,
                to,
            });
        }
        // Leaving submission releases the choke
        if self.state == GrappleState::Submission && to != GrappleState::Submission {
            self.choke = None;
            self.submission_progress = 0;
        }
        self.state = to;
        Ok(())
    }

    /// Advance the choke countdown one turn. True when it finishes.
    pub fn advance_submission(&mut self) -> bool {
        let Some(choke) = self.choke else {
            return false;
        };
        if self.state != GrappleState::Submission {
            return false;
        }
        self.submission_progress += 1;
        self.submission_progress >= choke.turns_to_finish()
    }
}
