//! Martial arts techniques: records, built-in tables, eligibility
//!
//! A technique is usable when the belt gate, the positional gates, and the
//! transition table all agree. Role overlays are applied on top: the unit
//! being held always keeps its escapes, the unit holding always keeps its
//! submissions, and a defender flattened under top or back control loses
//! its own control moves.

use serde::{Deserialize, Serialize};

use super::state::{ChokeKind, GrapplePosition, GrappleState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FightingStyle {
    Grappling,
    Submission,
    Striking,
    Counter,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechniqueKind {
    Strike,
    Takedown,
    Control,
    Submission,
    Escape,
}

/// Complete technique record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    pub id: String,
    pub name: String,
    pub style: FightingStyle,
    pub kind: TechniqueKind,
    /// Minimum belt level to know this technique
    pub min_level: u8,
    pub ap_cost: i32,
    pub damage: i32,
    pub requires_grapple: bool,
    pub requires_standing: bool,
    pub requires_prone: bool,
    pub requires_restrained: bool,
    /// Grapple state this technique drives the interaction into
    pub sets_state: Option<GrappleState>,
    pub choke: Option<ChokeKind>,
}

/// Which side of a grapple the acting unit is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrappleRole {
    Attacker,
    Defender,
    /// Not in any grapple
    Neutral,
}

impl Technique {
    fn base(id: &str, name: &str, style: FightingStyle, kind: TechniqueKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            style,
            kind,
            min_level: 1,
            ap_cost: 1,
            damage: 0,
            requires_grapple: false,
            requires_standing: false,
            requires_prone: false,
            requires_restrained: false,
            sets_state: None,
            choke: None,
        }
    }

    /// Positional and belt gates, ignoring role overlays.
    pub fn is_usable(&self, belt_level: u8, state: GrappleState) -> bool {
        if belt_level < self.min_level {
            return false;
        }
        if self.requires_grapple && state == GrappleState::None {
            return false;
        }
        if self.requires_standing && state.is_grounded() {
            return false;
        }
        if self.requires_prone && !state.is_grounded() {
            return false;
        }
        if self.requires_restrained && state != GrappleState::Restrained {
            return false;
        }
        if let Some(target) = self.sets_state {
            if !state.can_transition_to(target) {
                return false;
            }
        }
        true
    }
}

/// Built-in technique table
pub fn technique_table() -> Vec<Technique> {
    use FightingStyle::*;
    use TechniqueKind::*;

    vec![
        // Striking
        Technique {
            damage: 4,
            requires_standing: true,
            ..Technique::base("jab", "Jab", Striking, Strike)
        },
        Technique {
            damage: 6,
            requires_standing: true,
            ..Technique::base("cross", "Cross", Striking, Strike)
        },
        Technique {
            min_level: 2,
            damage: 8,
            requires_grapple: true,
            ..Technique::base("elbow_strike", "Elbow Strike", Striking, Strike)
        },
        Technique {
            min_level: 2,
            damage: 9,
            requires_grapple: true,
            requires_standing: true,
            ..Technique::base("knee_strike", "Knee Strike", Striking, Strike)
        },
        Technique {
            min_level: 2,
            ap_cost: 2,
            damage: 10,
            requires_grapple: true,
            requires_prone: true,
            ..Technique::base("ground_and_pound", "Ground and Pound", Striking, Strike)
        },
        // Grappling entries and rides
        Technique {
            sets_state: Some(GrappleState::Standing),
            ..Technique::base("clinch_entry", "Clinch Entry", Grappling, Takedown)
        },
        Technique {
            ap_cost: 2,
            damage: 5,
            sets_state: Some(GrappleState::Ground),
            ..Technique::base("double_leg", "Double Leg Takedown", Grappling, Takedown)
        },
        Technique {
            min_level: 2,
            ap_cost: 2,
            damage: 8,
            requires_grapple: true,
            requires_standing: true,
            sets_state: Some(GrappleState::Ground),
            ..Technique::base("hip_throw", "Hip Throw", Grappling, Takedown)
        },
        Technique {
            min_level: 2,
            ap_cost: 2,
            requires_grapple: true,
            requires_prone: true,
            sets_state: Some(GrappleState::Pinned),
            ..Technique::base("side_control", "Side Control", Grappling, Control)
        },
        Technique {
            min_level: 3,
            ap_cost: 2,
            requires_grapple: true,
            sets_state: Some(GrappleState::Restrained),
            ..Technique::base("wrist_restraint", "Wrist Restraint", Counter, Control)
        },
        Technique {
            min_level: 3,
            ap_cost: 2,
            requires_grapple: true,
            requires_restrained: true,
            sets_state: Some(GrappleState::Carried),
            ..Technique::base("fireman_carry", "Fireman Carry", Grappling, Control)
        },
        // Submissions
        Technique {
            min_level: 2,
            ap_cost: 2,
            requires_grapple: true,
            sets_state: Some(GrappleState::Submission),
            choke: Some(ChokeKind::Air),
            ..Technique::base(
                "guillotine",
                "Guillotine Choke",
                FightingStyle::Submission,
                TechniqueKind::Submission,
            )
        },
        Technique {
            min_level: 3,
            ap_cost: 2,
            requires_grapple: true,
            requires_prone: true,
            sets_state: Some(GrappleState::Submission),
            choke: Some(ChokeKind::Blood),
            ..Technique::base(
                "rear_naked_choke",
                "Rear Naked Choke",
                FightingStyle::Submission,
                TechniqueKind::Submission,
            )
        },
        Technique {
            min_level: 3,
            ap_cost: 2,
            damage: 12,
            requires_grapple: true,
            requires_prone: true,
            sets_state: Some(GrappleState::Submission),
            ..Technique::base("armbar", "Armbar", FightingStyle::Submission, TechniqueKind::Submission)
        },
        // Escapes
        Technique {
            requires_grapple: true,
            sets_state: Some(GrappleState::None),
            ..Technique::base("break_grip", "Break Grip", Counter, Escape)
        },
        Technique {
            requires_grapple: true,
            requires_prone: true,
            sets_state: Some(GrappleState::Standing),
            ..Technique::base("technical_standup", "Technical Standup", Counter, Escape)
        },
        Technique {
            min_level: 2,
            requires_grapple: true,
            requires_prone: true,
            sets_state: Some(GrappleState::Ground),
            ..Technique::base("bridge_roll", "Bridge and Roll", Counter, Escape)
        },
        // Internal
        Technique {
            min_level: 4,
            damage: 6,
            requires_grapple: true,
            ..Technique::base("pressure_point", "Pressure Point Strike", Internal, Strike)
        },
    ]
}

/// Filter the table down to what this unit can actually throw right now.
pub fn usable_techniques<'a>(
    table: &'a [Technique],
    belt_level: u8,
    role: GrappleRole,
    state: GrappleState,
    attacker_position: GrapplePosition,
) -> Vec<&'a Technique> {
    table
        .iter()
        .filter(|t| t.is_usable(belt_level, state))
        .filter(|t| match role {
            // The unit holding has nothing to escape from
            GrappleRole::Attacker => t.kind != TechniqueKind::Escape,
            GrappleRole::Defender => {
                if t.kind == TechniqueKind::Escape {
                    return true;
                }
                // Flattened under top or back control: no control moves
                let controlled = matches!(
                    attacker_position,
                    GrapplePosition::Top | GrapplePosition::Back
                ) && state.is_grounded();
                !(controlled && t.kind == TechniqueKind::Control)
            }
            GrappleRole::Neutral => {
                t.kind != TechniqueKind::Escape && t.kind != TechniqueKind::Submission
            }
        })
        .collect()
}
