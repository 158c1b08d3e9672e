//! Escape probability and resolution
//!
//! Escape chance is a clamped percentage built from the hold depth, the
//! attacker's position, and the escaping unit's athleticism. The roll
//! itself goes through the injected roll source.

use crate::core::rng::RollSource;

use super::state::{GrappleInteraction, GrapplePosition, GrappleState};

pub const ESCAPE_CHANCE_MIN: i32 = 5;
pub const ESCAPE_CHANCE_MAX: i32 = 95;
/// Swing for fighting out from under (or on top of) the attacker
pub const POSITION_MODIFIER: i32 = 15;

/// Base escape chance by hold depth
pub fn base_escape_chance(state: GrappleState) -> i32 {
    match state {
        GrappleState::None => 100,
        GrappleState::Standing => 60,
        GrappleState::Ground => 40,
        GrappleState::Pinned => 25,
        GrappleState::Restrained => 15,
        GrappleState::Carried => 20,
        GrappleState::Submission => 10,
    }
}

/// Escape chance for the defender of an interaction.
///
/// Stat bonus is ((AGL + STR) / 2 - 5) * 2: an average athlete adds
/// nothing, a strong one buys real percentage.
pub fn escape_chance(
    state: GrappleState,
    attacker_position: GrapplePosition,
    agility: i32,
    strength: i32,
) -> i32 {
    let base = base_escape_chance(state);
    let position = match attacker_position {
        GrapplePosition::Top => -POSITION_MODIFIER,
        GrapplePosition::Bottom => POSITION_MODIFIER,
        GrapplePosition::Back | GrapplePosition::Side => 0,
    };
    let stat_bonus = ((agility + strength) / 2 - 5) * 2;
    (base + position + stat_bonus).clamp(ESCAPE_CHANCE_MIN, ESCAPE_CHANCE_MAX)
}

/// Outcome of an escape attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeAttempt {
    pub chance: i32,
    pub roll: i32,
    pub escaped: bool,
}

/// Roll the defender's escape. On success the interaction releases to None.
pub fn attempt_escape(
    grapple: &mut GrappleInteraction,
    agility: i32,
    strength: i32,
    rolls: &mut dyn RollSource,
) -> EscapeAttempt {
    let chance = escape_chance(grapple.state, grapple.attacker_position, agility, strength);
    let roll = rolls.d100();
    let escaped = roll < chance;
    if escaped {
        // Release is legal from every hold
        let _ = grapple.transition(GrappleState::None);
    }
    EscapeAttempt {
        chance,
        roll,
        escaped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::ScriptedRolls;
    use crate::core::UnitId;

    #[test]
    fn test_base_chances_tighten_with_depth() {
        assert!(base_escape_chance(GrappleState::Standing) > base_escape_chance(GrappleState::Ground));
        assert!(base_escape_chance(GrappleState::Ground) > base_escape_chance(GrappleState::Pinned));
        assert!(base_escape_chance(GrappleState::Pinned) > base_escape_chance(GrappleState::Restrained));
        assert!(base_escape_chance(GrappleState::Submission) < base_escape_chance(GrappleState::Restrained));
    }

    #[test]
    fn test_average_athlete_adds_nothing() {
        // AGL 5, STR 5: (5 - 5) * 2 = 0
        assert_eq!(
            escape_chance(GrappleState::Ground, GrapplePosition::Side, 5, 5),
            40
        );
    }

    #[test]
    fn test_position_modifier() {
        assert_eq!(
            escape_chance(GrappleState::Ground, GrapplePosition::Top, 5, 5),
            25
        );
        assert_eq!(
            escape_chance(GrappleState::Ground, GrapplePosition::Bottom, 5, 5),
            55
        );
    }

    #[test]
    fn test_stat_bonus() {
        // AGL 8, STR 8: (8 - 5) * 2 = +6
        assert_eq!(
            escape_chance(GrappleState::Pinned, GrapplePosition::Side, 8, 8),
            31
        );
        // Weak and slow goes negative: (2 - 5) * 2 = -6
        assert_eq!(
            escape_chance(GrappleState::Pinned, GrapplePosition::Side, 2, 2),
            19
        );
    }

    #[test]
    fn test_chance_clamped() {
        assert_eq!(
            escape_chance(GrappleState::Standing, GrapplePosition::Bottom, 20, 20),
            95
        );
        assert_eq!(
            escape_chance(GrappleState::Submission, GrapplePosition::Top, 0, 0),
            5
        );
    }

    #[test]
    fn test_successful_escape_releases() {
        let mut grapple = GrappleInteraction::new(UnitId::new(), UnitId::new());
        grapple.transition(GrappleState::Ground).unwrap();
        let mut rolls = ScriptedRolls::new(&[0]);
        let attempt = attempt_escape(&mut grapple, 5, 5, &mut rolls);
        assert!(attempt.escaped);
        assert_eq!(grapple.state, GrappleState::None);
    }

    #[test]
    fn test_failed_escape_keeps_hold() {
        let mut grapple = GrappleInteraction::new(UnitId::new(), UnitId::new());
        grapple.transition(GrappleState::Ground).unwrap();
        let mut rolls = ScriptedRolls::new(&[99]);
        let attempt = attempt_escape(&mut grapple, 5, 5, &mut rolls);
        assert!(!attempt.escaped);
        assert_eq!(grapple.state, GrappleState::Ground);
    }
}
