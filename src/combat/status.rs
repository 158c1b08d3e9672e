//! Status effects: application tables and per-round ticking
//!
//! Each damage subtype can carry one status. Application is chance-based
//! on a hit and guaranteed on a crit. Periodic damage bypasses shields and
//! armor entirely; it is already inside the body.

use serde::{Deserialize, Serialize};

use crate::catalog::{DamageSubtype, WeaponDef};
use crate::core::rng::RollSource;

use super::accuracy::HitTier;
use super::constants::SUPPRESSED_ACCURACY_PENALTY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Bleeding,
    Burning,
    Frozen,
    Stunned,
    Suppressed,
}

/// An active status instance on a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub remaining_rounds: i32,
    pub damage_per_round: i32,
    /// Added to damage_per_round after each tick (burning ramps up)
    pub escalation: i32,
}

/// What a weapon subtype can inflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSpec {
    pub kind: StatusKind,
    /// Percent chance on an ordinary hit
    pub chance: i32,
    pub damage_per_round: i32,
    pub escalation: i32,
    pub duration: i32,
    pub max_stacks: usize,
}

impl StatusSpec {
    fn instance(&self) -> StatusEffect {
        StatusEffect {
            kind: self.kind,
            remaining_rounds: self.duration,
            damage_per_round: self.damage_per_round,
            escalation: self.escalation,
        }
    }
}

/// Status a weapon can inflict, if any
pub fn weapon_status(weapon: &WeaponDef) -> Option<StatusSpec> {
    let by_subtype = match weapon.subtype {
        DamageSubtype::Slash | DamageSubtype::Pierce => Some(StatusSpec {
            kind: StatusKind::Bleeding,
            chance: 35,
            damage_per_round: 3,
            escalation: 0,
            duration: 3,
            max_stacks: 3,
        }),
        DamageSubtype::ApRounds => Some(StatusSpec {
            kind: StatusKind::Bleeding,
            chance: 25,
            damage_per_round: 2,
            escalation: 0,
            duration: 2,
            max_stacks: 3,
        }),
        DamageSubtype::Incendiary | DamageSubtype::Laser => Some(StatusSpec {
            kind: StatusKind::Burning,
            chance: 40,
            damage_per_round: 4,
            escalation: 2,
            duration: 3,
            max_stacks: 1,
        }),
        DamageSubtype::Cryo => Some(StatusSpec {
            kind: StatusKind::Frozen,
            chance: 30,
            damage_per_round: 0,
            escalation: 0,
            duration: 2,
            max_stacks: 1,
        }),
        DamageSubtype::Shock => Some(StatusSpec {
            kind: StatusKind::Stunned,
            chance: 25,
            damage_per_round: 0,
            escalation: 0,
            duration: 1,
            max_stacks: 1,
        }),
        DamageSubtype::Blast => Some(StatusSpec {
            kind: StatusKind::Stunned,
            chance: 30,
            damage_per_round: 0,
            escalation: 0,
            duration: 1,
            max_stacks: 1,
        }),
        DamageSubtype::Psionic => Some(StatusSpec {
            kind: StatusKind::Suppressed,
            chance: 35,
            damage_per_round: 0,
            escalation: 0,
            duration: 2,
            max_stacks: 1,
        }),
        DamageSubtype::Crush | DamageSubtype::Gunfire | DamageSubtype::Buckshot => None,
    };

    by_subtype.or(if weapon.stun_capable {
        Some(StatusSpec {
            kind: StatusKind::Stunned,
            chance: 30,
            damage_per_round: 0,
            escalation: 0,
            duration: 1,
            max_stacks: 1,
        })
    } else {
        None
    })
}

/// Roll for status application and push the instance if it takes.
///
/// Returns the kind applied, if any. Only a solid hit can inflict a
/// status; grazes deal reduced damage and nothing else. Crits skip the
/// roll entirely.
pub fn apply_weapon_status(
    weapon: &WeaponDef,
    tier: HitTier,
    statuses: &mut Vec<StatusEffect>,
    rolls: &mut dyn RollSource,
) -> Option<StatusKind> {
    if !matches!(tier, HitTier::Hit | HitTier::Crit) {
        return None;
    }
    let spec = weapon_status(weapon)?;
    let takes = tier.guarantees_status() || rolls.percent(spec.chance);
    if !takes {
        return None;
    }
    let stacks = statuses.iter().filter(|s| s.kind == spec.kind).count();
    if stacks >= spec.max_stacks {
        // At cap: refresh the shortest-lived stack instead of adding
        if let Some(existing) = statuses
            .iter_mut()
            .filter(|s| s.kind == spec.kind)
            .min_by_key(|s| s.remaining_rounds)
        {
            existing.remaining_rounds = existing.remaining_rounds.max(spec.duration);
        }
    } else {
        statuses.push(spec.instance());
    }
    Some(spec.kind)
}

/// Result of ticking statuses at the start of a unit's turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTick {
    /// Periodic damage to apply directly to hit points
    pub damage: i32,
    /// Kinds that expired this tick
    pub expired: Vec<StatusKind>,
}

/// Tick all statuses one round: apply periodic damage, escalate, expire.
pub fn tick_statuses(statuses: &mut Vec<StatusEffect>) -> StatusTick {
    let mut tick = StatusTick::default();
    for status in statuses.iter_mut() {
        tick.damage += status.damage_per_round;
        status.damage_per_round += status.escalation;
        status.remaining_rounds -= 1;
        if status.remaining_rounds <= 0 {
            tick.expired.push(status.kind);
        }
    }
    statuses.retain(|s| s.remaining_rounds > 0);
    tick
}

/// True if the unit loses its action this turn
pub fn is_stunned(statuses: &[StatusEffect]) -> bool {
    statuses.iter().any(|s| s.kind == StatusKind::Stunned)
}

/// Accuracy bias from active statuses (negative is worse)
pub fn accuracy_penalty(statuses: &[StatusEffect]) -> i32 {
    if statuses.iter().any(|s| s.kind == StatusKind::Suppressed) {
        -SUPPRESSED_ACCURACY_PENALTY
    } else {
        0
    }
}

/// AP reduction from active statuses
pub fn ap_penalty(statuses: &[StatusEffect]) -> i32 {
    if statuses.iter().any(|s| s.kind == StatusKind::Frozen) {
        2
    } else {
        0
    }
}
