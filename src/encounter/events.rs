//! Outbound engine events
//!
//! Every state change the host might care about becomes an event with a
//! human-readable description. The engine accumulates them; the host
//! drains the queue after each command.

use serde::{Deserialize, Serialize};

use crate::combat::{HitTier, StatusKind};
use crate::core::{GridPos, Round, Team, UnitId};
use crate::grapple::GrappleState;

use super::stats::CombatReport;

/// One engine event with its round and log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub round: Round,
    pub kind: EventKind,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    EncounterStarted {
        unit_count: usize,
    },
    RoundStarted {
        round: Round,
    },
    TurnChanged {
        unit: UnitId,
    },
    TurnSkipped {
        unit: UnitId,
    },
    UnitMoved {
        unit: UnitId,
        to: GridPos,
    },
    AttackResolved {
        attacker: UnitId,
        target: UnitId,
        weapon: String,
        tier: HitTier,
        damage: i32,
        /// Statuses this attack inflicted, empty when nothing took
        status_applied: Vec<StatusKind>,
    },
    TechniqueResolved {
        attacker: UnitId,
        target: UnitId,
        technique: String,
        damage: i32,
    },
    GrappleChanged {
        attacker: UnitId,
        defender: UnitId,
        state: GrappleState,
    },
    EscapeAttempted {
        unit: UnitId,
        escaped: bool,
    },
    StatusApplied {
        unit: UnitId,
        status: StatusKind,
    },
    StatusDamage {
        unit: UnitId,
        damage: i32,
    },
    UnitDamaged {
        unit: UnitId,
        shield_absorbed: i32,
        hp_damage: i32,
    },
    Knockback {
        unit: UnitId,
        tiles: i32,
    },
    ItemUsed {
        unit: UnitId,
        item: String,
    },
    UnitUnconscious {
        unit: UnitId,
    },
    UnitDied {
        unit: UnitId,
        /// None when the death came from status damage with no attacker
        killed_by: Option<UnitId>,
    },
    /// Narration with no structured payload beyond the actor
    LogEntry {
        unit: UnitId,
    },
    CombatEnded {
        winner: Option<Team>,
        report: Box<CombatReport>,
    },
}
