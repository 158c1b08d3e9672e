//! Combat unit state and guarded mutators
//!
//! All hp/ap/shield mutation goes through methods here. The scheduler
//! validates actions first and then calls in; nothing else writes these
//! fields directly.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ResolvedArmor, WeaponDef};
use crate::combat::status::{ap_penalty, StatusEffect};
use crate::core::{GridPos, Team, UnitId};

/// Primary attributes, roughly 1..=10 with 5 as the human baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    pub strength: i32,
    pub agility: i32,
    pub endurance: i32,
    pub melee: i32,
    pub marksmanship: i32,
    pub willpower: i32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            strength: 5,
            agility: 5,
            endurance: 5,
            melee: 5,
            marksmanship: 5,
            willpower: 5,
        }
    }
}

/// Cardinal facing, tracked for the host's presentation layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    North,
    East,
    #[default]
    South,
    West,
}

impl Facing {
    /// Facing from one tile toward another, dominant axis wins
    pub fn toward(from: GridPos, to: GridPos) -> Self {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx.abs() >= dy.abs() {
            if dx >= 0 {
                Facing::East
            } else {
                Facing::West
            }
        } else if dy >= 0 {
            Facing::South
        } else {
            Facing::North
        }
    }
}

/// Whether attacks are meant to kill or to put the target down breathing.
/// Stun mode only changes anything with a stun-capable weapon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageMode {
    #[default]
    Kill,
    Stun,
}

/// One fighting unit in an encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatUnit {
    pub id: UnitId,
    pub name: String,
    pub team: Team,
    pub pos: GridPos,
    pub facing: Facing,
    pub hp: i32,
    pub max_hp: i32,
    pub ap: i32,
    pub max_ap: i32,
    pub shield: i32,
    pub max_shield: i32,
    pub shield_regen: i32,
    /// Set when the shield takes a hit; cleared at the unit's next turn
    shield_hit: bool,
    pub stats: UnitStats,
    /// Catalog query for the equipped weapon
    pub weapon: String,
    /// Catalog queries for every worn armor piece
    pub armor_pieces: Vec<String>,
    /// Consumables carried; each use removes one
    pub items: Vec<String>,
    /// Martial arts belt level, 1..=5
    pub belt_level: u8,
    pub damage_mode: DamageMode,
    pub unconscious: bool,
    pub statuses: Vec<StatusEffect>,
}

impl CombatUnit {
    pub fn new(name: &str, team: Team, pos: GridPos) -> Self {
        Self {
            id: UnitId::new(),
            name: name.to_string(),
            team,
            pos,
            facing: Facing::default(),
            hp: 50,
            max_hp: 50,
            ap: 4,
            max_ap: 4,
            shield: 0,
            max_shield: 0,
            shield_regen: 0,
            shield_hit: false,
            stats: UnitStats::default(),
            weapon: "fists".to_string(),
            armor_pieces: Vec::new(),
            items: Vec::new(),
            belt_level: 1,
            damage_mode: DamageMode::default(),
            unconscious: false,
            statuses: Vec::new(),
        }
    }

    pub fn with_weapon(mut self, weapon: &str) -> Self {
        self.weapon = weapon.to_string();
        self
    }

    pub fn with_armor(mut self, piece: &str) -> Self {
        self.armor_pieces.push(piece.to_string());
        self
    }

    pub fn with_item(mut self, item: &str) -> Self {
        self.items.push(item.to_string());
        self
    }

    pub fn with_shield(mut self, max_shield: i32, regen: i32) -> Self {
        self.max_shield = max_shield;
        self.shield = max_shield;
        self.shield_regen = regen;
        self
    }

    pub fn with_stats(mut self, stats: UnitStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_belt(mut self, level: u8) -> Self {
        self.belt_level = level;
        self
    }

    pub fn with_damage_mode(mut self, mode: DamageMode) -> Self {
        self.damage_mode = mode;
        self
    }

    pub fn alive(&self) -> bool {
        self.hp > 0
    }

    /// Alive and conscious: still counts toward team eligibility
    pub fn can_fight(&self) -> bool {
        self.alive() && !self.unconscious
    }

    /// Resolve the equipped weapon, fail-closed
    pub fn weapon_def(&self, catalog: &Catalog) -> WeaponDef {
        catalog.weapon_or_default(&self.weapon)
    }

    /// Resolve worn armor into combined protection, fail-closed per piece
    pub fn resolved_armor(&self, catalog: &Catalog) -> ResolvedArmor {
        let pieces: Vec<_> = self
            .armor_pieces
            .iter()
            .map(|q| catalog.armor_or_default(q))
            .collect();
        ResolvedArmor::combine(&pieces)
    }

    /// Start-of-turn upkeep: AP refill and shield regeneration.
    ///
    /// The shield only regenerates if it was not hit since the unit's
    /// previous turn. Status ticking is the scheduler's job; it needs the
    /// resulting events.
    pub fn begin_turn(&mut self) {
        self.ap = (self.max_ap - ap_penalty(&self.statuses)).max(0);
        if !self.shield_hit && self.shield < self.max_shield {
            self.shield = (self.shield + self.shield_regen).min(self.max_shield);
        }
        self.shield_hit = false;
    }

    /// Spend shield first, then hit points. Returns damage hp actually lost.
    pub fn apply_impact(&mut self, shield_absorbed: i32, hp_damage: i32) -> i32 {
        if shield_absorbed > 0 {
            self.shield = (self.shield - shield_absorbed).max(0);
            self.shield_hit = true;
        }
        let lost = hp_damage.min(self.hp).max(0);
        self.hp -= lost;
        lost
    }

    /// Direct hp loss that bypasses shield and armor (status ticks, chokes)
    pub fn apply_direct_damage(&mut self, damage: i32) -> i32 {
        let lost = damage.min(self.hp).max(0);
        self.hp -= lost;
        lost
    }

    pub fn can_afford(&self, ap_cost: i32) -> bool {
        self.ap >= ap_cost
    }

    /// Deduct AP. Callers validate affordability first.
    pub fn spend_ap(&mut self, ap_cost: i32) {
        self.ap = (self.ap - ap_cost).max(0);
    }
}
