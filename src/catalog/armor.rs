//! Armor definitions and multi-piece resolution
//!
//! Each piece carries three DR channels plus stopping power. When a unit
//! wears multiple pieces, DR channels sum but stopping power takes the
//! best single piece; two vests do not stack into a wall.

use serde::{Deserialize, Serialize};

use super::weapons::DamageChannel;

/// Broad armor classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmorCategory {
    Clothing,
    SoftArmor,
    HardArmor,
    PoweredArmor,
    HazardSuit,
}

/// Complete armor record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorDef {
    pub id: String,
    pub name: String,
    pub category: ArmorCategory,
    pub dr_physical: i32,
    pub dr_energy: i32,
    pub dr_mental: i32,
    /// Flat post-DR reduction against ballistic impacts
    pub stopping_power: i32,
    pub movement_penalty: i32,
    pub stealth_penalty: i32,
    pub condition_max: i32,
}

impl ArmorDef {
    fn base(id: &str, name: &str, category: ArmorCategory) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            dr_physical: 0,
            dr_energy: 0,
            dr_mental: 0,
            stopping_power: 0,
            movement_penalty: 0,
            stealth_penalty: 0,
            condition_max: 100,
        }
    }

    /// Zero-effect default used when a lookup fails closed
    pub fn none() -> Self {
        Self::base("none", "Unarmored", ArmorCategory::Clothing)
    }

    pub fn leather_jacket() -> Self {
        Self {
            dr_physical: 2,
            ..Self::base("leather_jacket", "Leather Jacket", ArmorCategory::Clothing)
        }
    }

    pub fn kevlar_vest() -> Self {
        Self {
            dr_physical: 5,
            stopping_power: 6,
            stealth_penalty: 1,
            ..Self::base("kevlar_vest", "Kevlar Vest", ArmorCategory::SoftArmor)
        }
    }

    pub fn tactical_vest() -> Self {
        Self {
            dr_physical: 7,
            dr_energy: 2,
            stopping_power: 8,
            movement_penalty: 1,
            stealth_penalty: 1,
            ..Self::base("tactical_vest", "Tactical Vest", ArmorCategory::SoftArmor)
        }
    }

    pub fn riot_armor() -> Self {
        Self {
            dr_physical: 10,
            dr_energy: 3,
            stopping_power: 5,
            movement_penalty: 2,
            stealth_penalty: 2,
            ..Self::base("riot_armor", "Riot Armor", ArmorCategory::HardArmor)
        }
    }

    pub fn swat_armor() -> Self {
        Self {
            dr_physical: 12,
            dr_energy: 4,
            stopping_power: 10,
            movement_penalty: 2,
            stealth_penalty: 2,
            ..Self::base("swat_armor", "SWAT Armor", ArmorCategory::HardArmor)
        }
    }

    pub fn combat_armor() -> Self {
        Self {
            dr_physical: 14,
            dr_energy: 6,
            dr_mental: 2,
            stopping_power: 12,
            movement_penalty: 2,
            stealth_penalty: 3,
            ..Self::base("combat_armor", "Combat Armor", ArmorCategory::HardArmor)
        }
    }

    pub fn military_armor() -> Self {
        Self {
            dr_physical: 16,
            dr_energy: 8,
            dr_mental: 2,
            stopping_power: 14,
            movement_penalty: 3,
            stealth_penalty: 3,
            ..Self::base("military_armor", "Military Armor", ArmorCategory::HardArmor)
        }
    }

    pub fn power_armor() -> Self {
        Self {
            dr_physical: 25,
            dr_energy: 18,
            dr_mental: 5,
            stopping_power: 20,
            movement_penalty: 1,
            stealth_penalty: 5,
            condition_max: 200,
            ..Self::base("power_armor", "Power Armor", ArmorCategory::PoweredArmor)
        }
    }

    pub fn eod_suit() -> Self {
        Self {
            dr_physical: 20,
            dr_energy: 10,
            stopping_power: 8,
            movement_penalty: 5,
            stealth_penalty: 5,
            condition_max: 150,
            ..Self::base("eod_suit", "EOD Suit", ArmorCategory::HardArmor)
        }
    }

    pub fn hazmat_suit() -> Self {
        Self {
            dr_physical: 1,
            dr_energy: 8,
            movement_penalty: 2,
            stealth_penalty: 2,
            ..Self::base("hazmat_suit", "Hazmat Suit", ArmorCategory::HazardSuit)
        }
    }

    pub fn fire_suit() -> Self {
        Self {
            dr_physical: 2,
            dr_energy: 12,
            movement_penalty: 2,
            stealth_penalty: 2,
            ..Self::base("fire_suit", "Fire Proximity Suit", ArmorCategory::HazardSuit)
        }
    }
}

impl Default for ArmorDef {
    fn default() -> Self {
        Self::none()
    }
}

/// Combined protection from every piece a unit wears
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArmor {
    pub dr_physical: i32,
    pub dr_energy: i32,
    pub dr_mental: i32,
    pub stopping_power: i32,
    pub movement_penalty: i32,
    pub stealth_penalty: i32,
}

impl ResolvedArmor {
    /// Sum DR channels and penalties, take the single best stopping power.
    pub fn combine(pieces: &[ArmorDef]) -> Self {
        let mut resolved = Self::default();
        for piece in pieces {
            resolved.dr_physical += piece.dr_physical;
            resolved.dr_energy += piece.dr_energy;
            resolved.dr_mental += piece.dr_mental;
            resolved.stopping_power = resolved.stopping_power.max(piece.stopping_power);
            resolved.movement_penalty += piece.movement_penalty;
            resolved.stealth_penalty += piece.stealth_penalty;
        }
        resolved
    }

    pub fn dr(&self, channel: DamageChannel) -> i32 {
        match channel {
            DamageChannel::Physical => self.dr_physical,
            DamageChannel::Energy => self.dr_energy,
            DamageChannel::Mental => self.dr_mental,
        }
    }
}
