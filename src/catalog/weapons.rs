//! Weapon definitions and the damage subtype taxonomy
//!
//! Every weapon carries a damage subtype; every subtype maps to exactly one
//! damage family. The family decides which armor channel mitigates it,
//! whether stopping power applies, and which status effect it can inflict.

use serde::{Deserialize, Serialize};

use crate::combat::constants::{ATTACK_AP_MAX, ATTACK_AP_MIN};

/// Broad weapon classification for loadout rules and AI flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponCategory {
    Unarmed,
    Melee,
    Pistol,
    Rifle,
    Shotgun,
    Heavy,
    Energy,
    Thrown,
}

/// Specific damage subtype carried by a weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageSubtype {
    Crush,
    Slash,
    Pierce,
    Gunfire,
    ApRounds,
    Buckshot,
    Blast,
    Incendiary,
    Laser,
    Cryo,
    Shock,
    Psionic,
}

/// Damage family a subtype resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageFamily {
    Blunt,
    Bladed,
    Ballistic,
    Explosive,
    Thermal,
    Cryo,
    Electric,
    Mental,
}

/// Armor mitigation channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageChannel {
    Physical,
    Energy,
    Mental,
}

impl DamageSubtype {
    /// Total mapping: every subtype belongs to exactly one family.
    pub fn family(&self) -> DamageFamily {
        match self {
            DamageSubtype::Crush => DamageFamily::Blunt,
            DamageSubtype::Slash | DamageSubtype::Pierce => DamageFamily::Bladed,
            DamageSubtype::Gunfire | DamageSubtype::ApRounds | DamageSubtype::Buckshot => {
                DamageFamily::Ballistic
            }
            DamageSubtype::Blast => DamageFamily::Explosive,
            DamageSubtype::Incendiary | DamageSubtype::Laser => DamageFamily::Thermal,
            DamageSubtype::Cryo => DamageFamily::Cryo,
            DamageSubtype::Shock => DamageFamily::Electric,
            DamageSubtype::Psionic => DamageFamily::Mental,
        }
    }
}

impl DamageFamily {
    /// Which armor DR channel mitigates this family
    pub fn channel(&self) -> DamageChannel {
        match self {
            DamageFamily::Blunt
            | DamageFamily::Bladed
            | DamageFamily::Ballistic
            | DamageFamily::Explosive => DamageChannel::Physical,
            DamageFamily::Thermal | DamageFamily::Cryo | DamageFamily::Electric => {
                DamageChannel::Energy
            }
            DamageFamily::Mental => DamageChannel::Mental,
        }
    }

    /// Stopping power only applies to projectile impacts
    pub fn is_ballistic(&self) -> bool {
        matches!(self, DamageFamily::Ballistic)
    }
}

/// Complete weapon record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDef {
    pub id: String,
    pub name: String,
    pub category: WeaponCategory,
    pub base_damage: i32,
    /// Maximum effective range in tiles
    pub range: i32,
    /// Accuracy column shift, -3..=3. Each step is worth 10 accuracy.
    pub accuracy_shift: i8,
    /// Relative swing/cycle speed; drives AP cost
    pub attack_speed: f32,
    pub subtype: DamageSubtype,
    /// Divides effective DR. Normalized to 1.0 when content says 0.
    pub penetration_mult: f32,
    /// Raw knockback force; 0 for no knockback
    pub knockback_force: i32,
    /// Area radius in tiles; 0 for single-target
    pub blast_radius: i32,
    /// Rounds per magazine; 0 for melee/unarmed
    pub magazine: i32,
    pub stun_capable: bool,
}

impl WeaponDef {
    /// AP cost of one attack with this weapon
    pub fn ap_cost(&self) -> i32 {
        ((1.0 + self.attack_speed).round() as i32).clamp(ATTACK_AP_MIN, ATTACK_AP_MAX)
    }

    pub fn family(&self) -> DamageFamily {
        self.subtype.family()
    }

    fn base(id: &str, name: &str, category: WeaponCategory, subtype: DamageSubtype) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            base_damage: 0,
            range: 1,
            accuracy_shift: 0,
            attack_speed: 1.0,
            subtype,
            penetration_mult: 1.0,
            knockback_force: 0,
            blast_radius: 0,
            magazine: 0,
            stun_capable: false,
        }
    }

    /// Zero-effect default used when a lookup fails closed
    pub fn none() -> Self {
        Self {
            base_damage: 0,
            attack_speed: 0.0,
            ..Self::base("none", "Nothing", WeaponCategory::Unarmed, DamageSubtype::Crush)
        }
    }

    pub fn fists() -> Self {
        Self {
            base_damage: 4,
            attack_speed: 0.5,
            ..Self::base("fists", "Fists", WeaponCategory::Unarmed, DamageSubtype::Crush)
        }
    }

    pub fn combat_knife() -> Self {
        Self {
            base_damage: 10,
            accuracy_shift: 1,
            attack_speed: 0.5,
            penetration_mult: 1.2,
            ..Self::base("combat_knife", "Combat Knife", WeaponCategory::Melee, DamageSubtype::Slash)
        }
    }

    pub fn stun_baton() -> Self {
        Self {
            base_damage: 6,
            attack_speed: 1.0,
            stun_capable: true,
            ..Self::base("stun_baton", "Stun Baton", WeaponCategory::Melee, DamageSubtype::Shock)
        }
    }

    pub fn service_pistol() -> Self {
        Self {
            base_damage: 18,
            range: 12,
            accuracy_shift: 0,
            attack_speed: 1.0,
            magazine: 12,
            ..Self::base("service_pistol", "Service Pistol", WeaponCategory::Pistol, DamageSubtype::Gunfire)
        }
    }

    pub fn revolver() -> Self {
        Self {
            base_damage: 26,
            range: 10,
            accuracy_shift: -1,
            attack_speed: 1.5,
            magazine: 6,
            knockback_force: 40,
            ..Self::base("revolver", "Revolver", WeaponCategory::Pistol, DamageSubtype::Gunfire)
        }
    }

    pub fn smg() -> Self {
        Self {
            base_damage: 14,
            range: 10,
            accuracy_shift: -1,
            attack_speed: 0.5,
            magazine: 30,
            ..Self::base("smg", "Submachine Gun", WeaponCategory::Rifle, DamageSubtype::Gunfire)
        }
    }

    pub fn assault_rifle() -> Self {
        Self {
            base_damage: 24,
            range: 20,
            accuracy_shift: 1,
            attack_speed: 1.0,
            magazine: 30,
            penetration_mult: 1.3,
            ..Self::base("assault_rifle", "Assault Rifle", WeaponCategory::Rifle, DamageSubtype::ApRounds)
        }
    }

    pub fn combat_shotgun() -> Self {
        Self {
            base_damage: 32,
            range: 6,
            accuracy_shift: 1,
            attack_speed: 1.5,
            magazine: 8,
            knockback_force: 80,
            ..Self::base("combat_shotgun", "Combat Shotgun", WeaponCategory::Shotgun, DamageSubtype::Buckshot)
        }
    }

    pub fn sniper_rifle() -> Self {
        Self {
            base_damage: 45,
            range: 40,
            accuracy_shift: 3,
            attack_speed: 3.0,
            magazine: 5,
            penetration_mult: 2.0,
            ..Self::base("sniper_rifle", "Sniper Rifle", WeaponCategory::Rifle, DamageSubtype::ApRounds)
        }
    }

    pub fn machine_gun() -> Self {
        Self {
            base_damage: 28,
            range: 24,
            accuracy_shift: -2,
            attack_speed: 2.0,
            magazine: 100,
            knockback_force: 50,
            ..Self::base("machine_gun", "Machine Gun", WeaponCategory::Heavy, DamageSubtype::Gunfire)
        }
    }

    pub fn laser_rifle() -> Self {
        Self {
            base_damage: 22,
            range: 25,
            accuracy_shift: 2,
            attack_speed: 1.0,
            magazine: 20,
            penetration_mult: 1.5,
            ..Self::base("laser_rifle", "Laser Rifle", WeaponCategory::Energy, DamageSubtype::Laser)
        }
    }

    pub fn cryo_projector() -> Self {
        Self {
            base_damage: 16,
            range: 8,
            accuracy_shift: 0,
            attack_speed: 1.5,
            magazine: 10,
            ..Self::base("cryo_projector", "Cryo Projector", WeaponCategory::Energy, DamageSubtype::Cryo)
        }
    }

    pub fn frag_grenade() -> Self {
        Self {
            base_damage: 40,
            range: 8,
            accuracy_shift: -1,
            attack_speed: 2.0,
            magazine: 1,
            knockback_force: 120,
            blast_radius: 2,
            ..Self::base("frag_grenade", "Frag Grenade", WeaponCategory::Thrown, DamageSubtype::Blast)
        }
    }

    pub fn incinerator() -> Self {
        Self {
            base_damage: 20,
            range: 5,
            accuracy_shift: 1,
            attack_speed: 2.0,
            magazine: 15,
            ..Self::base("incinerator", "Incinerator", WeaponCategory::Heavy, DamageSubtype::Incendiary)
        }
    }

    pub fn psi_lash() -> Self {
        Self {
            base_damage: 15,
            range: 10,
            accuracy_shift: 1,
            attack_speed: 1.0,
            magazine: 0,
            ..Self::base("psi_lash", "Psi Lash", WeaponCategory::Energy, DamageSubtype::Psionic)
        }
    }
}

impl Default for WeaponDef {
    fn default() -> Self {
        Self::fists()
    }
}
