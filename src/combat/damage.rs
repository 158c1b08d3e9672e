//! Damage mitigation pipeline
//!
//! Order of operations is fixed: tier scaling, then shield absorption,
//! then DR adjusted for penetration, then stopping power for ballistic
//! impacts, then the chip floor. Shields are a separate pool; armor never
//! sees damage the shield ate.

use serde::{Deserialize, Serialize};

use crate::catalog::{ResolvedArmor, WeaponDef};

use super::accuracy::HitTier;
use super::constants::{KNOCKBACK_BASE_MASS, MIN_CHIP_DAMAGE};

/// Result of resolving one weapon impact against one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impact {
    pub tier: HitTier,
    /// Damage the shield absorbed
    pub shield_absorbed: i32,
    /// Damage that reached hit points after all mitigation
    pub hp_damage: i32,
    /// Damage beyond what the target had left
    pub overkill: i32,
    /// Tiles of knockback the host should apply, 0 for none
    pub knockback_tiles: i32,
    /// Area radius for the host to expand, 0 for single-target
    pub blast_radius: i32,
}

impl Impact {
    pub fn whiff(tier: HitTier) -> Self {
        Self {
            tier,
            shield_absorbed: 0,
            hp_damage: 0,
            overkill: 0,
            knockback_tiles: 0,
            blast_radius: 0,
        }
    }
}

/// Resolve one impact. Pure; callers apply the result to unit state.
///
/// `target_hp` is the target's hit points before this impact and only
/// feeds the overkill figure.
pub fn resolve_impact(
    weapon: &WeaponDef,
    tier: HitTier,
    armor: &ResolvedArmor,
    shield: i32,
    target_hp: i32,
    target_strength: i32,
) -> Impact {
    let scaled = tier.scale(weapon.base_damage);
    if scaled <= 0 {
        return Impact::whiff(tier);
    }

    let shield_absorbed = shield.min(scaled);
    let through = scaled - shield_absorbed;

    let family = weapon.family();
    let hp_damage = if through > 0 {
        // Penetration divides DR; content with 0 is normalized at load
        let pen = if weapon.penetration_mult > 0.0 {
            weapon.penetration_mult
        } else {
            1.0
        };
        let effective_dr = (armor.dr(family.channel()) as f32 / pen).round() as i32;
        let mut after = through - effective_dr;
        if family.is_ballistic() {
            after -= armor.stopping_power;
        }
        // Solid hits that reached armor always chip through
        let floor = match tier {
            HitTier::Hit | HitTier::Crit => MIN_CHIP_DAMAGE,
            _ => 0,
        };
        after.max(floor)
    } else {
        0
    };

    let overkill = (hp_damage - target_hp).max(0);

    // Only solid hits transfer enough momentum to move or scatter
    let solid = matches!(tier, HitTier::Hit | HitTier::Crit);
    let knockback_tiles = if solid && weapon.knockback_force > 0 {
        weapon.knockback_force / (KNOCKBACK_BASE_MASS + target_strength.max(0))
    } else {
        0
    };

    Impact {
        tier,
        shield_absorbed,
        hp_damage,
        overkill,
        knockback_tiles,
        blast_radius: if solid { weapon.blast_radius } else { 0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ArmorDef, DamageSubtype, WeaponCategory};
    use proptest::prelude::*;

    fn test_weapon(base_damage: i32, subtype: DamageSubtype, pen: f32) -> WeaponDef {
        WeaponDef {
            id: "test".to_string(),
            name: "Test".to_string(),
            category: WeaponCategory::Rifle,
            base_damage,
            range: 10,
            accuracy_shift: 0,
            attack_speed: 1.0,
            subtype,
            penetration_mult: pen,
            knockback_force: 0,
            blast_radius: 0,
            magazine: 10,
            stun_capable: false,
        }
    }

    fn armor_dr(dr_physical: i32, stopping_power: i32) -> ResolvedArmor {
        ResolvedArmor {
            dr_physical,
            stopping_power,
            ..ResolvedArmor::default()
        }
    }

    #[test]
    fn test_reference_case_30_base_dr_10() {
        // base 30, pen 1.0, DR 10, SP 0, solid hit: 30 - 10 = 20
        let weapon = test_weapon(30, DamageSubtype::Slash, 1.0);
        let impact = resolve_impact(&weapon, HitTier::Hit, &armor_dr(10, 0), 0, 100, 5);
        assert_eq!(impact.hp_damage, 20);
        assert_eq!(impact.overkill, 0);
    }

    #[test]
    fn test_miss_deals_nothing() {
        let weapon = test_weapon(30, DamageSubtype::Slash, 1.0);
        let impact = resolve_impact(&weapon, HitTier::Miss, &armor_dr(0, 0), 50, 100, 5);
        assert_eq!(impact.shield_absorbed, 0);
        assert_eq!(impact.hp_damage, 0);
    }

    #[test]
    fn test_shield_absorbs_first() {
        let weapon = test_weapon(30, DamageSubtype::Slash, 1.0);
        // 12-point shield eats 12, 18 continue into DR 10 armor
        let impact = resolve_impact(&weapon, HitTier::Hit, &armor_dr(10, 0), 12, 100, 5);
        assert_eq!(impact.shield_absorbed, 12);
        assert_eq!(impact.hp_damage, 8);
    }

    #[test]
    fn test_shield_fully_absorbs() {
        let weapon = test_weapon(30, DamageSubtype::Slash, 1.0);
        let impact = resolve_impact(&weapon, HitTier::Hit, &armor_dr(0, 0), 50, 100, 5);
        assert_eq!(impact.shield_absorbed, 30);
        // Nothing reached armor, so no chip floor either
        assert_eq!(impact.hp_damage, 0);
    }

    #[test]
    fn test_penetration_divides_dr() {
        // pen 2.0 halves DR 10 to 5: 30 - 5 = 25
        let weapon = test_weapon(30, DamageSubtype::Slash, 2.0);
        let impact = resolve_impact(&weapon, HitTier::Hit, &armor_dr(10, 0), 0, 100, 5);
        assert_eq!(impact.hp_damage, 25);
    }

    #[test]
    fn test_stopping_power_ballistic_only() {
        let gun = test_weapon(30, DamageSubtype::Gunfire, 1.0);
        let blade = test_weapon(30, DamageSubtype::Slash, 1.0);
        let armor = armor_dr(10, 8);
        assert_eq!(
            resolve_impact(&gun, HitTier::Hit, &armor, 0, 100, 5).hp_damage,
            12
        );
        assert_eq!(
            resolve_impact(&blade, HitTier::Hit, &armor, 0, 100, 5).hp_damage,
            20
        );
    }

    #[test]
    fn test_chip_floor_on_solid_hits() {
        // DR swallows everything, but a solid hit still chips 1 through
        let weapon = test_weapon(10, DamageSubtype::Gunfire, 1.0);
        let impact = resolve_impact(&weapon, HitTier::Hit, &armor_dr(50, 20), 0, 100, 5);
        assert_eq!(impact.hp_damage, MIN_CHIP_DAMAGE);
    }

    #[test]
    fn test_graze_can_mitigate_to_zero() {
        let weapon = test_weapon(10, DamageSubtype::Gunfire, 1.0);
        let impact = resolve_impact(&weapon, HitTier::Graze, &armor_dr(50, 20), 0, 100, 5);
        assert_eq!(impact.hp_damage, 0);
    }

    #[test]
    fn test_overkill() {
        let weapon = test_weapon(30, DamageSubtype::Slash, 1.0);
        let impact = resolve_impact(&weapon, HitTier::Hit, &armor_dr(0, 0), 0, 12, 5);
        assert_eq!(impact.hp_damage, 30);
        assert_eq!(impact.overkill, 18);
    }

    #[test]
    fn test_knockback_scales_with_strength() {
        let mut weapon = test_weapon(30, DamageSubtype::Buckshot, 1.0);
        weapon.knockback_force = 80;
        let light = resolve_impact(&weapon, HitTier::Hit, &armor_dr(0, 0), 0, 100, 5);
        let heavy = resolve_impact(&weapon, HitTier::Hit, &armor_dr(0, 0), 0, 100, 50);
        assert_eq!(light.knockback_tiles, 2); // 80 / 35
        assert_eq!(heavy.knockback_tiles, 1); // 80 / 80
        // No knockback on a miss
        let miss = resolve_impact(&weapon, HitTier::Miss, &armor_dr(0, 0), 0, 100, 5);
        assert_eq!(miss.knockback_tiles, 0);
    }

    #[test]
    fn test_graze_gets_no_knockback_or_blast() {
        let mut weapon = test_weapon(30, DamageSubtype::Blast, 1.0);
        weapon.knockback_force = 80;
        weapon.blast_radius = 3;
        let graze = resolve_impact(&weapon, HitTier::Graze, &armor_dr(0, 0), 0, 100, 5);
        assert!(graze.hp_damage > 0);
        assert_eq!(graze.knockback_tiles, 0);
        assert_eq!(graze.blast_radius, 0);
        let hit = resolve_impact(&weapon, HitTier::Hit, &armor_dr(0, 0), 0, 100, 5);
        assert_eq!(hit.knockback_tiles, 2);
        assert_eq!(hit.blast_radius, 3);
    }

    proptest! {
        #[test]
        fn prop_damage_never_negative(
            base in 0i32..200,
            dr in 0i32..100,
            sp in 0i32..50,
            shield in 0i32..100,
        ) {
            let weapon = test_weapon(base, DamageSubtype::Gunfire, 1.0);
            let impact = resolve_impact(&weapon, HitTier::Hit, &armor_dr(dr, sp), shield, 100, 5);
            prop_assert!(impact.hp_damage >= 0);
            prop_assert!(impact.shield_absorbed >= 0);
            prop_assert!(impact.overkill >= 0);
        }

        #[test]
        fn prop_more_dr_never_more_damage(
            base in 0i32..200,
            dr in 0i32..100,
        ) {
            let weapon = test_weapon(base, DamageSubtype::Slash, 1.0);
            let low = resolve_impact(&weapon, HitTier::Hit, &armor_dr(dr, 0), 0, 1000, 5);
            let high = resolve_impact(&weapon, HitTier::Hit, &armor_dr(dr + 10, 0), 0, 1000, 5);
            prop_assert!(high.hp_damage <= low.hp_damage);
        }

        #[test]
        fn prop_higher_pen_never_less_damage(
            base in 0i32..200,
            dr in 0i32..100,
        ) {
            let low_pen = test_weapon(base, DamageSubtype::Slash, 1.0);
            let high_pen = test_weapon(base, DamageSubtype::Slash, 2.0);
            let a = resolve_impact(&low_pen, HitTier::Hit, &armor_dr(dr, 0), 0, 1000, 5);
            let b = resolve_impact(&high_pen, HitTier::Hit, &armor_dr(dr, 0), 0, 1000, 5);
            prop_assert!(b.hp_damage >= a.hp_damage);
        }
    }

    #[test]
    fn test_combined_armor_pieces_in_pipeline() {
        // Kevlar (5/SP6) + riot (10/SP5): DR 15, SP 6
        let armor = ResolvedArmor::combine(&[ArmorDef::kevlar_vest(), ArmorDef::riot_armor()]);
        let weapon = test_weapon(40, DamageSubtype::Gunfire, 1.0);
        let impact = resolve_impact(&weapon, HitTier::Hit, &armor, 0, 100, 5);
        assert_eq!(impact.hp_damage, 40 - 15 - 6);
    }
}
