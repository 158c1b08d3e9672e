//! Equipment lookup: exact tables first, ordered substring rules second
//!
//! Content files and scripts refer to gear loosely ("officer's pistol",
//! "heavy riot shield armor"). Resolution is deterministic: exact id, then
//! exact name, then alias, then the first matching substring rule. Rules
//! are ordered most-specific-first so "laser rifle" never falls through to
//! the plain rifle entry.

use ahash::AHashMap;
use tracing::warn;

use crate::core::{EngineError, Result};

use super::armor::ArmorDef;
use super::weapons::WeaponDef;

#[derive(Clone)]
struct LookupTable<T> {
    by_id: AHashMap<String, T>,
    // lowercase name -> id
    by_name: AHashMap<String, String>,
    aliases: AHashMap<String, String>,
    // (lowercase substring, id), evaluated in order, first match wins
    patterns: Vec<(String, String)>,
}

impl<T> LookupTable<T> {
    fn new() -> Self {
        Self {
            by_id: AHashMap::new(),
            by_name: AHashMap::new(),
            aliases: AHashMap::new(),
            patterns: Vec::new(),
        }
    }

    fn resolve(&self, query: &str) -> Option<&T> {
        if let Some(def) = self.by_id.get(query) {
            return Some(def);
        }
        let lowered = query.to_lowercase();
        if let Some(id) = self.by_name.get(&lowered) {
            return self.by_id.get(id);
        }
        if let Some(id) = self.aliases.get(&lowered) {
            return self.by_id.get(id);
        }
        for (pattern, id) in &self.patterns {
            if lowered.contains(pattern.as_str()) {
                return self.by_id.get(id);
            }
        }
        None
    }
}

/// Built-in equipment catalog
#[derive(Clone)]
pub struct Catalog {
    weapons: LookupTable<WeaponDef>,
    armor: LookupTable<ArmorDef>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let mut catalog = Self {
            weapons: LookupTable::new(),
            armor: LookupTable::new(),
        };

        for def in [
            WeaponDef::none(),
            WeaponDef::fists(),
            WeaponDef::combat_knife(),
            WeaponDef::stun_baton(),
            WeaponDef::service_pistol(),
            WeaponDef::revolver(),
            WeaponDef::smg(),
            WeaponDef::assault_rifle(),
            WeaponDef::combat_shotgun(),
            WeaponDef::sniper_rifle(),
            WeaponDef::machine_gun(),
            WeaponDef::laser_rifle(),
            WeaponDef::cryo_projector(),
            WeaponDef::frag_grenade(),
            WeaponDef::incinerator(),
            WeaponDef::psi_lash(),
        ] {
            catalog.add_weapon(def);
        }

        catalog.weapon_alias("9mm", "service_pistol");
        catalog.weapon_alias("sidearm", "service_pistol");
        catalog.weapon_alias("ar", "assault_rifle");
        catalog.weapon_alias("lmg", "machine_gun");
        catalog.weapon_alias("flamethrower", "incinerator");
        catalog.weapon_alias("unarmed", "fists");

        // Most specific first. "sniper" and "laser" must beat "rifle".
        for (pattern, id) in [
            ("sniper", "sniper_rifle"),
            ("laser", "laser_rifle"),
            ("machine gun", "machine_gun"),
            ("submachine", "smg"),
            ("smg", "smg"),
            ("shotgun", "combat_shotgun"),
            ("revolver", "revolver"),
            ("magnum", "revolver"),
            ("pistol", "service_pistol"),
            ("rifle", "assault_rifle"),
            ("cryo", "cryo_projector"),
            ("grenade", "frag_grenade"),
            ("flame", "incinerator"),
            ("knife", "combat_knife"),
            ("blade", "combat_knife"),
            ("baton", "stun_baton"),
            ("psi", "psi_lash"),
            ("fist", "fists"),
        ] {
            catalog.weapon_pattern(pattern, id);
        }

        for def in [
            ArmorDef::none(),
            ArmorDef::leather_jacket(),
            ArmorDef::kevlar_vest(),
            ArmorDef::tactical_vest(),
            ArmorDef::riot_armor(),
            ArmorDef::swat_armor(),
            ArmorDef::combat_armor(),
            ArmorDef::military_armor(),
            ArmorDef::power_armor(),
            ArmorDef::eod_suit(),
            ArmorDef::hazmat_suit(),
            ArmorDef::fire_suit(),
        ] {
            catalog.add_armor(def);
        }

        catalog.armor_alias("ballistic vest", "kevlar_vest");
        catalog.armor_alias("bomb suit", "eod_suit");
        catalog.armor_alias("plate carrier", "tactical_vest");

        for (pattern, id) in [
            ("power", "power_armor"),
            ("eod", "eod_suit"),
            ("swat", "swat_armor"),
            ("riot", "riot_armor"),
            ("tactical", "tactical_vest"),
            ("kevlar", "kevlar_vest"),
            ("military", "military_armor"),
            ("combat", "combat_armor"),
            ("hazmat", "hazmat_suit"),
            ("fire", "fire_suit"),
            ("leather", "leather_jacket"),
            ("vest", "kevlar_vest"),
        ] {
            catalog.armor_pattern(pattern, id);
        }

        catalog
    }

    fn add_weapon(&mut self, def: WeaponDef) {
        self.weapons
            .by_name
            .insert(def.name.to_lowercase(), def.id.clone());
        self.weapons.by_id.insert(def.id.clone(), def);
    }

    fn weapon_alias(&mut self, alias: &str, id: &str) {
        self.weapons
            .aliases
            .insert(alias.to_lowercase(), id.to_string());
    }

    fn weapon_pattern(&mut self, pattern: &str, id: &str) {
        self.weapons
            .patterns
            .push((pattern.to_lowercase(), id.to_string()));
    }

    fn add_armor(&mut self, def: ArmorDef) {
        self.armor
            .by_name
            .insert(def.name.to_lowercase(), def.id.clone());
        self.armor.by_id.insert(def.id.clone(), def);
    }

    fn armor_alias(&mut self, alias: &str, id: &str) {
        self.armor
            .aliases
            .insert(alias.to_lowercase(), id.to_string());
    }

    fn armor_pattern(&mut self, pattern: &str, id: &str) {
        self.armor
            .patterns
            .push((pattern.to_lowercase(), id.to_string()));
    }

    pub fn weapon(&self, query: &str) -> Result<&WeaponDef> {
        self.weapons
            .resolve(query)
            .ok_or_else(|| EngineError::CatalogLookupFailed(format!("weapon '{}'", query)))
    }

    pub fn armor(&self, query: &str) -> Result<&ArmorDef> {
        self.armor
            .resolve(query)
            .ok_or_else(|| EngineError::CatalogLookupFailed(format!("armor '{}'", query)))
    }

    /// Fail-closed weapon lookup: unknown gear swings nothing.
    pub fn weapon_or_default(&self, query: &str) -> WeaponDef {
        match self.weapons.resolve(query) {
            Some(def) => def.clone(),
            None => {
                warn!(query, "weapon lookup failed, using inert default");
                WeaponDef::none()
            }
        }
    }

    /// Fail-closed armor lookup: unknown gear protects nothing.
    pub fn armor_or_default(&self, query: &str) -> ArmorDef {
        match self.armor.resolve(query) {
            Some(def) => def.clone(),
            None => {
                warn!(query, "armor lookup failed, using inert default");
                ArmorDef::none()
            }
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
