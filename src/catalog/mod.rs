//! Equipment catalog: weapon and armor records plus fuzzy resolution

pub mod armor;
pub mod registry;
pub mod weapons;

pub use armor::{ArmorCategory, ArmorDef, ResolvedArmor};
pub use registry::Catalog;
pub use weapons::{DamageChannel, DamageFamily, DamageSubtype, WeaponCategory, WeaponDef};
