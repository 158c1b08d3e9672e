//! Damage resolution: accuracy, mitigation, status effects

pub mod accuracy;
pub mod constants;
pub mod damage;
pub mod status;
pub mod verbs;

pub use accuracy::{biased_roll, effective_accuracy, HitTier};
pub use damage::{resolve_impact, Impact};
pub use status::{
    accuracy_penalty, ap_penalty, apply_weapon_status, is_stunned, tick_statuses, weapon_status,
    StatusEffect, StatusKind, StatusTick,
};
pub use verbs::attack_verb;
