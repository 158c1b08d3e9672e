//! Log verbs per damage family

use crate::catalog::DamageFamily;

use super::accuracy::HitTier;

/// Verb for an attack log line, by family and tier
pub fn attack_verb(family: DamageFamily, tier: HitTier) -> &'static str {
    match tier {
        HitTier::Miss => "misses",
        HitTier::Graze => "grazes",
        HitTier::Hit => match family {
            DamageFamily::Blunt => "smashes",
            DamageFamily::Bladed => "cuts",
            DamageFamily::Ballistic => "hits",
            DamageFamily::Explosive => "blasts",
            DamageFamily::Thermal => "scorches",
            DamageFamily::Cryo => "chills",
            DamageFamily::Electric => "shocks",
            DamageFamily::Mental => "lashes",
        },
        HitTier::Crit => match family {
            DamageFamily::Blunt => "crushes",
            DamageFamily::Bladed => "slices open",
            DamageFamily::Ballistic => "shreds",
            DamageFamily::Explosive => "engulfs",
            DamageFamily::Thermal => "immolates",
            DamageFamily::Cryo => "flash-freezes",
            DamageFamily::Electric => "electrocutes",
            DamageFamily::Mental => "shatters",
        },
    }
}
