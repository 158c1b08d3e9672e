//! Combat resolution constants - all tunable values in one place

// Accuracy
pub const BASE_ACCURACY: i32 = 70;
pub const ACCURACY_PER_SHIFT: i32 = 10;
pub const ACCURACY_MIN: i32 = 5;
pub const ACCURACY_MAX: i32 = 95;

// Hit tier thresholds on the biased roll (0..100)
pub const GRAZE_THRESHOLD: i32 = 40;
pub const HIT_THRESHOLD: i32 = 70;
pub const CRIT_THRESHOLD: i32 = 95;

// Tier damage scaling (crit is x1.5, graze is x0.5, both floored)
pub const CRIT_NUMERATOR: i32 = 3;
pub const CRIT_DENOMINATOR: i32 = 2;

// A solid hit that reaches armor always chips at least this much through
pub const MIN_CHIP_DAMAGE: i32 = 1;

// Knockback: tiles = force / (KNOCKBACK_BASE_MASS + target strength)
pub const KNOCKBACK_BASE_MASS: i32 = 30;

// Accuracy penalty while suppressed by a psionic stun
pub const SUPPRESSED_ACCURACY_PENALTY: i32 = 30;

// AP cost bounds for a single attack
pub const ATTACK_AP_MIN: i32 = 1;
pub const ATTACK_AP_MAX: i32 = 6;
