//! Accuracy shifts, roll biasing, and hit tier classification
//!
//! The tier thresholds are fixed. Accuracy never moves the thresholds;
//! it biases the roll before classification. A +2 weapon on a clean roll
//! of 55 classifies at 75, a solid hit.

use serde::{Deserialize, Serialize};

use super::constants::{
    ACCURACY_MAX, ACCURACY_MIN, ACCURACY_PER_SHIFT, BASE_ACCURACY, CRIT_DENOMINATOR,
    CRIT_NUMERATOR, CRIT_THRESHOLD, GRAZE_THRESHOLD, HIT_THRESHOLD,
};

/// Outcome class of a single attack roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitTier {
    Miss,
    Graze,
    Hit,
    Crit,
}

impl HitTier {
    /// Classify a biased roll against the fixed thresholds.
    pub fn from_roll(roll: i32) -> Self {
        if roll < GRAZE_THRESHOLD {
            HitTier::Miss
        } else if roll < HIT_THRESHOLD {
            HitTier::Graze
        } else if roll < CRIT_THRESHOLD {
            HitTier::Hit
        } else {
            HitTier::Crit
        }
    }

    /// Scale base damage by tier. Integer math, floored.
    pub fn scale(&self, damage: i32) -> i32 {
        match self {
            HitTier::Miss => 0,
            HitTier::Graze => damage / 2,
            HitTier::Hit => damage,
            HitTier::Crit => damage * CRIT_NUMERATOR / CRIT_DENOMINATOR,
        }
    }

    /// Crits guarantee chance-based status effects.
    pub fn guarantees_status(&self) -> bool {
        matches!(self, HitTier::Crit)
    }

    pub fn connects(&self) -> bool {
        !matches!(self, HitTier::Miss)
    }
}

/// Effective accuracy for a weapon shift: 70 + shift * 10, clamped.
pub fn effective_accuracy(accuracy_shift: i8) -> i32 {
    (BASE_ACCURACY + accuracy_shift as i32 * ACCURACY_PER_SHIFT).clamp(ACCURACY_MIN, ACCURACY_MAX)
}

/// Bias a raw percentile roll by accuracy and situational modifiers.
///
/// `situational_bias` is supplied by the caller (range bands, cover,
/// status penalties). The engine does no position math here.
pub fn biased_roll(raw_roll: i32, effective_accuracy: i32, situational_bias: i32) -> i32 {
    (raw_roll + (effective_accuracy - BASE_ACCURACY) + situational_bias).clamp(0, 99)
}
