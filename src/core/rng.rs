//! Injectable roll source for deterministic resolution
//!
//! Every random outcome in the engine flows through a `RollSource` handed
//! in by the caller. Production code seeds a ChaCha stream; tests script
//! exact rolls.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Source of percentile rolls for combat resolution
pub trait RollSource {
    /// Uniform roll in 0..100
    fn d100(&mut self) -> i32;

    /// True with the given percent chance (clamped to 0..=100)
    fn percent(&mut self, chance: i32) -> bool {
        self.d100() < chance.clamp(0, 100)
    }
}

/// Seeded ChaCha-backed roll stream. Same seed, same encounter.
pub struct SeededRolls {
    rng: ChaCha8Rng,
}

impl SeededRolls {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RollSource for SeededRolls {
    fn d100(&mut self) -> i32 {
        self.rng.gen_range(0..100)
    }
}

/// Fixed roll queue for tests. Falls back to 50 when exhausted.
#[derive(Default)]
pub struct ScriptedRolls {
    queue: VecDeque<i32>,
}

impl ScriptedRolls {
    pub fn new(rolls: &[i32]) -> Self {
        Self {
            queue: rolls.iter().copied().collect(),
        }
    }

    pub fn push(&mut self, roll: i32) {
        self.queue.push_back(roll);
    }
}

impl RollSource for ScriptedRolls {
    fn d100(&mut self) -> i32 {
        self.queue.pop_front().unwrap_or(50)
    }
}
