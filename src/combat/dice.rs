//! Random rolls for combat
//!
//! Handlers draw from a `Dice` so scripted scenarios can pin outcomes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub trait Dice: Send {
    /// Uniform in [0, 100)
    fn percent(&mut self) -> f32;

    /// Uniform in [0, 1)
    fn unit(&mut self) -> f32 {
        self.percent() / 100.0
    }

    /// Uniform index in [0, len); `len` must be positive
    fn pick(&mut self, len: usize) -> usize;
}

/// Reproducible dice from a seed
pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Dice for SeededDice {
    fn percent(&mut self) -> f32 {
        self.rng.gen_range(0.0..100.0)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len.max(1))
    }
}

/// Replays a fixed cycle of percent rolls; `pick` always chooses the first
pub struct FixedDice {
    rolls: Vec<f32>,
    next: usize,
}

impl FixedDice {
    pub fn new(rolls: &[f32]) -> Self {
        Self {
            rolls: if rolls.is_empty() { vec![50.0] } else { rolls.to_vec() },
            next: 0,
        }
    }

    /// Every roll returns the same value
    pub fn always(roll: f32) -> Self {
        Self::new(&[roll])
    }
}

impl Dice for FixedDice {
    fn percent(&mut self) -> f32 {
        let roll = self.rolls[self.next % self.rolls.len()];
        self.next += 1;
        roll
    }

    fn pick(&mut self, _len: usize) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_dice_reproducible() {
        let mut a = SeededDice::new(7);
        let mut b = SeededDice::new(7);
        for _ in 0..50 {
            let roll = a.percent();
            assert_eq!(roll, b.percent());
            assert!((0.0..100.0).contains(&roll));
        }
    }

    #[test]
    fn test_fixed_dice_cycles() {
        let mut dice = FixedDice::new(&[10.0, 90.0]);
        assert_eq!(dice.percent(), 10.0);
        assert_eq!(dice.percent(), 90.0);
        assert_eq!(dice.percent(), 10.0);
        assert_eq!(dice.pick(5), 0);
    }
}
