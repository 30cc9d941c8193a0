//! Activity ratios fed into the engine each frame.
//!
//! In the installation the ratio comes from each station's own dataset.
//! The headless binary has no dataset, so it drives the engine with a
//! bounded random walk instead.

use maelstrom_types::clamp01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces one activity ratio per frame.
pub trait ActivitySource: Send {
    /// The ratio for the next frame. May exceed `[0, 1]`.
    fn next_ratio(&mut self) -> f32;
}

/// Random walk clamped to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct SyntheticActivity {
    rng: StdRng,
    level: f32,
    step: f32,
}

impl SyntheticActivity {
    /// Start at `level`, moving at most `step` per frame.
    pub fn new(rng: StdRng, level: f32, step: f32) -> Self {
        Self {
            rng,
            level: clamp01(level),
            step: step.abs(),
        }
    }

    /// Walk seeded from `seed`, or from the OS when `None`.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, |seed| {
            // Offset so the walk and the spike rolls differ under one seed.
            StdRng::seed_from_u64(seed.wrapping_add(1))
        });
        Self::new(rng, 0.3, 0.01)
    }
}

impl ActivitySource for SyntheticActivity {
    fn next_ratio(&mut self) -> f32 {
        let delta = self.rng.random_range(-self.step..=self.step);
        self.level = clamp01(self.level + delta);
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_stays_in_range() {
        let mut activity = SyntheticActivity::new(StdRng::seed_from_u64(3), 0.5, 0.2);
        for _ in 0..10_000 {
            assert!((0.0..=1.0).contains(&activity.next_ratio()));
        }
    }

    #[test]
    fn steps_are_bounded() {
        let mut activity = SyntheticActivity::from_optional_seed(Some(9));
        let mut previous = activity.next_ratio();
        for _ in 0..1000 {
            let next = activity.next_ratio();
            assert!((next - previous).abs() <= 0.01 + 1e-6);
            previous = next;
        }
    }

    #[test]
    fn zero_step_holds_level() {
        let mut activity = SyntheticActivity::new(StdRng::seed_from_u64(1), 0.42, 0.0);
        for _ in 0..10 {
            assert!((activity.next_ratio() - 0.42).abs() < 1e-6);
        }
    }
}
