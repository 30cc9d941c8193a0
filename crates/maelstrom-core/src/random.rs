//! Sources of the uniform roll used for spike decisions.
//!
//! The engine only ever asks for one value in `[0, 1)` per tick. Production
//! stations use [`StdRandom`]; tests and replays use a fixed seed or a
//! [`ScriptedRandom`] sequence so outcomes are reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A stream of uniform values in `[0, 1)`.
pub trait RandomSource: Send {
    /// Draw the next value.
    fn next_f32_01(&mut self) -> f32;
}

/// Random source backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Seed from the operating system.
    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seed deterministically.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed from `seed` when given, otherwise from the operating system.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_os, Self::seeded)
    }
}

impl RandomSource for StdRandom {
    fn next_f32_01(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}

/// Replays a fixed list of values, wrapping around at the end.
///
/// An empty script always yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl ScriptedRandom {
    /// Create a source that yields `values` in order, then repeats.
    pub const fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }

    /// A source that yields `value` forever.
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f32_01(&mut self) -> f32 {
        let Some(value) = self.values.get(self.cursor).copied() else {
            return 0.0;
        };
        self.cursor = self
            .cursor
            .wrapping_add(1)
            .checked_rem(self.values.len())
            .unwrap_or(0);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_cycles_through_values() {
        let mut random = ScriptedRandom::new(vec![0.1, 0.2, 0.3]);
        let drawn: Vec<f32> = (0..7).map(|_| random.next_f32_01()).collect();
        let expected = [0.1, 0.2, 0.3, 0.1, 0.2, 0.3, 0.1];
        for (a, b) in drawn.iter().zip(expected) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_script_yields_zero() {
        let mut random = ScriptedRandom::default();
        assert!(random.next_f32_01().abs() < 1e-6);
        assert!(random.next_f32_01().abs() < 1e-6);
    }

    #[test]
    fn seeded_sources_repeat() {
        let mut a = StdRandom::seeded(7);
        let mut b = StdRandom::seeded(7);
        for _ in 0..100 {
            let x = a.next_f32_01();
            assert!((0.0..1.0).contains(&x));
            assert!((x - b.next_f32_01()).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn os_source_stays_in_range() {
        let mut random = StdRandom::from_optional_seed(None);
        for _ in 0..1000 {
            assert!((0.0..1.0).contains(&random.next_f32_01()));
        }
    }
}
