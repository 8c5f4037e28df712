use std::sync::Mutex;

use rand::{Rng as _, SeedableRng as _, rngs::StdRng, thread_rng};

/// Source of randomness for the content generators.
///
/// Production uses [`ThreadRandom`]; tests inject [`FixedRandom`] or
/// [`SeededRandom`] to get reproducible replies.
pub trait RandomSource: Send + Sync {
    /// Uniform index in `0..len`. `len` is never zero.
    fn index(&self, len: usize) -> usize;

    /// Uniform value in `[0, 1)`.
    fn unit(&self) -> f64;
}

/// Picks one element of `items`, or `None` when it is empty.
pub fn choose<'a, T>(random: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(random.index(items.len()).min(items.len() - 1))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&self, len: usize) -> usize {
        thread_rng().gen_range(0..len)
    }

    fn unit(&self) -> f64 {
        thread_rng().gen_range(0.0..1.0)
    }
}

/// Always returns the same draw.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom {
    pub index: usize,
    pub unit: f64,
}

impl FixedRandom {
    #[must_use]
    pub const fn new(index: usize, unit: f64) -> Self {
        Self { index, unit }
    }
}

impl Default for FixedRandom {
    fn default() -> Self {
        Self::new(0, 1.0)
    }
}

impl RandomSource for FixedRandom {
    fn index(&self, len: usize) -> usize {
        self.index % len
    }

    fn unit(&self) -> f64 {
        self.unit
    }
}

/// Seeded generator shared across threads.
#[derive(Debug)]
pub struct SeededRandom(Mutex<StdRng>);

impl SeededRandom {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }
}

impl RandomSource for SeededRandom {
    fn index(&self, len: usize) -> usize {
        match self.0.lock() {
            Ok(mut rng) => rng.gen_range(0..len),
            Err(poisoned) => poisoned.into_inner().gen_range(0..len),
        }
    }

    fn unit(&self) -> f64 {
        match self.0.lock() {
            Ok(mut rng) => rng.gen_range(0.0..1.0),
            Err(poisoned) => poisoned.into_inner().gen_range(0.0..1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_index_wraps() {
        let random = FixedRandom::new(5, 0.5);
        assert_eq!(random.index(3), 2);
        assert!((random.unit() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn choose_handles_empty() {
        let empty: [u8; 0] = [];
        assert_eq!(choose(&FixedRandom::default(), &empty), None);
        assert_eq!(choose(&FixedRandom::new(1, 0.0), &[1, 2, 3]), Some(&2));
    }

    #[test]
    fn seeded_sources_agree() {
        let a = SeededRandom::new(7);
        let b = SeededRandom::new(7);
        let left: Vec<_> = (0..10).map(|_| a.index(100)).collect();
        let right: Vec<_> = (0..10).map(|_| b.index(100)).collect();
        assert_eq!(left, right);
        assert!(left.iter().all(|i| *i < 100));
    }

    #[test]
    fn thread_random_stays_in_range() {
        for _ in 0..50 {
            assert!(ThreadRandom.index(4) < 4);
            let u = ThreadRandom.unit();
            assert!((0.0..1.0).contains(&u));
        }
    }
}
